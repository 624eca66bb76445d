//! CLI subcommand implementations for the `crodump` binary.
//!
//! CLI argument parsing uses clap derive macros, with the top-level
//! [`app::Cli`] struct and [`app::Commands`] enum defined in [`app`] and
//! shared between `main.rs` and `build.rs` (for man page generation) via
//! `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct holding
//! the parsed arguments and a `pub fn execute(opts, writer) -> Result<(), CroError>`
//! entry point. The `writer: &mut dyn Write` parameter allows output to be
//! captured in tests or redirected to a file via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `crodump info` | [`info`] | Header summary of each store |
//! | `crodump strudump` | [`strudump`] | Database definition and table definitions |
//! | `crodump recdump` | [`recdump`] | Raw record sweep, statistics and marker scan |
//! | `crodump dump` | [`dump`] | Decoded rows and stored files |
//!
//! A progress bar (via [`indicatif`]) is shown while `dump --files-dir`
//! writes stored files.

pub mod app;
pub mod dump;
pub mod info;
pub mod recdump;
pub mod strudump;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cronos::database::{Database, OpenOptions};
use crate::cronos::kod::KodTable;
use crate::util::hex::{OutputConfig, OutputStyle};
use crate::CroError;

/// Open a database directory, selecting mmap or buffered I/O and loading
/// the KOD table when one is given.
pub(crate) fn open_database(dir: &str, use_mmap: bool, kod: Option<&str>) -> Result<Database, CroError> {
    let kod = kod.map(KodTable::load).transpose()?;
    Database::open_with(
        dir,
        &OpenOptions {
            mmap: use_mmap,
            kod,
        },
    )
}

impl From<app::StyleArg> for OutputStyle {
    fn from(arg: app::StyleArg) -> Self {
        match arg {
            app::StyleArg::Hex => OutputStyle::Hex,
            app::StyleArg::Ascii => OutputStyle::Ascii,
            app::StyleArg::Escaped => OutputStyle::Escaped,
            app::StyleArg::Dump => OutputStyle::Dump,
        }
    }
}

pub fn output_config(style: app::StyleArg, width: Option<usize>) -> OutputConfig {
    OutputConfig {
        style: style.into(),
        width,
    }
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CroError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CroError::Parse(format!("JSON serialization error: {}", e)))
}

/// Create a styled progress bar for iterating over records or files.
pub(crate) fn create_progress_bar(count: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(count);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
