use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_database, to_json};
use crate::cronos::database::StoreKind;
use crate::cronos::datafile::{DatafileInfo, EncodingKind};
use crate::cronos::diagnostics::Diagnostic;
use crate::util::wprintln;
use crate::CroError;

/// Options for the `crodump info` subcommand.
pub struct InfoOptions {
    /// Database directory.
    pub dir: String,
    /// Emit output as JSON.
    pub json: bool,
    /// Memory-map the `.dat` files.
    pub mmap: bool,
    /// KOD substitution table file.
    pub kod: Option<String>,
}

#[derive(Serialize)]
struct InfoJson<'a> {
    directory: String,
    stores: Vec<DatafileInfo>,
    missing: Vec<StoreKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<&'a Diagnostic>,
}

/// Show the `.dat` header and `.tad` index summary of every store.
///
/// Stores that are not present in the directory are listed as missing.
/// Encrypted stores are highlighted since their records cannot be decoded.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), CroError> {
    let db = open_database(&opts.dir, opts.mmap, opts.kod.as_deref())?;
    let missing: Vec<StoreKind> = StoreKind::ALL
        .into_iter()
        .filter(|&kind| db.store(kind).is_none())
        .collect();

    if opts.json {
        let info = InfoJson {
            directory: db.dir().display().to_string(),
            stores: db.info(),
            missing,
            diagnostics: db.open_diagnostics(),
        };
        wprintln!(writer, "{}", to_json(&info)?)?;
        return Ok(());
    }

    wprintln!(
        writer,
        "{}",
        format!("Cronos database {}", db.dir().display()).bold()
    )?;
    for info in db.info() {
        wprintln!(writer)?;
        wprintln!(writer, "{}", format!("Cro{}", info.name).bold())?;
        wprintln!(writer, "  Version:     {}", info.version)?;
        let encoding = match info.encoding {
            EncodingKind::Encrypted => info.encoding.name().red().to_string(),
            EncodingKind::Other(_) => info.encoding.name().yellow().to_string(),
            _ => info.encoding.name(),
        };
        wprintln!(writer, "  Encoding:    {}", encoding)?;
        wprintln!(writer, "  Block size:  {}", info.block_size)?;
        wprintln!(
            writer,
            "  Offsets:     {}",
            if info.offsets_64bit { "64-bit" } else { "32-bit" }
        )?;
        wprintln!(
            writer,
            "  Records:     {} ({} deleted)",
            info.record_count,
            info.deleted_count
        )?;
        wprintln!(writer, "  Data size:   {} bytes", info.dat_size)?;
    }

    if !missing.is_empty() {
        wprintln!(writer)?;
        for kind in missing {
            wprintln!(writer, "{}", format!("Cro{}: not present", kind.name()).dimmed())?;
        }
    }

    Ok(())
}
