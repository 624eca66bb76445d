use std::io::Write;

use crate::cli::open_database;
use crate::cronos::database::StoreKind;
use crate::cronos::sweep::{print_stats, sweep, SweepEnd, SweepMode, SweepOptions, SweepStats};
use crate::util::hex::OutputConfig;
use crate::util::wprintln;
use crate::CroError;

/// Options for the `crodump recdump` subcommand.
pub struct RecdumpOptions {
    /// Database directory.
    pub dir: String,
    /// Store to sweep.
    pub store: StoreKind,
    /// Aggregate histograms instead of printing records.
    pub stats: bool,
    /// Stop at the first record containing a sub-field marker.
    pub find_markers: bool,
    /// Highest record number to visit.
    pub max_records: Option<u32>,
    /// Skip password-encrypted stores.
    pub skip_encrypted: bool,
    /// Stop at the first failing record.
    pub strict: bool,
    /// Rendering of printed records.
    pub config: OutputConfig,
    /// Memory-map the `.dat` files.
    pub mmap: bool,
    /// KOD substitution table file.
    pub kod: Option<String>,
}

/// Walk one store record by record.
///
/// Prints `<deleted>` for absent slots and the rendered payload otherwise.
/// With `--stats` only the table-id and byte-value histograms are printed;
/// with `--find1d` the first record holding a `0x1d` or `0x1b` byte after
/// its table id is printed and the sweep stops. Failing records are shown
/// inline and the sweep gives up after five failures in a row.
pub fn execute(opts: &RecdumpOptions, writer: &mut dyn Write) -> Result<(), CroError> {
    let mut db = open_database(&opts.dir, opts.mmap, opts.kod.as_deref())?;

    let mode = if opts.find_markers {
        SweepMode::FindMarkers
    } else if opts.stats {
        SweepMode::Stats
    } else {
        SweepMode::Print(opts.config)
    };
    let options = SweepOptions {
        mode,
        max_records: opts.max_records.unwrap_or(u32::MAX),
        skip_encrypted: opts.skip_encrypted,
        strict: opts.strict,
    };

    let store = db.require(opts.store)?;
    let report = sweep(store, &options, SweepStats::new(), writer)?;

    match report.end {
        SweepEnd::SkippedEncrypted => {
            wprintln!(writer, "Skipping encrypted Cro{}", opts.store.name())?;
            return Ok(());
        }
        SweepEnd::FailureThreshold => {
            tracing::warn!(
                "Cro{}: stopped after record {}, too many consecutive failures",
                opts.store.name(),
                report.processed
            );
        }
        _ => {}
    }

    if opts.stats {
        print_stats(writer, &report.stats)?;
    }
    Ok(())
}
