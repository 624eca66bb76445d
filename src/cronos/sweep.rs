//! Record enumeration and the raw record sweep.
//!
//! [`enumerate_records`] and [`enumerate_files`] walk a bank store and yield
//! the records owned by one table. [`sweep`] walks any store by record
//! number for reverse engineering: printing every record, aggregating
//! [`SweepStats`], or stopping at the first record with a sub-field marker.
//! Per-record failures are reported and counted; the sweep only gives up
//! after [`MAX_CONSECUTIVE_FAILURES`] failures in a row.

use std::io::Write;

use crate::cronos::constants::{
    COMPLEX_FIELD_MARKER, MAX_CONSECUTIVE_FAILURES, SUBFIELD_SEPARATOR,
};
use crate::cronos::datafile::{EncodingKind, RecordStore};
use crate::cronos::diagnostics::{Diagnostic, Diagnostics};
use crate::cronos::row::Row;
use crate::cronos::table::TableDefinition;
use crate::util::hex::{format_bytes, OutputConfig};
use crate::util::wprintln;
use crate::CroError;

/// Decoded rows of one table, in record order.
///
/// Records that fail to read or decode are skipped and reported through
/// [`RecordIter::diagnostics`]; iteration carries on with the next record.
pub struct RecordIter<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    table: &'a TableDefinition,
    next: u32,
    count: u32,
    diagnostics: Diagnostics,
}

impl<S: RecordStore + ?Sized> RecordIter<'_, S> {
    /// Records skipped so far because they did not read or decode.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl<S: RecordStore + ?Sized> Iterator for RecordIter<'_, S> {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, data)) =
            next_record(&mut *self.store, &mut self.next, self.count, &mut self.diagnostics)
        {
            if !self.table.owns(&data) {
                continue;
            }

            match Row::decode(index, &self.table.fields, &data[1..]) {
                Ok(row) => return Some(row),
                Err(e) => self.diagnostics.push(Diagnostic::RecordDecodeFailure {
                    index,
                    error: e.to_string(),
                    hex: format_bytes(&data),
                }),
            }
        }
        None
    }
}

/// Next present record at or after `*next`. Unreadable records are recorded
/// in `diagnostics` and skipped; running past the store ends the walk.
fn next_record<S: RecordStore + ?Sized>(
    store: &mut S,
    next: &mut u32,
    count: u32,
    diagnostics: &mut Diagnostics,
) -> Option<(u32, Vec<u8>)> {
    while *next <= count {
        let index = *next;
        *next += 1;

        match store.read_record(index) {
            Ok(Some(data)) => return Some((index, data)),
            Ok(None) => {}
            Err(CroError::OutOfRange { .. }) => {
                *next = count.saturating_add(1);
                break;
            }
            Err(e) => diagnostics.push(Diagnostic::RecordDecodeFailure {
                index,
                error: e.to_string(),
                hex: String::new(),
            }),
        }
    }
    None
}

/// Iterate the rows of `table` stored in `bank`.
pub fn enumerate_records<'a, S: RecordStore + ?Sized>(
    bank: &'a mut S,
    table: &'a TableDefinition,
) -> RecordIter<'a, S> {
    let count = bank.record_count();
    RecordIter {
        store: bank,
        table,
        next: 1,
        count,
        diagnostics: Diagnostics::new(),
    }
}

/// Raw payloads of a file-storage table as `(record number, bytes)`, the
/// table-id byte removed. Unreadable records are skipped like in
/// [`RecordIter`].
pub struct FileIter<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    table_id: u32,
    next: u32,
    count: u32,
    diagnostics: Diagnostics,
}

impl<S: RecordStore + ?Sized> FileIter<'_, S> {
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl<S: RecordStore + ?Sized> Iterator for FileIter<'_, S> {
    type Item = (u32, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, data)) =
            next_record(&mut *self.store, &mut self.next, self.count, &mut self.diagnostics)
        {
            if data.first().is_some_and(|&b| b as u32 == self.table_id) {
                return Some((index, data[1..].to_vec()));
            }
        }
        None
    }
}

/// Iterate the stored files of `table` (usually the `Base000` table).
pub fn enumerate_files<'a, S: RecordStore + ?Sized>(
    bank: &'a mut S,
    table: &TableDefinition,
) -> FileIter<'a, S> {
    let count = bank.record_count();
    FileIter {
        store: bank,
        table_id: table.table_id,
        next: 1,
        count,
        diagnostics: Diagnostics::new(),
    }
}

/// What the sweep does with each record.
#[derive(Debug, Clone, Copy)]
pub enum SweepMode {
    /// Print every record, rendered with the given config.
    Print(OutputConfig),
    /// Only aggregate [`SweepStats`].
    Stats,
    /// Stop at the first record containing `0x1d` or `0x1b` after byte 0.
    FindMarkers,
}

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub mode: SweepMode,
    /// Highest record number to visit.
    pub max_records: u32,
    /// Return at once when the store is password-encrypted.
    pub skip_encrypted: bool,
    /// Propagate the first record failure instead of counting it.
    pub strict: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            mode: SweepMode::Print(OutputConfig::default()),
            max_records: u32::MAX,
            skip_encrypted: false,
            strict: false,
        }
    }
}

/// Counters gathered by a [`SweepMode::Stats`] sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepStats {
    /// Deleted record slots.
    pub absent: u64,
    /// Present records with no bytes.
    pub empty: u64,
    /// Records per leading table-id byte.
    pub table_ids: [u64; 256],
    /// Frequency of each byte value after the table-id byte.
    pub byte_values: [u64; 256],
    /// Records that failed to read, in any mode.
    pub failures: u64,
}

impl SweepStats {
    pub fn new() -> Self {
        SweepStats {
            absent: 0,
            empty: 0,
            table_ids: [0; 256],
            byte_values: [0; 256],
            failures: 0,
        }
    }

    fn record(&mut self, data: Option<&[u8]>) {
        match data {
            None => self.absent += 1,
            Some([]) => self.empty += 1,
            Some(data) => {
                self.table_ids[data[0] as usize] += 1;
                for &b in &data[1..] {
                    self.byte_values[b as usize] += 1;
                }
            }
        }
    }
}

impl Default for SweepStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a sweep stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepEnd {
    /// Visited every record up to `max_records`.
    Completed,
    /// The store has fewer records than `max_records`.
    RangeExhausted,
    /// A record with a sub-field marker was printed.
    MarkerFound,
    /// Too many consecutive records failed.
    FailureThreshold,
    /// The store is encrypted and skipping was requested.
    SkippedEncrypted,
}

/// Outcome of [`sweep`].
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub end: SweepEnd,
    /// Number of record numbers attempted.
    pub processed: u32,
    pub stats: SweepStats,
}

fn has_marker(data: &[u8]) -> bool {
    data.get(1..)
        .is_some_and(|rest| rest.iter().any(|&b| b == SUBFIELD_SEPARATOR || b == COMPLEX_FIELD_MARKER))
}

/// Walk `store` from record 1 up to `options.max_records`.
///
/// `stats` is updated in [`SweepMode::Stats`] (and for failures in every
/// mode) and handed back in the report.
///
/// # Errors
///
/// Only output errors, and with `options.strict` the first record failure,
/// are returned. Everything else ends up in the report.
pub fn sweep<S: RecordStore + ?Sized>(
    store: &mut S,
    options: &SweepOptions,
    mut stats: SweepStats,
    writer: &mut dyn Write,
) -> Result<SweepReport, CroError> {
    if options.skip_encrypted && store.encoding_kind() == EncodingKind::Encrypted {
        return Ok(SweepReport {
            end: SweepEnd::SkippedEncrypted,
            processed: 0,
            stats,
        });
    }

    let mut processed = 0u32;
    let mut consecutive = 0u32;
    let mut end = SweepEnd::Completed;

    for index in 1..=options.max_records {
        let data = match store.read_record(index) {
            Ok(data) => data,
            Err(CroError::OutOfRange { .. }) => {
                end = SweepEnd::RangeExhausted;
                break;
            }
            Err(e) => {
                processed += 1;
                if options.strict {
                    return Err(e);
                }
                tracing::warn!("record {}: {}", index, e);
                wprintln!(writer, "{:5}: <{}>", index, e)?;
                stats.failures += 1;
                consecutive += 1;
                if consecutive >= MAX_CONSECUTIVE_FAILURES {
                    tracing::debug!("giving up after {} consecutive failures", consecutive);
                    end = SweepEnd::FailureThreshold;
                    break;
                }
                continue;
            }
        };
        processed += 1;
        consecutive = 0;

        match options.mode {
            SweepMode::Print(config) => match &data {
                None => wprintln!(writer, "{:5}: <deleted>", index)?,
                Some(data) => wprintln!(writer, "{:5}: {}", index, config.render(data))?,
            },
            SweepMode::Stats => stats.record(data.as_deref()),
            SweepMode::FindMarkers => {
                if let Some(data) = data.as_deref().filter(|d| has_marker(d)) {
                    wprintln!(writer, "{} -> {}", index, format_bytes(data))?;
                    end = SweepEnd::MarkerFound;
                    break;
                }
            }
        }
    }

    tracing::debug!("sweep ended after {} records: {:?}", processed, end);
    Ok(SweepReport {
        end,
        processed,
        stats,
    })
}

/// Print the two histograms gathered by a stats sweep.
pub fn print_stats(writer: &mut dyn Write, stats: &SweepStats) -> Result<(), CroError> {
    wprintln!(
        writer,
        "-- table-id stats --, {} * none, {} * empty",
        stats.absent,
        stats.empty
    )?;
    for (value, &count) in stats.table_ids.iter().enumerate() {
        if count > 0 {
            wprintln!(writer, "{:5} * {:02x}", count, value)?;
        }
    }
    wprintln!(writer, "-- byte stats --")?;
    for (value, &count) in stats.byte_values.iter().enumerate() {
        if count > 0 {
            wprintln!(writer, "{:5} * {:02x}", count, value)?;
        }
    }
    Ok(())
}
