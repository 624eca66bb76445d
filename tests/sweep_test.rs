//! Integration tests for raw record sweeps over file-backed stores.

mod common;

use cro::cronos::datafile::Datafile;
use cro::cronos::sweep::{print_stats, sweep, SweepEnd, SweepMode, SweepOptions, SweepStats};
use cro::util::hex::{OutputConfig, OutputStyle};
use cro::CroError;

use common::StoreBuilder;

fn store(builder: StoreBuilder) -> Datafile {
    let (dat, tad) = builder.build();
    Datafile::from_bytes("Bank", dat, tad).unwrap()
}

fn options(mode: SweepMode) -> SweepOptions {
    SweepOptions {
        mode,
        ..SweepOptions::default()
    }
}

#[test]
fn test_print_sweep_runs_to_end_of_store() {
    let mut bank = store(
        StoreBuilder::new()
            .record(b"\x01abc")
            .deleted()
            .record(b""),
    );
    let config = OutputConfig {
        style: OutputStyle::Ascii,
        width: None,
    };
    let mut out = Vec::new();
    let report = sweep(
        &mut bank,
        &options(SweepMode::Print(config)),
        SweepStats::new(),
        &mut out,
    )
    .unwrap();

    assert_eq!(report.end, SweepEnd::RangeExhausted);
    assert_eq!(report.processed, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "    1: .abc\n    2: <deleted>\n    3: \n"
    );
}

#[test]
fn test_stats_sweep_histograms() {
    let mut bank = store(
        StoreBuilder::new()
            .record(&[0x05, 0x41, 0x41])
            .record(&[0x05, 0x42])
            .deleted()
            .record(&[0x07])
            .record(b""),
    );
    let report = sweep(
        &mut bank,
        &options(SweepMode::Stats),
        SweepStats::new(),
        &mut Vec::new(),
    )
    .unwrap();

    let stats = &report.stats;
    assert_eq!(stats.table_ids[0x05], 2);
    assert_eq!(stats.table_ids[0x07], 1);
    assert_eq!(stats.byte_values[0x41], 2);
    assert_eq!(stats.byte_values[0x42], 1);
    assert_eq!(stats.absent, 1);
    assert_eq!(stats.empty, 1);

    let mut out = Vec::new();
    print_stats(&mut out, stats).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("-- table-id stats --, 1 * none, 1 * empty\n"));
    assert!(text.contains("    2 * 05\n"));
    assert!(text.contains("-- byte stats --\n    2 * 41\n    1 * 42\n"));
}

#[test]
fn test_stats_accumulate_across_sweeps() {
    let mut first = store(StoreBuilder::new().record(&[0x01, 0x00]));
    let mut second = store(StoreBuilder::new().record(&[0x01]).deleted());

    let opts = options(SweepMode::Stats);
    let report = sweep(&mut first, &opts, SweepStats::new(), &mut Vec::new()).unwrap();
    let report = sweep(&mut second, &opts, report.stats, &mut Vec::new()).unwrap();
    assert_eq!(report.stats.table_ids[0x01], 2);
    assert_eq!(report.stats.absent, 1);
}

#[test]
fn test_unreadable_records_stop_after_five() {
    let mut builder = StoreBuilder::new().record(b"\x01ok");
    for _ in 0..6 {
        builder = builder.raw_entry(1 << 20, 0x1000_0004);
    }
    let mut bank = store(builder.record(b"\x01unreached"));

    let mut out = Vec::new();
    let report = sweep(
        &mut bank,
        &options(SweepMode::Print(OutputConfig::default())),
        SweepStats::new(),
        &mut out,
    )
    .unwrap();

    assert_eq!(report.end, SweepEnd::FailureThreshold);
    assert_eq!(report.stats.failures, 5);
    assert_eq!(report.processed, 6);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "    1: 016f6b");
    assert!(lines[1].starts_with("    2: <I/O error:"));
}

#[test]
fn test_strict_sweep_propagates() {
    let mut bank = store(StoreBuilder::new().raw_entry(1 << 20, 0x1000_0004));
    let opts = SweepOptions {
        strict: true,
        ..SweepOptions::default()
    };
    let result = sweep(&mut bank, &opts, SweepStats::new(), &mut Vec::new());
    assert!(matches!(result, Err(CroError::Io(_))));
}

#[test]
fn test_marker_scan() {
    let mut bank = store(
        StoreBuilder::new()
            .record(&[0x1b, 0x00])
            .record(&[0x01, 0x61, 0x1d, 0x62])
            .record(&[0x01, 0x1b]),
    );
    let mut out = Vec::new();
    let report = sweep(
        &mut bank,
        &options(SweepMode::FindMarkers),
        SweepStats::new(),
        &mut out,
    )
    .unwrap();
    assert_eq!(report.end, SweepEnd::MarkerFound);
    assert_eq!(String::from_utf8(out).unwrap(), "2 -> 01611d62\n");
}

#[test]
fn test_skip_encrypted_store() {
    let mut bank = store(StoreBuilder::new().encoding(3).record(b"\x01data"));
    let opts = SweepOptions {
        skip_encrypted: true,
        ..SweepOptions::default()
    };
    let mut out = Vec::new();
    let report = sweep(&mut bank, &opts, SweepStats::new(), &mut out).unwrap();
    assert_eq!(report.end, SweepEnd::SkippedEncrypted);
    assert!(out.is_empty());
}
