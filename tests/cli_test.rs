#![cfg(feature = "cli")]
//! Integration tests for the `crodump` subcommands.

mod common;

use tempfile::TempDir;

use cro::cli::dump::{self, DumpOptions};
use cro::cli::info::{self, InfoOptions};
use cro::cli::recdump::{self, RecdumpOptions};
use cro::cli::strudump::{self, StrudumpOptions};
use cro::cronos::database::StoreKind;
use cro::util::hex::OutputConfig;
use cro::CroError;

use common::{write_sample_database, StoreBuilder};

fn sample() -> TempDir {
    colored::control::set_override(false);
    let dir = TempDir::new().unwrap();
    write_sample_database(dir.path());
    dir
}

fn dir_str(dir: &TempDir) -> String {
    dir.path().to_str().unwrap().to_string()
}

fn recdump_opts(dir: &TempDir) -> RecdumpOptions {
    RecdumpOptions {
        dir: dir_str(dir),
        store: StoreKind::Bank,
        stats: false,
        find_markers: false,
        max_records: None,
        skip_encrypted: false,
        strict: false,
        config: OutputConfig::default(),
        mmap: false,
        kod: None,
    }
}

fn run<F: FnOnce(&mut Vec<u8>) -> Result<(), CroError>>(f: F) -> String {
    let mut out = Vec::new();
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_info_text() {
    let dir = sample();
    let text = run(|w| {
        info::execute(
            &InfoOptions {
                dir: dir_str(&dir),
                json: false,
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    assert!(text.contains("CroStru"));
    assert!(text.contains("CroBank"));
    assert!(text.contains("Records:     6 (1 deleted)"));
    assert!(text.contains("CroIndex: not present"));
}

#[test]
fn test_info_json() {
    let dir = sample();
    let text = run(|w| {
        info::execute(
            &InfoOptions {
                dir: dir_str(&dir),
                json: true,
                mmap: true,
                kod: None,
            },
            w,
        )
    });
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let stores = json["stores"].as_array().unwrap();
    assert_eq!(stores.len(), 2);
    assert_eq!(stores[1]["name"], "Bank");
    assert_eq!(stores[1]["encoding"], "plain");
    assert_eq!(json["missing"], serde_json::json!(["index", "sys"]));
}

#[test]
fn test_strudump_text() {
    let dir = sample();
    let text = run(|w| {
        strudump::execute(
            &StrudumpOptions {
                dir: dir_str(&dir),
                json: false,
                config: OutputConfig::default(),
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    assert!(text.contains(&format!("{:<20} - \"Sample\"", "Bankname")));
    assert!(text.contains(&format!("{:<20} - 000102ff", "BankId")));
    assert!(text.contains("== Base000 =="));
    assert!(text.contains("== Base002 =="));
    assert!(text.contains("table People (PE), id 1, version 1, 3 fields"));
    assert!(text.contains("table Places (PL), id 2"));
    assert!(!text.contains("warning:"));
}

#[test]
fn test_strudump_json() {
    let dir = sample();
    let text = run(|w| {
        strudump::execute(
            &StrudumpOptions {
                dir: dir_str(&dir),
                json: true,
                config: OutputConfig::default(),
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let tables = json["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables[0]["kind"], "files");
    assert_eq!(tables[1]["table"]["name"], "People");
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn test_recdump_print() {
    let dir = sample();
    let text = run(|w| recdump::execute(&recdump_opts(&dir), w));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[2], "    3: <deleted>");
    assert_eq!(lines[5], "    6: 0089504e47");
}

#[test]
fn test_recdump_stats() {
    let dir = sample();
    let mut opts = recdump_opts(&dir);
    opts.stats = true;
    let text = run(|w| recdump::execute(&opts, w));
    assert!(text.starts_with("-- table-id stats --, 1 * none, 0 * empty\n"));
    assert!(text.contains("    2 * 00\n    2 * 01\n    1 * 02\n"));
}

#[test]
fn test_recdump_stru_max_records() {
    let dir = sample();
    let mut opts = recdump_opts(&dir);
    opts.store = StoreKind::Stru;
    opts.max_records = Some(1);
    let text = run(|w| recdump::execute(&opts, w));
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("    1: 03"));
}

#[test]
fn test_recdump_missing_store() {
    let dir = sample();
    let mut opts = recdump_opts(&dir);
    opts.store = StoreKind::Sys;
    let err = recdump::execute(&opts, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, CroError::Argument(_)));
}

#[test]
fn test_recdump_skip_encrypted() {
    colored::control::set_override(false);
    let dir = TempDir::new().unwrap();
    StoreBuilder::new()
        .encoding(3)
        .record(b"\x01x")
        .write(dir.path(), "CroBank");
    let mut opts = recdump_opts(&dir);
    opts.skip_encrypted = true;
    let text = run(|w| recdump::execute(&opts, w));
    assert_eq!(text, "Skipping encrypted CroBank\n");
}

#[test]
fn test_dump_rows() {
    let dir = sample();
    let text = run(|w| {
        dump::execute(
            &DumpOptions {
                dir: dir_str(&dir),
                table: None,
                json: false,
                files_dir: None,
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    assert!(text.contains("== People (id 1) =="));
    assert!(text.contains("    #: ID | Name | City"));
    assert!(text.contains("    5: 2 | Olga | Omsk"));
    assert!(text.contains("    4: Moscow"));
}

#[test]
fn test_dump_continues_past_unreadable_record() {
    let dir = sample();
    StoreBuilder::new()
        .record(b"\x011\x1eIvan\x1eTver")
        .raw_entry(1 << 20, 0x1000_0004)
        .record(b"\x012\x1eOlga\x1eOmsk")
        .record(b"\x02Moscow")
        .write(dir.path(), "CroBank");

    let text = run(|w| {
        dump::execute(
            &DumpOptions {
                dir: dir_str(&dir),
                table: None,
                json: false,
                files_dir: None,
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    assert!(text.contains("    1: 1 | Ivan | Tver"));
    assert!(text.contains("    3: 2 | Olga | Omsk"));
    assert!(text.contains("1 records could not be decoded"));
    assert!(text.contains("    4: Moscow"));
}

#[test]
fn test_dump_single_table_json() {
    let dir = sample();
    let text = run(|w| {
        dump::execute(
            &DumpOptions {
                dir: dir_str(&dir),
                table: Some("places".to_string()),
                json: true,
                files_dir: None,
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let tables = json["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["name"], "Places");
    assert_eq!(tables[0]["rows"][0]["values"][0]["text"], "Moscow");
}

#[test]
fn test_dump_unknown_table() {
    let dir = sample();
    let result = dump::execute(
        &DumpOptions {
            dir: dir_str(&dir),
            table: Some("Nowhere".to_string()),
            json: false,
            files_dir: None,
            mmap: false,
            kod: None,
        },
        &mut Vec::new(),
    );
    assert!(matches!(result, Err(CroError::Argument(_))));
}

#[test]
fn test_dump_extracts_files() {
    let dir = sample();
    let out_dir = TempDir::new().unwrap();
    let files_dir = out_dir.path().join("files");
    let text = run(|w| {
        dump::execute(
            &DumpOptions {
                dir: dir_str(&dir),
                table: None,
                json: true,
                files_dir: Some(files_dir.to_str().unwrap().to_string()),
                mmap: false,
                kod: None,
            },
            w,
        )
    });
    assert_eq!(std::fs::read(files_dir.join("2.bin")).unwrap(), b"first file");
    assert_eq!(std::fs::read(files_dir.join("6.bin")).unwrap(), b"\x89PNG");

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(json["files"][0]["record"], 2);
}
