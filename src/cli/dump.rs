use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{create_progress_bar, open_database, to_json};
use crate::cronos::database::{Database, StoreKind};
use crate::cronos::datafile::RecordStore;
use crate::cronos::diagnostics::Diagnostic;
use crate::cronos::row::Row;
use crate::cronos::table::TableDefinition;
use crate::util::wprintln;
use crate::CroError;

/// Options for the `crodump dump` subcommand.
pub struct DumpOptions {
    /// Database directory.
    pub dir: String,
    /// Only dump the table with this name (case-insensitive).
    pub table: Option<String>,
    /// Emit output as JSON.
    pub json: bool,
    /// Directory receiving the stored files.
    pub files_dir: Option<String>,
    /// Memory-map the `.dat` files.
    pub mmap: bool,
    /// KOD substitution table file.
    pub kod: Option<String>,
}

#[derive(Serialize)]
struct TableDumpJson {
    name: String,
    table_id: u32,
    fields: Vec<String>,
    rows: Vec<Row>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    broken: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct FileJson {
    record: u32,
    size: usize,
    path: String,
}

#[derive(Serialize)]
struct DumpJson {
    tables: Vec<TableDumpJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<FileJson>,
}

/// Decode the rows of every ordinary table, or of the one named by
/// `--table`, and optionally extract the file table's payloads.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), CroError> {
    let mut db = open_database(&opts.dir, opts.mmap, opts.kod.as_deref())?;

    let mut tables = Vec::new();
    for table in db.enumerate_tables(false)? {
        match table {
            Ok(t) => tables.push(t),
            Err(e) => tracing::warn!("skipping table definition: {}", e),
        }
    }
    if let Some(name) = &opts.table {
        tables.retain(|t| t.name.eq_ignore_ascii_case(name));
        if tables.is_empty() {
            return Err(CroError::Argument(format!("Table {} not found", name)));
        }
    }

    let mut dumped = Vec::new();
    for table in &tables {
        let mut rows = db.enumerate_records(table)?;
        let decoded: Vec<Row> = rows.by_ref().collect();
        let broken = rows.diagnostics().iter().cloned().collect::<Vec<_>>();

        if opts.json {
            dumped.push(TableDumpJson {
                name: table.name.clone(),
                table_id: table.table_id,
                fields: table.fields.iter().map(|f| f.name.clone()).collect(),
                rows: decoded,
                broken,
            });
        } else {
            print_table(writer, table, &decoded, &broken)?;
        }
    }

    let files = match &opts.files_dir {
        Some(dir) => extract_files(&mut db, Path::new(dir), !opts.json)?,
        None => Vec::new(),
    };

    if opts.json {
        let dump = DumpJson {
            tables: dumped,
            files,
        };
        wprintln!(writer, "{}", to_json(&dump)?)?;
    } else if let Some(dir) = &opts.files_dir {
        wprintln!(writer)?;
        wprintln!(writer, "Wrote {} files to {}", files.len(), dir)?;
    }

    Ok(())
}

fn print_table(
    writer: &mut dyn Write,
    table: &TableDefinition,
    rows: &[Row],
    broken: &[Diagnostic],
) -> Result<(), CroError> {
    wprintln!(
        writer,
        "{}",
        format!("== {} (id {}) ==", table.name, table.table_id).bold()
    )?;
    let header: Vec<&str> = table.fields.iter().map(|f| f.name.as_str()).collect();
    wprintln!(writer, "{:>5}: {}", "#", header.join(" | "))?;
    for row in rows {
        wprintln!(writer, "{}", row)?;
    }
    if !broken.is_empty() {
        wprintln!(
            writer,
            "{}",
            format!("{} records could not be decoded", broken.len()).yellow()
        )?;
    }
    wprintln!(writer)?;
    Ok(())
}

/// Write the payloads of the file-storage table to `dir/<record>.bin`.
fn extract_files(db: &mut Database, dir: &Path, progress: bool) -> Result<Vec<FileJson>, CroError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CroError::Io(format!("Cannot create {}: {}", dir.display(), e)))?;

    let mut file_tables = Vec::new();
    for table in db.enumerate_tables(true)? {
        file_tables.push(table?);
    }

    let total = db.require(StoreKind::Bank)?.record_count() as u64 * file_tables.len() as u64;
    let pb = if progress {
        Some(create_progress_bar(total, "records"))
    } else {
        None
    };

    let mut written = Vec::new();
    for table in &file_tables {
        let mut last = 0u32;
        for (record, data) in db.enumerate_files(table)? {
            let path = dir.join(format!("{}.bin", record));
            std::fs::write(&path, &data)
                .map_err(|e| CroError::Io(format!("Cannot write {}: {}", path.display(), e)))?;
            if let Some(ref pb) = pb {
                pb.inc(u64::from(record - last));
            }
            last = record;
            written.push(FileJson {
                record,
                size: data.len(),
                path: path.display().to_string(),
            });
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    tracing::debug!("extracted {} files to {}", written.len(), dir.display());
    Ok(written)
}
