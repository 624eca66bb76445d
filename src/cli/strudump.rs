use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_database, to_json};
use crate::cronos::catalog::{table_definitions, TableKind};
use crate::cronos::definition::Definition;
use crate::cronos::diagnostics::Diagnostics;
use crate::cronos::printer::print_definition;
use crate::cronos::table::TableDefinition;
use crate::util::hex::OutputConfig;
use crate::util::wprintln;
use crate::CroError;

/// Options for the `crodump strudump` subcommand.
pub struct StrudumpOptions {
    /// Database directory.
    pub dir: String,
    /// Emit output as JSON.
    pub json: bool,
    /// Rendering of non-printable definition values.
    pub config: OutputConfig,
    /// Memory-map the `.dat` files.
    pub mmap: bool,
    /// KOD substitution table file.
    pub kod: Option<String>,
}

#[derive(Serialize)]
struct TableJson<'a> {
    key: &'a str,
    kind: TableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<&'a TableDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct StrudumpJson<'a> {
    definition: &'a Definition,
    tables: Vec<TableJson<'a>>,
    diagnostics: &'a Diagnostics,
}

/// Print the database definition from structure record #1, followed by
/// every `BaseNNN` table definition with its field list.
pub fn execute(opts: &StrudumpOptions, writer: &mut dyn Write) -> Result<(), CroError> {
    let mut db = open_database(&opts.dir, opts.mmap, opts.kod.as_deref())?;
    let (definition, diagnostics) = db.read_definition()?;
    let entries = table_definitions(&definition);

    if opts.json {
        let tables = entries
            .iter()
            .map(|e| TableJson {
                key: &e.key,
                kind: e.kind,
                table: e.table.as_ref().ok(),
                error: e.table.as_ref().err().map(|err| err.to_string()),
            })
            .collect();
        let dump = StrudumpJson {
            definition: &definition,
            tables,
            diagnostics: &diagnostics,
        };
        wprintln!(writer, "{}", to_json(&dump)?)?;
        return Ok(());
    }

    wprintln!(writer, "{}", "Database definition".bold())?;
    print_definition(writer, &definition, &opts.config)?;

    for entry in &entries {
        wprintln!(writer)?;
        wprintln!(writer, "{}", format!("== {} ==", entry.key).bold())?;
        match &entry.table {
            Ok(table) => table.dump(writer)?,
            Err(e) => wprintln!(writer, "  {}", format!("<{}>", e).red())?,
        }
    }

    if !diagnostics.is_empty() {
        wprintln!(writer)?;
        for diagnostic in &diagnostics {
            wprintln!(writer, "{} {}", "warning:".yellow(), diagnostic)?;
        }
    }

    Ok(())
}
