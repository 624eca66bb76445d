#[cfg(not(feature = "cli"))]
compile_error!("The `crodump` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use tracing_subscriber::EnvFilter;

use cro::cli;
use cro::cli::app::{Cli, ColorMode, Commands};
use cro::cronos::database::StoreKind;
use cro::CroError;

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "cro=debug" } else { "cro=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, CroError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| CroError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Info { dir, json } => cli::info::execute(
            &cli::info::InfoOptions {
                dir,
                json,
                mmap: cli.mmap,
                kod: cli.kod,
            },
            &mut writer,
        ),

        Commands::Strudump {
            dir,
            json,
            style,
            width,
        } => cli::strudump::execute(
            &cli::strudump::StrudumpOptions {
                dir,
                json,
                config: cli::output_config(style, width),
                mmap: cli.mmap,
                kod: cli.kod,
            },
            &mut writer,
        ),

        Commands::Recdump {
            dir,
            stru,
            index,
            sys,
            stats,
            find1d,
            max_records,
            skip_encrypted,
            strict,
            style,
            width,
        } => {
            let store = if index {
                StoreKind::Index
            } else if sys {
                StoreKind::Sys
            } else if stru {
                StoreKind::Stru
            } else {
                StoreKind::Bank
            };
            cli::recdump::execute(
                &cli::recdump::RecdumpOptions {
                    dir,
                    store,
                    stats,
                    find_markers: find1d,
                    max_records,
                    skip_encrypted,
                    strict,
                    config: cli::output_config(style, width),
                    mmap: cli.mmap,
                    kod: cli.kod,
                },
                &mut writer,
            )
        }

        Commands::Dump {
            dir,
            table,
            json,
            files_dir,
        } => cli::dump::execute(
            &cli::dump::DumpOptions {
                dir,
                table,
                json,
                files_dir,
                mmap: cli.mmap,
                kod: cli.kod,
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "crodump", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result.and_then(|_| {
        writer
            .flush()
            .map_err(|e| CroError::Io(format!("Cannot flush output: {}", e)))
    }) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
