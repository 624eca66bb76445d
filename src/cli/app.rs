use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "crodump")]
#[command(about = "Cronos database inspection toolkit")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Log store opening and sweep progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Memory-map the .dat files instead of buffered reads
    #[arg(long, global = true)]
    pub mmap: bool,

    /// 256-byte substitution table for KOD-encoded stores
    #[arg(long, global = true)]
    pub kod: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Rendering of binary values.
#[derive(Clone, Copy, ValueEnum)]
pub enum StyleArg {
    /// Compact hex string
    Hex,
    /// Printable ASCII, '.' for other bytes
    Ascii,
    /// Escaped string literal
    Escaped,
    /// Hex dump with offsets
    Dump,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the header of every store in a database directory
    Info {
        /// Database directory holding the Cro*.dat/Cro*.tad files
        dir: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the database definition and all table definitions
    Strudump {
        /// Database directory holding the Cro*.dat/Cro*.tad files
        dir: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// How binary values are rendered
        #[arg(long, default_value = "hex")]
        style: StyleArg,

        /// Render at most this many bytes per value
        #[arg(short, long)]
        width: Option<usize>,
    },

    /// Walk a store record by record
    #[command(group(ArgGroup::new("store").args(["stru", "index", "sys"])))]
    Recdump {
        /// Database directory holding the Cro*.dat/Cro*.tad files
        dir: String,

        /// Sweep CroStru instead of CroBank
        #[arg(long)]
        stru: bool,

        /// Sweep CroIndex instead of CroBank
        #[arg(long)]
        index: bool,

        /// Sweep CroSys instead of CroBank
        #[arg(long)]
        sys: bool,

        /// Print table-id and byte-value histograms instead of records
        #[arg(long, conflicts_with = "find1d")]
        stats: bool,

        /// Stop at the first record containing a 0x1d or 0x1b marker
        #[arg(long)]
        find1d: bool,

        /// Highest record number to visit (default: all)
        #[arg(short = 'n', long = "max-records")]
        max_records: Option<u32>,

        /// Do nothing when the store is password-encrypted
        #[arg(long = "skip-encrypted")]
        skip_encrypted: bool,

        /// Stop at the first record that fails to read
        #[arg(long)]
        strict: bool,

        /// How record bytes are rendered
        #[arg(long, default_value = "hex")]
        style: StyleArg,

        /// Render at most this many bytes per record
        #[arg(short, long)]
        width: Option<usize>,
    },

    /// Decode table rows and extract stored files
    Dump {
        /// Database directory holding the Cro*.dat/Cro*.tad files
        dir: String,

        /// Only dump the table with this name
        #[arg(short, long)]
        table: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Write every stored file to DIR/<record>.bin
        #[arg(long = "files-dir")]
        files_dir: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
