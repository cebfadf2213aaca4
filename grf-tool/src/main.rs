//! Binary entry point.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use grf_tool::commands;
use grf_tool::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "grf-tool",
    about = "Diagnostic tool for GRF archives",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show archive header information
    Info {
        /// Archive file
        archive: PathBuf,
    },

    /// List stored entries
    List {
        /// Archive file
        archive: PathBuf,

        /// Archive filename encoding
        #[arg(long, default_value = "CP949")]
        encoding: String,

        /// Only list entries matching this regex
        #[arg(short, long)]
        pattern: Option<String>,

        /// Include sizes and flags
        #[arg(short, long)]
        long: bool,
    },

    /// Extract one entry to a file or stdout
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Entry name (UTF-8, legacy, or mojibake spelling)
        name: String,

        /// Archive filename encoding
        #[arg(long, default_value = "CP949")]
        encoding: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Attempt extraction of every entry and report failures
    Verify {
        /// Archive file
        archive: PathBuf,
    },

    /// Generate the path-mapping document for legacy-encoded names
    GenMapping {
        /// Archive files to scan
        archives: Vec<PathBuf>,

        /// Archive filename encoding
        #[arg(long, default_value = "CP949")]
        encoding: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Info { archive } => commands::info::handle(&archive, cli.format),
        Commands::List {
            archive,
            encoding,
            pattern,
            long,
        } => commands::list::handle(&archive, &encoding, pattern.as_deref(), long, cli.format),
        Commands::Extract {
            archive,
            name,
            encoding,
            output,
        } => commands::extract::handle(&archive, &name, &encoding, output.as_deref()),
        Commands::Verify { archive } => commands::verify::handle(&archive, cli.format),
        Commands::GenMapping {
            archives,
            encoding,
            output,
        } => commands::mapping::handle(&archives, &encoding, output.as_deref()),
    }
}
