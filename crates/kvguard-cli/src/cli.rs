use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kvguard")]
#[command(
    author,
    version,
    about = "Detect and mask Turkish personal data in text"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a file (or stdin) and print the masked text
    Scan {
        /// Input file; stdin when omitted
        path: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long, default_value = "kvguard.yaml")]
        config: PathBuf,

        /// Use pattern rules only
        #[arg(long)]
        no_semantic: bool,

        /// Semantic call deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check a value against a checksum validator
    Validate {
        #[arg(value_enum)]
        kind: ValidateKind,

        /// Value to check
        value: String,
    },

    /// List supported categories
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Masked text only
    Text,
    /// Masked text, spans and summary as JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidateKind {
    /// Turkish national identification number
    NationalId,
    /// Turkish IBAN
    Iban,
}
