use clap::{ArgAction, Parser, ValueEnum};
use fb2info::{ExtractOptions, FieldLimits, Mode, FB2_NAMESPACE};
use std::path::PathBuf;

/// Show title, author and series of FictionBook2 (.fb2, .fb2.zip) files
#[derive(Parser, Debug)]
#[command(name = "fb2info", version, about)]
pub struct Cli {
    /// Files to inspect. Names not ending in .fb2 or .fb2.zip are reported as non-FB2
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Parsing strategy
    #[arg(long, value_enum, default_value_t = ModeArg::Streaming)]
    pub mode: ModeArg,

    /// Namespace URI bound for path queries in DOM mode
    #[arg(long, default_value = FB2_NAMESPACE)]
    pub namespace: String,

    /// Tolerate mismatched end tags instead of rejecting the file
    #[arg(long, default_value_t = false)]
    pub lenient: bool,

    /// Truncate fields to the fixed column widths of the old file-manager extension
    #[arg(long, default_value_t = false)]
    pub legacy_widths: bool,

    /// Print one JSON object per file instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Number of worker threads (default: one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip the remaining files after the first failure
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Streaming,
    Dom,
}

impl Cli {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            mode: match self.mode {
                ModeArg::Streaming => Mode::Streaming,
                ModeArg::Dom => Mode::Dom,
            },
            limits: if self.legacy_widths {
                FieldLimits::LEGACY
            } else {
                FieldLimits::UNBOUNDED
            },
            lenient: self.lenient,
            namespace: self.namespace.clone(),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
