// Shell configuration (CLI flags with environment fallbacks)

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Removal buffer capacity, terminator included
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored (development)
    Pretty,
    /// JSON lines (machine-readable)
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "queue-shell")]
#[command(about = "Drive and fault-test the text queue from a command script", long_about = None)]
#[command(version)]
pub struct ShellConfig {
    /// Script to run; commands are read from stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Capacity of the buffer removed values are copied into
    #[arg(long, env = "QUEUE_STRING_BUFFER", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Exit with a non-zero status if any command failed or storage leaked
    #[arg(long)]
    pub strict: bool,

    /// Log format for stderr diagnostics
    #[arg(long, env = "QUEUE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}
