//! Queue Shell - command interpreter for the text queue
//! Reads commands from a script or stdin and reports leaks at exit

mod command;
mod config;
mod interpreter;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use config::ShellConfig;
use interpreter::Interpreter;
use std::fs::File;
use std::io::{self, BufReader};
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // 1. Load configuration
    let config = ShellConfig::parse();

    // 2. Initialize logging
    logging::init_logging(config.log_format)?;
    info!(
        version = VERSION,
        core = queue_core::VERSION,
        buffer_size = config.buffer_size,
        "Queue shell starting"
    );

    // 3. Run the script
    let stdout = io::stdout();
    let mut interpreter = Interpreter::new(config.buffer_size, stdout.lock());
    match &config.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            interpreter.run(BufReader::new(file))?;
        }
        None => interpreter.run(io::stdin().lock())?,
    }

    // 4. Tear down and report
    let summary = interpreter.finish()?;
    info!(
        commands = summary.commands,
        failures = summary.failures,
        leaked = summary.leaked,
        "Queue shell finished"
    );

    if summary.failures > 0 {
        eprintln!(
            "{}",
            format!("{} command(s) failed", summary.failures).red().bold()
        );
        if config.strict {
            std::process::exit(1);
        }
    }

    Ok(())
}
