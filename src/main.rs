//! conveyor - CLI for the conveyor pipeline orchestration engine
//!
//! Validates and executes pipeline definition files.
//!
//! ## Commands
//!
//! - `conveyor check` - Validate a pipeline file without running it
//! - `conveyor run` - Execute a pipeline file with the local executor
//! - `conveyor completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate a pipeline
//! conveyor check pipeline.yml
//!
//! # Run it for a pull request
//! conveyor run pipeline.yml --event pull-request --branch feature/x \
//!     --commit abc1234 --pr-number 42
//!
//! # Generate shell completions
//! conveyor completions bash > /etc/bash_completion.d/conveyor
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Initialize tracing; CONVEYOR_DEBUG lowers the default level
    let level = if std::env::var("CONVEYOR_DEBUG").is_ok() {
        "debug"
    } else {
        "info"
    };
    conveyor::infrastructure::init_logging(level);

    // Run the CLI
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if std::env::var("CONVEYOR_VERBOSE").is_ok() {
                eprintln!("{:?}", e);
            }
            ExitCode::FAILURE
        }
    }
}
