//! CLI tools for conveyor
//!
//! Provides utilities around pipeline definition files:
//! - `check`: Validate a pipeline file (specs + graph) without running it
//! - `run`: Execute a pipeline file with the local executor
//! - `completions`: Generate shell completions

pub mod check;
pub mod completions;
pub mod run;

use anyhow::{Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use conveyor::pipeline::TriggerEvent;
use std::path::PathBuf;

/// CLI arguments for conveyor
#[derive(Parser, Debug)]
#[command(name = "conveyor")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a pipeline file without executing it
    Check {
        /// Pipeline file to validate
        file: PathBuf,
    },

    /// Execute a pipeline file with the local executor
    Run {
        /// Pipeline file to run
        file: PathBuf,
        /// Trigger event kind
        #[arg(short, long, value_enum, default_value = "push")]
        event: EventArg,
        /// Source branch
        #[arg(short, long, default_value = "main")]
        branch: String,
        /// Commit identifier
        #[arg(short, long, default_value = "HEAD")]
        commit: String,
        /// Pull request number (required for pull-request events)
        #[arg(long)]
        pr_number: Option<u64>,
        /// Worker pool size override
        #[arg(long)]
        pool: Option<usize>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EventArg {
    Push,
    PullRequest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Check { file } => {
            check::check_pipeline(&file)?;
        }
        Command::Run {
            file,
            event,
            branch,
            commit,
            pr_number,
            pool,
        } => {
            let event = match event {
                EventArg::Push => TriggerEvent::push(branch, commit),
                EventArg::PullRequest => {
                    let Some(number) = pr_number else {
                        bail!("--pr-number is required for pull-request events");
                    };
                    TriggerEvent::pull_request(branch, commit, number)
                }
            };

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run::execute(&file, event, pool))?;
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{}", completions);
            }
        }
    }

    Ok(())
}
