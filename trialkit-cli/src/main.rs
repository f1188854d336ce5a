//! trialkit CLI — inspect experiment artifacts and write SLURM job files.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// trialkit: experiment logs, hyperparameters, and batch scripts
#[derive(Parser, Debug)]
#[command(name = "trialkit", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Write a SLURM batch script and print its path
    Job {
        /// Job name (the script is <sbatch-dir>/<name>.s)
        name: String,
        /// Shell command the job runs
        command: String,
        /// Directory for the generated script
        #[arg(long)]
        sbatch_dir: Option<PathBuf>,
        /// Working directory of the job
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
        /// Number of nodes
        #[arg(long, allow_negative_numbers = true)]
        nodes: Option<i64>,
        /// Cores per node
        #[arg(long, allow_negative_numbers = true)]
        ppn: Option<i64>,
        /// Number of GPUs (0 writes a CPU script)
        #[arg(long, allow_negative_numbers = true)]
        gpus: Option<i64>,
        /// Memory in GB
        #[arg(long, allow_negative_numbers = true)]
        mem: Option<i64>,
        /// Wall-clock limit in hours
        #[arg(long, allow_negative_numbers = true)]
        hours: Option<i64>,
    },
    /// Inspect training logs
    Log {
        #[command(subcommand)]
        action: LogAction,
    },
    /// Inspect hyperparameter files
    Hparams {
        #[command(subcommand)]
        action: HparamsAction,
    },
    /// List save names whose checkpoint matches a glob pattern
    Saves {
        /// Glob over save names, e.g. "rnn_seed*"
        pattern: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum LogAction {
    /// Print the log of a saved model
    Show {
        /// Save name of the model
        name: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum HparamsAction {
    /// Print the hyperparameters stored in a save directory
    Show {
        /// Directory containing hparams.json
        dir: PathBuf,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "trialkit", "trialkit")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "trialkit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = trialkit_core::load_config(Some(workspace.as_path()), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    commands::handle_command(cli.command, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_job_with_resources() {
        let cli = Cli::try_parse_from([
            "trialkit", "job", "test_job", "echo hi", "--ppn", "2", "--gpus", "1", "--mem", "8",
            "--hours", "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Job {
                name,
                command,
                ppn,
                gpus,
                mem,
                hours,
                nodes,
                ..
            } => {
                assert_eq!(name, "test_job");
                assert_eq!(command, "echo hi");
                assert_eq!((ppn, gpus, mem, hours), (Some(2), Some(1), Some(8), Some(1)));
                assert_eq!(nodes, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_nodes() {
        let cli = Cli::try_parse_from(["trialkit", "job", "j", "true", "--nodes", "-2"]).unwrap();
        assert!(matches!(cli.command, Commands::Job { nodes: Some(-2), .. }));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["trialkit", "log", "show", "rnn", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Log {
                action: LogAction::Show { .. }
            }
        ));
    }
}
