//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, HparamsAction, LogAction};
use anyhow::Context;
use std::path::{Path, PathBuf};
use trialkit_core::{ArtifactStore, JobSpec, JobWriter, Resources, TrialkitConfig};

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, config: &TrialkitConfig) -> anyhow::Result<()> {
    match command {
        Commands::Job {
            name,
            command,
            sbatch_dir,
            scratch_dir,
            nodes,
            ppn,
            gpus,
            mem,
            hours,
        } => {
            let defaults = config.jobs.resources();
            let resources = Resources {
                nodes: nodes.unwrap_or(defaults.nodes),
                ppn: ppn.unwrap_or(defaults.ppn),
                gpus: gpus.unwrap_or(defaults.gpus),
                mem_gb: mem.unwrap_or(defaults.mem_gb),
                hours: hours.unwrap_or(defaults.hours),
            };
            let spec = JobSpec::new(
                command,
                name,
                sbatch_dir.unwrap_or_else(|| config.jobs.sbatch_dir.clone()),
                scratch_dir.unwrap_or_else(|| config.jobs.scratch_dir.clone()),
            )
            .with_resources(resources);
            let path = write_job(&spec)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Log { action } => handle_log(action, config),
        Commands::Hparams { action } => handle_hparams(action),
        Commands::Saves { pattern } => {
            let data_dir = &config.store.data_dir;
            let names = trialkit_core::valid_save_names(data_dir, &pattern)
                .with_context(|| format!("Failed to list save names in {}", data_dir.display()))?;
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Config { action } => handle_config(action, config),
    }
}

fn write_job(spec: &JobSpec) -> anyhow::Result<PathBuf> {
    let writer = JobWriter::new()?;
    writer
        .write(spec)
        .with_context(|| format!("Failed to write job file for '{}'", spec.job_name))
}

fn handle_log(action: LogAction, config: &TrialkitConfig) -> anyhow::Result<()> {
    match action {
        LogAction::Show { name } => {
            let store = ArtifactStore::new(&config.store.data_dir);
            match store.load_log::<serde_json::Value>(&name)? {
                Some(log) => println!("{}", serde_json::to_string_pretty(&log)?),
                None => println!(
                    "No log for '{}' at {}",
                    name,
                    store.log_path(&name).display()
                ),
            }
            Ok(())
        }
    }
}

fn handle_hparams(action: HparamsAction) -> anyhow::Result<()> {
    match action {
        HparamsAction::Show { dir } => print_hparams(&dir),
    }
}

fn print_hparams(dir: &Path) -> anyhow::Result<()> {
    let Some(seeded) = ArtifactStore::load_hparams(dir)
        .with_context(|| format!("Failed to load hyperparameters from {}", dir.display()))?
    else {
        println!("No hyperparameters in {}", dir.display());
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&seeded.hparams)?);
    println!("analysis seed: {}", seeded.hparams.analysis_seed()?);
    Ok(())
}

fn handle_config(action: ConfigAction, config: &TrialkitConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}
