//! # trialkit-core — experiment artifacts and cluster job files
//!
//! Glue for an external training driver: it persists per-model training logs
//! and hyperparameter files under fixed naming conventions, discovers saved
//! model names, wires trial arrays into a model's input slots, and renders
//! SLURM batch scripts.
//!
//! Nothing here runs a model or submits a job. Every operation is a
//! synchronous wrapper over the filesystem, `serde_json`, or `handlebars`.

pub mod config;
pub mod error;
pub mod feed;
pub mod hparams;
pub mod jobfile;
pub mod persistence;
pub mod saves;
pub mod store;

pub use config::{load_config, JobsConfig, StoreConfig, TrialkitConfig};
pub use error::TrialkitError;
pub use feed::{gen_feed_dict, FeedDict, InputType, Trial};
pub use hparams::{Hparams, SeededHparams, ANALYSIS_SEED_OFFSET};
pub use jobfile::{truncate_job_name, write_jobfile, JobSpec, JobWriter, Resources};
pub use persistence::ensure_dir;
pub use saves::valid_save_names;
pub use store::ArtifactStore;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrialkitError>;
