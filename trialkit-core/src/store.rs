//! Experiment artifact store: training logs and hyperparameter files.
//!
//! Layout:
//! - `<data_dir>/log_<save_name>.pkl` holds a model's training log, encoded
//!   as MessagePack so non-finite floats and other non-JSON values survive.
//! - `<save_dir>/hparams.json` holds the hyperparameters of one run.
//!
//! A missing file is the normal state of a model that has not been trained
//! yet, so loaders answer `Ok(None)` instead of failing. Saves replace the
//! whole file, creating missing parent directories; there is no merging and
//! no locking.

use crate::error::TrialkitError;
use crate::hparams::{Hparams, SeededHparams};
use crate::persistence::{atomic_write, atomic_write_json, load_bytes, load_json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the hyperparameter file inside a save directory.
pub const HPARAMS_FILE: &str = "hparams.json";

/// Store rooted at the directory that holds training logs.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the log file for `save_name`.
    pub fn log_path(&self, save_name: &str) -> PathBuf {
        self.data_dir.join(format!("log_{save_name}.pkl"))
    }

    /// Path of the hyperparameter file inside `save_dir`.
    pub fn hparams_path(save_dir: &Path) -> PathBuf {
        save_dir.join(HPARAMS_FILE)
    }

    /// Load the training log of `save_name`, or `None` if it was never saved.
    pub fn load_log<T: DeserializeOwned>(&self, save_name: &str) -> Result<Option<T>, TrialkitError> {
        let path = self.log_path(save_name);
        let log = match load_bytes(&path)? {
            Some(bytes) => Some(rmp_serde::from_slice(&bytes)?),
            None => None,
        };
        tracing::debug!(
            path = %path.display(),
            name = save_name,
            found = log.is_some(),
            "load log"
        );
        Ok(log)
    }

    /// Save the training log of `save_name`, replacing any previous log.
    pub fn save_log<T: Serialize + ?Sized>(&self, log: &T, save_name: &str) -> Result<(), TrialkitError> {
        let path = self.log_path(save_name);
        let bytes = rmp_serde::to_vec_named(log)?;
        atomic_write(&path, &bytes)?;
        tracing::debug!(path = %path.display(), name = save_name, bytes = bytes.len(), "saved log");
        Ok(())
    }

    /// Load the hyperparameters stored in `save_dir`.
    ///
    /// The returned stream is seeded with the stored seed plus 1000. Returns
    /// `None` when `save_dir` has no hyperparameter file.
    pub fn load_hparams(save_dir: &Path) -> Result<Option<SeededHparams>, TrialkitError> {
        let path = Self::hparams_path(save_dir);
        let Some(hparams) = load_json::<Hparams>(&path)? else {
            tracing::debug!(path = %path.display(), "no hyperparameter file");
            return Ok(None);
        };
        let seeded = SeededHparams::from_hparams(hparams)?;
        tracing::debug!(
            path = %path.display(),
            options = seeded.hparams.len(),
            "loaded hyperparameters"
        );
        Ok(Some(seeded))
    }

    /// Save `hparams` to `save_dir`, leaving out any `rng` entry.
    pub fn save_hparams(hparams: &Hparams, save_dir: &Path) -> Result<(), TrialkitError> {
        let path = Self::hparams_path(save_dir);
        atomic_write_json(&path, &hparams.persistable())?;
        tracing::debug!(path = %path.display(), "saved hyperparameters");
        Ok(())
    }
}
