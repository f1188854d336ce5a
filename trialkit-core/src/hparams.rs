//! Hyperparameter sets.
//!
//! A training driver keeps its options as a flat name → value mapping. The
//! random stream is not one of those options: it is handed out next to the
//! mapping when loading, seeded from the stored `seed`.

use crate::error::TrialkitError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the training-time seed.
pub const SEED_KEY: &str = "seed";

/// Key that must never reach disk. Older drivers stored their generator here.
pub const RNG_KEY: &str = "rng";

/// Offset added to the stored seed when reloading, so analysis runs draw
/// from a stream decorrelated from the one used in training.
pub const ANALYSIS_SEED_OFFSET: u64 = 1000;

/// A hyperparameter mapping. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hparams(Map<String, Value>);

impl Hparams {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace an option, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.0
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    /// The training-time seed, if present as an integer of either sign.
    pub fn seed(&self) -> Option<i128> {
        let value = self.0.get(SEED_KEY)?;
        value
            .as_i64()
            .map(i128::from)
            .or_else(|| value.as_u64().map(i128::from))
    }

    /// Seed for post-training analysis: `seed + 1000`.
    ///
    /// Fails when there is no integer seed, or when the offset seed falls
    /// outside the `u64` range the generator accepts.
    pub fn analysis_seed(&self) -> Result<u64, TrialkitError> {
        let seed = self
            .seed()
            .ok_or_else(|| TrialkitError::invalid_input("hyperparameters have no integer `seed`"))?;
        let offset = seed + i128::from(ANALYSIS_SEED_OFFSET);
        u64::try_from(offset).map_err(|_| {
            TrialkitError::invalid_input(format!(
                "analysis seed {offset} (seed {seed} + {ANALYSIS_SEED_OFFSET}) is out of range"
            ))
        })
    }

    /// A copy with the non-persistable `rng` entry removed. `self` is untouched.
    pub fn persistable(&self) -> Self {
        let mut copy = self.clone();
        copy.0.remove(RNG_KEY);
        copy
    }
}

impl From<Map<String, Value>> for Hparams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Hparams {
    type Error = TrialkitError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TrialkitError::invalid_input(format!(
                "hyperparameters must be a JSON object, got {other}"
            ))),
        }
    }
}

/// Hyperparameters loaded from disk, paired with a freshly seeded stream.
#[derive(Debug, Clone)]
pub struct SeededHparams {
    pub hparams: Hparams,
    pub rng: StdRng,
}

impl SeededHparams {
    /// Seed a new stream from the mapping's analysis seed.
    pub fn from_hparams(hparams: Hparams) -> Result<Self, TrialkitError> {
        let seed = hparams.analysis_seed()?;
        Ok(Self {
            hparams,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}
