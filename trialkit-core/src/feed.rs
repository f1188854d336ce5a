//! Wiring trial arrays into a model's input slots.
//!
//! A model exposes three inputs: the network input `x`, the target `y`, and
//! the cost mask `c_mask`. With `in_type = "normal"` the trial's arrays go in
//! unchanged. With `in_type = "multi"` each example's sensory block is moved
//! into the slice of a wider input reserved for its active rule, so every
//! rule gets its own set of input weights.

use crate::error::TrialkitError;
use crate::hparams::Hparams;
use ndarray::{s, Array2, Array3};
use std::fmt;
use std::str::FromStr;

/// How trial inputs map onto the model's input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Normal,
    Multi,
}

impl FromStr for InputType {
    type Err = TrialkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "multi" => Ok(Self::Multi),
            other => Err(TrialkitError::invalid_input(format!(
                "unknown in_type `{other}` (expected `normal` or `multi`)"
            ))),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Multi => write!(f, "multi"),
        }
    }
}

/// A batch of generated trials, time-major: `[n_time, batch, units]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub x: Array3<f32>,
    pub y: Array3<f32>,
    pub c_mask: Array2<f32>,
}

/// Values for the model's three input slots.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDict {
    pub x: Array3<f32>,
    pub y: Array3<f32>,
    pub c_mask: Array2<f32>,
}

/// Build the feed dict for one session run.
pub fn gen_feed_dict(trial: &Trial, hparams: &Hparams) -> Result<FeedDict, TrialkitError> {
    let in_type: InputType = hparams
        .get_str("in_type")
        .ok_or_else(|| TrialkitError::invalid_input("hyperparameters have no `in_type`"))?
        .parse()?;

    let x = match in_type {
        InputType::Normal => trial.x.clone(),
        InputType::Multi => {
            let rule_start = required_usize(hparams, "rule_start")?;
            let n_rule = required_usize(hparams, "n_rule")?;
            expand_rule_inputs(&trial.x, rule_start, n_rule)?
        }
    };

    Ok(FeedDict {
        x,
        y: trial.y.clone(),
        c_mask: trial.c_mask.clone(),
    })
}

fn required_usize(hparams: &Hparams, key: &str) -> Result<usize, TrialkitError> {
    hparams.get_usize(key).ok_or_else(|| {
        TrialkitError::invalid_input(format!(
            "`{key}` must be a non-negative integer for multi input"
        ))
    })
}

/// Place each example's first `rule_start` units at the block of its active rule.
fn expand_rule_inputs(
    x: &Array3<f32>,
    rule_start: usize,
    n_rule: usize,
) -> Result<Array3<f32>, TrialkitError> {
    let (n_time, batch, n_input) = x.dim();
    if n_input <= rule_start {
        return Err(TrialkitError::shape(format!(
            "input has {n_input} units, no rule units after rule_start={rule_start}"
        )));
    }
    if n_time == 0 && batch > 0 {
        return Err(TrialkitError::shape("trial has no time steps"));
    }

    let mut expanded = Array3::<f32>::zeros((n_time, batch, rule_start * n_rule));
    for i in 0..batch {
        let rule = argmax(x.slice(s![0, i, rule_start..]).iter().copied());
        if rule >= n_rule {
            return Err(TrialkitError::shape(format!(
                "example {i} selects rule {rule}, but n_rule={n_rule}"
            )));
        }
        let start = rule * rule_start;
        expanded
            .slice_mut(s![.., i, start..start + rule_start])
            .assign(&x.slice(s![.., i, ..rule_start]));
    }
    Ok(expanded)
}

/// Index of the first maximum.
fn argmax(values: impl Iterator<Item = f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}
