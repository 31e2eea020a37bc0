use serde::{Deserialize, Serialize};

use crate::constants::sampler::{DEFAULT_DRAW_RETRY_LIMIT, MIN_TEXTS_PER_UNIT};
use crate::constants::store::DEFAULT_STREAM_CAPACITY;
use crate::errors::SamplerError;

/// Top-level batch sampling configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Soft cap on the number of texts per batch; the last unit may overshoot it.
    pub batch_size: usize,
    /// Probability that a comparison unit keeps its own author's anchor.
    pub same_author_prob: f64,
    /// Minimum texts drawn from one group (query plus anchor).
    pub min_texts: usize,
    /// Maximum texts drawn from one group.
    pub max_texts: usize,
    /// Fraction of groups held out for testing by `partition`.
    pub testing_fraction: f64,
    /// Rejected group draws tolerated before reporting insufficient data.
    pub draw_retry_limit: usize,
    /// Seed for batch draws; `None` seeds from OS entropy.
    ///
    /// This never affects the train/test partition.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            same_author_prob: 0.5,
            min_texts: 3,
            max_texts: 16,
            testing_fraction: 0.1,
            draw_retry_limit: DEFAULT_DRAW_RETRY_LIMIT,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Check value ranges, returning the config unchanged when valid.
    pub fn validated(self) -> Result<Self, SamplerError> {
        if !(0.0..=1.0).contains(&self.same_author_prob) {
            return Err(SamplerError::Configuration(format!(
                "same_author_prob must be within [0, 1], got {}",
                self.same_author_prob
            )));
        }
        if !(0.0..=1.0).contains(&self.testing_fraction) {
            return Err(SamplerError::Configuration(format!(
                "testing_fraction must be within [0, 1], got {}",
                self.testing_fraction
            )));
        }
        if self.min_texts < MIN_TEXTS_PER_UNIT {
            return Err(SamplerError::Configuration(format!(
                "min_texts must be at least {MIN_TEXTS_PER_UNIT}, got {}",
                self.min_texts
            )));
        }
        if self.max_texts < self.min_texts {
            return Err(SamplerError::Configuration(format!(
                "max_texts ({}) must not be below min_texts ({})",
                self.max_texts, self.min_texts
            )));
        }
        if self.draw_retry_limit == 0 {
            return Err(SamplerError::Configuration(
                "draw_retry_limit must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Tuning for the two-stage streaming reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Bounded hand-off capacity between stages (values below 1 are raised to 1).
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}
