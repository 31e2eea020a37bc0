use rand::seq::{SliceRandom, index};
use rand::{Rng, RngCore};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace, warn};

use crate::config::SamplerConfig;
use crate::constants::sampler::{
    DEFAULT_DRAW_RETRY_LIMIT, MIN_TEXTS_PER_UNIT, PARTITION_SEED, RNG_LOCK_LABEL,
};
use crate::data::{Batch, PairLabel, Text};
use crate::errors::SamplerError;
use crate::store::GroupStore;
use crate::types::GroupIdx;

#[derive(Debug, Clone)]
/// Small deterministic RNG (SplitMix64) used for reproducible sampling.
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a generator whose output is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// Ordered subset of a store's groups that sampling draws from.
///
/// Views share their store through an `Arc`; partitioning copies group
/// indices only, never record bytes.
pub struct SampleView<S: GroupStore> {
    store: Arc<S>,
    group_indices: Vec<GroupIdx>,
}

impl<S: GroupStore> Clone for SampleView<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            group_indices: self.group_indices.clone(),
        }
    }
}

impl<S: GroupStore> std::fmt::Debug for SampleView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleView")
            .field("groups", &self.group_indices.len())
            .field("store_groups", &self.store.num_groups())
            .finish()
    }
}

impl<S: GroupStore> SampleView<S> {
    /// View over every group of `store`, in index order.
    pub fn all_groups(store: Arc<S>) -> Self {
        let group_indices = (0..store.num_groups()).collect();
        Self {
            store,
            group_indices,
        }
    }

    /// View over an explicit list of groups.
    pub fn new(store: Arc<S>, group_indices: Vec<GroupIdx>) -> Result<Self, SamplerError> {
        let num_groups = store.num_groups();
        if let Some(bad) = group_indices.iter().find(|&&idx| idx >= num_groups) {
            return Err(SamplerError::ContractViolation(format!(
                "group index {bad} out of range for {num_groups} groups"
            )));
        }
        Ok(Self {
            store,
            group_indices,
        })
    }

    /// Backing store shared by every view derived from it.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Group indices in this view, in view order.
    pub fn group_indices(&self) -> &[GroupIdx] {
        &self.group_indices
    }

    /// Number of groups in the view.
    pub fn len(&self) -> usize {
        self.group_indices.len()
    }

    /// Whether the view holds no groups.
    pub fn is_empty(&self) -> bool {
        self.group_indices.is_empty()
    }

    /// Split into `(training, testing)` views by a fixed-seed permutation.
    ///
    /// The first `floor(len * testing_fraction)` permuted groups become the
    /// testing view. The seed is a crate constant, so the same view always splits
    /// the same way, across runs and processes.
    pub fn partition(&self, testing_fraction: f64) -> Result<(Self, Self), SamplerError> {
        if !(0.0..=1.0).contains(&testing_fraction) {
            return Err(SamplerError::ContractViolation(format!(
                "testing_fraction must be within [0, 1], got {testing_fraction}"
            )));
        }
        let mut permuted = self.group_indices.clone();
        permuted.shuffle(&mut DeterministicRng::new(PARTITION_SEED));
        let testing_count = ((permuted.len() as f64) * testing_fraction) as usize;
        let training = permuted.split_off(testing_count.min(permuted.len()));
        debug!(
            training = training.len(),
            testing = permuted.len(),
            "partitioned sample view"
        );
        Ok((
            Self {
                store: Arc::clone(&self.store),
                group_indices: training,
            },
            Self {
                store: Arc::clone(&self.store),
                group_indices: permuted,
            },
        ))
    }

    /// Draw a random subset of one random group's texts.
    ///
    /// Groups with fewer than `min` records are rejected and redrawn. The subset
    /// size is uniform in `min..=min(max, group_size)`.
    pub fn random_group<R>(
        &self,
        rng: &mut R,
        min: usize,
        max: usize,
    ) -> Result<Vec<Text>, SamplerError>
    where
        R: Rng + ?Sized,
    {
        self.random_group_with_limit(rng, min, max, DEFAULT_DRAW_RETRY_LIMIT)
    }

    /// `random_group` with an explicit cap on rejected draws.
    pub fn random_group_with_limit<R>(
        &self,
        rng: &mut R,
        min: usize,
        max: usize,
        retry_limit: usize,
    ) -> Result<Vec<Text>, SamplerError>
    where
        R: Rng + ?Sized,
    {
        if min == 0 || max < min {
            return Err(SamplerError::ContractViolation(format!(
                "random_group needs 1 <= min <= max, got min={min} max={max}"
            )));
        }
        if self.is_empty() {
            return Err(SamplerError::InsufficientData { min, attempts: 0 });
        }
        for _ in 0..retry_limit {
            let group_idx = self.group_indices[rng.random_range(0..self.group_indices.len())];
            let mut texts = self.store.read_texts(group_idx)?;
            if texts.len() < min {
                trace!(group_idx, size = texts.len(), min, "rejected undersized group");
                continue;
            }
            let take = rng.random_range(min..=max.min(texts.len()));
            return Ok(index::sample(rng, texts.len(), take)
                .into_iter()
                .map(|local| std::mem::take(&mut texts[local]))
                .collect());
        }
        warn!(
            min,
            attempts = retry_limit,
            groups = self.group_indices.len(),
            "no group satisfied the minimum size"
        );
        Err(SamplerError::InsufficientData {
            min,
            attempts: retry_limit,
        })
    }

    /// Build a batch of same-author and different-author comparison units.
    ///
    /// Units are added until at least `batch_size` texts are collected, so the
    /// final unit may overshoot by up to `max` texts. Each unit draws `min..=max`
    /// texts from one group; with probability `same_author_prob` the last text
    /// stays as the anchor (label 1), otherwise it is replaced by a single text
    /// from an independently drawn group (label 0).
    pub fn batch<R>(
        &self,
        rng: &mut R,
        same_author_prob: f64,
        batch_size: usize,
        min: usize,
        max: usize,
    ) -> Result<Batch, SamplerError>
    where
        R: Rng + ?Sized,
    {
        self.batch_with_limit(
            rng,
            same_author_prob,
            batch_size,
            min,
            max,
            DEFAULT_DRAW_RETRY_LIMIT,
        )
    }

    /// `batch` with an explicit cap on rejected draws per group.
    pub fn batch_with_limit<R>(
        &self,
        rng: &mut R,
        same_author_prob: f64,
        batch_size: usize,
        min: usize,
        max: usize,
        retry_limit: usize,
    ) -> Result<Batch, SamplerError>
    where
        R: Rng + ?Sized,
    {
        if min < MIN_TEXTS_PER_UNIT {
            return Err(SamplerError::ContractViolation(format!(
                "batch needs min >= {MIN_TEXTS_PER_UNIT}, got {min}"
            )));
        }
        if !(0.0..=1.0).contains(&same_author_prob) {
            return Err(SamplerError::ContractViolation(format!(
                "same_author_prob must be within [0, 1], got {same_author_prob}"
            )));
        }
        let mut batch = Batch::default();
        while batch.texts.len() < batch_size {
            let mut texts = self.random_group_with_limit(rng, min, max, retry_limit)?;
            let label = if rng.random_bool(same_author_prob) {
                PairLabel::SameAuthor
            } else {
                let mut other = self.random_group_with_limit(rng, 1, 1, retry_limit)?;
                if let (Some(anchor), Some(replacement)) = (texts.last_mut(), other.pop()) {
                    *anchor = replacement;
                }
                PairLabel::DifferentAuthor
            };
            batch.push_unit(texts, label);
        }
        trace!(
            texts = batch.texts.len(),
            units = batch.num_units(),
            "built batch"
        );
        Ok(batch)
    }
}

/// Batch source bound to one view, one validated config, and one owned RNG.
///
/// The RNG sits behind a mutex so a shared sampler can be driven from several
/// threads; store reads still serialize on the store's own handle.
pub struct BatchSampler<S: GroupStore> {
    view: SampleView<S>,
    config: SamplerConfig,
    rng: Mutex<DeterministicRng>,
}

impl<S: GroupStore> BatchSampler<S> {
    /// Create a sampler over `view`.
    ///
    /// `config.seed` seeds batch draws; without it the seed comes from OS entropy.
    pub fn new(view: SampleView<S>, config: SamplerConfig) -> Result<Self, SamplerError> {
        let config = config.validated()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            view,
            config,
            rng: Mutex::new(DeterministicRng::new(seed)),
        })
    }

    /// Partition all of `store` by `config.testing_fraction` and build a
    /// `(training, testing)` sampler pair.
    pub fn train_test(store: Arc<S>, config: SamplerConfig) -> Result<(Self, Self), SamplerError> {
        let config = config.validated()?;
        let (training, testing) =
            SampleView::all_groups(store).partition(config.testing_fraction)?;
        Ok((
            Self::new(training, config.clone())?,
            Self::new(testing, config)?,
        ))
    }

    /// View batches are drawn from.
    pub fn view(&self) -> &SampleView<S> {
        &self.view
    }

    /// Validated configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Next batch using the configured size, probability, and text bounds.
    pub fn next_batch(&self) -> Result<Batch, SamplerError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SamplerError::Poisoned(RNG_LOCK_LABEL))?;
        self.view.batch_with_limit(
            &mut *rng,
            self.config.same_author_prob,
            self.config.batch_size,
            self.config.min_texts,
            self.config.max_texts,
            self.config.draw_retry_limit,
        )
    }

    /// Random texts from one group using the configured text bounds.
    pub fn next_group(&self) -> Result<Vec<Text>, SamplerError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SamplerError::Poisoned(RNG_LOCK_LABEL))?;
        self.view.random_group_with_limit(
            &mut *rng,
            self.config.min_texts,
            self.config.max_texts,
            self.config.draw_retry_limit,
        )
    }
}
