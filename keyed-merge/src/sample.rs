//! Random sampling of input keys to build a boundary table.
//!
//! The sampler visits up to `max_splits_sampled` input splits, chosen at random, and keeps each
//! key with probability `probability` until it holds `max_samples` keys. From then on, each kept
//! key replaces a random sample and the keep probability shrinks by a factor of
//! `(max_samples - 1) / max_samples`, so later splits cannot crowd out earlier ones.
//!
//! The sorted sample is cut into `partitions` equal slices and the first key of each slice after
//! the first becomes a splitter. Repeated keys are skipped so that splitters strictly ascend; a
//! sample with too few distinct keys produces fewer splitters, and so fewer non-empty partitions.
//!
//! Sampling is a blocking pre-pass: it runs once, to completion, before the sort it configures.

use log::{info, warn};
use rand::{Rng, SeedableRng, StdRng};
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryTable;
use crate::error::{Error, Result};
use crate::group::advance;

/// Parameters of [`RandomSampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Probability with which each key is considered.
    pub probability: f64,
    /// Upper bound on the number of retained samples.
    pub max_samples: usize,
    /// Upper bound on the number of input splits visited.
    pub max_splits_sampled: usize,
    /// Seed for split selection and sampling.
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            probability: 0.1,
            max_samples: 10_000,
            max_splits_sampled: 10,
            seed: 0x5eed,
        }
    }
}

impl SamplerConfig {
    /// Parses a configuration from JSON; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: SamplerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects probabilities outside `(0, 1]` and zero bounds.
    pub fn validate(&self) -> Result<()> {
        if !(self.probability > 0.0 && self.probability <= 1.0) {
            return Err(Error::InvalidConfig(format!("sample probability {} outside (0, 1]", self.probability)));
        }
        if self.max_samples == 0 {
            return Err(Error::InvalidConfig("max_samples must be positive".to_string()));
        }
        if self.max_splits_sampled == 0 {
            return Err(Error::InvalidConfig("max_splits_sampled must be positive".to_string()));
        }
        Ok(())
    }
}

/// Draws a bounded random sample of keys from input splits.
pub struct RandomSampler {
    config: SamplerConfig,
    rng: StdRng,
}

impl RandomSampler {
    /// A sampler seeded from `config.seed`.
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        let seed: &[usize] = &[config.seed as usize];
        let rng: StdRng = SeedableRng::from_seed(seed);
        Ok(RandomSampler { config, rng })
    }

    /// Samples keys from `splits`. The result is unsorted.
    pub fn sample<K: Clone>(&mut self, splits: &[Vec<K>]) -> Vec<K> {
        let mut order: Vec<usize> = (0 .. splits.len()).collect();
        self.rng.shuffle(&mut order);
        order.truncate(self.config.max_splits_sampled);

        let max_samples = self.config.max_samples;
        let shrink = (max_samples - 1) as f64 / max_samples as f64;
        let mut probability = self.config.probability;
        let mut samples = Vec::with_capacity(max_samples.min(1024));

        for index in order {
            for key in splits[index].iter() {
                if self.rng.gen::<f64>() <= probability {
                    if samples.len() < max_samples {
                        samples.push(key.clone());
                    }
                    else {
                        let victim = self.rng.gen_range(0, max_samples);
                        samples[victim] = key.clone();
                        probability *= shrink;
                    }
                }
            }
        }
        samples
    }
}

/// Picks up to `partitions - 1` strictly ascending splitters from a sample.
pub fn splitters<K: Ord + Clone>(mut samples: Vec<K>, partitions: usize) -> Result<BoundaryTable<K>> {
    if partitions == 0 {
        return Err(Error::InvalidConfig("at least one partition is required".to_string()));
    }
    samples.sort();

    let step = samples.len() as f64 / partitions as f64;
    let mut splitters: Vec<K> = Vec::with_capacity(partitions - 1);
    let mut next = 0;
    for index in 1 .. partitions {
        let mut cursor = ((step * index as f64).round() as usize).max(next);
        if let Some(last) = splitters.last() {
            if cursor < samples.len() {
                cursor += advance(&samples[cursor ..], |key| key <= last);
            }
        }
        if cursor >= samples.len() {
            break;
        }
        splitters.push(samples[cursor].clone());
        next = cursor + 1;
    }

    if splitters.len() + 1 < partitions {
        warn!("sample of {} keys supports only {} of {} partitions", samples.len(), splitters.len() + 1, partitions);
    }
    BoundaryTable::new(splitters)
}

/// Samples `splits` and computes a boundary table for `partitions` ranges.
pub fn sample<K: Ord + Clone>(splits: &[Vec<K>], config: &SamplerConfig, partitions: usize) -> Result<BoundaryTable<K>> {
    let mut sampler = RandomSampler::new(config.clone())?;
    let samples = sampler.sample(splits);
    info!("sampled {} keys from {} splits", samples.len(), splits.len().min(config.max_splits_sampled));
    splitters(samples, partitions)
}
