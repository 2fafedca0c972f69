//! Pipeline configuration
//!
//! Defaults reproduce the reference run: seed 42, four clusters, seven
//! counties. Binaries may load overrides from a JSON file and then apply
//! command-line flags on top.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SegmentationError};
use crate::regions::{check_region_codes, default_region_codes};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_CLUSTERS: usize = 4;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed for the single run-wide random generator
    pub seed: u64,
    /// Number of clusters (k)
    pub n_clusters: usize,
    /// Iteration cap for centroid refinement
    pub max_iterations: usize,
    /// Centroid shift below which refinement stops
    pub tolerance: f64,
    /// Regions to generate, in order
    pub region_codes: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            n_clusters: DEFAULT_CLUSTERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            region_codes: default_region_codes(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SegmentationError::configuration(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SegmentationError::configuration(format!(
                "invalid config file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_regions<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Checks that do not depend on generated data. The region-count
    /// check against `n_clusters` is repeated by the segmentation engine
    /// on the regions that survive the join.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(SegmentationError::configuration(
                "cluster count must be at least 1",
            ));
        }

        if self.region_codes.is_empty() {
            return Err(SegmentationError::configuration("region list is empty"));
        }

        check_region_codes(&self.region_codes)?;

        if self.region_codes.len() < self.n_clusters {
            return Err(SegmentationError::configuration(format!(
                "{} clusters requires at least {} regions, but only {} were requested",
                self.n_clusters,
                self.n_clusters,
                self.region_codes.len()
            )));
        }

        if self.max_iterations == 0 {
            return Err(SegmentationError::configuration(
                "max_iterations must be at least 1",
            ));
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SegmentationError::configuration(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }

        Ok(())
    }
}
