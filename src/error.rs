//! Error taxonomy for the segmentation pipeline

use thiserror::Error;

/// Errors raised by any pipeline stage.
///
/// Both variants are fatal to a run. A zero-variance feature column is not
/// an error: it normalizes to zero.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SegmentationError {
    /// Invalid pipeline configuration (cluster count, region list, distribution parameters).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what is misconfigured.
        message: String,
    },

    /// A stage produced no rows, an empty cluster, or a non-finite statistic.
    #[error("Data integrity error: {message}")]
    DataIntegrity {
        /// Description of what went wrong.
        message: String,
    },
}

impl SegmentationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::DataIntegrity { .. })
    }
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
