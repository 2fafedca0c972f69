//! Regional mobility and spending segmentation
//!
//! Generates seeded synthetic mobility, spending and demographic tables for a
//! set of regions, clusters the regions with k-means, and turns the clusters
//! into marketing personas with opportunity, forecast and market summaries.

pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod generators;
pub mod intelligence;
pub mod models;
pub mod opportunities;
pub mod personas;
pub mod pipeline;
pub mod predictive;
pub mod regions;
pub mod segmentation;
pub mod visualization;

pub use config::PipelineConfig;
pub use error::{Result, SegmentationError};
pub use pipeline::{
    generate_comprehensive_analysis, run_analysis, run_analysis_at, AnalysisResult, DataSummary,
};
pub use visualization::{create_advanced_visualizations, VisualizationData};
