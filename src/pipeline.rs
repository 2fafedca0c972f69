//! End-to-end analysis run
//!
//! generate -> assemble -> segment -> personas -> opportunities ->
//! predictive -> intelligence, all driven by one seeded RNG.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::assemble_features;
use crate::generators::generate_dataset;
use crate::intelligence::{generate_market_intelligence, MarketIntelligence};
use crate::opportunities::{identify_opportunities, Opportunity};
use crate::personas::{synthesize_personas, Persona, PersonaId};
use crate::predictive::{generate_predictive_insights, PredictiveInsights};
use crate::segmentation::{perform_segmentation, KMeansParams, SegmentationResult};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataSummary {
    pub mobility_records: usize,
    pub spending_records: usize,
    pub demographic_records: usize,
    pub analysis_date: DateTime<Utc>,
}

/// Root artifact of a run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub personas: BTreeMap<PersonaId, Persona>,
    pub opportunities: Vec<Opportunity>,
    pub insights: MarketIntelligence,
    pub predictive_analytics: PredictiveInsights,
    pub segmentation_results: SegmentationResult,
    pub data_summary: DataSummary,
}

/// Run with the default configuration, stamped with the current time
pub fn generate_comprehensive_analysis() -> Result<AnalysisResult> {
    run_analysis(&PipelineConfig::default())
}

pub fn run_analysis(config: &PipelineConfig) -> Result<AnalysisResult> {
    run_analysis_at(config, Utc::now())
}

/// Same as [`run_analysis`] with a fixed timestamp, so equal configs give
/// equal results
pub fn run_analysis_at(
    config: &PipelineConfig,
    analysis_date: DateTime<Utc>,
) -> Result<AnalysisResult> {
    config.validate()?;
    info!(
        "Starting analysis: seed {}, {} clusters, {} regions",
        config.seed,
        config.n_clusters,
        config.region_codes.len()
    );

    let mut rng = StdRng::seed_from_u64(config.seed);

    let dataset = generate_dataset(&config.region_codes, &mut rng)?;
    let table = assemble_features(&dataset.mobility, &dataset.spending)?;
    let segmentation = perform_segmentation(&table, KMeansParams::from(config), &mut rng)?;
    let personas = synthesize_personas(&segmentation, &dataset.demographics, &mut rng)?;
    let opportunities = identify_opportunities();
    let predictive_analytics = generate_predictive_insights(&dataset.mobility, &dataset.spending);
    let insights = generate_market_intelligence(&personas, &opportunities)?;

    let data_summary = DataSummary {
        mobility_records: dataset.mobility.len(),
        spending_records: dataset.spending.len(),
        demographic_records: dataset.demographics.len(),
        analysis_date,
    };

    info!(
        "Analysis complete: {} personas, {} opportunities",
        personas.len(),
        opportunities.len()
    );

    Ok(AnalysisResult {
        personas,
        opportunities,
        insights,
        predictive_analytics,
        segmentation_results: segmentation,
        data_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_run_counts() {
        let result = run_analysis_at(&PipelineConfig::default(), fixed_time()).unwrap();

        assert_eq!(result.data_summary.mobility_records, 7);
        // 6 categories plus the total row per region
        assert_eq!(result.data_summary.spending_records, 49);
        assert_eq!(result.data_summary.demographic_records, 7);
        assert_eq!(result.personas.len(), 4);
        assert_eq!(result.opportunities.len(), 5);
        assert_eq!(result.data_summary.analysis_date, fixed_time());
    }

    #[test]
    fn test_invalid_config_stops_before_generation() {
        let config = PipelineConfig::default().with_clusters(0);
        let err = run_analysis_at(&config, fixed_time()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_result_serializes() {
        let result = run_analysis_at(&PipelineConfig::default(), fixed_time()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert!(json["personas"]["persona_0"].is_object());
        assert_eq!(json["segmentation_results"]["algorithm"], "kmeans");
        assert_eq!(json["insights"]["market_overview"]["number_of_segments"], 4);
        assert_eq!(json["data_summary"]["analysis_date"], "2024-05-01T12:00:00Z");
    }
}
