//! Chart-ready projection of an analysis result

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::SeasonalTrends;
use crate::personas::PersonaId;
use crate::pipeline::AnalysisResult;

/// Parallel series in ascending persona id order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketSeries {
    pub persona_names: Vec<String>,
    pub market_values: Vec<u64>,
    pub populations: Vec<u64>,
    pub effectiveness: Vec<f64>,
}

/// Parallel series in catalogue order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpportunitySeries {
    pub opportunity_types: Vec<String>,
    pub market_sizes: Vec<u64>,
    pub roi_ranges: Vec<String>,
    pub investment_levels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonaSeasonality {
    pub persona_name: String,
    pub trends: SeasonalTrends,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VisualizationData {
    pub market_analysis: MarketSeries,
    pub opportunity_analysis: OpportunitySeries,
    /// Keyed by id; persona names repeat once clusters outnumber templates
    pub seasonal_trends: BTreeMap<PersonaId, PersonaSeasonality>,
    pub generated_at: DateTime<Utc>,
}

pub fn create_advanced_visualizations(result: &AnalysisResult) -> VisualizationData {
    let personas = result.personas.values();

    let market_analysis = MarketSeries {
        persona_names: personas.clone().map(|p| p.persona_name.clone()).collect(),
        market_values: personas.clone().map(|p| p.market_value).collect(),
        populations: personas.clone().map(|p| p.estimated_population).collect(),
        effectiveness: personas.map(|p| p.targeting_effectiveness).collect(),
    };

    let opportunities = &result.opportunities;
    let opportunity_analysis = OpportunitySeries {
        opportunity_types: opportunities.iter().map(|o| o.opportunity_type.clone()).collect(),
        market_sizes: opportunities.iter().map(|o| o.estimated_market_size).collect(),
        roi_ranges: opportunities.iter().map(|o| o.expected_roi.clone()).collect(),
        investment_levels: opportunities.iter().map(|o| o.investment_level.clone()).collect(),
    };

    let seasonal_trends = result
        .personas
        .iter()
        .map(|(&id, p)| {
            (
                id,
                PersonaSeasonality {
                    persona_name: p.persona_name.clone(),
                    trends: p.seasonal_trends,
                },
            )
        })
        .collect();

    VisualizationData {
        market_analysis,
        opportunity_analysis,
        seasonal_trends,
        generated_at: result.data_summary.analysis_date,
    }
}
