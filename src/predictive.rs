//! Predictive insights - what will happen?
//! Demand forecast, seasonal multipliers, expansion and revenue scenarios.
//!
//! The report is a fixed structure and does not depend on the seed. Only
//! the `basis` block reads the input tables, and it records row counts.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{MobilityRecord, Season, SpendingRecord};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuarterForecast {
    pub expected_growth: String,
    pub peak_months: Vec<String>,
    pub growth_drivers: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SeasonalPattern {
    pub multiplier: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DemandForecast {
    pub next_quarter: QuarterForecast,
    pub seasonal_patterns: BTreeMap<Season, SeasonalPattern>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketExpansion {
    pub high_potential_areas: Vec<String>,
    pub expansion_roi: String,
    pub optimal_timing: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserBehaviorTrends {
    pub increasing_trip_duration: String,
    pub membership_conversion: String,
    pub weekend_usage_growth: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueProjections {
    pub base_case: String,
    pub optimistic_case: String,
    pub conservative_case: String,
    pub key_assumptions: Vec<String>,
}

/// Inputs the projections were produced against
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ForecastBasis {
    pub regions_observed: usize,
    pub spending_categories: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictiveInsights {
    pub demand_forecast: DemandForecast,
    pub market_expansion: MarketExpansion,
    pub user_behavior_trends: UserBehaviorTrends,
    pub revenue_projections: RevenueProjections,
    pub basis: ForecastBasis,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn seasonal_pattern(season: Season) -> SeasonalPattern {
    let (multiplier, confidence) = match season {
        Season::Spring => (1.1, 0.85),
        Season::Summer => (1.35, 0.92),
        Season::Fall => (0.95, 0.88),
        Season::Winter => (0.65, 0.80),
    };
    SeasonalPattern {
        multiplier,
        confidence,
    }
}

pub fn generate_predictive_insights(
    mobility: &[MobilityRecord],
    spending: &[SpendingRecord],
) -> PredictiveInsights {
    let spending_categories = spending
        .iter()
        .filter(|r| !r.category.is_total())
        .map(|r| r.category)
        .collect::<BTreeSet<_>>()
        .len();

    PredictiveInsights {
        demand_forecast: DemandForecast {
            next_quarter: QuarterForecast {
                expected_growth: "15-20%".to_string(),
                peak_months: strings(&["June", "July", "August"]),
                growth_drivers: strings(&[
                    "Summer weather",
                    "Tourism increase",
                    "Corporate partnerships",
                ]),
            },
            seasonal_patterns: Season::ALL.iter().map(|&s| (s, seasonal_pattern(s))).collect(),
        },
        market_expansion: MarketExpansion {
            high_potential_areas: strings(&[
                "Suburban corridors",
                "University districts",
                "Transit hubs",
            ]),
            expansion_roi: "25-40%".to_string(),
            optimal_timing: "Q2 2024".to_string(),
        },
        user_behavior_trends: UserBehaviorTrends {
            increasing_trip_duration: "+8% year-over-year".to_string(),
            membership_conversion: "Improving by 12%".to_string(),
            weekend_usage_growth: "+22% compared to last year".to_string(),
        },
        revenue_projections: RevenueProjections {
            base_case: "$2.8M annual revenue".to_string(),
            optimistic_case: "$3.6M annual revenue".to_string(),
            conservative_case: "$2.2M annual revenue".to_string(),
            key_assumptions: strings(&[
                "15% user growth",
                "8% price optimization",
                "12% efficiency gains",
            ]),
        },
        basis: ForecastBasis {
            regions_observed: mobility.len(),
            spending_categories,
        },
    }
}
