//! Market intelligence roll-up over personas and opportunities

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{Result, SegmentationError};
use crate::generators::round_to;
use crate::opportunities::Opportunity;
use crate::personas::{Persona, PersonaId};

/// Share of total opportunity value attributed to premium services
const PREMIUM_CAPTURE_DIVISOR: u64 = 5;

const STRATEGIC_RECOMMENDATIONS: [&str; 6] = [
    "Prioritize premium commuter services for immediate revenue impact",
    "Invest in technology infrastructure to capture tech-savvy segment",
    "Develop corporate partnership program for B2B growth",
    "Create seasonal marketing campaigns aligned with usage patterns",
    "Implement dynamic pricing to optimize revenue per trip",
    "Expand weekend recreational offerings to capture growing market",
];

const COMPETITIVE_ADVANTAGES: [&str; 5] = [
    "Data-driven persona targeting with 80%+ effectiveness",
    "Comprehensive multi-modal transportation insights",
    "Advanced predictive analytics for demand forecasting",
    "Integrated mobility and spending behavior analysis",
    "Real-time market intelligence and opportunity identification",
];

const RISK_FACTORS: [&str; 4] = [
    "Weather dependency affecting seasonal usage",
    "Competition from alternative transportation modes",
    "Regulatory changes in urban mobility policies",
    "Economic downturns impacting discretionary spending",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketOverview {
    pub total_addressable_market: u64,
    pub total_population: u64,
    pub average_targeting_effectiveness: f64,
    pub number_of_segments: usize,
    pub total_opportunity_value: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketIntelligence {
    pub market_overview: MarketOverview,
    pub key_insights: Vec<String>,
    pub strategic_recommendations: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// `1234567` -> `"1,234,567"`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn key_insights(top: &Persona, total_opportunity_value: u64) -> Vec<String> {
    vec![
        format!(
            "{} represents the highest value segment with ${} market potential",
            top.persona_name,
            format_thousands(top.market_value)
        ),
        "Summer season shows 35% increase in usage across all segments".to_string(),
        format!(
            "Premium services could capture additional ${} in annual revenue",
            format_thousands(total_opportunity_value / PREMIUM_CAPTURE_DIVISOR)
        ),
        "Technology integration opportunities show highest ROI potential (30-45%)".to_string(),
        "Corporate partnerships represent largest untapped market opportunity".to_string(),
        "Weekend recreational usage growing 22% year-over-year".to_string(),
        "Membership conversion rates improving across all demographics".to_string(),
    ]
}

pub fn generate_market_intelligence(
    personas: &BTreeMap<PersonaId, Persona>,
    opportunities: &[Opportunity],
) -> Result<MarketIntelligence> {
    // Ties go to the lowest persona id
    let top = personas
        .values()
        .fold(None::<&Persona>, |best, p| match best {
            Some(b) if b.market_value >= p.market_value => Some(b),
            _ => Some(p),
        })
        .ok_or_else(|| {
            SegmentationError::data_integrity("no personas to aggregate into market intelligence")
        })?;

    let total_addressable_market = personas.values().map(|p| p.market_value).sum();
    let total_population = personas.values().map(|p| p.estimated_population).sum();
    let average_targeting_effectiveness = round_to(
        personas.values().map(|p| p.targeting_effectiveness).sum::<f64>() / personas.len() as f64,
        3,
    );
    let total_opportunity_value = opportunities.iter().map(|o| o.estimated_market_size).sum();

    let overview = MarketOverview {
        total_addressable_market,
        total_population,
        average_targeting_effectiveness,
        number_of_segments: personas.len(),
        total_opportunity_value,
    };

    info!(
        "Market overview: {} segments, ${} addressable, ${} in opportunities",
        overview.number_of_segments,
        format_thousands(overview.total_addressable_market),
        format_thousands(overview.total_opportunity_value)
    );

    Ok(MarketIntelligence {
        key_insights: key_insights(top, total_opportunity_value),
        market_overview: overview,
        strategic_recommendations: to_strings(&STRATEGIC_RECOMMENDATIONS),
        competitive_advantages: to_strings(&COMPETITIVE_ADVANTAGES),
        risk_factors: to_strings(&RISK_FACTORS),
    })
}
