//! Business opportunity catalogue
//!
//! Entries are hand-authored and keyed to persona names. They do not read
//! the derived personas' numbers and do not depend on the seed.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Opportunity {
    pub opportunity_type: String,
    pub description: String,
    pub target_segments: Vec<String>,
    pub estimated_market_size: u64,
    pub investment_level: String,
    pub expected_roi: String,
    pub implementation_timeline: String,
    pub key_metrics: Vec<String>,
}

impl Opportunity {
    pub fn targets(&self, persona_name: &str) -> bool {
        self.target_segments.iter().any(|s| s == persona_name)
    }
}

struct OpportunityDef {
    opportunity_type: &'static str,
    description: &'static str,
    target_segments: &'static [&'static str],
    estimated_market_size: u64,
    investment_level: &'static str,
    expected_roi: &'static str,
    implementation_timeline: &'static str,
    key_metrics: &'static [&'static str],
}

const CATALOGUE: [OpportunityDef; 5] = [
    OpportunityDef {
        opportunity_type: "Premium Commuter Services",
        description: "Develop premium service tier for high-frequency commuters with guaranteed bike availability and priority access.",
        target_segments: &["Urban Commuter Pro"],
        estimated_market_size: 350_000,
        investment_level: "Medium",
        expected_roi: "25-35%",
        implementation_timeline: "6-9 months",
        key_metrics: &["Customer lifetime value", "Premium conversion rate", "Churn reduction"],
    },
    OpportunityDef {
        opportunity_type: "Weekend Recreation Packages",
        description: "Create weekend-focused packages with scenic routes, fitness tracking, and group coordination features.",
        target_segments: &["Weekend Explorer"],
        estimated_market_size: 180_000,
        investment_level: "Low",
        expected_roi: "15-25%",
        implementation_timeline: "3-6 months",
        key_metrics: &["Weekend usage growth", "Package adoption rate", "User engagement"],
    },
    OpportunityDef {
        opportunity_type: "Smart Technology Integration",
        description: "Advanced IoT features, predictive analytics, and smart city integration for tech-savvy users.",
        target_segments: &["Tech Innovator"],
        estimated_market_size: 220_000,
        investment_level: "High",
        expected_roi: "30-45%",
        implementation_timeline: "9-12 months",
        key_metrics: &["Feature adoption", "API usage", "Tech partnership value"],
    },
    OpportunityDef {
        opportunity_type: "Value-Focused Membership",
        description: "Affordable membership tiers with transparent pricing and value-added benefits for budget-conscious users.",
        target_segments: &["Budget Conscious"],
        estimated_market_size: 280_000,
        investment_level: "Low",
        expected_roi: "20-30%",
        implementation_timeline: "4-8 months",
        key_metrics: &["Price sensitivity analysis", "Conversion rate", "Customer acquisition cost"],
    },
    OpportunityDef {
        opportunity_type: "Corporate Partnership Program",
        description: "B2B partnerships with employers for employee transportation benefits and corporate sustainability programs.",
        target_segments: &["Urban Commuter Pro", "Tech Innovator"],
        estimated_market_size: 450_000,
        investment_level: "Medium",
        expected_roi: "35-50%",
        implementation_timeline: "6-12 months",
        key_metrics: &["Corporate contracts", "Employee adoption", "B2B revenue growth"],
    },
];

/// Build the opportunity list fresh for a run
pub fn identify_opportunities() -> Vec<Opportunity> {
    CATALOGUE
        .iter()
        .map(|def| Opportunity {
            opportunity_type: def.opportunity_type.to_string(),
            description: def.description.to_string(),
            target_segments: def.target_segments.iter().map(|s| s.to_string()).collect(),
            estimated_market_size: def.estimated_market_size,
            investment_level: def.investment_level.to_string(),
            expected_roi: def.expected_roi.to_string(),
            implementation_timeline: def.implementation_timeline.to_string(),
            key_metrics: def.key_metrics.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

/// Opportunities that list `persona_name` among their target segments
pub fn opportunities_for<'a>(
    opportunities: &'a [Opportunity],
    persona_name: &str,
) -> Vec<&'a Opportunity> {
    opportunities.iter().filter(|o| o.targets(persona_name)).collect()
}
