//! Persona synthesis
//! Binds each cluster to a persona archetype and sizes its market

use rand::Rng;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::error::{Result, SegmentationError};
use crate::generators::round_to;
use crate::models::{DemographicRecord, Level, Season, SeasonalTrends};
use crate::segmentation::{ClusterProfile, SegmentationResult};

/// Estimated people represented by one clustered region
pub const POPULATION_PER_REGION: u64 = 50_000;

/// Per-capita market value range, in dollars
pub const MARKET_VALUE_PER_CAPITA: (f64, f64) = (15.0, 35.0);

pub const EFFECTIVENESS_BASE: f64 = 0.6;
pub const EFFECTIVENESS_MEMBER_WEIGHT: f64 = 0.3;
pub const EFFECTIVENESS_CAP: f64 = 0.95;

/// Uniform perturbation range added to each season's template base
fn seasonal_jitter(season: Season) -> (f64, f64) {
    match season {
        Season::Spring => (-0.1, 0.2),
        Season::Summer => (-0.1, 0.3),
        Season::Fall => (-0.1, 0.2),
        Season::Winter => (-0.2, 0.1),
    }
}

/// Narrative archetype a cluster is dressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonaTemplate {
    pub name: &'static str,
    pub persona_type: &'static str,
    pub description: &'static str,
    pub motivations: &'static [&'static str],
    pub pain_points: &'static [&'static str],
    pub channels: &'static [&'static str],
    pub strategies: &'static [&'static str],
    pub seasonal_base: SeasonalTrends,
}

/// Seasonal multipliers every template starts from before jitter
pub const SEASONAL_BASE: SeasonalTrends = SeasonalTrends::new(1.0, 1.2, 0.9, 0.7);

/// Ordered template library; cluster `i` uses entry `i % len`
pub const PERSONA_TEMPLATES: [PersonaTemplate; 4] = [
    PersonaTemplate {
        name: "Urban Commuter Pro",
        persona_type: "Urban Commuter",
        description: "Highly structured professionals who rely on bike-sharing for daily commuting to work and efficient city navigation.",
        motivations: &["Reliable transportation", "Time efficiency", "Cost savings", "Environmental consciousness"],
        pain_points: &["Rush hour bike availability", "Weather dependency", "Station capacity", "Route planning"],
        channels: &["Mobile app", "Email newsletters", "LinkedIn", "Transit partnerships"],
        strategies: &["Corporate partnerships", "Commuter packages", "Priority access", "Weather alerts"],
        seasonal_base: SEASONAL_BASE,
    },
    PersonaTemplate {
        name: "Weekend Explorer",
        persona_type: "Leisure Cyclist",
        description: "Recreation-focused users who enjoy cycling for leisure, fitness, and exploration on weekends and holidays.",
        motivations: &["Recreation", "Fitness goals", "City exploration", "Social activities"],
        pain_points: &["Limited weekend availability", "Route discovery", "Group coordination", "Seasonal limitations"],
        channels: &["Social media", "Fitness apps", "Community events", "Tourism partnerships"],
        strategies: &["Weekend promotions", "Fitness challenges", "Scenic route guides", "Group discounts"],
        seasonal_base: SEASONAL_BASE,
    },
    PersonaTemplate {
        name: "Tech Innovator",
        persona_type: "Tech Savvy",
        description: "Early adopters who embrace technology and seek innovative, connected transportation solutions.",
        motivations: &["Innovation", "Convenience", "Smart city integration", "Data insights"],
        pain_points: &["App limitations", "Feature requests", "Integration gaps", "Tech support"],
        channels: &["Tech blogs", "Beta programs", "Developer communities", "Smart city initiatives"],
        strategies: &["Beta testing", "API access", "Smart features", "Tech partnerships"],
        seasonal_base: SEASONAL_BASE,
    },
    PersonaTemplate {
        name: "Budget Conscious",
        persona_type: "Value Seeker",
        description: "Price-sensitive users who prioritize affordability and value in their transportation choices.",
        motivations: &["Cost savings", "Value for money", "Budget management", "Alternative transport"],
        pain_points: &["Pricing complexity", "Hidden fees", "Payment options", "Service value"],
        channels: &["Price comparison sites", "Budget apps", "Community forums", "Local partnerships"],
        strategies: &["Value packages", "Student discounts", "Loyalty rewards", "Transparent pricing"],
        seasonal_base: SEASONAL_BASE,
    },
];

pub fn template_for(index: usize) -> &'static PersonaTemplate {
    &PERSONA_TEMPLATES[index % PERSONA_TEMPLATES.len()]
}

/// Persona key, serialized as `persona_<n>` and ordered numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonaId(pub usize);

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "persona_{}", self.0)
    }
}

impl Serialize for PersonaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MobilityProfile {
    pub avg_trips: u64,
    pub member_ratio: f64,
    pub avg_duration: f64,
    pub usage_intensity: Level,
    pub engagement: Level,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpendingProfile {
    pub restaurant_spending: u64,
    pub spending_level: Level,
}

/// Mean demographics over the cluster's regions
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DemographicProfile {
    pub median_income: f64,
    pub college_educated_pct: f64,
    pub age_18_34_pct: f64,
    pub population_density: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Persona {
    pub persona_id: PersonaId,
    pub persona_name: String,
    pub persona_type: String,
    pub cluster_id: usize,
    pub estimated_population: u64,
    pub market_value: u64,
    /// In [0, 0.95]
    pub targeting_effectiveness: f64,
    pub description: String,
    pub key_motivations: Vec<String>,
    pub pain_points: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub marketing_strategies: Vec<String>,
    pub seasonal_trends: SeasonalTrends,
    pub mobility_profile: MobilityProfile,
    pub spending_profile: SpendingProfile,
    pub demographic_profile: Option<DemographicProfile>,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Deterministic: base plus a term proportional to member ratio, clipped
pub fn targeting_effectiveness(avg_member_ratio: f64) -> f64 {
    let raw = EFFECTIVENESS_BASE + avg_member_ratio * EFFECTIVENESS_MEMBER_WEIGHT;
    round_to(raw.clamp(0.0, EFFECTIVENESS_CAP), 3)
}

fn seasonal_trends<R: Rng + ?Sized>(base: SeasonalTrends, rng: &mut R) -> SeasonalTrends {
    let mut perturbed = [0.0; 4];
    for (slot, season) in perturbed.iter_mut().zip(Season::ALL) {
        let (low, high) = seasonal_jitter(season);
        *slot = round_to(base.get(season) + rng.gen_range(low..high), 2);
    }
    SeasonalTrends::new(perturbed[0], perturbed[1], perturbed[2], perturbed[3])
}

fn demographic_profile(
    profile: &ClusterProfile,
    demographics: &[DemographicRecord],
) -> Option<DemographicProfile> {
    let members: Vec<&DemographicRecord> = demographics
        .iter()
        .filter(|d| profile.regions.contains(&d.region_code))
        .collect();

    if members.is_empty() {
        return None;
    }

    let n = members.len() as f64;
    let mean = |field: fn(&DemographicRecord) -> f64| {
        members.iter().map(|d| field(d)).sum::<f64>() / n
    };

    Some(DemographicProfile {
        median_income: mean(|d| d.median_income).round(),
        college_educated_pct: round_to(mean(|d| d.college_educated_pct), 3),
        age_18_34_pct: round_to(mean(|d| d.age_18_34_pct), 3),
        population_density: round_to(mean(|d| d.population_density), 1),
    })
}

fn build_persona<R: Rng + ?Sized>(
    index: usize,
    profile: &ClusterProfile,
    demographics: &[DemographicRecord],
    rng: &mut R,
) -> Persona {
    let template = template_for(index);

    let estimated_population = profile.size as u64 * POPULATION_PER_REGION;
    let (low, high) = MARKET_VALUE_PER_CAPITA;
    let market_value = (estimated_population as f64 * rng.gen_range(low..high)) as u64;
    let seasonal = seasonal_trends(template.seasonal_base, rng);

    Persona {
        persona_id: PersonaId(index),
        persona_name: template.name.to_string(),
        persona_type: template.persona_type.to_string(),
        cluster_id: profile.cluster_id,
        estimated_population,
        market_value,
        targeting_effectiveness: targeting_effectiveness(profile.avg_member_ratio()),
        description: template.description.to_string(),
        key_motivations: to_strings(template.motivations),
        pain_points: to_strings(template.pain_points),
        preferred_channels: to_strings(template.channels),
        marketing_strategies: to_strings(template.strategies),
        seasonal_trends: seasonal,
        mobility_profile: MobilityProfile {
            avg_trips: profile.avg_trips() as u64,
            member_ratio: round_to(profile.avg_member_ratio(), 3),
            avg_duration: round_to(profile.avg_duration(), 1),
            usage_intensity: profile.characteristics.mobility_level,
            engagement: profile.characteristics.engagement,
        },
        spending_profile: SpendingProfile {
            restaurant_spending: profile.avg_restaurant_spending() as u64,
            spending_level: profile.characteristics.dining_preference,
        },
        demographic_profile: demographic_profile(profile, demographics),
    }
}

/// Walk clusters in ascending id and bind each to the next template
pub fn synthesize_personas<R: Rng + ?Sized>(
    segmentation: &SegmentationResult,
    demographics: &[DemographicRecord],
    rng: &mut R,
) -> Result<BTreeMap<PersonaId, Persona>> {
    if segmentation.cluster_profiles.is_empty() {
        return Err(SegmentationError::data_integrity(
            "segmentation produced no clusters to build personas from",
        ));
    }

    let mut profiles: Vec<&ClusterProfile> = segmentation.cluster_profiles.iter().collect();
    profiles.sort_by_key(|p| p.cluster_id);

    let mut personas = BTreeMap::new();
    for (index, profile) in profiles.into_iter().enumerate() {
        let persona = build_persona(index, profile, demographics, rng);
        debug!(
            "{} -> cluster {} ({} people, ${} market)",
            persona.persona_name,
            persona.cluster_id,
            persona.estimated_population,
            persona.market_value
        );
        personas.insert(persona.persona_id, persona);
    }

    info!("Synthesized {} personas", personas.len());
    Ok(personas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpendingCategory;
    use crate::segmentation::{ClusterCharacteristics, MobilityMeans};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn profile(cluster_id: usize, size: usize, member_ratio: f64) -> ClusterProfile {
        ClusterProfile {
            cluster_id,
            size,
            regions: (0..size).map(|i| format!("{}{}", cluster_id, i)).collect(),
            mobility: MobilityMeans {
                total_trips: 12_000.0,
                avg_trip_duration_minutes: 14.26,
                member_ratio,
                peak_hour_ratio: 0.3,
                weekend_ratio: 0.3,
                night_trips_ratio: 0.05,
                avg_trip_distance_km: 3.0,
                station_density: 0.6,
                inter_region_ratio: 0.02,
            },
            spending: SpendingCategory::ALL.iter().map(|&c| (c, 90_000.0)).collect(),
            characteristics: ClusterCharacteristics {
                mobility_level: Level::Medium,
                engagement: Level::Medium,
                dining_preference: Level::Medium,
            },
        }
    }

    fn segmentation(profiles: Vec<ClusterProfile>) -> SegmentationResult {
        SegmentationResult {
            n_clusters: profiles.len(),
            cluster_profiles: profiles,
            assignments: Vec::new(),
            feature_importance: Vec::new(),
            silhouette_score: 0.0,
            inertia: 0.0,
            algorithm: "kmeans".to_string(),
        }
    }

    #[test]
    fn test_effectiveness_is_capped() {
        assert_eq!(targeting_effectiveness(0.5), 0.75);
        assert_eq!(targeting_effectiveness(0.95), 0.885);
        assert_eq!(targeting_effectiveness(2.0), EFFECTIVENESS_CAP);
        assert_eq!(targeting_effectiveness(-5.0), 0.0);
    }

    #[test]
    fn test_templates_cycle_by_cluster_order() {
        let seg = segmentation((0..6).rev().map(|id| profile(id, 1, 0.7)).collect());
        let mut rng = StdRng::seed_from_u64(42);
        let personas = synthesize_personas(&seg, &[], &mut rng).unwrap();

        assert_eq!(personas.len(), 6);
        let names: Vec<&str> = personas.values().map(|p| p.persona_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Urban Commuter Pro",
                "Weekend Explorer",
                "Tech Innovator",
                "Budget Conscious",
                "Urban Commuter Pro",
                "Weekend Explorer",
            ]
        );
        for (i, persona) in personas.values().enumerate() {
            assert_eq!(persona.cluster_id, i);
            assert_eq!(persona.persona_id, PersonaId(i));
        }
    }

    #[test]
    fn test_market_sizing() {
        let seg = segmentation(vec![profile(0, 3, 0.8)]);
        let mut rng = StdRng::seed_from_u64(42);
        let personas = synthesize_personas(&seg, &[], &mut rng).unwrap();
        let persona = &personas[&PersonaId(0)];

        assert_eq!(persona.estimated_population, 150_000);
        assert!(persona.market_value >= 150_000 * 15);
        assert!(persona.market_value < 150_000 * 35);
        assert_eq!(persona.targeting_effectiveness, 0.84);
        assert_eq!(persona.mobility_profile.avg_duration, 14.3);
        assert_eq!(persona.spending_profile.restaurant_spending, 90_000);
    }

    #[test]
    fn test_narrative_copied_from_template() {
        let seg = segmentation(vec![profile(0, 1, 0.7), profile(1, 1, 0.7)]);
        let mut rng = StdRng::seed_from_u64(42);
        let personas = synthesize_personas(&seg, &[], &mut rng).unwrap();
        let explorer = &personas[&PersonaId(1)];
        let template = &PERSONA_TEMPLATES[1];

        assert_eq!(explorer.description, template.description);
        assert_eq!(explorer.key_motivations, to_strings(template.motivations));
        assert_eq!(explorer.marketing_strategies, to_strings(template.strategies));
        assert!(explorer.demographic_profile.is_none());
    }

    #[test]
    fn test_seasonal_perturbation_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        for template in &PERSONA_TEMPLATES {
            for _ in 0..50 {
                let trends = seasonal_trends(template.seasonal_base, &mut rng);
                for season in Season::ALL {
                    let (low, high) = seasonal_jitter(season);
                    let delta = trends.get(season) - template.seasonal_base.get(season);
                    assert!(delta >= low - 0.0051 && delta <= high + 0.0051);
                }
            }
        }
    }

    #[test]
    fn test_templates_share_seasonal_base() {
        for template in &PERSONA_TEMPLATES {
            assert_eq!(template.seasonal_base, SeasonalTrends::new(1.0, 1.2, 0.9, 0.7));
        }
    }

    #[test]
    fn test_persona_id_serializes_as_key() {
        let mut map = BTreeMap::new();
        map.insert(PersonaId(10), 1);
        map.insert(PersonaId(2), 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"persona_2":2,"persona_10":1}"#);
    }

    #[test]
    fn test_no_clusters() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = synthesize_personas(&segmentation(Vec::new()), &[], &mut rng).unwrap_err();
        assert!(err.is_data_integrity());
    }
}
