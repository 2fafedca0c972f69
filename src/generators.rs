//! Synthetic data generators for regional mobility, spending and demographics
//!
//! Every generator takes the run's random generator by `&mut` so a whole run
//! draws from one seeded stream. Some regions get their own distribution
//! parameters; all others share a default set. Sampled values are clamped
//! to the bounds below before rounding.

use rand::Rng;
use rand_distr::{Beta, Distribution, Exp, Gamma, Normal};
use tracing::{debug, info};

use crate::error::{Result, SegmentationError};
use crate::models::{
    DemographicRecord, MobilityRecord, SpendingCategory, SpendingRecord, SyntheticDataset,
};
use crate::regions::{check_region_codes, lookup_region};

/// Closed interval a generated field is clamped into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// Mobility bounds
pub const TOTAL_TRIPS: Bound = Bound::at_least(1000.0);
pub const TRIP_DURATION_MINUTES: Bound = Bound::new(5.0, 30.0);
pub const MEMBER_RATIO: Bound = Bound::new(0.3, 0.95);
pub const PEAK_HOUR_RATIO: Bound = Bound::new(0.15, 0.55);
pub const WEEKEND_RATIO: Bound = Bound::new(0.15, 0.55);
pub const NIGHT_TRIPS_RATIO: Bound = Bound::new(0.0, 0.15);
pub const TRIP_DISTANCE_KM: Bound = Bound::new(1.0, 25.0);
pub const STATION_DENSITY: Bound = Bound::new(0.1, 10.0);
pub const INTER_REGION_RATIO: Bound = Bound::new(0.0, 0.2);

// Spending bounds
pub const CATEGORY_SPENDING: Bound = Bound::at_least(10_000.0);

// Demographic bounds
pub const MEDIAN_INCOME: Bound = Bound::at_least(10_000.0);
pub const COLLEGE_PCT: Bound = Bound::new(0.0, 1.0);
pub const AGE_18_34_PCT: Bound = Bound::new(0.2, 0.6);
pub const AGE_35_54_PCT: Bound = Bound::new(0.25, 0.65);
pub const AGE_55_PLUS_PCT: Bound = Bound::new(0.15, 0.5);

/// Normal (mean, std dev) parameters for the three headline mobility fields
#[derive(Debug, Clone, Copy)]
struct MobilityProfile {
    trips: (f64, f64),
    duration: (f64, f64),
    member_ratio: (f64, f64),
}

fn mobility_profile(region_code: &str) -> MobilityProfile {
    match region_code {
        // Manhattan: dense, short trips
        "36061" => MobilityProfile {
            trips: (25_000.0, 3_000.0),
            duration: (12.0, 2.0),
            member_ratio: (0.85, 0.05),
        },
        // Chicago: balanced urban
        "17031" => MobilityProfile {
            trips: (18_000.0, 2_500.0),
            duration: (15.0, 3.0),
            member_ratio: (0.75, 0.08),
        },
        // Los Angeles: sprawling, longer trips
        "06037" => MobilityProfile {
            trips: (12_000.0, 2_000.0),
            duration: (20.0, 4.0),
            member_ratio: (0.65, 0.1),
        },
        _ => MobilityProfile {
            trips: (8_000.0, 1_500.0),
            duration: (16.0, 3.0),
            member_ratio: (0.7, 0.1),
        },
    }
}

fn spending_multiplier(region_code: &str) -> f64 {
    match region_code {
        "36061" => 1.8,
        "53033" => 1.6,
        "25025" => 1.5,
        "06037" => 1.4,
        "17031" => 1.2,
        _ => 1.0,
    }
}

/// Gamma (shape, scale) for a category in a region
fn category_gamma(region_code: &str, category: SpendingCategory) -> (f64, f64) {
    match (category, region_code) {
        (SpendingCategory::Restaurants, _) => (3.0, 50_000.0),
        (SpendingCategory::Retail, _) => (2.5, 60_000.0),
        (SpendingCategory::Entertainment, "06037") => (4.0, 40_000.0),
        (SpendingCategory::Transportation, _) => (2.0, 30_000.0),
        _ => (2.0, 40_000.0),
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).map_err(|e| {
        SegmentationError::configuration(format!("invalid normal({mean}, {std_dev}): {e}"))
    })
}

fn beta(alpha: f64, beta: f64) -> Result<Beta<f64>> {
    Beta::new(alpha, beta).map_err(|e| {
        SegmentationError::configuration(format!("invalid beta({alpha}, {beta}): {e}"))
    })
}

fn gamma(shape: f64, scale: f64) -> Result<Gamma<f64>> {
    Gamma::new(shape, scale).map_err(|e| {
        SegmentationError::configuration(format!("invalid gamma({shape}, {scale}): {e}"))
    })
}

fn exponential(mean: f64) -> Result<Exp<f64>> {
    Exp::new(1.0 / mean).map_err(|e| {
        SegmentationError::configuration(format!("invalid exponential(mean {mean}): {e}"))
    })
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Generate one mobility row per region
pub fn generate_mobility_data<R: Rng + ?Sized>(
    region_codes: &[String],
    rng: &mut R,
) -> Result<Vec<MobilityRecord>> {
    check_region_codes(region_codes)?;
    let peak = beta(2.0, 3.0)?;
    let weekend = beta(1.5, 3.0)?;
    let night = beta(1.0, 4.0)?;
    let distance = gamma(2.0, 1.5)?;
    let density = exponential(0.5)?;
    let inter_region = beta(1.0, 9.0)?;

    let mut records = Vec::with_capacity(region_codes.len());

    for code in region_codes {
        let region = lookup_region(code)?;
        let profile = mobility_profile(code);

        let trips = normal(profile.trips.0, profile.trips.1)?.sample(rng);
        let duration = normal(profile.duration.0, profile.duration.1)?.sample(rng);
        let ratio = normal(profile.member_ratio.0, profile.member_ratio.1)?.sample(rng);

        let total_trips = TOTAL_TRIPS.clamp(trips) as u64;
        let member_ratio = round_to(MEMBER_RATIO.clamp(ratio), 3);
        let member_trips = (total_trips as f64 * member_ratio) as u64;

        let record = MobilityRecord {
            region_code: code.clone(),
            region_name: region.name.to_string(),
            total_trips,
            avg_trip_duration_minutes: round_to(TRIP_DURATION_MINUTES.clamp(duration), 1),
            member_trips,
            casual_trips: total_trips - member_trips,
            member_ratio,
            peak_hour_ratio: PEAK_HOUR_RATIO.clamp(peak.sample(rng) * 0.4 + 0.15),
            weekend_ratio: WEEKEND_RATIO.clamp(weekend.sample(rng) * 0.4 + 0.15),
            night_trips_ratio: NIGHT_TRIPS_RATIO.clamp(night.sample(rng) * 0.15),
            avg_trip_distance_km: TRIP_DISTANCE_KM.clamp(distance.sample(rng) + 1.0),
            station_density: STATION_DENSITY.clamp(density.sample(rng) + 0.1),
            inter_region_ratio: INTER_REGION_RATIO.clamp(inter_region.sample(rng) * 0.2),
        };

        debug!(
            "Mobility {}: {} trips, ratio {:.3}",
            record.region_code, record.total_trips, record.member_ratio
        );
        records.push(record);
    }

    info!("Generated {} mobility records", records.len());
    Ok(records)
}

/// Generate six category rows plus one `total` row per region.
///
/// Amounts are rounded to whole units before the total is summed, and
/// proportions are derived from that total, so a region's category
/// proportions always sum to 1.
pub fn generate_spending_data<R: Rng + ?Sized>(
    region_codes: &[String],
    rng: &mut R,
) -> Result<Vec<SpendingRecord>> {
    check_region_codes(region_codes)?;
    let mut records = Vec::with_capacity(region_codes.len() * (SpendingCategory::ALL.len() + 1));

    for code in region_codes {
        let multiplier = spending_multiplier(code);

        let mut amounts = Vec::with_capacity(SpendingCategory::ALL.len());
        for category in SpendingCategory::ALL {
            let (shape, scale) = category_gamma(code, category);
            let sampled = gamma(shape, scale)?.sample(rng) * multiplier;
            amounts.push((category, CATEGORY_SPENDING.clamp(sampled).round()));
        }

        let total: f64 = amounts.iter().map(|(_, amount)| amount).sum();

        for (category, amount) in amounts {
            records.push(SpendingRecord {
                region_code: code.clone(),
                category,
                spending_amount: amount,
                spending_proportion: amount / total,
            });
        }

        records.push(SpendingRecord {
            region_code: code.clone(),
            category: SpendingCategory::Total,
            spending_amount: total,
            spending_proportion: 1.0,
        });

        debug!("Spending {}: total {:.0}", code, total);
    }

    info!("Generated {} spending records", records.len());
    Ok(records)
}

/// Generate one demographic row per region from its census baseline
pub fn generate_demographic_data<R: Rng + ?Sized>(
    region_codes: &[String],
    rng: &mut R,
) -> Result<Vec<DemographicRecord>> {
    check_region_codes(region_codes)?;
    let income_noise = normal(0.0, 5_000.0)?;
    let college_noise = normal(0.0, 0.05)?;
    let young = beta(3.0, 4.0)?;
    let middle = beta(4.0, 3.0)?;
    let senior = beta(2.0, 5.0)?;
    let area = exponential(500.0)?;

    let mut records = Vec::with_capacity(region_codes.len());

    for code in region_codes {
        let region = lookup_region(code)?;

        let median_income = region.median_income + income_noise.sample(rng);
        let college = region.college_pct + college_noise.sample(rng);

        records.push(DemographicRecord {
            region_code: code.clone(),
            population: region.population,
            median_income: MEDIAN_INCOME.clamp(median_income),
            college_educated_pct: COLLEGE_PCT.clamp(college),
            age_18_34_pct: AGE_18_34_PCT.clamp(young.sample(rng) * 0.4 + 0.2),
            age_35_54_pct: AGE_35_54_PCT.clamp(middle.sample(rng) * 0.4 + 0.25),
            age_55_plus_pct: AGE_55_PLUS_PCT.clamp(senior.sample(rng) * 0.35 + 0.15),
            population_density: region.population as f64 / (1000.0 + area.sample(rng)),
        });
    }

    info!("Generated {} demographic records", records.len());
    Ok(records)
}

/// Generate all three tables, in order, from one random stream
pub fn generate_dataset<R: Rng + ?Sized>(
    region_codes: &[String],
    rng: &mut R,
) -> Result<SyntheticDataset> {
    Ok(SyntheticDataset {
        mobility: generate_mobility_data(region_codes, rng)?,
        spending: generate_spending_data(region_codes, rng)?,
        demographics: generate_demographic_data(region_codes, rng)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::default_region_codes;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn dataset(seed: u64) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_dataset(&default_region_codes(), &mut rng).unwrap()
    }

    #[test]
    fn test_same_seed_same_tables() {
        assert_eq!(dataset(42), dataset(42));
    }

    #[test]
    fn test_different_seed_different_tables() {
        assert_ne!(dataset(42).mobility, dataset(43).mobility);
    }

    #[test]
    fn test_row_counts() {
        let data = dataset(42);
        assert_eq!(data.mobility.len(), 7);
        assert_eq!(data.spending.len(), 7 * 7);
        assert_eq!(data.demographics.len(), 7);
    }

    #[test]
    fn test_mobility_bounds() {
        for seed in 0..20 {
            for r in dataset(seed).mobility {
                assert!(TOTAL_TRIPS.contains(r.total_trips as f64));
                assert!(TRIP_DURATION_MINUTES.contains(r.avg_trip_duration_minutes));
                assert!(MEMBER_RATIO.contains(r.member_ratio), "ratio {}", r.member_ratio);
                assert!(PEAK_HOUR_RATIO.contains(r.peak_hour_ratio));
                assert!(WEEKEND_RATIO.contains(r.weekend_ratio));
                assert!(NIGHT_TRIPS_RATIO.contains(r.night_trips_ratio));
                assert!(TRIP_DISTANCE_KM.contains(r.avg_trip_distance_km));
                assert!(STATION_DENSITY.contains(r.station_density));
                assert!(INTER_REGION_RATIO.contains(r.inter_region_ratio));
                assert_eq!(r.member_trips + r.casual_trips, r.total_trips);
            }
        }
    }

    #[test]
    fn test_demographic_bounds() {
        for seed in 0..20 {
            for r in dataset(seed).demographics {
                assert!(MEDIAN_INCOME.contains(r.median_income));
                assert!(COLLEGE_PCT.contains(r.college_educated_pct));
                assert!(AGE_18_34_PCT.contains(r.age_18_34_pct));
                assert!(AGE_35_54_PCT.contains(r.age_35_54_pct));
                assert!(AGE_55_PLUS_PCT.contains(r.age_55_plus_pct));
                assert!(r.population_density > 0.0);
            }
        }
    }

    #[test]
    fn test_proportions_sum_to_one() {
        for seed in 0..20 {
            let mut sums: HashMap<String, f64> = HashMap::new();
            for r in dataset(seed).spending.iter().filter(|r| !r.category.is_total()) {
                assert!(CATEGORY_SPENDING.contains(r.spending_amount));
                *sums.entry(r.region_code.clone()).or_default() += r.spending_proportion;
            }
            assert_eq!(sums.len(), 7);
            for (region, sum) in sums {
                assert!((sum - 1.0).abs() < 1e-6, "{} proportions sum to {}", region, sum);
            }
        }
    }

    #[test]
    fn test_total_row_matches_categories() {
        let data = dataset(42);
        for code in default_region_codes() {
            let rows: Vec<&SpendingRecord> =
                data.spending.iter().filter(|r| r.region_code == code).collect();
            let total = rows.iter().find(|r| r.category.is_total()).unwrap();
            let sum: f64 = rows
                .iter()
                .filter(|r| !r.category.is_total())
                .map(|r| r.spending_amount)
                .sum();
            assert_eq!(total.spending_amount, sum);
            assert_eq!(total.spending_proportion, 1.0);
        }
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = generate_mobility_data(&["12345".to_string()], &mut rng).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_region_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let codes = vec!["36061".to_string(), "36061".to_string()];
        let err = generate_dataset(&codes, &mut rng).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("duplicate region code"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round_to(0.8456, 3), 0.846);
    }
}
