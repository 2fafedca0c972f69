use serde::{Deserialize, Serialize};
use std::fmt;

/// Mobility metrics for one region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MobilityRecord {
    pub region_code: String,
    pub region_name: String,
    pub total_trips: u64,
    pub avg_trip_duration_minutes: f64,
    pub member_trips: u64,
    pub casual_trips: u64,
    pub member_ratio: f64,
    pub peak_hour_ratio: f64,
    pub weekend_ratio: f64,
    pub night_trips_ratio: f64,
    pub avg_trip_distance_km: f64,
    pub station_density: f64,
    pub inter_region_ratio: f64,
}

/// Spending category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpendingCategory {
    Restaurants,
    Retail,
    Grocery,
    Entertainment,
    Transportation,
    Healthcare,
    /// Synthesized per-region sum of every other category
    Total,
}

impl SpendingCategory {
    /// Real categories in catalogue order (excludes `Total`)
    pub const ALL: [SpendingCategory; 6] = [
        SpendingCategory::Restaurants,
        SpendingCategory::Retail,
        SpendingCategory::Grocery,
        SpendingCategory::Entertainment,
        SpendingCategory::Transportation,
        SpendingCategory::Healthcare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendingCategory::Restaurants => "restaurants",
            SpendingCategory::Retail => "retail",
            SpendingCategory::Grocery => "grocery",
            SpendingCategory::Entertainment => "entertainment",
            SpendingCategory::Transportation => "transportation",
            SpendingCategory::Healthcare => "healthcare",
            SpendingCategory::Total => "total",
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, SpendingCategory::Total)
    }
}

impl fmt::Display for SpendingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (region, category) spending row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendingRecord {
    pub region_code: String,
    pub category: SpendingCategory,
    pub spending_amount: f64,
    pub spending_proportion: f64,
}

/// Demographic metrics for one region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemographicRecord {
    pub region_code: String,
    pub population: u64,
    pub median_income: f64,
    pub college_educated_pct: f64,
    pub age_18_34_pct: f64,
    pub age_35_54_pct: f64,
    pub age_55_plus_pct: f64,
    pub population_density: f64,
}

/// The three generated tables of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub mobility: Vec<MobilityRecord>,
    pub spending: Vec<SpendingRecord>,
    pub demographics: Vec<DemographicRecord>,
}

/// Qualitative level used to characterize clusters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar season
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];
}

/// A multiplier per season
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeasonalTrends {
    pub spring: f64,
    pub summer: f64,
    pub fall: f64,
    pub winter: f64,
}

impl SeasonalTrends {
    pub const fn new(spring: f64, summer: f64, fall: f64, winter: f64) -> Self {
        Self {
            spring,
            summer,
            fall,
            winter,
        }
    }

    pub fn get(&self, season: Season) -> f64 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Fall => self.fall,
            Season::Winter => self.winter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_excludes_total() {
        assert_eq!(SpendingCategory::ALL.len(), 6);
        assert!(!SpendingCategory::ALL.iter().any(|c| c.is_total()));
        assert_eq!(SpendingCategory::ALL[0], SpendingCategory::Restaurants);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&SpendingCategory::Entertainment).unwrap();
        assert_eq!(json, "\"entertainment\"");
        assert_eq!(SpendingCategory::Total.to_string(), "total");
    }

    #[test]
    fn test_seasonal_lookup() {
        let trends = SeasonalTrends::new(1.0, 1.2, 0.9, 0.7);
        let values: Vec<f64> = Season::ALL.iter().map(|s| trends.get(*s)).collect();
        assert_eq!(values, vec![1.0, 1.2, 0.9, 0.7]);
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Low < Level::Medium);
        assert!(Level::Medium < Level::High);
        assert_eq!(serde_json::to_string(&Level::High).unwrap(), "\"high\"");
    }
}
