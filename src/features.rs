//! Feature assembly: joins mobility with pivoted spending and builds the
//! normalized matrix the segmentation engine clusters on.

use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, warn};

use crate::error::{Result, SegmentationError};
use crate::models::{MobilityRecord, SpendingCategory, SpendingRecord};

/// One clustering input column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    TotalTrips,
    MemberRatio,
    AvgTripDuration,
    Spending(SpendingCategory),
}

impl Feature {
    /// Fixed column order of every feature vector
    pub fn ordered() -> Vec<Feature> {
        let mut features = vec![
            Feature::TotalTrips,
            Feature::MemberRatio,
            Feature::AvgTripDuration,
        ];
        features.extend(SpendingCategory::ALL.iter().copied().map(Feature::Spending));
        features
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feature::TotalTrips => "total_trips",
            Feature::MemberRatio => "member_ratio",
            Feature::AvgTripDuration => "avg_trip_duration_minutes",
            Feature::Spending(category) => category.as_str(),
        }
    }

    fn value(&self, region: &AssembledRegion) -> f64 {
        match self {
            Feature::TotalTrips => region.mobility.total_trips as f64,
            Feature::MemberRatio => region.mobility.member_ratio,
            Feature::AvgTripDuration => region.mobility.avg_trip_duration_minutes,
            Feature::Spending(category) => region.spending(*category),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A region that survived the mobility/spending join
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRegion {
    pub mobility: MobilityRecord,
    /// Amount per real category; every category is present
    pub spending: BTreeMap<SpendingCategory, f64>,
}

impl AssembledRegion {
    pub fn region_code(&self) -> &str {
        &self.mobility.region_code
    }

    pub fn spending(&self, category: SpendingCategory) -> f64 {
        self.spending.get(&category).copied().unwrap_or(0.0)
    }
}

/// Joined rows plus their raw and normalized feature matrices
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub regions: Vec<AssembledRegion>,
    pub features: Vec<Feature>,
    /// One row per region, columns in `features` order
    pub raw: Array2<f64>,
    pub normalized: Array2<f64>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Raw feature row for a region code
    pub fn raw_row(&self, region_code: &str) -> Option<ArrayView1<'_, f64>> {
        self.regions
            .iter()
            .position(|r| r.region_code() == region_code)
            .map(|i| self.raw.row(i))
    }
}

/// Pivot spending to one amount per (region, category), skipping `total` rows
fn pivot_spending(spending: &[SpendingRecord]) -> HashMap<&str, BTreeMap<SpendingCategory, f64>> {
    let mut pivot: HashMap<&str, BTreeMap<SpendingCategory, f64>> = HashMap::new();

    for record in spending.iter().filter(|r| !r.category.is_total()) {
        *pivot
            .entry(record.region_code.as_str())
            .or_default()
            .entry(record.category)
            .or_insert(0.0) += record.spending_amount;
    }

    pivot
}

/// Inner-join mobility with pivoted spending, in mobility order.
///
/// A region without any spending rows is dropped; a region missing only
/// some categories keeps them as 0.
pub fn assemble_features(
    mobility: &[MobilityRecord],
    spending: &[SpendingRecord],
) -> Result<FeatureTable> {
    let pivot = pivot_spending(spending);

    let mut regions = Vec::with_capacity(mobility.len());
    for record in mobility {
        let Some(amounts) = pivot.get(record.region_code.as_str()) else {
            warn!("Dropping region {}: no spending data", record.region_code);
            continue;
        };

        let spending = SpendingCategory::ALL
            .iter()
            .map(|c| (*c, amounts.get(c).copied().unwrap_or(0.0)))
            .collect();

        regions.push(AssembledRegion {
            mobility: record.clone(),
            spending,
        });
    }

    if regions.is_empty() {
        return Err(SegmentationError::data_integrity(
            "no regions have both mobility and spending data",
        ));
    }

    let features = Feature::ordered();
    let values: Vec<f64> = regions
        .iter()
        .flat_map(|region| features.iter().map(|f| f.value(region)))
        .collect();
    let raw = Array2::from_shape_vec((regions.len(), features.len()), values).map_err(|e| {
        SegmentationError::data_integrity(format!("cannot shape feature matrix: {e}"))
    })?;

    if raw.iter().any(|v| !v.is_finite()) {
        return Err(SegmentationError::data_integrity(
            "assembled feature matrix contains a non-finite value",
        ));
    }

    let normalized = standardize(&raw)?;

    info!(
        "Assembled {} regions x {} features ({} dropped)",
        regions.len(),
        features.len(),
        mobility.len() - regions.len()
    );

    Ok(FeatureTable {
        regions,
        features,
        raw,
        normalized,
    })
}

/// Per-column z-score using the population standard deviation.
/// Zero-variance columns become all zeros.
pub fn standardize(raw: &Array2<f64>) -> Result<Array2<f64>> {
    let dataset = Dataset::new(raw.clone(), Array1::<usize>::zeros(raw.nrows()));
    let scaler = LinearScaler::standard().fit(&dataset).map_err(|e| {
        SegmentationError::data_integrity(format!("cannot fit feature scaler: {e}"))
    })?;

    Ok(scaler.transform(raw.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mobility(code: &str, trips: u64, ratio: f64) -> MobilityRecord {
        MobilityRecord {
            region_code: code.to_string(),
            region_name: code.to_string(),
            total_trips: trips,
            avg_trip_duration_minutes: 15.0,
            member_trips: (trips as f64 * ratio) as u64,
            casual_trips: trips - (trips as f64 * ratio) as u64,
            member_ratio: ratio,
            peak_hour_ratio: 0.3,
            weekend_ratio: 0.3,
            night_trips_ratio: 0.05,
            avg_trip_distance_km: 3.0,
            station_density: 0.5,
            inter_region_ratio: 0.02,
        }
    }

    fn spend(code: &str, category: SpendingCategory, amount: f64) -> SpendingRecord {
        SpendingRecord {
            region_code: code.to_string(),
            category,
            spending_amount: amount,
            spending_proportion: 0.0,
        }
    }

    #[test]
    fn test_feature_order() {
        let names: Vec<&str> = Feature::ordered().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "total_trips",
                "member_ratio",
                "avg_trip_duration_minutes",
                "restaurants",
                "retail",
                "grocery",
                "entertainment",
                "transportation",
                "healthcare",
            ]
        );
    }

    #[test]
    fn test_missing_category_is_zero() {
        let mobility = vec![mobility("A", 10_000, 0.7), mobility("B", 20_000, 0.8)];
        let spending = vec![
            spend("A", SpendingCategory::Restaurants, 100_000.0),
            spend("A", SpendingCategory::Entertainment, 50_000.0),
            spend("B", SpendingCategory::Restaurants, 120_000.0),
            spend("B", SpendingCategory::Total, 120_000.0),
        ];

        let table = assemble_features(&mobility, &spending).unwrap();
        assert_eq!(table.len(), 2);

        let b = table.raw_row("B").unwrap();
        assert_eq!(b[3], 120_000.0);
        assert_eq!(b[6], 0.0, "entertainment should be filled with zero");
        assert_eq!(table.regions[1].spending(SpendingCategory::Healthcare), 0.0);
    }

    #[test]
    fn test_region_without_spending_dropped() {
        let mobility = vec![mobility("A", 10_000, 0.7), mobility("B", 20_000, 0.8)];
        let spending = vec![spend("A", SpendingCategory::Retail, 1.0)];

        let table = assemble_features(&mobility, &spending).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.regions[0].region_code(), "A");
        assert!(table.raw_row("B").is_none());
    }

    #[test]
    fn test_no_surviving_regions() {
        let mobility = vec![mobility("A", 10_000, 0.7)];
        let err = assemble_features(&mobility, &[]).unwrap_err();
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_standardize_zero_variance() {
        let rows = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let z = standardize(&rows).unwrap();

        for value in z.column(1) {
            assert_eq!(*value, 0.0);
        }
        assert!(z.column(0).sum().abs() < 1e-12);
        assert!(z[[0, 0]] < z[[1, 0]] && z[[1, 0]] < z[[2, 0]]);
    }

    #[test]
    fn test_normalized_matches_raw_shape() {
        let mobility = vec![mobility("A", 10_000, 0.7), mobility("B", 20_000, 0.8)];
        let spending = vec![
            spend("A", SpendingCategory::Retail, 1_000.0),
            spend("B", SpendingCategory::Retail, 3_000.0),
        ];

        let table = assemble_features(&mobility, &spending).unwrap();
        assert_eq!(table.raw.dim(), (2, 9));
        assert_eq!(table.normalized.dim(), (2, 9));
        // Retail varies, healthcare is zero everywhere
        assert!(table.normalized[[1, 4]] > 0.0);
        assert_eq!(table.normalized[[0, 8]], 0.0);
    }

    #[test]
    fn test_feature_serializes_as_name() {
        let json = serde_json::to_string(&Feature::Spending(SpendingCategory::Retail)).unwrap();
        assert_eq!(json, "\"retail\"");
    }
}
