//! Segmentation engine: seeded k-means over the normalized feature matrix,
//! followed by per-cluster statistics on the raw values.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{Result, SegmentationError};
use crate::features::{AssembledRegion, Feature, FeatureTable};
use crate::models::{Level, SpendingCategory};

pub const ALGORITHM: &str = "kmeans";

// ============================================================================
// Qualitative classification
// ============================================================================

/// Strict lower edges of the medium and high levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints {
    pub medium_above: f64,
    pub high_above: f64,
}

/// Average trips per region
pub const MOBILITY_BREAKPOINTS: Breakpoints = Breakpoints {
    medium_above: 8_000.0,
    high_above: 15_000.0,
};

/// Average member ratio
pub const ENGAGEMENT_BREAKPOINTS: Breakpoints = Breakpoints {
    medium_above: 0.6,
    high_above: 0.8,
};

/// Average restaurant spending
pub const DINING_BREAKPOINTS: Breakpoints = Breakpoints {
    medium_above: 80_000.0,
    high_above: 150_000.0,
};

pub fn classify(value: f64, breakpoints: Breakpoints) -> Level {
    if value > breakpoints.high_above {
        Level::High
    } else if value > breakpoints.medium_above {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn mobility_level(avg_trips: f64) -> Level {
    classify(avg_trips, MOBILITY_BREAKPOINTS)
}

pub fn engagement_level(avg_member_ratio: f64) -> Level {
    classify(avg_member_ratio, ENGAGEMENT_BREAKPOINTS)
}

pub fn dining_preference(avg_restaurant_spending: f64) -> Level {
    classify(avg_restaurant_spending, DINING_BREAKPOINTS)
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ClusterCharacteristics {
    pub mobility_level: Level,
    pub engagement: Level,
    pub dining_preference: Level,
}

/// Mean of every mobility field across a cluster's members
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MobilityMeans {
    pub total_trips: f64,
    pub avg_trip_duration_minutes: f64,
    pub member_ratio: f64,
    pub peak_hour_ratio: f64,
    pub weekend_ratio: f64,
    pub night_trips_ratio: f64,
    pub avg_trip_distance_km: f64,
    pub station_density: f64,
    pub inter_region_ratio: f64,
}

impl MobilityMeans {
    fn of(members: &[&AssembledRegion]) -> Self {
        let n = members.len() as f64;
        let mean = |field: fn(&AssembledRegion) -> f64| {
            members.iter().map(|r| field(r)).sum::<f64>() / n
        };

        Self {
            total_trips: mean(|r| r.mobility.total_trips as f64),
            avg_trip_duration_minutes: mean(|r| r.mobility.avg_trip_duration_minutes),
            member_ratio: mean(|r| r.mobility.member_ratio),
            peak_hour_ratio: mean(|r| r.mobility.peak_hour_ratio),
            weekend_ratio: mean(|r| r.mobility.weekend_ratio),
            night_trips_ratio: mean(|r| r.mobility.night_trips_ratio),
            avg_trip_distance_km: mean(|r| r.mobility.avg_trip_distance_km),
            station_density: mean(|r| r.mobility.station_density),
            inter_region_ratio: mean(|r| r.mobility.inter_region_ratio),
        }
    }

    fn values(&self) -> [f64; 9] {
        [
            self.total_trips,
            self.avg_trip_duration_minutes,
            self.member_ratio,
            self.peak_hour_ratio,
            self.weekend_ratio,
            self.night_trips_ratio,
            self.avg_trip_distance_km,
            self.station_density,
            self.inter_region_ratio,
        ]
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClusterProfile {
    pub cluster_id: usize,
    pub size: usize,
    pub regions: Vec<String>,
    pub mobility: MobilityMeans,
    /// Mean spending per category
    pub spending: BTreeMap<SpendingCategory, f64>,
    pub characteristics: ClusterCharacteristics,
}

impl ClusterProfile {
    pub fn avg_trips(&self) -> f64 {
        self.mobility.total_trips
    }

    pub fn avg_member_ratio(&self) -> f64 {
        self.mobility.member_ratio
    }

    pub fn avg_duration(&self) -> f64 {
        self.mobility.avg_trip_duration_minutes
    }

    pub fn avg_spending(&self, category: SpendingCategory) -> f64 {
        self.spending.get(&category).copied().unwrap_or(0.0)
    }

    pub fn avg_restaurant_spending(&self) -> f64 {
        self.avg_spending(SpendingCategory::Restaurants)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionAssignment {
    pub region_code: String,
    pub cluster_id: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureWeight {
    pub feature: Feature,
    pub weight: f64,
}

/// Everything the engine reports about one clustering run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentationResult {
    /// Ordered by ascending cluster id
    pub cluster_profiles: Vec<ClusterProfile>,
    pub assignments: Vec<RegionAssignment>,
    /// Mean absolute centroid coordinate per feature, in feature order
    pub feature_importance: Vec<FeatureWeight>,
    pub silhouette_score: f64,
    pub inertia: f64,
    pub n_clusters: usize,
    pub algorithm: String,
}

impl SegmentationResult {
    pub fn cluster_of(&self, region_code: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.region_code == region_code)
            .map(|a| a.cluster_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub n_clusters: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl From<&PipelineConfig> for KMeansParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            n_clusters: config.n_clusters,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }
}

// ============================================================================
// K-Means
// ============================================================================

/// Fitted k-means state in normalized feature space
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    pub n_clusters: usize,
    pub labels: Array1<usize>,
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares
    pub inertia: f64,
}

impl KMeansModel {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Mean silhouette coefficient over every point.
    /// Points in singleton clusters score 0, as does a single-cluster model.
    pub fn silhouette(&self, features: &Array2<f64>) -> f64 {
        let n = features.nrows();
        if n < 2 || self.n_clusters < 2 {
            return 0.0;
        }

        let sizes = self.cluster_sizes();
        let mut total = 0.0;

        for (i, point) in features.outer_iter().enumerate() {
            let own = self.labels[i];
            if sizes[own] <= 1 {
                continue;
            }

            let mut sums = vec![0.0; self.n_clusters];
            for (j, other) in features.outer_iter().enumerate() {
                if i != j {
                    sums[self.labels[j]] += euclidean_distance(point, other);
                }
            }

            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..self.n_clusters)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);

            if b.is_finite() && a.max(b) > 0.0 {
                total += (b - a) / a.max(b);
            }
        }

        total / n as f64
    }

    /// Mean absolute centroid coordinate per feature column
    pub fn feature_importance(&self) -> Vec<f64> {
        self.centroids
            .mapv(f64::abs)
            .mean_axis(Axis(0))
            .map(|means| means.to_vec())
            .unwrap_or_default()
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn euclidean_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Move the point farthest from its centroid into each empty cluster,
/// taking only from clusters that keep at least one member.
/// Returns whether any label changed.
fn repair_empty_clusters(
    features: &Array2<f64>,
    labels: &mut Array1<usize>,
    centroids: &Array2<f64>,
    k: usize,
) -> bool {
    let mut moved = false;

    for empty in 0..k {
        let mut sizes = vec![0usize; k];
        for &label in labels.iter() {
            sizes[label] += 1;
        }
        if sizes[empty] > 0 {
            continue;
        }

        let donor = (0..features.nrows())
            .filter(|&i| sizes[labels[i]] > 1)
            .map(|i| (i, squared_distance(features.row(i), centroids.row(labels[i]))))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((i, d)),
            });

        if let Some((i, _)) = donor {
            debug!("Relocating point {} into empty cluster {}", i, empty);
            labels[i] = empty;
            moved = true;
        }
    }

    moved
}

/// Per-cluster mean of the assigned points; a cluster with no points keeps
/// its previous centroid
fn cluster_means(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    previous: &Array2<f64>,
) -> Array2<f64> {
    let mut centroids = previous.clone();
    for (c, mut centroid) in centroids.outer_iter_mut().enumerate() {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == c)
            .map(|(i, _)| i)
            .collect();
        if let Some(mean) = features.select(Axis(0), &members).mean_axis(Axis(0)) {
            centroid.assign(&mean);
        }
    }
    centroids
}

fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_distance(point, centroids.row(label)))
        .sum()
}

fn fit_linfa(
    dataset: &Dataset<f64, usize, ndarray::Ix1>,
    k: usize,
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
) -> std::result::Result<KMeans<f64, L2Dist>, linfa_clustering::KMeansError> {
    KMeans::params_with(k, StdRng::seed_from_u64(seed), L2Dist)
        .max_n_iterations(max_iterations as u64)
        .tolerance(tolerance)
        .fit(dataset)
}

/// Fit k-means on normalized features.
///
/// The linfa k-means++ fit is seeded from `rng`. If no run settles within
/// `max_iterations`, the fit is repeated with an unbounded tolerance so the
/// iteration cap ends the run instead of failing it.
pub fn fit_kmeans<R: Rng + ?Sized>(
    features: &Array2<f64>,
    params: KMeansParams,
    rng: &mut R,
) -> Result<KMeansModel> {
    let k = params.n_clusters;
    let n = features.nrows();

    if k == 0 {
        return Err(SegmentationError::configuration("cluster count must be at least 1"));
    }
    if n < k {
        return Err(SegmentationError::configuration(format!(
            "{k} clusters requires at least {k} regions, but only {n} are available"
        )));
    }

    let dataset = Dataset::new(features.clone(), Array1::<usize>::zeros(n));
    let seed: u64 = rng.gen();

    let fitted = match fit_linfa(&dataset, k, seed, params.max_iterations, params.tolerance) {
        Ok(model) => model,
        Err(e) => {
            warn!(
                "k-means did not settle within {} iterations ({}); accepting capped fit",
                params.max_iterations, e
            );
            fit_linfa(&dataset, k, seed, params.max_iterations, f64::INFINITY).map_err(|e| {
                SegmentationError::data_integrity(format!("k-means fit failed: {e}"))
            })?
        }
    };

    let mut labels: Array1<usize> = fitted.predict(features);
    let mut centroids = fitted.centroids().clone();

    if repair_empty_clusters(features, &mut labels, &centroids, k) {
        centroids = cluster_means(features, &labels, &centroids);
    }
    let inertia = compute_inertia(features, &labels, &centroids);

    Ok(KMeansModel {
        n_clusters: k,
        labels,
        centroids,
        inertia,
    })
}

// ============================================================================
// Cluster profiling
// ============================================================================

fn profile_cluster(cluster_id: usize, members: &[&AssembledRegion]) -> Result<ClusterProfile> {
    if members.is_empty() {
        return Err(SegmentationError::data_integrity(format!(
            "cluster {cluster_id} has no member regions"
        )));
    }

    let mobility = MobilityMeans::of(members);
    let spending: BTreeMap<SpendingCategory, f64> = SpendingCategory::ALL
        .iter()
        .map(|&c| {
            let mean = members.iter().map(|r| r.spending(c)).sum::<f64>() / members.len() as f64;
            (c, mean)
        })
        .collect();

    if mobility.values().iter().chain(spending.values()).any(|v| !v.is_finite()) {
        return Err(SegmentationError::data_integrity(format!(
            "cluster {cluster_id} has a non-finite mean statistic"
        )));
    }

    let characteristics = ClusterCharacteristics {
        mobility_level: mobility_level(mobility.total_trips),
        engagement: engagement_level(mobility.member_ratio),
        dining_preference: dining_preference(
            spending.get(&SpendingCategory::Restaurants).copied().unwrap_or(0.0),
        ),
    };

    Ok(ClusterProfile {
        cluster_id,
        size: members.len(),
        regions: members.iter().map(|r| r.region_code().to_string()).collect(),
        mobility,
        spending,
        characteristics,
    })
}

/// Cluster the assembled regions and characterize each cluster
pub fn perform_segmentation<R: Rng + ?Sized>(
    table: &FeatureTable,
    params: KMeansParams,
    rng: &mut R,
) -> Result<SegmentationResult> {
    let model = fit_kmeans(&table.normalized, params, rng)?;

    let mut cluster_profiles = Vec::with_capacity(model.n_clusters);
    for cluster_id in 0..model.n_clusters {
        let members: Vec<&AssembledRegion> = table
            .regions
            .iter()
            .zip(&model.labels)
            .filter(|(_, &label)| label == cluster_id)
            .map(|(region, _)| region)
            .collect();

        let profile = profile_cluster(cluster_id, &members)?;
        debug!(
            "Cluster {}: {:?} mobility={} engagement={} dining={}",
            cluster_id,
            profile.regions,
            profile.characteristics.mobility_level,
            profile.characteristics.engagement,
            profile.characteristics.dining_preference
        );
        cluster_profiles.push(profile);
    }

    let assignments = table
        .regions
        .iter()
        .zip(&model.labels)
        .map(|(region, &cluster_id)| RegionAssignment {
            region_code: region.region_code().to_string(),
            cluster_id,
        })
        .collect();

    let feature_importance = table
        .features
        .iter()
        .zip(model.feature_importance())
        .map(|(&feature, weight)| FeatureWeight { feature, weight })
        .collect();

    let silhouette_score = model.silhouette(&table.normalized);

    info!(
        "Segmented {} regions into {} clusters (inertia {:.3}, silhouette {:.3})",
        table.len(),
        model.n_clusters,
        model.inertia,
        silhouette_score
    );

    Ok(SegmentationResult {
        cluster_profiles,
        assignments,
        feature_importance,
        silhouette_score,
        inertia: model.inertia,
        n_clusters: model.n_clusters,
        algorithm: ALGORITHM.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            n_clusters: k,
            max_iterations: 100,
            tolerance: 1e-4,
        }
    }

    fn blobs() -> Array2<f64> {
        array![
            [-1.0, -1.0],
            [-1.1, -0.9],
            [-0.9, -1.1],
            [1.0, 1.0],
            [1.1, 0.9],
            [0.9, 1.1],
        ]
    }

    #[test]
    fn test_classify_breakpoints() {
        assert_eq!(mobility_level(15_001.0), Level::High);
        assert_eq!(mobility_level(15_000.0), Level::Medium);
        assert_eq!(mobility_level(8_000.0), Level::Low);
        assert_eq!(engagement_level(0.85), Level::High);
        assert_eq!(engagement_level(0.7), Level::Medium);
        assert_eq!(engagement_level(0.6), Level::Low);
        assert_eq!(dining_preference(200_000.0), Level::High);
        assert_eq!(dining_preference(100_000.0), Level::Medium);
        assert_eq!(dining_preference(50_000.0), Level::Low);
    }

    #[test]
    fn test_separates_two_blobs() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = fit_kmeans(&blobs(), params(2), &mut rng).unwrap();

        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[1], model.labels[2]);
        assert_eq!(model.labels[3], model.labels[4]);
        assert_ne!(model.labels[0], model.labels[3]);
        assert_eq!(model.centroids.dim(), (2, 2));
        assert!(model.silhouette(&blobs()) > 0.8);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let a = fit_kmeans(&blobs(), params(3), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = fit_kmeans(&blobs(), params(3), &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_points() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = fit_kmeans(&blobs(), params(10), &mut rng).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("at least 10 regions"));
    }

    #[test]
    fn test_iteration_cap_is_accepted() {
        let mut rng = StdRng::seed_from_u64(3);
        let capped = KMeansParams {
            n_clusters: 2,
            max_iterations: 1,
            tolerance: 1e-12,
        };
        let model = fit_kmeans(&blobs(), capped, &mut rng).unwrap();
        assert_eq!(model.labels.len(), 6);
        assert!(model.cluster_sizes().iter().all(|&s| s > 0));
    }

    #[test]
    fn test_repair_fills_empty_cluster() {
        let features = array![[0.0], [0.1], [5.0], [9.0]];
        let centroids = array![[0.0], [5.0], [100.0]];
        let mut labels = array![0, 0, 1, 1];

        assert!(repair_empty_clusters(&features, &mut labels, &centroids, 3));
        // 9.0 is the farthest point from its centroid
        assert_eq!(labels, array![0, 0, 1, 2]);

        let means = cluster_means(&features, &labels, &centroids);
        assert_eq!(means, array![[0.05], [5.0], [9.0]]);
        assert!(!repair_empty_clusters(&features, &mut labels, &means, 3));
    }

    #[test]
    fn test_inertia_is_within_cluster_sum_of_squares() {
        let features = array![[0.0], [2.0], [10.0]];
        let labels = array![0, 0, 1];
        let centroids = array![[1.0], [10.0]];
        assert_eq!(compute_inertia(&features, &labels, &centroids), 2.0);
    }

    #[test]
    fn test_feature_importance_is_mean_abs_centroid() {
        let model = KMeansModel {
            n_clusters: 2,
            labels: array![0, 1],
            centroids: array![[1.0, -2.0], [-3.0, 0.0]],
            inertia: 0.0,
        };
        assert_eq!(model.feature_importance(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_singletons_have_zero_silhouette() {
        let features = array![[0.0], [5.0]];
        let model = KMeansModel {
            n_clusters: 2,
            labels: array![0, 1],
            centroids: features.clone(),
            inertia: 0.0,
        };
        assert_eq!(model.silhouette(&features), 0.0);
    }
}
