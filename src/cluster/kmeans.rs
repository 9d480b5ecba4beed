use super::{Cluster, Palette};
use crate::{
    geo::{distance_km, spherical_centroid, Geo, GeoPoint},
    SiteError,
};
use rand::Rng;

/// The fewest clusters an analysis may ask for.
pub const MIN_CLUSTERS: usize = 2;
/// The most clusters an analysis may ask for.
pub const MAX_CLUSTERS: usize = 10;

const DEFAULT_MAX_ITERATIONS: usize = 100;
const DEFAULT_CONVERGENCE_THRESHOLD_KM: f64 = 0.01;

/**
 * Settings for partitioning points with K-Means under the great circle distance.
 *
 * The engine holds no state between runs, so one value can be shared by any number of threads.
 */
#[derive(Debug, Clone)]
pub struct KMeans {
    max_iterations: usize,
    convergence_threshold_km: f64,
    palette: Palette,
}

/// The outcome of a K-Means run.
#[derive(Debug, Clone)]
pub struct Clustering<T> {
    /// One cluster per centroid, ordered by id. Together they hold every input point once.
    pub clusters: Vec<Cluster<T>>,
    /// The number of assignment and update passes that ran, including the last one.
    pub iterations: usize,
    /// False if the run stopped because it hit the iteration cap.
    pub converged: bool,
}

impl Default for KMeans {
    fn default() -> Self {
        KMeans {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_threshold_km: DEFAULT_CONVERGENCE_THRESHOLD_KM,
            palette: Palette::default(),
        }
    }
}

impl KMeans {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_convergence_threshold_km(mut self, threshold_km: f64) -> Self {
        self.convergence_threshold_km = threshold_km;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn convergence_threshold_km(&self) -> f64 {
        self.convergence_threshold_km
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /**
     * Check that k clusters can be made from num_points points.
     *
     * There must be at least one point, k must be in the range 2 to 10 inclusive, and there can't
     * be more clusters than points.
     */
    pub fn validate(k: usize, num_points: usize) -> Result<(), SiteError> {
        if num_points == 0 {
            return Err(SiteError::InvalidInput(
                "there are no businesses to cluster".to_owned(),
            ));
        }

        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
            return Err(SiteError::InvalidParameter(format!(
                "number of clusters must be between {} and {}, got {}",
                MIN_CLUSTERS, MAX_CLUSTERS, k
            )));
        }

        if k > num_points {
            return Err(SiteError::InvalidParameter(format!(
                "number of clusters ({}) exceeds the number of businesses ({})",
                k, num_points
            )));
        }

        Ok(())
    }

    /**
     * Partition points into k clusters.
     *
     * The initial centroids are k distinct input points chosen uniformly at random with rng, so
     * pass a seeded generator for repeatable results.
     */
    pub fn run<T, R>(&self, points: &[T], k: usize, rng: &mut R) -> Result<Clustering<T>, SiteError>
    where
        T: Geo + Clone,
        R: Rng + ?Sized,
    {
        Self::validate(k, points.len())?;

        let initial: Vec<GeoPoint> = rand::seq::index::sample(rng, points.len(), k)
            .into_iter()
            .map(|i| points[i].location())
            .collect();

        self.run_from(points, initial)
    }

    /**
     * Partition points starting from the supplied centroids, one cluster per centroid.
     *
     * Each pass assigns every point to its closest centroid, then moves each centroid to the
     * spherical centroid of its members. A centroid that attracted no members stays where it
     * was. The run stops when no centroid moves as far as the convergence threshold, keeping the
     * centroids the final assignment was made against, or after max_iterations passes, keeping
     * the last moved centroids.
     */
    pub fn run_from<T>(&self, points: &[T], initial: Vec<GeoPoint>) -> Result<Clustering<T>, SiteError>
    where
        T: Geo + Clone,
    {
        Self::validate(initial.len(), points.len())?;

        if self.max_iterations == 0 {
            return Err(SiteError::InvalidParameter(
                "the maximum number of iterations must be at least 1".to_owned(),
            ));
        }

        let mut centroids = initial;
        let mut assignments: Vec<usize> = vec![];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            assignments = assign(points, &centroids);
            let new_centroids = update_centroids(points, &assignments, &centroids)?;

            let shift = max_shift_km(&centroids, &new_centroids);
            log::debug!(
                "k-means pass {}: largest centroid shift {:.5} km",
                iterations,
                shift
            );

            if shift < self.convergence_threshold_km {
                converged = true;
                break;
            }

            centroids = new_centroids;
        }

        if !converged {
            log::warn!(
                "k-means stopped after {} passes without converging",
                iterations
            );
        }

        let mut clusters: Vec<Cluster<T>> = centroids
            .into_iter()
            .enumerate()
            .map(|(id, centroid)| Cluster {
                id,
                centroid,
                members: vec![],
                color: self.palette.color(id).to_owned(),
            })
            .collect();

        for (pnt, &cluster_idx) in points.iter().zip(&assignments) {
            clusters[cluster_idx].members.push(pnt.clone());
        }

        Ok(Clustering {
            clusters,
            iterations,
            converged,
        })
    }
}

/// The index of the closest centroid for every point. Ties go to the lowest index.
fn assign<T: Geo>(points: &[T], centroids: &[GeoPoint]) -> Vec<usize> {
    points
        .iter()
        .map(|pnt| {
            let loc = pnt.location();
            let mut min_dist = f64::INFINITY;
            let mut closest = 0;

            for (i, &centroid) in centroids.iter().enumerate() {
                let dist = distance_km(loc, centroid);
                if dist < min_dist {
                    min_dist = dist;
                    closest = i;
                }
            }

            closest
        })
        .collect()
}

/// Recompute each centroid from its members. Centroids with no members are carried over.
fn update_centroids<T: Geo>(
    points: &[T],
    assignments: &[usize],
    old_centroids: &[GeoPoint],
) -> Result<Vec<GeoPoint>, SiteError> {
    let mut groups: Vec<Vec<GeoPoint>> = vec![vec![]; old_centroids.len()];
    for (pnt, &cluster_idx) in points.iter().zip(assignments) {
        groups[cluster_idx].push(pnt.location());
    }

    groups
        .iter()
        .zip(old_centroids)
        .map(|(group, &old)| {
            if group.is_empty() {
                Ok(old)
            } else {
                spherical_centroid(group)
            }
        })
        .collect()
}

fn max_shift_km(old: &[GeoPoint], new: &[GeoPoint]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(&o, &n)| distance_km(o, n))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[derive(Debug, Clone)]
    struct Labeled {
        label: usize,
        loc: GeoPoint,
    }

    impl Geo for Labeled {
        fn location(&self) -> GeoPoint {
            self.loc
        }
    }

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    /// Two tight pairs about 10 meters across, with the pairs about 5 km apart.
    fn two_pairs() -> Vec<Labeled> {
        [
            pt(0.0, 0.0),
            pt(0.0, 0.00009),
            pt(0.0, 0.045),
            pt(0.0, 0.04509),
        ]
        .into_iter()
        .enumerate()
        .map(|(label, loc)| Labeled { label, loc })
        .collect()
    }

    fn grid() -> Vec<Labeled> {
        let mut points = Vec::with_capacity(36);
        for i in 0..6 {
            for j in 0..6 {
                let loc = pt(14.83 + 0.003 * i as f64, 120.95 + 0.004 * j as f64);
                points.push(Labeled {
                    label: points.len(),
                    loc,
                });
            }
        }
        points
    }

    fn sorted_labels(clust: &Cluster<Labeled>) -> Vec<usize> {
        let mut labels: Vec<usize> = clust.members.iter().map(|m| m.label).collect();
        labels.sort_unstable();
        labels
    }

    #[test]
    fn test_validate() {
        assert!(KMeans::validate(2, 2).is_ok());
        assert!(KMeans::validate(10, 100).is_ok());

        assert!(matches!(
            KMeans::validate(2, 0),
            Err(SiteError::InvalidInput(_))
        ));
        assert!(matches!(
            KMeans::validate(1, 20),
            Err(SiteError::InvalidParameter(_))
        ));
        assert!(matches!(
            KMeans::validate(11, 20),
            Err(SiteError::InvalidParameter(_))
        ));
        assert!(matches!(
            KMeans::validate(5, 4),
            Err(SiteError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_rejects_bad_input() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let km = KMeans::default();

        let empty: Vec<Labeled> = vec![];
        assert!(matches!(
            km.run(&empty, 2, &mut rng),
            Err(SiteError::InvalidInput(_))
        ));
        assert!(matches!(
            km.run(&two_pairs(), 1, &mut rng),
            Err(SiteError::InvalidParameter(_))
        ));
        assert!(matches!(
            km.run(&two_pairs(), 5, &mut rng),
            Err(SiteError::InvalidParameter(_))
        ));

        let km = KMeans::default().with_max_iterations(0);
        assert!(matches!(
            km.run(&two_pairs(), 2, &mut rng),
            Err(SiteError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_two_pairs_from_chosen_centroids() {
        let points = two_pairs();
        let km = KMeans::default();

        let result = km
            .run_from(&points, vec![points[0].loc, points[2].loc])
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(sorted_labels(&result.clusters[0]), vec![0, 1]);
        assert_eq!(sorted_labels(&result.clusters[1]), vec![2, 3]);

        // Converged on the first pass, so the centroids are the ones the members were assigned to.
        assert_eq!(result.clusters[0].centroid, points[0].loc);
        assert_eq!(result.clusters[1].centroid, points[2].loc);
        assert_eq!(result.clusters[0].color, "#3b82f6");
        assert_eq!(result.clusters[1].color, "#ef4444");
    }

    #[test]
    fn test_two_pairs_any_seed() {
        let points = two_pairs();
        let km = KMeans::default();

        for seed in 0..20 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let result = km.run(&points, 2, &mut rng).unwrap();

            assert!(result.converged);
            assert!(result.iterations <= 5, "seed {} took {}", seed, result.iterations);

            let mut found: Vec<Vec<usize>> = result.clusters.iter().map(sorted_labels).collect();
            found.sort();
            assert_eq!(found, vec![vec![0, 1], vec![2, 3]], "seed {}", seed);
        }
    }

    #[test]
    fn test_partition_invariant() {
        let points = grid();

        for k in MIN_CLUSTERS..=MAX_CLUSTERS {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(k as u64);
            let result = KMeans::default().run(&points, k, &mut rng).unwrap();

            assert_eq!(result.clusters.len(), k);

            let mut labels: Vec<usize> = result
                .clusters
                .iter()
                .flat_map(|c| c.members.iter().map(|m| m.label))
                .collect();
            labels.sort_unstable();

            let expected: Vec<usize> = (0..points.len()).collect();
            assert_eq!(labels, expected);

            for (i, clust) in result.clusters.iter().enumerate() {
                assert_eq!(clust.id, i);
            }
        }
    }

    #[test]
    fn test_iteration_cap() {
        let points = grid();

        // A zero threshold can never be beaten, so every run goes to the cap.
        let km = KMeans::default()
            .with_max_iterations(7)
            .with_convergence_threshold_km(0.0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let result = km.run(&points, 4, &mut rng).unwrap();

        assert_eq!(result.iterations, 7);
        assert!(!result.converged);

        let km = KMeans::default().with_max_iterations(3);
        for seed in 0..10 {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let result = km.run(&points, 6, &mut rng).unwrap();
            assert!(result.iterations <= 3);
        }
    }

    #[test]
    fn test_assignment_ties_go_to_lowest_index() {
        let points = [pt(1.0, 1.0), pt(-1.0, -1.0), pt(0.0, 0.0)];
        let centroids = [pt(0.0, 0.0), pt(0.0, 0.0), pt(5.0, 5.0)];

        assert_eq!(assign(&points, &centroids), vec![0, 0, 0]);

        let centroids = [pt(5.0, 5.0), pt(0.0, 0.0), pt(0.0, 0.0)];
        assert_eq!(assign(&points, &centroids), vec![1, 1, 1]);
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let points = [pt(0.0, 0.0), pt(0.0, 0.001), pt(0.001, 0.0)];
        let old = [pt(0.0, 0.0), pt(50.0, 50.0)];

        let assignments = assign(&points, &old);
        assert_eq!(assignments, vec![0, 0, 0]);

        let new = update_centroids(&points, &assignments, &old).unwrap();
        assert_eq!(new[1], old[1]);
        assert_ne!(new[0], old[0]);

        // A full run keeps the dead cluster and leaves it empty.
        let result = KMeans::default().run_from(&points, old.to_vec()).unwrap();
        assert!(result.clusters[1].is_empty());
        assert_eq!(result.clusters[1].centroid, old[1]);
        assert_eq!(result.clusters[0].len(), 3);
    }

    #[test]
    fn test_centroids_kept_on_converging_pass() {
        let points = [pt(0.0, 0.0), pt(0.0, 0.001), pt(0.001, 0.0)];
        let start = vec![pt(0.0, 0.0), pt(50.0, 50.0)];
        let settled = spherical_centroid(&points).unwrap();

        // The first pass moves the centroid about 50 m, the second doesn't move it at all.
        let result = KMeans::default().run_from(&points, start.clone()).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.clusters[0].centroid, settled);

        // Within the threshold on the first pass, so the starting centroid is kept.
        let km = KMeans::default().with_convergence_threshold_km(1.0);
        let result = km.run_from(&points, start.clone()).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.clusters[0].centroid, start[0]);

        // Stopped by the cap, so the last moved centroid is reported.
        let km = KMeans::default()
            .with_max_iterations(1)
            .with_convergence_threshold_km(0.0);
        let result = km.run_from(&points, start).unwrap();
        assert!(!result.converged);
        assert_eq!(result.clusters[0].centroid, settled);
    }
}
