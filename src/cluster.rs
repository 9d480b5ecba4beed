/*!
 * Types and functions for working with clusters.
 *
 * A cluster is a group of nearby businesses found by running K-Means over their locations with
 * the great circle distance as the metric.
 */

pub use cluster::Cluster;
pub use kmeans::{Clustering, KMeans, MAX_CLUSTERS, MIN_CLUSTERS};
pub use palette::Palette;

mod cluster;
mod kmeans;
mod palette;
