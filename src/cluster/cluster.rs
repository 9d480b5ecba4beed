use crate::geo::{distance_km, Geo, GeoPoint};

/**
 * A group of points that K-Means assigned to the same centroid.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<T> {
    /// Index of the centroid this cluster formed around, starting at 0.
    pub id: usize,
    /// Final centroid from K-Means. An empty cluster keeps its last centroid.
    pub centroid: GeoPoint,
    /// Members in the same order they appeared in the input.
    pub members: Vec<T>,
    /// Display color taken from the palette.
    pub color: String,
}

impl<T: Geo> Cluster<T> {
    /// The number of points in this cluster.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean great circle distance from the members to the centroid in kilometers, `None` for an
    /// empty cluster.
    pub fn mean_distance_to_centroid(&self) -> Option<f64> {
        if self.members.is_empty() {
            return None;
        }

        let total: f64 = self
            .members
            .iter()
            .map(|m| distance_km(self.centroid, m.location()))
            .sum();

        Some(total / self.members.len() as f64)
    }
}
