/// Exact-position vertex deduplication
use std::collections::HashMap;

use nalgebra::Point3;

use crate::geometry::Mesh;

/// Maps a bit-exact (x, y, z) key to the index assigned on first sight.
///
/// No tolerance is applied: `0.0` and `-0.0` are different keys, and points
/// that differ in the last ulp stay separate vertices.
#[derive(Debug, Default)]
pub struct VertexDedup {
    indices: HashMap<[u64; 3], u32>,
}

impl VertexDedup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(point: &Point3<f64>) -> [u64; 3] {
        [point.x.to_bits(), point.y.to_bits(), point.z.to_bits()]
    }

    /// Returns the index for `point`, appending it to `mesh` if unseen.
    pub fn insert(&mut self, mesh: &mut Mesh, point: Point3<f64>) -> u32 {
        *self
            .indices
            .entry(Self::key(&point))
            .or_insert_with(|| mesh.add_vertex(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_share_an_index() {
        let mut mesh = Mesh::new();
        let mut dedup = VertexDedup::new();
        let a = dedup.insert(&mut mesh, Point3::new(1.0, 2.0, 3.0));
        let b = dedup.insert(&mut mesh, Point3::new(4.0, 5.0, 6.0));
        let c = dedup.insert(&mut mesh, Point3::new(1.0, 2.0, 3.0));
        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn near_points_and_signed_zero_stay_distinct() {
        let mut mesh = Mesh::new();
        let mut dedup = VertexDedup::new();
        dedup.insert(&mut mesh, Point3::new(0.0, 0.0, 0.0));
        dedup.insert(&mut mesh, Point3::new(-0.0, 0.0, 0.0));
        dedup.insert(&mut mesh, Point3::new(0.1 + 0.2, 0.0, 0.0));
        dedup.insert(&mut mesh, Point3::new(0.3, 0.0, 0.0));
        assert_eq!(mesh.vertex_count(), 4);
    }
}
