/// Indexed triangle mesh shared by every loader and renderer
use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::format::Format;

/// A triangle mesh: positions plus index triples into them.
///
/// Colors and normals are per vertex and, when present, always have one
/// entry per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[u32; 3]>,
    pub colors: Option<Vec<[f64; 3]>>,
    pub normals: Option<Vec<Vector3<f64>>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            colors: None,
            normals: None,
        }
    }

    pub fn from_parts(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            colors: None,
            normals: None,
        }
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    pub fn add_triangle(&mut self, triangle: [u32; 3]) {
        self.triangles.push(triangle);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// A mesh without positions or without faces has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_vertex_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Checks that every index is in bounds and attribute lengths match.
    pub fn validate(&self, format: Format) -> Result<()> {
        let count = self.vertices.len();
        if let Some(index) = self
            .triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= count)
        {
            return Err(Error::parse(
                format,
                format!("triangle index {index} out of range for {count} vertices"),
            ));
        }
        if self.colors.as_ref().is_some_and(|c| c.len() != count) {
            return Err(Error::parse(format, "vertex color count mismatch"));
        }
        if self.normals.as_ref().is_some_and(|n| n.len() != count) {
            return Err(Error::parse(format, "vertex normal count mismatch"));
        }
        Ok(())
    }

    /// Corner positions of a triangle.
    pub fn corners(&self, triangle: &[u32; 3]) -> [Point3<f64>; 3] {
        [
            self.vertices[triangle[0] as usize],
            self.vertices[triangle[1] as usize],
            self.vertices[triangle[2] as usize],
        ]
    }

    /// Unnormalized face normal; its length is twice the triangle area.
    pub fn face_cross(&self, triangle: &[u32; 3]) -> Vector3<f64> {
        let [v0, v1, v2] = self.corners(triangle);
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        edge1.cross(&edge2)
    }

    pub fn triangle_area(&self, triangle: &[u32; 3]) -> f64 {
        self.face_cross(triangle).norm() * 0.5
    }

    /// Unit face normal, or zero for a degenerate triangle.
    pub fn triangle_normal(&self, triangle: &[u32; 3]) -> Vector3<f64> {
        self.face_cross(triangle)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Sums the unit normals of adjacent faces and normalizes per vertex.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        for triangle in &self.triangles {
            let normal = self.triangle_normal(triangle);
            for &index in triangle {
                normals[index as usize] += normal;
            }
        }
        for normal in &mut normals {
            *normal = normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
        }
        self.normals = Some(normals);
    }

    pub fn paint_uniform_color(&mut self, color: [f64; 3]) {
        self.colors = Some(vec![color; self.vertices.len()]);
    }

    /// Appends another mesh, offsetting its indices.
    ///
    /// Attributes survive only when both sides carry them, except that an
    /// empty receiver adopts the other's attributes.
    pub fn append(&mut self, other: Mesh) {
        let offset = self.vertices.len() as u32;
        let was_empty = self.vertices.is_empty();

        self.colors = match (self.colors.take(), other.colors) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs),
            _ => None,
        };
        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs),
            _ => None,
        };

        self.vertices.extend(other.vertices);
        self.triangles.extend(
            other
                .triangles
                .into_iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Axis-aligned bounds, `None` when there are no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }

    /// Create a triangulated cube centred on the origin: 8 vertices, 12 triangles.
    pub fn cube(size: f64) -> Self {
        let half = size / 2.0;
        let vertices = vec![
            Point3::new(-half, -half, -half),
            Point3::new(half, -half, -half),
            Point3::new(half, half, -half),
            Point3::new(-half, half, -half),
            Point3::new(-half, -half, half),
            Point3::new(half, -half, half),
            Point3::new(half, half, half),
            Point3::new(-half, half, half),
        ];
        let triangles = vec![
            // Front face
            [4, 5, 6],
            [4, 6, 7],
            // Back face
            [0, 3, 2],
            [0, 2, 1],
            // Top face
            [3, 7, 6],
            [3, 6, 2],
            // Bottom face
            [0, 1, 5],
            [0, 5, 4],
            // Right face
            [1, 2, 6],
            [1, 6, 5],
            // Left face
            [0, 4, 7],
            [0, 7, 3],
        ];
        Self::from_parts(vertices, triangles)
    }
}
