/// CAD boundary-representation to mesh conversion
///
/// STEP and IGES files are read by an external geometry kernel plugged in
/// through [`CadKernel`]. The converter repairs and triangulates the shape
/// through the kernel, then flattens the per-face triangulations into one
/// indexed [`Mesh`].
use std::path::Path;

use log::{debug, info};
use nalgebra::Point3;

use crate::constants::{
    ANGULAR_DEFLECTION, LINEAR_DEFLECTION, PARALLEL_TESSELLATION, RELATIVE_DEFLECTION,
};
use crate::dedup::VertexDedup;
use crate::error::{Error, Result};
use crate::format::{CadFormat, Format};
use crate::geometry::Mesh;

/// Incremental mesher settings forwarded to the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tessellation {
    pub linear_deflection: f64,
    /// Whether `linear_deflection` is relative to edge size.
    pub relative: bool,
    /// Radians.
    pub angular_deflection: f64,
    pub parallel: bool,
}

impl Default for Tessellation {
    fn default() -> Self {
        Self {
            linear_deflection: LINEAR_DEFLECTION,
            relative: RELATIVE_DEFLECTION,
            angular_deflection: ANGULAR_DEFLECTION,
            parallel: PARALLEL_TESSELLATION,
        }
    }
}

/// Triangulation of a single B-Rep face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceMesh {
    pub nodes: Vec<[f64; 3]>,
    /// Node indices, 1-based as in the kernel. `None` when the face has no
    /// triangulation.
    pub triangles: Option<Vec<[i32; 3]>>,
}

/// Shape handle owned by a kernel.
pub trait BrepShape {
    /// Repairs face orientation and topology, returning the fixed shape.
    fn fix(self: Box<Self>) -> Result<Box<dyn BrepShape>>;

    fn triangulate(&mut self, tessellation: &Tessellation) -> Result<()>;

    /// One entry per face, in kernel traversal order.
    fn faces(&self) -> Vec<FaceMesh>;
}

/// A geometry kernel able to read STEP and IGES files.
pub trait CadKernel {
    fn name(&self) -> &str;

    fn supports(&self, _format: CadFormat) -> bool {
        true
    }

    /// Reads the file and transfers all roots into one shape.
    fn read(&self, path: &Path, format: CadFormat) -> Result<Box<dyn BrepShape>>;
}

/// Turns kernel shapes into cleaned meshes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CadConverter {
    pub tessellation: Tessellation,
}

impl CadConverter {
    pub fn new(tessellation: Tessellation) -> Self {
        Self { tessellation }
    }

    pub fn load(&self, kernel: &dyn CadKernel, path: &Path, format: CadFormat) -> Result<Mesh> {
        info!("reading {} with {}", path.display(), kernel.name());
        let shape = kernel.read(path, format)?;
        self.convert(format.into(), shape)
    }

    /// Repairs, triangulates and flattens a shape, then cleans the result.
    pub fn convert(&self, format: Format, shape: Box<dyn BrepShape>) -> Result<Mesh> {
        let mut shape = shape.fix()?;
        shape.triangulate(&self.tessellation)?;

        let mut mesh = flatten_faces(format, &shape.faces())?;
        let merged = mesh.remove_duplicated_vertices();
        let degenerate = mesh.remove_degenerate_triangles();
        let duplicated = mesh.remove_duplicated_triangles();
        let non_manifold = mesh.remove_non_manifold_edges();
        debug!(
            "cleanup removed {merged} vertices, {degenerate} degenerate, \
             {duplicated} duplicated and {non_manifold} non-manifold triangles"
        );
        if mesh.is_empty() {
            return Err(Error::EmptyModel);
        }
        mesh.compute_vertex_normals();
        Ok(mesh)
    }
}

/// Flattens face triangulations into one mesh, sharing bit-identical points.
///
/// Faces without a triangulation are skipped. Fails with
/// [`Error::EmptyModel`] when nothing is left.
pub fn flatten_faces(format: Format, faces: &[FaceMesh]) -> Result<Mesh> {
    let mut mesh = Mesh::new();
    let mut dedup = VertexDedup::new();

    for face in faces {
        let Some(triangles) = &face.triangles else {
            continue;
        };
        for triangle in triangles {
            let mut corners = [0u32; 3];
            for (corner, &node) in corners.iter_mut().zip(triangle) {
                // Kernel node indices start at 1.
                let point = usize::try_from(node)
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|n| face.nodes.get(n))
                    .ok_or_else(|| {
                        Error::parse(
                            format,
                            format!("node {node} out of range for {} nodes", face.nodes.len()),
                        )
                    })?;
                *corner = dedup.insert(&mut mesh, Point3::from(*point));
            }
            mesh.add_triangle(corners);
        }
    }

    if mesh.is_empty() {
        return Err(Error::EmptyModel);
    }
    Ok(mesh)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records the calls a converter makes and hands back fixed faces.
    pub(crate) struct MockShape {
        pub faces: Vec<FaceMesh>,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl BrepShape for MockShape {
        fn fix(self: Box<Self>) -> Result<Box<dyn BrepShape>> {
            self.calls.lock().unwrap().push("fix".into());
            Ok(self)
        }

        fn triangulate(&mut self, tessellation: &Tessellation) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("triangulate {}", tessellation.linear_deflection));
            Ok(())
        }

        fn faces(&self) -> Vec<FaceMesh> {
            self.faces.clone()
        }
    }

    pub(crate) struct MockKernel {
        pub faces: Vec<FaceMesh>,
        pub calls: Arc<Mutex<Vec<String>>>,
        pub only: Option<CadFormat>,
    }

    impl MockKernel {
        pub(crate) fn new(faces: Vec<FaceMesh>) -> Self {
            Self {
                faces,
                calls: Arc::default(),
                only: None,
            }
        }

        pub(crate) fn only(mut self, format: CadFormat) -> Self {
            self.only = Some(format);
            self
        }
    }

    impl CadKernel for MockKernel {
        fn name(&self) -> &str {
            "mock"
        }

        fn supports(&self, format: CadFormat) -> bool {
            self.only.map_or(true, |only| only == format)
        }

        fn read(&self, _path: &Path, _format: CadFormat) -> Result<Box<dyn BrepShape>> {
            Ok(Box::new(MockShape {
                faces: self.faces.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    /// Two faces of a unit square meeting along the diagonal.
    pub(crate) fn square_faces() -> Vec<FaceMesh> {
        vec![
            FaceMesh {
                nodes: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                triangles: Some(vec![[1, 2, 3]]),
            },
            FaceMesh {
                nodes: vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
                triangles: Some(vec![[1, 2, 3]]),
            },
        ]
    }

    #[test]
    fn shared_corners_are_deduplicated() {
        let mesh = flatten_faces(Format::Step, &square_faces()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn faces_without_triangulation_are_skipped() {
        let mut faces = square_faces();
        faces.push(FaceMesh {
            nodes: vec![[5.0, 5.0, 5.0]],
            triangles: None,
        });
        let mesh = flatten_faces(Format::Iges, &faces).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn zero_faces_is_an_empty_model() {
        assert!(matches!(flatten_faces(Format::Step, &[]), Err(Error::EmptyModel)));
        let untriangulated = [FaceMesh {
            nodes: vec![[0.0; 3]; 3],
            triangles: None,
        }];
        assert!(matches!(
            flatten_faces(Format::Step, &untriangulated),
            Err(Error::EmptyModel)
        ));
    }

    #[test]
    fn zero_based_index_is_rejected() {
        let faces = [FaceMesh {
            nodes: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: Some(vec![[0, 1, 2]]),
        }];
        assert!(matches!(
            flatten_faces(Format::Step, &faces),
            Err(Error::Parse { format: Format::Step, .. })
        ));
    }

    #[test]
    fn converter_fixes_before_triangulating_and_cleans_up() {
        let mut faces = square_faces();
        // Same triangle again in a third face: removed as a duplicate.
        faces.push(faces[0].clone());
        let kernel = MockKernel::new(faces);

        let mesh = CadConverter::default()
            .load(&kernel, Path::new("part.step"), CadFormat::Step)
            .unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.has_vertex_normals());
        assert_eq!(
            *kernel.calls.lock().unwrap(),
            vec!["fix".to_string(), "triangulate 0.5".to_string()]
        );
    }

    #[test]
    fn faces_that_collapse_in_cleanup_are_an_empty_model() {
        let kernel = MockKernel::new(vec![FaceMesh {
            nodes: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            triangles: Some(vec![[1, 2, 3]]),
        }]);
        let result = CadConverter::default().load(&kernel, Path::new("flat.step"), CadFormat::Step);
        assert!(matches!(result, Err(Error::EmptyModel)));
    }

    #[test]
    fn default_tessellation_matches_constants() {
        let t = Tessellation::default();
        assert_eq!(t.linear_deflection, 0.5);
        assert_eq!(t.angular_deflection, 0.5);
        assert!(t.relative && t.parallel);
    }
}
