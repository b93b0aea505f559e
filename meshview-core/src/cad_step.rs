/// STEP kernel backed by `truck-stepio` and `truck-meshalgo`
///
/// Built with the `step` feature. IGES stays unsupported, so the dispatcher
/// keeps reporting a missing dependency for `.iges`/`.igs` input.
use std::path::Path;

use log::debug;
use truck_meshalgo::prelude::*;
use truck_stepio::r#in::Table;

use crate::cad::{BrepShape, CadKernel, FaceMesh, Tessellation};
use crate::error::{Error, Result};
use crate::format::{CadFormat, Format};

/// Tolerance floor handed to the mesher.
const MIN_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Default, Clone, Copy)]
pub struct StepKernel;

impl StepKernel {
    pub fn new() -> Self {
        Self
    }
}

impl CadKernel for StepKernel {
    fn name(&self) -> &str {
        "truck"
    }

    fn supports(&self, format: CadFormat) -> bool {
        format == CadFormat::Step
    }

    fn read(&self, path: &Path, format: CadFormat) -> Result<Box<dyn BrepShape>> {
        if format != CadFormat::Step {
            return Err(Error::parse(Format::Iges, "the truck kernel only reads STEP"));
        }
        let text = std::fs::read_to_string(path).map_err(|e| Error::load(path, e))?;
        let table = Table::from_step(&text)
            .ok_or_else(|| Error::parse(Format::Step, "not a STEP exchange structure"))?;
        debug!("{}: {} shells", path.display(), table.shell.len());
        Ok(Box::new(StepShape { table, faces: None }))
    }
}

struct StepShape {
    table: Table,
    faces: Option<Vec<FaceMesh>>,
}

impl BrepShape for StepShape {
    fn fix(self: Box<Self>) -> Result<Box<dyn BrepShape>> {
        // truck has no shape healing; shells are meshed as read.
        debug!("shape repair skipped");
        Ok(self)
    }

    fn triangulate(&mut self, tessellation: &Tessellation) -> Result<()> {
        let mut faces = Vec::new();
        for holder in self.table.shell.values() {
            let shell = self
                .table
                .to_compressed_shell(holder)
                .map_err(|e| Error::parse(Format::Step, format!("{e:?}")))?;
            let tolerance = tolerance(tessellation, &shell.vertices);
            debug!("meshing shell with tolerance {tolerance}");

            let meshed = shell.robust_triangulation(tolerance);
            for face in &meshed.faces {
                faces.push(match &face.surface {
                    Some(polygon) => face_mesh(polygon, face.orientation),
                    None => FaceMesh::default(),
                });
            }
        }
        self.faces = Some(faces);
        Ok(())
    }

    fn faces(&self) -> Vec<FaceMesh> {
        self.faces.clone().unwrap_or_default()
    }
}

/// Absolute tolerance; a relative deflection scales with the shell's extent.
fn tolerance(tessellation: &Tessellation, vertices: &[Point3]) -> f64 {
    let deflection = if tessellation.relative {
        tessellation.linear_deflection * extent(vertices) / 10.0
    } else {
        tessellation.linear_deflection
    };
    deflection.max(MIN_TOLERANCE)
}

/// Bounding box diagonal.
fn extent(vertices: &[Point3]) -> f64 {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for v in vertices {
        for (axis, value) in [v.x, v.y, v.z].into_iter().enumerate() {
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }
    if vertices.is_empty() {
        return 0.0;
    }
    (0..3).map(|i| (max[i] - min[i]).powi(2)).sum::<f64>().sqrt()
}

/// Converts to 1-based node indices; reversed faces get flipped winding.
fn face_mesh(polygon: &PolygonMesh, orientation: bool) -> FaceMesh {
    let nodes = polygon.positions().iter().map(|p| [p.x, p.y, p.z]).collect();
    let triangles = polygon
        .faces()
        .triangle_iter()
        .map(|[a, b, c]| {
            let (a, b, c) = (a.pos as i32 + 1, b.pos as i32 + 1, c.pos as i32 + 1);
            if orientation {
                [a, b, c]
            } else {
                [a, c, b]
            }
        })
        .collect();
    FaceMesh {
        nodes,
        triangles: Some(triangles),
    }
}
