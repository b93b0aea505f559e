//! Per-format mesh parsers.
//!
//! Every parser runs in one of two modes. The direct reader uses
//! [`ParseMode::Strict`] and rejects any malformed input; the generic loader
//! uses [`ParseMode::Lenient`], keeps whatever geometry is well formed and
//! logs what it dropped.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

pub mod gltf;
pub mod obj;
pub mod off;
pub mod ply;
pub mod stl;
pub mod three_ds;
pub mod three_mf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Lenient,
}

/// Strict per-format reader. 3DS and the CAD formats are not handled here.
pub fn read_direct(format: Format, path: &Path) -> Result<Mesh> {
    let mode = ParseMode::Strict;
    let mesh = match format {
        Format::Obj => obj::load(path, mode)?,
        Format::Gltf | Format::Glb => gltf::load(path, mode)?,
        Format::Stl => stl::parse_stl(&std::fs::read(path)?, mode)?,
        Format::Ply => ply::parse_ply(&std::fs::read(path)?, mode)?,
        Format::Off => off::parse_off(&std::fs::read(path)?, mode)?,
        Format::ThreeMf => three_mf::parse_3mf(&std::fs::read(path)?, mode)?,
        Format::ThreeDs | Format::Step | Format::Iges => {
            return Err(Error::parse(format, "no direct reader for this format"))
        }
    };
    mesh.validate(format)?;
    debug!(
        "direct {format} reader: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Lenient multi-part loader; every part is merged into one mesh.
pub fn load_generic(format: Format, path: &Path) -> Result<Mesh> {
    let mode = ParseMode::Lenient;
    let mesh = match format {
        Format::Obj => obj::load(path, mode)?,
        Format::Gltf | Format::Glb => gltf::load(path, mode)?,
        Format::Stl => stl::parse_stl(&std::fs::read(path)?, mode)?,
        Format::Ply => ply::parse_ply(&std::fs::read(path)?, mode)?,
        Format::Off => off::parse_off(&std::fs::read(path)?, mode)?,
        Format::ThreeMf => three_mf::parse_3mf(&std::fs::read(path)?, mode)?,
        Format::ThreeDs => three_ds::parse_3ds(&std::fs::read(path)?, mode)?,
        Format::Step | Format::Iges => {
            return Err(Error::parse(format, "boundary representations need a CAD kernel"))
        }
    };
    debug!(
        "generic {format} loader: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Collects polygons into a mesh, fan-triangulating and range-checking indices.
pub(crate) struct FaceBuilder {
    format: Format,
    mode: ParseMode,
    dropped: usize,
}

impl FaceBuilder {
    pub(crate) fn new(format: Format, mode: ParseMode) -> Self {
        Self {
            format,
            mode,
            dropped: 0,
        }
    }

    /// Adds a polygon given as indices into `mesh.vertices`.
    pub(crate) fn polygon(&mut self, mesh: &mut Mesh, indices: &[i64]) -> Result<()> {
        if indices.len() < 3 {
            return self.reject(format!("face with {} corners", indices.len()));
        }
        let count = mesh.vertices.len() as i64;
        if let Some(bad) = indices.iter().find(|&&i| i < 0 || i >= count) {
            return self.reject(format!("index {bad} out of range for {count} vertices"));
        }
        for i in 1..indices.len() - 1 {
            mesh.add_triangle([
                indices[0] as u32,
                indices[i] as u32,
                indices[i + 1] as u32,
            ]);
        }
        Ok(())
    }

    fn reject(&mut self, message: String) -> Result<()> {
        match self.mode {
            ParseMode::Strict => Err(Error::parse(self.format, message)),
            ParseMode::Lenient => {
                self.dropped += 1;
                Ok(())
            }
        }
    }

    /// Logs how many faces lenient parsing discarded.
    pub(crate) fn finish(self) {
        if self.dropped > 0 {
            warn!(
                "{}: dropped {} malformed faces",
                self.format, self.dropped
            );
        }
    }
}

/// Scale 8-bit color channels to [0, 1]; float channels pass through.
pub(crate) fn normalize_color(rgb: [f64; 3], integer_channels: bool) -> [f64; 3] {
    if integer_channels {
        rgb.map(|c| c / 255.0)
    } else {
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn triangle_soup() -> Mesh {
        Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let mut mesh = triangle_soup();
        let mut faces = FaceBuilder::new(Format::Off, ParseMode::Strict);
        faces.polygon(&mut mesh, &[0, 1, 2, 3]).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn strict_rejects_and_lenient_skips_bad_faces() {
        let mut mesh = triangle_soup();
        let mut strict = FaceBuilder::new(Format::Off, ParseMode::Strict);
        assert!(strict.polygon(&mut mesh, &[0, 1, 9]).is_err());

        let mut lenient = FaceBuilder::new(Format::Off, ParseMode::Lenient);
        lenient.polygon(&mut mesh, &[0, 1, 9]).unwrap();
        lenient.polygon(&mut mesh, &[0, -1, 2]).unwrap();
        lenient.polygon(&mut mesh, &[0, 1]).unwrap();
        assert!(mesh.triangles.is_empty());
        assert_eq!(lenient.dropped, 3);
    }
}
