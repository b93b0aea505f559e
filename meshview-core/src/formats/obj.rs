/// Wavefront OBJ loading through `tobj`
use std::path::Path;

use log::debug;
use nalgebra::Point3;

use super::{FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

/// Loads every object in the file and merges them into one mesh.
pub fn load(path: &Path, mode: ParseMode) -> Result<Mesh> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) =
        tobj::load_obj(path, &options).map_err(|e| Error::parse(Format::Obj, e.to_string()))?;
    if let Err(e) = materials {
        // Materials are optional: the mesh is drawn with the viewer's own shading.
        debug!("{}: material library not loaded: {e}", path.display());
    }

    let mut merged = Mesh::new();
    for model in models {
        merged.append(model_to_mesh(&model.mesh, mode)?);
    }
    Ok(merged)
}

fn model_to_mesh(model: &tobj::Mesh, mode: ParseMode) -> Result<Mesh> {
    let vertex_count = model.positions.len() / 3;
    let mut mesh = Mesh::with_capacity(vertex_count, model.indices.len() / 3);
    for p in model.positions.chunks_exact(3) {
        mesh.add_vertex(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
    }
    if model.vertex_color.len() == vertex_count * 3 && vertex_count > 0 {
        mesh.colors = Some(
            model
                .vertex_color
                .chunks_exact(3)
                .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
                .collect(),
        );
    }

    let mut faces = FaceBuilder::new(Format::Obj, mode);
    for c in model.indices.chunks(3) {
        let corners: Vec<i64> = c.iter().map(|&i| i as i64).collect();
        faces.polygon(&mut mesh, &corners)?;
    }
    faces.finish();
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn objects_are_merged_with_offsets() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        write!(
            file,
            "o first\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n\
             o second\nv 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\nf 4 5 6 7\n"
        )
        .unwrap();

        let mesh = load(file.path(), ParseMode::Strict).unwrap();
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex_count(), 7);
        mesh.validate(Format::Obj).unwrap();
        assert_eq!(mesh.vertices[3], Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn vertex_colors_are_kept() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        write!(
            file,
            "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 1 2 3\n"
        )
        .unwrap();
        let mesh = load(file.path(), ParseMode::Lenient).unwrap();
        assert_eq!(mesh.colors.unwrap()[1], [0.0, 1.0, 0.0]);
    }
}
