/// glTF / GLB loading through the `gltf` crate
use std::path::Path;

use log::debug;
use nalgebra::{Matrix4, Point3};

use super::{FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

/// Loads the triangle primitives of the default scene with node transforms applied.
///
/// Strict mode goes through `gltf::import`, which also resolves every image
/// and fails when one is missing. Lenient mode reads the document and its
/// buffers only.
pub fn load(path: &Path, mode: ParseMode) -> Result<Mesh> {
    let (document, buffers) = match mode {
        ParseMode::Strict => {
            let (document, buffers, _images) = gltf::import(path).map_err(to_parse_error)?;
            (document, buffers)
        }
        ParseMode::Lenient => {
            let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(to_parse_error)?;
            let buffers = gltf::import_buffers(&document, path.parent(), blob)
                .map_err(to_parse_error)?;
            (document, buffers)
        }
    };

    let mut mesh = Mesh::new();
    let mut faces = FaceBuilder::new(Format::Gltf, mode);
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Matrix4::identity(), &buffers, &mut mesh, &mut faces)?;
            }
        }
        None => {
            // No scene graph: take every mesh untransformed.
            for gltf_mesh in document.meshes() {
                append_primitives(&gltf_mesh, &Matrix4::identity(), &buffers, &mut mesh, &mut faces)?;
            }
        }
    }
    faces.finish();
    Ok(mesh)
}

fn to_parse_error(e: gltf::Error) -> Error {
    Error::parse(Format::Gltf, e.to_string())
}

fn visit_node(
    node: &gltf::Node<'_>,
    parent: Matrix4<f64>,
    buffers: &[gltf::buffer::Data],
    mesh: &mut Mesh,
    faces: &mut FaceBuilder,
) -> Result<()> {
    let local = node.transform().matrix();
    let local = Matrix4::from_fn(|row, col| local[col][row] as f64);
    let world = parent * local;

    if let Some(gltf_mesh) = node.mesh() {
        append_primitives(&gltf_mesh, &world, buffers, mesh, faces)?;
    }
    for child in node.children() {
        visit_node(&child, world, buffers, mesh, faces)?;
    }
    Ok(())
}

fn append_primitives(
    gltf_mesh: &gltf::Mesh<'_>,
    world: &Matrix4<f64>,
    buffers: &[gltf::buffer::Data],
    mesh: &mut Mesh,
    faces: &mut FaceBuilder,
) -> Result<()> {
    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            debug!("glTF: skipping non-triangle primitive {:?}", primitive.mode());
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let mut part = Mesh::new();
        for p in positions {
            let local = Point3::new(p[0] as f64, p[1] as f64, p[2] as f64);
            part.add_vertex(world.transform_point(&local));
        }
        if let Some(colors) = reader.read_colors(0) {
            let colors: Vec<[f64; 3]> = colors
                .into_rgb_f32()
                .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
                .collect();
            if colors.len() == part.vertex_count() {
                part.colors = Some(colors);
            }
        }

        let indices: Vec<i64> = match reader.read_indices() {
            Some(indices) => indices.into_u32().map(i64::from).collect(),
            None => (0..part.vertex_count() as i64).collect(),
        };
        for corners in indices.chunks(3) {
            faces.polygon(&mut part, corners)?;
        }
        mesh.append(part);
    }
    Ok(())
}
