/// Stanford PLY loading through `ply-rs-bw` (ascii, binary little and big endian)
use nalgebra::Point3;
use ply_rs_bw::parser::Parser;
use ply_rs_bw::ply::{DefaultElement, Property};

use super::{normalize_color, FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

pub fn parse_ply(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut &data[..])
        .map_err(|e| Error::parse(Format::Ply, e.to_string()))?;

    let vertices_payload = ply
        .payload
        .get("vertex")
        .ok_or_else(|| Error::parse(Format::Ply, "missing vertex element"))?;

    let mut mesh = Mesh::new();
    let mut colors: Vec<[f64; 3]> = Vec::new();
    let mut has_colors = true;

    for v in vertices_payload {
        let (Some(x), Some(y), Some(z)) = (prop_f64(v, "x"), prop_f64(v, "y"), prop_f64(v, "z"))
        else {
            return Err(Error::parse(Format::Ply, "vertex element lacks x/y/z"));
        };
        mesh.add_vertex(Point3::new(x, y, z));

        match vertex_color(v) {
            Some(rgb) if has_colors => colors.push(rgb),
            _ => has_colors = false,
        }
    }

    let mut faces = FaceBuilder::new(Format::Ply, mode);
    if let Some(faces_payload) = ply.payload.get("face") {
        for face in faces_payload {
            let indices = prop_indices(face, "vertex_indices")
                .or_else(|| prop_indices(face, "vertex_index"))
                .ok_or_else(|| Error::parse(Format::Ply, "face element lacks vertex_indices"))?;
            faces.polygon(&mut mesh, &indices)?;
        }
    }
    faces.finish();

    if has_colors && !colors.is_empty() {
        mesh.colors = Some(colors);
    }
    Ok(mesh)
}

fn prop_f64(elem: &DefaultElement, name: &str) -> Option<f64> {
    elem.get(name).and_then(property_f64)
}

fn property_f64(prop: &Property) -> Option<f64> {
    match prop {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

/// RGB in [0, 1]; integer channels are 8-bit.
fn vertex_color(elem: &DefaultElement) -> Option<[f64; 3]> {
    let channel = |names: [&str; 2]| names.iter().find_map(|name| elem.get(*name));
    let props = [
        channel(["red", "r"])?,
        channel(["green", "g"])?,
        channel(["blue", "b"])?,
    ];
    let integer_channels = !matches!(props[0], Property::Float(_) | Property::Double(_));
    let rgb = [
        property_f64(props[0])?,
        property_f64(props[1])?,
        property_f64(props[2])?,
    ];
    Some(normalize_color(rgb, integer_channels))
}

fn prop_indices(elem: &DefaultElement, name: &str) -> Option<Vec<i64>> {
    elem.get(name).and_then(property_indices)
}

/// Negative entries are kept so the face builder can reject them.
fn property_indices(prop: &Property) -> Option<Vec<i64>> {
    match prop {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as i64).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as i64).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as i64).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as i64).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as i64).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as i64).collect()),
        _ => None,
    }
}
