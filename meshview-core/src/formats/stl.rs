/// STL file parser for binary and ASCII formats
use log::warn;
use nalgebra::Point3;
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::double,
    sequence::preceded,
    IResult,
};

use super::ParseMode;
use crate::dedup::VertexDedup;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

type Facet = [Point3<f64>; 3];

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::parse(Format::Stl, "file too small to be a valid STL"));
    }

    // Skip 80-byte header
    let data = &data[HEADER_LEN..];

    // Read triangle count (4 bytes, little-endian)
    let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body = &data[4..];
    let available = body.len() / FACET_LEN;

    let triangle_count = if available < declared {
        match mode {
            ParseMode::Strict => {
                return Err(Error::parse(
                    Format::Stl,
                    format!("unexpected end of file: {declared} facets declared, {available} present"),
                ))
            }
            ParseMode::Lenient => {
                warn!("STL: truncated body, keeping {available} of {declared} facets");
                available
            }
        }
    } else {
        declared
    };

    let facets = body
        .chunks_exact(FACET_LEN)
        .take(triangle_count)
        .map(|chunk| {
            // Facet normal occupies the first 12 bytes; normals are recomputed later.
            let read = |offset: usize| {
                f32::from_le_bytes([
                    chunk[offset],
                    chunk[offset + 1],
                    chunk[offset + 2],
                    chunk[offset + 3],
                ]) as f64
            };
            let corner = |base: usize| Point3::new(read(base), read(base + 4), read(base + 8));
            [corner(12), corner(24), corner(36)]
        });

    Ok(build_mesh(facets, triangle_count))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match parse_ascii_stl_impl(input) {
        Ok((_, facets)) => {
            let count = facets.len();
            Ok(build_mesh(facets.into_iter(), count))
        }
        Err(e) => Err(Error::parse(
            Format::Stl,
            format!("failed to parse ASCII STL: {e:?}"),
        )),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = not_line_ending(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f64>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f64, f64, f64)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = double(input)?;
    Ok((input, (x, y, z)))
}

/// STL is a triangle soup; corners with identical coordinates are welded.
fn build_mesh(facets: impl Iterator<Item = Facet>, capacity: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity(capacity / 2, capacity);
    let mut dedup = VertexDedup::new();
    for facet in facets {
        let indices = facet.map(|corner| dedup.insert(&mut mesh, corner));
        mesh.add_triangle(indices);
    }
    mesh
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    // Binary files may also start with "solid", so ASCII is only a first guess
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data, mode)
}
