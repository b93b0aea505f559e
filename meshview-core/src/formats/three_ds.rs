/// Autodesk 3DS chunk parser; each named object becomes one mesh part
use log::{debug, warn};
use nalgebra::Point3;
use nom::{
    bytes::complete::{take, take_until},
    multi::count,
    number::complete::{le_f32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};

use super::{FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

const MAIN: u16 = 0x4D4D;
const EDITOR: u16 = 0x3D3D;
const OBJECT: u16 = 0x4000;
const TRIANGLE_MESH: u16 = 0x4100;
const VERTEX_LIST: u16 = 0x4110;
const FACE_LIST: u16 = 0x4120;

const CHUNK_HEADER: usize = 6;

/// Nesting limit for container chunks; real files use three levels.
const MAX_DEPTH: usize = 16;

struct Chunk<'a> {
    id: u16,
    body: &'a [u8],
}

fn chunk_header(input: &[u8]) -> IResult<&[u8], (u16, u32)> {
    tuple((le_u16, le_u32))(input)
}

fn vertex_list(input: &[u8]) -> IResult<&[u8], Vec<Point3<f64>>> {
    let (input, n) = le_u16(input)?;
    count(
        |i| {
            let (i, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(i)?;
            Ok((i, Point3::new(x as f64, y as f64, z as f64)))
        },
        n as usize,
    )(input)
}

/// Face list entries are three corner indices followed by an edge-flag word.
fn face_list(input: &[u8]) -> IResult<&[u8], Vec<[u16; 3]>> {
    let (input, n) = le_u16(input)?;
    count(
        |i| {
            let (i, (a, b, c, _flags)) = tuple((le_u16, le_u16, le_u16, le_u16))(i)?;
            Ok((i, [a, b, c]))
        },
        n as usize,
    )(input)
}

/// Object name: a NUL-terminated string preceding the object's sub-chunks.
fn object_name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, name) = take_until(&b"\0"[..])(input)?;
    let (input, _) = take(1usize)(input)?;
    Ok((input, name))
}

struct Walker {
    mode: ParseMode,
    faces: FaceBuilder,
    merged: Mesh,
}

impl Walker {
    /// Splits a byte range into sibling chunks.
    fn chunks<'a>(&self, mut data: &'a [u8]) -> Result<Vec<Chunk<'a>>> {
        let mut chunks = Vec::new();
        while data.len() >= CHUNK_HEADER {
            let (_, (id, length)) = chunk_header(data)
                .map_err(|_| Error::parse(Format::ThreeDs, "bad chunk header"))?;
            let mut length = length as usize;
            if length < CHUNK_HEADER || length > data.len() {
                match self.mode {
                    ParseMode::Strict => {
                        return Err(Error::parse(
                            Format::ThreeDs,
                            format!("chunk {id:#06x} length {length} exceeds {} bytes", data.len()),
                        ))
                    }
                    ParseMode::Lenient if length < CHUNK_HEADER => {
                        warn!("3DS: corrupt chunk {id:#06x}, ignoring the rest");
                        break;
                    }
                    ParseMode::Lenient => {
                        warn!("3DS: truncated chunk {id:#06x}");
                        length = data.len();
                    }
                }
            }
            chunks.push(Chunk {
                id,
                body: &data[CHUNK_HEADER..length],
            });
            data = &data[length..];
        }
        Ok(chunks)
    }

    fn walk(&mut self, data: &[u8], depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return match self.mode {
                ParseMode::Strict => Err(Error::parse(
                    Format::ThreeDs,
                    format!("chunks nested deeper than {MAX_DEPTH} levels"),
                )),
                ParseMode::Lenient => {
                    warn!("3DS: chunks nested deeper than {MAX_DEPTH} levels, skipping");
                    Ok(())
                }
            };
        }
        for chunk in self.chunks(data)? {
            match chunk.id {
                MAIN | EDITOR => self.walk(chunk.body, depth + 1)?,
                OBJECT => {
                    let (rest, name) = object_name(chunk.body)
                        .map_err(|_| Error::parse(Format::ThreeDs, "unterminated object name"))?;
                    debug!("3DS object {:?}", String::from_utf8_lossy(name));
                    self.walk(rest, depth + 1)?;
                }
                TRIANGLE_MESH => {
                    let part = self.triangle_mesh(chunk.body)?;
                    self.merged.append(part);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn short_list(&self, what: &str) -> Result<()> {
        match self.mode {
            ParseMode::Strict => Err(Error::parse(Format::ThreeDs, format!("short {what} list"))),
            ParseMode::Lenient => {
                warn!("3DS: skipping short {what} list");
                Ok(())
            }
        }
    }

    fn triangle_mesh(&mut self, data: &[u8]) -> Result<Mesh> {
        let mut part = Mesh::new();
        let mut face_lists = Vec::new();
        for chunk in self.chunks(data)? {
            match chunk.id {
                VERTEX_LIST => match vertex_list(chunk.body) {
                    Ok((_, points)) => part.vertices.extend(points),
                    Err(_) => self.short_list("vertex")?,
                },
                // Material and smoothing sub-chunks follow the face records and are skipped.
                FACE_LIST => match face_list(chunk.body) {
                    Ok((_, faces)) => face_lists.push(faces),
                    Err(_) => self.short_list("face")?,
                },
                _ => {}
            }
        }
        for face in face_lists.into_iter().flatten() {
            let corners = face.map(i64::from);
            self.faces.polygon(&mut part, &corners)?;
        }
        Ok(part)
    }
}

pub fn parse_3ds(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    let (_, (id, _)) =
        chunk_header(data).map_err(|_| Error::parse(Format::ThreeDs, "file too small"))?;
    if id != MAIN {
        return Err(Error::parse(
            Format::ThreeDs,
            format!("expected main chunk 0x4d4d, found {id:#06x}"),
        ));
    }

    let mut walker = Walker {
        mode,
        faces: FaceBuilder::new(Format::ThreeDs, mode),
        merged: Mesh::new(),
    };
    walker.walk(data, 0)?;
    walker.faces.finish();
    Ok(walker.merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: u16, body: &[u8]) -> Vec<u8> {
        let mut out = id.to_le_bytes().to_vec();
        out.extend_from_slice(&((body.len() + CHUNK_HEADER) as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn triangle_object(name: &str, z: f32) -> Vec<u8> {
        let mut vertices = 3u16.to_le_bytes().to_vec();
        for [x, y] in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            for v in [x, y, z] {
                vertices.extend_from_slice(&v.to_le_bytes());
            }
        }
        let mut faces = 1u16.to_le_bytes().to_vec();
        for v in [0u16, 1, 2, 7] {
            faces.extend_from_slice(&v.to_le_bytes());
        }
        let mut mesh = chunk(VERTEX_LIST, &vertices);
        mesh.extend(chunk(FACE_LIST, &faces));

        let mut object = name.as_bytes().to_vec();
        object.push(0);
        object.extend(chunk(TRIANGLE_MESH, &mesh));
        chunk(OBJECT, &object)
    }

    fn scene() -> Vec<u8> {
        let mut editor = triangle_object("a", 0.0);
        editor.extend(triangle_object("b", 1.0));
        chunk(MAIN, &chunk(EDITOR, &editor))
    }

    #[test]
    fn two_objects_are_merged() {
        let mesh = parse_3ds(&scene(), ParseMode::Strict).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.vertices[4], Point3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn truncated_file_keeps_complete_objects_when_lenient() {
        let mut data = scene();
        // Cut into the second object's face list.
        data.truncate(data.len() - 10);
        assert!(parse_3ds(&data, ParseMode::Strict).is_err());

        let mesh = parse_3ds(&data, ParseMode::Lenient).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn deeply_nested_chunks_stop_at_the_depth_limit() {
        let mut data = triangle_object("deep", 0.0);
        for _ in 0..200 {
            data = chunk(EDITOR, &data);
        }
        let data = chunk(MAIN, &data);

        assert!(matches!(
            parse_3ds(&data, ParseMode::Strict),
            Err(Error::Parse { format: Format::ThreeDs, .. })
        ));
        let mesh = parse_3ds(&data, ParseMode::Lenient).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(parse_3ds(b"solid not a 3ds file", ParseMode::Lenient).is_err());
    }
}
