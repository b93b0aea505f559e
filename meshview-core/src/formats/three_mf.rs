/// 3D Manufacturing Format: a zip archive holding an XML model part
use std::io::{Cursor, Read};

use nalgebra::Point3;
use nom::{
    bytes::complete::{is_not, tag, take_until, take_while1},
    character::complete::{char, multispace0},
    combinator::opt,
    multi::many0,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};

use super::{FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

const MODEL_PART: &str = "3D/3dmodel.model";

/// One XML start or empty-element tag with its attributes.
#[derive(Debug, PartialEq)]
struct Tag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, &'a str)>,
    closing: bool,
}

impl<'a> Tag<'a> {
    fn attribute(&self, key: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }

    /// Tag name without a namespace prefix.
    fn local_name(&self) -> &'a str {
        self.name.rsplit(':').next().unwrap_or(self.name)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        multispace0,
        separated_pair(
            take_while1(is_name_char),
            delimited(multispace0, char('='), multispace0),
            delimited(char('"'), opt(is_not("\"")), char('"')),
        ),
    )(input)
    .map(|(rest, (name, value))| (rest, (name, value.unwrap_or_default())))
}

fn xml_tag(input: &str) -> IResult<&str, Tag<'_>> {
    let (input, _) = char('<')(input)?;
    let (input, closing) = opt(char('/'))(input)?;
    let (input, name) = take_while1(is_name_char)(input)?;
    let (input, attributes) = many0(attribute)(input)?;
    let (input, _) = terminated(multispace0, opt(char('/')))(input)?;
    let (input, _) = char('>')(input)?;
    Ok((
        input,
        Tag {
            name,
            attributes,
            closing: closing.is_some(),
        },
    ))
}

/// Skips text, comments and declarations up to the next element tag.
fn next_tag(mut input: &str) -> Option<(&str, Tag<'_>)> {
    loop {
        let (rest, _) = take_until::<_, _, nom::error::Error<&str>>("<")(input).ok()?;
        if let Ok((after, _)) = tag::<_, _, nom::error::Error<&str>>("<!--")(rest) {
            let (after, _) = take_until::<_, _, nom::error::Error<&str>>("-->")(after).ok()?;
            input = &after[3..];
            continue;
        }
        if rest.starts_with("<?") || rest.starts_with("<!") {
            input = &rest[1..];
            continue;
        }
        match xml_tag(rest) {
            Ok((after, tag)) => return Some((after, tag)),
            Err(_) => input = &rest[1..],
        }
    }
}

fn number(tag: &Tag<'_>, key: &str) -> Result<f64> {
    let raw = tag
        .attribute(key)
        .ok_or_else(|| Error::parse(Format::ThreeMf, format!("<{}> lacks {key}", tag.name)))?;
    raw.trim()
        .parse()
        .map_err(|_| Error::parse(Format::ThreeMf, format!("bad number {raw:?} for {key}")))
}

/// Parses the XML model part; each `<object>` mesh becomes one part of the result.
pub fn parse_model(xml: &str, mode: ParseMode) -> Result<Mesh> {
    let mut merged = Mesh::new();
    let mut part = Mesh::new();
    let mut faces = FaceBuilder::new(Format::ThreeMf, mode);
    let mut input = xml;

    while let Some((rest, tag)) = next_tag(input) {
        input = rest;
        match (tag.local_name(), tag.closing) {
            ("vertex", false) => {
                let point = Point3::new(number(&tag, "x")?, number(&tag, "y")?, number(&tag, "z")?);
                part.add_vertex(point);
            }
            ("triangle", false) => {
                let corners = [
                    number(&tag, "v1")? as i64,
                    number(&tag, "v2")? as i64,
                    number(&tag, "v3")? as i64,
                ];
                faces.polygon(&mut part, &corners)?;
            }
            ("object", true) => merged.append(std::mem::take(&mut part)),
            _ => {}
        }
    }
    merged.append(part);
    faces.finish();
    Ok(merged)
}

pub fn parse_3mf(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::parse(Format::ThreeMf, e.to_string()))?;

    // The model part is conventionally 3D/3dmodel.model; fall back to any .model entry.
    let name = if archive.by_name(MODEL_PART).is_ok() {
        MODEL_PART.to_string()
    } else {
        archive
            .file_names()
            .find(|n| n.to_ascii_lowercase().ends_with(".model"))
            .map(str::to_string)
            .ok_or_else(|| Error::parse(Format::ThreeMf, "archive has no model part"))?
    };

    let mut xml = String::new();
    archive
        .by_name(&name)
        .map_err(|e| Error::parse(Format::ThreeMf, e.to_string()))?
        .read_to_string(&mut xml)?;
    parse_model(&xml, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <!-- two objects -->
  <resources>
    <object id="1" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="0" />
          <vertex x="1" y="0" z="0" />
          <vertex x="0" y="1" z="0"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="1" v3="2" />
        </triangles>
      </mesh>
    </object>
    <object id="2" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="2.5" />
          <vertex x="1" y="0" z="2.5" />
          <vertex x="0" y="1" z="2.5" />
        </vertices>
        <triangles>
          <triangle v1="2" v2="1" v3="0" />
          <triangle v1="0" v2="1" v3="7" />
        </triangles>
      </mesh>
    </object>
  </resources>
  <build><item objectid="1" /><item objectid="2" /></build>
</model>"#;

    #[test]
    fn tag_parser_reads_attributes() {
        let (rest, tag) = xml_tag(r#"<vertex x="1.5" y = "2" z="-3"/>tail"#).unwrap();
        assert_eq!(rest, "tail");
        assert_eq!(tag.name, "vertex");
        assert_eq!(tag.attribute("y"), Some("2"));
        assert!(!tag.closing);
    }

    #[test]
    fn objects_are_merged() {
        let mesh = parse_model(MODEL, ParseMode::Lenient).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [5, 4, 3]]);
        assert!(parse_model(MODEL, ParseMode::Strict).is_err());
    }

    #[test]
    fn reads_model_from_archive() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file(MODEL_PART, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer
                .write_all(MODEL.replace(r#"<triangle v1="0" v2="1" v3="7" />"#, "").as_bytes())
                .unwrap();
            writer.finish().unwrap();
        }
        let mesh = parse_3mf(buffer.get_ref(), ParseMode::Strict).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
