/// Object File Format (OFF / COFF / NOFF) parser
use nalgebra::Point3;
use nom::{
    character::complete::{alpha1, space0, space1},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult,
};

use super::{normalize_color, FaceBuilder, ParseMode};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Mesh;

fn numbers(line: &str) -> IResult<&str, Vec<f64>> {
    delimited(space0, separated_list1(space1, double), space0)(line)
}

fn keyword(line: &str) -> IResult<&str, &str> {
    preceded(space0, alpha1)(line)
}

/// Non-empty lines with `#` comments stripped.
fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
}

fn parse_numbers(line: &str) -> Result<Vec<f64>> {
    match numbers(line) {
        Ok((rest, values)) if rest.is_empty() => Ok(values),
        _ => Err(Error::parse(Format::Off, format!("malformed line: {line:?}"))),
    }
}

pub fn parse_off(data: &[u8], mode: ParseMode) -> Result<Mesh> {
    let text = std::str::from_utf8(data)
        .map_err(|_| Error::parse(Format::Off, "binary OFF is not supported"))?;
    let mut lines = content_lines(text);

    let first = lines
        .next()
        .ok_or_else(|| Error::parse(Format::Off, "missing header"))?;

    // The header keyword may share its line with the counts ("OFF 8 6 0").
    let (has_colors, counts_line) = match keyword(first) {
        Ok((rest, word)) if word.ends_with("OFF") => {
            let rest = rest.trim();
            let counts = if rest.is_empty() { lines.next() } else { Some(rest) };
            (word.starts_with('C'), counts)
        }
        _ => (false, Some(first)),
    };
    let counts = parse_numbers(
        counts_line.ok_or_else(|| Error::parse(Format::Off, "missing element counts"))?,
    )?;
    if counts.len() < 2 {
        return Err(Error::parse(Format::Off, "expected vertex and face counts"));
    }
    let (vertex_count, face_count) = (counts[0] as usize, counts[1] as usize);

    // Counts come from the file; rows are pushed as they parse.
    let mut mesh = Mesh::new();
    let mut colors = Vec::new();
    for _ in 0..vertex_count {
        let line = lines
            .next()
            .ok_or_else(|| Error::parse(Format::Off, "unexpected end of vertex list"))?;
        let values = parse_numbers(line)?;
        if values.len() < 3 {
            return Err(Error::parse(Format::Off, format!("vertex line {line:?}")));
        }
        mesh.add_vertex(Point3::new(values[0], values[1], values[2]));
        if has_colors && values.len() >= 6 {
            let rgb = [values[3], values[4], values[5]];
            colors.push(rgb);
        }
    }
    if has_colors && colors.len() == vertex_count {
        let integer_channels = colors.iter().flatten().any(|&c| c > 1.0);
        mesh.colors = Some(
            colors
                .into_iter()
                .map(|rgb| normalize_color(rgb, integer_channels))
                .collect(),
        );
    }

    let mut faces = FaceBuilder::new(Format::Off, mode);
    for _ in 0..face_count {
        let Some(line) = lines.next() else {
            if mode == ParseMode::Strict {
                return Err(Error::parse(Format::Off, "unexpected end of face list"));
            }
            break;
        };
        let values = parse_numbers(line)?;
        let corners = values.first().copied().unwrap_or_default() as usize;
        // Anything after the corner indices is a per-face color.
        let indices: Vec<i64> = values
            .iter()
            .skip(1)
            .take(corners)
            .map(|&v| v as i64)
            .collect();
        faces.polygon(&mut mesh, &indices)?;
    }
    faces.finish();

    Ok(mesh)
}
