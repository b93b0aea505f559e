/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use meshview_core::constants::DEFAULT_GRAY;
use meshview_core::{Camera, ColorMode, Mesh, Transform};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light that is always present so faces turned away stay visible
const AMBIENT: f64 = 0.15;

/// The 16 ANSI colors with their usual RGB values
const ANSI_PALETTE: [(Color, [f64; 3]); 16] = [
    (Color::Black, [0.0, 0.0, 0.0]),
    (Color::DarkRed, [0.5, 0.0, 0.0]),
    (Color::DarkGreen, [0.0, 0.5, 0.0]),
    (Color::DarkYellow, [0.5, 0.5, 0.0]),
    (Color::DarkBlue, [0.0, 0.0, 0.5]),
    (Color::DarkMagenta, [0.5, 0.0, 0.5]),
    (Color::DarkCyan, [0.0, 0.5, 0.5]),
    (Color::Grey, [0.75, 0.75, 0.75]),
    (Color::DarkGrey, [0.5, 0.5, 0.5]),
    (Color::Red, [1.0, 0.0, 0.0]),
    (Color::Green, [0.0, 1.0, 0.0]),
    (Color::Yellow, [1.0, 1.0, 0.0]),
    (Color::Blue, [0.0, 0.0, 1.0]),
    (Color::Magenta, [1.0, 0.0, 1.0]),
    (Color::Cyan, [0.0, 1.0, 1.0]),
    (Color::White, [1.0, 1.0, 1.0]),
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    rgb: [f64; 3],
}

const BLANK: Cell = Cell {
    character: ' ',
    rgb: [0.0; 3],
};

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    /// Direction towards the light, world space
    light: Vector3<f64>,
    depth_buffer: Vec<f64>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    /// `sun_direction` is the direction the light travels in.
    pub fn new(width: usize, height: usize, sun_direction: Vector3<f64>) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            light: (-sun_direction).try_normalize(0.0).unwrap_or_else(Vector3::z),
            depth_buffer: vec![f64::INFINITY; size],
            cells: vec![BLANK; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let light = self.light;
        *self = Self::new(width, height, -light);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f64::INFINITY);
        self.cells.fill(BLANK);
    }

    /// Rasterizes every triangle. Vertex colors are used when present,
    /// the default gray otherwise.
    pub fn render_mesh(&mut self, mesh: &Mesh, model_matrix: &Matrix4<f64>, camera: &Camera) {
        let mvp = Transform::mvp_matrix(
            model_matrix,
            &camera.view_matrix(),
            &camera.projection_matrix(),
        );
        for triangle in &mesh.triangles {
            self.render_triangle(mesh, triangle, model_matrix, &mvp);
        }
    }

    fn render_triangle(
        &mut self,
        mesh: &Mesh,
        triangle: &[u32; 3],
        model_matrix: &Matrix4<f64>,
        mvp: &Matrix4<f64>,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, &index) in screen_coords.iter_mut().zip(triangle) {
            match Camera::project_with(
                mvp,
                &mesh.vertices[index as usize],
                self.width as u32,
                self.height as u32,
            ) {
                Some(projected) => *slot = projected,
                None => return, // Triangle is clipped
            }
        }

        // Face normal in world space for shading
        let normal = model_matrix
            .transform_vector(&mesh.triangle_normal(triangle))
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros);
        let diffuse = normal.dot(&self.light).max(0.0);
        let brightness = AMBIENT + (1.0 - AMBIENT) * diffuse;

        let base = match &mesh.colors {
            Some(colors) => {
                let sum = triangle
                    .iter()
                    .fold([0.0; 3], |acc, &i| add3(acc, colors[i as usize]));
                sum.map(|c| c / 3.0)
            }
            None => DEFAULT_GRAY,
        };

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f64).round() as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let cell = Cell {
            character: LUMINOSITY_RAMP[char_index],
            rgb: base.map(|c| (c * brightness).clamp(0.0, 1.0)),
        };

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, cell);
    }

    fn rasterize_triangle(&mut self, coords: &[(f64, f64, f64); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i64;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i64;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i64;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i64;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i64 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i64 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.cells[idx] = cell;
                        }
                    }
                }
            }
        }
    }

    /// Character at a cell, for inspection.
    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].character
    }

    /// Number of cells something was drawn into.
    pub fn covered(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    /// Writes the buffer starting at terminal row `top`.
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16, mode: ColorMode) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, top + y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                let color = terminal_color(cell.rgb, mode);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn add3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn terminal_color(rgb: [f64; 3], mode: ColorMode) -> Color {
    match mode {
        ColorMode::TrueColor => {
            let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            Color::Rgb { r, g, b }
        }
        ColorMode::Ansi => {
            let distance = |p: &[f64; 3]| {
                (0..3).map(|i| (p[i] - rgb[i]).powi(2)).sum::<f64>()
            };
            ANSI_PALETTE
                .iter()
                .min_by(|a, b| distance(&a.1).total_cmp(&distance(&b.1)))
                .map(|(color, _)| *color)
                .unwrap_or(Color::White)
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f64, f64),
    v1: (f64, f64),
    v2: (f64, f64),
    p: (f64, f64),
) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::constants::SUN_DIRECTION;

    fn sun() -> Vector3<f64> {
        Vector3::from(SUN_DIRECTION)
    }

    #[test]
    fn barycentric_of_vertex_is_unit() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)).unwrap();
        assert!((w0 - 1.0).abs() < 1e-12 && w1.abs() < 1e-12 && w2.abs() < 1e-12);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn cube_covers_the_middle_of_the_screen() {
        let mut renderer = AsciiRenderer::new(40, 20, sun());
        let mut camera = Camera::new(40, 40);
        camera.frame_bounds(
            &nalgebra::Point3::new(-1.0, -1.0, -1.0),
            &nalgebra::Point3::new(1.0, 1.0, 1.0),
        );
        renderer.render_mesh(&Mesh::cube(2.0), &Matrix4::identity(), &camera);
        assert!(renderer.covered() > 0);
        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');

        renderer.clear();
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn ansi_mode_picks_nearest_palette_entry() {
        assert_eq!(terminal_color([0.9, 0.1, 0.1], ColorMode::Ansi), Color::Red);
        assert_eq!(terminal_color([0.7, 0.7, 0.72], ColorMode::Ansi), Color::Grey);
        assert_eq!(
            terminal_color([1.0, 0.5, 0.0], ColorMode::TrueColor),
            Color::Rgb { r: 255, g: 128, b: 0 }
        );
    }

    #[test]
    fn draw_emits_every_row() {
        let renderer = AsciiRenderer::new(3, 2, sun());
        let mut out = Vec::new();
        renderer.draw(&mut out, 1, ColorMode::Ansi).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("   ").count(), 2);
    }
}
