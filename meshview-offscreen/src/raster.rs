//! Depth-buffered triangle rasterizer with per-pixel PBR shading.

use meshview_core::{Camera, Material, Mesh};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::brdf;

/// A light infinitely far away, shining along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f64>,
    pub color: [f64; 3],
    pub intensity: f64,
}

impl DirectionalLight {
    /// Light placed by a pose; with an identity rotation it shines along -Z.
    pub fn from_pose(pose: &Matrix4<f64>, color: [f64; 3], intensity: f64) -> Self {
        Self {
            direction: pose.transform_vector(&-Vector3::z()),
            color,
            intensity,
        }
    }

    fn radiance(&self) -> Vector3<f64> {
        Vector3::from(self.color) * self.intensity
    }
}

/// Everything needed to draw one frame.
pub struct Scene<'a> {
    pub mesh: &'a Mesh,
    /// Mesh pose; applied per vertex while drawing
    pub model: Matrix4<f64>,
    pub material: Material,
    pub camera: Camera,
    pub light: DirectionalLight,
}

/// Linear RGB color plus NDC depth per pixel.
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    color: Vec<Vector3<f64>>,
    depth: Vec<f64>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vector3::zeros(); size],
            depth: vec![f64::INFINITY; size],
        }
    }

    /// Pixels covered by geometry.
    pub fn covered(&self) -> usize {
        self.depth.iter().filter(|d| d.is_finite()).count()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vector3<f64> {
        self.color[y as usize * self.width as usize + x as usize]
    }

    /// sRGB-encoded, tightly packed RGB8.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| [c.x, c.y, c.z])
            .map(|linear| (encode_srgb(linear) * 255.0).round() as u8)
            .collect()
    }
}

fn encode_srgb(linear: f64) -> f64 {
    let c = linear.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// A vertex after the model and view-projection transforms.
#[derive(Clone, Copy)]
struct Projected {
    screen: (f64, f64),
    depth: f64,
    /// 1 / clip w, for perspective-correct interpolation
    inv_w: f64,
    world: Point3<f64>,
    normal: Vector3<f64>,
}

/// Draws the scene into a new frame buffer.
///
/// Normals are interpolated across each triangle. Faces seen from behind
/// are lit with the flipped normal. Triangles crossing the near plane are
/// skipped.
pub fn rasterize(scene: &Scene<'_>, width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    let mesh = scene.mesh;

    let computed;
    let normals = match &mesh.normals {
        Some(normals) => normals,
        None => {
            let mut copy = mesh.clone();
            copy.compute_vertex_normals();
            computed = copy.normals.unwrap_or_default();
            &computed
        }
    };

    let view_projection = scene.camera.projection_matrix() * scene.camera.view_matrix();
    let light_dir = (-scene.light.direction)
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::z);
    let radiance = scene.light.radiance();

    let projected: Vec<Option<Projected>> = mesh
        .vertices
        .iter()
        .zip(normals)
        .map(|(vertex, normal)| {
            let world = scene.model.transform_point(vertex);
            let clip = view_projection * world.to_homogeneous();
            if clip.w < 1e-9 {
                return None;
            }
            let ndc = clip.xyz() / clip.w;
            Some(Projected {
                screen: (
                    (ndc.x + 1.0) * 0.5 * width as f64,
                    (1.0 - ndc.y) * 0.5 * height as f64,
                ),
                depth: ndc.z,
                inv_w: 1.0 / clip.w,
                world,
                normal: scene.model.transform_vector(normal),
            })
        })
        .collect();

    for triangle in &mesh.triangles {
        let corners = triangle.map(|i| projected[i as usize]);
        let [Some(a), Some(b), Some(c)] = corners else {
            continue;
        };
        draw_triangle(&mut frame, [a, b, c], |world, normal| {
            let view_dir = (scene.camera.position - world)
                .try_normalize(0.0)
                .unwrap_or_else(Vector3::z);
            let mut normal = normal.try_normalize(0.0).unwrap_or(view_dir);
            if normal.dot(&view_dir) < 0.0 {
                normal = -normal;
            }
            brdf::evaluate(&scene.material, &light_dir, &view_dir, &normal).component_mul(&radiance)
        });
    }
    frame
}

fn draw_triangle<F>(frame: &mut FrameBuffer, v: [Projected; 3], shade: F)
where
    F: Fn(Point3<f64>, Vector3<f64>) -> Vector3<f64>,
{
    let xs = v.map(|p| p.screen.0);
    let ys = v.map(|p| p.screen.1);

    let area = edge(v[0].screen, v[1].screen, v[2].screen);
    if area.abs() < 1e-12 {
        return;
    }

    // Bounding box clipped to the frame
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
    let max_x = xs
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(frame.width as f64 - 1.0) as i64;
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
    let max_y = ys
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(frame.height as f64 - 1.0) as i64;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge(v[1].screen, v[2].screen, p) / area;
            let w1 = edge(v[2].screen, v[0].screen, p) / area;
            let w2 = 1.0 - w0 - w1;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
            let idx = y as usize * frame.width as usize + x as usize;
            if !(-1.0..=1.0).contains(&depth) || depth >= frame.depth[idx] {
                continue;
            }

            // Perspective-correct weights
            let pw = [w0 * v[0].inv_w, w1 * v[1].inv_w, w2 * v[2].inv_w];
            let sum = pw[0] + pw[1] + pw[2];
            let pw = pw.map(|w| w / sum);
            let world = Point3::from(
                v[0].world.coords * pw[0] + v[1].world.coords * pw[1] + v[2].world.coords * pw[2],
            );
            let normal = v[0].normal * pw[0] + v[1].normal * pw[1] + v[2].normal * pw[2];

            frame.depth[idx] = depth;
            frame.color[idx] = shade(world, normal);
        }
    }
}

/// Twice the signed area of (a, b, p).
fn edge(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(mesh: &Mesh, model: Matrix4<f64>) -> Scene<'_> {
        let camera_pose = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0));
        Scene {
            mesh,
            model,
            material: Material::ALUMINUM,
            camera: Camera::from_pose(&camera_pose, std::f64::consts::PI / 3.0, 1.0, 0.05, 100.0),
            light: DirectionalLight::from_pose(&Matrix4::identity(), [1.0; 3], 3.0),
        }
    }

    #[test]
    fn identity_light_shines_down_negative_z() {
        let light = DirectionalLight::from_pose(&Matrix4::identity(), [1.0; 3], 3.0);
        assert_eq!(light.direction, -Vector3::z());
    }

    #[test]
    fn cube_in_front_of_camera_is_lit() {
        let mesh = Mesh::cube(1.0);
        let frame = rasterize(&scene(&mesh, Matrix4::identity()), 64, 64);
        assert!(frame.covered() > 0);
        // Front face looks straight at both the camera and the light.
        assert!(frame.pixel(32, 32).x > 0.0);
        assert_eq!(frame.pixel(0, 0), Vector3::zeros());
    }

    #[test]
    fn pose_moves_the_mesh_out_of_view() {
        let mesh = Mesh::cube(1.0);
        let model = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));
        let frame = rasterize(&scene(&mesh, model), 64, 64);
        assert_eq!(frame.covered(), 0);
    }

    #[test]
    fn srgb_encoding_clamps() {
        assert_eq!(encode_srgb(-1.0), 0.0);
        assert_eq!(encode_srgb(2.0), 1.0);
        assert!(encode_srgb(0.5) > 0.5);
    }
}
