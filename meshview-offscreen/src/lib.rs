//! Offscreen backend: CPU rasterization of a posed mesh to a PNG file.
//!
//! The scene mirrors a minimal PBR setup: one white directional light with
//! identity pose, one perspective camera at a fixed pose, and a
//! metallic-roughness material on the mesh.

use std::path::Path;

use log::info;
use meshview_core::constants::{
    CAMERA_POSITION, CAMERA_YFOV, CAMERA_ZFAR, CAMERA_ZNEAR, LIGHT_INTENSITY,
};
use meshview_core::{Camera, Dispatcher, Error, Material, Mesh, Pose, RenderConfig, Renderer};
use nalgebra::{Matrix4, Vector3};

pub mod brdf;
pub mod error;
pub mod image_write;
pub mod raster;

pub use error::OffscreenError;
pub use raster::{DirectionalLight, FrameBuffer, Scene};

/// Renders through the generic loader into an image file.
pub struct OffscreenRenderer {
    dispatcher: Dispatcher,
    config: RenderConfig,
    mesh: Option<Mesh>,
    pose: Pose,
    material: Option<Material>,
}

impl OffscreenRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_dispatcher(Dispatcher::new(), config)
    }

    pub fn with_dispatcher(dispatcher: Dispatcher, config: RenderConfig) -> Self {
        Self {
            dispatcher,
            config,
            mesh: None,
            pose: Pose::default(),
            material: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Fixed camera: translated to the configured position, looking down -Z.
    pub fn camera(&self) -> Camera {
        let pose = Matrix4::new_translation(&Vector3::from(CAMERA_POSITION));
        let aspect = self.config.width as f64 / self.config.height.max(1) as f64;
        Camera::from_pose(&pose, CAMERA_YFOV, aspect, CAMERA_ZNEAR, CAMERA_ZFAR)
    }

    /// Rasterizes the loaded mesh without writing anything.
    pub fn render_frame(&self) -> meshview_core::Result<FrameBuffer> {
        let mesh = self
            .mesh
            .as_ref()
            .ok_or_else(|| Error::Render("nothing loaded".into()))?;
        let scene = Scene {
            mesh,
            model: self.pose.matrix(),
            material: self.material.unwrap_or_default(),
            camera: self.camera(),
            light: DirectionalLight::from_pose(&Matrix4::identity(), [1.0; 3], LIGHT_INTENSITY),
        };
        Ok(raster::rasterize(&scene, self.config.width, self.config.height))
    }
}

impl Renderer for OffscreenRenderer {
    fn load(&mut self, path: &Path) -> meshview_core::Result<()> {
        let mesh = self.dispatcher.load_generic(path)?;
        if mesh.is_empty() {
            return Err(Error::load(path, "empty mesh"));
        }
        self.mesh = Some(mesh);
        Ok(())
    }

    fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn set_material(&mut self, material: Option<Material>) {
        self.material = material;
    }

    fn render(&mut self) -> meshview_core::Result<()> {
        let frame = self.render_frame()?;
        image_write::write_png_rgb8(
            &self.config.out_path,
            &frame.to_rgb8(),
            frame.width,
            frame.height,
        )?;
        info!(
            "wrote {}x{} image to {} ({} pixels covered)",
            frame.width,
            frame.height,
            self.config.out_path.display(),
            frame.covered()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::Transform;
    use std::io::Write;

    fn triangle_obj() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        write!(file, "v -0.5 -1.5 0\nv 0.5 -1.5 0\nv 0 -0.5 0\nf 1 2 3\n").unwrap();
        file
    }

    #[test]
    fn camera_sits_at_the_fixed_pose() {
        let renderer = OffscreenRenderer::new(RenderConfig::default());
        let camera = renderer.camera();
        assert_eq!(camera.position, nalgebra::Point3::new(0.0, -1.0, 1.5));
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-12);
    }

    #[test]
    fn mesh_in_front_of_camera_is_drawn() {
        let file = triangle_obj();
        let mut renderer = OffscreenRenderer::new(RenderConfig {
            width: 80,
            height: 60,
            ..RenderConfig::default()
        });
        renderer.load(file.path()).unwrap();
        let frame = renderer.render_frame().unwrap();
        assert!(frame.covered() > 0);
        assert!(frame.pixel(40, 30).norm() > 0.0);
    }

    #[test]
    fn pose_is_not_baked_into_vertices() {
        let file = triangle_obj();
        let mut renderer = OffscreenRenderer::new(RenderConfig {
            width: 80,
            height: 60,
            ..RenderConfig::default()
        });
        renderer.load(file.path()).unwrap();
        let before = renderer.mesh().unwrap().vertices.clone();

        renderer.set_pose(Transform::from_translation_rotation([0.0, 0.0, 5.0], [0.0; 3]).into());
        let frame = renderer.render_frame().unwrap();
        assert_eq!(frame.covered(), 0);
        assert_eq!(renderer.mesh().unwrap().vertices, before);
    }

    #[test]
    fn render_without_mesh_fails() {
        let mut renderer = OffscreenRenderer::new(RenderConfig::default());
        assert!(matches!(renderer.render(), Err(Error::Render(_))));
    }
}
