/// Interactive backend of the [`Renderer`] contract
use std::path::Path;

use log::info;
use meshview_core::constants::DEFAULT_GRAY;
use meshview_core::{Dispatcher, Error, Material, Mesh, Pose, RenderConfig, Renderer, Result};

use crate::TerminalApp;

/// Loads through the full dispatcher and shows the mesh in the terminal.
pub struct TerminalRenderer {
    dispatcher: Dispatcher,
    config: RenderConfig,
    mesh: Option<Mesh>,
    pose: Pose,
    material: Option<Material>,
}

impl TerminalRenderer {
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

    /// Mesh with display colors applied: the material's base color when one
    /// is set, the file's vertex colors otherwise, or a uniform gray.
    pub fn prepared_mesh(&self) -> Option<Mesh> {
        let mut mesh = self.mesh.clone()?;
        match &self.material {
            Some(material) => mesh.paint_uniform_color(material.rgb()),
            None if !mesh.has_vertex_colors() => mesh.paint_uniform_color(DEFAULT_GRAY),
            None => {}
        }
        Some(mesh)
    }
}

impl Renderer for TerminalRenderer {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mesh = self.dispatcher.load(path)?;
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

    fn render(&mut self) -> Result<()> {
        let mesh = self
            .prepared_mesh()
            .ok_or_else(|| Error::Render("nothing loaded".into()))?;
        info!(
            "opening terminal viewer: {} triangles",
            mesh.triangle_count()
        );
        let mut app = TerminalApp::new(mesh, self.pose.matrix(), self.config.title.clone())?;
        app.set_color_mode(self.config.color_mode);
        app.run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cube_off() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".off").tempfile().unwrap();
        write!(
            file,
            "COFF\n4 1 0\n0 0 0 255 0 0 255\n1 0 0 255 0 0 255\n1 1 0 255 0 0 255\n\
             0 1 0 255 0 0 255\n4 0 1 2 3\n"
        )
        .unwrap();
        file
    }

    #[test]
    fn render_without_mesh_fails() {
        let mut renderer = TerminalRenderer::new(RenderConfig::default());
        assert!(matches!(renderer.render(), Err(Error::Render(_))));
    }

    #[test]
    fn vertex_colors_win_over_gray_but_not_over_material() {
        let file = cube_off();
        let mut renderer = TerminalRenderer::new(RenderConfig::default());
        renderer.load(file.path()).unwrap();
        assert!(renderer.mesh().unwrap().has_vertex_normals());

        let colors = renderer.prepared_mesh().unwrap().colors.unwrap();
        assert_eq!(colors[0], [1.0, 0.0, 0.0]);

        renderer.set_material(Some(Material::NICKEL));
        let colors = renderer.prepared_mesh().unwrap().colors.unwrap();
        assert_eq!(colors[0], [0.66, 0.61, 0.53]);
    }

    #[test]
    fn uncolored_mesh_is_painted_gray() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        write!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut renderer = TerminalRenderer::new(RenderConfig::default());
        renderer.load(file.path()).unwrap();
        let mesh = renderer.prepared_mesh().unwrap();
        assert_eq!(mesh.colors.unwrap(), vec![DEFAULT_GRAY; 3]);
    }
}
