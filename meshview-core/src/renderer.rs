/// The contract both rendering backends implement
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{DEFAULT_RENDER_OUT, OFFSCREEN_HEIGHT, OFFSCREEN_WIDTH};
use crate::error::Result;
use crate::geometry::Mesh;
use crate::material::Material;
use crate::transform::Pose;

/// Load a model, then draw it once.
///
/// The pose and material are kept beside the mesh and applied while
/// drawing; vertex data stays as loaded.
pub trait Renderer {
    /// Loads `path`, replacing any previous mesh. An empty result is an
    /// [`crate::Error::Load`].
    fn load(&mut self, path: &Path) -> Result<()>;

    fn mesh(&self) -> Option<&Mesh>;

    fn set_pose(&mut self, pose: Pose);

    fn set_material(&mut self, material: Option<Material>);

    /// Blocks until the window is closed (interactive) or the image is
    /// written (offscreen).
    fn render(&mut self) -> Result<()>;
}

/// Which [`Renderer`] implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Interactive,
    Offscreen,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Interactive, Backend::Offscreen];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Interactive => "interactive",
            Backend::Offscreen => "offscreen",
        }
    }

    /// Older names still accepted on the command line: `open3d` for the
    /// direct-reader viewer and `pyassimp` for the generic-loader renderer.
    pub fn alias(self) -> &'static str {
        match self {
            Backend::Interactive => "open3d",
            Backend::Offscreen => "pyassimp",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown backend {0:?} (expected interactive, offscreen, open3d or pyassimp)")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s) || b.alias().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}

/// Terminal palette used by the interactive backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// 24-bit RGB escapes
    #[default]
    TrueColor,
    /// The 16 standard ANSI colors
    Ansi,
}

/// Settings passed to a backend at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    /// Image written by the offscreen backend
    pub out_path: PathBuf,
    /// Shown in the interactive viewer's status line
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: OFFSCREEN_WIDTH,
            height: OFFSCREEN_HEIGHT,
            color_mode: ColorMode::default(),
            out_path: PathBuf::from(DEFAULT_RENDER_OUT),
            title: String::from("meshview"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
        }
        assert_eq!("OFFSCREEN".parse::<Backend>(), Ok(Backend::Offscreen));
        assert_eq!("open3d".parse::<Backend>(), Ok(Backend::Interactive));
        assert_eq!("PyAssimp".parse::<Backend>(), Ok(Backend::Offscreen));
        assert_eq!(Backend::Offscreen.to_string(), "offscreen");
        assert_eq!(
            "opengl".parse::<Backend>(),
            Err(UnknownBackend("opengl".to_string()))
        );
    }

    #[test]
    fn default_config_is_800_by_600() {
        let config = RenderConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.out_path, PathBuf::from("render.png"));
    }
}
