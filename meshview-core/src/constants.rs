//! Tunable constants shared by the loaders, the CAD converter and both renderers.

// =============================================================================
// CAD TESSELLATION
// =============================================================================

/// Linear deflection handed to the CAD kernel's incremental mesher.
pub const LINEAR_DEFLECTION: f64 = 0.5;

/// Whether [`LINEAR_DEFLECTION`] is relative to the edge size.
pub const RELATIVE_DEFLECTION: bool = true;

/// Angular deflection in radians.
pub const ANGULAR_DEFLECTION: f64 = 0.5;

/// Let the kernel triangulate faces in parallel.
pub const PARALLEL_TESSELLATION: bool = true;

// =============================================================================
// SHADING
// =============================================================================

/// Uniform paint for meshes without vertex colors.
pub const DEFAULT_GRAY: [f64; 3] = [0.7, 0.7, 0.72];

/// Direction the interactive viewer's sun light travels in.
pub const SUN_DIRECTION: [f64; 3] = [-1.0, -1.0, -1.0];

/// Intensity of the offscreen directional light.
pub const LIGHT_INTENSITY: f64 = 3.0;

// =============================================================================
// OFFSCREEN CAMERA AND OUTPUT
// =============================================================================

pub const OFFSCREEN_WIDTH: u32 = 800;
pub const OFFSCREEN_HEIGHT: u32 = 600;

/// Vertical field of view of the offscreen camera (60 degrees).
pub const CAMERA_YFOV: f64 = std::f64::consts::PI / 3.0;

/// Offscreen camera position; the camera looks down -Z with +Y up.
pub const CAMERA_POSITION: [f64; 3] = [0.0, -1.0, 1.5];

pub const CAMERA_ZNEAR: f64 = 0.05;
pub const CAMERA_ZFAR: f64 = 100.0;

pub const DEFAULT_RENDER_OUT: &str = "render.png";

// =============================================================================
// SAMPLE ASSET
// =============================================================================

pub const BUNNY_URL: &str =
    "https://github.com/isl-org/open3d_downloads/releases/download/20220201-data/BunnyMesh.ply";

/// Cache file name in the working directory; never invalidated.
pub const BUNNY_FILE: &str = "bunny.ply";

pub const BUNNY_OUT: &str = "bunny.png";
