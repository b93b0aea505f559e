/// meshview core library - mesh model, loaders and transform logic
///
/// This library holds everything both renderers share: the indexed mesh,
/// format parsers and the extension dispatcher, the CAD-to-mesh converter,
/// transforms, material presets and the renderer contract.

pub mod cad;
#[cfg(feature = "step")]
pub mod cad_step;
pub mod cleanup;
pub mod constants;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod formats;
pub mod geometry;
pub mod material;
pub mod projection;
pub mod renderer;
pub mod transform;

// Re-export commonly used types
pub use cad::{BrepShape, CadConverter, CadKernel, FaceMesh, Tessellation};
#[cfg(feature = "step")]
pub use cad_step::StepKernel;
pub use dedup::VertexDedup;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use format::{CadFormat, Format, LoadStrategy};
pub use geometry::Mesh;
pub use material::Material;
pub use projection::{Camera, ProjectionMode};
pub use renderer::{Backend, ColorMode, RenderConfig, Renderer};
pub use transform::{Pose, RotationState, Transform};
