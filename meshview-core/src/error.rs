/// Error taxonomy shared by loaders, the CAD converter and renderers
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::Format;

/// Boxed cause carried by load and render failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The optional CAD kernel needed for STEP/IGES input is not linked in
    #[error("missing optional dependency `{dependency}`: required to read {format} files")]
    MissingDependency {
        dependency: &'static str,
        format: Format,
    },

    /// Extension did not map to any known format
    #[error("unsupported extension: {extension:?}")]
    UnsupportedFormat { extension: String },

    /// A backend returned an empty/null result or failed outright
    #[error("failed to load {}: {cause}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        cause: BoxError,
    },

    /// Triangulation produced no vertices or no triangles
    #[error("triangulation failed or empty model")]
    EmptyModel,

    /// A format parser rejected its input
    #[error("{format} parse error: {message}")]
    Parse { format: Format, message: String },

    /// Rendering or writing the output failed
    #[error("render failed: {0}")]
    Render(#[source] BoxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn load(path: &Path, cause: impl Into<BoxError>) -> Self {
        Error::Load {
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }

    pub fn parse(format: Format, message: impl Into<String>) -> Self {
        Error::Parse {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
