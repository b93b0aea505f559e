use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OffscreenError {
    #[error("PNG writer requires a tight RGB8 buffer: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("image dimensions {width}x{height} overflow")]
    Dimensions { width: u32, height: u32 },

    #[error("failed to create output PNG at {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode PNG")]
    Encode(#[from] image::ImageError),
}

impl From<OffscreenError> for meshview_core::Error {
    fn from(error: OffscreenError) -> Self {
        meshview_core::Error::Render(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, OffscreenError>;
