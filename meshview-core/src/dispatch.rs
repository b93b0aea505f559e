/// Format Dispatcher: picks a loading strategy from the file extension
use std::path::Path;

use log::{info, warn};

use crate::cad::{CadConverter, CadKernel};
use crate::error::{Error, Result};
use crate::format::{Format, LoadStrategy};
use crate::formats;
use crate::geometry::Mesh;

/// Name reported when STEP/IGES input arrives without a kernel.
pub const CAD_KERNEL_DEPENDENCY: &str = "cad-kernel";

/// Loads any supported file into a [`Mesh`].
///
/// Mesh formats are parsed in-crate. STEP and IGES need a [`CadKernel`]
/// registered with [`Dispatcher::with_kernel`].
#[derive(Default)]
pub struct Dispatcher {
    kernel: Option<Box<dyn CadKernel>>,
    converter: CadConverter,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernel(mut self, kernel: Box<dyn CadKernel>) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn kernel_name(&self) -> Option<&str> {
        self.kernel.as_deref().map(|k| k.name())
    }

    /// Full dispatch: direct reader with generic fallback, generic loader
    /// only, or the CAD kernel, depending on the extension.
    pub fn load(&self, path: &Path) -> Result<Mesh> {
        let format = Format::from_path(path)?;
        let mut mesh = match format.strategy() {
            LoadStrategy::DirectWithFallback => {
                check_readable(path)?;
                self.direct_with_fallback(format, path)?
            }
            LoadStrategy::GenericOnly => {
                check_readable(path)?;
                generic(format, path)?
            }
            LoadStrategy::CadKernel => self.load_cad(format, path)?,
        };
        mesh.compute_vertex_normals();
        info!(
            "loaded {}: {} vertices, {} triangles",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Skips the direct readers. CAD formats still go through the kernel.
    pub fn load_generic(&self, path: &Path) -> Result<Mesh> {
        let format = Format::from_path(path)?;
        let mut mesh = match format.strategy() {
            LoadStrategy::CadKernel => self.load_cad(format, path)?,
            LoadStrategy::DirectWithFallback | LoadStrategy::GenericOnly => {
                check_readable(path)?;
                generic(format, path)?
            }
        };
        mesh.compute_vertex_normals();
        info!(
            "loaded {} (generic): {} vertices, {} triangles",
            path.display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    fn direct_with_fallback(&self, format: Format, path: &Path) -> Result<Mesh> {
        let direct_failure = match formats::read_direct(format, path) {
            Ok(mesh) if !mesh.is_empty() => return Ok(mesh),
            Ok(_) => "empty result".to_string(),
            Err(e) => e.to_string(),
        };
        warn!(
            "direct {format} reader failed on {} ({direct_failure}), trying generic loader",
            path.display()
        );

        match formats::load_generic(format, path) {
            Ok(mesh) if !mesh.is_empty() => Ok(mesh),
            Ok(_) => Err(Error::load(
                path,
                format!("direct reader: {direct_failure}; generic loader: empty result"),
            )),
            Err(e) => Err(Error::load(
                path,
                format!("direct reader: {direct_failure}; generic loader: {e}"),
            )),
        }
    }

    fn load_cad(&self, format: Format, path: &Path) -> Result<Mesh> {
        let cad_format = format.cad_format();
        let kernel = self
            .kernel
            .as_deref()
            .zip(cad_format)
            .filter(|(kernel, cad_format)| kernel.supports(*cad_format));
        let Some((kernel, cad_format)) = kernel else {
            return Err(Error::MissingDependency {
                dependency: CAD_KERNEL_DEPENDENCY,
                format,
            });
        };
        check_readable(path)?;
        self.converter
            .load(kernel, path, cad_format)
            .map_err(|e| wrap_load(path, e))
    }
}

/// Empty or unreadable files fail before any parser runs.
fn check_readable(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::load(path, e))?;
    if !metadata.is_file() {
        return Err(Error::load(path, "not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(Error::load(path, "file is empty"));
    }
    Ok(())
}

fn generic(format: Format, path: &Path) -> Result<Mesh> {
    match formats::load_generic(format, path) {
        Ok(mesh) if !mesh.is_empty() => Ok(mesh),
        Ok(_) => Err(Error::load(path, "generic loader returned an empty mesh")),
        Err(e) => Err(wrap_load(path, e)),
    }
}

/// Parser and I/O failures become `Load` errors carrying the path.
fn wrap_load(path: &Path, error: Error) -> Error {
    match error {
        Error::Parse { .. } | Error::Io(_) => Error::load(path, error),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cad::tests::{square_faces, MockKernel};
    use crate::cad::FaceMesh;
    use crate::format::CadFormat;
    use crate::formats::stl::tests::binary_stl;

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn step_without_kernel_is_a_missing_dependency() {
        let file = temp_file(".stp", b"ISO-10303-21;");
        match Dispatcher::new().load(file.path()) {
            Err(Error::MissingDependency { format, .. }) => assert_eq!(format, Format::Step),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn step_with_kernel_is_converted() {
        let file = temp_file(".step", b"ISO-10303-21;");
        let dispatcher = Dispatcher::new().with_kernel(Box::new(MockKernel::new(square_faces())));
        assert_eq!(dispatcher.kernel_name(), Some("mock"));
        let mesh = dispatcher.load(file.path()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn empty_shape_is_an_empty_model() {
        let file = temp_file(".igs", b"IGES");
        let dispatcher = Dispatcher::new().with_kernel(Box::new(MockKernel::new(Vec::new())));
        assert!(matches!(dispatcher.load(file.path()), Err(Error::EmptyModel)));
    }

    #[test]
    fn collinear_shape_is_an_empty_model() {
        let file = temp_file(".step", b"ISO-10303-21;");
        let flat = FaceMesh {
            nodes: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            triangles: Some(vec![[1, 2, 3]]),
        };
        let dispatcher = Dispatcher::new().with_kernel(Box::new(MockKernel::new(vec![flat])));
        assert!(matches!(dispatcher.load(file.path()), Err(Error::EmptyModel)));
    }

    #[test]
    fn kernel_without_iges_support_is_a_missing_dependency() {
        let file = temp_file(".iges", b"IGES");
        let kernel = MockKernel::new(square_faces()).only(CadFormat::Step);
        let dispatcher = Dispatcher::new().with_kernel(Box::new(kernel));
        match dispatcher.load(file.path()) {
            Err(Error::MissingDependency { format, .. }) => assert_eq!(format, Format::Iges),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn truncated_stl_falls_back_to_generic_loader() {
        let mut data = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        data.truncate(data.len() - 10);
        let file = temp_file(".stl", &data);

        let mesh = Dispatcher::new().load(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.has_vertex_normals());
    }

    #[test]
    fn both_loaders_failing_is_a_load_error() {
        let file = temp_file(".off", b"not an off file\n");
        match Dispatcher::new().load(file.path()) {
            Err(Error::Load { path, cause }) => {
                assert_eq!(path, file.path());
                assert!(cause.to_string().contains("direct reader"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = Dispatcher::new()
            .load(Path::new("does/not/exist.obj"))
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
