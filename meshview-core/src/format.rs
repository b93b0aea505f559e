/// Extension-keyed format table and the loading strategy for each entry
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Every file format the dispatcher recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Obj,
    Ply,
    Stl,
    Gltf,
    Glb,
    Off,
    ThreeMf,
    ThreeDs,
    Step,
    Iges,
}

/// How a format gets turned into a [`crate::Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Strict reader first, lenient generic loader when it fails or comes back empty.
    DirectWithFallback,
    /// Only the generic loader understands the format.
    GenericOnly,
    /// Boundary representation that needs the optional CAD kernel.
    CadKernel,
}

/// The subset of formats read through a CAD kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadFormat {
    Step,
    Iges,
}

impl Format {
    pub const ALL: [Format; 10] = [
        Format::Obj,
        Format::Ply,
        Format::Stl,
        Format::Gltf,
        Format::Glb,
        Format::Off,
        Format::ThreeMf,
        Format::ThreeDs,
        Format::Step,
        Format::Iges,
    ];

    /// Map an extension (with or without the leading dot, any case).
    pub fn from_extension(extension: &str) -> Result<Self> {
        let lowered = extension.trim_start_matches('.').to_ascii_lowercase();
        let format = match lowered.as_str() {
            "obj" => Format::Obj,
            "ply" => Format::Ply,
            "stl" => Format::Stl,
            "gltf" => Format::Gltf,
            "glb" => Format::Glb,
            "off" => Format::Off,
            "3mf" => Format::ThreeMf,
            "3ds" => Format::ThreeDs,
            "step" | "stp" => Format::Step,
            "iges" | "igs" => Format::Iges,
            _ => {
                let extension = if lowered.is_empty() {
                    String::new()
                } else {
                    format!(".{lowered}")
                };
                return Err(Error::UnsupportedFormat { extension });
            }
        };
        Ok(format)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy())
            .unwrap_or_default();
        Self::from_extension(&extension)
    }

    pub fn strategy(self) -> LoadStrategy {
        match self {
            Format::Obj
            | Format::Ply
            | Format::Stl
            | Format::Gltf
            | Format::Glb
            | Format::Off
            | Format::ThreeMf => LoadStrategy::DirectWithFallback,
            Format::ThreeDs => LoadStrategy::GenericOnly,
            Format::Step | Format::Iges => LoadStrategy::CadKernel,
        }
    }

    pub fn cad_format(self) -> Option<CadFormat> {
        match self {
            Format::Step => Some(CadFormat::Step),
            Format::Iges => Some(CadFormat::Iges),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Obj => "OBJ",
            Format::Ply => "PLY",
            Format::Stl => "STL",
            Format::Gltf => "glTF",
            Format::Glb => "GLB",
            Format::Off => "OFF",
            Format::ThreeMf => "3MF",
            Format::ThreeDs => "3DS",
            Format::Step => "STEP",
            Format::Iges => "IGES",
        }
    }
}

impl From<CadFormat> for Format {
    fn from(format: CadFormat) -> Self {
        match format {
            CadFormat::Step => Format::Step,
            CadFormat::Iges => Format::Iges,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(Format::from_extension("STL").unwrap(), Format::Stl);
        assert_eq!(Format::from_extension(".Glb").unwrap(), Format::Glb);
        assert_eq!(
            Format::from_path(Path::new("dir/Part.STP")).unwrap(),
            Format::Step
        );
        assert_eq!(
            Format::from_path(Path::new("model.IGS")).unwrap(),
            Format::Iges
        );
    }

    #[test]
    fn unknown_extension_is_reported_with_dot() {
        match Format::from_path(Path::new("cloud.XYZ")) {
            Err(Error::UnsupportedFormat { extension }) => assert_eq!(extension, ".xyz"),
            other => panic!("unexpected: {other:?}"),
        }
        match Format::from_path(Path::new("no_extension")) {
            Err(Error::UnsupportedFormat { extension }) => assert!(extension.is_empty()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn only_brep_formats_need_the_kernel() {
        for format in Format::ALL {
            assert_eq!(
                format.cad_format().is_some(),
                format.strategy() == LoadStrategy::CadKernel
            );
        }
    }
}
