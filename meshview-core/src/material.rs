/// Metallic-roughness material presets
use std::fmt;

/// A named PBR material. Immutable; taken from [`Material::PRESETS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub name: &'static str,
    /// Linear RGBA
    pub base_color: [f64; 4],
    pub metallic: f64,
    pub roughness: f64,
}

impl Material {
    pub const IRON: Material = Material {
        name: "iron",
        base_color: [0.56, 0.57, 0.58, 1.0],
        metallic: 1.0,
        roughness: 0.5,
    };

    pub const ALUMINUM: Material = Material {
        name: "aluminum",
        base_color: [0.91, 0.92, 0.93, 1.0],
        metallic: 1.0,
        roughness: 0.2,
    };

    pub const NICKEL: Material = Material {
        name: "nickel",
        base_color: [0.66, 0.61, 0.53, 1.0],
        metallic: 1.0,
        roughness: 0.3,
    };

    pub const PRESETS: [Material; 3] = [Self::IRON, Self::ALUMINUM, Self::NICKEL];

    /// The preset used when a name is unknown.
    pub const DEFAULT: Material = Self::IRON;

    /// Exact-name lookup.
    pub fn lookup(name: &str) -> Option<Material> {
        Self::PRESETS.into_iter().find(|m| m.name == name)
    }

    /// Lookup falling back to [`Material::DEFAULT`].
    pub fn by_name(name: &str) -> Material {
        Self::lookup(name).unwrap_or(Self::DEFAULT)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::PRESETS.into_iter().map(|m| m.name)
    }

    pub fn rgb(&self) -> [f64; 3] {
        let [r, g, b, _] = self.base_color;
        [r, g, b]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
