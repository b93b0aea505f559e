//! Hand-rolled flag parsing shared by the three binaries.

use std::path::PathBuf;

use meshview_core::constants::{BUNNY_OUT, DEFAULT_RENDER_OUT};
use meshview_core::{Backend, ColorMode, Material, Pose};
use thiserror::Error;

/// Command-line misuse; binaries report it and exit with status 2.
#[derive(Debug, Error, PartialEq)]
pub enum ArgError {
    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("{flag} expects a number, got {value:?}")]
    NotANumber { flag: &'static str, value: String },

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    #[error("missing model path")]
    MissingPath,

    #[error("{0}")]
    Backend(#[from] meshview_core::renderer::UnknownBackend),

    #[error("unknown material {0:?} (expected iron, aluminum or nickel)")]
    UnknownMaterial(String),
}

/// Either options to run with, or a request for the usage text.
#[derive(Debug, PartialEq)]
pub enum Parsed<T> {
    Run(T),
    Help,
}

/// Cursor over the raw arguments.
pub struct ArgCursor {
    args: Vec<String>,
    pos: usize,
}

impl ArgCursor {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            pos: 0,
        }
    }

    /// The process arguments without the program name.
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    pub fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    pub fn value(&mut self, flag: &'static str) -> Result<String, ArgError> {
        self.next().ok_or(ArgError::MissingValue(flag))
    }

    /// Three numbers following `flag`, as in `--translate 0 -1 0`.
    pub fn triple(&mut self, flag: &'static str) -> Result<[f64; 3], ArgError> {
        let mut out = [0.0; 3];
        for slot in &mut out {
            let value = self.value(flag)?;
            *slot = value
                .parse()
                .map_err(|_| ArgError::NotANumber { flag, value })?;
        }
        Ok(out)
    }
}

/// Pose flags common to `multi_viewer` and `render_bunny`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoseArgs {
    pub translate: Option<[f64; 3]>,
    pub rotate: Option<[f64; 3]>,
}

impl PoseArgs {
    pub fn pose(&self) -> Pose {
        Pose::from_parts(self.translate, self.rotate)
    }

    /// Consumes `arg` if it is a pose flag.
    fn accept(&mut self, arg: &str, cursor: &mut ArgCursor) -> Result<bool, ArgError> {
        match arg {
            "--translate" => self.translate = Some(cursor.triple("--translate")?),
            "--rotate" => self.rotate = Some(cursor.triple("--rotate")?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerArgs {
    pub path: PathBuf,
    pub color_mode: ColorMode,
    pub verbose: bool,
}

impl ViewerArgs {
    pub fn parse(mut cursor: ArgCursor) -> Result<Parsed<Self>, ArgError> {
        let mut path = None;
        let mut color_mode = ColorMode::default();
        let mut verbose = false;

        while let Some(arg) = cursor.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Parsed::Help),
                "-v" | "--verbose" => verbose = true,
                "--ansi" => color_mode = ColorMode::Ansi,
                flag if flag.starts_with('-') => return Err(ArgError::UnknownOption(arg)),
                _ if path.is_none() => path = Some(PathBuf::from(arg)),
                _ => return Err(ArgError::UnexpectedArgument(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            path: path.ok_or(ArgError::MissingPath)?,
            color_mode,
            verbose,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiViewerArgs {
    pub path: PathBuf,
    pub backend: Backend,
    pub pose: PoseArgs,
    pub out: PathBuf,
    pub color_mode: ColorMode,
    pub verbose: bool,
}

impl MultiViewerArgs {
    pub fn parse(mut cursor: ArgCursor) -> Result<Parsed<Self>, ArgError> {
        let mut path = None;
        let mut backend = Backend::default();
        let mut pose = PoseArgs::default();
        let mut out = PathBuf::from(DEFAULT_RENDER_OUT);
        let mut color_mode = ColorMode::default();
        let mut verbose = false;

        while let Some(arg) = cursor.next() {
            if pose.accept(&arg, &mut cursor)? {
                continue;
            }
            match arg.as_str() {
                "-h" | "--help" => return Ok(Parsed::Help),
                "-v" | "--verbose" => verbose = true,
                "--ansi" => color_mode = ColorMode::Ansi,
                "--backend" => backend = cursor.value("--backend")?.parse()?,
                "--out" => out = PathBuf::from(cursor.value("--out")?),
                flag if flag.starts_with('-') => return Err(ArgError::UnknownOption(arg)),
                _ if path.is_none() => path = Some(PathBuf::from(arg)),
                _ => return Err(ArgError::UnexpectedArgument(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            path: path.ok_or(ArgError::MissingPath)?,
            backend,
            pose,
            out,
            color_mode,
            verbose,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BunnyArgs {
    pub material: Material,
    pub out: PathBuf,
    pub pose: PoseArgs,
    pub verbose: bool,
}

impl BunnyArgs {
    pub fn parse(mut cursor: ArgCursor) -> Result<Parsed<Self>, ArgError> {
        let mut material = Material::DEFAULT;
        let mut out = PathBuf::from(BUNNY_OUT);
        let mut pose = PoseArgs::default();
        let mut verbose = false;

        while let Some(arg) = cursor.next() {
            if pose.accept(&arg, &mut cursor)? {
                continue;
            }
            match arg.as_str() {
                "-h" | "--help" => return Ok(Parsed::Help),
                "-v" | "--verbose" => verbose = true,
                "--material" => {
                    let name = cursor.value("--material")?;
                    material = Material::lookup(&name).ok_or(ArgError::UnknownMaterial(name))?;
                }
                "--out" => out = PathBuf::from(cursor.value("--out")?),
                flag if flag.starts_with('-') => return Err(ArgError::UnknownOption(arg)),
                _ => return Err(ArgError::UnexpectedArgument(arg)),
            }
        }

        Ok(Parsed::Run(Self {
            material,
            out,
            pose,
            verbose,
        }))
    }
}
