//! Opens a model in the interactive terminal viewer.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use meshview_cli::args::ViewerArgs;
use meshview_cli::{ArgCursor, ArgError, Parsed};
use meshview_core::{Backend, RenderConfig};

const USAGE: &str = "Usage: viewer <path_to_model> [--ansi] [-v|--verbose]";

fn main() -> ExitCode {
    let args = match ViewerArgs::parse(ArgCursor::from_env()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(ArgError::MissingPath) => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
        Err(err) => return meshview_cli::usage_error(&err, USAGE),
    };
    meshview_cli::init_logging(args.verbose);

    if !args.path.exists() {
        eprintln!("File not found: {}", args.path.display());
        return ExitCode::FAILURE;
    }

    meshview_cli::finish(run(&args))
}

fn run(args: &ViewerArgs) -> anyhow::Result<()> {
    let config = RenderConfig {
        color_mode: args.color_mode,
        title: format!("CAD Viewer - {}", basename(&args.path)),
        ..RenderConfig::default()
    };
    let mut renderer = meshview_cli::build_renderer(Backend::Interactive, config);
    renderer
        .load(&args.path)
        .with_context(|| format!("could not open {}", args.path.display()))?;
    renderer.render()?;
    Ok(())
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
