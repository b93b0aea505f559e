//! Loads a model and hands it to the selected backend.

use std::process::ExitCode;

use anyhow::Context;
use log::info;
use meshview_cli::args::MultiViewerArgs;
use meshview_cli::{ArgCursor, Parsed};
use meshview_core::{Backend, RenderConfig};

const USAGE: &str = "\
Usage: multi_viewer <path> [options]

Options:
  --backend <name>       interactive (default) or offscreen;
                         open3d and pyassimp are accepted as aliases
  --translate <X Y Z>    Translate the model
  --rotate <RX RY RZ>    Rotate the model, in degrees
  --out <path>           Image written by the offscreen backend [default: render.png]
  --ansi                 Use the 16-color palette in the terminal
  -v, --verbose          Log load and render progress
  -h, --help             Show this help";

fn main() -> ExitCode {
    let args = match MultiViewerArgs::parse(ArgCursor::from_env()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(err) => return meshview_cli::usage_error(&err, USAGE),
    };
    meshview_cli::init_logging(args.verbose);
    meshview_cli::finish(run(args))
}

fn run(args: MultiViewerArgs) -> anyhow::Result<()> {
    let config = RenderConfig {
        color_mode: args.color_mode,
        out_path: args.out.clone(),
        title: args.path.display().to_string(),
        ..RenderConfig::default()
    };
    let mut renderer = meshview_cli::build_renderer(args.backend, config);
    renderer
        .load(&args.path)
        .with_context(|| format!("could not open {}", args.path.display()))?;
    renderer.set_pose(args.pose.pose());
    renderer.render()?;

    if args.backend == Backend::Offscreen {
        info!("saved {}", args.out.display());
    }
    Ok(())
}
