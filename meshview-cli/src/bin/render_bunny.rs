//! Renders the Stanford bunny offscreen with a metal preset.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use meshview_cli::args::BunnyArgs;
use meshview_cli::{ArgCursor, Parsed};
use meshview_core::constants::{BUNNY_FILE, BUNNY_URL};
use meshview_core::{Backend, RenderConfig};

const USAGE: &str = "\
Usage: render_bunny [options]

Render the Stanford Bunny with a metal material.

Options:
  --material <name>      iron (default), aluminum or nickel
  --out <path>           Output image path [default: bunny.png]
  --translate <X Y Z>    Translate the model
  --rotate <RX RY RZ>    Rotate the model, in degrees
  -v, --verbose          Log download and render progress
  -h, --help             Show this help";

fn main() -> ExitCode {
    let args = match BunnyArgs::parse(ArgCursor::from_env()) {
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

fn run(args: BunnyArgs) -> anyhow::Result<()> {
    let model = meshview_cli::ensure_sample(BUNNY_URL, Path::new(BUNNY_FILE))?;

    let config = RenderConfig {
        out_path: args.out.clone(),
        ..RenderConfig::default()
    };
    let mut renderer = meshview_cli::build_renderer(Backend::Offscreen, config);
    renderer
        .load(&model)
        .with_context(|| format!("could not open {}", model.display()))?;
    renderer.set_pose(args.pose.pose());
    renderer.set_material(Some(args.material));
    renderer.render()?;

    println!("Saved {} with {} material", args.out.display(), args.material);
    Ok(())
}
