//! Shared plumbing for the `viewer`, `multi_viewer` and `render_bunny` binaries.

use std::process::ExitCode;

use meshview_core::{Backend, Dispatcher, RenderConfig, Renderer};
use meshview_offscreen::OffscreenRenderer;
use meshview_terminal::TerminalRenderer;

pub mod args;
pub mod sample;

pub use args::{ArgCursor, ArgError, Parsed};
pub use sample::ensure_sample;

/// Starts `env_logger`; `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// The dispatcher every binary loads through. With the `step` feature the
/// truck kernel is registered for STEP input.
pub fn dispatcher() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    #[cfg(feature = "step")]
    let dispatcher = dispatcher.with_kernel(Box::new(meshview_core::StepKernel::new()));
    dispatcher
}

/// Builds the renderer for `backend`, consuming the configuration.
pub fn build_renderer(backend: Backend, config: RenderConfig) -> Box<dyn Renderer> {
    match backend {
        Backend::Interactive => Box::new(TerminalRenderer::with_dispatcher(dispatcher(), config)),
        Backend::Offscreen => Box::new(OffscreenRenderer::with_dispatcher(dispatcher(), config)),
    }
}

/// Prints a command-line misuse with the usage text; status 2.
pub fn usage_error(err: &ArgError, usage: &str) -> ExitCode {
    eprintln!("error: {err}\n\n{usage}");
    ExitCode::from(2)
}

/// Maps a run result to the process status, printing the error chain.
pub fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
