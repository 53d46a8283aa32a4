//! Entry point: load one OBJ mesh and show it with a user-supplied shader pair.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use asset::ShaderSources;
use corelib::{Camera, FrameTransforms};
use platform::{ViewerSetup, WindowConfig};
use renderer::AttributeBindings;

use crate::cli::CliArgs;

fn run(cli: CliArgs) -> Result<()> {
    let mesh = asset::obj::load_first_shape_from_path(&cli.obj_path)?;

    let sources = ShaderSources::from_files(&cli.vertex_shader, &cli.fragment_shader)?;
    let program = renderer::build_program(&sources).context("Shader program build failed")?;

    let window = WindowConfig::default();
    let camera = Camera::viewer_default(window.aspect());
    let transforms = FrameTransforms::untransformed(&camera);

    platform::run_viewer(ViewerSetup {
        window,
        backends: cli.backends,
        mesh,
        bindings: AttributeBindings::default(),
        program,
        transforms,
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // args_os: a non-UTF-8 OBJ path must not panic.
    let mut args = std::env::args_os();
    let program = args
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "meshview".to_string());
    let cli = match cli::parse_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", cli::usage(&program));
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Starting meshview. mesh={}, vs={}, fs={}, backends={:?}",
        cli.obj_path.display(),
        cli.vertex_shader.display(),
        cli.fragment_shader.display(),
        cli.backends
    );

    match run(cli) {
        Ok(()) => {
            log::info!("Graceful shutdown. Bye!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
