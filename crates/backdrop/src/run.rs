use anyhow::{Context, Result};
use settings::BackdropSettings;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn run(args: RunArgs, mut settings: BackdropSettings) -> Result<()> {
    apply_overrides(&mut settings, args);
    settings.validate().context("invalid renderer options")?;
    let config = settings
        .to_renderer_config()
        .context("failed to resolve renderer configuration")?;

    info!(
        active = config.active,
        intensity = config.intensity,
        layers = config.layers.bits(),
        size = %config.surface_size,
        "starting preview"
    );
    renderer::run_preview(config)
}

fn apply_overrides(settings: &mut BackdropSettings, args: RunArgs) {
    if let Some(intensity) = args.intensity {
        settings.renderer.intensity = intensity;
    }
    if let Some(layers) = args.layers {
        settings.renderer.layers = layers;
    }
    if !args.apis.is_empty() {
        settings.renderer.apis = args.apis;
    }
    if args.inactive {
        settings.renderer.active = false;
    }
    if let Some(size) = args.size {
        settings.window.width = size.width;
        settings.window.height = size.height;
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
