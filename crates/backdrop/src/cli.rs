use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use renderer::SurfaceSize;
use settings::AnimatorKind;

use crate::paths::ENV_CONFIG;

#[derive(Parser, Debug)]
#[command(
    name = "backdrop",
    author,
    version,
    about = "Procedural shader background renderer",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to `<config_dir>/backdrop.toml`.
    #[arg(long, global = true, env = ENV_CONFIG, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Overall layer strength in `[0, 1]`.
    #[arg(long, value_name = "VALUE")]
    pub intensity: Option<f32>,

    /// Comma separated layers to enable (grid, streams, network, scans, pointer-glow).
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub layers: Option<Vec<String>>,

    /// Graphics API to try, in order; repeat for fallbacks (primary, gl, vulkan, metal, dx12).
    #[arg(long = "api", value_name = "NAME")]
    pub apis: Vec<String>,

    /// Open the window with the background switched off (Space toggles it).
    #[arg(long)]
    pub inactive: bool,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive preview window (the default).
    Run,
    /// Compile and link shader stages offline, without a GPU.
    Check(CheckArgs),
    /// Render canvas animator frames to PNG files.
    Animate(AnimateArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Vertex stage GLSL file; the bundled stage when omitted.
    #[arg(long, value_name = "FILE")]
    pub vertex: Option<PathBuf>,

    /// Fragment stage GLSL file; the bundled stage when omitted.
    #[arg(long, value_name = "FILE")]
    pub fragment: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnimatorArg {
    Rain,
    Particles,
}

impl From<AnimatorArg> for AnimatorKind {
    fn from(value: AnimatorArg) -> Self {
        match value {
            AnimatorArg::Rain => AnimatorKind::Rain,
            AnimatorArg::Particles => AnimatorKind::Particles,
        }
    }
}

#[derive(Parser, Debug)]
pub struct AnimateArgs {
    /// Directory the numbered PNG frames are written to.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Animator to run.
    #[arg(long, value_enum)]
    pub animator: Option<AnimatorArg>,

    /// Number of frames to export.
    #[arg(long, value_name = "COUNT")]
    pub frames: Option<u32>,

    /// Simulated time between frames (e.g. `40ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Canvas size (e.g. `640x360`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<SurfaceSize>,

    /// Seed for a reproducible run.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{value}' must be non-zero"));
    }
    Ok(SurfaceSize::new(width, height))
}

pub fn parse_interval(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|err| format!("invalid duration '{value}': {err}"))?;
    if duration.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(duration)
}
