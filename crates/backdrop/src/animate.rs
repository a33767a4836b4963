use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::{AnimatorDriver, CanvasAnimator, MatrixRain, ParticleField, PixmapCanvas, SteppedClock};
use settings::{AnimateSection, AnimatorKind, BackdropSettings};
use tracing::{debug, info};

use crate::cli::AnimateArgs;

pub fn run(args: AnimateArgs, mut settings: BackdropSettings) -> Result<()> {
    apply_overrides(&mut settings.animate, &args);
    settings.validate().context("invalid animate options")?;
    let options = &settings.animate;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let written = match (options.animator, options.seed) {
        (AnimatorKind::Rain, Some(seed)) => export(MatrixRain::with_seed(seed), options, &args.out)?,
        (AnimatorKind::Rain, None) => export(MatrixRain::new(), options, &args.out)?,
        (AnimatorKind::Particles, Some(seed)) => {
            export(ParticleField::with_seed(seed), options, &args.out)?
        }
        (AnimatorKind::Particles, None) => export(ParticleField::new(), options, &args.out)?,
    };

    info!(
        animator = %options.animator,
        frames = written.len(),
        out = %args.out.display(),
        "exported animator frames"
    );
    Ok(())
}

fn apply_overrides(options: &mut AnimateSection, args: &AnimateArgs) {
    if let Some(animator) = args.animator {
        options.animator = animator.into();
    }
    if let Some(frames) = args.frames {
        options.frames = frames;
    }
    if let Some(interval) = args.interval {
        options.frame_interval = interval;
    }
    if let Some(size) = args.size {
        options.width = size.width;
        options.height = size.height;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
}

/// Drives `animator` from a stepped clock and saves every frame.
fn export<A: CanvasAnimator>(animator: A, options: &AnimateSection, out: &Path) -> Result<Vec<PathBuf>> {
    let canvas = PixmapCanvas::new(options.canvas_size()).context("failed to allocate canvas")?;
    let clock = SteppedClock::new(options.frame_interval.as_secs_f64() * 1000.0);
    let mut driver = AnimatorDriver::new(animator, canvas, clock, true);
    driver.mount();

    let mut written = Vec::new();
    for index in 0..options.frames {
        let Some((token, timestamp_ms)) = driver.clock_mut().take_pending() else {
            bail!("animator stopped requesting frames after {index} frame(s)");
        };
        driver.on_frame(token, timestamp_ms);

        let path = out.join(format!("frame-{index:04}.png"));
        driver
            .canvas()
            .save_png(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), timestamp_ms, "frame written");
        written.push(path);
    }

    driver.unmount();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::SurfaceSize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn options(animator: AnimatorKind) -> AnimateSection {
        AnimateSection {
            animator,
            frames: 3,
            frame_interval: Duration::from_millis(40),
            width: 64,
            height: 48,
            seed: Some(7),
        }
    }

    #[test]
    fn writes_numbered_frames() {
        let root = TempDir::new().unwrap();
        let written = export(MatrixRain::with_seed(7), &options(AnimatorKind::Rain), root.path())
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(root.path().join("frame-0000.png").exists());
        assert!(root.path().join("frame-0002.png").exists());
    }

    #[test]
    fn particle_frames_export_too() {
        let root = TempDir::new().unwrap();
        let written = export(
            ParticleField::with_seed(3),
            &options(AnimatorKind::Particles),
            root.path(),
        )
        .unwrap();
        assert_eq!(written.len(), 3);
    }

    #[test]
    fn huge_frame_count_fails_on_first_write() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("missing");
        let mut options = options(AnimatorKind::Rain);
        options.frames = u32::MAX;

        let err = export(MatrixRain::with_seed(7), &options, &missing).unwrap_err();
        assert!(err.to_string().contains("frame-0000.png"), "{err:#}");
    }

    #[test]
    fn arguments_override_settings() {
        let mut section = AnimateSection::default();
        let args = AnimateArgs {
            out: PathBuf::from("frames"),
            animator: Some(crate::cli::AnimatorArg::Particles),
            frames: Some(5),
            interval: Some(Duration::from_millis(10)),
            size: Some(SurfaceSize::new(100, 50)),
            seed: Some(9),
        };
        apply_overrides(&mut section, &args);

        assert_eq!(section.animator, AnimatorKind::Particles);
        assert_eq!(section.frames, 5);
        assert_eq!(section.frame_interval, Duration::from_millis(10));
        assert_eq!(section.canvas_size(), SurfaceSize::new(100, 50));
        assert_eq!(section.seed, Some(9));
    }
}
