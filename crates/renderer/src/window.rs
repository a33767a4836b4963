use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::controller::BackdropController;
use crate::gpu::{backends_for, WgpuGraphics};
use crate::host::{FrameClock, FrameToken, GraphicsContext, HostSurface};
use crate::types::{RendererConfig, SurfaceSize};

/// Step applied to the intensity by the arrow keys.
const INTENSITY_STEP: f32 = 0.05;

/// Preview window as a [`HostSurface`]. Pointer positions arrive in window
/// coordinates, so the bounding rectangle sits at the origin.
pub struct WindowSurface {
    window: Arc<Window>,
}

impl WindowSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl HostSurface for WindowSurface {
    fn display_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn acquire_context(&mut self, api: &str) -> Option<Box<dyn GraphicsContext>> {
        let Some(backends) = backends_for(api) else {
            warn!(api, "unknown context strategy");
            return None;
        };
        match WgpuGraphics::new(api, Arc::clone(&self.window), self.display_size(), backends) {
            Ok(ctx) => Some(Box::new(ctx)),
            Err(err) => {
                warn!(api, error = %err, "failed to create drawing context");
                None
            }
        }
    }
}

/// Frame clock over winit redraw requests.
///
/// At most one token is outstanding; cancelling it means the next
/// `RedrawRequested` finds nothing to run.
pub struct RedrawClock {
    window: Arc<Window>,
    next: u64,
    pending: Cell<Option<FrameToken>>,
}

impl RedrawClock {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next: 0,
            pending: Cell::new(None),
        }
    }

    /// Claims the outstanding request for the redraw being processed.
    pub fn take_pending(&self) -> Option<FrameToken> {
        self.pending.take()
    }
}

impl FrameClock for RedrawClock {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending.set(Some(token));
        self.window.request_redraw();
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending.get() == Some(token) {
            self.pending.set(None);
        }
    }
}

/// Opens a preview window and drives a [`BackdropController`] from its
/// event loop until the window closes.
///
/// Space toggles the background, the up and down arrows adjust its
/// intensity, Escape quits.
pub fn run_preview(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window_size = PhysicalSize::new(config.surface_size.width, config.surface_size.height);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .with_transparent(true)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut controller = BackdropController::new(
        WindowSurface::new(Arc::clone(&window)),
        RedrawClock::new(Arc::clone(&window)),
        &config,
    );
    controller.mount();
    let state = controller.state();
    info!(
        active = state.active,
        supported = state.supported,
        "preview window ready"
    );

    let origin = Instant::now();
    let mut intensity = config.intensity;
    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            let Event::WindowEvent { window_id, event } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    controller.unmount();
                    elwt.exit();
                }
                WindowEvent::Resized(_) => controller.resized(),
                WindowEvent::CursorMoved { position, .. } => {
                    controller.pointer_moved(position.x as f32, position.y as f32);
                }
                WindowEvent::Occluded(occluded) => controller.set_visible(!occluded),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed || event.repeat {
                        return;
                    }
                    match event.logical_key {
                        Key::Named(NamedKey::Space) => {
                            let active = !controller.state().active;
                            controller.set_active(active);
                            info!(active, "toggled background");
                        }
                        Key::Named(NamedKey::ArrowUp) => {
                            intensity = (intensity + INTENSITY_STEP).min(1.0);
                            controller.set_intensity(intensity);
                        }
                        Key::Named(NamedKey::ArrowDown) => {
                            intensity = (intensity - INTENSITY_STEP).max(0.0);
                            controller.set_intensity(intensity);
                        }
                        Key::Named(NamedKey::Escape) => {
                            controller.unmount();
                            elwt.exit();
                        }
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Some(token) = controller.clock().take_pending() {
                        let timestamp_ms = origin.elapsed().as_secs_f64() * 1000.0;
                        controller.on_frame(token, timestamp_ms);
                    }
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
