use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::host::{GraphicsContext, HostSurface};
use crate::types::ContextStrategies;

/// Acquires a drawing context, trying each strategy in order.
///
/// The first API name the surface accepts wins. When none do, the error lists
/// every name that was attempted.
pub fn probe<S>(
    surface: &mut S,
    strategies: &ContextStrategies,
) -> Result<Box<dyn GraphicsContext>, ProbeError>
where
    S: HostSurface + ?Sized,
{
    let mut attempted = Vec::new();
    for api in strategies.iter() {
        match surface.acquire_context(api) {
            Some(ctx) => {
                debug!(api, "acquired drawing context");
                return Ok(ctx);
            }
            None => {
                debug!(api, "drawing context unavailable");
                attempted.push(api.to_string());
            }
        }
    }

    let err = ProbeError::ContextUnavailable { attempted };
    warn!(error = %err, "capability probe failed");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;
    use crate::types::SurfaceSize;

    #[test]
    fn first_accepted_strategy_wins() {
        let mut surface = FakeSurface::new(SurfaceSize::new(800, 600)).accepting(&["primary", "gl"]);
        let ctx = probe(&mut surface, &ContextStrategies::default()).expect("context");
        assert_eq!(ctx.api(), "primary");
        assert_eq!(surface.acquire_attempts(), vec!["primary".to_string()]);
    }

    #[test]
    fn falls_back_to_legacy_name() {
        let mut surface = FakeSurface::new(SurfaceSize::new(800, 600)).accepting(&["gl"]);
        let ctx = probe(&mut surface, &ContextStrategies::default()).expect("context");
        assert_eq!(ctx.api(), "gl");
        assert_eq!(
            surface.acquire_attempts(),
            vec!["primary".to_string(), "gl".to_string()]
        );
    }

    #[test]
    fn reports_every_attempted_name() {
        let mut surface = FakeSurface::new(SurfaceSize::new(800, 600)).accepting(&[]);
        let strategies = ContextStrategies::new(["vulkan", "metal", "gl"]);
        let err = match probe(&mut surface, &strategies) {
            Ok(_) => panic!("no context should be available"),
            Err(err) => err,
        };
        assert_eq!(
            err,
            ProbeError::ContextUnavailable {
                attempted: vec!["vulkan".into(), "metal".into(), "gl".into()],
            }
        );
    }
}
