use tracing::debug;

use crate::host::{FrameClock, FrameToken};

/// Whether a frame request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No frame pending.
    Idle,
    /// Exactly one frame request outstanding under the given token.
    Scheduled(FrameToken),
}

/// Self-rescheduling frame loop over an injectable [`FrameClock`].
///
/// The scheduler only tracks the outstanding request. Callers run the frame
/// body between [`accept`](Self::accept) and [`reschedule`](Self::reschedule).
#[derive(Debug)]
pub struct FrameScheduler<C> {
    clock: C,
    state: SchedulerState,
}

impl<C: FrameClock> FrameScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn pending(&self) -> Option<FrameToken> {
        match self.state {
            SchedulerState::Idle => None,
            SchedulerState::Scheduled(token) => Some(token),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending().is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Requests the first frame when the gate is open.
    ///
    /// Stays Idle unless both `active` and `supported` hold. Already being
    /// Scheduled is left untouched, so at most one request is ever pending.
    pub fn activate(&mut self, active: bool, supported: bool) -> bool {
        if !(active && supported) {
            debug!(active, supported, "render gate closed; scheduler stays idle");
            return false;
        }
        if self.state == SchedulerState::Idle {
            let token = self.clock.request_frame();
            self.state = SchedulerState::Scheduled(token);
            debug!(token = token.0, "frame loop started");
        }
        true
    }

    /// Consumes the outstanding request if `token` is the one being waited on.
    ///
    /// Returns `false` for stale or unknown tokens, which callers must treat
    /// as a no-op.
    pub fn accept(&mut self, token: FrameToken) -> bool {
        if self.state == SchedulerState::Scheduled(token) {
            self.state = SchedulerState::Idle;
            true
        } else {
            debug!(token = token.0, "ignoring stale frame callback");
            false
        }
    }

    /// Requests the next frame after an accepted one.
    pub fn reschedule(&mut self) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Scheduled(self.clock.request_frame());
        }
    }

    /// Cancels the outstanding request, if any. Idempotent.
    pub fn deactivate(&mut self) {
        if let SchedulerState::Scheduled(token) = self.state {
            self.clock.cancel_frame(token);
            self.state = SchedulerState::Idle;
            debug!(token = token.0, "frame loop stopped");
        }
    }
}

/// Clock for offline rendering: requests are queued and handed out by
/// [`take_pending`](Self::take_pending) with a fixed timestamp step.
#[derive(Debug)]
pub struct SteppedClock {
    next: u64,
    pending: Option<FrameToken>,
    frame_ms: f64,
    elapsed_ms: f64,
}

impl SteppedClock {
    pub fn new(frame_ms: f64) -> Self {
        Self {
            next: 1,
            pending: None,
            frame_ms,
            elapsed_ms: 0.0,
        }
    }

    /// Takes the outstanding request along with its timestamp, advancing
    /// simulated time by one step.
    pub fn take_pending(&mut self) -> Option<(FrameToken, f64)> {
        let token = self.pending.take()?;
        self.elapsed_ms += self.frame_ms;
        Some((token, self.elapsed_ms))
    }
}

impl FrameClock for SteppedClock {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next);
        self.next += 1;
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}
