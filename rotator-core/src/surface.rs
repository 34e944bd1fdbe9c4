/// Frame timeline shared by every render surface
use std::time::{Duration, Instant};

/// One invocation of the periodic render callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Wall-clock time since the previous tick on the same timeline
    pub dt: Duration,
    /// Ticks delivered since the surface was created
    pub frame: u64,
}

impl FrameTick {
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

/// Produces frame ticks while started, and nothing at all while stopped.
///
/// The first tick after `start` reports a zero `dt`, so time spent stopped is
/// never fed into the orientation.
#[derive(Debug, Default)]
pub struct FrameClock {
    running: bool,
    last: Option<Instant>,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the clock was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last = None;
        true
    }

    /// Returns `false` if the clock was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.last = None;
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(&mut self, now: Instant) -> Option<FrameTick> {
        if !self.running {
            return None;
        }
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        self.frames += 1;
        Some(FrameTick {
            dt,
            frame: self.frames,
        })
    }
}

/// A drawing surface that drives a periodic frame callback while started.
///
/// Implementations know nothing about rotation; they only own the timeline
/// and whatever the backend draws into.
pub trait RenderSurface {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Next tick on this surface's timeline, or `None` while stopped.
    fn poll_tick(&mut self, now: Instant) -> Option<FrameTick>;

    /// Run `callback` for the tick due at `now`, if any.
    ///
    /// Returns whether the callback ran. Never runs once `stop` has returned.
    fn on_frame_tick<F>(&mut self, now: Instant, callback: F) -> bool
    where
        Self: Sized,
        F: FnOnce(&mut Self, FrameTick),
    {
        match self.poll_tick(now) {
            Some(tick) => {
                callback(self, tick);
                true
            }
            None => false,
        }
    }
}
