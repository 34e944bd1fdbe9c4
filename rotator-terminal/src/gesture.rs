/// Turns mouse drags over the terminal into screen velocity samples
use std::time::{Duration, Instant};

use nalgebra::Vector2;

/// Approximate size of one terminal cell in pixels
pub const CELL_WIDTH_PX: f32 = 8.0;
pub const CELL_HEIGHT_PX: f32 = 16.0;

/// Samples closer together than this are merged into the next one
const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
struct Anchor {
    column: u16,
    row: u16,
    at: Instant,
}

/// Tracks the button-down position of a mouse drag.
#[derive(Debug, Default)]
pub struct DragTracker {
    anchor: Option<Anchor>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn press(&mut self, column: u16, row: u16, at: Instant) {
        self.anchor = Some(Anchor { column, row, at });
    }

    /// Pointer moved with the button held. Returns the velocity in pixels
    /// per second since the last sample, `y` growing downwards.
    pub fn drag(&mut self, column: u16, row: u16, at: Instant) -> Option<Vector2<f32>> {
        let Some(anchor) = self.anchor else {
            // Drag without a press, e.g. the press landed outside the window
            self.press(column, row, at);
            return None;
        };

        let elapsed = at.saturating_duration_since(anchor.at);
        if elapsed < MIN_SAMPLE_INTERVAL {
            return None;
        }

        let dx = (column as f32 - anchor.column as f32) * CELL_WIDTH_PX;
        let dy = (row as f32 - anchor.row as f32) * CELL_HEIGHT_PX;
        self.anchor = Some(Anchor { column, row, at });
        Some(Vector2::new(dx, dy) / elapsed.as_secs_f32())
    }

    /// Button released. Returns whether a drag was in progress.
    pub fn release(&mut self) -> bool {
        self.anchor.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_in_pixels_per_second() {
        let t0 = Instant::now();
        let mut drag = DragTracker::new();
        drag.press(10, 10, t0);

        let v = drag.drag(15, 8, t0 + Duration::from_millis(100)).unwrap();
        assert!((v.x - 400.0).abs() < 1e-2);
        assert!((v.y + 320.0).abs() < 1e-2);
    }

    #[test]
    fn test_rapid_events_are_merged() {
        let t0 = Instant::now();
        let mut drag = DragTracker::new();
        drag.press(0, 0, t0);
        assert!(drag.drag(1, 0, t0 + Duration::from_millis(2)).is_none());

        // Measured from the press, not from the dropped event
        let v = drag.drag(2, 0, t0 + Duration::from_millis(20)).unwrap();
        assert!((v.x - 800.0).abs() < 1e-2);
    }

    #[test]
    fn test_drag_without_press_starts_tracking() {
        let t0 = Instant::now();
        let mut drag = DragTracker::new();
        assert!(drag.drag(3, 3, t0).is_none());
        assert!(drag.is_dragging());
        assert!(drag.drag(4, 3, t0 + Duration::from_millis(50)).is_some());
    }

    #[test]
    fn test_release() {
        let mut drag = DragTracker::new();
        assert!(!drag.release());
        drag.press(0, 0, Instant::now());
        assert!(drag.release());
        assert!(!drag.is_dragging());
    }
}
