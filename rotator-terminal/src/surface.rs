/// Terminal render surface: a character canvas on a frame timeline
use std::io::Write;
use std::time::Instant;

use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use rotator_core::{FrameClock, FrameTick, RenderSurface};
use tracing::debug;

use crate::renderer::AsciiRenderer;

/// Rows kept free at the top of the screen for the status line
const HEADER_ROWS: u16 = 1;

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 0.5;

pub struct TerminalSurface {
    clock: FrameClock,
    canvas: AsciiRenderer,
}

impl TerminalSurface {
    /// Surface for a terminal of `columns` x `rows` cells
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            clock: FrameClock::new(),
            canvas: AsciiRenderer::new(columns as usize, canvas_rows(rows)),
        }
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        debug!(columns, rows, "terminal resized");
        self.canvas.resize(columns as usize, canvas_rows(rows));
    }

    pub fn canvas(&self) -> &AsciiRenderer {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut AsciiRenderer {
        &mut self.canvas
    }

    /// Width over height of the canvas as seen on screen
    pub fn aspect(&self) -> f32 {
        let height = self.canvas.height().max(1) as f32 / CELL_ASPECT;
        self.canvas.width().max(1) as f32 / height
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Queue the status line, the canvas (if `with_canvas`), then `overlay`
    /// lines drawn over the top-left of the canvas.
    pub fn present<W: Write>(
        &self,
        out: &mut W,
        status: &str,
        with_canvas: bool,
        overlay: &[String],
    ) -> std::io::Result<()> {
        if with_canvas {
            self.canvas.draw(out, HEADER_ROWS)?;
        } else {
            out.queue(MoveTo(0, HEADER_ROWS))?;
            out.queue(Clear(ClearType::FromCursorDown))?;
        }

        out.queue(MoveTo(0, 0))?;
        out.queue(Clear(ClearType::CurrentLine))?;
        out.queue(SetForegroundColor(Color::Yellow))?;
        out.queue(Print(fit(status, self.canvas.width())))?;

        for (i, line) in overlay.iter().enumerate() {
            out.queue(MoveTo(1, HEADER_ROWS + 1 + i as u16))?;
            out.queue(SetBackgroundColor(Color::DarkBlue))?;
            out.queue(SetForegroundColor(Color::White))?;
            out.queue(Print(fit(line, self.canvas.width().saturating_sub(2))))?;
        }
        out.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSurface for TerminalSurface {
    fn start(&mut self) {
        if self.clock.start() {
            debug!("terminal surface started");
        }
    }

    fn stop(&mut self) {
        if self.clock.stop() {
            debug!("terminal surface stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    fn poll_tick(&mut self, now: Instant) -> Option<FrameTick> {
        self.clock.tick(now)
    }
}

fn canvas_rows(rows: u16) -> usize {
    rows.saturating_sub(HEADER_ROWS) as usize
}

fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_leaves_room_for_status() {
        let surface = TerminalSurface::new(80, 24);
        assert_eq!(surface.canvas().width(), 80);
        assert_eq!(surface.canvas().height(), 23);
    }

    #[test]
    fn test_aspect_accounts_for_tall_cells() {
        let surface = TerminalSurface::new(80, 41);
        assert!((surface.aspect() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_present_writes_status() {
        let surface = TerminalSurface::new(20, 5);
        let mut out = Vec::new();
        surface
            .present(&mut out, "Cube ▾", true, &["1. Cube".to_string()])
            .unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Cube ▾"));
        assert!(text.contains("1. Cube"));
    }

    #[test]
    fn test_ticks_only_while_started() {
        let mut surface = TerminalSurface::new(10, 5);
        let now = Instant::now();
        assert!(surface.poll_tick(now).is_none());
        surface.start();
        assert!(surface.poll_tick(now).is_some());
        surface.stop();
        assert!(surface.poll_tick(now).is_none());
        assert_eq!(surface.frames(), 1);
    }
}
