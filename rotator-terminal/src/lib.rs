/// Terminal front end: spin a model with the mouse or the keyboard
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self},
};
use nalgebra::Vector2;
use rotator_core::{ModelCatalog, RenderingState, RotationController, RotatorConfig};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod backend;
pub mod gesture;
pub mod picker;
pub mod renderer;
pub mod surface;

pub use backend::TerminalBackend;
pub use gesture::DragTracker;
pub use picker::{PickerOutcome, PickerOverlay};
pub use renderer::AsciiRenderer;
pub use surface::TerminalSurface;

/// Screen velocity injected by one arrow key press, in pixels per second
const FLICK_SPEED: f32 = 300.0;

/// How long a load failure stays on the status line
const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Main application struct for the terminal rotator
pub struct TerminalApp {
    controller: RotationController<TerminalBackend>,
    catalog: ModelCatalog,
    drag: DragTracker,
    picker: Option<PickerOverlay>,
    notice: Option<(String, Instant)>,
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Set up the controller for a terminal of `columns` x `rows` and start
    /// loading `model` (or the catalog's first model).
    pub fn new(
        config: &RotatorConfig,
        catalog: ModelCatalog,
        model: &str,
        columns: u16,
        rows: u16,
    ) -> rotator_core::Result<Self> {
        let controller = RotationController::with_model(
            TerminalBackend::new(),
            TerminalSurface::new(columns, rows),
            config,
            &catalog,
            model,
        )?;

        Ok(Self {
            controller,
            catalog,
            drag: DragTracker::new(),
            picker: None,
            notice: None,
            frame_time: Duration::from_secs(1) / config.target_fps.max(1),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn controller(&self) -> &RotationController<TerminalBackend> {
        &self.controller
    }

    pub fn picker(&self) -> Option<&PickerOverlay> {
        self.picker.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            EnableFocusChange
        )?;

        self.controller.on_became_visible();
        let result = self.main_loop();
        self.controller.on_became_hidden();

        // Cleanup
        execute!(
            stdout(),
            DisableFocusChange,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut stdout = stdout();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event, Instant::now());
            }

            self.tick(Instant::now());
            self.present(&mut stdout, Instant::now())?;

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(columns, rows) => self.controller.surface_mut().resize(columns, rows),
            Event::FocusGained => self.controller.on_became_visible(),
            Event::FocusLost => self.controller.on_became_hidden(),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(picker) = &mut self.picker {
            match picker.handle_key(key) {
                PickerOutcome::Open => {}
                PickerOutcome::Chosen(model) => {
                    info!(model = %model.name, "model picked");
                    self.picker = None;
                }
                PickerOutcome::Cancelled => self.picker = None,
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.flick(Vector2::new(0.0, -FLICK_SPEED)),
            KeyCode::Char('s') | KeyCode::Down => self.flick(Vector2::new(0.0, FLICK_SPEED)),
            KeyCode::Char('a') | KeyCode::Left => self.flick(Vector2::new(-FLICK_SPEED, 0.0)),
            KeyCode::Char('d') | KeyCode::Right => self.flick(Vector2::new(FLICK_SPEED, 0.0)),
            KeyCode::Char(' ') => self.controller.stop_spin(),
            KeyCode::Char('r') => self.controller.reset_orientation(),
            KeyCode::Char('m') => {
                self.picker = self
                    .controller
                    .open_picker()
                    .map(|request| PickerOverlay::new(request, &self.catalog));
            }
            KeyCode::Char('h') => {
                if self.controller.is_visible() {
                    self.controller.on_became_hidden();
                } else {
                    self.controller.on_became_visible();
                }
            }
            code => debug!(?code, "unbound key"),
        }
    }

    /// A keyboard flick is a one-sample gesture
    fn flick(&mut self, velocity: Vector2<f32>) {
        self.controller.on_gesture_velocity_sample(velocity);
        self.controller.on_gesture_ended();
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag.press(mouse.column, mouse.row, now);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(velocity) = self.drag.drag(mouse.column, mouse.row, now) {
                    self.controller.on_gesture_velocity_sample(velocity);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.drag.release() {
                    self.controller.on_gesture_ended();
                }
            }
            _ => {}
        }
    }

    /// Apply finished loads and draw the frame due at `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Err(err) = self.controller.update() {
            warn!(%err, "showing load failure");
            self.notice = Some((err.to_string(), now));
        }

        let drew = self.controller.render_frame(now);
        if drew {
            self.frame_count += 1;
        }

        // Update FPS counter
        let since = now.saturating_duration_since(self.last_frame);
        if since.as_secs() >= 1 {
            self.fps = self.frame_count as f32 / since.as_secs_f32();
            self.frame_count = 0;
            self.last_frame = now;
        }
        drew
    }

    pub fn status_line(&self, now: Instant) -> String {
        let state = self.controller.state();
        let title = match state.displayed().or(state.selected()) {
            Some(model) => format!("{} ▾", model.label),
            None => "no model".to_string(),
        };
        let phase = match state {
            RenderingState::Unloaded => "unloaded",
            RenderingState::Loading { .. } => "loading",
            RenderingState::Done { .. } if !self.controller.is_visible() => "hidden",
            RenderingState::Done { .. } => "ready",
        };

        let tail = match &self.notice {
            Some((message, since)) if now.saturating_duration_since(*since) < NOTICE_DURATION => {
                message.clone()
            }
            _ => "drag/WASD spin  space stop  r reset  m models  h hide  q quit".to_string(),
        };
        format!("{title} | {phase} | FPS: {:.1} | {tail}", self.fps)
    }

    fn present<W: Write>(&self, out: &mut W, now: Instant) -> io::Result<()> {
        let overlay = self.picker.as_ref().map(PickerOverlay::lines).unwrap_or_default();
        self.controller.surface().present(
            out,
            &self.status_line(now),
            self.controller.is_visible(),
            &overlay,
        )?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use rotator_core::{AngularVelocity, Geometry, ModelDescriptor, Shape};
    use std::path::PathBuf;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn app(catalog: ModelCatalog) -> TerminalApp {
        let mut app = TerminalApp::new(&RotatorConfig::default(), catalog, "123", 40, 21).unwrap();
        app.controller.on_became_visible();
        app.tick(Instant::now());
        app
    }

    #[test]
    fn test_starts_on_first_model() {
        let app = app(ModelCatalog::builtin());
        assert!(app.controller().state().is_done());
        assert!(app.status_line(Instant::now()).starts_with("Cube ▾ | ready"));
    }

    #[test]
    fn test_arrow_key_flicks() {
        let mut app = app(ModelCatalog::builtin());
        app.handle_event(key(KeyCode::Right), Instant::now());
        let v = app.controller().renderer().angular_velocity();
        assert!((v - AngularVelocity::new(3.0, 0.0)).norm() < 1e-5);

        app.handle_event(key(KeyCode::Char(' ')), Instant::now());
        assert_eq!(app.controller().renderer().angular_velocity(), AngularVelocity::zeros());
    }

    #[test]
    fn test_mouse_drag_spins_and_keeps_spinning() {
        let mut app = app(ModelCatalog::builtin());
        let t0 = Instant::now();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 10, 10), t0);
        app.handle_event(
            mouse(MouseEventKind::Drag(MouseButton::Left), 15, 10),
            t0 + Duration::from_millis(100),
        );
        app.handle_event(
            mouse(MouseEventKind::Up(MouseButton::Left), 15, 10),
            t0 + Duration::from_millis(120),
        );

        let v = app.controller().renderer().angular_velocity();
        assert!((v - AngularVelocity::new(4.0, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_picker_swaps_model() {
        let mut app = app(ModelCatalog::builtin());
        app.handle_event(key(KeyCode::Char('m')), Instant::now());
        assert!(app.picker().is_some());

        app.handle_event(key(KeyCode::Char('2')), Instant::now());
        assert!(app.picker().is_none());
        app.tick(Instant::now());
        assert_eq!(app.controller().state().selected().unwrap().name, "octahedron");
        // Picker keys do not reach the main bindings
        assert!(app.is_running());
    }

    #[test]
    fn test_focus_and_hide_toggle_visibility() {
        let mut app = app(ModelCatalog::builtin());
        app.handle_event(Event::FocusLost, Instant::now());
        assert!(!app.controller().is_visible());
        assert!(!app.tick(Instant::now()));

        app.handle_event(key(KeyCode::Char('h')), Instant::now());
        assert!(app.controller().is_visible());
        app.handle_event(key(KeyCode::Char('h')), Instant::now());
        assert!(!app.controller().is_visible());
        app.handle_event(Event::FocusGained, Instant::now());
        assert!(app.tick(Instant::now()));
    }

    #[test]
    fn test_load_failure_notice_expires() {
        let catalog = ModelCatalog::new([
            ModelDescriptor::new("cube", "Cube", "primitive", Geometry::Builtin(Shape::Cube)),
            ModelDescriptor::new(
                "missing",
                "Missing",
                "primitive",
                Geometry::Stl(PathBuf::from("/nonexistent/rotator/missing.stl")),
            ),
        ]);
        let mut app = app(catalog);
        app.handle_event(key(KeyCode::Char('m')), Instant::now());
        app.handle_event(key(KeyCode::Char('2')), Instant::now());

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut failed_at = None;
        while failed_at.is_none() && Instant::now() < deadline {
            app.tick(Instant::now());
            if app.notice.is_some() {
                failed_at = Some(Instant::now());
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let failed_at = failed_at.unwrap();
        assert!(app.status_line(failed_at).contains("missing"));
        assert_eq!(app.controller().state().displayed().unwrap().name, "cube");
        assert!(app
            .status_line(failed_at + NOTICE_DURATION + Duration::from_millis(100))
            .contains("q quit"));
    }

    #[test]
    fn test_quit() {
        let mut app = app(ModelCatalog::builtin());
        app.handle_event(key(KeyCode::Char('q')), Instant::now());
        assert!(!app.is_running());
    }
}
