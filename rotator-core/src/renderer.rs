/// Binds a model to a render surface and spins it frame by frame
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::ModelDescriptor;
use crate::error::RotatorError;
use crate::orientation::{AngularVelocity, Orientation, OrientationIntegrator};
use crate::surface::{FrameTick, RenderSurface};

/// Identifies one `load_model` request. Later requests carry larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Outcome of a load reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<(), String>,
}

/// The drawing side: prepares model resources asynchronously and draws a
/// prepared model at a given orientation.
pub trait ModelBackend {
    type Surface: RenderSurface;

    /// Start preparing `model`. The outcome is reported later by `poll_completion`.
    fn begin_load(&mut self, ticket: LoadTicket, model: &ModelDescriptor);

    /// Next finished load, if any.
    fn poll_completion(&mut self) -> Option<LoadCompletion>;

    fn draw(
        &mut self,
        surface: &mut Self::Surface,
        model: &ModelDescriptor,
        orientation: &Orientation,
    );
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderingState {
    /// Nothing bound
    Unloaded,
    /// `target` is being prepared; `previous` stays on screen meanwhile
    Loading {
        target: Arc<ModelDescriptor>,
        ticket: LoadTicket,
        previous: Option<Arc<ModelDescriptor>>,
    },
    /// `model` is bound and spinning
    Done { model: Arc<ModelDescriptor> },
}

impl RenderingState {
    pub fn is_done(&self) -> bool {
        matches!(self, RenderingState::Done { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RenderingState::Loading { .. })
    }

    /// The model currently on screen
    pub fn displayed(&self) -> Option<&Arc<ModelDescriptor>> {
        match self {
            RenderingState::Unloaded => None,
            RenderingState::Loading { previous, .. } => previous.as_ref(),
            RenderingState::Done { model } => Some(model),
        }
    }

    /// The model that is bound, or will be once the pending load finishes
    pub fn selected(&self) -> Option<&Arc<ModelDescriptor>> {
        match self {
            RenderingState::Unloaded => None,
            RenderingState::Loading { target, .. } => Some(target),
            RenderingState::Done { model } => Some(model),
        }
    }
}

/// Owns the orientation of the bound model and issues one draw per frame tick.
#[derive(Debug)]
pub struct ModelRenderer<B: ModelBackend> {
    backend: B,
    state: RenderingState,
    integrator: OrientationIntegrator,
    last_ticket: u64,
}

impl<B: ModelBackend> ModelRenderer<B> {
    pub fn new(backend: B, integrator: OrientationIntegrator) -> Self {
        Self {
            backend,
            state: RenderingState::Unloaded,
            integrator,
            last_ticket: 0,
        }
    }

    pub fn state(&self) -> &RenderingState {
        &self.state
    }

    pub fn orientation(&self) -> &Orientation {
        self.integrator.orientation()
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        self.integrator.angular_velocity()
    }

    pub fn integrator(&self) -> &OrientationIntegrator {
        &self.integrator
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Ask the backend for `model` and move to `Loading`.
    ///
    /// Any load still pending is superseded; its completion will be ignored.
    pub fn load_model(&mut self, model: Arc<ModelDescriptor>) -> LoadTicket {
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);

        let previous = match std::mem::replace(&mut self.state, RenderingState::Unloaded) {
            RenderingState::Unloaded => None,
            RenderingState::Loading {
                target, previous, ..
            } => {
                debug!(superseded = %target.name, "dropping pending load");
                previous
            }
            RenderingState::Done { model } => Some(model),
        };

        info!(model = %model.name, ticket = ticket.0, "loading model");
        self.backend.begin_load(ticket, &model);
        self.state = RenderingState::Loading {
            target: model,
            ticket,
            previous,
        };
        ticket
    }

    /// Apply a finished load.
    ///
    /// Returns `Ok(false)` for completions of superseded requests, which leave
    /// the state untouched. A failed current load falls back to the model that
    /// was on screen before it and is reported as `ModelLoadFailure`.
    pub fn complete_load(&mut self, completion: LoadCompletion) -> Result<bool, RotatorError> {
        let (target, previous) = match std::mem::replace(&mut self.state, RenderingState::Unloaded)
        {
            RenderingState::Loading {
                target,
                ticket,
                previous,
            } if ticket == completion.ticket => (target, previous),
            other => {
                debug!(ticket = completion.ticket.0, "ignoring stale load completion");
                self.state = other;
                return Ok(false);
            }
        };

        match completion.result {
            Ok(()) => {
                info!(model = %target.name, "model ready");
                self.integrator.reset();
                self.state = RenderingState::Done { model: target };
                Ok(true)
            }
            Err(reason) => {
                warn!(model = %target.name, %reason, "model failed to load");
                self.state = match previous {
                    Some(model) => RenderingState::Done { model },
                    None => RenderingState::Unloaded,
                };
                Err(RotatorError::ModelLoadFailure {
                    model: target.name.clone(),
                    reason,
                })
            }
        }
    }

    /// Drain the backend's finished loads.
    ///
    /// Returns the failure of the current load, if it failed.
    pub fn poll_loads(&mut self) -> Result<(), RotatorError> {
        let mut failure = None;
        while let Some(completion) = self.backend.poll_completion() {
            if let Err(err) = self.complete_load(completion) {
                failure = Some(err);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Forward to the integrator. Ignored unless a model is bound and ready.
    pub fn set_angular_velocity(&mut self, velocity: AngularVelocity) -> bool {
        if !self.state.is_done() {
            debug!("no model ready, ignoring angular velocity");
            return false;
        }
        self.integrator.set_angular_velocity(velocity)
    }

    /// Back to identity orientation with no spin.
    pub fn reset(&mut self) {
        self.integrator.reset();
    }

    pub fn start(&mut self, surface: &mut B::Surface) {
        surface.start();
    }

    pub fn stop(&mut self, surface: &mut B::Surface) {
        surface.stop();
    }

    /// Advance and draw the bound model. Returns whether anything was drawn.
    ///
    /// While a load is pending the previous model keeps being drawn, frozen at
    /// its last orientation.
    pub fn on_frame_tick(&mut self, tick: FrameTick, surface: &mut B::Surface) -> bool {
        match &self.state {
            RenderingState::Done { model } => {
                self.integrator.advance(tick.dt_secs());
                self.backend
                    .draw(surface, model, self.integrator.orientation());
                true
            }
            RenderingState::Loading {
                previous: Some(model),
                ..
            } => {
                self.backend
                    .draw(surface, model, self.integrator.orientation());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Geometry;
    use crate::geometry::Shape;
    use crate::headless::{HeadlessBackend, HeadlessSurface};
    use nalgebra::Vector2;
    use std::path::PathBuf;
    use std::time::Duration;

    fn model(name: &str) -> Arc<ModelDescriptor> {
        Arc::new(ModelDescriptor::new(
            name,
            name.to_uppercase(),
            "primitive",
            Geometry::Builtin(Shape::Cube),
        ))
    }

    fn missing(name: &str) -> Arc<ModelDescriptor> {
        Arc::new(ModelDescriptor::new(
            name,
            name,
            "primitive",
            Geometry::Stl(PathBuf::from("/nonexistent/rotator/missing.stl")),
        ))
    }

    fn renderer() -> ModelRenderer<HeadlessBackend> {
        ModelRenderer::new(HeadlessBackend::new(), OrientationIntegrator::new(50.0, 0.0))
    }

    fn tick(ms: u64) -> FrameTick {
        FrameTick {
            dt: Duration::from_millis(ms),
            frame: 0,
        }
    }

    #[test]
    fn test_load_moves_through_loading_to_done() {
        let mut renderer = renderer();
        let ticket = renderer.load_model(model("a"));
        assert!(renderer.state().is_loading());
        assert_eq!(renderer.backend().requests(), [(ticket, "a".to_string())]);

        renderer.poll_loads().unwrap();
        assert_eq!(renderer.state(), &RenderingState::Done { model: model("a") });
    }

    #[test]
    fn test_swap_resets_orientation() {
        let mut renderer = renderer();
        let mut surface = HeadlessSurface::new();
        renderer.load_model(model("a"));
        renderer.poll_loads().unwrap();
        renderer.set_angular_velocity(Vector2::new(3.0, 1.0));
        renderer.on_frame_tick(tick(500), &mut surface);
        assert_ne!(*renderer.orientation(), Orientation::identity());

        renderer.load_model(model("b"));
        renderer.poll_loads().unwrap();
        assert_eq!(*renderer.orientation(), Orientation::identity());
        assert_eq!(renderer.angular_velocity(), AngularVelocity::zeros());
    }

    #[test]
    fn test_superseded_completion_is_ignored() {
        let mut renderer = renderer();
        let first = renderer.load_model(model("a"));
        let second = renderer.load_model(model("b"));

        let applied = renderer
            .complete_load(LoadCompletion {
                ticket: first,
                result: Ok(()),
            })
            .unwrap();
        assert!(!applied);
        assert!(renderer.state().is_loading());

        let applied = renderer
            .complete_load(LoadCompletion {
                ticket: second,
                result: Ok(()),
            })
            .unwrap();
        assert!(applied);
        assert_eq!(renderer.state().displayed(), Some(&model("b")));
    }

    #[test]
    fn test_late_failure_of_superseded_load_is_ignored() {
        let mut renderer = renderer();
        let first = renderer.load_model(model("a"));
        renderer.load_model(model("b"));
        renderer.poll_loads().unwrap();

        let result = renderer.complete_load(LoadCompletion {
            ticket: first,
            result: Err("late".into()),
        });
        assert!(matches!(result, Ok(false)));
        assert_eq!(renderer.state(), &RenderingState::Done { model: model("b") });
    }

    #[test]
    fn test_failure_without_previous_model_unloads() {
        let mut renderer = renderer();
        renderer.load_model(missing("ghost"));

        let err = renderer.poll_loads().unwrap_err();
        assert!(matches!(err, RotatorError::ModelLoadFailure { ref model, .. } if model == "ghost"));
        assert_eq!(renderer.state(), &RenderingState::Unloaded);
    }

    #[test]
    fn test_failure_keeps_previous_model_and_orientation() {
        let mut renderer = renderer();
        let mut surface = HeadlessSurface::new();
        renderer.load_model(model("a"));
        renderer.poll_loads().unwrap();
        renderer.set_angular_velocity(Vector2::new(1.0, 0.0));
        renderer.on_frame_tick(tick(250), &mut surface);
        let spun = *renderer.orientation();

        renderer.load_model(missing("ghost"));
        assert!(renderer.poll_loads().is_err());
        assert_eq!(renderer.state(), &RenderingState::Done { model: model("a") });
        assert_eq!(*renderer.orientation(), spun);
    }

    #[test]
    fn test_velocity_ignored_until_done() {
        let mut renderer = renderer();
        assert!(!renderer.set_angular_velocity(Vector2::new(1.0, 1.0)));
        renderer.load_model(model("a"));
        assert!(!renderer.set_angular_velocity(Vector2::new(1.0, 1.0)));
        assert_eq!(renderer.angular_velocity(), AngularVelocity::zeros());

        renderer.poll_loads().unwrap();
        assert!(renderer.set_angular_velocity(Vector2::new(1.0, 1.0)));
    }

    #[test]
    fn test_tick_draws_only_with_a_model_on_screen() {
        let mut renderer = renderer();
        let mut surface = HeadlessSurface::new();
        assert!(!renderer.on_frame_tick(tick(16), &mut surface));

        renderer.load_model(model("a"));
        assert!(!renderer.on_frame_tick(tick(16), &mut surface));
        renderer.poll_loads().unwrap();
        assert!(renderer.on_frame_tick(tick(16), &mut surface));

        // The old model stays on screen while the next one loads
        renderer.load_model(model("b"));
        assert!(renderer.on_frame_tick(tick(16), &mut surface));
        assert_eq!(renderer.backend().draw_count(), 2);
        assert_eq!(renderer.backend().last_draw().unwrap().0, "a");
    }

    #[test]
    fn test_start_stop_toggle_the_surface() {
        let mut renderer = renderer();
        let mut surface = HeadlessSurface::new();
        renderer.start(&mut surface);
        renderer.start(&mut surface);
        assert!(surface.is_running());
        renderer.stop(&mut surface);
        renderer.stop(&mut surface);
        assert!(!surface.is_running());
    }
}
