/// View-level orchestration: gestures, visibility and model selection
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use nalgebra::Vector2;
use tracing::debug;

use crate::catalog::{ModelCatalog, ModelDescriptor};
use crate::config::RotatorConfig;
use crate::error::{Result, RotatorError};
use crate::orientation::OrientationIntegrator;
use crate::renderer::{ModelBackend, ModelRenderer, RenderingState};
use crate::surface::RenderSurface;

/// Exponential moving average over the samples of one drag.
///
/// A smoothing factor of 1 passes every sample through unchanged.
#[derive(Debug, Clone)]
pub struct GestureFilter {
    smoothing: f32,
    current: Option<Vector2<f32>>,
}

impl GestureFilter {
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            current: None,
        }
    }

    pub fn push(&mut self, sample: Vector2<f32>) -> Vector2<f32> {
        let next = match self.current {
            Some(current) if self.smoothing < 1.0 => {
                let blended = sample * self.smoothing + current * (1.0 - self.smoothing);
                // Near f32::MAX the blend can round up to infinity
                if blended.iter().all(|c| c.is_finite()) {
                    blended
                } else {
                    sample
                }
            }
            _ => sample,
        };
        self.current = Some(next);
        next
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// An open model picker.
///
/// The picker UI answers through `choose`, which consumes the request, so a
/// user choice produces exactly one notification. Dropping the request
/// cancels the picker.
#[derive(Debug)]
pub struct PickerRequest {
    current: Arc<ModelDescriptor>,
    sender: Sender<Arc<ModelDescriptor>>,
}

impl PickerRequest {
    /// Category the picker should offer models from
    pub fn kind(&self) -> &str {
        &self.current.kind
    }

    pub fn current(&self) -> &Arc<ModelDescriptor> {
        &self.current
    }

    pub fn choose(self, model: Arc<ModelDescriptor>) {
        if self.sender.send(model).is_err() {
            debug!("picker choice arrived after the controller moved on");
        }
    }
}

/// Bridges raw gesture input and view visibility to a `ModelRenderer`.
pub struct RotationController<B: ModelBackend> {
    renderer: ModelRenderer<B>,
    surface: B::Surface,
    velocity_scale: f32,
    filter: GestureFilter,
    picks: Option<Receiver<Arc<ModelDescriptor>>>,
}

impl<B: ModelBackend> RotationController<B> {
    pub fn new(backend: B, surface: B::Surface, config: &RotatorConfig) -> Self {
        Self {
            renderer: ModelRenderer::new(backend, OrientationIntegrator::from_config(config)),
            surface,
            velocity_scale: config.velocity_scale,
            filter: GestureFilter::new(config.smoothing),
            picks: None,
        }
    }

    /// Build a controller and select `name` from `catalog`, or the catalog's
    /// first model if there is no such name.
    pub fn with_model(
        backend: B,
        surface: B::Surface,
        config: &RotatorConfig,
        catalog: &ModelCatalog,
        name: &str,
    ) -> Result<Self> {
        let model = catalog.resolve_or_first(name)?;
        let mut controller = Self::new(backend, surface, config);
        controller.select_model(model);
        Ok(controller)
    }

    pub fn state(&self) -> &RenderingState {
        self.renderer.state()
    }

    pub fn renderer(&self) -> &ModelRenderer<B> {
        &self.renderer
    }

    pub fn surface(&self) -> &B::Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut B::Surface {
        &mut self.surface
    }

    /// Feed one drag velocity sample, in screen units per second.
    ///
    /// The scaled sample replaces the current angular velocity and stays in
    /// effect after the drag ends.
    pub fn on_gesture_velocity_sample(&mut self, screen_velocity: Vector2<f32>) -> bool {
        if !screen_velocity.x.is_finite() || !screen_velocity.y.is_finite() {
            let err = RotatorError::InvalidVelocitySample {
                x: screen_velocity.x,
                y: screen_velocity.y,
            };
            debug!(%err, "ignoring gesture sample");
            return false;
        }
        let smoothed = self.filter.push(screen_velocity);
        // Saturate instead of overflowing so the clamp still sees a direction
        let scaled = smoothed.map(|c| (c * self.velocity_scale).clamp(-f32::MAX, f32::MAX));
        self.renderer.set_angular_velocity(scaled)
    }

    /// The drag is over. The spin carries on; the next drag starts a fresh average.
    pub fn on_gesture_ended(&mut self) {
        self.filter.clear();
    }

    pub fn stop_spin(&mut self) {
        self.renderer.set_angular_velocity(Vector2::zeros());
    }

    pub fn reset_orientation(&mut self) {
        self.renderer.reset();
    }

    pub fn on_became_visible(&mut self) {
        self.renderer.start(&mut self.surface);
    }

    pub fn on_became_hidden(&mut self) {
        self.renderer.stop(&mut self.surface);
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_running()
    }

    /// Load `model` unless it is already bound or on its way.
    ///
    /// Returns whether a load was started.
    pub fn select_model(&mut self, model: Arc<ModelDescriptor>) -> bool {
        if self.renderer.state().selected() == Some(&model) {
            debug!(model = %model.name, "model already selected");
            return false;
        }
        self.filter.clear();
        self.renderer.load_model(model);
        true
    }

    pub fn on_model_picked(&mut self, model: Arc<ModelDescriptor>) -> bool {
        self.select_model(model)
    }

    /// Open a picker scoped to the selected model's kind.
    ///
    /// Returns `None` while nothing is selected. Opening a new picker
    /// abandons any earlier one.
    pub fn open_picker(&mut self) -> Option<PickerRequest> {
        let current = Arc::clone(self.renderer.state().selected()?);
        let (sender, receiver) = mpsc::channel();
        self.picks = Some(receiver);
        Some(PickerRequest { current, sender })
    }

    /// Apply picker choices and finished loads.
    ///
    /// A failed load of the selected model is returned once.
    pub fn update(&mut self) -> Result<()> {
        if let Some(picks) = &self.picks {
            match picks.try_recv() {
                Ok(model) => {
                    self.picks = None;
                    self.on_model_picked(model);
                }
                Err(TryRecvError::Disconnected) => self.picks = None,
                Err(TryRecvError::Empty) => {}
            }
        }
        self.renderer.poll_loads()
    }

    /// Run the frame tick due at `now`, if the surface is running.
    ///
    /// Returns whether a model was drawn.
    pub fn render_frame(&mut self, now: Instant) -> bool {
        let renderer = &mut self.renderer;
        let mut drew = false;
        self.surface.on_frame_tick(now, |surface, tick| {
            drew = renderer.on_frame_tick(tick, surface);
        });
        drew
    }
}
