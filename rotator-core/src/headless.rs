/// Output-free surface and backend for headless runs and tests
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::catalog::ModelDescriptor;
use crate::geometry::Mesh;
use crate::orientation::Orientation;
use crate::renderer::{LoadCompletion, LoadTicket, ModelBackend};
use crate::surface::{FrameClock, FrameTick, RenderSurface};

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    clock: FrameClock,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }
}

impl RenderSurface for HeadlessSurface {
    fn start(&mut self) {
        if self.clock.start() {
            debug!("headless surface started");
        }
    }

    fn stop(&mut self) {
        if self.clock.stop() {
            debug!("headless surface stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    fn poll_tick(&mut self, now: Instant) -> Option<FrameTick> {
        self.clock.tick(now)
    }
}

/// Loads geometry eagerly but only reports it on the next poll, so callers
/// see the same pending `Loading` window a threaded backend would give them.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    meshes: HashMap<String, Mesh>,
    finished: VecDeque<LoadCompletion>,
    requests: Vec<(LoadTicket, String)>,
    draw_count: u64,
    last_draw: Option<(String, Orientation)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load request received, oldest first
    pub fn requests(&self) -> &[(LoadTicket, String)] {
        &self.requests
    }

    pub fn pending(&self) -> usize {
        self.finished.len()
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.get(name)
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub fn last_draw(&self) -> Option<&(String, Orientation)> {
        self.last_draw.as_ref()
    }
}

impl ModelBackend for HeadlessBackend {
    type Surface = HeadlessSurface;

    fn begin_load(&mut self, ticket: LoadTicket, model: &ModelDescriptor) {
        self.requests.push((ticket, model.name.clone()));
        let result = match model.geometry.load() {
            Ok(mesh) => {
                self.meshes.insert(model.name.clone(), mesh);
                Ok(())
            }
            Err(err) => Err(err.to_string()),
        };
        self.finished.push_back(LoadCompletion { ticket, result });
    }

    fn poll_completion(&mut self) -> Option<LoadCompletion> {
        self.finished.pop_front()
    }

    fn draw(
        &mut self,
        _surface: &mut HeadlessSurface,
        model: &ModelDescriptor,
        orientation: &Orientation,
    ) {
        self.draw_count += 1;
        self.last_draw = Some((model.name.clone(), *orientation));
    }
}
