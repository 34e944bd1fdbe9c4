/// ASCII drawing backend with background model loading
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use rotator_core::{
    Camera, Geometry, LoadCompletion, LoadTicket, Mesh, ModelBackend, ModelDescriptor, Orientation,
};
use tracing::{debug, warn};

use crate::surface::TerminalSurface;

type Loaded = (LoadTicket, String, Result<Mesh, String>);

/// Caches the meshes of the on-screen model and the latest request, keyed by
/// model name.
///
/// Builtin shapes complete on the next poll; STL files are read on a worker
/// thread so the frame loop never waits on the disk.
pub struct TerminalBackend {
    meshes: HashMap<String, Arc<Mesh>>,
    latest: Option<LoadTicket>,
    sender: Sender<Loaded>,
    receiver: Receiver<Loaded>,
    camera: Camera,
}

impl TerminalBackend {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            meshes: HashMap::new(),
            latest: None,
            sender,
            receiver,
            camera: Camera::default(),
        }
    }

    pub fn mesh(&self, name: &str) -> Option<&Arc<Mesh>> {
        self.meshes.get(name)
    }

    pub fn cached(&self) -> usize {
        self.meshes.len()
    }
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBackend for TerminalBackend {
    type Surface = TerminalSurface;

    fn begin_load(&mut self, ticket: LoadTicket, model: &ModelDescriptor) {
        self.latest = Some(ticket);
        let name = model.name.clone();
        match &model.geometry {
            Geometry::Builtin(shape) => {
                if self.sender.send((ticket, name, Ok(shape.mesh()))).is_err() {
                    debug!("load channel closed");
                }
            }
            geometry => {
                let geometry = geometry.clone();
                let sender = self.sender.clone();
                thread::spawn(move || {
                    let result = geometry.load().map_err(|err| err.to_string());
                    if sender.send((ticket, name, result)).is_err() {
                        debug!("backend gone before load finished");
                    }
                });
            }
        }
    }

    fn poll_completion(&mut self) -> Option<LoadCompletion> {
        let (ticket, name, result) = self.receiver.try_recv().ok()?;
        let result = match result {
            Ok(mesh) if mesh.is_empty() => Err("model has no triangles".to_string()),
            Ok(_) if Some(ticket) != self.latest => {
                debug!(model = %name, ticket = ticket.id(), "discarding superseded mesh");
                Ok(())
            }
            Ok(mesh) => {
                debug!(model = %name, triangles = mesh.triangles.len(), "mesh ready");
                // The new model replaces whatever was on screen
                self.meshes.clear();
                self.meshes.insert(name, Arc::new(mesh));
                Ok(())
            }
            Err(reason) => Err(reason),
        };
        Some(LoadCompletion { ticket, result })
    }

    fn draw(
        &mut self,
        surface: &mut TerminalSurface,
        model: &ModelDescriptor,
        orientation: &Orientation,
    ) {
        let aspect = surface.aspect();
        let canvas = surface.canvas_mut();
        canvas.clear();

        let Some(mesh) = self.meshes.get(&model.name) else {
            warn!(model = %model.name, "asked to draw a model that was never loaded");
            return;
        };

        self.camera.aspect = aspect;
        self.camera.frame_radius(mesh.bounding_radius());
        canvas.render_mesh(mesh, orientation, &self.camera);
    }
}
