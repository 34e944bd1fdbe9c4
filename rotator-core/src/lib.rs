/// Rotator Core Library - interactive rotation of a single 3D model
///
/// Turns 2D drag velocity samples into a continuously integrated orientation,
/// and manages the model lifecycle (unloaded, loading, ready) and the
/// visible/hidden render loop around it. Drawing and model storage are left
/// to a `ModelBackend` and a `RenderSurface`.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod orientation;
pub mod projection;
pub mod renderer;
pub mod stl;
pub mod surface;

// Re-export commonly used types
pub use catalog::{Geometry, ModelCatalog, ModelDescriptor};
pub use config::RotatorConfig;
pub use controller::{GestureFilter, PickerRequest, RotationController};
pub use error::{Result, RotatorError};
pub use geometry::{Mesh, Shape, Triangle, Vertex};
pub use headless::{HeadlessBackend, HeadlessSurface};
pub use orientation::{AngularVelocity, Orientation, OrientationIntegrator, VelocityHandle};
pub use projection::Camera;
pub use renderer::{LoadCompletion, LoadTicket, ModelBackend, ModelRenderer, RenderingState};
pub use surface::{FrameClock, FrameTick, RenderSurface};
