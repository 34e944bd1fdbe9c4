/// Orientation integration: angular velocity in, unit quaternion out
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use tracing::debug;

use crate::config::RotatorConfig;

/// Attitude of a model relative to its rest pose
pub type Orientation = UnitQuaternion<f32>;

/// Rotation rate in radians per second, expressed along the screen axes.
///
/// `x` is the horizontal drag rate and spins the model about the vertical
/// screen axis. `y` is the vertical drag rate and tilts the model about the
/// horizontal screen axis.
pub type AngularVelocity = Vector2<f32>;

/// Last-writer-wins storage for an angular velocity.
///
/// Both components share one atomic word, so a reader never observes half of
/// a write.
#[derive(Debug, Default)]
pub struct AngularVelocityCell {
    bits: AtomicU64,
}

impl AngularVelocityCell {
    pub fn new(velocity: AngularVelocity) -> Self {
        Self {
            bits: AtomicU64::new(pack(velocity)),
        }
    }

    pub fn load(&self) -> AngularVelocity {
        unpack(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, velocity: AngularVelocity) {
        self.bits.store(pack(velocity), Ordering::Release);
    }

    /// Replaces `current` with `new` unless another writer got in first.
    fn replace_if_unchanged(&self, current: AngularVelocity, new: AngularVelocity) {
        let _ = self.bits.compare_exchange(
            pack(current),
            pack(new),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

fn pack(velocity: AngularVelocity) -> u64 {
    ((velocity.x.to_bits() as u64) << 32) | velocity.y.to_bits() as u64
}

fn unpack(bits: u64) -> AngularVelocity {
    Vector2::new(
        f32::from_bits((bits >> 32) as u32),
        f32::from_bits(bits as u32),
    )
}

/// Limit `velocity` to `max_speed` rad/s, keeping its direction.
///
/// Returns `None` for samples with a non-finite component.
pub fn clamp_velocity(velocity: AngularVelocity, max_speed: f32) -> Option<AngularVelocity> {
    if !velocity.x.is_finite() || !velocity.y.is_finite() {
        return None;
    }

    let speed = velocity.norm();
    if speed <= max_speed {
        return Some(velocity);
    }

    // The norm of two huge finite components can overflow
    let direction = if speed.is_finite() {
        velocity / speed
    } else {
        let scaled = velocity / velocity.amax();
        scaled / scaled.norm()
    };
    Some(direction * max_speed)
}

/// Cloneable writer for the angular velocity of one integrator.
///
/// Gesture sources living on another thread write through this; the frame
/// tick picks the value up on its next `advance`.
#[derive(Debug, Clone)]
pub struct VelocityHandle {
    cell: Arc<AngularVelocityCell>,
    max_speed: f32,
}

impl VelocityHandle {
    /// Store a clamped sample. Non-finite samples are dropped and `false` is returned.
    pub fn set(&self, velocity: AngularVelocity) -> bool {
        match clamp_velocity(velocity, self.max_speed) {
            Some(clamped) => {
                self.cell.store(clamped);
                true
            }
            None => {
                debug!(x = velocity.x, y = velocity.y, "dropping non-finite angular velocity");
                false
            }
        }
    }

    pub fn get(&self) -> AngularVelocity {
        self.cell.load()
    }
}

/// Holds the current orientation and angular velocity of a model and moves the
/// former forward by the latter on every frame.
#[derive(Debug)]
pub struct OrientationIntegrator {
    orientation: Orientation,
    velocity: Arc<AngularVelocityCell>,
    max_speed: f32,
    damping: f32,
}

impl OrientationIntegrator {
    /// `max_speed` is the clamp threshold in rad/s, `damping` the exponential
    /// decay rate of the velocity per second (0 keeps spinning forever).
    pub fn new(max_speed: f32, damping: f32) -> Self {
        Self {
            orientation: Orientation::identity(),
            velocity: Arc::new(AngularVelocityCell::default()),
            max_speed: max_speed.max(0.0),
            damping: damping.max(0.0),
        }
    }

    pub fn from_config(config: &RotatorConfig) -> Self {
        Self::new(config.max_angular_speed, config.damping)
    }

    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        self.velocity.load()
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Replace the angular velocity, clamped to the configured maximum.
    ///
    /// Non-finite samples leave the previous velocity in place and return `false`.
    pub fn set_angular_velocity(&self, velocity: AngularVelocity) -> bool {
        self.velocity_handle().set(velocity)
    }

    pub fn velocity_handle(&self) -> VelocityHandle {
        VelocityHandle {
            cell: Arc::clone(&self.velocity),
            max_speed: self.max_speed,
        }
    }

    /// Rotate by the current angular velocity over `dt` seconds of wall-clock time.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let velocity = self.velocity.load();
        if velocity == AngularVelocity::zeros() {
            return;
        }

        // Horizontal drags turn about the vertical axis and vice versa
        let axis = Vector3::new(velocity.y, velocity.x, 0.0);
        let step = UnitQuaternion::from_scaled_axis(axis * dt);
        self.orientation = step * self.orientation;
        self.orientation.renormalize();

        if self.damping > 0.0 {
            let decayed = velocity * (-self.damping * dt).exp();
            self.velocity.replace_if_unchanged(velocity, decayed);
        }
    }

    /// Back to the rest pose with no spin.
    pub fn reset(&mut self) {
        self.orientation = Orientation::identity();
        self.velocity.store(AngularVelocity::zeros());
    }
}

impl Default for OrientationIntegrator {
    fn default() -> Self {
        Self::from_config(&RotatorConfig::default())
    }
}
