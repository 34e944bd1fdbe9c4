use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nalgebra::{Vector2, Vector3};
use rotator_core::{
    AngularVelocity, Geometry, HeadlessBackend, HeadlessSurface, ModelCatalog, ModelDescriptor,
    Orientation, RenderingState, RotationController, RotatorConfig, RotatorError,
};

type Controller = RotationController<HeadlessBackend>;

fn config() -> RotatorConfig {
    RotatorConfig {
        velocity_scale: 1.0,
        max_angular_speed: 100.0,
        ..RotatorConfig::default()
    }
}

fn controller(name: &str) -> Controller {
    RotationController::with_model(
        HeadlessBackend::new(),
        HeadlessSurface::new(),
        &config(),
        &ModelCatalog::builtin(),
        name,
    )
    .unwrap()
}

fn ready(name: &str) -> Controller {
    let mut controller = controller(name);
    controller.update().unwrap();
    controller.on_became_visible();
    controller
}

fn model(catalog_name: &str) -> Arc<ModelDescriptor> {
    Arc::clone(ModelCatalog::builtin().find(catalog_name).unwrap())
}

fn unknown() -> Arc<ModelDescriptor> {
    Arc::new(ModelDescriptor::new(
        "unknown",
        "Unknown",
        "primitive",
        Geometry::Stl(PathBuf::from("/nonexistent/rotator/unknown.stl")),
    ))
}

fn spin(controller: &mut Controller, t0: Instant) {
    controller.on_gesture_velocity_sample(Vector2::new(2.0, 1.0));
    controller.render_frame(t0);
    controller.render_frame(t0 + Duration::from_millis(400));
}

#[test]
fn default_selection_reaches_done_at_identity() {
    let mut controller = controller("123");
    assert!(controller.state().is_loading());

    controller.update().unwrap();
    assert_eq!(
        controller.state(),
        &RenderingState::Done { model: model("cube") }
    );
    assert_eq!(*controller.renderer().orientation(), Orientation::identity());
}

#[test]
fn last_sample_wins_and_rotation_accumulates() {
    let mut controller = ready("cube");
    let t0 = Instant::now();
    controller.render_frame(t0);

    let samples = [
        Vector2::new(5.0, 0.0),
        Vector2::new(5.0, 0.0),
        Vector2::new(0.0, 5.0),
    ];
    for (i, sample) in samples.into_iter().enumerate() {
        controller.on_gesture_velocity_sample(sample);
        assert!(controller.render_frame(t0 + Duration::from_secs(i as u64 + 1)));
    }

    assert_eq!(controller.renderer().angular_velocity(), Vector2::new(0.0, 5.0));

    // Horizontal samples turn about +y, vertical ones about +x
    let yaw = Orientation::from_scaled_axis(Vector3::new(0.0, 5.0, 0.0));
    let pitch = Orientation::from_scaled_axis(Vector3::new(5.0, 0.0, 0.0));
    let expected = pitch * yaw * yaw;
    assert!(controller.renderer().orientation().angle_to(&expected) < 1e-4);
}

#[test]
fn failed_load_keeps_previous_model_and_reports_once() {
    let mut controller = ready("cube");
    assert!(controller.select_model(unknown()));
    assert!(controller.state().is_loading());

    let err = controller.update().unwrap_err();
    assert!(matches!(
        err,
        RotatorError::ModelLoadFailure { ref model, .. } if model == "unknown"
    ));
    assert_eq!(
        controller.state(),
        &RenderingState::Done { model: model("cube") }
    );

    assert!(controller.update().is_ok());
}

#[test]
fn hidden_controller_renders_nothing_and_resumes_where_it_left_off() {
    let mut controller = ready("cube");
    let t0 = Instant::now();
    spin(&mut controller, t0);
    let committed = *controller.renderer().orientation();
    let draws = controller.renderer().backend().draw_count();
    assert_ne!(committed, Orientation::identity());

    controller.on_became_hidden();
    for i in 0..5 {
        controller.on_gesture_velocity_sample(Vector2::new(i as f32, -3.0));
        assert!(!controller.render_frame(t0 + Duration::from_secs(1 + i)));
    }
    assert_eq!(controller.renderer().backend().draw_count(), draws);

    controller.on_became_visible();
    assert!(controller.render_frame(t0 + Duration::from_secs(30)));
    assert_eq!(*controller.renderer().orientation(), committed);
    assert_eq!(controller.renderer().backend().draw_count(), draws + 1);
}

#[test]
fn selecting_the_same_model_twice_loads_once() {
    let mut controller = ready("cube");
    assert!(controller.select_model(model("octahedron")));
    assert!(!controller.select_model(model("octahedron")));
    controller.update().unwrap();
    assert!(!controller.select_model(model("octahedron")));

    let requests: Vec<_> = controller
        .renderer()
        .backend()
        .requests()
        .iter()
        .map(|(_, name)| name.as_str())
        .collect();
    assert_eq!(requests, ["cube", "octahedron"]);
}

#[test]
fn swapping_models_clears_spin() {
    let mut controller = ready("cube");
    spin(&mut controller, Instant::now());
    assert_ne!(controller.renderer().angular_velocity(), AngularVelocity::zeros());

    controller.select_model(model("octahedron"));
    controller.update().unwrap();
    assert_eq!(*controller.renderer().orientation(), Orientation::identity());
    assert_eq!(controller.renderer().angular_velocity(), AngularVelocity::zeros());
}

#[test]
fn superseded_success_is_not_applied() {
    let mut controller = ready("cube");
    controller.select_model(model("octahedron"));
    controller.select_model(unknown());

    assert!(controller.update().is_err());
    assert_eq!(
        controller.state(),
        &RenderingState::Done { model: model("cube") }
    );
}
