use super::*;
use crate::modes::{FinishAction, Mode, ModeNotification, ModeState};
use crate::test_support::Harness;

fn started(config: FreehandModeConfig) -> (Harness, Mode) {
    let mut h = Harness::default();
    let mut mode = Mode::from(FreehandMode::new(config));
    h.start(&mut mode);
    (h, mode)
}

fn auto_close(timeout: Duration) -> FreehandModeConfig {
    FreehandModeConfig { auto_close: true, auto_close_timeout: timeout, ..FreehandModeConfig::default() }
}

fn sketch_triangle(h: &mut Harness, mode: &mut Mode) {
    h.click(mode, 0.0, 0.0);
    h.move_to(mode, 0.5, 0.0);
    h.move_to(mode, 0.5, 0.5);
}

fn suppressed(mode: &Mode) -> bool {
    match mode {
        Mode::Freehand(m) => m.is_suppressed(),
        _ => false,
    }
}

// =============================================================
// Sampling
// =============================================================

#[test]
fn click_starts_shape_with_closing_marker() {
    let (mut h, mut mode) = started(FreehandModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    assert_eq!(h.shapes()[0].geometry.positions(), vec![[0.0, 0.0]; 4]);
    assert_eq!(h.guidance()[0].geometry, Geometry::point([0.0, 0.0]));
    assert_eq!(mode.state(), ModeState::Drawing);
}

#[test]
fn samples_respect_min_distance() {
    let (mut h, mut mode) = started(FreehandModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.move_to(&mut mode, 0.1, 0.0);
    assert_eq!(h.shapes()[0].geometry.positions(), vec![[0.0, 0.0]; 4]);

    h.move_to(&mut mode, 0.3, 0.0);
    assert_eq!(h.shapes()[0].geometry.positions(), vec![[0.0, 0.0], [0.3, 0.0], [0.3, 0.0], [0.0, 0.0]]);

    h.move_to(&mut mode, 0.3, 0.3);
    assert_eq!(
        h.shapes()[0].geometry.positions(),
        vec![[0.0, 0.0], [0.3, 0.0], [0.3, 0.3], [0.0, 0.0]]
    );
}

// =============================================================
// Closing
// =============================================================

#[test]
fn second_click_closes() {
    let (mut h, mut mode) = started(FreehandModeConfig::default());
    sketch_triangle(&mut h, &mut mode);
    h.click(&mut mode, 0.5, 0.5);

    let shape = &h.shapes()[0];
    assert_eq!(shape.geometry.positions(), vec![[0.0, 0.0], [0.5, 0.0], [0.5, 0.5], [0.0, 0.0]]);
    assert!(!shape.props().currently_drawing());
    assert!(h.guidance().is_empty());
    assert_eq!(h.notifications, vec![ModeNotification::Finish { id: shape.id.clone(), action: FinishAction::Draw }]);
    assert_eq!(mode.state(), ModeState::Started);
}

#[test]
fn closing_with_too_few_samples_discards() {
    let (mut h, mut mode) = started(FreehandModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.move_to(&mut mode, 0.5, 0.0);
    h.click(&mut mode, 0.5, 0.0);
    assert!(h.store.is_empty());
    assert!(h.notifications.is_empty());
}

#[test]
fn auto_close_when_returning_to_start() {
    let (mut h, mut mode) = started(auto_close(Duration::from_secs(60)));
    sketch_triangle(&mut h, &mut mode);
    h.move_to(&mut mode, 0.1, 0.1);

    assert_eq!(h.shapes().len(), 1);
    assert!(!h.shapes()[0].props().currently_drawing());
    assert!(!mode.is_drawing());
    assert!(suppressed(&mode));

    // The click that ends the gesture must not start a new shape.
    h.click(&mut mode, 0.1, 0.1);
    assert_eq!(h.store.len(), 1);
    assert!(!mode.is_drawing());
}

#[test]
fn auto_close_needs_to_leave_start_first() {
    let (mut h, mut mode) = started(auto_close(Duration::from_secs(60)));
    h.click(&mut mode, 0.0, 0.0);
    h.move_to(&mut mode, 0.25, 0.0);
    h.move_to(&mut mode, 0.25, 0.25);
    h.move_to(&mut mode, 0.0, 0.25);
    h.move_to(&mut mode, 0.05, 0.05);
    assert!(mode.is_drawing());
}

#[test]
fn suppression_expires() {
    let (mut h, mut mode) = started(auto_close(Duration::ZERO));
    sketch_triangle(&mut h, &mut mode);
    h.move_to(&mut mode, 0.1, 0.1);
    assert!(!suppressed(&mode));
    h.click(&mut mode, 3.0, 3.0);
    assert!(mode.is_drawing());
}

#[test]
fn cancel_clears_shape_and_suppression() {
    let (mut h, mut mode) = started(auto_close(Duration::from_secs(60)));
    sketch_triangle(&mut h, &mut mode);
    h.move_to(&mut mode, 0.1, 0.1);
    h.key_up(&mut mode, "Escape");
    assert!(!suppressed(&mode));

    h.click(&mut mode, 3.0, 3.0);
    h.key_up(&mut mode, "Escape");
    assert_eq!(h.store.len(), 1);
    assert!(!mode.is_drawing());
}

#[test]
fn timeout_serializes_as_millis() {
    let config = FreehandModeConfig { auto_close_timeout: Duration::from_millis(250), ..FreehandModeConfig::default() };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["auto_close_timeout"], serde_json::json!(250));
    let back: FreehandModeConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back.auto_close_timeout, Duration::from_millis(250));
}
