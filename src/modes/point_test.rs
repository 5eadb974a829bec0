use std::rc::Rc;

use super::*;
use crate::modes::Mode;
use crate::test_support::Harness;
use crate::validate::{ValidationContext, ValidationResult};

fn started(config: PointModeConfig) -> (Harness, Mode) {
    let mut h = Harness::default();
    let mut mode = Mode::from(PointMode::new(config));
    h.start(&mut mode);
    (h, mode)
}

#[test]
fn click_creates_point_and_finishes() {
    let (mut h, mut mode) = started(PointModeConfig::default());
    h.click(&mut mode, 1.0, 2.0);

    let shapes = h.shapes();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].geometry, Geometry::point([1.0, 2.0]));
    assert_eq!(shapes[0].props().mode(), Some("point"));
    assert_eq!(h.notifications, vec![ModeNotification::Finish { id: shapes[0].id.clone(), action: FinishAction::Draw }]);
    assert!(!mode.is_drawing());
}

#[test]
fn click_rounds_to_precision() {
    let (mut h, mut mode) = started(PointModeConfig::default());
    h.precision = 3;
    h.click(&mut mode, 1.234_56, 2.0);
    assert_eq!(h.shapes()[0].geometry, Geometry::point([1.235, 2.0]));
}

#[test]
fn invalid_coordinates_are_dropped() {
    let (mut h, mut mode) = started(PointModeConfig::default());
    h.click(&mut mode, 200.0, 0.0);
    assert!(h.store.is_empty());
    assert!(h.notifications.is_empty());
}

#[test]
fn custom_validation_can_reject() {
    let validation: Validation = Rc::new(|f: &Feature, _: &ValidationContext| {
        if f.geometry.positions()[0][0] < 0.0 {
            ValidationResult::invalid("west of the meridian")
        } else {
            ValidationResult::ok()
        }
    });
    let (mut h, mut mode) = started(PointModeConfig { validation: Some(validation), ..PointModeConfig::default() });
    h.click(&mut mode, -1.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert_eq!(h.store.len(), 1);
}

#[test]
fn snaps_to_existing_vertex() {
    let config = PointModeConfig {
        snapping: Snapping { to_coordinate: true, ..Snapping::default() },
        ..PointModeConfig::default()
    };
    let (mut h, mut mode) = started(config);
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 0.1, 0.1);
    let shapes = h.shapes();
    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes[1].geometry, Geometry::point([0.0, 0.0]));
}

#[test]
fn style_uses_shape_styles() {
    let styles = ShapeStyles { point_color: "#123456".into(), ..ShapeStyles::default() };
    let mode = Mode::from(PointMode::new(PointModeConfig { styles: styles.clone(), ..PointModeConfig::default() }));
    let feature = Feature {
        id: crate::geometry::FeatureId::from("p"),
        geometry: Geometry::point([0.0, 0.0]),
        properties: crate::geometry::Properties::new(),
    };
    assert_eq!(mode.style_feature(&feature), styles.shape());
}
