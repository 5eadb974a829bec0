use super::*;
use crate::geometry::NewFeature;
use crate::test_support::{Harness, pointer};
use crate::validate::{Intrinsic, REASON_WRONG_GEOMETRY};

// =============================================================
// Lifecycle enforcement
// =============================================================

#[test]
fn input_before_register_is_rejected() {
    let mut h = Harness::default();
    let mut mode = Mode::from(PointMode::default());
    let mut ctx = h.ctx();
    assert_eq!(mode.on_click(&mut ctx, &pointer(0.0, 0.0)), Err(DrawError::ModeNotRegistered("point".into())));
    assert_eq!(mode.clean_up(&mut ctx), Err(DrawError::ModeNotRegistered("point".into())));
}

#[test]
fn input_before_start_is_rejected() {
    let mut h = Harness::default();
    let mut mode = Mode::from(PointMode::default());
    mode.register().unwrap();
    let mut ctx = h.ctx();
    assert_eq!(mode.on_mouse_move(&mut ctx, &pointer(0.0, 0.0)), Err(DrawError::ModeNotStarted("point".into())));
    assert_eq!(mode.register(), Err(DrawError::ModeAlreadyRegistered("point".into())));
}

#[test]
fn start_sets_mode_cursor() {
    let mut h = Harness::default();
    let mut polygon = Mode::from(PolygonMode::default());
    h.start(&mut polygon);
    assert_eq!(h.adapter.cursor, Cursor::Crosshair);
    assert_eq!(polygon.state(), ModeState::Started);

    let mut select = Mode::from(SelectMode::default());
    h.start(&mut select);
    assert_eq!(h.adapter.cursor, Cursor::Unset);
}

#[test]
fn stop_cleans_up_in_progress_shape() {
    let mut h = Harness::default();
    let mut mode = Mode::from(PolygonMode::default());
    h.start(&mut mode);
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert!(mode.is_drawing());
    assert!(!h.adapter.double_click_zoom);

    let mut ctx = h.ctx();
    mode.stop(&mut ctx).unwrap();
    assert!(h.store.is_empty());
    assert_eq!(mode.state(), ModeState::Stopped);
    assert_eq!(h.adapter.cursor, Cursor::Unset);
    assert!(h.adapter.double_click_zoom);
}

#[test]
fn stop_requires_active_mode() {
    let mut h = Harness::default();
    let mut mode = Mode::from(PointMode::default());
    mode.register().unwrap();
    let mut ctx = h.ctx();
    assert_eq!(mode.stop(&mut ctx), Err(DrawError::ModeNotStarted("point".into())));
}

// =============================================================
// Dispatch helpers
// =============================================================

#[test]
fn validate_feature_uses_finish_rules() {
    let mode = Mode::from(PolygonMode::default());
    let point = Feature {
        id: FeatureId::from("p"),
        geometry: Geometry::point([0.0, 0.0]),
        properties: crate::geometry::Properties::new(),
    };
    let result = mode.validate_feature(&point, 9);
    assert_eq!(result.reason.as_deref(), Some(REASON_WRONG_GEOMETRY));
}

#[test]
fn as_select_only_for_select_variant() {
    let mut select = Mode::from(SelectMode::default());
    let point = Mode::from(PointMode::default());
    assert!(select.as_select().is_some());
    assert!(select.as_select_mut().is_some());
    assert!(point.as_select().is_none());
    assert_eq!(select.name(), "select");
}

#[test]
fn key_events_default_to_escape_and_enter() {
    let keys = KeyEvents::default();
    assert_eq!(keys.cancel.as_deref(), Some("Escape"));
    assert_eq!(keys.finish.as_deref(), Some("Enter"));
    let parsed: KeyEvents = serde_json::from_str(r#"{"finish": null}"#).unwrap();
    assert_eq!(parsed.cancel.as_deref(), Some("Escape"));
    assert_eq!(parsed.finish, None);
}

// =============================================================
// ModeContext
// =============================================================

#[test]
fn apply_validated_rejects_without_touching_store() {
    let mut h = Harness::default();
    let ids = h.store.create(vec![NewFeature::owned_by("point", Geometry::point([0.0, 0.0]))]).unwrap();
    h.store.take_changes();
    let validator = FeatureValidator::new(Intrinsic::Point, None);
    let mut ctx = h.ctx();

    assert!(!ctx.apply_validated(&validator, &ids[0], Geometry::point([500.0, 0.0]), UpdateType::Provisional).unwrap());
    assert!(ctx.apply_validated(&validator, &ids[0], Geometry::point([1.0, 1.0]), UpdateType::Provisional).unwrap());
    assert_eq!(h.store.get_geometry_copy(&ids[0]).unwrap(), Geometry::point([1.0, 1.0]));
    assert_eq!(h.store.take_changes().len(), 1);
}

#[test]
fn finish_shape_drops_drawing_flag_and_notifies() {
    let mut h = Harness::default();
    let ids = h
        .store
        .create(vec![NewFeature::owned_by("point", Geometry::point([0.0, 0.0])).with_property(props::CURRENTLY_DRAWING, true)])
        .unwrap();
    let mut ctx = h.ctx();
    ctx.finish_shape(&ids[0]).unwrap();
    assert!(!h.store.get(&ids[0]).unwrap().props().currently_drawing());
    assert_eq!(h.notifications, vec![ModeNotification::Finish { id: ids[0].clone(), action: FinishAction::Draw }]);
}

#[test]
fn validate_for_mode_passes_unknown_modes() {
    let mut h = Harness::default();
    h.validators.insert("point".into(), FeatureValidator::new(Intrinsic::Point, None));
    let line = Feature {
        id: FeatureId::from("l"),
        geometry: Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]),
        properties: crate::geometry::Properties::new(),
    };
    let ctx = h.ctx();
    assert!(!ctx.validate_for_mode("point", &line, UpdateType::Finish).valid);
    assert!(ctx.validate_for_mode("ghost", &line, UpdateType::Finish).valid);
}

#[test]
fn snapped_position_falls_back_to_rounded_pointer() {
    let mut h = Harness::default();
    h.precision = 2;
    let ctx = h.ctx();
    let p = ctx.snapped_position(&Snapping::default(), &pointer(1.234_5, 5.678_9), &[], 40.0);
    assert_eq!(p, [1.23, 5.68]);
}

#[test]
fn delete_present_skips_missing() {
    let mut h = Harness::default();
    let ids = h.store.create(vec![NewFeature::owned_by("point", Geometry::point([0.0, 0.0]))]).unwrap();
    let mut ctx = h.ctx();
    ctx.delete_present(&[ids[0].clone(), FeatureId::from("ghost")]).unwrap();
    assert!(h.store.is_empty());
}
