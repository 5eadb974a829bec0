use super::*;
use crate::modes::{FinishAction, Mode, ModeNotification, ModeState};
use crate::test_support::Harness;

fn started(config: LineStringModeConfig) -> (Harness, Mode) {
    let mut h = Harness::default();
    let mut mode = Mode::from(LineStringMode::new(config));
    h.start(&mut mode);
    (h, mode)
}

fn line_of(h: &Harness) -> Vec<Position> {
    h.shapes()[0].geometry.positions()
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn first_click_starts_a_line() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    assert_eq!(mode.state(), ModeState::Drawing);
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [0.0, 0.0]]);
    assert!(h.shapes()[0].props().currently_drawing());
    assert!(!h.adapter.double_click_zoom);
}

#[test]
fn mouse_move_tracks_provisional_vertex() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.move_to(&mut mode, 1.0, 0.0);
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [1.0, 0.0]]);
}

#[test]
fn clicks_commit_and_place_closing_marker() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.0]]);
    let guidance = h.guidance();
    assert_eq!(guidance.len(), 1);
    assert_eq!(guidance[0].geometry, Geometry::point([1.0, 0.0]));

    h.click(&mut mode, 2.0, 1.0);
    assert_eq!(h.guidance()[0].geometry, Geometry::point([2.0, 1.0]));
}

#[test]
fn clicking_last_vertex_finishes() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.click(&mut mode, 2.0, 1.0);
    h.click(&mut mode, 2.05, 1.0);

    assert_eq!(line_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [2.0, 1.0]]);
    assert!(h.guidance().is_empty());
    let line = &h.shapes()[0];
    assert!(!line.props().currently_drawing());
    assert_eq!(h.notifications, vec![ModeNotification::Finish { id: line.id.clone(), action: FinishAction::Draw }]);
    assert_eq!(mode.state(), ModeState::Started);
    assert!(h.adapter.double_click_zoom);
}

#[test]
fn clicking_first_vertex_again_does_not_finish_single_vertex_line() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 0.01, 0.0);
    assert!(mode.is_drawing());
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [0.0, 0.0]]);
}

#[test]
fn finish_key_completes_line() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.move_to(&mut mode, 3.0, 3.0);
    h.key_up(&mut mode, "Enter");
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [1.0, 0.0]]);
    assert!(!mode.is_drawing());
}

#[test]
fn cancel_key_discards_line() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.key_up(&mut mode, "Escape");
    assert!(h.store.is_empty());
    assert!(!mode.is_drawing());
}

// =============================================================
// Validation / cursor
// =============================================================

#[test]
fn self_intersection_is_prevented_when_configured() {
    let config = LineStringModeConfig { prevent_self_intersection: true, ..LineStringModeConfig::default() };
    let (mut h, mut mode) = started(config);
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 2.0, 0.0);
    h.click(&mut mode, 1.0, 1.0);
    h.click(&mut mode, 1.0, -1.0);
    assert_eq!(line_of(&h), vec![[0.0, 0.0], [2.0, 0.0], [1.0, 1.0], [1.0, 1.0]]);
}

#[test]
fn cursor_turns_pointer_over_last_vertex() {
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.move_to(&mut mode, 1.0, 0.1);
    assert_eq!(h.adapter.cursor, Cursor::Pointer);
    h.move_to(&mut mode, 3.0, 0.0);
    assert_eq!(h.adapter.cursor, Cursor::Crosshair);
}

#[test]
fn closing_marker_uses_closing_style() {
    let styles = ShapeStyles::default();
    let (mut h, mut mode) = started(LineStringModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    let marker = &h.guidance()[0];
    assert_eq!(mode.style_feature(marker), styles.closing_point());
    assert_eq!(mode.style_feature(&h.shapes()[0]), styles.shape());
}
