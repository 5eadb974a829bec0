#![allow(clippy::float_cmp)]

use super::*;
use crate::modes::{FinishAction, Mode, ModeNotification, ModeState};
use crate::test_support::Harness;

fn started(config: PolygonModeConfig) -> (Harness, Mode) {
    let mut h = Harness::default();
    let mut mode = Mode::from(PolygonMode::new(config));
    h.start(&mut mode);
    (h, mode)
}

fn ring_of(h: &Harness) -> Vec<Position> {
    h.shapes()[0].geometry.positions()
}

fn triangle(h: &mut Harness, mode: &mut Mode) {
    h.click(mode, 0.0, 0.0);
    h.click(mode, 1.0, 0.0);
    h.click(mode, 1.0, 1.0);
}

// =============================================================
// Ring shape while drawing
// =============================================================

#[test]
fn first_click_creates_degenerate_ring() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    assert_eq!(ring_of(&h), vec![[0.0, 0.0]; 4]);
    assert_eq!(mode.state(), ModeState::Drawing);
}

#[test]
fn one_vertex_preview_is_offset() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.move_to(&mut mode, 1.0, 1.0);
    let ring = ring_of(&h);
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[1], [1.0, 1.0]);
    assert_eq!(ring[2], [1.000_001, 1.000_001]);
    assert_eq!(ring[3], [0.0, 0.0]);
}

#[test]
fn epsilon_tracks_precision() {
    assert_eq!(provisional_epsilon(9), 0.000_001);
    assert!((provisional_epsilon(3) - 0.01).abs() < 1e-12);
}

#[test]
fn commits_keep_ring_closed() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
    h.move_to(&mut mode, 2.0, 2.0);
    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [2.0, 2.0], [0.0, 0.0]]);
}

#[test]
fn repeated_vertex_is_ignored() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert_eq!(ring_of(&h).len(), 4);
}

#[test]
fn closing_points_appear_at_three_vertices() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    assert!(h.guidance().is_empty());
    h.click(&mut mode, 1.0, 1.0);
    let markers: Vec<Geometry> = h.guidance().into_iter().map(|f| f.geometry).collect();
    assert_eq!(markers, vec![Geometry::point([0.0, 0.0]), Geometry::point([1.0, 1.0])]);

    h.click(&mut mode, 0.0, 2.0);
    let markers: Vec<Geometry> = h.guidance().into_iter().map(|f| f.geometry).collect();
    assert_eq!(markers, vec![Geometry::point([0.0, 0.0]), Geometry::point([0.0, 2.0])]);
}

#[test]
fn hovering_closing_point_snaps_preview_and_sets_cursor() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    triangle(&mut h, &mut mode);
    h.move_to(&mut mode, 0.05, 0.05);
    assert_eq!(h.adapter.cursor, Cursor::Pointer);
    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.0, 0.0]]);
    h.move_to(&mut mode, 3.0, 3.0);
    assert_eq!(h.adapter.cursor, Cursor::Crosshair);
}

// =============================================================
// Closing
// =============================================================

#[test]
fn clicking_first_vertex_closes_polygon() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    triangle(&mut h, &mut mode);
    h.click(&mut mode, 0.02, 0.02);

    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
    assert!(h.guidance().is_empty());
    let polygon = &h.shapes()[0];
    assert!(!polygon.props().currently_drawing());
    assert_eq!(h.notifications, vec![ModeNotification::Finish { id: polygon.id.clone(), action: FinishAction::Draw }]);
    assert_eq!(mode.state(), ModeState::Started);
}

#[test]
fn clockwise_input_is_rewound() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 0.0, 1.0);
    h.click(&mut mode, 1.0, 1.0);
    h.key_up(&mut mode, "Enter");
    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]);
}

#[test]
fn finish_key_needs_three_vertices() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.key_up(&mut mode, "Enter");
    assert!(mode.is_drawing());
    assert!(h.notifications.is_empty());
}

#[test]
fn revisiting_first_vertex_never_closes_degenerate_ring() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.click(&mut mode, 0.0, 0.0);
    assert_eq!(ring_of(&h).len(), 4);

    h.key_up(&mut mode, "Enter");
    assert!(mode.is_drawing());
    assert!(h.shapes()[0].props().currently_drawing());
    assert!(h.notifications.is_empty());
}

#[test]
fn collinear_vertices_do_not_close() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 1.0, 0.0);
    h.click(&mut mode, 2.0, 0.0);
    h.key_up(&mut mode, "Enter");
    assert!(mode.is_drawing());
    assert!(h.notifications.is_empty());
}

#[test]
fn cancel_removes_shape_and_markers() {
    let (mut h, mut mode) = started(PolygonModeConfig::default());
    triangle(&mut h, &mut mode);
    h.key_up(&mut mode, "Escape");
    assert!(h.store.is_empty());
    assert_eq!(mode.state(), ModeState::Started);
    assert!(h.adapter.double_click_zoom);
}

#[test]
fn self_intersecting_commit_is_rejected() {
    let config = PolygonModeConfig { prevent_self_intersection: true, ..PolygonModeConfig::default() };
    let (mut h, mut mode) = started(config);
    h.click(&mut mode, 0.0, 0.0);
    h.click(&mut mode, 2.0, 0.0);
    h.click(&mut mode, 2.0, 2.0);
    h.click(&mut mode, 1.0, -1.0);
    assert_eq!(ring_of(&h), vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [2.0, 2.0], [0.0, 0.0]]);
}
