use super::*;
use crate::store::FeatureStore;
use crate::test_support::{TestAdapter, pointer};

fn opts(pointer_distance: f64, include_guidance: bool) -> HitOptions {
    HitOptions { pointer_distance, include_guidance }
}

// =============================================================
// Distances
// =============================================================

#[test]
fn pixel_distance_uses_projection() {
    let adapter = TestAdapter::default();
    let d = pixel_distance(&adapter, &pointer(0.0, 0.0), [0.3, 0.4]);
    assert!((d - 50.0).abs() < 1e-9);
}

#[test]
fn pixel_distance_to_line_clamps_to_segments() {
    let adapter = TestAdapter::default();
    let line = [[0.0, 0.0], [1.0, 0.0]];
    assert!((pixel_distance_to_line(&adapter, &pointer(0.5, 0.1), &line) - 10.0).abs() < 1e-9);
    assert!((pixel_distance_to_line(&adapter, &pointer(1.3, 0.4), &line) - 50.0).abs() < 1e-9);
    assert!(pixel_distance_to_line(&adapter, &pointer(0.0, 0.0), &[]).is_infinite());
}

#[test]
fn click_box_is_centred_on_pointer() {
    let adapter = TestAdapter::default();
    let bbox = click_bounding_box(&adapter, &pointer(1.0, 1.0), 40.0);
    assert!((bbox.min_lng - 0.8).abs() < 1e-9);
    assert!((bbox.max_lat - 1.2).abs() < 1e-9);
}

// =============================================================
// Hit testing
// =============================================================

#[test]
fn features_at_pointer_orders_points_lines_polygons() {
    let adapter = TestAdapter::default();
    let mut store = FeatureStore::new();
    let ids = store
        .create(vec![
            NewFeature::owned_by("polygon", Geometry::polygon(vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0]])),
            NewFeature::owned_by("linestring", Geometry::line_string(vec![[-1.0, 0.1], [1.0, 0.1]])),
            NewFeature::owned_by("point", Geometry::point([0.1, 0.0])),
            NewFeature::owned_by("point", Geometry::point([5.0, 5.0])),
        ])
        .unwrap();

    let hits: Vec<FeatureId> = features_at_pointer(&store, &adapter, &pointer(0.0, 0.0), opts(40.0, false))
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(hits, vec![ids[2].clone(), ids[1].clone(), ids[0].clone()]);
}

#[test]
fn guidance_is_hidden_unless_requested() {
    let adapter = TestAdapter::default();
    let mut store = FeatureStore::new();
    store.create(vec![closing_point_feature("polygon", [0.0, 0.0])]).unwrap();
    assert!(features_at_pointer(&store, &adapter, &pointer(0.0, 0.0), opts(40.0, false)).is_empty());
    assert_eq!(features_at_pointer(&store, &adapter, &pointer(0.0, 0.0), opts(40.0, true)).len(), 1);
}

#[test]
fn nearest_point_wins_within_type() {
    let adapter = TestAdapter::default();
    let mut store = FeatureStore::new();
    let ids = store
        .create(vec![
            NewFeature::owned_by("point", Geometry::point([0.15, 0.0])),
            NewFeature::owned_by("point", Geometry::point([0.05, 0.0])),
        ])
        .unwrap();
    let hits = features_at_pointer(&store, &adapter, &pointer(0.0, 0.0), opts(40.0, false));
    assert_eq!(hits[0].id, ids[1]);
    assert_eq!(hits[1].id, ids[0]);
}

#[test]
fn points_outside_pointer_distance_are_missed() {
    let adapter = TestAdapter::default();
    let mut store = FeatureStore::new();
    store.create(vec![NewFeature::owned_by("point", Geometry::point([0.3, 0.0]))]).unwrap();
    assert!(features_at_pointer(&store, &adapter, &pointer(0.0, 0.0), opts(20.0, false)).is_empty());
}

// =============================================================
// Closing points
// =============================================================

#[test]
fn closing_points_lifecycle() {
    let adapter = TestAdapter::default();
    let mut store = FeatureStore::new();
    let closing = ClosingPoints::create(&mut store, "polygon", [0.0, 0.0], [1.0, 1.0]).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.copy_all().iter().all(|f| f.props().closing_point()));

    let hit = closing.hit(&store, &adapter, &pointer(0.05, 0.0), 40.0);
    assert!(hit.is_closing && !hit.is_previous_closing);
    assert!(closing.hit(&store, &adapter, &pointer(1.0, 1.1), 40.0).is_previous_closing);
    assert!(!closing.hit(&store, &adapter, &pointer(0.5, 0.5), 40.0).any());

    closing.update(&mut store, [0.0, 0.0], [2.0, 2.0]).unwrap();
    assert!(closing.hit(&store, &adapter, &pointer(2.0, 2.0), 40.0).is_previous_closing);
    let [opening_id, _] = closing.ids();
    assert!(store.has(opening_id));

    closing.delete(&mut store).unwrap();
    assert!(store.is_empty());
}
