use std::rc::Rc;

use super::*;
use crate::geometry::NewFeature;
use crate::test_support::{TestAdapter, pointer};

fn query<'a>(store: &'a FeatureStore, adapter: &'a TestAdapter, event: &'a PointerEvent, exclude: &'a [FeatureId]) -> SnapQuery<'a> {
    SnapQuery { store, adapter, event, exclude, pointer_distance: 40.0, coordinate_precision: 9 }
}

fn store_with_line() -> (FeatureStore, FeatureId) {
    let mut store = FeatureStore::new();
    let ids = store
        .create(vec![NewFeature::owned_by("linestring", Geometry::line_string(vec![[0.0, 0.0], [2.0, 0.0]]))])
        .unwrap();
    (store, ids[0].clone())
}

#[test]
fn disabled_by_default() {
    let (store, _) = store_with_line();
    let adapter = TestAdapter::default();
    let event = pointer(0.1, 0.1);
    let snapping = Snapping::default();
    assert!(!snapping.is_enabled());
    assert_eq!(snapping.snap(&query(&store, &adapter, &event, &[])), None);
}

#[test]
fn snaps_to_nearest_vertex() {
    let (store, _) = store_with_line();
    let adapter = TestAdapter::default();
    let event = pointer(0.1, 0.1);
    let snapping = Snapping { to_coordinate: true, ..Snapping::default() };
    assert_eq!(snapping.snap(&query(&store, &adapter, &event, &[])), Some([0.0, 0.0]));

    let far = pointer(1.0, 0.1);
    assert_eq!(snapping.snap(&query(&store, &adapter, &far, &[])), None);
}

#[test]
fn snaps_to_line() {
    let (store, _) = store_with_line();
    let adapter = TestAdapter::default();
    let event = pointer(1.0, 0.1);
    let snapping = Snapping { to_line: true, ..Snapping::default() };
    let p = snapping.snap(&query(&store, &adapter, &event, &[])).unwrap();
    assert!((p[0] - 1.0).abs() < 1e-6);
    assert!(p[1].abs() < 1e-6);
}

#[test]
fn excluded_features_are_ignored() {
    let (store, id) = store_with_line();
    let adapter = TestAdapter::default();
    let event = pointer(0.1, 0.1);
    let snapping = Snapping { to_coordinate: true, to_line: true, to_custom: None };
    assert_eq!(snapping.snap(&query(&store, &adapter, &event, &[id])), None);
}

#[test]
fn custom_takes_precedence_and_is_rounded() {
    let (store, id) = store_with_line();
    let adapter = TestAdapter::default();
    let event = pointer(0.1, 0.1);
    let custom: CustomSnap = Rc::new(|_: &PointerEvent, ctx: &SnapContext| {
        assert!(ctx.current_id.is_some());
        Some([5.123_456_789_9, 5.0])
    });
    let snapping = Snapping { to_coordinate: true, to_line: false, to_custom: Some(custom) };
    let mut q = query(&store, &adapter, &event, std::slice::from_ref(&id));
    q.coordinate_precision = 3;
    assert_eq!(snapping.snap(&q), Some([5.123, 5.0]));
}
