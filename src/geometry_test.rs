#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// FeatureId
// =============================================================

#[test]
fn feature_id_display_and_conversions() {
    let id = FeatureId::from("abc");
    assert_eq!(id.as_str(), "abc");
    assert_eq!(id.to_string(), "abc");
    assert_eq!(FeatureId::from(String::from("abc")), id);
    assert_eq!(FeatureId::new("abc"), id);
}

#[test]
fn feature_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&FeatureId::from("x1")).unwrap();
    assert_eq!(json, "\"x1\"");
}

// =============================================================
// Geometry
// =============================================================

#[test]
fn geometry_kind_matches_variant() {
    assert_eq!(Geometry::point([0.0, 0.0]).kind(), GeometryKind::Point);
    assert_eq!(Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]).kind(), GeometryKind::LineString);
    assert_eq!(Geometry::polygon(vec![[0.0, 0.0]; 4]).kind(), GeometryKind::Polygon);
    assert_eq!(GeometryKind::LineString.to_string(), "LineString");
}

#[test]
fn geometry_serializes_as_geojson() {
    let g = Geometry::point([1.5, 2.5]);
    let json = serde_json::to_value(&g).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "Point", "coordinates": [1.5, 2.5] }));

    let parsed: Geometry =
        serde_json::from_value(serde_json::json!({ "type": "LineString", "coordinates": [[0, 0], [1, 2]] })).unwrap();
    assert_eq!(parsed, Geometry::line_string(vec![[0.0, 0.0], [1.0, 2.0]]));
}

#[test]
fn feature_deserializes_with_missing_properties() {
    let f: Feature = serde_json::from_value(serde_json::json!({
        "type": "Feature",
        "id": "f1",
        "geometry": { "type": "Point", "coordinates": [0, 0] }
    }))
    .unwrap();
    assert_eq!(f.id, FeatureId::from("f1"));
    assert!(f.properties.is_empty());
}

#[test]
fn positions_of_polygon_is_outer_ring() {
    let ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
    let g = Geometry::polygon(ring.clone());
    assert_eq!(g.positions(), ring);
    assert_eq!(g.outer_ring(), Some(ring.as_slice()));
    assert_eq!(Geometry::point([0.0, 0.0]).outer_ring(), None);
}

#[test]
fn rounded_limits_every_coordinate() {
    let g = Geometry::line_string(vec![[0.123_456, 1.987_654], [2.000_04, 3.0]]);
    assert_eq!(g.rounded(3), Geometry::line_string(vec![[0.123, 1.988], [2.0, 3.0]]));
}

#[test]
fn bbox_covers_all_positions() {
    let g = Geometry::polygon(vec![[-1.0, 2.0], [3.0, -4.0], [0.0, 5.0], [-1.0, 2.0]]);
    let bbox = g.bbox().unwrap();
    assert_eq!(bbox, BBox { min_lng: -1.0, min_lat: -4.0, max_lng: 3.0, max_lat: 5.0 });
}

#[test]
fn bbox_of_empty_line_is_none() {
    assert!(Geometry::line_string(Vec::new()).bbox().is_none());
}

// =============================================================
// NewFeature / Props
// =============================================================

#[test]
fn owned_by_sets_mode_property() {
    let f = NewFeature::owned_by("polygon", Geometry::point([0.0, 0.0])).with_property(props::SELECTED, true);
    assert_eq!(f.id, None);
    assert_eq!(f.properties.get(props::MODE), Some(&serde_json::json!("polygon")));
    assert_eq!(f.properties.get(props::SELECTED), Some(&serde_json::json!(true)));
}

#[test]
fn props_reads_well_known_fields() {
    let f: Feature = Feature {
        id: FeatureId::from("a"),
        geometry: Geometry::point([0.0, 0.0]),
        properties: NewFeature::owned_by("select", Geometry::point([0.0, 0.0]))
            .with_property(props::SELECTION_POINT, true)
            .with_property(props::SELECTION_POINT_INDEX, 3)
            .with_property(props::RADIUS_KILOMETERS, 1.5)
            .properties,
    };
    let p = f.props();
    assert_eq!(p.mode(), Some("select"));
    assert!(p.selection_point());
    assert_eq!(p.selection_point_index(), Some(3));
    assert_eq!(p.radius_km(), Some(1.5));
    assert!(!p.selected());
    assert!(p.is_guidance());
}

#[test]
fn props_defaults_when_absent_or_wrong_type() {
    let mut properties = Properties::new();
    properties.insert(props::SELECTED.to_string(), serde_json::json!("yes"));
    let p = Props::new(&properties);
    assert!(!p.selected());
    assert_eq!(p.mode(), None);
    assert_eq!(p.mid_point_segment(), None);
    assert!(!p.is_guidance());
}

// =============================================================
// BBox
// =============================================================

#[test]
fn bbox_new_orders_corners() {
    let b = BBox::new([2.0, -1.0], [-2.0, 1.0]);
    assert_eq!(b, BBox { min_lng: -2.0, min_lat: -1.0, max_lng: 2.0, max_lat: 1.0 });
}

#[test]
fn bbox_intersects_touching_edges() {
    let a = BBox::new([0.0, 0.0], [1.0, 1.0]);
    let b = BBox::new([1.0, 1.0], [2.0, 2.0]);
    let c = BBox::new([1.1, 0.0], [2.0, 1.0]);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(a.contains([0.5, 1.0]));
    assert!(!a.contains([1.5, 0.5]));
}

// =============================================================
// Coordinate helpers
// =============================================================

#[test]
fn limit_precision_rounds_to_nearest() {
    assert_eq!(limit_precision(1.234_6, 3), 1.235);
    assert_eq!(limit_precision(-1.234_6, 3), -1.235);
    assert_eq!(limit_precision(7.0, 0), 7.0);
}

#[test]
fn valid_position_ranges() {
    assert!(is_valid_position([180.0, 90.0]));
    assert!(is_valid_position([-180.0, -90.0]));
    assert!(!is_valid_position([180.1, 0.0]));
    assert!(!is_valid_position([0.0, -90.5]));
    assert!(!is_valid_position([f64::NAN, 0.0]));
}

#[test]
fn precision_check() {
    assert!(has_valid_precision([1.25, 3.5], 2));
    assert!(!has_valid_precision([1.255, 3.5], 2));
}

#[test]
fn point_in_polygon_square() {
    let ring = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
    assert!(point_in_polygon([1.0, 1.0], &ring));
    assert!(!point_in_polygon([3.0, 1.0], &ring));
    assert!(!point_in_polygon([1.0, 1.0], &ring[..2]));
}
