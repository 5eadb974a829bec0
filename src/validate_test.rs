use std::rc::Rc;

use super::*;
use crate::geometry::FeatureId;

fn feature(geometry: Geometry) -> Feature {
    Feature { id: FeatureId::from("f"), geometry, properties: crate::geometry::Properties::new() }
}

fn ctx(update_type: UpdateType) -> ValidationContext {
    ValidationContext { update_type, coordinate_precision: 9 }
}

fn square() -> Vec<Position> {
    vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
}

// =============================================================
// Structural checks
// =============================================================

#[test]
fn point_rejects_out_of_range() {
    assert!(validate_point(&Geometry::point([10.0, 10.0]), 9).valid);
    let result = validate_point(&Geometry::point([200.0, 10.0]), 9);
    assert_eq!(result.reason.as_deref(), Some(REASON_INVALID_COORDINATES));
}

#[test]
fn point_rejects_excess_precision() {
    let result = validate_point(&Geometry::point([0.123, 0.0]), 2);
    assert_eq!(result.reason.as_deref(), Some(REASON_EXCESS_PRECISION));
}

#[test]
fn wrong_geometry_type() {
    let result = validate_point(&Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]), 9);
    assert_eq!(result.reason.as_deref(), Some(REASON_WRONG_GEOMETRY));
}

#[test]
fn line_needs_two_positions() {
    let result = validate_line_string(&Geometry::line_string(vec![[0.0, 0.0]]), 9);
    assert_eq!(result.reason.as_deref(), Some(REASON_TOO_FEW_POSITIONS));
}

#[test]
fn polygon_structure() {
    assert!(validate_polygon(&Geometry::polygon(square()), 9).valid);

    let open = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    assert_eq!(validate_polygon(&open, 9).reason.as_deref(), Some(REASON_NOT_CLOSED));

    let short = Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
    assert_eq!(validate_polygon(&short, 9).reason.as_deref(), Some(REASON_TOO_FEW_POSITIONS));

    let holed = Geometry::Polygon { coordinates: vec![square(), square()] };
    assert_eq!(validate_polygon(&holed, 9).reason.as_deref(), Some(REASON_HOLES));
}

// =============================================================
// Self-intersection
// =============================================================

#[test]
fn bow_tie_self_intersects() {
    let bow_tie = [[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
    assert!(self_intersects(&bow_tie));
    assert!(!self_intersects(&square()));
}

#[test]
fn crossing_line_self_intersects() {
    let zigzag = [[0.0, 0.0], [2.0, 0.0], [1.0, 1.0], [1.0, -1.0]];
    assert!(self_intersects(&zigzag));
    assert!(!self_intersects(&[[0.0, 0.0], [1.0, 0.0], [2.0, 1.0]]));
    assert!(!geometry_self_intersects(&Geometry::point([0.0, 0.0])));
}

/// Closed ring starting at vertex `k` of the open ring.
fn rotated(open: &[Position], k: usize) -> Vec<Position> {
    let mut ring: Vec<Position> = open[k..].iter().chain(&open[..k]).copied().collect();
    ring.push(ring[0]);
    ring
}

#[test]
fn self_intersection_ignores_direction_and_start() {
    let bow_tie = [[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
    let open_square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for k in 0..4 {
        let crossed = rotated(&bow_tie, k);
        let mut reversed = crossed.clone();
        reversed.reverse();
        assert!(self_intersects(&crossed), "rotation {k}");
        assert!(self_intersects(&reversed), "reversed rotation {k}");

        let simple = rotated(&open_square, k);
        let mut reversed = simple.clone();
        reversed.reverse();
        assert!(!self_intersects(&simple));
        assert!(!self_intersects(&reversed));
    }
}

// =============================================================
// Winding
// =============================================================

#[test]
fn right_hand_rule() {
    assert!(follows_right_hand_rule(&square()));
    let mut clockwise = square();
    clockwise.reverse();
    assert!(!follows_right_hand_rule(&clockwise));
    assert_eq!(ensure_right_hand_rule(clockwise), square());
    assert_eq!(ensure_right_hand_rule(square()), square());
}

#[test]
fn enclosed_area() {
    assert!((signed_area(&square()) - 1.0).abs() < 1e-12);
    assert!(encloses_area(&square()));
    assert!(!encloses_area(&[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [0.0, 0.0]]));
    assert!(!encloses_area(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 0.0]]));
    assert!(!encloses_area(&[[1.0, 1.0]; 5]));
}

// =============================================================
// Intrinsic / FeatureValidator
// =============================================================

#[test]
fn intrinsic_polygon_non_intersecting() {
    let bow_tie = feature(Geometry::polygon(vec![[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]));
    assert!(Intrinsic::Polygon { non_intersecting: false }.check(&bow_tie, 9).valid);
    let result = Intrinsic::Polygon { non_intersecting: true }.check(&bow_tie, 9);
    assert_eq!(result.reason.as_deref(), Some(REASON_SELF_INTERSECTS));
}

#[test]
fn intrinsic_rectangle_needs_five_positions() {
    assert!(Intrinsic::Rectangle.check(&feature(Geometry::polygon(square())), 9).valid);
    let triangle = feature(Geometry::polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]));
    assert_eq!(Intrinsic::Rectangle.check(&triangle, 9).reason.as_deref(), Some(REASON_NOT_RECTANGLE));
}

#[test]
fn intrinsic_any_and_reject() {
    assert!(Intrinsic::AnyGeometry.check(&feature(Geometry::point([0.0, 0.0])), 9).valid);
    assert!(Intrinsic::AnyGeometry.check(&feature(Geometry::polygon(square())), 9).valid);
    assert!(!Intrinsic::Reject.check(&feature(Geometry::point([0.0, 0.0])), 9).valid);
}

#[test]
fn custom_validation_runs_after_intrinsic() {
    let custom: Validation = Rc::new(|f: &Feature, ctx: &ValidationContext| {
        if ctx.update_type == UpdateType::Finish && f.geometry.positions().len() > 4 {
            ValidationResult::invalid("too big")
        } else {
            ValidationResult::ok()
        }
    });
    let validator = FeatureValidator::new(Intrinsic::Polygon { non_intersecting: false }, Some(custom));
    let f = feature(Geometry::polygon(square()));
    assert!(validator.validate(&f, &ctx(UpdateType::Provisional)).valid);
    assert_eq!(validator.validate(&f, &ctx(UpdateType::Finish)).reason.as_deref(), Some("too big"));

    // Intrinsic failure short-circuits the custom function.
    let point = feature(Geometry::point([0.0, 0.0]));
    assert_eq!(validator.validate(&point, &ctx(UpdateType::Finish)).reason.as_deref(), Some(REASON_WRONG_GEOMETRY));
}
