//! Geometric validation: self-intersection, winding order, and the per-mode
//! feature validators that combine intrinsic checks with user functions.
//!
//! DESIGN
//! ======
//! Validators never fail loudly. They produce a [`ValidationResult`] which
//! modes use to drop an edit and the orchestrator reports per feature from
//! `add_features`. A validator runs at one of three checkpoints
//! ([`UpdateType`]): on every pointer move, when a sub-step commits (a polygon
//! vertex), and when the whole shape is finished.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Feature, Geometry, GeometryKind, Position, has_valid_precision, is_valid_position};

pub const REASON_WRONG_GEOMETRY: &str = "Feature has the wrong geometry type for this mode";
pub const REASON_INVALID_COORDINATES: &str = "Feature has invalid coordinates";
pub const REASON_EXCESS_PRECISION: &str = "Feature has coordinates with excessive precision";
pub const REASON_TOO_FEW_POSITIONS: &str = "Feature has too few coordinates";
pub const REASON_NOT_CLOSED: &str = "Feature polygon ring is not closed";
pub const REASON_HOLES: &str = "Feature polygon must have exactly one ring";
pub const REASON_SELF_INTERSECTS: &str = "Feature intersects itself";
pub const REASON_NOT_RECTANGLE: &str = "Feature is not a rectangle";
pub const REASON_NOT_OWNABLE: &str = "Mode does not own features";

/// Outcome of a validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn ok() -> Self {
        Self { valid: true, reason: None }
    }

    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self { valid: false, reason: Some(reason.into()) }
    }
}

/// The checkpoint at which a validator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    /// Every pointer move; rejection just skips the update.
    Provisional,
    /// A sub-step of a shape, such as one polygon vertex.
    Commit,
    /// The completed shape.
    Finish,
}

/// Context handed to every validator.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub update_type: UpdateType,
    pub coordinate_precision: u32,
}

/// A user-supplied validation function.
pub type Validation = Rc<dyn Fn(&Feature, &ValidationContext) -> ValidationResult>;

/// Built-in structural checks a mode applies to the features it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Point,
    LineString { non_intersecting: bool },
    Polygon { non_intersecting: bool },
    Rectangle,
    /// Any well-formed point, line or polygon.
    AnyGeometry,
    /// The mode never owns features.
    Reject,
}

impl Intrinsic {
    #[must_use]
    pub fn check(self, feature: &Feature, precision: u32) -> ValidationResult {
        match self {
            Self::Point => validate_point(&feature.geometry, precision),
            Self::LineString { non_intersecting } => {
                let result = validate_line_string(&feature.geometry, precision);
                if result.valid && non_intersecting && geometry_self_intersects(&feature.geometry) {
                    return ValidationResult::invalid(REASON_SELF_INTERSECTS);
                }
                result
            }
            Self::Polygon { non_intersecting } => {
                let result = validate_polygon(&feature.geometry, precision);
                if result.valid && non_intersecting && geometry_self_intersects(&feature.geometry) {
                    return ValidationResult::invalid(REASON_SELF_INTERSECTS);
                }
                result
            }
            Self::Rectangle => {
                let result = validate_polygon(&feature.geometry, precision);
                if result.valid && feature.geometry.outer_ring().map_or(0, <[Position]>::len) != 5 {
                    return ValidationResult::invalid(REASON_NOT_RECTANGLE);
                }
                result
            }
            Self::AnyGeometry => match feature.geometry.kind() {
                GeometryKind::Point => validate_point(&feature.geometry, precision),
                GeometryKind::LineString => validate_line_string(&feature.geometry, precision),
                GeometryKind::Polygon => validate_polygon(&feature.geometry, precision),
            },
            Self::Reject => ValidationResult::invalid(REASON_NOT_OWNABLE),
        }
    }
}

/// Intrinsic checks followed by an optional user validator.
#[derive(Clone)]
pub struct FeatureValidator {
    intrinsic: Intrinsic,
    custom: Option<Validation>,
}

impl fmt::Debug for FeatureValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureValidator")
            .field("intrinsic", &self.intrinsic)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl FeatureValidator {
    #[must_use]
    pub fn new(intrinsic: Intrinsic, custom: Option<Validation>) -> Self {
        Self { intrinsic, custom }
    }

    #[must_use]
    pub fn validate(&self, feature: &Feature, ctx: &ValidationContext) -> ValidationResult {
        let result = self.intrinsic.check(feature, ctx.coordinate_precision);
        if !result.valid {
            return result;
        }
        match &self.custom {
            Some(custom) => custom(feature, ctx),
            None => result,
        }
    }
}

// =============================================================================
// STRUCTURAL CHECKS
// =============================================================================

fn check_positions(positions: &[Position], precision: u32) -> Option<ValidationResult> {
    if !positions.iter().all(|p| is_valid_position(*p)) {
        return Some(ValidationResult::invalid(REASON_INVALID_COORDINATES));
    }
    if !positions.iter().all(|p| has_valid_precision(*p, precision)) {
        return Some(ValidationResult::invalid(REASON_EXCESS_PRECISION));
    }
    None
}

#[must_use]
pub fn validate_point(geometry: &Geometry, precision: u32) -> ValidationResult {
    let Geometry::Point { coordinates } = geometry else {
        return ValidationResult::invalid(REASON_WRONG_GEOMETRY);
    };
    check_positions(&[*coordinates], precision).unwrap_or_else(ValidationResult::ok)
}

#[must_use]
pub fn validate_line_string(geometry: &Geometry, precision: u32) -> ValidationResult {
    let Geometry::LineString { coordinates } = geometry else {
        return ValidationResult::invalid(REASON_WRONG_GEOMETRY);
    };
    if coordinates.len() < 2 {
        return ValidationResult::invalid(REASON_TOO_FEW_POSITIONS);
    }
    check_positions(coordinates, precision).unwrap_or_else(ValidationResult::ok)
}

#[must_use]
pub fn validate_polygon(geometry: &Geometry, precision: u32) -> ValidationResult {
    let Geometry::Polygon { coordinates } = geometry else {
        return ValidationResult::invalid(REASON_WRONG_GEOMETRY);
    };
    let [ring] = coordinates.as_slice() else {
        return ValidationResult::invalid(REASON_HOLES);
    };
    if ring.len() < 4 {
        return ValidationResult::invalid(REASON_TOO_FEW_POSITIONS);
    }
    if ring.first() != ring.last() {
        return ValidationResult::invalid(REASON_NOT_CLOSED);
    }
    check_positions(ring, precision).unwrap_or_else(ValidationResult::ok)
}

// =============================================================================
// SELF-INTERSECTION
// =============================================================================

/// Line-line intersection with zero epsilon. Parallel and coincident segments
/// never intersect.
#[allow(clippy::float_cmp)]
fn segments_intersect(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    let denom = (b2[1] - b1[1]) * (a2[0] - a1[0]) - (b2[0] - b1[0]) * (a2[1] - a1[1]);
    if denom == 0.0 {
        return false;
    }
    let ua = ((b2[0] - b1[0]) * (a1[1] - b1[1]) - (b2[1] - b1[1]) * (a1[0] - b1[0])) / denom;
    let ub = ((a2[0] - a1[0]) * (a1[1] - b1[1]) - (a2[1] - a1[1]) * (a1[0] - b1[0])) / denom;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Whether any two edges of the path cross. Edges sharing an endpoint,
/// including adjacent edges and the closing edge of a ring, are skipped.
#[must_use]
pub fn self_intersects(coordinates: &[Position]) -> bool {
    let edges: Vec<(Position, Position)> = coordinates.windows(2).map(|w| (w[0], w[1])).collect();
    for (i, &(a1, a2)) in edges.iter().enumerate() {
        for &(b1, b2) in &edges[i + 1..] {
            if a1 == b1 || a1 == b2 || a2 == b1 || a2 == b2 {
                continue;
            }
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Self-intersection of a line or polygon ring; points never intersect.
#[must_use]
pub fn geometry_self_intersects(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point { .. } => false,
        Geometry::LineString { coordinates } => self_intersects(coordinates),
        Geometry::Polygon { coordinates } => coordinates.iter().any(|ring| self_intersects(ring)),
    }
}

// =============================================================================
// WINDING
// =============================================================================

/// Planar shoelace area of a closed ring in square degrees, positive when
/// the ring winds counter-clockwise.
#[must_use]
pub fn signed_area(ring: &[Position]) -> f64 {
    let sum: f64 = ring
        .windows(2)
        .map(|w| (w[1][0] - w[0][0]) * (w[1][1] + w[0][1]))
        .sum();
    -sum / 2.0
}

/// True when the ring winds counter-clockwise (RFC 7946 exterior ring).
#[must_use]
pub fn follows_right_hand_rule(ring: &[Position]) -> bool {
    signed_area(ring) > 0.0
}

/// True when a closed ring has at least three distinct vertices and encloses
/// a non-zero area.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn encloses_area(ring: &[Position]) -> bool {
    let mut distinct: Vec<Position> = Vec::with_capacity(ring.len());
    for p in ring {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    distinct.len() >= 3 && signed_area(ring) != 0.0
}

/// Return the ring wound counter-clockwise, reversing it if needed.
#[must_use]
pub fn ensure_right_hand_rule(mut ring: Vec<Position>) -> Vec<Position> {
    if !follows_right_hand_rule(&ring) {
        ring.reverse();
    }
    ring
}
