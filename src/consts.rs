//! Shared numeric constants and well-known property names.

use std::time::Duration;

// ── Coordinates ─────────────────────────────────────────────────

/// Decimal places kept on every stored coordinate.
pub const DEFAULT_COORDINATE_PRECISION: u32 = 9;

/// Mean Earth radius in kilometres, used for haversine and destination math.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Sphere radius of the web-Mercator projection (EPSG:3857), in metres.
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

// ── Interaction ─────────────────────────────────────────────────

/// Screen-space slop in pixels for closing clicks and vertex hit testing.
pub const DEFAULT_POINTER_DISTANCE_PX: f64 = 40.0;

/// Minimum pixel travel between two freehand samples.
pub const DEFAULT_FREEHAND_MIN_DISTANCE_PX: f64 = 20.0;

/// How long a freehand auto-close blocks a new shape from starting.
pub const DEFAULT_AUTO_CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Number of steps around a generated circle.
pub const DEFAULT_CIRCLE_STEPS: usize = 64;

/// Radius of the circle created on the first click, in kilometres.
pub const DEFAULT_STARTING_RADIUS_KM: f64 = 0.000_01;

/// Lower bound for the polygon provisional second-vertex offset.
pub const MIN_POLYGON_EPSILON: f64 = 0.000_001;

/// Undo steps kept before the oldest are discarded.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

// ── Keys ────────────────────────────────────────────────────────

pub const KEY_ESCAPE: &str = "Escape";
pub const KEY_ENTER: &str = "Enter";
pub const KEY_DELETE: &str = "Delete";
pub const KEY_CONTROL: &str = "Control";

// ── Property names ──────────────────────────────────────────────

pub mod props {
    pub const MODE: &str = "mode";
    pub const SELECTED: &str = "selected";
    pub const CURRENTLY_DRAWING: &str = "currentlyDrawing";
    pub const CLOSING_POINT: &str = "closingPoint";
    pub const SELECTION_POINT: &str = "selectionPoint";
    pub const SELECTION_POINT_INDEX: &str = "selectionPointIndex";
    pub const MID_POINT: &str = "midPoint";
    pub const MID_POINT_SEGMENT: &str = "midPointSegment";
    pub const RADIUS_KILOMETERS: &str = "radiusKilometers";
}
