//! Nearest point on a line, computed in Mercator space.

#[cfg(test)]
#[path = "nearest_test.rs"]
mod nearest_test;

use crate::geodesic::{MercatorPoint, haversine_distance_km, lng_lat_to_web_mercator, web_mercator_to_lng_lat};
use crate::geometry::Position;

/// Closest point found on a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub coordinate: Position,
    /// Index of the segment `(line[i], line[i + 1])` the point lies on.
    pub segment_index: usize,
    /// Great-circle distance from the query point, in kilometres.
    pub distance_km: f64,
}

#[allow(clippy::float_cmp)]
fn project_onto_segment(p: MercatorPoint, a: MercatorPoint, b: MercatorPoint) -> MercatorPoint {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    MercatorPoint::new(a.x + t * dx, a.y + t * dy)
}

/// The point on `line` closest to `point`. Ties go to the earliest segment.
/// Returns `None` for lines with fewer than two positions.
#[must_use]
pub fn nearest_point_on_line(point: Position, line: &[Position]) -> Option<NearestPoint> {
    let target = lng_lat_to_web_mercator(point);
    let mut best: Option<NearestPoint> = None;
    for (segment_index, w) in line.windows(2).enumerate() {
        let projected = project_onto_segment(target, lng_lat_to_web_mercator(w[0]), lng_lat_to_web_mercator(w[1]));
        let coordinate = web_mercator_to_lng_lat(projected);
        let distance_km = haversine_distance_km(point, coordinate);
        if best.is_none_or(|b| distance_km < b.distance_km) {
            best = Some(NearestPoint { coordinate, segment_index, distance_km });
        }
    }
    best
}
