//! Spherical measurement and web-Mercator projection.
//!
//! Pixel-space comparisons (cursor tracking, snapping, dragging) happen in
//! Mercator metres; distances reported to users are great-circle kilometres.

#[cfg(test)]
#[path = "geodesic_test.rs"]
mod geodesic_test;

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::consts::{EARTH_RADIUS_KM, WEB_MERCATOR_RADIUS_M};
use crate::geometry::Position;

/// A point in web-Mercator metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: MercatorPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Great-circle distance between two positions in kilometres.
#[must_use]
pub fn haversine_distance_km(a: Position, b: Position) -> f64 {
    let lat1 = a[1].to_radians();
    let lat2 = b[1].to_radians();
    let d_lat = lat2 - lat1;
    let d_lng = (b[0] - a[0]).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Position reached by travelling `distance_km` from `origin` along
/// `bearing_deg` (clockwise from north).
#[must_use]
pub fn destination(origin: Position, distance_km: f64, bearing_deg: f64) -> Position {
    let lng1 = origin[0].to_radians();
    let lat1 = origin[1].to_radians();
    let bearing = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let lng2 = lng1 + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    [lng2.to_degrees(), lat2.to_degrees()]
}

/// Initial bearing from `a` to `b` in degrees, in `(-180, 180]`.
#[must_use]
pub fn bearing(a: Position, b: Position) -> f64 {
    let lng1 = a[0].to_radians();
    let lng2 = b[0].to_radians();
    let lat1 = a[1].to_radians();
    let lat2 = b[1].to_radians();
    let y = (lng2 - lng1).sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * (lng2 - lng1).cos();
    y.atan2(x).to_degrees()
}

// =============================================================================
// WEB MERCATOR
// =============================================================================

#[must_use]
pub fn lng_lat_to_web_mercator(p: Position) -> MercatorPoint {
    let x = p[0].to_radians() * WEB_MERCATOR_RADIUS_M;
    let y = (FRAC_PI_4 + p[1].to_radians() / 2.0).tan().ln() * WEB_MERCATOR_RADIUS_M;
    MercatorPoint { x, y }
}

#[must_use]
pub fn web_mercator_to_lng_lat(m: MercatorPoint) -> Position {
    let lng = (m.x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (m.y / WEB_MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    [lng, lat]
}

/// Ratio of planar Mercator distance to true geodesic distance between two
/// positions. Multiplying a geodesic length by this ratio gives the Mercator
/// length that looks the same on screen. Returns 1 when the points coincide.
#[must_use]
pub fn web_mercator_distortion(source: Position, target: Position) -> f64 {
    let geodesic_m = haversine_distance_km(source, target) * 1000.0;
    if geodesic_m == 0.0 {
        return 1.0;
    }
    let planar_m = lng_lat_to_web_mercator(source).distance(lng_lat_to_web_mercator(target));
    planar_m / geodesic_m
}

/// Midpoint of the straight screen segment between two positions.
#[must_use]
pub fn web_mercator_midpoint(a: Position, b: Position) -> Position {
    let ma = lng_lat_to_web_mercator(a);
    let mb = lng_lat_to_web_mercator(b);
    web_mercator_to_lng_lat(MercatorPoint::new((ma.x + mb.x) / 2.0, (ma.y + mb.y) / 2.0))
}

/// Mean of the distinct vertices in Mercator space. A closing position equal
/// to the first one is ignored.
#[must_use]
pub fn web_mercator_centroid(positions: &[Position]) -> Option<MercatorPoint> {
    let distinct = match positions {
        [first, .., last] if first == last && positions.len() > 1 => &positions[..positions.len() - 1],
        _ => positions,
    };
    if distinct.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = distinct.len() as f64;
    let (sx, sy) = distinct.iter().fold((0.0, 0.0), |(sx, sy), p| {
        let m = lng_lat_to_web_mercator(*p);
        (sx + m.x, sy + m.y)
    });
    Some(MercatorPoint::new(sx / n, sy / n))
}
