//! Shape generators for the circle and rectangle modes.

#[cfg(test)]
#[path = "shapes_test.rs"]
mod shapes_test;

use std::f64::consts::TAU;

use crate::geodesic::{MercatorPoint, destination, lng_lat_to_web_mercator, web_mercator_to_lng_lat};
use crate::geometry::{Position, round_position};

/// Geodesic circle: `steps` destinations at equal bearings around `center`,
/// walked counter-clockwise and closed by repeating the first vertex.
#[must_use]
pub fn circle(center: Position, radius_km: f64, steps: usize, precision: u32) -> Vec<Position> {
    let steps = steps.max(3);
    #[allow(clippy::cast_precision_loss)]
    let step_deg = -360.0 / steps as f64;
    let mut ring: Vec<Position> = (0..steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let bearing = i as f64 * step_deg;
            round_position(destination(center, radius_km, bearing), precision)
        })
        .collect();
    ring.push(ring[0]);
    ring
}

/// Circle drawn in the Mercator plane, so it looks round on a Mercator map.
/// `radius_km` is a Mercator length; scale a geodesic radius with
/// [`crate::geodesic::web_mercator_distortion`] first.
#[must_use]
pub fn circle_web_mercator(center: Position, radius_km: f64, steps: usize, precision: u32) -> Vec<Position> {
    let steps = steps.max(3);
    let origin = lng_lat_to_web_mercator(center);
    let radius_m = radius_km * 1000.0;
    let mut ring: Vec<Position> = (0..steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = i as f64 * TAU / steps as f64;
            let m = MercatorPoint::new(origin.x + radius_m * angle.cos(), origin.y + radius_m * angle.sin());
            round_position(web_mercator_to_lng_lat(m), precision)
        })
        .collect();
    ring.push(ring[0]);
    ring
}

/// Axis-aligned rectangle ring spanned by two opposite corners.
#[must_use]
pub fn rectangle(a: Position, b: Position, precision: u32) -> Vec<Position> {
    let a = round_position(a, precision);
    let b = round_position(b, precision);
    vec![a, [b[0], a[1]], b, [a[0], b[1]], a]
}
