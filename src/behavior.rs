//! Small behaviours modes compose: pixel distances, the click box used for
//! spatial queries, pointer hit testing and the polygon closing points.

#[cfg(test)]
#[path = "behavior_test.rs"]
mod behavior_test;

use crate::adapter::{Adapter, ScreenPoint};
use crate::consts::props;
use crate::error::DrawError;
use crate::geometry::{BBox, Feature, FeatureId, Geometry, GeometryKind, NewFeature, Position, point_in_polygon};
use crate::input::PointerEvent;
use crate::store::{FeatureStore, GeometryPatch};

/// Screen distance between the pointer and a coordinate.
#[must_use]
pub fn pixel_distance(adapter: &dyn Adapter, event: &PointerEvent, coordinate: Position) -> f64 {
    let projected = adapter.project(coordinate[0], coordinate[1]);
    projected.distance(ScreenPoint::new(event.container_x, event.container_y))
}

#[allow(clippy::float_cmp)]
fn distance_to_segment(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(ScreenPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Smallest screen distance between the pointer and any segment of `line`.
#[must_use]
pub fn pixel_distance_to_line(adapter: &dyn Adapter, event: &PointerEvent, line: &[Position]) -> f64 {
    let pointer = ScreenPoint::new(event.container_x, event.container_y);
    let projected: Vec<ScreenPoint> = line.iter().map(|p| adapter.project(p[0], p[1])).collect();
    match projected.as_slice() {
        [] => f64::INFINITY,
        [only] => only.distance(pointer),
        _ => projected
            .windows(2)
            .map(|w| distance_to_segment(pointer, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// A lng/lat box `pointer_distance` pixels across, centred on the pointer.
#[must_use]
pub fn click_bounding_box(adapter: &dyn Adapter, event: &PointerEvent, pointer_distance: f64) -> BBox {
    let half = pointer_distance / 2.0;
    let a = adapter.unproject(event.container_x - half, event.container_y - half);
    let b = adapter.unproject(event.container_x + half, event.container_y + half);
    BBox::new(a, b).expand(event.position())
}

// =============================================================================
// HIT TESTING
// =============================================================================

/// Options for [`features_at_pointer`].
#[derive(Debug, Clone, Copy)]
pub struct HitOptions {
    pub pointer_distance: f64,
    /// Include closing, selection and midpoint markers.
    pub include_guidance: bool,
}

fn hit_distance(adapter: &dyn Adapter, event: &PointerEvent, feature: &Feature, pointer_distance: f64) -> Option<f64> {
    match &feature.geometry {
        Geometry::Point { coordinates } => {
            let d = pixel_distance(adapter, event, *coordinates);
            (d <= pointer_distance).then_some(d)
        }
        Geometry::LineString { coordinates } => {
            let d = pixel_distance_to_line(adapter, event, coordinates);
            (d <= pointer_distance).then_some(d)
        }
        Geometry::Polygon { coordinates } => {
            let ring = coordinates.first()?;
            if point_in_polygon(event.position(), ring) {
                return Some(0.0);
            }
            let d = pixel_distance_to_line(adapter, event, ring);
            (d <= pointer_distance).then_some(d)
        }
    }
}

fn kind_rank(kind: GeometryKind) -> u8 {
    match kind {
        GeometryKind::Point => 0,
        GeometryKind::LineString => 1,
        GeometryKind::Polygon => 2,
    }
}

/// Features under the pointer: points and lines within `pointer_distance`
/// pixels, polygons containing the pointer (or with an edge that close).
/// Ordered points first, then lines, then polygons, nearest first within a
/// type and store order on ties.
#[must_use]
pub fn features_at_pointer(store: &FeatureStore, adapter: &dyn Adapter, event: &PointerEvent, opts: HitOptions) -> Vec<Feature> {
    let bbox = click_bounding_box(adapter, event, opts.pointer_distance);
    let mut hits: Vec<(u8, f64, Feature)> = store
        .search(&bbox)
        .into_iter()
        .filter(|f| opts.include_guidance || !f.props().is_guidance())
        .filter_map(|f| {
            let d = hit_distance(adapter, event, &f, opts.pointer_distance)?;
            Some((kind_rank(f.geometry.kind()), d, f))
        })
        .collect();
    hits.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    hits.into_iter().map(|(_, _, f)| f).collect()
}

// =============================================================================
// CLOSING POINTS
// =============================================================================

/// Build a closing-point guidance feature owned by `mode`.
#[must_use]
pub fn closing_point_feature(mode: &str, position: Position) -> NewFeature {
    NewFeature::owned_by(mode, Geometry::point(position)).with_property(props::CLOSING_POINT, true)
}

/// Result of checking the pointer against the closing points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosingHit {
    /// Pointer is over the first vertex.
    pub is_closing: bool,
    /// Pointer is over the last committed vertex.
    pub is_previous_closing: bool,
}

impl ClosingHit {
    #[must_use]
    pub fn any(self) -> bool {
        self.is_closing || self.is_previous_closing
    }
}

/// Markers on the first and last committed vertices of an in-progress polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingPoints {
    opening: FeatureId,
    closing: FeatureId,
}

impl ClosingPoints {
    /// Create both markers from the committed vertices.
    ///
    /// # Errors
    ///
    /// Propagates store errors (id strategy failures).
    pub fn create(store: &mut FeatureStore, mode: &str, first: Position, last: Position) -> Result<Self, DrawError> {
        let opening = store.id_strategy().get_id();
        let closing = store.id_strategy().get_id();
        store.create(vec![
            closing_point_feature(mode, first).with_id(opening.clone()),
            closing_point_feature(mode, last).with_id(closing.clone()),
        ])?;
        Ok(Self { opening, closing })
    }

    /// Move the markers onto new first/last committed vertices.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if a marker was removed behind the mode's back.
    pub fn update(&self, store: &mut FeatureStore, first: Position, last: Position) -> Result<(), DrawError> {
        store.update_geometry(vec![
            GeometryPatch { id: self.opening.clone(), geometry: Geometry::point(first) },
            GeometryPatch { id: self.closing.clone(), geometry: Geometry::point(last) },
        ])
    }

    /// Remove both markers if still present.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn delete(self, store: &mut FeatureStore) -> Result<(), DrawError> {
        let ids: Vec<FeatureId> = [self.opening, self.closing].into_iter().filter(|id| store.has(id)).collect();
        store.delete(&ids)
    }

    /// Whether the pointer sits on the opening or the closing marker.
    #[must_use]
    pub fn hit(&self, store: &FeatureStore, adapter: &dyn Adapter, event: &PointerEvent, pointer_distance: f64) -> ClosingHit {
        let near = |id: &FeatureId| match store.get(id).map(|f| &f.geometry) {
            Some(Geometry::Point { coordinates }) => pixel_distance(adapter, event, *coordinates) < pointer_distance,
            _ => false,
        };
        ClosingHit { is_closing: near(&self.opening), is_previous_closing: near(&self.closing) }
    }

    #[must_use]
    pub fn ids(&self) -> [&FeatureId; 2] {
        [&self.opening, &self.closing]
    }
}
