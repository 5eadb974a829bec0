//! Snapping a candidate coordinate onto existing geometry or a custom target.

#[cfg(test)]
#[path = "snapping_test.rs"]
mod snapping_test;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::adapter::Adapter;
use crate::behavior::{click_bounding_box, pixel_distance};
use crate::geometry::{Feature, FeatureId, Geometry, Position, round_position};
use crate::input::PointerEvent;
use crate::nearest::nearest_point_on_line;
use crate::store::FeatureStore;

/// Context passed to a custom snapping function.
#[derive(Debug, Clone)]
pub struct SnapContext {
    /// Feature currently being drawn or edited, if any.
    pub current_id: Option<FeatureId>,
    pub coordinate_precision: u32,
}

/// User-supplied snapping target.
pub type CustomSnap = Rc<dyn Fn(&PointerEvent, &SnapContext) -> Option<Position>>;

/// Which snapping sources a mode consults. Precedence: custom, coordinate, line.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapping {
    /// Snap to vertices of other features.
    pub to_coordinate: bool,
    /// Snap to the nearest point on edges of other features.
    pub to_line: bool,
    #[serde(skip)]
    pub to_custom: Option<CustomSnap>,
}

impl fmt::Debug for Snapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapping")
            .field("to_coordinate", &self.to_coordinate)
            .field("to_line", &self.to_line)
            .field("to_custom", &self.to_custom.is_some())
            .finish()
    }
}

/// Inputs shared by every snapping query.
pub struct SnapQuery<'a> {
    pub store: &'a FeatureStore,
    pub adapter: &'a dyn Adapter,
    pub event: &'a PointerEvent,
    /// Features never snapped to (the shape being drawn, the one being dragged).
    pub exclude: &'a [FeatureId],
    pub pointer_distance: f64,
    pub coordinate_precision: u32,
}

impl SnapQuery<'_> {
    fn candidates(&self) -> Vec<Feature> {
        let bbox = click_bounding_box(self.adapter, self.event, self.pointer_distance);
        self.store
            .search(&bbox)
            .into_iter()
            .filter(|f| !self.exclude.contains(&f.id) && !f.props().is_guidance())
            .collect()
    }
}

impl Snapping {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.to_coordinate || self.to_line || self.to_custom.is_some()
    }

    /// Replacement coordinate for the pointer, or `None` when nothing snaps.
    #[must_use]
    pub fn snap(&self, query: &SnapQuery<'_>) -> Option<Position> {
        if let Some(custom) = &self.to_custom {
            let ctx = SnapContext {
                current_id: query.exclude.first().cloned(),
                coordinate_precision: query.coordinate_precision,
            };
            if let Some(p) = custom(query.event, &ctx) {
                return Some(round_position(p, query.coordinate_precision));
            }
        }
        if self.to_coordinate {
            if let Some(p) = snap_to_coordinate(query) {
                return Some(p);
            }
        }
        if self.to_line {
            return snap_to_line(query);
        }
        None
    }
}

/// Nearest vertex of another feature within `pointer_distance` pixels.
#[must_use]
pub fn snap_to_coordinate(query: &SnapQuery<'_>) -> Option<Position> {
    let mut best: Option<(f64, Position)> = None;
    for feature in query.candidates() {
        for p in feature.geometry.positions() {
            let d = pixel_distance(query.adapter, query.event, p);
            if d < query.pointer_distance && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, p));
            }
        }
    }
    best.map(|(_, p)| p)
}

/// Nearest point on an edge of another line or polygon within
/// `pointer_distance` pixels.
#[must_use]
pub fn snap_to_line(query: &SnapQuery<'_>) -> Option<Position> {
    let mut best: Option<(f64, Position)> = None;
    for feature in query.candidates() {
        let line = match &feature.geometry {
            Geometry::Point { .. } => continue,
            Geometry::LineString { coordinates } => coordinates.clone(),
            Geometry::Polygon { .. } => feature.geometry.positions(),
        };
        let Some(nearest) = nearest_point_on_line(query.event.position(), &line) else {
            continue;
        };
        let d = pixel_distance(query.adapter, query.event, nearest.coordinate);
        if d < query.pointer_distance && best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, nearest.coordinate));
        }
    }
    best.map(|(_, p)| round_position(p, query.coordinate_precision))
}
