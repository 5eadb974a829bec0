//! Feature model: ids, geometries, properties and bounding boxes.
//!
//! This module defines the data types every other layer speaks: the
//! GeoJSON-shaped [`Feature`] and [`Geometry`], the sparse [`NewFeature`]
//! accepted by the store, a typed accessor for the open-ended `properties`
//! bag ([`Props`]), and a handful of coordinate helpers (rounding, range and
//! precision checks, point-in-polygon).

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::props;

/// A `[longitude, latitude]` pair in degrees.
pub type Position = [f64; 2];

/// Open-ended per-feature properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Uuid> for FeatureId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

/// Geometry type tag, used for dispatch and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        };
        f.write_str(name)
    }
}

/// A GeoJSON geometry. Polygons carry a single outer ring; holes are not supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    #[must_use]
    pub fn point(position: Position) -> Self {
        Self::Point { coordinates: position }
    }

    #[must_use]
    pub fn line_string(coordinates: Vec<Position>) -> Self {
        Self::LineString { coordinates }
    }

    /// Build a polygon from its outer ring.
    #[must_use]
    pub fn polygon(ring: Vec<Position>) -> Self {
        Self::Polygon { coordinates: vec![ring] }
    }

    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point { .. } => GeometryKind::Point,
            Self::LineString { .. } => GeometryKind::LineString,
            Self::Polygon { .. } => GeometryKind::Polygon,
        }
    }

    /// The outer ring of a polygon, or `None` for other geometry types.
    #[must_use]
    pub fn outer_ring(&self) -> Option<&[Position]> {
        match self {
            Self::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            _ => None,
        }
    }

    /// The editable vertex list: the point itself, the line's coordinates, or
    /// the polygon's outer ring including its closing position.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Self::Point { coordinates } => vec![*coordinates],
            Self::LineString { coordinates } => coordinates.clone(),
            Self::Polygon { coordinates } => coordinates.first().cloned().unwrap_or_default(),
        }
    }

    /// Apply `f` to every position, keeping the geometry type.
    #[must_use]
    pub fn map_positions<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Position) -> Position,
    {
        match self {
            Self::Point { coordinates } => Self::Point { coordinates: f(*coordinates) },
            Self::LineString { coordinates } => Self::LineString { coordinates: coordinates.iter().map(|p| f(*p)).collect() },
            Self::Polygon { coordinates } => Self::Polygon {
                coordinates: coordinates
                    .iter()
                    .map(|ring| ring.iter().map(|p| f(*p)).collect())
                    .collect(),
            },
        }
    }

    /// Round every coordinate to `precision` decimal places.
    #[must_use]
    pub fn rounded(&self, precision: u32) -> Self {
        self.map_positions(|p| round_position(p, precision))
    }

    /// Bounding box of all positions, or `None` when the geometry is empty.
    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Self::Point { coordinates } => Some(BBox::from_position(*coordinates)),
            Self::LineString { coordinates } => BBox::from_positions(coordinates),
            Self::Polygon { coordinates } => BBox::from_positions(coordinates.iter().flatten()),
        }
    }
}

/// A stored feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    #[must_use]
    pub fn props(&self) -> Props<'_> {
        Props::new(&self.properties)
    }
}

/// A feature about to enter the store. A missing id is filled in by the id strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct NewFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl NewFeature {
    /// A feature owned by `mode` with no other properties.
    #[must_use]
    pub fn owned_by(mode: &str, geometry: Geometry) -> Self {
        let mut properties = Properties::new();
        properties.insert(props::MODE.to_string(), mode.into());
        Self { id: None, geometry, properties }
    }

    /// Add a property, builder style.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<Feature> for NewFeature {
    fn from(feature: Feature) -> Self {
        Self { id: Some(feature.id), geometry: feature.geometry, properties: feature.properties }
    }
}

/// Typed access to well-known fields of a feature's `properties`.
pub struct Props<'a> {
    value: &'a Properties,
}

impl<'a> Props<'a> {
    #[must_use]
    pub fn new(value: &'a Properties) -> Self {
        Self { value }
    }

    fn flag(&self, key: &str) -> bool {
        self.value
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn index(&self, key: &str) -> Option<usize> {
        self.value
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
    }

    /// Name of the mode that owns the feature.
    #[must_use]
    pub fn mode(&self) -> Option<&'a str> {
        self.value.get(props::MODE).and_then(|v| v.as_str())
    }

    #[must_use]
    pub fn selected(&self) -> bool {
        self.flag(props::SELECTED)
    }

    #[must_use]
    pub fn currently_drawing(&self) -> bool {
        self.flag(props::CURRENTLY_DRAWING)
    }

    #[must_use]
    pub fn closing_point(&self) -> bool {
        self.flag(props::CLOSING_POINT)
    }

    #[must_use]
    pub fn selection_point(&self) -> bool {
        self.flag(props::SELECTION_POINT)
    }

    #[must_use]
    pub fn selection_point_index(&self) -> Option<usize> {
        self.index(props::SELECTION_POINT_INDEX)
    }

    #[must_use]
    pub fn mid_point(&self) -> bool {
        self.flag(props::MID_POINT)
    }

    #[must_use]
    pub fn mid_point_segment(&self) -> Option<usize> {
        self.index(props::MID_POINT_SEGMENT)
    }

    /// Geodesic radius recorded by the circle mode.
    #[must_use]
    pub fn radius_km(&self) -> Option<f64> {
        self.value
            .get(props::RADIUS_KILOMETERS)
            .and_then(serde_json::Value::as_f64)
    }

    /// Transient helper drawn by a mode (closing, selection or midpoint marker).
    #[must_use]
    pub fn is_guidance(&self) -> bool {
        self.closing_point() || self.selection_point() || self.mid_point()
    }
}

/// Axis-aligned longitude/latitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BBox {
    #[must_use]
    pub fn new(a: Position, b: Position) -> Self {
        Self {
            min_lng: a[0].min(b[0]),
            min_lat: a[1].min(b[1]),
            max_lng: a[0].max(b[0]),
            max_lat: a[1].max(b[1]),
        }
    }

    #[must_use]
    pub fn from_position(p: Position) -> Self {
        Self::new(p, p)
    }

    /// Smallest box covering every position, `None` for an empty iterator.
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut iter = positions.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::from_position(first), |acc, p| acc.expand(*p)))
    }

    #[must_use]
    pub fn expand(self, p: Position) -> Self {
        Self {
            min_lng: self.min_lng.min(p[0]),
            min_lat: self.min_lat.min(p[1]),
            max_lng: self.max_lng.max(p[0]),
            max_lat: self.max_lat.max(p[1]),
        }
    }

    #[must_use]
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lng <= other.max_lng
            && other.min_lng <= self.max_lng
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    #[must_use]
    pub fn contains(&self, p: Position) -> bool {
        p[0] >= self.min_lng && p[0] <= self.max_lng && p[1] >= self.min_lat && p[1] <= self.max_lat
    }
}

// =============================================================================
// COORDINATE HELPERS
// =============================================================================

fn precision_factor(precision: u32) -> f64 {
    10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX))
}

/// Round `value` to `precision` decimal places.
#[must_use]
pub fn limit_precision(value: f64, precision: u32) -> f64 {
    let factor = precision_factor(precision);
    (value * factor).round() / factor
}

#[must_use]
pub fn round_position(p: Position, precision: u32) -> Position {
    [limit_precision(p[0], precision), limit_precision(p[1], precision)]
}

/// Finite and within the longitude/latitude ranges.
#[must_use]
pub fn is_valid_position(p: Position) -> bool {
    p[0].is_finite() && p[1].is_finite() && (-180.0..=180.0).contains(&p[0]) && (-90.0..=90.0).contains(&p[1])
}

/// True when neither component carries more than `precision` decimals.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn has_valid_precision(p: Position, precision: u32) -> bool {
    limit_precision(p[0], precision) == p[0] && limit_precision(p[1], precision) == p[1]
}

/// Ray-casting containment test against a closed ring. Points on the boundary
/// may land either side.
#[must_use]
pub fn point_in_polygon(point: Position, ring: &[Position]) -> bool {
    let [x, y] = point;
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
