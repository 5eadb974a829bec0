//! Select mode: pick a feature, then drag, rotate, scale or reshape it.
//!
//! DESIGN
//! ======
//! Which features are selectable, and what may be done to them, is decided
//! per owning mode by [`ModeSelectFlags`]. A selection decorates the feature
//! with guidance points: one selection point per editable vertex and one
//! midpoint per edge. Those are ordinary store features owned by this mode,
//! so they render and hit-test like anything else, and they are rebuilt
//! after every edit so their positions and indices stay in step with the
//! geometry.
//!
//! Every edit is checked against the owning mode's validator before it is
//! written; a rejected edit leaves the feature as it was.

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{FinishAction, Lifecycle, ModeContext, ModeHandler, ModeNotification};
use crate::behavior::{HitOptions, features_at_pointer, pixel_distance};
use crate::consts::{DEFAULT_POINTER_DISTANCE_PX, KEY_CONTROL, KEY_DELETE, KEY_ESCAPE, props};
use crate::error::DrawError;
use crate::geodesic::{MercatorPoint, lng_lat_to_web_mercator, web_mercator_centroid, web_mercator_midpoint, web_mercator_to_lng_lat};
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position, is_valid_position, round_position};
use crate::input::{Button, Cursor, KeyboardEvent, PointerEvent};
use crate::snapping::Snapping;
use crate::store::{GeometryPatch, PropertyPatch};
use crate::style::FeatureStyle;
use crate::validate::{FeatureValidator, Intrinsic, UpdateType};

// =============================================================================
// CONFIG
// =============================================================================

/// What may be done to individual vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateFlags {
    pub draggable: bool,
    /// Secondary-click removes a vertex.
    pub deletable: bool,
    /// Show edge midpoints; clicking one inserts a vertex.
    pub midpoints: bool,
    /// Dragged vertices snap to vertices of other features.
    pub snappable: bool,
}

/// What may be done to a selected feature as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub draggable: bool,
    pub rotateable: bool,
    pub scaleable: bool,
    pub deletable: bool,
    /// `None` hides selection points.
    pub coordinates: Option<CoordinateFlags>,
}

/// Flags for the features of one owning mode. `feature: None` makes them
/// unselectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSelectFlags {
    pub feature: Option<FeatureFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectKeyEvents {
    pub deselect: Option<String>,
    pub delete: Option<String>,
    /// Keys held during a drag to rotate.
    pub rotate: Vec<String>,
    /// Keys held during a drag to scale.
    pub scale: Vec<String>,
}

impl Default for SelectKeyEvents {
    fn default() -> Self {
        Self {
            deselect: Some(KEY_ESCAPE.to_string()),
            delete: Some(KEY_DELETE.to_string()),
            rotate: vec![KEY_CONTROL.to_string(), "r".to_string()],
            scale: vec![KEY_CONTROL.to_string(), "s".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectStyles {
    pub selected_fill_color: String,
    pub selected_fill_opacity: f64,
    pub selected_outline_color: String,
    pub selected_outline_width: f64,
    pub selected_line_color: String,
    pub selected_line_width: f64,
    pub selected_point_color: String,
    pub selected_point_width: f64,
    pub selection_point_color: String,
    pub selection_point_width: f64,
    pub selection_point_outline_color: String,
    pub selection_point_outline_width: f64,
    pub mid_point_color: String,
    pub mid_point_width: f64,
    pub mid_point_outline_color: String,
    pub mid_point_outline_width: f64,
}

impl Default for SelectStyles {
    fn default() -> Self {
        Self {
            selected_fill_color: "#f56a0a".to_string(),
            selected_fill_opacity: 0.3,
            selected_outline_color: "#f56a0a".to_string(),
            selected_outline_width: 4.0,
            selected_line_color: "#f56a0a".to_string(),
            selected_line_width: 4.0,
            selected_point_color: "#f56a0a".to_string(),
            selected_point_width: 6.0,
            selection_point_color: "#ffffff".to_string(),
            selection_point_width: 6.0,
            selection_point_outline_color: "#f56a0a".to_string(),
            selection_point_outline_width: 2.0,
            mid_point_color: "#f56a0a".to_string(),
            mid_point_width: 4.0,
            mid_point_outline_color: "#ffffff".to_string(),
            mid_point_outline_width: 1.0,
        }
    }
}

impl SelectStyles {
    fn selected(&self) -> FeatureStyle {
        FeatureStyle {
            point_color: self.selected_point_color.clone(),
            point_width: self.selected_point_width,
            line_string_color: self.selected_line_color.clone(),
            line_string_width: self.selected_line_width,
            polygon_fill_color: self.selected_fill_color.clone(),
            polygon_fill_opacity: self.selected_fill_opacity,
            polygon_outline_color: self.selected_outline_color.clone(),
            polygon_outline_width: self.selected_outline_width,
            z_index: 10,
            ..FeatureStyle::default()
        }
    }

    fn selection_point(&self) -> FeatureStyle {
        FeatureStyle {
            point_color: self.selection_point_color.clone(),
            point_width: self.selection_point_width,
            point_outline_color: self.selection_point_outline_color.clone(),
            point_outline_width: self.selection_point_outline_width,
            z_index: 40,
            ..FeatureStyle::default()
        }
    }

    fn mid_point(&self) -> FeatureStyle {
        FeatureStyle {
            point_color: self.mid_point_color.clone(),
            point_width: self.mid_point_width,
            point_outline_color: self.mid_point_outline_color.clone(),
            point_outline_width: self.mid_point_outline_width,
            z_index: 35,
            ..FeatureStyle::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectModeConfig {
    pub mode_name: String,
    /// Keyed by owning mode name.
    pub flags: HashMap<String, ModeSelectFlags>,
    pub pointer_distance: f64,
    /// Clicking empty map deselects.
    pub allow_manual_deselection: bool,
    pub key_events: SelectKeyEvents,
    pub styles: SelectStyles,
}

impl Default for SelectModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "select".to_string(),
            flags: HashMap::new(),
            pointer_distance: DEFAULT_POINTER_DISTANCE_PX,
            allow_manual_deselection: true,
            key_events: SelectKeyEvents::default(),
            styles: SelectStyles::default(),
        }
    }
}

// =============================================================================
// VERTEX HELPERS
// =============================================================================

/// Editable vertices: a polygon ring without its closing position.
fn vertices(geometry: &Geometry) -> Vec<Position> {
    match geometry {
        Geometry::Point { coordinates } => vec![*coordinates],
        Geometry::LineString { coordinates } => coordinates.clone(),
        Geometry::Polygon { .. } => {
            let mut ring = geometry.positions();
            ring.pop();
            ring
        }
    }
}

/// Geometry of the same type built from edited vertices.
fn with_vertices(geometry: &Geometry, mut vertices: Vec<Position>) -> Option<Geometry> {
    match geometry {
        Geometry::Point { .. } => vertices.first().copied().map(Geometry::point),
        Geometry::LineString { .. } => Some(Geometry::line_string(vertices)),
        Geometry::Polygon { .. } => {
            let first = *vertices.first()?;
            vertices.push(first);
            Some(Geometry::polygon(vertices))
        }
    }
}

/// Edges as `(start, end)` vertex pairs; polygons include the closing edge.
fn edges(geometry: &Geometry, vertices: &[Position]) -> Vec<(Position, Position)> {
    let mut edges: Vec<(Position, Position)> = vertices.windows(2).map(|w| (w[0], w[1])).collect();
    if let (Geometry::Polygon { .. }, [first, .., last]) = (geometry, vertices) {
        edges.push((*last, *first));
    }
    edges
}

/// Smallest vertex count that keeps the geometry well formed.
fn min_vertices(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::Point { .. } => 1,
        Geometry::LineString { .. } => 2,
        Geometry::Polygon { .. } => 3,
    }
}

/// Apply a Mercator-space transform to every position, or `None` if the
/// result leaves the valid coordinate range.
fn transform<F>(geometry: &Geometry, precision: u32, f: F) -> Option<Geometry>
where
    F: Fn(MercatorPoint) -> MercatorPoint,
{
    let moved = geometry.map_positions(|p| round_position(web_mercator_to_lng_lat(f(lng_lat_to_web_mercator(p))), precision));
    moved.positions().iter().all(|p| is_valid_position(*p)).then_some(moved)
}

// =============================================================================
// MODE
// =============================================================================

struct Selection {
    id: FeatureId,
    mode: String,
    flags: FeatureFlags,
    selection_points: Vec<FeatureId>,
    mid_points: Vec<FeatureId>,
}

#[derive(Debug, Clone, Copy)]
enum Drag {
    Coordinate { index: usize },
    Feature { last: MercatorPoint },
    Rotate { last_angle: f64 },
    Scale { last_distance: f64 },
}

impl Drag {
    fn action(self) -> FinishAction {
        match self {
            Self::Coordinate { .. } => FinishAction::DragCoordinate,
            Self::Feature { .. } => FinishAction::DragFeature,
            Self::Rotate { .. } => FinishAction::Rotate,
            Self::Scale { .. } => FinishAction::Scale,
        }
    }
}

pub struct SelectMode {
    lifecycle: Lifecycle,
    config: SelectModeConfig,
    selection: Option<Selection>,
    drag: Option<Drag>,
}

impl SelectMode {
    #[must_use]
    pub fn new(config: SelectModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, selection: None, drag: None }
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&FeatureId> {
        self.selection.as_ref().map(|s| &s.id)
    }

    fn flags_for(&self, feature: &Feature) -> Option<FeatureFlags> {
        let mode = feature.props().mode()?;
        self.config.flags.get(mode).and_then(|f| f.feature)
    }

    /// Select `id`, dropping any previous selection. Unselectable features
    /// are ignored.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound` when `id` is not stored, lifecycle errors when the
    /// mode is not active.
    pub fn select_feature(&mut self, ctx: &mut ModeContext<'_>, id: &FeatureId) -> Result<(), DrawError> {
        self.lifecycle.ensure_active()?;
        let feature = ctx.store.copy(id)?;
        if self.selected_id() == Some(id) {
            return Ok(());
        }
        let Some(flags) = self.flags_for(&feature) else {
            tracing::debug!(%id, "feature is not selectable");
            return Ok(());
        };
        self.deselect(ctx)?;

        ctx.store.update_property(vec![PropertyPatch::set(id, props::SELECTED, true)])?;
        let mut selection = Selection {
            id: id.clone(),
            mode: feature.props().mode().unwrap_or_default().to_string(),
            flags,
            selection_points: Vec::new(),
            mid_points: Vec::new(),
        };
        self.create_guidance(ctx, &mut selection, &feature.geometry)?;
        self.selection = Some(selection);
        self.lifecycle.set_selecting()?;
        ctx.notify(ModeNotification::Select(id.clone()));
        Ok(())
    }

    /// Drop the current selection, if any.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn deselect(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        self.drag = None;
        let Some(selection) = self.selection.take() else {
            return Ok(());
        };
        if ctx.store.has(&selection.id) {
            ctx.store.update_property(vec![PropertyPatch::remove(&selection.id, props::SELECTED)])?;
        }
        let guidance: Vec<FeatureId> = selection.selection_points.into_iter().chain(selection.mid_points).collect();
        ctx.delete_present(&guidance)?;
        self.lifecycle.set_started();
        ctx.notify(ModeNotification::Deselect(selection.id));
        Ok(())
    }

    // --- Guidance ---

    fn guidance_features(&self, selection: &Selection, geometry: &Geometry, precision: u32) -> (Vec<NewFeature>, Vec<NewFeature>) {
        let name = self.lifecycle.name();
        let Some(coordinates) = selection.flags.coordinates else {
            return (Vec::new(), Vec::new());
        };
        if matches!(geometry, Geometry::Point { .. }) {
            return (Vec::new(), Vec::new());
        }
        let verts = vertices(geometry);
        let points = verts
            .iter()
            .enumerate()
            .map(|(i, v)| {
                NewFeature::owned_by(name, Geometry::point(*v))
                    .with_property(props::SELECTION_POINT, true)
                    .with_property(props::SELECTION_POINT_INDEX, i)
            })
            .collect();
        let mids = if coordinates.midpoints {
            edges(geometry, &verts)
                .into_iter()
                .enumerate()
                .map(|(i, (a, b))| {
                    NewFeature::owned_by(name, Geometry::point(round_position(web_mercator_midpoint(a, b), precision)))
                        .with_property(props::MID_POINT, true)
                        .with_property(props::MID_POINT_SEGMENT, i)
                })
                .collect()
        } else {
            Vec::new()
        };
        (points, mids)
    }

    fn create_guidance(&self, ctx: &mut ModeContext<'_>, selection: &mut Selection, geometry: &Geometry) -> Result<(), DrawError> {
        let (points, mids) = self.guidance_features(selection, geometry, ctx.coordinate_precision);
        let point_count = points.len();
        let mut ids = ctx.store.create(points.into_iter().chain(mids).collect())?;
        selection.mid_points = ids.split_off(point_count.min(ids.len()));
        selection.selection_points = ids;
        Ok(())
    }

    /// Move the guidance points onto the current geometry, rebuilding them
    /// when the vertex count changed.
    fn sync_guidance(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let Some(mut selection) = self.selection.take() else {
            return Ok(());
        };
        let geometry = ctx.store.get_geometry_copy(&selection.id)?;
        let (points, mids) = self.guidance_features(&selection, &geometry, ctx.coordinate_precision);

        if points.len() == selection.selection_points.len() && mids.len() == selection.mid_points.len() {
            let patches: Vec<GeometryPatch> = selection
                .selection_points
                .iter()
                .chain(&selection.mid_points)
                .zip(points.into_iter().chain(mids))
                .map(|(id, f)| GeometryPatch { id: id.clone(), geometry: f.geometry })
                .collect();
            ctx.store.update_geometry(patches)?;
        } else {
            let stale: Vec<FeatureId> = selection.selection_points.drain(..).chain(selection.mid_points.drain(..)).collect();
            ctx.delete_present(&stale)?;
            self.create_guidance(ctx, &mut selection, &geometry)?;
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Index of the selection point under the pointer, nearest first.
    fn selection_point_at(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> Option<usize> {
        self.nearest_guidance(ctx, event, |s| &s.selection_points)
    }

    /// Segment index of the midpoint under the pointer.
    fn mid_point_at(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> Option<usize> {
        self.nearest_guidance(ctx, event, |s| &s.mid_points)
    }

    fn nearest_guidance<F>(&self, ctx: &ModeContext<'_>, event: &PointerEvent, pick: F) -> Option<usize>
    where
        F: Fn(&Selection) -> &Vec<FeatureId>,
    {
        let selection = self.selection.as_ref()?;
        let mut best: Option<(f64, usize)> = None;
        for (i, id) in pick(selection).iter().enumerate() {
            let Some(Geometry::Point { coordinates }) = ctx.store.get(id).map(|f| &f.geometry) else {
                continue;
            };
            let d = pixel_distance(&*ctx.adapter, event, *coordinates);
            if d < self.config.pointer_distance && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, i));
            }
        }
        best.map(|(_, i)| i)
    }

    fn hit_selectable(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> Option<Feature> {
        let opts = HitOptions { pointer_distance: self.config.pointer_distance, include_guidance: false };
        features_at_pointer(&*ctx.store, &*ctx.adapter, event, opts)
            .into_iter()
            .find(|f| self.flags_for(f).is_some())
    }

    fn over_selected(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> bool {
        let Some(selection) = self.selection.as_ref() else {
            return false;
        };
        let opts = HitOptions { pointer_distance: self.config.pointer_distance, include_guidance: false };
        features_at_pointer(&*ctx.store, &*ctx.adapter, event, opts)
            .iter()
            .any(|f| f.id == selection.id)
    }

    // --- Edits ---

    fn owning_validator(ctx: &ModeContext<'_>, mode: &str) -> FeatureValidator {
        ctx.validators
            .get(mode)
            .cloned()
            .unwrap_or_else(|| FeatureValidator::new(Intrinsic::AnyGeometry, None))
    }

    /// Validate and write a new geometry for the selected feature, then
    /// refresh the guidance points. Returns whether the edit was applied.
    fn apply_edit(&mut self, ctx: &mut ModeContext<'_>, geometry: Geometry, update_type: UpdateType) -> Result<bool, DrawError> {
        let Some(selection) = self.selection.as_ref() else {
            return Ok(false);
        };
        let validator = Self::owning_validator(ctx, &selection.mode);
        let id = selection.id.clone();
        if !ctx.apply_validated(&validator, &id, geometry, update_type)? {
            return Ok(false);
        }
        self.sync_guidance(ctx)?;
        Ok(true)
    }

    fn edit_vertices<F>(&mut self, ctx: &mut ModeContext<'_>, update_type: UpdateType, edit: F) -> Result<bool, DrawError>
    where
        F: FnOnce(&Geometry, &mut Vec<Position>) -> bool,
    {
        let Some(selection) = self.selection.as_ref() else {
            return Ok(false);
        };
        let geometry = ctx.store.get_geometry_copy(&selection.id)?;
        let mut verts = vertices(&geometry);
        if !edit(&geometry, &mut verts) {
            return Ok(false);
        }
        let Some(next) = with_vertices(&geometry, verts) else {
            return Ok(false);
        };
        self.apply_edit(ctx, next, update_type)
    }

    fn finish(&self, ctx: &mut ModeContext<'_>, action: FinishAction) {
        if let Some(selection) = &self.selection {
            ctx.notify(ModeNotification::Finish { id: selection.id.clone(), action });
        }
    }

    fn insert_vertex(&mut self, ctx: &mut ModeContext<'_>, segment: usize) -> Result<(), DrawError> {
        let precision = ctx.coordinate_precision;
        let applied = self.edit_vertices(ctx, UpdateType::Commit, |geometry, verts| {
            let Some((a, b)) = edges(geometry, verts).get(segment).copied() else {
                return false;
            };
            verts.insert(segment + 1, round_position(web_mercator_midpoint(a, b), precision));
            true
        })?;
        if applied {
            self.finish(ctx, FinishAction::InsertCoordinate);
        }
        Ok(())
    }

    fn delete_vertex(&mut self, ctx: &mut ModeContext<'_>, index: usize) -> Result<(), DrawError> {
        let applied = self.edit_vertices(ctx, UpdateType::Commit, |geometry, verts| {
            if index >= verts.len() || verts.len() <= min_vertices(geometry) {
                return false;
            }
            verts.remove(index);
            true
        })?;
        if applied {
            self.finish(ctx, FinishAction::DeleteCoordinate);
        }
        Ok(())
    }

    fn delete_selected(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let Some(id) = self.selected_id().cloned() else {
            return Ok(());
        };
        self.deselect(ctx)?;
        ctx.delete_present(&[id])
    }

    fn drag_to(&mut self, ctx: &mut ModeContext<'_>, drag: Drag, event: &PointerEvent) -> Result<Option<Drag>, DrawError> {
        let Some(selection) = self.selection.as_ref() else {
            return Ok(None);
        };
        let precision = ctx.coordinate_precision;
        let pointer = lng_lat_to_web_mercator(event.position());

        match drag {
            Drag::Coordinate { index } => {
                let snappable = selection.flags.coordinates.is_some_and(|c| c.snappable);
                let snapping = Snapping { to_coordinate: snappable, ..Snapping::default() };
                let exclude = [selection.id.clone()];
                let position = ctx.snapped_position(&snapping, event, &exclude, self.config.pointer_distance);
                self.edit_vertices(ctx, UpdateType::Provisional, |_, verts| match verts.get_mut(index) {
                    Some(v) => {
                        *v = position;
                        true
                    }
                    None => false,
                })?;
                Ok(Some(drag))
            }
            Drag::Feature { last } => {
                let geometry = ctx.store.get_geometry_copy(&selection.id)?;
                let (dx, dy) = (pointer.x - last.x, pointer.y - last.y);
                let Some(moved) = transform(&geometry, precision, |m| MercatorPoint::new(m.x + dx, m.y + dy)) else {
                    return Ok(Some(drag));
                };
                if self.apply_edit(ctx, moved, UpdateType::Provisional)? {
                    return Ok(Some(Drag::Feature { last: pointer }));
                }
                Ok(Some(drag))
            }
            Drag::Rotate { last_angle } => {
                let geometry = ctx.store.get_geometry_copy(&selection.id)?;
                let Some(c) = web_mercator_centroid(&geometry.positions()) else {
                    return Ok(Some(drag));
                };
                let angle = (pointer.y - c.y).atan2(pointer.x - c.x);
                let (sin, cos) = (angle - last_angle).sin_cos();
                let rotated = transform(&geometry, precision, |m| {
                    let (x, y) = (m.x - c.x, m.y - c.y);
                    MercatorPoint::new(c.x + x * cos - y * sin, c.y + x * sin + y * cos)
                });
                let Some(rotated) = rotated else {
                    return Ok(Some(drag));
                };
                if self.apply_edit(ctx, rotated, UpdateType::Provisional)? {
                    return Ok(Some(Drag::Rotate { last_angle: angle }));
                }
                Ok(Some(drag))
            }
            Drag::Scale { last_distance } => {
                let geometry = ctx.store.get_geometry_copy(&selection.id)?;
                let Some(c) = web_mercator_centroid(&geometry.positions()) else {
                    return Ok(Some(drag));
                };
                let distance = pointer.distance(c);
                if last_distance <= 0.0 || distance <= 0.0 {
                    return Ok(Some(drag));
                }
                let factor = distance / last_distance;
                let scaled = transform(&geometry, precision, |m| {
                    MercatorPoint::new(c.x + (m.x - c.x) * factor, c.y + (m.y - c.y) * factor)
                });
                let Some(scaled) = scaled else {
                    return Ok(Some(drag));
                };
                if self.apply_edit(ctx, scaled, UpdateType::Provisional)? {
                    return Ok(Some(Drag::Scale { last_distance: distance }));
                }
                Ok(Some(drag))
            }
        }
    }
}

impl Default for SelectMode {
    fn default() -> Self {
        Self::new(SelectModeConfig::default())
    }
}

impl ModeHandler for SelectMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn start_cursor(&self) -> Cursor {
        Cursor::Unset
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let coordinates = self.selection.as_ref().and_then(|s| s.flags.coordinates);

        if event.button == Button::Secondary {
            if let (Some(flags), Some(index)) = (coordinates, self.selection_point_at(ctx, event)) {
                if flags.deletable {
                    self.delete_vertex(ctx, index)?;
                }
            }
            return Ok(());
        }

        if coordinates.is_some_and(|c| c.midpoints) {
            if let Some(segment) = self.mid_point_at(ctx, event) {
                return self.insert_vertex(ctx, segment);
            }
        }
        if self.selection_point_at(ctx, event).is_some() {
            return Ok(());
        }

        match self.hit_selectable(ctx, event) {
            Some(feature) => self.select_feature(ctx, &feature.id),
            None if self.config.allow_manual_deselection => self.deselect(ctx),
            None => Ok(()),
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let cursor = if self.selection_point_at(ctx, event).is_some() || self.mid_point_at(ctx, event).is_some() {
            Cursor::Pointer
        } else if self.over_selected(ctx, event) && self.selection.as_ref().is_some_and(|s| s.flags.draggable) {
            Cursor::Move
        } else if self.hit_selectable(ctx, event).is_some() {
            Cursor::Pointer
        } else {
            Cursor::Unset
        };
        ctx.adapter.set_cursor(cursor);
        Ok(())
    }

    fn on_key_up(&mut self, ctx: &mut ModeContext<'_>, event: &KeyboardEvent) -> Result<(), DrawError> {
        let deletable = self.selection.as_ref().is_some_and(|s| s.flags.deletable);
        if deletable && event.is(self.config.key_events.delete.as_ref()) {
            return self.delete_selected(ctx);
        }
        if event.is(self.config.key_events.deselect.as_ref()) {
            return self.deselect(ctx);
        }
        Ok(())
    }

    fn on_drag_start(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let Some(selection) = self.selection.as_ref() else {
            return Ok(());
        };
        let flags = selection.flags;
        let pointer = lng_lat_to_web_mercator(event.position());
        let centroid = ctx
            .store
            .get(&selection.id)
            .and_then(|f| web_mercator_centroid(&f.geometry.positions()));

        let drag = if flags.rotateable && event.holds_all(&self.config.key_events.rotate) {
            centroid.map(|c| Drag::Rotate { last_angle: (pointer.y - c.y).atan2(pointer.x - c.x) })
        } else if flags.scaleable && event.holds_all(&self.config.key_events.scale) {
            centroid.map(|c| Drag::Scale { last_distance: pointer.distance(c) })
        } else if let Some(index) = self
            .selection_point_at(ctx, event)
            .filter(|_| flags.coordinates.is_some_and(|c| c.draggable))
        {
            Some(Drag::Coordinate { index })
        } else if flags.draggable && self.over_selected(ctx, event) {
            Some(Drag::Feature { last: pointer })
        } else {
            None
        };

        if drag.is_some() {
            ctx.adapter.set_draggability(false);
            ctx.adapter.set_cursor(Cursor::Grabbing);
        }
        self.drag = drag;
        Ok(())
    }

    fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        self.drag = self.drag_to(ctx, drag, event)?;
        Ok(())
    }

    fn on_drag_end(&mut self, ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        ctx.adapter.set_draggability(true);
        ctx.adapter.set_cursor(Cursor::Move);
        self.finish(ctx, drag.action());
        Ok(())
    }

    fn clean_up(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        if self.drag.take().is_some() {
            ctx.adapter.set_draggability(true);
        }
        self.deselect(ctx)
    }

    fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        let p = feature.props();
        if p.selection_point() {
            self.config.styles.selection_point()
        } else if p.mid_point() {
            self.config.styles.mid_point()
        } else if p.selected() {
            self.config.styles.selected()
        } else {
            FeatureStyle::default()
        }
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(Intrinsic::Reject, None)
    }
}
