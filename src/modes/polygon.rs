//! Polygon mode.
//!
//! The stored ring is always closed. Committed vertices come first, then one
//! provisional vertex tracking the pointer, then the first vertex again:
//!
//! | committed | after click        | after mouse move           |
//! |-----------|--------------------|----------------------------|
//! | 1         | `[c, c, c, c]`     | `[c0, p, p + e, c0]`       |
//! | 2         | `[c0, c1, c1, c0]` | `[c0, c1, p, c0]`          |
//! | n >= 3    | `[.., cn, cn, c0]` | `[.., cn, p, c0]`          |
//!
//! The tiny offset `e` keeps the one-vertex ring from collapsing into a
//! zero-area sliver. Once three vertices are committed, closing-point markers
//! appear on the first and last of them; clicking either closes the ring.

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;

use serde::{Deserialize, Serialize};

use super::{KeyEvents, Lifecycle, ModeContext, ModeHandler};
use crate::behavior::{ClosingHit, ClosingPoints};
use crate::consts::{DEFAULT_POINTER_DISTANCE_PX, MIN_POLYGON_EPSILON, props};
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position, round_position};
use crate::input::{Cursor, KeyboardEvent, PointerEvent};
use crate::snapping::Snapping;
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation, encloses_area, ensure_right_hand_rule};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub snapping: Snapping,
    pub key_events: KeyEvents,
    pub pointer_distance: f64,
    /// Reject edits that make the ring cross itself.
    pub prevent_self_intersection: bool,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for PolygonModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "polygon".to_string(),
            styles: ShapeStyles::default(),
            snapping: Snapping::default(),
            key_events: KeyEvents::default(),
            pointer_distance: DEFAULT_POINTER_DISTANCE_PX,
            prevent_self_intersection: false,
            validation: None,
        }
    }
}

struct PolygonDrawing {
    id: FeatureId,
    committed: Vec<Position>,
    closing: Option<ClosingPoints>,
}

impl PolygonDrawing {
    fn ring_with(&self, provisional: Position) -> Vec<Position> {
        let first = self.committed[0];
        let mut ring = self.committed.clone();
        ring.push(provisional);
        ring.push(first);
        ring
    }
}

pub struct PolygonMode {
    lifecycle: Lifecycle,
    config: PolygonModeConfig,
    drawing: Option<PolygonDrawing>,
}

/// Offset of the provisional twin vertex while only one vertex is committed.
fn provisional_epsilon(precision: u32) -> f64 {
    let exponent = i32::try_from(precision).unwrap_or(i32::MAX).saturating_sub(1);
    MIN_POLYGON_EPSILON.max(10f64.powi(-exponent))
}

impl PolygonMode {
    #[must_use]
    pub fn new(config: PolygonModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, drawing: None }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&FeatureId> {
        self.drawing.as_ref().map(|d| &d.id)
    }

    fn closing_hit(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> ClosingHit {
        self.drawing
            .as_ref()
            .and_then(|d| d.closing.as_ref())
            .map(|c| c.hit(&*ctx.store, &*ctx.adapter, event, self.config.pointer_distance))
            .unwrap_or_default()
    }

    fn begin(&mut self, ctx: &mut ModeContext<'_>, position: Position) -> Result<(), DrawError> {
        let ring = vec![position; 4];
        let feature = NewFeature::owned_by(self.lifecycle.name(), Geometry::polygon(ring))
            .with_property(props::CURRENTLY_DRAWING, true);
        let ids = ctx.store.create(vec![feature])?;
        let Some(id) = ids.into_iter().next() else {
            return Ok(());
        };
        self.lifecycle.set_drawing()?;
        ctx.adapter.set_double_click_to_zoom(false);
        self.drawing = Some(PolygonDrawing { id, committed: vec![position], closing: None });
        Ok(())
    }

    fn commit(&mut self, ctx: &mut ModeContext<'_>, position: Position) -> Result<(), DrawError> {
        let validator = self.validator();
        let name = self.lifecycle.name().to_string();
        let Some(drawing) = self.drawing.as_mut() else {
            return Ok(());
        };
        if drawing.committed.contains(&position) {
            return Ok(());
        }

        let mut committed = drawing.committed.clone();
        committed.push(position);
        let first = committed[0];
        let mut ring = committed.clone();
        ring.push(position);
        ring.push(first);
        if !ctx.apply_validated(&validator, &drawing.id, Geometry::polygon(ring), UpdateType::Commit)? {
            return Ok(());
        }
        drawing.committed = committed;

        if drawing.committed.len() >= 3 {
            match &drawing.closing {
                Some(closing) => closing.update(ctx.store, first, position)?,
                None => drawing.closing = Some(ClosingPoints::create(ctx.store, &name, first, position)?),
            }
        }
        Ok(())
    }

    fn close(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let validator = self.validator();
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        if drawing.committed.len() < 3 {
            return Ok(());
        }
        let mut ring = drawing.committed.clone();
        ring.push(drawing.committed[0]);
        if !encloses_area(&ring) {
            tracing::debug!(mode = self.lifecycle.name(), "degenerate polygon not closed");
            return Ok(());
        }
        let ring = ensure_right_hand_rule(ring);
        if !ctx.apply_validated(&validator, &drawing.id, Geometry::polygon(ring), UpdateType::Finish)? {
            return Ok(());
        }

        let Some(drawing) = self.drawing.take() else {
            return Ok(());
        };
        if let Some(closing) = drawing.closing {
            closing.delete(ctx.store)?;
        }
        ctx.finish_shape(&drawing.id)?;
        self.lifecycle.set_started();
        ctx.adapter.set_double_click_to_zoom(true);
        tracing::debug!(mode = self.lifecycle.name(), id = %drawing.id, "polygon closed");
        Ok(())
    }
}

impl Default for PolygonMode {
    fn default() -> Self {
        Self::new(PolygonModeConfig::default())
    }
}

impl ModeHandler for PolygonMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        if self.closing_hit(ctx, event).any() {
            return self.close(ctx);
        }
        let exclude: Vec<FeatureId> = self.current_id().into_iter().cloned().collect();
        let position = ctx.snapped_position(&self.config.snapping, event, &exclude, self.config.pointer_distance);
        if self.drawing.is_none() {
            return self.begin(ctx, position);
        }
        self.commit(ctx, position)
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let validator = self.validator();
        let hit = self.closing_hit(ctx, event);
        ctx.adapter.set_cursor(if hit.any() { Cursor::Pointer } else { Cursor::Crosshair });

        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        let precision = ctx.coordinate_precision;
        let ring = match drawing.committed.as_slice() {
            [] => return Ok(()),
            [first] => {
                let p = ctx.snapped_position(
                    &self.config.snapping,
                    event,
                    std::slice::from_ref(&drawing.id),
                    self.config.pointer_distance,
                );
                let e = provisional_epsilon(precision);
                vec![*first, p, round_position([p[0] + e, p[1] + e], precision), *first]
            }
            [first, ..] if hit.is_closing => drawing.ring_with(*first),
            [.., last] if hit.is_previous_closing => drawing.ring_with(*last),
            _ => {
                let p = ctx.snapped_position(
                    &self.config.snapping,
                    event,
                    std::slice::from_ref(&drawing.id),
                    self.config.pointer_distance,
                );
                drawing.ring_with(p)
            }
        };
        ctx.apply_validated(&validator, &drawing.id, Geometry::polygon(ring), UpdateType::Provisional)?;
        Ok(())
    }

    fn on_key_up(&mut self, ctx: &mut ModeContext<'_>, event: &KeyboardEvent) -> Result<(), DrawError> {
        if event.is(self.config.key_events.cancel.as_ref()) {
            return self.clean_up(ctx);
        }
        if event.is(self.config.key_events.finish.as_ref()) {
            return self.close(ctx);
        }
        Ok(())
    }

    fn clean_up(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        if let Some(drawing) = self.drawing.take() {
            let mut ids = vec![drawing.id];
            if let Some(closing) = &drawing.closing {
                ids.extend(closing.ids().into_iter().cloned());
            }
            ctx.delete_present(&ids)?;
            ctx.adapter.set_double_click_to_zoom(true);
        }
        self.lifecycle.set_started();
        Ok(())
    }

    fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        if feature.props().closing_point() {
            return self.config.styles.closing_point();
        }
        self.config.styles.shape()
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(
            Intrinsic::Polygon { non_intersecting: self.config.prevent_self_intersection },
            self.config.validation.clone(),
        )
    }
}
