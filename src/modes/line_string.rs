//! Line string mode.
//!
//! The stored line always ends in one provisional vertex that follows the
//! pointer; every click commits it and appends a fresh one. Clicking the
//! last committed vertex again, or pressing the finish key, drops the
//! provisional vertex and completes the line.

#[cfg(test)]
#[path = "line_string_test.rs"]
mod line_string_test;

use serde::{Deserialize, Serialize};

use super::{KeyEvents, Lifecycle, ModeContext, ModeHandler};
use crate::behavior::{closing_point_feature, pixel_distance};
use crate::consts::{DEFAULT_POINTER_DISTANCE_PX, props};
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position};
use crate::input::{Cursor, KeyboardEvent, PointerEvent};
use crate::snapping::Snapping;
use crate::store::GeometryPatch;
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStringModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub snapping: Snapping,
    pub key_events: KeyEvents,
    pub pointer_distance: f64,
    /// Reject edits that make the line cross itself.
    pub prevent_self_intersection: bool,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for LineStringModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "linestring".to_string(),
            styles: ShapeStyles::default(),
            snapping: Snapping::default(),
            key_events: KeyEvents::default(),
            pointer_distance: DEFAULT_POINTER_DISTANCE_PX,
            prevent_self_intersection: false,
            validation: None,
        }
    }
}

struct LineDrawing {
    id: FeatureId,
    committed: Vec<Position>,
    /// Marker on the last committed vertex.
    closing: Option<FeatureId>,
}

pub struct LineStringMode {
    lifecycle: Lifecycle,
    config: LineStringModeConfig,
    drawing: Option<LineDrawing>,
}

impl LineStringMode {
    #[must_use]
    pub fn new(config: LineStringModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, drawing: None }
    }

    /// Id of the line being drawn, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<&FeatureId> {
        self.drawing.as_ref().map(|d| &d.id)
    }

    fn begin(&mut self, ctx: &mut ModeContext<'_>, position: Position) -> Result<(), DrawError> {
        let feature = NewFeature::owned_by(self.lifecycle.name(), Geometry::line_string(vec![position, position]))
            .with_property(props::CURRENTLY_DRAWING, true);
        let ids = ctx.store.create(vec![feature])?;
        let Some(id) = ids.into_iter().next() else {
            return Ok(());
        };
        self.lifecycle.set_drawing()?;
        ctx.adapter.set_double_click_to_zoom(false);
        self.drawing = Some(LineDrawing { id, committed: vec![position], closing: None });
        Ok(())
    }

    fn commit(&mut self, ctx: &mut ModeContext<'_>, position: Position) -> Result<(), DrawError> {
        let validator = self.validator();
        let Some(drawing) = self.drawing.as_mut() else {
            return Ok(());
        };
        if drawing.committed.last() == Some(&position) {
            return Ok(());
        }

        let mut coordinates = drawing.committed.clone();
        coordinates.push(position);
        coordinates.push(position);
        if !ctx.apply_validated(&validator, &drawing.id, Geometry::line_string(coordinates), UpdateType::Commit)? {
            return Ok(());
        }
        drawing.committed.push(position);

        match &drawing.closing {
            Some(closing) => ctx
                .store
                .update_geometry(vec![GeometryPatch { id: closing.clone(), geometry: Geometry::point(position) }])?,
            None => {
                let ids = ctx.store.create(vec![closing_point_feature(self.lifecycle.name(), position)])?;
                drawing.closing = ids.into_iter().next();
            }
        }
        Ok(())
    }

    fn finish(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let validator = self.validator();
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        if drawing.committed.len() < 2 {
            return Ok(());
        }
        let geometry = Geometry::line_string(drawing.committed.clone());
        if !ctx.apply_validated(&validator, &drawing.id, geometry, UpdateType::Finish)? {
            return Ok(());
        }

        let Some(drawing) = self.drawing.take() else {
            return Ok(());
        };
        if let Some(closing) = drawing.closing {
            ctx.delete_present(&[closing])?;
        }
        ctx.finish_shape(&drawing.id)?;
        self.lifecycle.set_started();
        ctx.adapter.set_double_click_to_zoom(true);
        tracing::debug!(mode = self.lifecycle.name(), id = %drawing.id, "line finished");
        Ok(())
    }

    fn near_last_committed(&self, ctx: &ModeContext<'_>, event: &PointerEvent) -> bool {
        self.drawing
            .as_ref()
            .and_then(|d| d.committed.last())
            .is_some_and(|last| pixel_distance(&*ctx.adapter, event, *last) < self.config.pointer_distance)
    }
}

impl Default for LineStringMode {
    fn default() -> Self {
        Self::new(LineStringModeConfig::default())
    }
}

impl ModeHandler for LineStringMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let exclude: Vec<FeatureId> = self.current_id().into_iter().cloned().collect();
        let position = ctx.snapped_position(&self.config.snapping, event, &exclude, self.config.pointer_distance);

        let committed = self.drawing.as_ref().map_or(0, |d| d.committed.len());
        if committed == 0 {
            return self.begin(ctx, position);
        }
        if self.near_last_committed(ctx, event) {
            if committed >= 2 {
                return self.finish(ctx);
            }
            return Ok(());
        }
        self.commit(ctx, position)
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let validator = self.validator();
        let hovering = self.drawing.as_ref().is_some_and(|d| d.committed.len() >= 2) && self.near_last_committed(ctx, event);
        ctx.adapter.set_cursor(if hovering { Cursor::Pointer } else { Cursor::Crosshair });

        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        let position = ctx.snapped_position(
            &self.config.snapping,
            event,
            std::slice::from_ref(&drawing.id),
            self.config.pointer_distance,
        );
        let mut coordinates = drawing.committed.clone();
        coordinates.push(position);
        ctx.apply_validated(&validator, &drawing.id, Geometry::line_string(coordinates), UpdateType::Provisional)?;
        Ok(())
    }

    fn on_key_up(&mut self, ctx: &mut ModeContext<'_>, event: &KeyboardEvent) -> Result<(), DrawError> {
        if event.is(self.config.key_events.cancel.as_ref()) {
            return self.clean_up(ctx);
        }
        if event.is(self.config.key_events.finish.as_ref()) {
            return self.finish(ctx);
        }
        Ok(())
    }

    fn clean_up(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        if let Some(drawing) = self.drawing.take() {
            let mut ids = vec![drawing.id];
            ids.extend(drawing.closing);
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
            Intrinsic::LineString { non_intersecting: self.config.prevent_self_intersection },
            self.config.validation.clone(),
        )
    }
}
