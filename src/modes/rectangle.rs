//! Rectangle mode: two clicks span an axis-aligned rectangle.

#[cfg(test)]
#[path = "rectangle_test.rs"]
mod rectangle_test;

use serde::{Deserialize, Serialize};

use super::{KeyEvents, Lifecycle, ModeContext, ModeHandler};
use crate::consts::props;
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position, round_position};
use crate::input::{KeyboardEvent, PointerEvent};
use crate::shapes::rectangle;
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation, encloses_area, ensure_right_hand_rule};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub key_events: KeyEvents,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for RectangleModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "rectangle".to_string(),
            styles: ShapeStyles::default(),
            key_events: KeyEvents::default(),
            validation: None,
        }
    }
}

struct RectangleDrawing {
    id: FeatureId,
    anchor: Position,
}

pub struct RectangleMode {
    lifecycle: Lifecycle,
    config: RectangleModeConfig,
    drawing: Option<RectangleDrawing>,
}

impl RectangleMode {
    #[must_use]
    pub fn new(config: RectangleModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, drawing: None }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&FeatureId> {
        self.drawing.as_ref().map(|d| &d.id)
    }

    fn begin(&mut self, ctx: &mut ModeContext<'_>, anchor: Position) -> Result<(), DrawError> {
        let ring = rectangle(anchor, anchor, ctx.coordinate_precision);
        let feature = NewFeature::owned_by(self.lifecycle.name(), Geometry::polygon(ring))
            .with_property(props::CURRENTLY_DRAWING, true);
        let ids = ctx.store.create(vec![feature])?;
        let Some(id) = ids.into_iter().next() else {
            return Ok(());
        };
        self.lifecycle.set_drawing()?;
        ctx.adapter.set_double_click_to_zoom(false);
        self.drawing = Some(RectangleDrawing { id, anchor });
        Ok(())
    }

    fn span(&self, ctx: &mut ModeContext<'_>, corner: Position, update_type: UpdateType) -> Result<bool, DrawError> {
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(false);
        };
        let ring = rectangle(drawing.anchor, corner, ctx.coordinate_precision);
        ctx.apply_validated(&self.validator(), &drawing.id, Geometry::polygon(ring), update_type)
    }

    fn finish(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        let geometry = match ctx.store.get_geometry_copy(&drawing.id)? {
            Geometry::Polygon { mut coordinates } if !coordinates.is_empty() => {
                let ring = coordinates.swap_remove(0);
                if !encloses_area(&ring) {
                    tracing::debug!(mode = self.lifecycle.name(), "degenerate rectangle not finished");
                    return Ok(());
                }
                Geometry::polygon(ensure_right_hand_rule(ring))
            }
            other => other,
        };
        if !ctx.apply_validated(&self.validator(), &drawing.id, geometry, UpdateType::Finish)? {
            return Ok(());
        }

        let Some(drawing) = self.drawing.take() else {
            return Ok(());
        };
        ctx.finish_shape(&drawing.id)?;
        self.lifecycle.set_started();
        ctx.adapter.set_double_click_to_zoom(true);
        tracing::debug!(mode = self.lifecycle.name(), id = %drawing.id, "rectangle finished");
        Ok(())
    }
}

impl Default for RectangleMode {
    fn default() -> Self {
        Self::new(RectangleModeConfig::default())
    }
}

impl ModeHandler for RectangleMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let corner = round_position(event.position(), ctx.coordinate_precision);
        if self.drawing.is_none() {
            return self.begin(ctx, corner);
        }
        self.span(ctx, corner, UpdateType::Commit)?;
        self.finish(ctx)
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let corner = round_position(event.position(), ctx.coordinate_precision);
        self.span(ctx, corner, UpdateType::Provisional)?;
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
            ctx.delete_present(&[drawing.id])?;
            ctx.adapter.set_double_click_to_zoom(true);
        }
        self.lifecycle.set_started();
        Ok(())
    }

    fn style_feature(&self, _feature: &Feature) -> FeatureStyle {
        self.config.styles.shape()
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(Intrinsic::Rectangle, self.config.validation.clone())
    }
}
