//! Freehand mode: click, move to sketch, click again to close.
//!
//! Samples are only taken once the pointer has travelled `min_distance`
//! pixels from the previous one. With `auto_close`, bringing the pointer back
//! over the start after leaving it closes the shape, and new shapes are then
//! blocked until `auto_close_timeout` has elapsed so the closing gesture's
//! trailing click does not start another one.

#[cfg(test)]
#[path = "freehand_test.rs"]
mod freehand_test;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::{KeyEvents, Lifecycle, ModeContext, ModeHandler};
use crate::behavior::{closing_point_feature, pixel_distance};
use crate::consts::{DEFAULT_AUTO_CLOSE_TIMEOUT, DEFAULT_FREEHAND_MIN_DISTANCE_PX, DEFAULT_POINTER_DISTANCE_PX, props};
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position, round_position};
use crate::input::{KeyboardEvent, PointerEvent};
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation, ensure_right_hand_rule};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreehandModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub key_events: KeyEvents,
    /// Pixels the pointer must travel before another sample is taken.
    pub min_distance: f64,
    pub pointer_distance: f64,
    pub auto_close: bool,
    #[serde(with = "millis")]
    pub auto_close_timeout: Duration,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for FreehandModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "freehand".to_string(),
            styles: ShapeStyles::default(),
            key_events: KeyEvents::default(),
            min_distance: DEFAULT_FREEHAND_MIN_DISTANCE_PX,
            pointer_distance: DEFAULT_POINTER_DISTANCE_PX,
            auto_close: false,
            auto_close_timeout: DEFAULT_AUTO_CLOSE_TIMEOUT,
            validation: None,
        }
    }
}

/// `Duration` as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

struct FreehandDrawing {
    id: FeatureId,
    samples: Vec<Position>,
    /// Marker on the first sample.
    closing: Option<FeatureId>,
    /// The pointer has been outside the closing distance since the start.
    has_left_start: bool,
}

impl FreehandDrawing {
    /// Padded ring so the polygon is valid from the first sample on.
    fn ring(&self) -> Vec<Position> {
        match self.samples.as_slice() {
            [] => Vec::new(),
            [a] => vec![*a; 4],
            [a, b] => vec![*a, *b, *b, *a],
            [a, ..] => {
                let mut ring = self.samples.clone();
                ring.push(*a);
                ring
            }
        }
    }
}

pub struct FreehandMode {
    lifecycle: Lifecycle,
    config: FreehandModeConfig,
    drawing: Option<FreehandDrawing>,
    /// New shapes are ignored until this instant.
    suppress_until: Option<Instant>,
}

impl FreehandMode {
    #[must_use]
    pub fn new(config: FreehandModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, drawing: None, suppress_until: None }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&FeatureId> {
        self.drawing.as_ref().map(|d| &d.id)
    }

    /// Whether a recent auto-close is still blocking new shapes.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppress_until.is_some_and(|deadline| Instant::now() < deadline)
    }

    fn begin(&mut self, ctx: &mut ModeContext<'_>, start: Position) -> Result<(), DrawError> {
        let name = self.lifecycle.name().to_string();
        let shape = NewFeature::owned_by(&name, Geometry::polygon(vec![start; 4])).with_property(props::CURRENTLY_DRAWING, true);
        let ids = ctx.store.create(vec![shape, closing_point_feature(&name, start)])?;
        let mut ids = ids.into_iter();
        let (Some(id), closing) = (ids.next(), ids.next()) else {
            return Ok(());
        };
        self.lifecycle.set_drawing()?;
        ctx.adapter.set_double_click_to_zoom(false);
        self.drawing = Some(FreehandDrawing { id, samples: vec![start], closing, has_left_start: false });
        Ok(())
    }

    fn close(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let Some(drawing) = self.drawing.take() else {
            return Ok(());
        };
        self.lifecycle.set_started();
        ctx.adapter.set_double_click_to_zoom(true);
        if let Some(closing) = &drawing.closing {
            ctx.delete_present(std::slice::from_ref(closing))?;
        }

        if drawing.samples.len() < 3 {
            tracing::debug!(mode = self.lifecycle.name(), samples = drawing.samples.len(), "freehand discarded");
            return ctx.delete_present(&[drawing.id]);
        }
        let ring = ensure_right_hand_rule(drawing.ring());
        if !ctx.apply_validated(&self.validator(), &drawing.id, Geometry::polygon(ring), UpdateType::Finish)? {
            return ctx.delete_present(&[drawing.id]);
        }
        ctx.finish_shape(&drawing.id)?;
        tracing::debug!(mode = self.lifecycle.name(), id = %drawing.id, "freehand closed");
        Ok(())
    }
}

impl Default for FreehandMode {
    fn default() -> Self {
        Self::new(FreehandModeConfig::default())
    }
}

impl ModeHandler for FreehandMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        if self.drawing.is_some() {
            return self.close(ctx);
        }
        if self.is_suppressed() {
            return Ok(());
        }
        self.suppress_until = None;
        let start = round_position(event.position(), ctx.coordinate_precision);
        self.begin(ctx, start)
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let validator = self.validator();
        let Some(drawing) = self.drawing.as_mut() else {
            return Ok(());
        };
        let (Some(first), Some(last)) = (drawing.samples.first().copied(), drawing.samples.last().copied()) else {
            return Ok(());
        };

        if self.config.auto_close {
            let from_start = pixel_distance(&*ctx.adapter, event, first);
            if from_start > self.config.pointer_distance {
                drawing.has_left_start = true;
            } else if drawing.has_left_start && drawing.samples.len() >= 3 {
                self.close(ctx)?;
                self.suppress_until = Some(Instant::now() + self.config.auto_close_timeout);
                return Ok(());
            }
        }

        if pixel_distance(&*ctx.adapter, event, last) < self.config.min_distance {
            return Ok(());
        }
        let sample = round_position(event.position(), ctx.coordinate_precision);
        drawing.samples.push(sample);
        if !ctx.apply_validated(&validator, &drawing.id, Geometry::polygon(drawing.ring()), UpdateType::Provisional)? {
            drawing.samples.pop();
        }
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
        self.suppress_until = None;
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
        FeatureValidator::new(Intrinsic::Polygon { non_intersecting: false }, self.config.validation.clone())
    }
}
