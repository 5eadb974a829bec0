//! Circle mode: first click fixes the centre, pointer movement sets the
//! radius, second click (or the finish key) commits.

#[cfg(test)]
#[path = "circle_test.rs"]
mod circle_test;

use serde::{Deserialize, Serialize};

use super::{KeyEvents, Lifecycle, ModeContext, ModeHandler};
use crate::consts::{DEFAULT_CIRCLE_STEPS, DEFAULT_STARTING_RADIUS_KM, props};
use crate::error::DrawError;
use crate::geodesic::{destination, haversine_distance_km, web_mercator_distortion};
use crate::geometry::{Feature, FeatureId, Geometry, NewFeature, Position, round_position};
use crate::input::{KeyboardEvent, PointerEvent};
use crate::shapes::{circle, circle_web_mercator};
use crate::store::PropertyPatch;
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation};

/// How the ring is laid out around the centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Projection {
    /// Round on a web-Mercator map.
    #[default]
    WebMercator,
    /// Round on the sphere.
    Globe,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub key_events: KeyEvents,
    pub projection: Projection,
    pub steps: usize,
    pub starting_radius_km: f64,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for CircleModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "circle".to_string(),
            styles: ShapeStyles::default(),
            key_events: KeyEvents::default(),
            projection: Projection::default(),
            steps: DEFAULT_CIRCLE_STEPS,
            starting_radius_km: DEFAULT_STARTING_RADIUS_KM,
            validation: None,
        }
    }
}

struct CircleDrawing {
    id: FeatureId,
    center: Position,
}

pub struct CircleMode {
    lifecycle: Lifecycle,
    config: CircleModeConfig,
    drawing: Option<CircleDrawing>,
}

impl CircleMode {
    #[must_use]
    pub fn new(config: CircleModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config, drawing: None }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&FeatureId> {
        self.drawing.as_ref().map(|d| &d.id)
    }

    /// Ring for a geodesic radius, drawn in the configured projection.
    fn ring(&self, center: Position, radius_km: f64, toward: Position, precision: u32) -> Vec<Position> {
        match self.config.projection {
            Projection::Globe => circle(center, radius_km, self.config.steps, precision),
            Projection::WebMercator => {
                let scaled = radius_km * web_mercator_distortion(center, toward);
                circle_web_mercator(center, scaled, self.config.steps, precision)
            }
        }
    }

    fn begin(&mut self, ctx: &mut ModeContext<'_>, center: Position) -> Result<(), DrawError> {
        let radius = self.config.starting_radius_km;
        let east = destination(center, radius, 90.0);
        let ring = self.ring(center, radius, east, ctx.coordinate_precision);
        let feature = NewFeature::owned_by(self.lifecycle.name(), Geometry::polygon(ring))
            .with_property(props::RADIUS_KILOMETERS, radius)
            .with_property(props::CURRENTLY_DRAWING, true);
        let ids = ctx.store.create(vec![feature])?;
        let Some(id) = ids.into_iter().next() else {
            return Ok(());
        };
        self.lifecycle.set_drawing()?;
        ctx.adapter.set_double_click_to_zoom(false);
        self.drawing = Some(CircleDrawing { id, center });
        Ok(())
    }

    fn finish(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        let feature = ctx.store.copy(&drawing.id)?;
        let result = self.validator().validate(&feature, &ctx.validation_context(UpdateType::Finish));
        if !result.valid {
            tracing::debug!(mode = self.lifecycle.name(), reason = ?result.reason, "circle rejected");
            return Ok(());
        }

        let Some(drawing) = self.drawing.take() else {
            return Ok(());
        };
        ctx.finish_shape(&drawing.id)?;
        self.lifecycle.set_started();
        ctx.adapter.set_double_click_to_zoom(true);
        tracing::debug!(mode = self.lifecycle.name(), id = %drawing.id, "circle finished");
        Ok(())
    }
}

impl Default for CircleMode {
    fn default() -> Self {
        Self::new(CircleModeConfig::default())
    }
}

impl ModeHandler for CircleMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        if self.drawing.is_some() {
            return self.finish(ctx);
        }
        let center = round_position(event.position(), ctx.coordinate_precision);
        self.begin(ctx, center)
    }

    fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let validator = self.validator();
        let Some(drawing) = self.drawing.as_ref() else {
            return Ok(());
        };
        let pointer = event.position();
        let radius = haversine_distance_km(drawing.center, pointer);
        if radius <= 0.0 {
            return Ok(());
        }
        let ring = self.ring(drawing.center, radius, pointer, ctx.coordinate_precision);
        let id = drawing.id.clone();
        if ctx.apply_validated(&validator, &id, Geometry::polygon(ring), UpdateType::Provisional)? {
            ctx.store.update_property(vec![PropertyPatch::set(&id, props::RADIUS_KILOMETERS, radius)])?;
        }
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
        FeatureValidator::new(Intrinsic::Polygon { non_intersecting: false }, self.config.validation.clone())
    }
}
