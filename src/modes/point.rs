//! Point mode: every click drops one point.

#[cfg(test)]
#[path = "point_test.rs"]
mod point_test;

use serde::{Deserialize, Serialize};

use super::{FinishAction, Lifecycle, ModeContext, ModeHandler, ModeNotification};
use crate::consts::DEFAULT_POINTER_DISTANCE_PX;
use crate::error::DrawError;
use crate::geometry::{Feature, Geometry, NewFeature};
use crate::input::PointerEvent;
use crate::snapping::Snapping;
use crate::style::{FeatureStyle, ShapeStyles};
use crate::validate::{FeatureValidator, Intrinsic, UpdateType, Validation};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointModeConfig {
    pub mode_name: String,
    pub styles: ShapeStyles,
    pub snapping: Snapping,
    pub pointer_distance: f64,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for PointModeConfig {
    fn default() -> Self {
        Self {
            mode_name: "point".to_string(),
            styles: ShapeStyles::default(),
            snapping: Snapping::default(),
            pointer_distance: DEFAULT_POINTER_DISTANCE_PX,
            validation: None,
        }
    }
}

pub struct PointMode {
    lifecycle: Lifecycle,
    config: PointModeConfig,
}

impl PointMode {
    #[must_use]
    pub fn new(config: PointModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config }
    }
}

impl Default for PointMode {
    fn default() -> Self {
        Self::new(PointModeConfig::default())
    }
}

impl ModeHandler for PointMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        let position = ctx.snapped_position(&self.config.snapping, event, &[], self.config.pointer_distance);
        let id = ctx.store.id_strategy().get_id();
        let candidate = NewFeature::owned_by(self.lifecycle.name(), Geometry::point(position)).with_id(id.clone());

        let feature = Feature { id: id.clone(), geometry: candidate.geometry.clone(), properties: candidate.properties.clone() };
        let result = self.validator().validate(&feature, &ctx.validation_context(UpdateType::Finish));
        if !result.valid {
            tracing::debug!(mode = self.lifecycle.name(), reason = ?result.reason, "point rejected");
            return Ok(());
        }

        ctx.store.create(vec![candidate])?;
        ctx.notify(ModeNotification::Finish { id, action: FinishAction::Draw });
        Ok(())
    }

    fn clean_up(&mut self, _ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        Ok(())
    }

    fn style_feature(&self, _feature: &Feature) -> FeatureStyle {
        self.config.styles.shape()
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(Intrinsic::Point, self.config.validation.clone())
    }
}
