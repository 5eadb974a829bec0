//! Render mode: a named, display-only layer.
//!
//! Features reach it through `add_features` only. It ignores every pointer
//! and key event and styles everything it owns with one fixed style.

use serde::{Deserialize, Serialize};

use super::{Lifecycle, ModeContext, ModeHandler};
use crate::error::DrawError;
use crate::geometry::Feature;
use crate::input::Cursor;
use crate::style::FeatureStyle;
use crate::validate::{FeatureValidator, Intrinsic, Validation};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderModeConfig {
    pub mode_name: String,
    pub style: FeatureStyle,
    #[serde(skip)]
    pub validation: Option<Validation>,
}

impl Default for RenderModeConfig {
    fn default() -> Self {
        Self { mode_name: "render".to_string(), style: FeatureStyle::default(), validation: None }
    }
}

pub struct RenderMode {
    lifecycle: Lifecycle,
    config: RenderModeConfig,
}

impl RenderMode {
    #[must_use]
    pub fn new(config: RenderModeConfig) -> Self {
        Self { lifecycle: Lifecycle::new(config.mode_name.clone()), config }
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::new(RenderModeConfig::default())
    }
}

impl ModeHandler for RenderMode {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn start_cursor(&self) -> Cursor {
        Cursor::Unset
    }

    fn clean_up(&mut self, _ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        Ok(())
    }

    fn style_feature(&self, _feature: &Feature) -> FeatureStyle {
        self.config.style.clone()
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(Intrinsic::AnyGeometry, self.config.validation.clone())
    }
}
