//! The inert default mode: no interaction, owns no features.

use super::{Lifecycle, ModeContext, ModeHandler};
use crate::error::DrawError;
use crate::geometry::Feature;
use crate::input::Cursor;
use crate::style::FeatureStyle;
use crate::validate::{FeatureValidator, Intrinsic};

pub const STATIC_MODE_NAME: &str = "static";

pub struct StaticMode {
    lifecycle: Lifecycle,
}

impl StaticMode {
    #[must_use]
    pub fn new() -> Self {
        Self { lifecycle: Lifecycle::new(STATIC_MODE_NAME) }
    }
}

impl Default for StaticMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeHandler for StaticMode {
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
        FeatureStyle::default()
    }

    fn validator(&self) -> FeatureValidator {
        FeatureValidator::new(Intrinsic::Reject, None)
    }
}
