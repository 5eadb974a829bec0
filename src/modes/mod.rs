//! Mode state machines.
//!
//! DESIGN
//! ======
//! Every interaction pattern is one variant of [`Mode`]. The orchestrator
//! holds a list of modes and forwards events to the active one through a
//! single match ([`Mode::handler_mut`]); each variant implements
//! [`ModeHandler`] and keeps only the state it needs, with any in-progress
//! shape bundled into one `Option`. Lifecycle checks (register once, no input
//! before start) are enforced here, before a handler ever runs.
//!
//! Handlers never hold on to store data. They receive a [`ModeContext`]
//! borrowing the store and adapter for the duration of a single call, and
//! report selection and finish events back through it.

pub mod circle;
pub mod freehand;
pub mod lifecycle;
pub mod line_string;
pub mod point;
pub mod polygon;
pub mod rectangle;
pub mod render;
pub mod select;
pub mod static_mode;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::adapter::Adapter;
use crate::consts::{KEY_ENTER, KEY_ESCAPE, props};
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, Geometry, Position, round_position};
use crate::input::{Cursor, KeyboardEvent, PointerEvent};
use crate::snapping::{SnapQuery, Snapping};
use crate::store::{FeatureStore, GeometryPatch, PropertyPatch};
use crate::style::FeatureStyle;
use crate::validate::{FeatureValidator, UpdateType, ValidationContext, ValidationResult};

pub use circle::{CircleMode, CircleModeConfig, Projection};
pub use freehand::{FreehandMode, FreehandModeConfig};
pub use lifecycle::{Lifecycle, ModeState};
pub use line_string::{LineStringMode, LineStringModeConfig};
pub use point::{PointMode, PointModeConfig};
pub use polygon::{PolygonMode, PolygonModeConfig};
pub use rectangle::{RectangleMode, RectangleModeConfig};
pub use render::{RenderMode, RenderModeConfig};
pub use select::{CoordinateFlags, FeatureFlags, ModeSelectFlags, SelectKeyEvents, SelectMode, SelectModeConfig, SelectStyles};
pub use static_mode::{STATIC_MODE_NAME, StaticMode};

// =============================================================================
// SHARED TYPES
// =============================================================================

/// Key bindings for drawing modes. `None` disables a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEvents {
    pub cancel: Option<String>,
    pub finish: Option<String>,
}

impl Default for KeyEvents {
    fn default() -> Self {
        Self { cancel: Some(KEY_ESCAPE.to_string()), finish: Some(KEY_ENTER.to_string()) }
    }
}

/// What a `finish` notification completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishAction {
    Draw,
    DragFeature,
    DragCoordinate,
    InsertCoordinate,
    DeleteCoordinate,
    Rotate,
    Scale,
}

/// Events a mode raises for the orchestrator's listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeNotification {
    Finish { id: FeatureId, action: FinishAction },
    Select(FeatureId),
    Deselect(FeatureId),
}

/// Everything a mode may touch during one call.
pub struct ModeContext<'a> {
    pub store: &'a mut FeatureStore,
    pub adapter: &'a mut dyn Adapter,
    /// Validators of every registered mode, by mode name.
    pub validators: &'a HashMap<String, FeatureValidator>,
    pub coordinate_precision: u32,
    notifications: &'a mut Vec<ModeNotification>,
}

impl<'a> ModeContext<'a> {
    pub fn new(
        store: &'a mut FeatureStore,
        adapter: &'a mut dyn Adapter,
        validators: &'a HashMap<String, FeatureValidator>,
        coordinate_precision: u32,
        notifications: &'a mut Vec<ModeNotification>,
    ) -> Self {
        Self { store, adapter, validators, coordinate_precision, notifications }
    }

    pub fn notify(&mut self, notification: ModeNotification) {
        self.notifications.push(notification);
    }

    #[must_use]
    pub fn validation_context(&self, update_type: UpdateType) -> ValidationContext {
        ValidationContext { update_type, coordinate_precision: self.coordinate_precision }
    }

    /// Run the validator registered for `mode`. Features of unknown modes pass.
    #[must_use]
    pub fn validate_for_mode(&self, mode: &str, feature: &Feature, update_type: UpdateType) -> ValidationResult {
        match self.validators.get(mode) {
            Some(validator) => validator.validate(feature, &self.validation_context(update_type)),
            None => ValidationResult::ok(),
        }
    }

    /// Replace the geometry of `id` if `validator` accepts the result.
    /// Returns whether the update was applied.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound` when `id` is not in the store.
    pub fn apply_validated(
        &mut self,
        validator: &FeatureValidator,
        id: &FeatureId,
        geometry: Geometry,
        update_type: UpdateType,
    ) -> Result<bool, DrawError> {
        let mut candidate = self.store.copy(id)?;
        candidate.geometry = geometry;
        let result = validator.validate(&candidate, &self.validation_context(update_type));
        if !result.valid {
            tracing::debug!(%id, ?update_type, reason = ?result.reason, "edit rejected by validation");
            return Ok(false);
        }
        self.store.update_geometry(vec![GeometryPatch { id: id.clone(), geometry: candidate.geometry }])?;
        Ok(true)
    }

    /// The pointer position after snapping, rounded to the coordinate precision.
    #[must_use]
    pub fn snapped_position(
        &self,
        snapping: &Snapping,
        event: &PointerEvent,
        exclude: &[FeatureId],
        pointer_distance: f64,
    ) -> Position {
        let query = SnapQuery {
            store: &*self.store,
            adapter: &*self.adapter,
            event,
            exclude,
            pointer_distance,
            coordinate_precision: self.coordinate_precision,
        };
        snapping
            .snap(&query)
            .unwrap_or_else(|| round_position(event.position(), self.coordinate_precision))
    }

    /// Drop the in-progress marker from a completed shape and announce it.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound` when `id` is not in the store.
    pub fn finish_shape(&mut self, id: &FeatureId) -> Result<(), DrawError> {
        self.store.update_property(vec![PropertyPatch::remove(id, props::CURRENTLY_DRAWING)])?;
        self.notify(ModeNotification::Finish { id: id.clone(), action: FinishAction::Draw });
        Ok(())
    }

    /// Delete whichever of `ids` are still stored.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn delete_present(&mut self, ids: &[FeatureId]) -> Result<(), DrawError> {
        let present: Vec<FeatureId> = ids.iter().filter(|id| self.store.has(id)).cloned().collect();
        self.store.delete(&present)
    }
}

/// Per-variant behaviour. Every hook defaults to a no-op.
pub trait ModeHandler {
    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Cursor shown while the mode is active.
    fn start_cursor(&self) -> Cursor {
        Cursor::Crosshair
    }

    fn on_click(&mut self, _ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_mouse_move(&mut self, _ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_key_down(&mut self, _ctx: &mut ModeContext<'_>, _event: &KeyboardEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_key_up(&mut self, _ctx: &mut ModeContext<'_>, _event: &KeyboardEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_drag_start(&mut self, _ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_drag(&mut self, _ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        Ok(())
    }

    fn on_drag_end(&mut self, _ctx: &mut ModeContext<'_>, _event: &PointerEvent) -> Result<(), DrawError> {
        Ok(())
    }

    /// Remove any partial shape and guidance features this mode created.
    fn clean_up(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError>;

    fn style_feature(&self, feature: &Feature) -> FeatureStyle;

    fn validator(&self) -> FeatureValidator;
}

// =============================================================================
// MODE
// =============================================================================

/// A registered interaction mode.
pub enum Mode {
    Point(PointMode),
    LineString(LineStringMode),
    Polygon(PolygonMode),
    Circle(CircleMode),
    Rectangle(RectangleMode),
    Freehand(FreehandMode),
    Select(SelectMode),
    Static(StaticMode),
    Render(RenderMode),
}

impl Mode {
    fn handler(&self) -> &dyn ModeHandler {
        match self {
            Self::Point(m) => m,
            Self::LineString(m) => m,
            Self::Polygon(m) => m,
            Self::Circle(m) => m,
            Self::Rectangle(m) => m,
            Self::Freehand(m) => m,
            Self::Select(m) => m,
            Self::Static(m) => m,
            Self::Render(m) => m,
        }
    }

    fn handler_mut(&mut self) -> &mut dyn ModeHandler {
        match self {
            Self::Point(m) => m,
            Self::LineString(m) => m,
            Self::Polygon(m) => m,
            Self::Circle(m) => m,
            Self::Rectangle(m) => m,
            Self::Freehand(m) => m,
            Self::Select(m) => m,
            Self::Static(m) => m,
            Self::Render(m) => m,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.handler().lifecycle().name()
    }

    #[must_use]
    pub fn state(&self) -> ModeState {
        self.handler().lifecycle().state()
    }

    /// Whether a shape is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.state() == ModeState::Drawing
    }

    /// # Errors
    ///
    /// `ModeAlreadyRegistered` on a second call.
    pub fn register(&mut self) -> Result<(), DrawError> {
        self.handler_mut().lifecycle_mut().register()
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `InvalidLifecycle` for illegal transitions.
    pub fn start(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let handler = self.handler_mut();
        handler.lifecycle_mut().start()?;
        ctx.adapter.set_cursor(handler.start_cursor());
        Ok(())
    }

    /// Clean up and stop.
    ///
    /// # Errors
    ///
    /// `ModeNotRegistered` / `InvalidLifecycle` for illegal transitions.
    pub fn stop(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let handler = self.handler_mut();
        handler.lifecycle().ensure_active()?;
        handler.clean_up(ctx)?;
        handler.lifecycle_mut().stop()?;
        ctx.adapter.set_cursor(Cursor::Unset);
        ctx.adapter.set_double_click_to_zoom(true);
        Ok(())
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` before registration.
    pub fn clean_up(&mut self, ctx: &mut ModeContext<'_>) -> Result<(), DrawError> {
        let handler = self.handler_mut();
        if handler.lifecycle().state() == ModeState::Unregistered {
            return Err(DrawError::ModeNotRegistered(handler.lifecycle().name().to_string()));
        }
        handler.clean_up(ctx)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_click(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_click(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_mouse_move(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_mouse_move(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_key_down(&mut self, ctx: &mut ModeContext<'_>, event: &KeyboardEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_key_down(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_key_up(&mut self, ctx: &mut ModeContext<'_>, event: &KeyboardEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_key_up(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_drag_start(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_drag_start(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_drag(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_drag(ctx, event)
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` / `ModeNotStarted` when the mode is inactive.
    pub fn on_drag_end(&mut self, ctx: &mut ModeContext<'_>, event: &PointerEvent) -> Result<(), DrawError> {
        self.handler().lifecycle().ensure_active()?;
        self.handler_mut().on_drag_end(ctx, event)
    }

    #[must_use]
    pub fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        self.handler().style_feature(feature)
    }

    #[must_use]
    pub fn validator(&self) -> FeatureValidator {
        self.handler().validator()
    }

    /// Check a complete feature against this mode's rules, as `add_features` does.
    #[must_use]
    pub fn validate_feature(&self, feature: &Feature, coordinate_precision: u32) -> ValidationResult {
        let ctx = ValidationContext { update_type: UpdateType::Finish, coordinate_precision };
        self.validator().validate(feature, &ctx)
    }

    #[must_use]
    pub fn as_select(&self) -> Option<&SelectMode> {
        match self {
            Self::Select(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut SelectMode> {
        match self {
            Self::Select(m) => Some(m),
            _ => None,
        }
    }
}

impl From<PointMode> for Mode {
    fn from(m: PointMode) -> Self {
        Self::Point(m)
    }
}

impl From<LineStringMode> for Mode {
    fn from(m: LineStringMode) -> Self {
        Self::LineString(m)
    }
}

impl From<PolygonMode> for Mode {
    fn from(m: PolygonMode) -> Self {
        Self::Polygon(m)
    }
}

impl From<CircleMode> for Mode {
    fn from(m: CircleMode) -> Self {
        Self::Circle(m)
    }
}

impl From<RectangleMode> for Mode {
    fn from(m: RectangleMode) -> Self {
        Self::Rectangle(m)
    }
}

impl From<FreehandMode> for Mode {
    fn from(m: FreehandMode) -> Self {
        Self::Freehand(m)
    }
}

impl From<SelectMode> for Mode {
    fn from(m: SelectMode) -> Self {
        Self::Select(m)
    }
}

impl From<StaticMode> for Mode {
    fn from(m: StaticMode) -> Self {
        Self::Static(m)
    }
}

impl From<RenderMode> for Mode {
    fn from(m: RenderMode) -> Self {
        Self::Render(m)
    }
}
