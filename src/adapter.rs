//! Host map contract.
//!
//! An adapter sits between a concrete map library and the draw core. It
//! projects coordinates, owns the cursor and map interaction toggles, and
//! receives render diffs. Events flow the other way: the host converts native
//! events into [`crate::input::PointerEvent`] / [`crate::input::KeyboardEvent`]
//! and calls the matching `Draw::on_*` method.

use serde::{Deserialize, Serialize};

use crate::geometry::{Feature, FeatureId, Position};
use crate::input::Cursor;
use crate::style::FeatureStyle;

/// A point in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A feature together with the style its owning mode resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledFeature {
    pub feature: Feature,
    pub style: FeatureStyle,
}

/// One render diff, produced for every store change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderChanges {
    pub created: Vec<StyledFeature>,
    pub updated: Vec<StyledFeature>,
    pub unchanged: Vec<StyledFeature>,
    pub deleted_ids: Vec<FeatureId>,
}

impl RenderChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.unchanged.is_empty() && self.deleted_ids.is_empty()
    }
}

/// Implemented once per host map library.
pub trait Adapter {
    /// Longitude/latitude to container pixels.
    fn project(&self, lng: f64, lat: f64) -> ScreenPoint;

    /// Container pixels to `[lng, lat]`.
    fn unproject(&self, x: f64, y: f64) -> Position;

    fn set_cursor(&mut self, cursor: Cursor);

    /// Enable or disable map panning by drag.
    fn set_draggability(&mut self, enabled: bool);

    fn set_double_click_to_zoom(&mut self, enabled: bool);

    /// Apply a render diff.
    fn render(&mut self, changes: &RenderChanges);

    /// Remove everything the adapter has drawn.
    fn clear(&mut self);

    /// Called when drawing starts; attach host listeners here.
    fn register(&mut self) {}

    /// Called when drawing stops; detach host listeners here.
    fn unregister(&mut self) {}
}
