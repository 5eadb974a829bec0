//! Interactive vector drawing on top of a host map.
//!
//! The host forwards canonical pointer and keyboard events to a [`draw::Draw`]
//! instance; the active mode turns them into validated, precision-rounded
//! geometry edits on an in-memory feature store, and every store change is
//! handed back to the host as a styled render diff through the
//! [`adapter::Adapter`] trait. Nothing here knows about a particular map
//! library or rendering technology.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`draw`] | Public API, event dispatch, render diffs and listeners |
//! | [`modes`] | Mode state machines (point, line, polygon, circle, rectangle, freehand, select, static, render) |
//! | [`store`] | Feature store with change journal and id strategy |
//! | [`spatial`] | R-tree index over feature bounding boxes |
//! | [`history`] | Bounded undo/redo |
//! | [`behavior`] | Pixel distances, click boxes, hit testing, closing points |
//! | [`snapping`] | Coordinate, line and custom snapping |
//! | [`geometry`] | Feature model, bounding boxes, coordinate helpers |
//! | [`geodesic`] | Haversine, bearings and web-Mercator math |
//! | [`shapes`] | Circle and rectangle generators |
//! | [`validate`] | Structural checks, self-intersection, winding, validators |
//! | [`nearest`] | Nearest point on a line |
//! | [`adapter`] | Host map contract and render diff types |
//! | [`input`] | Canonical pointer and keyboard events, cursors |
//! | [`style`] | Resolved feature styles |
//! | [`consts`] | Shared constants and property names |
//! | [`error`] | Contract-violation errors |

pub mod adapter;
pub mod behavior;
pub mod consts;
pub mod draw;
pub mod error;
pub mod geodesic;
pub mod geometry;
pub mod history;
pub mod input;
pub mod modes;
pub mod nearest;
pub mod shapes;
pub mod snapping;
pub mod spatial;
pub mod store;
pub mod style;
pub mod validate;

pub use adapter::{Adapter, RenderChanges, ScreenPoint, StyledFeature};
pub use draw::{Draw, DrawConfig, DrawEvent, DrawEventKind, DrawOptions, FeatureValidation, HitQuery, ListenerId};
pub use error::DrawError;
pub use geometry::{Feature, FeatureId, Geometry, NewFeature, Position};
pub use input::{Button, Cursor, KeyboardEvent, PointerEvent};
pub use modes::Mode;

#[cfg(test)]
#[path = "test_support_test.rs"]
pub(crate) mod test_support;
