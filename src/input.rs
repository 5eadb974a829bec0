//! Input model: canonical pointer and keyboard events delivered by an adapter.
//!
//! Adapters translate native map events into these types before calling the
//! matching `Draw::on_*` entry point. A pointer event carries both the map
//! coordinate under the cursor and the container-relative pixel position, so
//! modes can compare geodesic and screen distances without a round trip.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button (or two-finger tap / context menu).
    Secondary,
    /// Pointer moved with no button pressed.
    Neither,
}

/// A canonical pointer event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Longitude under the pointer, in degrees.
    pub lng: f64,
    /// Latitude under the pointer, in degrees.
    pub lat: f64,
    /// Horizontal pixel offset from the map container's left edge.
    pub container_x: f64,
    /// Vertical pixel offset from the map container's top edge.
    pub container_y: f64,
    pub button: Button,
    /// Names of keys held while the event fired (e.g. `"Control"`).
    #[serde(default)]
    pub held_keys: Vec<String>,
}

impl PointerEvent {
    /// The pointer position as `[lng, lat]`.
    #[must_use]
    pub fn position(&self) -> Position {
        [self.lng, self.lat]
    }

    /// Whether every key in `keys` is currently held. An empty list never matches.
    #[must_use]
    pub fn holds_all(&self, keys: &[String]) -> bool {
        !keys.is_empty() && keys.iter().all(|k| self.held_keys.contains(k))
    }
}

/// A canonical keyboard event.
///
/// `key` holds the key name as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub key: String,
    #[serde(default)]
    pub held_keys: Vec<String>,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), held_keys: Vec::new() }
    }

    /// Whether this event is for `key`, when a binding is configured.
    #[must_use]
    pub fn is(&self, key: Option<&String>) -> bool {
        key.is_some_and(|k| *k == self.key)
    }
}

/// Cursor requested from the host map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cursor {
    /// Let the host decide.
    #[default]
    Unset,
    Crosshair,
    Pointer,
    Move,
    Grab,
    Grabbing,
    NotAllowed,
}

impl Cursor {
    /// CSS cursor name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Crosshair => "crosshair",
            Self::Pointer => "pointer",
            Self::Move => "move",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::NotAllowed => "not-allowed",
        }
    }
}
