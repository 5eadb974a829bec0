//! Lifecycle state shared by every mode.

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;

use serde::{Deserialize, Serialize};

use crate::error::DrawError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeState {
    #[default]
    Unregistered,
    Registered,
    Started,
    /// Started with a shape in progress.
    Drawing,
    /// Started with a feature selected.
    Selecting,
    Stopped,
}

impl ModeState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Started => "started",
            Self::Drawing => "drawing",
            Self::Selecting => "selecting",
            Self::Stopped => "stopped",
        }
    }

    /// Whether the mode may receive input.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Started | Self::Drawing | Self::Selecting)
    }
}

/// Name plus lifecycle state, with the legal transitions enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    name: String,
    state: ModeState,
}

impl Lifecycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: ModeState::Unregistered }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> ModeState {
        self.state
    }

    fn invalid(&self, to: ModeState) -> DrawError {
        DrawError::InvalidLifecycle { mode: self.name.clone(), from: self.state.as_str(), to: to.as_str() }
    }

    /// # Errors
    ///
    /// `ModeAlreadyRegistered` unless the mode is unregistered.
    pub fn register(&mut self) -> Result<(), DrawError> {
        if self.state != ModeState::Unregistered {
            return Err(DrawError::ModeAlreadyRegistered(self.name.clone()));
        }
        self.state = ModeState::Registered;
        Ok(())
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` before registration, `InvalidLifecycle` when
    /// already started.
    pub fn start(&mut self) -> Result<(), DrawError> {
        match self.state {
            ModeState::Registered | ModeState::Stopped => {
                self.state = ModeState::Started;
                Ok(())
            }
            ModeState::Unregistered => Err(DrawError::ModeNotRegistered(self.name.clone())),
            _ => Err(self.invalid(ModeState::Started)),
        }
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` before registration, `InvalidLifecycle` when not started.
    pub fn stop(&mut self) -> Result<(), DrawError> {
        match self.state {
            s if s.is_active() => {
                self.state = ModeState::Stopped;
                Ok(())
            }
            ModeState::Unregistered => Err(DrawError::ModeNotRegistered(self.name.clone())),
            _ => Err(self.invalid(ModeState::Stopped)),
        }
    }

    /// Enter the drawing sub-state.
    ///
    /// # Errors
    ///
    /// `InvalidLifecycle` unless started (or already drawing).
    pub fn set_drawing(&mut self) -> Result<(), DrawError> {
        match self.state {
            ModeState::Started | ModeState::Drawing => {
                self.state = ModeState::Drawing;
                Ok(())
            }
            _ => Err(self.invalid(ModeState::Drawing)),
        }
    }

    /// Enter the selecting sub-state.
    ///
    /// # Errors
    ///
    /// `InvalidLifecycle` unless started (or already selecting).
    pub fn set_selecting(&mut self) -> Result<(), DrawError> {
        match self.state {
            ModeState::Started | ModeState::Selecting => {
                self.state = ModeState::Selecting;
                Ok(())
            }
            _ => Err(self.invalid(ModeState::Selecting)),
        }
    }

    /// Leave a drawing/selecting sub-state. Other states are left alone.
    pub fn set_started(&mut self) {
        if matches!(self.state, ModeState::Drawing | ModeState::Selecting) {
            self.state = ModeState::Started;
        }
    }

    /// # Errors
    ///
    /// `ModeNotRegistered` before registration, `ModeNotStarted` when registered
    /// or stopped.
    pub fn ensure_active(&self) -> Result<(), DrawError> {
        match self.state {
            ModeState::Unregistered => Err(DrawError::ModeNotRegistered(self.name.clone())),
            s if s.is_active() => Ok(()),
            _ => Err(DrawError::ModeNotStarted(self.name.clone())),
        }
    }
}
