//! The draw orchestrator: public API, event dispatch and change fan-out.
//!
//! DESIGN
//! ======
//! `Draw` owns every piece of state (adapter, store, modes, history,
//! listeners). Each public call runs to completion in three phases:
//!
//! 1. dispatch to the active mode (or the store directly) with a borrowed
//!    [`ModeContext`];
//! 2. drain the store's change journal;
//! 3. for each change, in order: render the diff, record undo history
//!    (unless replaying), then call listeners; mode notifications
//!    (finish/select/deselect) follow.
//!
//! Because listeners run after the mode has returned, they never observe a
//! half-applied event and never need a reference back into `Draw`.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::adapter::{Adapter, RenderChanges, StyledFeature};
use crate::behavior::{HitOptions, features_at_pointer};
use crate::consts::{DEFAULT_COORDINATE_PRECISION, DEFAULT_HISTORY_CAPACITY, DEFAULT_POINTER_DISTANCE_PX};
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, NewFeature};
use crate::history::History;
use crate::input::{KeyboardEvent, PointerEvent};
use crate::modes::{FinishAction, Mode, ModeContext, ModeNotification, STATIC_MODE_NAME, StaticMode};
use crate::store::{ChangeKind, FeatureStore, IdStrategy, StoreChange};
use crate::style::FeatureStyle;
use crate::validate::FeatureValidator;

pub const REASON_INVALID_ID: &str = "Feature has an id rejected by the id strategy";
pub const REASON_DUPLICATE_ID: &str = "Feature already exists with this id";
pub const REASON_NO_MODE: &str = "Feature has no mode property";
pub const REASON_UNKNOWN_MODE: &str = "Feature mode is not registered";

// =============================================================================
// OPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Decimal places kept on every written coordinate.
    pub coordinate_precision: u32,
    /// Undo steps kept.
    pub history_capacity: usize,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self { coordinate_precision: DEFAULT_COORDINATE_PRECISION, history_capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

/// Construction options. A `static` mode is added when none is supplied.
#[derive(Default)]
pub struct DrawOptions {
    pub modes: Vec<Mode>,
    pub id_strategy: Option<IdStrategy>,
    /// Features loaded on `start`.
    pub data: Vec<NewFeature>,
    pub config: DrawConfig,
}

/// Per-feature outcome of [`Draw::add_features`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureValidation {
    pub id: FeatureId,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Options for the hit-test queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitQuery {
    pub pointer_distance: f64,
    pub include_guidance: bool,
}

impl Default for HitQuery {
    fn default() -> Self {
        Self { pointer_distance: DEFAULT_POINTER_DISTANCE_PX, include_guidance: false }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Everything a listener can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawEvent {
    Change { ids: Vec<FeatureId>, kind: ChangeKind },
    Select(FeatureId),
    Deselect(FeatureId),
    Finish { id: FeatureId, action: FinishAction },
}

impl From<ModeNotification> for DrawEvent {
    fn from(n: ModeNotification) -> Self {
        match n {
            ModeNotification::Finish { id, action } => Self::Finish { id, action },
            ModeNotification::Select(id) => Self::Select(id),
            ModeNotification::Deselect(id) => Self::Deselect(id),
        }
    }
}

impl DrawEvent {
    #[must_use]
    pub fn kind(&self) -> DrawEventKind {
        match self {
            Self::Change { .. } => DrawEventKind::Change,
            Self::Select(_) => DrawEventKind::Select,
            Self::Deselect(_) => DrawEventKind::Deselect,
            Self::Finish { .. } => DrawEventKind::Finish,
        }
    }
}

/// Event names a listener can subscribe to on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawEventKind {
    Change,
    Select,
    Deselect,
    Finish,
}

pub type Listener = Box<dyn FnMut(&DrawEvent)>;

struct Subscription {
    id: ListenerId,
    /// `None` receives every event.
    kind: Option<DrawEventKind>,
    listener: Listener,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// =============================================================================
// DRAW
// =============================================================================

pub struct Draw<A: Adapter> {
    adapter: A,
    store: FeatureStore,
    modes: Vec<Mode>,
    active: usize,
    validators: HashMap<String, FeatureValidator>,
    history: History,
    listeners: Vec<Subscription>,
    next_listener: u64,
    config: DrawConfig,
    initial_data: Vec<NewFeature>,
    enabled: bool,
    /// Suppresses history recording while undo/redo replays.
    replaying: bool,
}

impl<A: Adapter> Draw<A> {
    /// Register every mode and prepare an inactive instance.
    ///
    /// # Errors
    ///
    /// `DuplicateMode` when two modes share a name.
    pub fn new(adapter: A, options: DrawOptions) -> Result<Self, DrawError> {
        let DrawOptions { mut modes, id_strategy, data, config } = options;
        if !modes.iter().any(|m| m.name() == STATIC_MODE_NAME) {
            modes.insert(0, Mode::from(StaticMode::new()));
        }

        let mut names = HashSet::new();
        let mut validators = HashMap::new();
        for mode in &mut modes {
            if !names.insert(mode.name().to_string()) {
                return Err(DrawError::DuplicateMode(mode.name().to_string()));
            }
            mode.register()?;
            validators.insert(mode.name().to_string(), mode.validator());
        }
        let active = modes.iter().position(|m| m.name() == STATIC_MODE_NAME).unwrap_or_default();

        Ok(Self {
            adapter,
            store: FeatureStore::with_id_strategy(id_strategy.unwrap_or_default()),
            modes,
            active,
            validators,
            history: History::new(config.history_capacity),
            listeners: Vec::new(),
            next_listener: 0,
            config,
            initial_data: data,
            enabled: false,
            replaying: false,
        })
    }

    fn ensure_enabled(&self) -> Result<(), DrawError> {
        if self.enabled { Ok(()) } else { Err(DrawError::NotEnabled) }
    }

    /// Run `f` against mode `index` with a fresh context, then fan out the
    /// resulting store changes and notifications.
    fn with_mode<F>(&mut self, index: usize, f: F) -> Result<(), DrawError>
    where
        F: FnOnce(&mut Mode, &mut ModeContext<'_>) -> Result<(), DrawError>,
    {
        let mut notifications = Vec::new();
        let result = match self.modes.get_mut(index) {
            Some(mode) => {
                let mut ctx = ModeContext::new(
                    &mut self.store,
                    &mut self.adapter,
                    &self.validators,
                    self.config.coordinate_precision,
                    &mut notifications,
                );
                f(mode, &mut ctx)
            }
            None => Err(DrawError::ModeNotFound(index.to_string())),
        };
        self.flush(notifications);
        result
    }

    fn with_active<F>(&mut self, f: F) -> Result<(), DrawError>
    where
        F: FnOnce(&mut Mode, &mut ModeContext<'_>) -> Result<(), DrawError>,
    {
        self.ensure_enabled()?;
        self.with_mode(self.active, f)
    }

    fn flush(&mut self, notifications: Vec<ModeNotification>) {
        for change in self.store.take_changes() {
            let diff = self.render_changes(&change);
            if !diff.is_empty() {
                self.adapter.render(&diff);
            }
            if !self.replaying {
                self.history.record(&change);
            }
            self.emit(&DrawEvent::Change { ids: change.ids, kind: change.kind });
        }
        for notification in notifications {
            self.emit(&DrawEvent::from(notification));
        }
    }

    fn emit(&mut self, event: &DrawEvent) {
        let kind = event.kind();
        for sub in &mut self.listeners {
            if sub.kind.is_none_or(|k| k == kind) {
                (sub.listener)(event);
            }
        }
    }

    fn select_index(&self) -> Option<usize> {
        self.modes.iter().position(|m| m.as_select().is_some())
    }

    fn style_for(&self, feature: &Feature) -> FeatureStyle {
        if feature.props().selected() {
            if let Some(select) = self.select_index().and_then(|i| self.modes.get(i)) {
                return select.style_feature(feature);
            }
        }
        feature
            .props()
            .mode()
            .and_then(|name| self.modes.iter().find(|m| m.name() == name))
            .map(|m| m.style_feature(feature))
            .unwrap_or_default()
    }

    fn styled(&self, features: &[Feature]) -> Vec<StyledFeature> {
        features
            .iter()
            .map(|f| StyledFeature { feature: f.clone(), style: self.style_for(f) })
            .collect()
    }

    fn render_changes(&self, change: &StoreChange) -> RenderChanges {
        match change.kind {
            ChangeKind::Create => RenderChanges { created: self.styled(&change.after), ..RenderChanges::default() },
            ChangeKind::Update => RenderChanges { updated: self.styled(&change.after), ..RenderChanges::default() },
            ChangeKind::Delete => RenderChanges { deleted_ids: change.ids.clone(), ..RenderChanges::default() },
        }
    }

    // --- Lifecycle ---

    /// Attach to the adapter, start the active mode and load initial data.
    /// Returns the validation of each initial feature, in input order; it is
    /// empty when there was no initial data or the instance was already
    /// started.
    ///
    /// # Errors
    ///
    /// Lifecycle errors from the active mode.
    pub fn start(&mut self) -> Result<Vec<FeatureValidation>, DrawError> {
        if self.enabled {
            return Ok(Vec::new());
        }
        self.enabled = true;
        self.adapter.register();
        self.with_mode(self.active, |mode, ctx| mode.start(ctx))?;

        let data = std::mem::take(&mut self.initial_data);
        let results = if data.is_empty() { Vec::new() } else { self.add_features(data)? };
        tracing::info!(mode = self.get_mode(), features = self.store.len(), "draw started");
        Ok(results)
    }

    /// Stop the active mode and detach from the adapter. Stored features are kept.
    ///
    /// # Errors
    ///
    /// Lifecycle errors from the active mode.
    pub fn stop(&mut self) -> Result<(), DrawError> {
        if !self.enabled {
            return Ok(());
        }
        self.history.end_group();
        let result = self.with_mode(self.active, |mode, ctx| mode.stop(ctx));
        self.adapter.unregister();
        self.adapter.clear();
        self.enabled = false;
        tracing::info!("draw stopped");
        result
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the active mode, cleaning up the current one.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped, `ModeNotFound` for an unknown name.
    pub fn set_mode(&mut self, name: &str) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        let Some(index) = self.modes.iter().position(|m| m.name() == name) else {
            return Err(DrawError::ModeNotFound(name.to_string()));
        };
        if index == self.active {
            return Ok(());
        }
        self.history.end_group();
        self.with_mode(self.active, |mode, ctx| mode.stop(ctx))?;
        self.active = index;
        self.with_mode(index, |mode, ctx| mode.start(ctx))?;
        tracing::debug!(mode = name, "mode switched");
        Ok(())
    }

    /// Name of the active mode.
    #[must_use]
    pub fn get_mode(&self) -> &str {
        self.modes.get(self.active).map_or(STATIC_MODE_NAME, Mode::name)
    }

    // --- Features ---

    /// Validate and store features. Invalid ones are reported and skipped;
    /// all valid ones are stored in a single change.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped.
    pub fn add_features(&mut self, features: Vec<NewFeature>) -> Result<Vec<FeatureValidation>, DrawError> {
        self.ensure_enabled()?;
        let precision = self.config.coordinate_precision;
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut results = Vec::with_capacity(features.len());

        for feature in features {
            let id = feature.id.clone().unwrap_or_else(|| self.store.id_strategy().get_id());
            let candidate = Feature { id: id.clone(), geometry: feature.geometry, properties: feature.properties };
            let reason = if !self.store.id_strategy().is_valid_id(&id) {
                Some(REASON_INVALID_ID.to_string())
            } else if self.store.has(&id) || !seen.insert(id.clone()) {
                Some(REASON_DUPLICATE_ID.to_string())
            } else {
                match candidate.props().mode() {
                    None => Some(REASON_NO_MODE.to_string()),
                    Some(name) => match self.modes.iter().find(|m| m.name() == name) {
                        None => Some(REASON_UNKNOWN_MODE.to_string()),
                        Some(mode) => {
                            let result = mode.validate_feature(&candidate, precision);
                            // A custom validator may reject without a reason.
                            (!result.valid).then(|| result.reason.unwrap_or_default())
                        }
                    },
                }
            };

            match reason {
                None => {
                    results.push(FeatureValidation { id, valid: true, reason: None });
                    accepted.push(NewFeature::from(candidate));
                }
                Some(reason) => {
                    tracing::warn!(%id, %reason, "feature rejected");
                    results.push(FeatureValidation { id, valid: false, reason: Some(reason) });
                }
            }
        }

        if !accepted.is_empty() {
            self.store.create(accepted)?;
            self.flush(Vec::new());
        }
        Ok(results)
    }

    /// Delete features by id. A selected feature is deselected first and a
    /// shape being drawn is abandoned.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped, `FeatureNotFound` for an unknown id.
    pub fn remove_features(&mut self, ids: &[FeatureId]) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        if let Some(missing) = ids.iter().find(|id| !self.store.has(id)) {
            return Err(DrawError::FeatureNotFound(missing.clone()));
        }
        let touches_active = ids.iter().any(|id| {
            self.store
                .get(id)
                .is_some_and(|f| f.props().currently_drawing() || f.props().selected())
        });
        if touches_active {
            self.with_active(|mode, ctx| mode.clean_up(ctx))?;
        }
        let present: Vec<FeatureId> = ids.iter().filter(|id| self.store.has(id)).cloned().collect();
        self.store.delete(&present)?;
        self.flush(Vec::new());
        Ok(())
    }

    /// Abandon any in-progress shape and remove every feature as one change.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped.
    pub fn clear(&mut self) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.clean_up(ctx))?;
        self.store.clear();
        self.flush(Vec::new());
        Ok(())
    }

    /// Copies of every stored feature, guidance included, in insertion order.
    #[must_use]
    pub fn get_snapshot(&self) -> Vec<Feature> {
        self.store.copy_all()
    }

    #[must_use]
    pub fn get_snapshot_feature(&self, id: &FeatureId) -> Option<Feature> {
        self.store.get(id).cloned()
    }

    #[must_use]
    pub fn has_feature(&self, id: &FeatureId) -> bool {
        self.store.has(id)
    }

    // --- Selection ---

    /// Switch to the select mode (if needed) and select `id`.
    ///
    /// # Errors
    ///
    /// `NoSelectMode` when none is registered, `FeatureNotFound` for an
    /// unknown id, `NotEnabled` while stopped.
    pub fn select_feature(&mut self, id: &FeatureId) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        let index = self.select_index().ok_or(DrawError::NoSelectMode)?;
        if !self.store.has(id) {
            return Err(DrawError::FeatureNotFound(id.clone()));
        }
        if index != self.active {
            let name = self.modes.get(index).map(|m| m.name().to_string()).unwrap_or_default();
            self.set_mode(&name)?;
        }
        self.with_mode(index, |mode, ctx| match mode.as_select_mut() {
            Some(select) => select.select_feature(ctx, id),
            None => Err(DrawError::NoSelectMode),
        })
    }

    /// Deselect `id` if the active select mode has it selected.
    ///
    /// # Errors
    ///
    /// `NoSelectMode` when none is registered, `NotEnabled` while stopped.
    pub fn deselect_feature(&mut self, id: &FeatureId) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        let index = self.select_index().ok_or(DrawError::NoSelectMode)?;
        if index != self.active {
            return Ok(());
        }
        self.with_mode(index, |mode, ctx| match mode.as_select_mut() {
            Some(select) if select.selected_id() == Some(id) => select.deselect(ctx),
            _ => Ok(()),
        })
    }

    // --- Queries ---

    /// Features under a map coordinate, ordered points, lines, polygons.
    #[must_use]
    pub fn get_features_at_lng_lat(&self, lng: f64, lat: f64, query: HitQuery) -> Vec<Feature> {
        let screen = self.adapter.project(lng, lat);
        let event = PointerEvent { lng, lat, container_x: screen.x, container_y: screen.y, ..PointerEvent::default() };
        self.get_features_at_pointer_event(&event, query)
    }

    #[must_use]
    pub fn get_features_at_pointer_event(&self, event: &PointerEvent, query: HitQuery) -> Vec<Feature> {
        let opts = HitOptions { pointer_distance: query.pointer_distance, include_guidance: query.include_guidance };
        features_at_pointer(&self.store, &self.adapter, event, opts)
    }

    // --- Listeners ---

    /// Subscribe to every draw event. Listeners run in registration order.
    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DrawEvent) + 'static,
    {
        self.subscribe(None, Box::new(listener))
    }

    /// Subscribe to one kind of event only.
    pub fn on_event<F>(&mut self, kind: DrawEventKind, listener: F) -> ListenerId
    where
        F: FnMut(&DrawEvent) + 'static,
    {
        self.subscribe(Some(kind), Box::new(listener))
    }

    fn subscribe(&mut self, kind: Option<DrawEventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Subscription { id, kind, listener });
        id
    }

    /// Unsubscribe. Returns whether the listener was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|sub| sub.id != id);
        self.listeners.len() != before
    }

    // --- Input ---

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_click(&mut self, event: &PointerEvent) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.on_click(ctx, event))
    }

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_mouse_move(&mut self, event: &PointerEvent) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.on_mouse_move(ctx, event))
    }

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_key_down(&mut self, event: &KeyboardEvent) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.on_key_down(ctx, event))
    }

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_key_up(&mut self, event: &KeyboardEvent) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.on_key_up(ctx, event))
    }

    /// Opens an undo group that lasts until the matching drag end.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_drag_start(&mut self, event: &PointerEvent) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        self.history.begin_group();
        self.with_active(|mode, ctx| mode.on_drag_start(ctx, event))
    }

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_drag(&mut self, event: &PointerEvent) -> Result<(), DrawError> {
        self.with_active(|mode, ctx| mode.on_drag(ctx, event))
    }

    /// # Errors
    ///
    /// `NotEnabled` while stopped; mode lifecycle and store errors.
    pub fn on_drag_end(&mut self, event: &PointerEvent) -> Result<(), DrawError> {
        let result = self.with_active(|mode, ctx| mode.on_drag_end(ctx, event));
        self.history.end_group();
        result
    }

    /// The host cleared its map: drop everything.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped.
    pub fn on_clear(&mut self) -> Result<(), DrawError> {
        self.clear()
    }

    /// The host map finished loading: redraw every stored feature.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped.
    pub fn on_ready(&mut self) -> Result<(), DrawError> {
        self.ensure_enabled()?;
        let all = self.store.copy_all();
        if !all.is_empty() {
            let diff = RenderChanges { unchanged: self.styled(&all), ..RenderChanges::default() };
            self.adapter.render(&diff);
        }
        Ok(())
    }

    // --- History ---

    fn replay<F>(&mut self, f: F) -> Result<bool, DrawError>
    where
        F: FnOnce(&mut History, &mut FeatureStore) -> Result<bool, DrawError>,
    {
        self.ensure_enabled()?;
        if self.modes.get(self.active).is_some_and(Mode::is_drawing) {
            tracing::debug!(mode = self.get_mode(), "history refused while drawing");
            return Ok(false);
        }
        self.history.end_group();

        self.replaying = true;
        let result = self.replay_inner(f);
        self.replaying = false;
        result
    }

    fn replay_inner<F>(&mut self, f: F) -> Result<bool, DrawError>
    where
        F: FnOnce(&mut History, &mut FeatureStore) -> Result<bool, DrawError>,
    {
        if let Some(index) = self.select_index().filter(|i| *i == self.active) {
            self.with_mode(index, |mode, ctx| match mode.as_select_mut() {
                Some(select) => select.deselect(ctx),
                None => Ok(()),
            })?;
        }
        let applied = f(&mut self.history, &mut self.store);
        self.flush(Vec::new());
        applied
    }

    /// Revert the latest edit. Returns `false` when nothing was undone.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped; store errors while replaying.
    pub fn undo(&mut self) -> Result<bool, DrawError> {
        self.replay(History::undo)
    }

    /// Re-apply the latest undone edit. Returns `false` when nothing was redone.
    ///
    /// # Errors
    ///
    /// `NotEnabled` while stopped; store errors while replaying.
    pub fn redo(&mut self) -> Result<bool, DrawError> {
        self.replay(History::redo)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The adapter, for hosts that need to reach it after construction.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }
}
