//! Bounded undo/redo over store changes.
//!
//! DESIGN
//! ======
//! History is fed every drained [`StoreChange`] and keeps only what a user
//! would call an edit:
//!
//! - guidance features (closing, selection and midpoint markers) are dropped;
//! - shapes still being drawn are invisible until finished, at which point
//!   the finished shape is recorded as created;
//! - the `selected` flag is stripped, so selecting is never an undo step.
//!
//! Each step stores full before/after snapshots and is replayed through the
//! store API, so undo and redo produce ordinary store changes that render
//! and notify like any other. A group (one drag gesture) folds every change
//! it receives into a single step.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::props;
use crate::error::DrawError;
use crate::geometry::{Feature, FeatureId, NewFeature};
use crate::store::{ChangeKind, FeatureStore, StoreChange};

/// One undoable edit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryStep {
    pub created: Vec<Feature>,
    /// `(before, after)` pairs.
    pub updated: Vec<(Feature, Feature)>,
    pub deleted: Vec<Feature>,
}

impl HistoryStep {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Translate a store change into a step, keeping user data only.
    #[must_use]
    pub fn from_change(change: &StoreChange) -> Self {
        let mut step = Self::default();
        match change.kind {
            ChangeKind::Create => {
                step.created = change.after.iter().filter(|f| is_user_data(f)).map(strip).collect();
            }
            ChangeKind::Delete => {
                step.deleted = change.before.iter().filter(|f| is_user_data(f)).map(strip).collect();
            }
            ChangeKind::Update => {
                for (before, after) in change.before.iter().zip(&change.after) {
                    if before.props().is_guidance() || after.props().currently_drawing() {
                        continue;
                    }
                    let after = strip(after);
                    if before.props().currently_drawing() {
                        step.created.push(after);
                        continue;
                    }
                    let before = strip(before);
                    if before != after {
                        step.updated.push((before, after));
                    }
                }
            }
        }
        step
    }

    /// Fold a later step into this one.
    fn merge(&mut self, later: HistoryStep) {
        for created in later.created {
            self.created.push(created);
        }
        for (before, after) in later.updated {
            if let Some(created) = self.created.iter_mut().find(|f| f.id == after.id) {
                *created = after;
            } else if let Some(pair) = self.updated.iter_mut().find(|(_, a)| a.id == after.id) {
                pair.1 = after;
            } else {
                self.updated.push((before, after));
            }
        }
        for deleted in later.deleted {
            if let Some(pos) = self.created.iter().position(|f| f.id == deleted.id) {
                self.created.remove(pos);
                continue;
            }
            let original = match self.updated.iter().position(|(_, a)| a.id == deleted.id) {
                Some(pos) => self.updated.remove(pos).0,
                None => deleted,
            };
            self.deleted.push(original);
        }
    }
}

fn is_user_data(feature: &Feature) -> bool {
    let p = feature.props();
    !p.is_guidance() && !p.currently_drawing()
}

fn strip(feature: &Feature) -> Feature {
    let mut feature = feature.clone();
    feature.properties.remove(props::SELECTED);
    feature
}

fn ids_of(features: &[Feature]) -> Vec<FeatureId> {
    features.iter().map(|f| f.id.clone()).collect()
}

/// Undo and redo stacks.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<HistoryStep>,
    redo: Vec<HistoryStep>,
    capacity: usize,
    group: Option<HistoryStep>,
}

impl History {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), capacity, group: None }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Record a drained store change. Returns whether it produced a step.
    pub fn record(&mut self, change: &StoreChange) -> bool {
        let step = HistoryStep::from_change(change);
        if step.is_empty() {
            return false;
        }
        match self.group.as_mut() {
            Some(group) => group.merge(step),
            None => self.push(step),
        }
        true
    }

    fn push(&mut self, step: HistoryStep) {
        self.redo.clear();
        self.undo.push_back(step);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    /// Start folding changes into one step.
    pub fn begin_group(&mut self) {
        if self.group.is_none() {
            self.group = Some(HistoryStep::default());
        }
    }

    /// Close the current group, pushing it if anything was recorded.
    pub fn end_group(&mut self) {
        if let Some(step) = self.group.take() {
            if !step.is_empty() {
                self.push(step);
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.group = None;
    }

    /// Revert the latest step. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Propagates store errors; the step is dropped in that case.
    pub fn undo(&mut self, store: &mut FeatureStore) -> Result<bool, DrawError> {
        self.end_group();
        let Some(step) = self.undo.pop_back() else {
            return Ok(false);
        };
        let created: Vec<FeatureId> = ids_of(&step.created).into_iter().filter(|id| store.has(id)).collect();
        store.delete(&created)?;
        store.restore(present(store, step.updated.iter().map(|(before, _)| before)))?;
        store.create(recreate(store, &step.deleted))?;
        tracing::debug!(
            created = step.created.len(),
            updated = step.updated.len(),
            deleted = step.deleted.len(),
            "history: undo"
        );
        self.redo.push(step);
        Ok(true)
    }

    /// Re-apply the latest undone step. Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Propagates store errors; the step is dropped in that case.
    pub fn redo(&mut self, store: &mut FeatureStore) -> Result<bool, DrawError> {
        let Some(step) = self.redo.pop() else {
            return Ok(false);
        };
        store.create(recreate(store, &step.created))?;
        store.restore(present(store, step.updated.iter().map(|(_, after)| after)))?;
        let deleted: Vec<FeatureId> = ids_of(&step.deleted).into_iter().filter(|id| store.has(id)).collect();
        store.delete(&deleted)?;
        tracing::debug!(
            created = step.created.len(),
            updated = step.updated.len(),
            deleted = step.deleted.len(),
            "history: redo"
        );
        self.undo.push_back(step);
        Ok(true)
    }
}

/// Snapshots of features that are still stored.
fn present<'a, I>(store: &FeatureStore, snapshots: I) -> Vec<Feature>
where
    I: IntoIterator<Item = &'a Feature>,
{
    snapshots.into_iter().filter(|f| store.has(&f.id)).cloned().collect()
}

/// Snapshots not currently stored, ready for `create`.
fn recreate(store: &FeatureStore, snapshots: &[Feature]) -> Vec<NewFeature> {
    snapshots
        .iter()
        .filter(|f| !store.has(&f.id))
        .cloned()
        .map(NewFeature::from)
        .collect()
}
