//! Feature store: the single owner of every feature.
//!
//! DESIGN
//! ======
//! The store is the only shared mutable resource. Every mutating call either
//! applies completely or returns an error before touching anything, keeps the
//! spatial index in step, and appends exactly one [`StoreChange`] to an
//! ordered journal. The orchestrator drains the journal after each event and
//! turns every entry into a render diff, listener calls and an undo step, in
//! the order the mutations happened. Nothing is batched or coalesced here.
//!
//! Callers only ever see copies or shared borrows of store geometry.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DrawError;
use crate::geometry::{BBox, Feature, FeatureId, Geometry, NewFeature, Properties};
use crate::spatial::{IndexEntry, SpatialIndex};

// =============================================================================
// ID STRATEGY
// =============================================================================

/// How feature ids are generated and checked.
#[derive(Clone)]
pub struct IdStrategy {
    is_valid_id: Rc<dyn Fn(&FeatureId) -> bool>,
    get_id: Rc<dyn Fn() -> FeatureId>,
}

impl IdStrategy {
    pub fn new(is_valid_id: impl Fn(&FeatureId) -> bool + 'static, get_id: impl Fn() -> FeatureId + 'static) -> Self {
        Self { is_valid_id: Rc::new(is_valid_id), get_id: Rc::new(get_id) }
    }

    #[must_use]
    pub fn is_valid_id(&self, id: &FeatureId) -> bool {
        (self.is_valid_id)(id)
    }

    #[must_use]
    pub fn get_id(&self) -> FeatureId {
        (self.get_id)()
    }
}

impl Default for IdStrategy {
    /// Version-4 UUID strings.
    fn default() -> Self {
        Self::new(
            |id| Uuid::parse_str(id.as_str()).is_ok_and(|uuid| uuid.get_version_num() == 4),
            || FeatureId::from(Uuid::new_v4()),
        )
    }
}

impl fmt::Debug for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdStrategy")
    }
}

// =============================================================================
// CHANGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// One journal entry: a single mutating call and the features it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub ids: Vec<FeatureId>,
    /// Snapshots before the change (update and delete).
    pub before: Vec<Feature>,
    /// Snapshots after the change (create and update).
    pub after: Vec<Feature>,
}

/// Replace the geometry of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPatch {
    pub id: FeatureId,
    pub geometry: Geometry,
}

/// Set (`Some`) or remove (`None`) one property of one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPatch {
    pub id: FeatureId,
    pub property: String,
    pub value: Option<serde_json::Value>,
}

impl PropertyPatch {
    pub fn set(id: &FeatureId, property: &str, value: impl Into<serde_json::Value>) -> Self {
        Self { id: id.clone(), property: property.to_string(), value: Some(value.into()) }
    }

    #[must_use]
    pub fn remove(id: &FeatureId, property: &str) -> Self {
        Self { id: id.clone(), property: property.to_string(), value: None }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// In-memory, spatially indexed store of features in insertion order.
#[derive(Debug, Default)]
pub struct FeatureStore {
    features: IndexMap<FeatureId, Feature>,
    index: SpatialIndex,
    id_strategy: IdStrategy,
    changes: Vec<StoreChange>,
}

impl FeatureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id_strategy(id_strategy: IdStrategy) -> Self {
        Self { id_strategy, ..Self::default() }
    }

    #[must_use]
    pub fn id_strategy(&self) -> &IdStrategy {
        &self.id_strategy
    }

    fn dedup(ids: &[FeatureId]) -> Vec<FeatureId> {
        let mut seen = HashSet::new();
        ids.iter().filter(|id| seen.insert((*id).clone())).cloned().collect()
    }

    fn ensure_exists<'a, I>(&self, ids: I) -> Result<(), DrawError>
    where
        I: IntoIterator<Item = &'a FeatureId>,
    {
        for id in ids {
            if !self.features.contains_key(id) {
                return Err(DrawError::FeatureNotFound(id.clone()));
            }
        }
        Ok(())
    }

    fn reindex(&mut self, id: &FeatureId, old: Option<BBox>, new: Option<BBox>) {
        if let Some(bbox) = old {
            self.index.remove(id, bbox);
        }
        if let Some(bbox) = new {
            self.index.insert(id.clone(), bbox);
        }
    }

    /// Add features, assigning ids where missing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` when the id strategy rejects a supplied id and
    /// `DuplicateId` when an id is already stored or repeated in the batch.
    /// Nothing is stored on error.
    pub fn create(&mut self, features: Vec<NewFeature>) -> Result<Vec<FeatureId>, DrawError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch_ids = HashSet::new();
        let mut resolved = Vec::with_capacity(features.len());
        for feature in features {
            let id = match feature.id {
                Some(id) => id,
                None => self.id_strategy.get_id(),
            };
            if !self.id_strategy.is_valid_id(&id) {
                return Err(DrawError::InvalidId(id));
            }
            if self.features.contains_key(&id) || !batch_ids.insert(id.clone()) {
                return Err(DrawError::DuplicateId(id));
            }
            resolved.push(Feature { id, geometry: feature.geometry, properties: feature.properties });
        }

        let entries: Vec<IndexEntry> = resolved
            .iter()
            .filter_map(|f| f.geometry.bbox().map(|bbox| IndexEntry::new(f.id.clone(), bbox)))
            .collect();
        self.index.load(entries);

        let ids: Vec<FeatureId> = resolved.iter().map(|f| f.id.clone()).collect();
        for feature in &resolved {
            self.features.insert(feature.id.clone(), feature.clone());
        }
        tracing::trace!(count = ids.len(), "store: create");
        self.changes.push(StoreChange { kind: ChangeKind::Create, ids: ids.clone(), before: Vec::new(), after: resolved });
        Ok(ids)
    }

    /// Replace geometries and re-index.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if any id is absent; nothing is applied.
    pub fn update_geometry(&mut self, patches: Vec<GeometryPatch>) -> Result<(), DrawError> {
        if patches.is_empty() {
            return Ok(());
        }
        self.ensure_exists(patches.iter().map(|p| &p.id))?;

        let ids = Self::dedup(&patches.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
        let before: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();

        for patch in patches {
            let Some(feature) = self.features.get_mut(&patch.id) else {
                continue;
            };
            let old = feature.geometry.bbox();
            let new = patch.geometry.bbox();
            feature.geometry = patch.geometry;
            self.reindex(&patch.id, old, new);
        }

        let after: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();
        self.changes.push(StoreChange { kind: ChangeKind::Update, ids, before, after });
        Ok(())
    }

    /// Set or remove properties.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if any id is absent; nothing is applied.
    pub fn update_property(&mut self, patches: Vec<PropertyPatch>) -> Result<(), DrawError> {
        if patches.is_empty() {
            return Ok(());
        }
        self.ensure_exists(patches.iter().map(|p| &p.id))?;

        let ids = Self::dedup(&patches.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
        let before: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();

        for patch in patches {
            let Some(feature) = self.features.get_mut(&patch.id) else {
                continue;
            };
            match patch.value {
                Some(value) => {
                    feature.properties.insert(patch.property, value);
                }
                None => {
                    feature.properties.remove(&patch.property);
                }
            }
        }

        let after: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();
        self.changes.push(StoreChange { kind: ChangeKind::Update, ids, before, after });
        Ok(())
    }

    /// Overwrite geometry and properties of stored features with snapshots,
    /// as one update. Used to replay history.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if any id is absent; nothing is applied.
    pub fn restore(&mut self, snapshots: Vec<Feature>) -> Result<(), DrawError> {
        if snapshots.is_empty() {
            return Ok(());
        }
        self.ensure_exists(snapshots.iter().map(|f| &f.id))?;

        let ids = Self::dedup(&snapshots.iter().map(|f| f.id.clone()).collect::<Vec<_>>());
        let before: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();

        for snapshot in snapshots {
            let Some(feature) = self.features.get_mut(&snapshot.id) else {
                continue;
            };
            let old = feature.geometry.bbox();
            let new = snapshot.geometry.bbox();
            feature.geometry = snapshot.geometry;
            feature.properties = snapshot.properties;
            self.reindex(&snapshot.id, old, new);
        }

        let after: Vec<Feature> = ids.iter().filter_map(|id| self.features.get(id).cloned()).collect();
        self.changes.push(StoreChange { kind: ChangeKind::Update, ids, before, after });
        Ok(())
    }

    /// Remove features and their index entries.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if any id is absent; nothing is removed.
    pub fn delete(&mut self, ids: &[FeatureId]) -> Result<(), DrawError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.ensure_exists(ids)?;

        let ids = Self::dedup(ids);
        let mut before = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(feature) = self.features.shift_remove(id) {
                self.reindex(id, feature.geometry.bbox(), None);
                before.push(feature);
            }
        }
        tracing::trace!(count = ids.len(), "store: delete");
        self.changes.push(StoreChange { kind: ChangeKind::Delete, ids, before, after: Vec::new() });
        Ok(())
    }

    /// Remove everything as a single delete change.
    pub fn clear(&mut self) {
        if self.features.is_empty() {
            return;
        }
        let before: Vec<Feature> = self.features.drain(..).map(|(_, f)| f).collect();
        let ids = before.iter().map(|f| f.id.clone()).collect();
        self.index.clear();
        self.changes.push(StoreChange { kind: ChangeKind::Delete, ids, before, after: Vec::new() });
    }

    // --- Queries ---

    #[must_use]
    pub fn has(&self, id: &FeatureId) -> bool {
        self.features.contains_key(id)
    }

    /// Shared borrow of a stored feature.
    #[must_use]
    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Deep copy of one feature.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` when absent.
    pub fn copy(&self, id: &FeatureId) -> Result<Feature, DrawError> {
        self.features.get(id).cloned().ok_or_else(|| DrawError::FeatureNotFound(id.clone()))
    }

    /// Deep copy of one feature's geometry.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` when absent.
    pub fn get_geometry_copy(&self, id: &FeatureId) -> Result<Geometry, DrawError> {
        self.features
            .get(id)
            .map(|f| f.geometry.clone())
            .ok_or_else(|| DrawError::FeatureNotFound(id.clone()))
    }

    /// Deep copy of one feature's properties.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` when absent.
    pub fn get_properties_copy(&self, id: &FeatureId) -> Result<Properties, DrawError> {
        self.features
            .get(id)
            .map(|f| f.properties.clone())
            .ok_or_else(|| DrawError::FeatureNotFound(id.clone()))
    }

    /// Deep copies of every feature in insertion order.
    #[must_use]
    pub fn copy_all(&self) -> Vec<Feature> {
        self.features.values().cloned().collect()
    }

    /// Deep copies of every feature matching `pred`, in insertion order.
    pub fn copy_all_where<F>(&self, pred: F) -> Vec<Feature>
    where
        F: Fn(&Feature) -> bool,
    {
        self.features.values().filter(|f| pred(f)).cloned().collect()
    }

    /// Features whose bounding box intersects `bbox`, in insertion order.
    #[must_use]
    pub fn search(&self, bbox: &BBox) -> Vec<Feature> {
        let mut hits: Vec<(usize, &Feature)> = self
            .index
            .search(bbox)
            .iter()
            .filter_map(|id| self.features.get_full(id).map(|(i, _, f)| (i, f)))
            .collect();
        hits.sort_by_key(|(i, _)| *i);
        hits.into_iter().map(|(_, f)| f.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Drain the change journal in application order.
    pub fn take_changes(&mut self) -> Vec<StoreChange> {
        std::mem::take(&mut self.changes)
    }
}
