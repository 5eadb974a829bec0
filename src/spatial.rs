//! R-tree over feature bounding boxes.
//!
//! The store keeps one entry per feature. A batch loaded into an empty index
//! is bulk-built (`RTree::bulk_load`, which partitions with quickselect);
//! everything else is inserted and removed incrementally.

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;

use std::fmt;

use rstar::{AABB, RTree, RTreeObject};

use crate::geometry::{BBox, FeatureId};

/// Index entry: a feature id and its lng/lat box.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: FeatureId,
    envelope: AABB<[f64; 2]>,
}

impl IndexEntry {
    #[must_use]
    pub fn new(id: FeatureId, bbox: BBox) -> Self {
        Self { id, envelope: to_envelope(&bbox) }
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn to_envelope(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat])
}

pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.tree.size()).finish()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    #[must_use]
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build a balanced index from scratch.
    #[must_use]
    pub fn bulk(entries: Vec<IndexEntry>) -> Self {
        Self { tree: RTree::bulk_load(entries) }
    }

    /// Add a batch; an empty index is rebuilt in bulk.
    pub fn load(&mut self, entries: Vec<IndexEntry>) {
        if self.tree.size() == 0 {
            self.tree = RTree::bulk_load(entries);
        } else {
            for entry in entries {
                self.tree.insert(entry);
            }
        }
    }

    pub fn insert(&mut self, id: FeatureId, bbox: BBox) {
        self.tree.insert(IndexEntry::new(id, bbox));
    }

    /// Remove the entry for `id` stored under `bbox`. Returns false when absent.
    pub fn remove(&mut self, id: &FeatureId, bbox: BBox) -> bool {
        self.tree.remove(&IndexEntry::new(id.clone(), bbox)).is_some()
    }

    /// Ids of every entry whose box intersects `bbox`, in no particular order.
    #[must_use]
    pub fn search(&self, bbox: &BBox) -> Vec<FeatureId> {
        self.tree
            .locate_in_envelope_intersecting(&to_envelope(bbox))
            .map(|entry| entry.id.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
