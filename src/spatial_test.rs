use super::*;

fn id(s: &str) -> FeatureId {
    FeatureId::from(s)
}

fn square(min: f64, max: f64) -> BBox {
    BBox::new([min, min], [max, max])
}

fn sorted(mut ids: Vec<FeatureId>) -> Vec<FeatureId> {
    ids.sort();
    ids
}

#[test]
fn insert_and_search() {
    let mut index = SpatialIndex::new();
    index.insert(id("a"), square(0.0, 1.0));
    index.insert(id("b"), square(5.0, 6.0));
    assert_eq!(index.len(), 2);
    assert_eq!(index.search(&square(0.5, 0.6)), vec![id("a")]);
    assert_eq!(sorted(index.search(&square(-10.0, 10.0))), vec![id("a"), id("b")]);
    assert!(index.search(&square(2.0, 3.0)).is_empty());
}

#[test]
fn point_boxes_are_found() {
    let mut index = SpatialIndex::new();
    index.insert(id("p"), BBox::from_position([1.0, 1.0]));
    assert_eq!(index.search(&square(0.9, 1.1)), vec![id("p")]);
}

#[test]
fn remove_requires_matching_box() {
    let mut index = SpatialIndex::new();
    index.insert(id("a"), square(0.0, 1.0));
    assert!(!index.remove(&id("a"), square(0.0, 2.0)));
    assert!(index.remove(&id("a"), square(0.0, 1.0)));
    assert!(index.is_empty());
    assert!(!index.remove(&id("a"), square(0.0, 1.0)));
}

#[test]
fn load_bulk_builds_then_inserts() {
    let mut index = SpatialIndex::default();
    let entries: Vec<IndexEntry> = (0..50)
        .map(|i| {
            let v = f64::from(i);
            IndexEntry::new(id(&format!("f{i}")), square(v, v + 0.5))
        })
        .collect();
    index.load(entries);
    assert_eq!(index.len(), 50);
    index.load(vec![IndexEntry::new(id("late"), square(100.0, 101.0))]);
    assert_eq!(index.len(), 51);
    assert_eq!(index.search(&square(100.2, 100.3)), vec![id("late")]);
    assert_eq!(index.search(&square(10.1, 10.2)), vec![id("f10")]);
}

#[test]
fn bulk_and_clear() {
    let mut index = SpatialIndex::bulk(vec![IndexEntry::new(id("a"), square(0.0, 1.0))]);
    assert_eq!(index.len(), 1);
    index.clear();
    assert!(index.is_empty());
    assert!(index.search(&square(0.0, 1.0)).is_empty());
}
