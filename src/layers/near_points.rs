//! Per-part 2D index over currently-active supports (Sec. 3 `NearPoints`,
//! Sec. 9 "Per-layer trees sharing a global store"): an `rstar::RTree` over
//! indices into the global [`PointStore`](crate::points::PointStore),
//! rebuilt (never mutated in place) on every add/remove, matching Sec. 4.8's
//! explicit "rebuilt, not mutated" rule.

use crate::points::{PointIndex, PointStore};
use ahash::AHashSet;

#[derive(Clone, Copy, Debug)]
struct Entry {
    index: PointIndex,
    x: f64,
    y: f64,
}

impl rstar::RTreeObject for Entry {
    type Envelope = rstar::AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        rstar::AABB::from_point([self.x, self.y])
    }
}

impl rstar::PointDistance for Entry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Clone, Default)]
pub struct NearPoints {
    tree: rstar::RTree<Entry>,
}

impl NearPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: impl IntoIterator<Item = PointIndex>, store: &PointStore) -> Self {
        let entries: Vec<Entry> = indices
            .into_iter()
            .map(|idx| {
                let p = store.get(idx);
                Entry {
                    index: idx,
                    x: p.world_xyz.x,
                    y: p.world_xyz.y,
                }
            })
            .collect();
        Self {
            tree: rstar::RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = PointIndex> + '_ {
        self.tree.iter().map(|e| e.index)
    }

    /// Rebuilds the tree with `index` added, reading its position from
    /// `store`.
    pub fn with_added(&self, index: PointIndex, store: &PointStore) -> Self {
        let mut indices: Vec<PointIndex> = self.indices().collect();
        indices.push(index);
        Self::from_indices(indices, store)
    }

    /// Rebuilds the tree keeping only points for which `keep` returns true.
    pub fn filtered(&self, store: &PointStore, keep: impl Fn(PointIndex) -> bool) -> Self {
        let indices: Vec<PointIndex> = self.indices().filter(|&i| keep(i)).collect();
        let _ = store;
        Self::from_indices(indices, store)
    }

    /// Union of `self` and `other`, deduplicated by index, then rebuilt.
    pub fn merged(trees: &[&Self], store: &PointStore) -> Self {
        let mut seen: AHashSet<PointIndex> = AHashSet::new();
        let mut indices = Vec::new();
        for tree in trees {
            for idx in tree.indices() {
                if seen.insert(idx) {
                    indices.push(idx);
                }
            }
        }
        Self::from_indices(indices, store)
    }

    /// Any point within `radius` of `(x, y)`, using each point's own
    /// `current_radius` as the query radius rather than a fixed one --
    /// this answers "is this sample already supported?" (Sec. 4.8 step 4).
    pub fn any_covering(&self, x: f64, y: f64, store: &PointStore) -> bool {
        self.tree.iter().any(|entry| {
            let p = store.get(entry.index);
            let dx = p.world_xyz.x - x;
            let dy = p.world_xyz.y - y;
            (dx * dx + dy * dy) <= p.current_radius * p.current_radius
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::{LayerSupportPoint, SupportIslandPoint, SupportKind};

    fn point_at(store: &mut PointStore, x: f64, y: f64, radius: f64) -> PointIndex {
        store.push(LayerSupportPoint {
            island_point: SupportIslandPoint::Permanent {
                pos: crate::geom::Point::new(0, 0),
            },
            world_xyz: glam::DVec3::new(x, y, 0.0),
            layer_index: 0,
            current_radius: radius,
            radius_curve_index: 0,
            kind: SupportKind::Island,
            is_permanent: false,
        })
    }

    #[test]
    fn added_point_is_found_and_covers_nearby_queries() {
        let mut store = PointStore::new();
        let idx = point_at(&mut store, 1.0, 1.0, 0.5);
        let tree = NearPoints::new().with_added(idx, &store);
        assert_eq!(tree.len(), 1);
        assert!(tree.any_covering(1.2, 1.0, &store));
        assert!(!tree.any_covering(5.0, 5.0, &store));
    }

    #[test]
    fn filtered_drops_points_the_predicate_rejects() {
        let mut store = PointStore::new();
        let keep = point_at(&mut store, 0.0, 0.0, 0.1);
        let drop = point_at(&mut store, 10.0, 10.0, 0.1);
        let tree = NearPoints::from_indices([keep, drop], &store);
        let filtered = tree.filtered(&store, |i| i == keep);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.indices().next(), Some(keep));
    }

    #[test]
    fn merged_deduplicates_shared_indices() {
        let mut store = PointStore::new();
        let a = point_at(&mut store, 0.0, 0.0, 0.1);
        let b = point_at(&mut store, 1.0, 1.0, 0.1);
        let left = NearPoints::from_indices([a, b], &store);
        let right = NearPoints::from_indices([b], &store);
        let merged = NearPoints::merged(&[&left, &right], &store);
        assert_eq!(merged.len(), 2);
    }
}
