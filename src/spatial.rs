use std::collections::{BTreeMap, HashMap};

use crate::constants::SPATIAL_BUCKET_SIZE;
use crate::error::{SimError, SimResult};
use crate::types::{ActorId, Rect, Vec2};

/// Which actor stands where. An exact cell map answers point lookups, and a
/// coarse bucket partition narrows range and nearest queries.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    width: i32,
    height: i32,
    bucket_size: i32,
    cells: HashMap<Vec2, ActorId>,
    positions: HashMap<ActorId, Vec2>,
    buckets: BTreeMap<(i32, i32), Vec<ActorId>>,
}

impl SpatialIndex {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_bucket_size(width, height, SPATIAL_BUCKET_SIZE)
    }

    pub fn with_bucket_size(width: i32, height: i32, bucket_size: i32) -> Self {
        Self {
            width,
            height,
            bucket_size: bucket_size.max(1),
            cells: HashMap::new(),
            positions: HashMap::new(),
            buckets: BTreeMap::new(),
        }
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn bucket_of(&self, pos: Vec2) -> (i32, i32) {
        (
            pos.x.div_euclid(self.bucket_size),
            pos.y.div_euclid(self.bucket_size),
        )
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position_of(&self, id: ActorId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Inserts `id` at `pos`. Re-adding a known id first drops its old entry.
    pub fn add(&mut self, id: ActorId, pos: Vec2) -> SimResult<()> {
        if !self.in_bounds(pos) {
            return Err(SimError::OutOfBounds(pos));
        }
        if let Some(occupant) = self.cells.get(&pos).copied() {
            if occupant != id {
                return Err(SimError::CellOccupied { pos, occupant });
            }
        }
        self.remove(id);
        self.cells.insert(pos, id);
        self.positions.insert(id, pos);
        let bucket = self.bucket_of(pos);
        self.buckets.entry(bucket).or_default().push(id);
        Ok(())
    }

    /// Removes `id` wherever it is. Unknown ids are ignored.
    pub fn remove(&mut self, id: ActorId) -> Option<Vec2> {
        let pos = self.positions.remove(&id)?;
        if self.cells.get(&pos) == Some(&id) {
            self.cells.remove(&pos);
        }
        let bucket = self.bucket_of(pos);
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.buckets.remove(&bucket);
            }
        }
        Some(pos)
    }

    /// Remove-at-old then add-at-new. On failure the actor stays where it was.
    pub fn move_actor(&mut self, id: ActorId, to: Vec2) -> SimResult<()> {
        let from = self.position_of(id);
        self.remove(id);
        if let Err(err) = self.add(id, to) {
            if let Some(from) = from {
                self.add(id, from)?;
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn at(&self, pos: Vec2) -> Option<ActorId> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.cells.get(&pos).copied()
    }

    /// Every indexed actor, closest first. Equal distances are ordered by id.
    pub fn nearest(&self, origin: Vec2) -> Vec<ActorId> {
        let mut found: Vec<(i64, ActorId)> = self
            .positions
            .iter()
            .map(|(id, pos)| (pos.dist2(origin), *id))
            .collect();
        found.sort_unstable();
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Like [`Self::nearest`] but limited to actors within `radius` (Euclidean).
    pub fn nearest_within(&self, origin: Vec2, radius: u32) -> Vec<ActorId> {
        let r = radius.min(i32::MAX as u32) as i32;
        let limit = (r as i64) * (r as i64);
        let area = Rect::new(
            Vec2::new(origin.x.saturating_sub(r), origin.y.saturating_sub(r)),
            Vec2::new(origin.x.saturating_add(r), origin.y.saturating_add(r)),
        );
        let mut found: Vec<(i64, ActorId)> = self
            .candidates(area)
            .filter_map(|(id, pos)| {
                let d2 = pos.dist2(origin);
                (d2 <= limit).then_some((d2, id))
            })
            .collect();
        found.sort_unstable();
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Actors inside the inclusive rectangle, in id order.
    pub fn within(&self, rect: Rect) -> Vec<ActorId> {
        let mut found: Vec<ActorId> = self
            .candidates(rect)
            .filter(|(_, pos)| rect.contains(*pos))
            .map(|(id, _)| id)
            .collect();
        found.sort_unstable();
        found
    }

    fn candidates(&self, rect: Rect) -> impl Iterator<Item = (ActorId, Vec2)> + '_ {
        let clamp = |v: i32, max: i32| v.clamp(0, (max - 1).max(0));
        let lo = self.bucket_of(Vec2::new(
            clamp(rect.min.x, self.width),
            clamp(rect.min.y, self.height),
        ));
        let hi = self.bucket_of(Vec2::new(
            clamp(rect.max.x, self.width),
            clamp(rect.max.y, self.height),
        ));
        self.buckets
            .iter()
            .filter(move |((bx, by), _)| *bx >= lo.0 && *bx <= hi.0 && *by >= lo.1 && *by <= hi.1)
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter_map(move |id| self.positions.get(&id).map(|pos| (id, *pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialIndex;
    use crate::error::SimError;
    use crate::rng::Rng;
    use crate::types::{ActorId, Rect, Vec2};

    #[test]
    fn basic_add_lookup_and_remove() {
        let mut index = SpatialIndex::with_bucket_size(11, 1, 2);
        assert_eq!(index.at(Vec2::new(0, 0)), None);
        assert!(index.nearest(Vec2::new(0, 0)).is_empty());

        let d1 = ActorId(1);
        let d2 = ActorId(2);
        let d3 = ActorId(3);
        index.add(d1, Vec2::new(0, 0)).expect("free cell");
        index.add(d2, Vec2::new(9, 0)).expect("free cell");
        assert_eq!(index.at(Vec2::new(0, 0)), Some(d1));

        assert_eq!(index.nearest(Vec2::new(0, 0)), vec![d1, d2]);
        assert_eq!(index.nearest(Vec2::new(10, 0)), vec![d2, d1]);

        index.remove(d1);
        assert_eq!(index.at(Vec2::new(0, 0)), None);
        assert_eq!(index.nearest(Vec2::new(0, 0)), vec![d2]);

        index.add(d1, Vec2::new(0, 0)).expect("free again");
        index.add(d3, Vec2::new(8, 0)).expect("free cell");
        assert_eq!(index.within(Rect::from_size(0, 0, 11, 1)).len(), 3);

        index.move_actor(d1, Vec2::new(10, 0)).expect("free cell");
        assert!(index.within(Rect::new(Vec2::new(0, 0), Vec2::new(5, 0))).is_empty());
        assert_eq!(
            index.within(Rect::new(Vec2::new(5, 0), Vec2::new(10, 0))),
            vec![d1, d2, d3]
        );
        assert_eq!(index.at(Vec2::new(0, 0)), None);
        assert_eq!(index.at(Vec2::new(10, 0)), Some(d1));
    }

    #[test]
    fn add_then_remove_leaves_cell_empty() {
        let mut index = SpatialIndex::new(20, 20);
        let id = ActorId(4);
        let pos = Vec2::new(3, 7);
        index.add(id, pos).expect("free cell");
        index.remove(id);
        assert_eq!(index.at(pos), None);
        assert!(index.is_empty());
        // stale remove is harmless
        assert_eq!(index.remove(id), None);
    }

    #[test]
    fn readding_same_actor_drops_the_stale_entry() {
        let mut index = SpatialIndex::new(20, 20);
        let id = ActorId(1);
        index.add(id, Vec2::new(1, 1)).expect("free cell");
        index.add(id, Vec2::new(15, 15)).expect("free cell");
        assert_eq!(index.at(Vec2::new(1, 1)), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.within(Rect::from_size(0, 0, 20, 20)), vec![id]);
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let mut index = SpatialIndex::new(5, 5);
        index.add(ActorId(1), Vec2::new(2, 2)).expect("free cell");
        let err = index.add(ActorId(2), Vec2::new(2, 2));
        assert!(matches!(err, Err(SimError::CellOccupied { .. })));
        assert_eq!(index.at(Vec2::new(2, 2)), Some(ActorId(1)));
    }

    #[test]
    fn failed_move_keeps_actor_in_place() {
        let mut index = SpatialIndex::new(5, 5);
        index.add(ActorId(1), Vec2::new(0, 0)).expect("free cell");
        index.add(ActorId(2), Vec2::new(1, 0)).expect("free cell");
        assert!(index.move_actor(ActorId(1), Vec2::new(1, 0)).is_err());
        assert_eq!(index.position_of(ActorId(1)), Some(Vec2::new(0, 0)));
        assert_eq!(index.at(Vec2::new(0, 0)), Some(ActorId(1)));
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let mut index = SpatialIndex::new(5, 5);
        assert_eq!(index.at(Vec2::new(-1, 0)), None);
        assert_eq!(index.at(Vec2::new(50, 50)), None);
        assert!(index.add(ActorId(1), Vec2::new(5, 0)).is_err());
    }

    #[test]
    fn nearest_is_sorted_for_random_layouts() {
        let mut rng = Rng::new(2024);
        for round in 0..20 {
            let mut index = SpatialIndex::with_bucket_size(64, 64, 8);
            for n in 0..60u32 {
                let pos = Vec2::new(rng.int(0, 63), rng.int(0, 63));
                let _ = index.add(ActorId(n), pos);
            }
            let origin = Vec2::new(rng.int(0, 63), rng.int(0, 63));
            let sorted = index.nearest(origin);
            assert_eq!(sorted.len(), index.len(), "round {round}");
            let distances: Vec<i64> = sorted
                .iter()
                .filter_map(|id| index.position_of(*id))
                .map(|pos| pos.dist2(origin))
                .collect();
            assert!(distances.windows(2).all(|w| w[0] <= w[1]), "round {round}");

            let bounded = index.nearest_within(origin, 10);
            let expected: Vec<ActorId> = sorted
                .iter()
                .copied()
                .filter(|id| index.position_of(*id).map(|p| p.dist2(origin) <= 100).unwrap_or(false))
                .collect();
            assert_eq!(bounded, expected, "round {round}");
        }
    }
}
