use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Cell edge length in tiles. Strictly larger than the visibility range so
/// a 3x3 cell neighborhood is always a superset of everything visible.
pub const CELL_SIZE: i32 = 20;

/// Maximum Chebyshev distance at which entities perceive each other.
pub const VISIBILITY_RANGE: i32 = 15;

/// Chebyshev distance: the grid metric for 8-way movement.
pub fn chebyshev(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    (ax - bx).abs().max((ay - by).abs())
}

fn cell_coord(v: i32) -> i32 {
    // Floor division so negative tile coordinates bucket consistently.
    v.div_euclid(CELL_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    map: i16,
    cx: i32,
    cy: i32,
}

fn key(x: i32, y: i32, map: i16) -> CellKey {
    CellKey {
        map,
        cx: cell_coord(x),
        cy: cell_coord(y),
    }
}

/// Cell-bucket spatial index for one class of perceivable entities.
///
/// Structurally identical grids are instantiated per entity class (session
/// ids for players, object ids for NPCs, ground items, doors, summons) so
/// the hot path never discriminates on entity type. Accessed only from the
/// tick thread.
#[derive(Debug)]
pub struct AoiGrid<I> {
    cells: HashMap<CellKey, HashSet<I>>,
}

impl<I: Copy + Eq + Hash> Default for AoiGrid<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy + Eq + Hash> AoiGrid<I> {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    pub fn add(&mut self, id: I, x: i32, y: i32, map: i16) {
        self.cells.entry(key(x, y, map)).or_default().insert(id);
    }

    pub fn remove(&mut self, id: I, x: i32, y: i32, map: i16) {
        let k = key(x, y, map);
        if let Some(cell) = self.cells.get_mut(&k) {
            cell.remove(&id);
            if cell.is_empty() {
                self.cells.remove(&k);
            }
        }
    }

    /// Re-bucket an entity after a position change. Same-cell moves are a
    /// no-op; cross-cell moves are two hash operations.
    pub fn move_entity(
        &mut self,
        id: I,
        old_x: i32,
        old_y: i32,
        old_map: i16,
        new_x: i32,
        new_y: i32,
        new_map: i16,
    ) {
        let old_k = key(old_x, old_y, old_map);
        let new_k = key(new_x, new_y, new_map);
        if old_k == new_k {
            return;
        }
        self.remove(id, old_x, old_y, old_map);
        self.add(id, new_x, new_y, new_map);
    }

    /// All occupants of the 3x3 cells centered on the query tile. Callers
    /// apply exact Chebyshev filtering; the result order is arbitrary.
    pub fn get_nearby(&self, x: i32, y: i32, map: i16) -> Vec<I> {
        let cx = cell_coord(x);
        let cy = cell_coord(y);
        let mut result = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let k = CellKey {
                    map,
                    cx: cx + dx,
                    cy: cy + dy,
                };
                if let Some(cell) = self.cells.get(&k) {
                    result.extend(cell.iter().copied());
                }
            }
        }
        result
    }

    /// Number of live cell buckets (empty buckets are evicted).
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Partition of a viewer-set transition: who newly sees the entity, who
/// keeps seeing it, who no longer sees it.
#[derive(Debug, PartialEq, Eq)]
pub struct VisDiff<I> {
    pub appeared: Vec<I>,
    pub retained: Vec<I>,
    pub departed: Vec<I>,
}

/// The canonical AOI diff: `appeared = new \ old`, `retained = old ∩ new`,
/// `departed = old \ new`. Output is sorted for deterministic packet order.
pub fn diff<I: Copy + Eq + Hash + Ord>(old: &[I], new: &[I]) -> VisDiff<I> {
    let old_set: HashSet<I> = old.iter().copied().collect();
    let new_set: HashSet<I> = new.iter().copied().collect();

    let mut appeared: Vec<I> = new_set.difference(&old_set).copied().collect();
    let mut retained: Vec<I> = new_set.intersection(&old_set).copied().collect();
    let mut departed: Vec<I> = old_set.difference(&new_set).copied().collect();
    appeared.sort();
    retained.sort();
    departed.sort();

    VisDiff {
        appeared,
        retained,
        departed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_coord_floors_negatives() {
        assert_eq!(cell_coord(0), 0);
        assert_eq!(cell_coord(19), 0);
        assert_eq!(cell_coord(20), 1);
        assert_eq!(cell_coord(-1), -1);
        assert_eq!(cell_coord(-20), -1);
        assert_eq!(cell_coord(-21), -2);
    }

    #[test]
    fn add_then_nearby_finds_entity() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 100, 100, 4);
        assert_eq!(grid.get_nearby(100, 100, 4), vec![1]);
        // A query from an adjacent cell still covers it.
        assert_eq!(grid.get_nearby(119, 119, 4), vec![1]);
    }

    #[test]
    fn different_map_is_invisible() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 100, 100, 4);
        assert!(grid.get_nearby(100, 100, 5).is_empty());
    }

    #[test]
    fn far_cells_are_not_returned() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 0, 0, 0);
        // (60, 0) is cell 3 on the x axis; outside the 3x3 neighborhood of
        // cell 0.
        assert!(grid.get_nearby(60, 0, 0).is_empty());
    }

    #[test]
    fn remove_evicts_empty_bucket() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 5, 5, 0);
        assert_eq!(grid.cell_count(), 1);
        grid.remove(1u64, 5, 5, 0);
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn same_cell_move_is_noop() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 5, 5, 0);
        grid.move_entity(1u64, 5, 5, 0, 6, 6, 0);
        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.get_nearby(5, 5, 0), vec![1]);
    }

    #[test]
    fn cross_cell_move_rebuckets() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 19, 0, 0);
        grid.move_entity(1u64, 19, 0, 0, 20, 0, 0);
        // Still in the 3x3 neighborhood of the old cell, but the far query
        // side changed.
        assert_eq!(grid.get_nearby(39, 0, 0), vec![1]);
        assert!(grid.get_nearby(-20, 0, 0).is_empty());
    }

    #[test]
    fn cross_map_move() {
        let mut grid = AoiGrid::new();
        grid.add(1u64, 10, 10, 0);
        grid.move_entity(1u64, 10, 10, 0, 10, 10, 7);
        assert!(grid.get_nearby(10, 10, 0).is_empty());
        assert_eq!(grid.get_nearby(10, 10, 7), vec![1]);
    }

    #[test]
    fn cell_size_sufficiency() {
        // If |dx| <= V and |dy| <= V with V < CELL_SIZE, B must land in the
        // 3x3 neighborhood of A.
        let mut grid = AoiGrid::new();
        let (ax, ay) = (137, -53);
        let mut id = 0u64;
        for dx in -VISIBILITY_RANGE..=VISIBILITY_RANGE {
            for dy in -VISIBILITY_RANGE..=VISIBILITY_RANGE {
                grid.add(id, ax + dx, ay + dy, 0);
                id += 1;
            }
        }
        let nearby = grid.get_nearby(ax, ay, 0);
        assert_eq!(nearby.len() as u64, id);
    }

    #[test]
    fn diff_partitions_sets() {
        let old = [1u64, 2, 3];
        let new = [2u64, 3, 4];
        let d = diff(&old, &new);
        assert_eq!(d.appeared, vec![4]);
        assert_eq!(d.retained, vec![2, 3]);
        assert_eq!(d.departed, vec![1]);
    }

    #[test]
    fn diff_of_identical_sets() {
        let same = [7u64, 8];
        let d = diff(&same, &same);
        assert!(d.appeared.is_empty());
        assert_eq!(d.retained, vec![7, 8]);
        assert!(d.departed.is_empty());
    }

    #[test]
    fn diff_partition_is_exhaustive() {
        let old = [1u64, 5, 9, 12];
        let new = [5u64, 9, 20, 21];
        let d = diff(&old, &new);
        let mut union: Vec<u64> = d
            .appeared
            .iter()
            .chain(d.retained.iter())
            .chain(d.departed.iter())
            .copied()
            .collect();
        union.sort();
        let mut expected: Vec<u64> = old.iter().chain(new.iter()).copied().collect();
        expected.sort();
        expected.dedup();
        assert_eq!(union, expected);
    }
}
