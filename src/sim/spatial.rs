//! Uniform grid over the ground plane
//!
//! Rebuilt from scratch every frame; stores arena indices of alive enemies.
//! Indices are only valid until the end-of-frame compaction.

use std::collections::HashMap;

use glam::Vec2;

use super::arena::{Arena, Tombstone};
use super::enemy::Enemy;

/// Grid cell coordinate `(floor(x / size), floor(z / size))`
pub type CellKey = (i32, i32);

/// Cell size tuned to the largest effective hit radius
pub const DEFAULT_CELL_SIZE: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn key_for(&self, pos: Vec2) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Clear and reinsert every alive enemy
    pub fn rebuild(&mut self, enemies: &Arena<Enemy>) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        for (index, enemy) in enemies.slots().iter().enumerate() {
            if !enemy.is_alive() || !enemy.pos.is_finite() {
                continue;
            }
            let key = self.key_for(enemy.pos);
            self.cells.entry(key).or_default().push(index);
        }
        // drop buckets emptied by the clear above so memory tracks the live set
        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Enemy indices stored in a cell
    pub fn cell(&self, key: CellKey) -> &[usize] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell keys covering the bounding box of segment `a -> b` grown by `margin`
    pub fn cells_for_segment(&self, a: Vec2, b: Vec2, margin: f32) -> Vec<CellKey> {
        let lo = a.min(b) - Vec2::splat(margin);
        let hi = a.max(b) + Vec2::splat(margin);
        let (x0, z0) = self.key_for(lo);
        let (x1, z1) = self.key_for(hi);
        let mut keys = Vec::with_capacity(((x1 - x0 + 1) * (z1 - z0 + 1)).max(1) as usize);
        for x in x0..=x1 {
            for z in z0..=z1 {
                keys.push((x, z));
            }
        }
        keys
    }

    /// Deduplicated candidate indices along a swept segment
    pub fn candidates_for_segment(&self, a: Vec2, b: Vec2, margin: f32) -> Vec<usize> {
        let mut out = Vec::new();
        for key in self.cells_for_segment(a, b, margin) {
            out.extend_from_slice(self.cell(key));
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Candidate indices within `radius` of `center` (cell granularity)
    pub fn candidates_near(&self, center: Vec2, radius: f32) -> Vec<usize> {
        self.candidates_for_segment(center, center, radius)
    }

    /// Snapshot of the grid contents, sorted for comparison
    pub fn contents(&self) -> Vec<(CellKey, Vec<usize>)> {
        let mut out: Vec<(CellKey, Vec<usize>)> = self
            .cells
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn indexed_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}
