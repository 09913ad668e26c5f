//! Uniform-grid spatial index
//!
//! Rebuilt from scratch every step after motion. Keys are indices into the
//! owner's entity list, so the grid never holds references across steps.

use std::collections::HashMap;

use glam::Vec2;

/// Uniform grid mapping cells to the keys whose bounding square overlaps them
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    inv_cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "spatial grid cell size must be positive");
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::with_capacity(256),
        }
    }

    #[inline]
    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x * self.inv_cell_size).floor() as i32,
            (y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Cell range covered by the square of half-width `radius` around `pos`
    fn cell_range(&self, pos: Vec2, radius: f32) -> ((i32, i32), (i32, i32)) {
        let min = self.cell_of(pos.x - radius, pos.y - radius);
        let max = self.cell_of(pos.x + radius, pos.y + radius);
        (min, max)
    }

    /// Drop every bucket (keeps allocations for the next rebuild)
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    /// Bucket `key` into every cell its bounding square touches
    pub fn insert(&mut self, key: usize, pos: Vec2, radius: f32) {
        let ((x0, y0), (x1, y1)) = self.cell_range(pos, radius);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(key);
            }
        }
    }

    /// All keys in cells overlapping the query square, de-duplicated and
    /// sorted ascending. Over-inclusive: callers filter by exact distance.
    pub fn query_area(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        let ((x0, y0), (x1, y1)) = self.cell_range(pos, radius);
        let mut found = Vec::new();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    found.extend_from_slice(bucket);
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of non-empty buckets
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|b| !b.is_empty()).count()
    }
}
