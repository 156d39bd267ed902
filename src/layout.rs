//! Grid layout planning.
//!
//! Models are laid out on the smallest square grid that fits them, row by row, and
//! the grid is centred on the origin of the XZ plane. Each model is normalised to a
//! common size using its bounding box.

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::data_structures::bounds::Aabb;

/// A (row, column) coordinate on the square layout grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSlot {
    pub row: usize,
    pub col: usize,
}

/// Side length of the square grid needed for `count` items.
pub fn grid_size(count: usize) -> usize {
    // exact integer ceil(sqrt(count)); the float estimate is only a starting point
    let mut size = (count as f64).sqrt().ceil() as usize;
    while size > 0 && (size - 1) * (size - 1) >= count {
        size -= 1;
    }
    while size * size < count {
        size += 1;
    }
    size
}

/// Assigns `count` items to grid slots in row-major order.
pub fn plan(count: usize) -> Vec<GridSlot> {
    let size = grid_size(count);
    (0..count)
        .map(|i| GridSlot {
            row: i / size,
            col: i % size,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Distance between neighbouring slot centres.
    pub spacing: f32,
    /// Largest extent every model is scaled to.
    pub target_size: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            spacing: 2.0,
            target_size: 1.0,
        }
    }
}

impl LayoutSettings {
    /// World position of `slot` on a grid of `grid_size` x `grid_size`.
    pub fn position(&self, slot: GridSlot, grid_size: usize) -> Vector3<f32> {
        let half = (grid_size.max(1) as f32 - 1.0) / 2.0;
        Vector3::new(
            (slot.col as f32 - half) * self.spacing,
            0.0,
            (slot.row as f32 - half) * self.spacing,
        )
    }

    /// Uniform scale that brings the largest extent of `bounds` to `target_size`.
    ///
    /// Returns `None` for empty or zero-extent boxes, the caller keeps the model
    /// at its native size in that case.
    pub fn scale_for(&self, bounds: &Aabb) -> Option<f32> {
        if bounds.is_degenerate() {
            return None;
        }
        Some(self.target_size / bounds.max_extent())
    }
}
