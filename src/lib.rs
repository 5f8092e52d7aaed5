//! Soul Weapon Engraving Solver Library
//!
//! Provides the core functionality for the engraving puzzle: placing
//! rotatable multi-cell pieces onto a partially-active grid so that every
//! active cell is covered exactly once, enumerating complete tilings for a
//! given inventory, and ranking candidate weapons by how well that inventory
//! fits their grids.

pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod repair;
pub mod search;
pub mod shapes;
pub mod solver;

use thiserror::Error;

/// Errors emitted at the data-model and solver boundaries.
///
/// These all indicate caller bugs or malformed input data. A grid that
/// simply has no tiling is not an error; the solver reports that as an
/// empty solution list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngraverError {
    /// Pattern is empty, ragged, or has no filled cell.
    #[error("pattern must be a non-empty rectangular matrix with at least one filled cell")]
    InvalidPattern,
    /// Grid side length outside the supported range.
    #[error("grid size must be between 1 and {max}, got {size}", max = grid::MAX_GRID_SIZE)]
    InvalidGridSize { size: usize },
    /// A template or placement referenced a cell outside the grid.
    #[error("cell ({row}, {col}) is outside a {size}x{size} grid")]
    CellOutOfBounds { row: usize, col: usize, size: usize },
    /// A placement failed validation (out of bounds, inactive, or occupied).
    #[error("shape {shape_id} cannot be placed at ({row}, {col})")]
    InvalidPlacement { shape_id: u32, row: usize, col: usize },
    /// Rarity outside the 0..=5 ordinal range.
    #[error("rarity {0} is outside 0..=5")]
    InvalidRarity(u8),
    /// Level outside the 1..=50 range.
    #[error("level {0} is outside 1..=50")]
    InvalidLevel(u8),
    /// Shape id not present in the catalog.
    #[error("unknown shape id {0}")]
    UnknownShape(u32),
    /// Inventory slot index outside the 8-slot inventory.
    #[error("inventory slot {0} is outside 0..={max}", max = shapes::INVENTORY_SLOTS - 1)]
    InvalidSlot(usize),
}
