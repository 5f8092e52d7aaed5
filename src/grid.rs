//! Engraving grid representation and placement validation.
//!
//! A grid is a small square matrix of cells. Cells are inactive (never hold
//! pieces), active-empty, or active-occupied. Every cell covered by a placed
//! piece stores a copy of the placement; the placement is identified by its
//! anchor, the top-left-most covered cell in row-major order.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::geometry::{rotate_pattern, Rotation};
use crate::shapes::{Pattern, PieceInstance};
use crate::EngraverError;

/// Largest supported grid side length. The game ships 4x4 and 5x5 grids.
pub const MAX_GRID_SIZE: usize = 8;

/// A piece placed on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedPiece {
    pub piece: PieceInstance,
    pub rotation: Rotation,
    /// Row of the top-left-most covered cell in row-major order.
    pub anchor_row: usize,
    /// Column of the top-left-most covered cell in row-major order.
    pub anchor_col: usize,
    /// Inventory slot this piece came from, if any. The slot stays in the
    /// inventory while the piece is placed but is reported as locked.
    pub source_slot: Option<usize>,
}

impl PlacedPiece {
    /// The placement's anchor cell.
    pub fn anchor(&self) -> (usize, usize) {
        (self.anchor_row, self.anchor_col)
    }

    /// The rotated pattern this placement stamps onto the grid.
    pub fn rotated_pattern(&self) -> Result<Pattern, EngraverError> {
        Ok(rotate_pattern(&self.piece.shape()?.pattern, self.rotation))
    }

    /// Grid cells covered by this placement.
    ///
    /// The pattern origin is recovered from the anchor: the anchor is the
    /// first filled pattern cell translated onto the grid.
    pub fn covered_cells(&self) -> Result<Vec<(usize, usize)>, EngraverError> {
        let pattern = self.rotated_pattern()?;
        let (fr, fc) = pattern.first_filled();
        let origin_row = self.anchor_row.checked_sub(fr);
        let origin_col = self.anchor_col.checked_sub(fc);
        let (origin_row, origin_col) = match (origin_row, origin_col) {
            (Some(r), Some(c)) => (r, c),
            _ => {
                return Err(EngraverError::InvalidPlacement {
                    shape_id: self.piece.shape_id,
                    row: self.anchor_row,
                    col: self.anchor_col,
                })
            }
        };
        Ok(pattern
            .filled_cells()
            .into_iter()
            .map(|(pr, pc)| (origin_row + pr, origin_col + pc))
            .collect())
    }
}

/// A single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub(crate) active: bool,
    pub(crate) piece: Option<PlacedPiece>,
}

impl Cell {
    /// Whether this cell can ever hold a piece.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The placement covering this cell, if any.
    pub fn piece(&self) -> Option<&PlacedPiece> {
        self.piece.as_ref()
    }
}

/// A square engraving grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with every cell inactive.
    pub fn new(size: usize) -> Result<Self, EngraverError> {
        if size == 0 || size > MAX_GRID_SIZE {
            return Err(EngraverError::InvalidGridSize { size });
        }
        Ok(Self {
            size,
            cells: vec![Cell::default(); size * size],
        })
    }

    /// Creates a grid with every cell active and empty.
    pub fn fully_active(size: usize) -> Result<Self, EngraverError> {
        let mut grid = Self::new(size)?;
        for cell in &mut grid.cells {
            cell.active = true;
        }
        Ok(grid)
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), EngraverError> {
        if row >= self.size || col >= self.size {
            return Err(EngraverError::CellOutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        Ok(())
    }

    /// The cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell, EngraverError> {
        self.check_bounds(row, col)?;
        Ok(&self.cells[self.idx(row, col)])
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let idx = self.idx(row, col);
        &mut self.cells[idx]
    }

    /// Activates or deactivates a cell. Deactivating an occupied cell also
    /// removes the piece covering it.
    pub fn set_active(&mut self, row: usize, col: usize, active: bool) -> Result<(), EngraverError> {
        self.check_bounds(row, col)?;
        if !active {
            if let Some(piece) = self.cells[self.idx(row, col)].piece {
                self.remove(piece.anchor_row, piece.anchor_col);
            }
        }
        let idx = self.idx(row, col);
        self.cells[idx].active = active;
        Ok(())
    }

    /// Number of active cells.
    pub fn total_active(&self) -> usize {
        self.cells.iter().filter(|cell| cell.active).count()
    }

    /// First active cell with no piece, scanning row-major.
    pub fn first_empty_active(&self) -> Option<(usize, usize)> {
        for row in 0..self.size {
            for col in 0..self.size {
                let cell = &self.cells[self.idx(row, col)];
                if cell.active && cell.piece.is_none() {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// Whether every active cell is covered.
    pub fn is_complete(&self) -> bool {
        self.first_empty_active().is_none()
    }

    /// Checks whether `pattern` can be stamped with its `[0][0]` cell at
    /// `(origin_row, origin_col)`.
    ///
    /// Every filled pattern cell must land in bounds, on an active cell,
    /// and on an empty cell. An occupied cell is allowed when the occupying
    /// placement's anchor equals `exempt_anchor`: the repositioning case,
    /// where a piece's old footprint does not conflict with itself.
    pub fn can_place(
        &self,
        pattern: &Pattern,
        origin_row: usize,
        origin_col: usize,
        exempt_anchor: Option<(usize, usize)>,
    ) -> bool {
        for (pr, pc) in pattern.filled_cells() {
            let row = origin_row + pr;
            let col = origin_col + pc;
            if row >= self.size || col >= self.size {
                return false;
            }
            let cell = &self.cells[self.idx(row, col)];
            if !cell.active {
                return false;
            }
            if let Some(occupant) = &cell.piece {
                if exempt_anchor != Some(occupant.anchor()) {
                    return false;
                }
            }
        }
        true
    }

    /// Places a piece with the rotated pattern's `[0][0]` cell at
    /// `(origin_row, origin_col)`, returning the recorded placement.
    pub fn place(
        &mut self,
        piece: PieceInstance,
        rotation: Rotation,
        origin_row: usize,
        origin_col: usize,
        source_slot: Option<usize>,
    ) -> Result<PlacedPiece, EngraverError> {
        let pattern = rotate_pattern(&piece.shape()?.pattern, rotation);
        if !self.can_place(&pattern, origin_row, origin_col, None) {
            return Err(EngraverError::InvalidPlacement {
                shape_id: piece.shape_id,
                row: origin_row,
                col: origin_col,
            });
        }

        let (fr, fc) = pattern.first_filled();
        let placed = PlacedPiece {
            piece,
            rotation,
            anchor_row: origin_row + fr,
            anchor_col: origin_col + fc,
            source_slot,
        };
        for (pr, pc) in pattern.filled_cells() {
            let idx = self.idx(origin_row + pr, origin_col + pc);
            self.cells[idx].piece = Some(placed);
        }
        Ok(placed)
    }

    /// Removes the placement anchored at `(anchor_row, anchor_col)`.
    ///
    /// Returns the removed placement, or `None` if no piece is anchored
    /// there.
    pub fn remove(&mut self, anchor_row: usize, anchor_col: usize) -> Option<PlacedPiece> {
        let anchor = (anchor_row, anchor_col);
        let removed = self
            .cells
            .iter()
            .find_map(|cell| cell.piece.filter(|p| p.anchor() == anchor))?;
        for cell in &mut self.cells {
            if cell.piece.map(|p| p.anchor()) == Some(anchor) {
                cell.piece = None;
            }
        }
        Some(removed)
    }

    /// Distinct placements on the grid, in row-major anchor order.
    pub fn placements(&self) -> Vec<PlacedPiece> {
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut placements = Vec::new();
        for cell in &self.cells {
            if let Some(piece) = &cell.piece {
                if seen.insert(piece.anchor()) {
                    placements.push(*piece);
                }
            }
        }
        placements
    }

    /// Inventory slots locked by placements currently on the grid.
    pub fn locked_slots(&self) -> FxHashSet<usize> {
        self.placements()
            .iter()
            .filter_map(|piece| piece.source_slot)
            .collect()
    }

    /// Applies a solution's placements to this grid in order.
    ///
    /// Each placement is validated; an invalid one aborts with the grid
    /// left partially filled, so callers apply to a scratch copy.
    pub fn apply_solution(&mut self, solution: &[PlacedPiece]) -> Result<(), EngraverError> {
        for placed in solution {
            let pattern = placed.rotated_pattern()?;
            let (fr, fc) = pattern.first_filled();
            let (origin_row, origin_col) = match (
                placed.anchor_row.checked_sub(fr),
                placed.anchor_col.checked_sub(fc),
            ) {
                (Some(r), Some(c)) => (r, c),
                _ => {
                    return Err(EngraverError::InvalidPlacement {
                        shape_id: placed.piece.shape_id,
                        row: placed.anchor_row,
                        col: placed.anchor_col,
                    })
                }
            };
            self.place(
                placed.piece,
                placed.rotation,
                origin_row,
                origin_col,
                placed.source_slot,
            )?;
        }
        Ok(())
    }

    /// Renders the grid as text rows.
    ///
    /// Inactive cells show as '.', empty active cells as '_', and occupied
    /// cells as a per-placement number (hex letters past 9) assigned in
    /// row-major anchor order.
    pub fn render(&self) -> String {
        let placements = self.placements();
        let number_of = |anchor: (usize, usize)| -> u8 {
            placements
                .iter()
                .position(|p| p.anchor() == anchor)
                .map(|i| i as u8 + 1)
                .unwrap_or(0)
        };

        let mut output = String::new();
        for row in 0..self.size {
            for col in 0..self.size {
                let cell = &self.cells[self.idx(row, col)];
                let display = match &cell.piece {
                    Some(piece) => {
                        let n = number_of(piece.anchor());
                        if n < 10 {
                            char::from(b'0' + n)
                        } else {
                            char::from(b'A' + n - 10)
                        }
                    }
                    None if cell.active => '_',
                    None => '.',
                };
                output.push(display);
            }
            output.push('\n');
        }
        output
    }
}

/// A reusable grid layout owned by a candidate weapon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTemplate {
    pub size: usize,
    pub active_cells: Vec<(usize, usize)>,
    #[serde(default)]
    pub completion_bonus: u32,
}

impl GridTemplate {
    /// A template with every cell active.
    pub fn full(size: usize) -> Self {
        let mut active_cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                active_cells.push((row, col));
            }
        }
        Self {
            size,
            active_cells,
            completion_bonus: 0,
        }
    }

    /// Builds an empty grid from this template.
    ///
    /// Fails fast on an unsupported size or an out-of-range active cell.
    pub fn instantiate(&self) -> Result<Grid, EngraverError> {
        let mut grid = Grid::new(self.size)?;
        for &(row, col) in &self.active_cells {
            grid.set_active(row, col, true)?;
        }
        Ok(grid)
    }
}

/// Formats a solution applied to a template, one text row per grid row.
pub fn format_solution(
    template: &GridTemplate,
    solution: &[PlacedPiece],
) -> Result<String, EngraverError> {
    let mut grid = template.instantiate()?;
    grid.apply_solution(solution)?;
    Ok(grid.render())
}
