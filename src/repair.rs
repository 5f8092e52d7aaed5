//! Anchor recovery for legacy grid data.
//!
//! Grids saved before anchors were tracked carry piece metadata on every
//! covered cell but no reliable anchor coordinates. Two cells belong to
//! the same placement iff they agree on (shape, rotation, rarity, level)
//! and are 4-connected; this module flood-fills those regions and
//! re-designates each region's top-left-most cell (row-major order) as
//! the anchor. It is a one-time migration step, never part of solving.

use tracing::warn;

use crate::grid::Grid;

/// Rewrites the anchor of every placement on `grid` from its footprint.
///
/// Returns the number of placements whose anchor changed.
pub fn repair_anchors(grid: &mut Grid) -> usize {
    let size = grid.size();
    let mut visited = vec![false; size * size];
    let mut repaired = 0;

    for row in 0..size {
        for col in 0..size {
            if visited[row * size + col] {
                continue;
            }
            let Some(piece) = grid
                .cell(row, col)
                .ok()
                .and_then(|cell| cell.piece().copied())
            else {
                continue;
            };

            let region = flood_region(grid, row, col, &mut visited);
            // anchor is the first region cell in row-major scan order
            let (anchor_row, anchor_col) = region[0];

            let expected = piece
                .piece
                .shape()
                .map(|shape| shape.pattern.cell_count())
                .unwrap_or(0);
            if region.len() != expected {
                warn!(
                    shape = piece.piece.shape_id,
                    cells = region.len(),
                    expected,
                    "repaired region size does not match its shape"
                );
            }

            let mut changed = false;
            for &(r, c) in &region {
                let cell = grid.cell_mut(r, c);
                if let Some(p) = &mut cell.piece {
                    if p.anchor() != (anchor_row, anchor_col) {
                        p.anchor_row = anchor_row;
                        p.anchor_col = anchor_col;
                        changed = true;
                    }
                }
            }
            // count placements, not cells
            if changed {
                repaired += 1;
            }
        }
    }

    repaired
}

/// Collects the 4-connected region of cells matching the piece at
/// `(start_row, start_col)` on (shape, rotation, rarity, level).
///
/// The returned cells are sorted row-major.
fn flood_region(
    grid: &Grid,
    start_row: usize,
    start_col: usize,
    visited: &mut [bool],
) -> Vec<(usize, usize)> {
    let size = grid.size();
    let reference = grid
        .cell(start_row, start_col)
        .ok()
        .and_then(|cell| cell.piece().copied());
    let matches = |row: usize, col: usize| -> bool {
        match (
            &reference,
            grid.cell(row, col).ok().and_then(|cell| cell.piece()),
        ) {
            (Some(a), Some(b)) => {
                a.piece.shape_id == b.piece.shape_id
                    && a.rotation == b.rotation
                    && a.piece.rarity == b.piece.rarity
                    && a.piece.level == b.piece.level
            }
            _ => false,
        }
    };

    let mut region = Vec::new();
    let mut stack = vec![(start_row, start_col)];
    visited[start_row * size + start_col] = true;

    while let Some((row, col)) = stack.pop() {
        region.push((row, col));

        let mut neighbors = Vec::with_capacity(4);
        if row > 0 {
            neighbors.push((row - 1, col));
        }
        if row + 1 < size {
            neighbors.push((row + 1, col));
        }
        if col > 0 {
            neighbors.push((row, col - 1));
        }
        if col + 1 < size {
            neighbors.push((row, col + 1));
        }
        for (nr, nc) in neighbors {
            if !visited[nr * size + nc] && matches(nr, nc) {
                visited[nr * size + nc] = true;
                stack.push((nr, nc));
            }
        }
    }

    region.sort_unstable();
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use crate::shapes::PieceInstance;

    fn scramble_anchors(grid: &mut Grid) {
        let size = grid.size();
        for row in 0..size {
            for col in 0..size {
                if let Some(piece) = &mut grid.cell_mut(row, col).piece {
                    // legacy data: each cell points at itself
                    piece.anchor_row = row;
                    piece.anchor_col = col;
                }
            }
        }
    }

    #[test]
    fn test_repair_restores_footprint_anchor() {
        let mut grid = Grid::fully_active(4).unwrap();
        let hook = PieceInstance::new(7, 2, 8).unwrap();
        let placed = grid.place(hook, Rotation::R0, 0, 1, None).unwrap();
        let expected_anchor = placed.anchor();

        scramble_anchors(&mut grid);
        let repaired = repair_anchors(&mut grid);

        assert!(repaired >= 1);
        for (r, c) in placed.covered_cells().unwrap() {
            let cell = grid.cell(r, c).unwrap();
            assert_eq!(cell.piece().unwrap().anchor(), expected_anchor);
        }
    }

    #[test]
    fn test_repair_keeps_distinct_pieces_separate() {
        let mut grid = Grid::fully_active(4).unwrap();
        // two adjacent Bar2 pieces with different rarities must not merge
        let low = PieceInstance::new(2, 0, 1).unwrap();
        let high = PieceInstance::new(2, 3, 1).unwrap();
        grid.place(low, Rotation::R0, 0, 0, None).unwrap();
        grid.place(high, Rotation::R0, 0, 2, None).unwrap();

        scramble_anchors(&mut grid);
        repair_anchors(&mut grid);

        assert_eq!(grid.cell(0, 0).unwrap().piece().unwrap().anchor(), (0, 0));
        assert_eq!(grid.cell(0, 1).unwrap().piece().unwrap().anchor(), (0, 0));
        assert_eq!(grid.cell(0, 2).unwrap().piece().unwrap().anchor(), (0, 2));
        assert_eq!(grid.cell(0, 3).unwrap().piece().unwrap().anchor(), (0, 2));
        assert_eq!(grid.placements().len(), 2);
    }

    #[test]
    fn test_repair_is_idempotent_on_healthy_grids() {
        let mut grid = Grid::fully_active(4).unwrap();
        let square = PieceInstance::new(5, 1, 1).unwrap();
        grid.place(square, Rotation::R0, 2, 2, None).unwrap();
        let before = grid.clone();

        assert_eq!(repair_anchors(&mut grid), 0);
        assert_eq!(grid, before);
    }
}
