//! Backtracking auto-solver for engraving grids.
//!
//! Enumerates complete tilings: selections of inventory pieces, rotations,
//! and positions that cover every active cell exactly once. The search is
//! grid-guided: each backtracking step targets the first empty active cell
//! and only tries placements that cover it, rather than scanning every
//! position. Result sets are deduplicated by shape-type signature, keeping
//! one representative tiling per multiset of shape names so rarity and
//! level variants of the same layout do not flood the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::geometry::{unique_rotations, Rotation};
use crate::grid::{Grid, PlacedPiece};
use crate::shapes::{Pattern, Shape, SlotPiece, INVENTORY_SLOTS};
use crate::EngraverError;

/// A complete tiling of a grid's active cells.
pub type Solution = Vec<PlacedPiece>;

/// An inventory piece with its rotation variants pre-computed.
struct PieceVariants {
    slot_piece: SlotPiece,
    shape: &'static Shape,
    variants: Vec<(Rotation, Pattern)>,
    cell_count: usize,
}

/// Finds tilings of `grid` using each of `pieces` at most once.
///
/// Returns one representative solution per distinct shape-type multiset,
/// up to `max_solutions` if a cap is given. An empty result means nothing
/// in the inventory tiles the grid; that is a negative answer, not an
/// error.
pub fn solve(
    grid: &Grid,
    pieces: &[SlotPiece],
    max_solutions: Option<usize>,
) -> Result<Vec<Solution>, EngraverError> {
    let never = AtomicBool::new(false);
    solve_with_cancel(grid, pieces, max_solutions, &never)
}

/// `solve` with a cooperative cancellation flag.
///
/// The flag is polled between combination attempts; setting it makes the
/// search return the solutions found so far. In-flight backtracking for a
/// single combination is never interrupted.
pub fn solve_with_cancel(
    grid: &Grid,
    pieces: &[SlotPiece],
    max_solutions: Option<usize>,
    cancel: &AtomicBool,
) -> Result<Vec<Solution>, EngraverError> {
    if pieces.is_empty() || grid.total_active() == 0 {
        return Ok(Vec::new());
    }

    let started = Instant::now();
    let variants = build_variants(pieces)?;
    let total_active = grid.total_active();

    // lower bound on piece count: fewer pieces than this cannot cover the
    // grid even if every one of them is the largest available
    let total_cells: usize = variants.iter().map(|v| v.cell_count).sum();
    let avg_cells = total_cells as f64 / variants.len() as f64;
    let min_pieces = ((total_active as f64 / avg_cells).floor() as usize).max(1);
    let max_pieces = variants.len().min(INVENTORY_SLOTS);

    let mut solutions: Vec<Solution> = Vec::new();
    let mut seen_signatures: FxHashSet<String> = FxHashSet::default();

    'sizes: for k in min_pieces..=max_pieces {
        for combo in index_combinations(variants.len(), k) {
            if cancel.load(Ordering::Relaxed) {
                debug!(found = solutions.len(), "solve cancelled");
                break 'sizes;
            }

            // exact cover is impossible unless the cell counts add up
            let combo_cells: usize = combo.iter().map(|&i| variants[i].cell_count).sum();
            if combo_cells != total_active {
                continue;
            }

            let signature = combination_signature(&combo, &variants);
            if seen_signatures.contains(&signature) {
                continue;
            }

            let mut work = grid.clone();
            let mut used = vec![false; combo.len()];
            let mut placed: Vec<PlacedPiece> = Vec::with_capacity(k);
            if place_combination(&mut work, &combo, &variants, &mut used, &mut placed) {
                seen_signatures.insert(signature);
                solutions.push(placed);
                if let Some(cap) = max_solutions {
                    if solutions.len() >= cap {
                        break 'sizes;
                    }
                }
            }
        }
    }

    debug!(
        found = solutions.len(),
        active = total_active,
        pieces = pieces.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "solve finished"
    );
    Ok(solutions)
}

/// Shape-type signature of an already-built solution, e.g. `"Bar2:2,Square:1"`.
pub fn solution_signature(solution: &[PlacedPiece]) -> Result<String, EngraverError> {
    let mut names: Vec<&str> = solution
        .iter()
        .map(|placed| placed.piece.shape().map(|shape| shape.name))
        .collect::<Result<_, _>>()?;
    Ok(join_counted(&mut names))
}

fn build_variants(pieces: &[SlotPiece]) -> Result<Vec<PieceVariants>, EngraverError> {
    pieces
        .iter()
        .map(|&slot_piece| {
            let shape = slot_piece.piece.shape()?;
            slot_piece.piece.validate()?;
            Ok(PieceVariants {
                slot_piece,
                shape,
                variants: unique_rotations(&shape.pattern),
                cell_count: shape.pattern.cell_count(),
            })
        })
        .collect()
}

/// Multiset of shape names in a combination, independent of rarity/level.
fn combination_signature(combo: &[usize], variants: &[PieceVariants]) -> String {
    let mut names: Vec<&str> = combo.iter().map(|&i| variants[i].shape.name).collect();
    join_counted(&mut names)
}

fn join_counted(names: &mut Vec<&str>) -> String {
    names.sort_unstable();
    let mut signature = String::new();
    let mut i = 0;
    while i < names.len() {
        let name = names[i];
        let run = names[i..].iter().take_while(|&&n| n == name).count();
        if !signature.is_empty() {
            signature.push(',');
        }
        signature.push_str(name);
        signature.push(':');
        signature.push_str(&run.to_string());
        i += run;
    }
    signature
}

/// All k-element index combinations of `0..n`, in lexicographic order.
fn index_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut current = Vec::with_capacity(k);
    collect_combinations(0, n, k, &mut current, &mut result);
    result
}

fn collect_combinations(
    start: usize,
    n: usize,
    k: usize,
    current: &mut Vec<usize>,
    result: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    // not enough indices left to finish the combination
    let remaining = k - current.len();
    for i in start..=n.saturating_sub(remaining) {
        current.push(i);
        collect_combinations(i + 1, n, k, current, result);
        current.pop();
    }
}

/// Tries to tile the grid with exactly the pieces in `combo`.
///
/// Each step targets the first empty active cell and tries every rotation
/// of every unused piece, positioned so that each of its filled cells in
/// turn lands on the target. Succeeds only when every piece is placed and
/// the grid is complete.
fn place_combination(
    grid: &mut Grid,
    combo: &[usize],
    variants: &[PieceVariants],
    used: &mut [bool],
    placed: &mut Vec<PlacedPiece>,
) -> bool {
    let Some((target_row, target_col)) = grid.first_empty_active() else {
        return placed.len() == combo.len();
    };
    if placed.len() == combo.len() {
        // pieces exhausted but cells remain
        return false;
    }

    for (ci, &vi) in combo.iter().enumerate() {
        if used[ci] {
            continue;
        }
        used[ci] = true;
        let variant = &variants[vi];

        for (rotation, pattern) in &variant.variants {
            for (pr, pc) in pattern.filled_cells() {
                if pr > target_row || pc > target_col {
                    continue;
                }
                let origin_row = target_row - pr;
                let origin_col = target_col - pc;
                if !grid.can_place(pattern, origin_row, origin_col, None) {
                    continue;
                }

                let placement = match grid.place(
                    variant.slot_piece.piece,
                    *rotation,
                    origin_row,
                    origin_col,
                    Some(variant.slot_piece.slot),
                ) {
                    Ok(placement) => placement,
                    Err(_) => continue,
                };
                placed.push(placement);

                if place_combination(grid, combo, variants, used, placed) {
                    return true;
                }

                placed.pop();
                grid.remove(placement.anchor_row, placement.anchor_col);
            }
        }
        used[ci] = false;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTemplate;
    use crate::shapes::PieceInstance;

    fn slot_piece(slot: usize, shape_id: u32, rarity: u8, level: u8) -> SlotPiece {
        SlotPiece {
            slot,
            piece: PieceInstance::new(shape_id, rarity, level).unwrap(),
        }
    }

    /// Checks full coverage and no overlap by re-applying the solution.
    fn assert_solution_valid(grid: &Grid, solution: &[PlacedPiece]) {
        let mut check = grid.clone();
        check.apply_solution(solution).expect("solution must apply cleanly");
        assert!(check.is_complete(), "solution leaves active cells uncovered");
    }

    #[test]
    fn test_empty_inventory_returns_no_solutions() {
        let grid = Grid::fully_active(4).unwrap();
        assert!(solve(&grid, &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_single_square_tiles_two_by_two() {
        let grid = Grid::fully_active(2).unwrap();
        let pieces = [slot_piece(0, 5, 0, 1)];
        let solutions = solve(&grid, &pieces, None).unwrap();

        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].len(), 1);
        let placement = &solutions[0][0];
        assert_eq!(placement.anchor(), (0, 0));
        assert_eq!(placement.rotation, Rotation::R0);
        assert_eq!(placement.source_slot, Some(0));
        assert_solution_valid(&grid, &solutions[0]);
    }

    #[test]
    fn test_odd_area_with_even_pieces_is_unsolvable() {
        let template = GridTemplate {
            size: 4,
            active_cells: vec![(1, 1)],
            completion_bonus: 0,
        };
        let grid = template.instantiate().unwrap();
        let pieces = [slot_piece(0, 2, 0, 1), slot_piece(1, 2, 0, 1)];
        assert!(solve(&grid, &pieces, None).unwrap().is_empty());
    }

    #[test]
    fn test_rarity_variants_collapse_to_one_representative() {
        let grid = Grid::fully_active(2).unwrap();
        let pieces = [slot_piece(0, 5, 1, 3), slot_piece(1, 5, 5, 40)];
        let solutions = solve(&grid, &pieces, None).unwrap();
        assert_eq!(solutions.len(), 1, "one representative per shape multiset");
    }

    #[test]
    fn test_four_hooks_tile_four_by_four() {
        let grid = Grid::fully_active(4).unwrap();
        let pieces = [
            slot_piece(0, 7, 0, 1),
            slot_piece(1, 7, 1, 2),
            slot_piece(2, 7, 2, 3),
            slot_piece(3, 7, 3, 4),
        ];
        let solutions = solve(&grid, &pieces, None).unwrap();

        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].len(), 4);
        assert_solution_valid(&grid, &solutions[0]);
        assert_eq!(solution_signature(&solutions[0]).unwrap(), "Hook:4");
    }

    #[test]
    fn test_mixed_inventory_finds_multiple_signatures() {
        let grid = Grid::fully_active(4).unwrap();
        let pieces = [
            slot_piece(0, 5, 0, 1),
            slot_piece(1, 5, 0, 1),
            slot_piece(2, 5, 0, 1),
            slot_piece(3, 5, 0, 1),
            slot_piece(4, 7, 0, 1),
            slot_piece(5, 7, 0, 1),
            slot_piece(6, 7, 0, 1),
            slot_piece(7, 7, 0, 1),
        ];
        let solutions = solve(&grid, &pieces, None).unwrap();
        let signatures: Vec<String> = solutions
            .iter()
            .map(|s| solution_signature(s).unwrap())
            .collect();

        assert!(signatures.contains(&"Square:4".to_string()));
        assert!(signatures.contains(&"Hook:4".to_string()));
        assert!(signatures.contains(&"Hook:2,Square:2".to_string()));
        for solution in &solutions {
            assert_solution_valid(&grid, solution);
        }
        // signatures are unique across the result set
        let mut deduped = signatures.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), signatures.len());
    }

    #[test]
    fn test_solution_cap_limits_results() {
        let grid = Grid::fully_active(4).unwrap();
        let pieces = [
            slot_piece(0, 5, 0, 1),
            slot_piece(1, 5, 0, 1),
            slot_piece(2, 5, 0, 1),
            slot_piece(3, 5, 0, 1),
            slot_piece(4, 7, 0, 1),
            slot_piece(5, 7, 0, 1),
            slot_piece(6, 7, 0, 1),
            slot_piece(7, 7, 0, 1),
        ];
        let solutions = solve(&grid, &pieces, Some(1)).unwrap();
        assert_eq!(solutions.len(), 1);
    }

    #[test]
    fn test_inventory_order_does_not_change_signature_set() {
        let grid = Grid::fully_active(4).unwrap();
        let mut pieces = vec![
            slot_piece(0, 5, 0, 1),
            slot_piece(1, 5, 2, 7),
            slot_piece(2, 7, 1, 4),
            slot_piece(3, 7, 3, 9),
            slot_piece(4, 5, 4, 20),
            slot_piece(5, 5, 1, 2),
            slot_piece(6, 7, 0, 1),
            slot_piece(7, 7, 5, 50),
        ];
        let forward = solve(&grid, &pieces, None).unwrap();
        pieces.reverse();
        let reversed = solve(&grid, &pieces, None).unwrap();

        let signature_set = |solutions: &[Solution]| {
            let mut sigs: Vec<String> = solutions
                .iter()
                .map(|s| solution_signature(s).unwrap())
                .collect();
            sigs.sort();
            sigs
        };
        assert_eq!(signature_set(&forward), signature_set(&reversed));
    }

    #[test]
    fn test_partially_inactive_grid() {
        // 5x5 grid with a 2x4 active band across rows 1-2
        let mut active_cells = Vec::new();
        for row in 1..3 {
            for col in 0..4 {
                active_cells.push((row, col));
            }
        }
        let template = GridTemplate {
            size: 5,
            active_cells,
            completion_bonus: 0,
        };
        let grid = template.instantiate().unwrap();
        // two squares fit the band; a hook plus a square cannot
        let pieces = [
            slot_piece(0, 5, 0, 1),
            slot_piece(1, 5, 0, 1),
            slot_piece(2, 7, 0, 1),
        ];
        let solutions = solve(&grid, &pieces, None).unwrap();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solution_signature(&solutions[0]).unwrap(), "Square:2");
        assert_solution_valid(&grid, &solutions[0]);
    }

    #[test]
    fn test_pre_set_cancel_flag_returns_nothing() {
        let grid = Grid::fully_active(2).unwrap();
        let pieces = [slot_piece(0, 5, 0, 1)];
        let cancel = AtomicBool::new(true);
        let solutions = solve_with_cancel(&grid, &pieces, None, &cancel).unwrap();
        assert!(solutions.is_empty());
    }

    #[test]
    fn test_unknown_shape_fails_fast() {
        let grid = Grid::fully_active(2).unwrap();
        let bad = SlotPiece {
            slot: 0,
            piece: PieceInstance {
                shape_id: 77,
                rarity: 0,
                level: 1,
            },
        };
        assert_eq!(
            solve(&grid, &[bad], None).unwrap_err(),
            EngraverError::UnknownShape(77)
        );
    }
}
