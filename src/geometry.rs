//! Pattern rotation utilities.
//!
//! Engraving pieces rotate in 90-degree steps. A single clockwise quarter
//! turn maps `in[r][c]` to `out[c][R-1-r]`; the other rotations are
//! compositions of that step.

use crate::shapes::Pattern;

/// The four placement orientations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// All orientations in ascending angle order.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// The rotation angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    fn quarter_turns(self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }
}

/// Rotates a pattern clockwise by the given rotation.
///
/// Dimensions swap for 90/270. Pure; the input is never modified.
pub fn rotate_pattern(pattern: &Pattern, rotation: Rotation) -> Pattern {
    let mut rotated = pattern.clone();
    for _ in 0..rotation.quarter_turns() {
        rotated = rotate_cw(&rotated);
    }
    rotated
}

/// Single 90-degree clockwise step: `out[c][R-1-r] = in[r][c]`.
fn rotate_cw(pattern: &Pattern) -> Pattern {
    let height = pattern.height();
    let width = pattern.width();
    let mut rows = vec![vec![false; height]; width];

    for r in 0..height {
        for c in 0..width {
            rows[c][height - 1 - r] = pattern.is_filled(r, c);
        }
    }

    Pattern::from_raw(rows)
}

/// Generates the distinct rotated forms of a pattern.
///
/// Applies all four rotations and drops duplicates; symmetric shapes
/// (squares, crosses) produce fewer than four forms. Each form keeps the
/// first rotation that produced it.
pub fn unique_rotations(pattern: &Pattern) -> Vec<(Rotation, Pattern)> {
    let mut forms: Vec<(Rotation, Pattern)> = Vec::with_capacity(4);
    for rotation in Rotation::ALL {
        let rotated = rotate_pattern(pattern, rotation);
        if !forms.iter().any(|(_, existing)| *existing == rotated) {
            forms.push((rotation, rotated));
        }
    }
    forms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SHAPES;

    #[test]
    fn test_four_quarter_turns_are_identity() {
        for shape in SHAPES.iter() {
            let mut rotated = shape.pattern.clone();
            for _ in 0..4 {
                rotated = rotate_pattern(&rotated, Rotation::R90);
            }
            assert_eq!(rotated, shape.pattern, "shape {} not restored", shape.name);
        }
    }

    #[test]
    fn test_cell_count_invariant_under_rotation() {
        for shape in SHAPES.iter() {
            for rotation in Rotation::ALL {
                assert_eq!(
                    rotate_pattern(&shape.pattern, rotation).cell_count(),
                    shape.pattern.cell_count(),
                    "shape {} changed cell count under {:?}",
                    shape.name,
                    rotation
                );
            }
        }
    }

    #[test]
    fn test_rotate_hook_90() {
        // #.        ###
        // #.   ->   #..
        // ##
        let hook = Pattern::parse(&["#.", "#.", "##"]).unwrap();
        let rotated = rotate_pattern(&hook, Rotation::R90);
        assert_eq!(rotated, Pattern::parse(&["###", "#.."]).unwrap());
    }

    #[test]
    fn test_rotation_zero_returns_equal_pattern() {
        let zig = Pattern::parse(&["##.", ".##"]).unwrap();
        assert_eq!(rotate_pattern(&zig, Rotation::R0), zig);
    }

    #[test]
    fn test_unique_rotations_dedup_symmetric_shapes() {
        let square = Pattern::parse(&["##", "##"]).unwrap();
        assert_eq!(unique_rotations(&square).len(), 1);

        let cross = Pattern::parse(&[".#.", "###", ".#."]).unwrap();
        assert_eq!(unique_rotations(&cross).len(), 1);

        let bar = Pattern::parse(&["###"]).unwrap();
        assert_eq!(unique_rotations(&bar).len(), 2);

        let hook = Pattern::parse(&["#.", "#.", "##"]).unwrap();
        assert_eq!(unique_rotations(&hook).len(), 4);
    }
}
