//! Engraving shape catalog and piece types.
//!
//! Each shape is a small polyomino defined by a rectangular occupancy
//! pattern, normalized so its bounding box is tight (no empty border rows
//! or columns). The catalog is fixed at load time and never mutated.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::EngraverError;

/// Number of slots in a player inventory.
pub const INVENTORY_SLOTS: usize = 8;

/// Highest rarity ordinal.
pub const MAX_RARITY: u8 = 5;

/// Highest piece level.
pub const MAX_LEVEL: u8 = 50;

/// Stat category granted by an engraving shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatTag {
    Attack,
    Hp,
    Crit,
    Gold,
}

/// A rectangular boolean occupancy matrix with at least one filled cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    rows: Vec<Vec<bool>>,
}

impl Pattern {
    /// Creates a pattern, rejecting empty, ragged, or all-false matrices.
    pub fn new(rows: Vec<Vec<bool>>) -> Result<Self, EngraverError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(EngraverError::InvalidPattern);
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(EngraverError::InvalidPattern);
        }
        if !rows.iter().flatten().any(|&cell| cell) {
            return Err(EngraverError::InvalidPattern);
        }
        Ok(Self { rows })
    }

    /// Parses a pattern from string rows, `#` for filled cells.
    pub fn parse(rows: &[&str]) -> Result<Self, EngraverError> {
        Self::new(
            rows.iter()
                .map(|row| row.chars().map(|c| c == '#').collect())
                .collect(),
        )
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Whether the cell at `(row, col)` is filled.
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.rows[row][col]
    }

    /// Number of filled cells. Invariant under rotation.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&cell| cell).count()
    }

    /// Filled cell offsets in row-major order.
    pub fn filled_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(self.cell_count());
        for (r, row) in self.rows.iter().enumerate() {
            for (c, &filled) in row.iter().enumerate() {
                if filled {
                    cells.push((r, c));
                }
            }
        }
        cells
    }

    /// First filled cell in row-major order.
    pub fn first_filled(&self) -> (usize, usize) {
        // patterns always have at least one filled cell (enforced by `new`)
        self.filled_cells()[0]
    }

    pub(crate) fn from_raw(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }
}

/// Immutable shape definition from the engraving catalog.
#[derive(Clone, Debug)]
pub struct Shape {
    pub id: u32,
    pub name: &'static str,
    pub stat: StatTag,
    pub pattern: Pattern,
}

/// Static catalog source: `(id, name, stat, pattern rows)`.
const SHAPE_DEFS: &[(u32, &str, StatTag, &[&str])] = &[
    (1, "Dot", StatTag::Attack, &["#"]),
    (2, "Bar2", StatTag::Hp, &["##"]),
    (3, "Bar3", StatTag::Attack, &["###"]),
    (4, "Bar4", StatTag::Gold, &["####"]),
    (5, "Square", StatTag::Crit, &["##", "##"]),
    (6, "Corner", StatTag::Gold, &["##", "#."]),
    (7, "Hook", StatTag::Attack, &["#.", "#.", "##"]),
    (8, "Tee", StatTag::Hp, &["###", ".#."]),
    (9, "Zig", StatTag::Crit, &["##.", ".##"]),
    (10, "Cross", StatTag::Attack, &[".#.", "###", ".#."]),
];

lazy_static! {
    /// The full engraving shape catalog, built once from `SHAPE_DEFS`.
    pub static ref SHAPES: Vec<Shape> = SHAPE_DEFS
        .iter()
        .map(|&(id, name, stat, rows)| Shape {
            id,
            name,
            stat,
            pattern: Pattern::parse(rows).expect("catalog patterns are well-formed"),
        })
        .collect();
}

/// Looks up a shape by catalog id.
pub fn shape_by_id(id: u32) -> Result<&'static Shape, EngraverError> {
    SHAPES
        .iter()
        .find(|shape| shape.id == id)
        .ok_or(EngraverError::UnknownShape(id))
}

/// A concrete occurrence of a shape, in inventory or placed on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceInstance {
    pub shape_id: u32,
    pub rarity: u8,
    pub level: u8,
}

impl PieceInstance {
    /// Creates a validated piece instance.
    pub fn new(shape_id: u32, rarity: u8, level: u8) -> Result<Self, EngraverError> {
        let piece = Self {
            shape_id,
            rarity,
            level,
        };
        piece.validate()?;
        Ok(piece)
    }

    /// Checks shape id, rarity, and level ranges.
    ///
    /// Deserialized pieces bypass `new`, so loaders call this explicitly.
    pub fn validate(&self) -> Result<(), EngraverError> {
        shape_by_id(self.shape_id)?;
        if self.rarity > MAX_RARITY {
            return Err(EngraverError::InvalidRarity(self.rarity));
        }
        if self.level == 0 || self.level > MAX_LEVEL {
            return Err(EngraverError::InvalidLevel(self.level));
        }
        Ok(())
    }

    /// The catalog shape backing this piece.
    pub fn shape(&self) -> Result<&'static Shape, EngraverError> {
        shape_by_id(self.shape_id)
    }
}

/// An inventory piece tagged with the slot it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotPiece {
    pub slot: usize,
    pub piece: PieceInstance,
}

/// The 8-slot piece inventory.
///
/// Placing a piece on a grid does not remove it from the inventory; the
/// placement records its source slot, and that slot is reported as
/// unavailable while the piece stays on the grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<PieceInstance>; INVENTORY_SLOTS],
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an inventory from up to 8 slots, padding with empties.
    pub fn from_slots(slots: Vec<Option<PieceInstance>>) -> Result<Self, EngraverError> {
        if slots.len() > INVENTORY_SLOTS {
            return Err(EngraverError::InvalidSlot(slots.len() - 1));
        }
        let mut inventory = Self::new();
        for (idx, slot) in slots.into_iter().enumerate() {
            if let Some(piece) = &slot {
                piece.validate()?;
            }
            inventory.slots[idx] = slot;
        }
        Ok(inventory)
    }

    /// The piece in `slot`, if any.
    pub fn slot(&self, slot: usize) -> Result<Option<&PieceInstance>, EngraverError> {
        self.slots
            .get(slot)
            .map(Option::as_ref)
            .ok_or(EngraverError::InvalidSlot(slot))
    }

    /// Puts `piece` into `slot`, replacing any previous occupant.
    pub fn set_slot(
        &mut self,
        slot: usize,
        piece: Option<PieceInstance>,
    ) -> Result<(), EngraverError> {
        if slot >= INVENTORY_SLOTS {
            return Err(EngraverError::InvalidSlot(slot));
        }
        if let Some(p) = &piece {
            p.validate()?;
        }
        self.slots[slot] = piece;
        Ok(())
    }

    /// All occupied slots as slot-tagged pieces.
    pub fn pieces(&self) -> Vec<SlotPiece> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, piece)| piece.map(|piece| SlotPiece { slot, piece }))
            .collect()
    }

    /// Occupied slots not currently locked by a placement on `grid`.
    pub fn available(&self, grid: &crate::grid::Grid) -> Vec<SlotPiece> {
        let locked = grid.locked_slots();
        self.pieces()
            .into_iter()
            .filter(|sp| !locked.contains(&sp.slot))
            .collect()
    }

    /// Raw slot view, for serialization.
    pub fn as_slots(&self) -> &[Option<PieceInstance>; INVENTORY_SLOTS] {
        &self.slots
    }
}
