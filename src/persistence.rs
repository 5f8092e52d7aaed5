//! JSON file I/O for inventories, grid templates, and candidate lists.
//!
//! File shapes:
//! - inventory: array of up to 8 nullable `{ shape_id, rarity, level }`
//! - template: `{ size, active_cells: [[row, col], ...], completion_bonus }`
//! - candidates: array of `{ id, name, tier, template? }`
//!
//! Solutions are never round-tripped; they are recomputed on demand. The
//! CLI only writes them as human-readable text.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::grid::{format_solution, GridTemplate};
use crate::search::Candidate;
use crate::shapes::{Inventory, PieceInstance};
use crate::solver::{solution_signature, Solution};

/// Loads and validates an inventory file.
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let slots: Vec<Option<PieceInstance>> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing inventory {}", path.display()))?;
    let inventory = Inventory::from_slots(slots)
        .with_context(|| format!("validating inventory {}", path.display()))?;
    Ok(inventory)
}

/// Writes an inventory file.
pub fn save_inventory(path: &Path, inventory: &Inventory) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), inventory.as_slots().as_slice())
        .with_context(|| format!("writing inventory {}", path.display()))?;
    Ok(())
}

/// Loads a single grid template file.
pub fn load_template(path: &Path) -> Result<GridTemplate> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let template: GridTemplate = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing grid template {}", path.display()))?;
    // instantiating validates size and cell ranges
    template
        .instantiate()
        .with_context(|| format!("validating grid template {}", path.display()))?;
    Ok(template)
}

/// Loads a candidate list file. Templates are validated where present.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let candidates: Vec<Candidate> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing candidates {}", path.display()))?;
    for candidate in &candidates {
        if let Some(template) = &candidate.template {
            template.instantiate().with_context(|| {
                format!("validating template of candidate {}", candidate.id)
            })?;
        }
    }
    Ok(candidates)
}

/// Writes solutions as human-readable text, one rendered grid each.
pub fn save_solutions_text(
    path: &Path,
    template: &GridTemplate,
    solutions: &[Solution],
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "Found {} solutions:\n", solutions.len())?;
    for (i, solution) in solutions.iter().enumerate() {
        writeln!(out, "Solution {} [{}]:", i + 1, solution_signature(solution)?)?;
        write!(out, "{}", format_solution(template, solution)?)?;
        writeln!(out)?;
    }
    Ok(())
}
