//! Soul Weapon Engraving Solver CLI
//!
//! Solves engraving grids: finds every way an inventory of polyomino
//! pieces can exactly cover a grid's active cells, and ranks candidate
//! weapons by how well the inventory fits their grids.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use engraver::grid::format_solution;
use engraver::persistence;
use engraver::search::{find_best_targets, MemoryCache, NoRemoteSource, SearchOptions};
use engraver::shapes::SHAPES;
use engraver::solver::{solution_signature, solve};

/// Engraving grid solver and weapon ranker.
#[derive(Parser)]
#[command(name = "engraver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a grid template against an inventory and print the tilings.
    Solve {
        /// Grid template JSON file.
        #[arg(long)]
        grid: PathBuf,
        /// Inventory JSON file.
        #[arg(long)]
        inventory: PathBuf,
        /// Stop after this many solutions.
        #[arg(long)]
        max: Option<usize>,
        /// Also write the solutions to a text file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank candidate weapons by how well the inventory tiles their grids.
    Rank {
        /// Candidate list JSON file.
        #[arg(long)]
        candidates: PathBuf,
        /// Inventory JSON file.
        #[arg(long)]
        inventory: PathBuf,
        /// Soft wall-clock budget in seconds.
        #[arg(long, default_value_t = 30)]
        budget_secs: u64,
        /// Per-candidate solution cap.
        #[arg(long, default_value_t = 15)]
        max_per_candidate: usize,
    },
    /// List the engraving shape catalog.
    Shapes,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Solve {
            grid,
            inventory,
            max,
            out,
        } => run_solve(&grid, &inventory, max, out.as_deref()),
        Command::Rank {
            candidates,
            inventory,
            budget_secs,
            max_per_candidate,
        } => run_rank(&candidates, &inventory, budget_secs, max_per_candidate),
        Command::Shapes => run_shapes(),
    }
}

fn run_solve(
    grid_path: &std::path::Path,
    inventory_path: &std::path::Path,
    max: Option<usize>,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let template = persistence::load_template(grid_path)?;
    let inventory = persistence::load_inventory(inventory_path)?;
    let pieces = inventory.pieces();
    let grid = template.instantiate()?;

    info!(
        size = template.size,
        active = grid.total_active(),
        pieces = pieces.len(),
        "solving"
    );
    let solutions = solve(&grid, &pieces, max)?;

    if solutions.is_empty() {
        println!("No complete solution found - try different pieces.");
        return Ok(());
    }

    println!("Found {} solutions", solutions.len());
    for (i, solution) in solutions.iter().enumerate() {
        println!("Solution {} [{}]:", i + 1, solution_signature(solution)?);
        print!("{}", format_solution(&template, solution)?);
        println!();
    }

    if let Some(out) = out {
        persistence::save_solutions_text(out, &template, &solutions)?;
        println!("Wrote {}", out.display());
    }
    Ok(())
}

fn run_rank(
    candidates_path: &std::path::Path,
    inventory_path: &std::path::Path,
    budget_secs: u64,
    max_per_candidate: usize,
) -> Result<()> {
    let candidates = persistence::load_candidates(candidates_path)?;
    let inventory = persistence::load_inventory(inventory_path)?;
    let pieces = inventory.pieces();

    let options = SearchOptions {
        max_solutions_per_candidate: max_per_candidate,
        time_budget: std::time::Duration::from_secs(budget_secs),
        ..SearchOptions::default()
    };
    let mut cache = MemoryCache::new();
    let ranked = find_best_targets(&candidates, &pieces, &NoRemoteSource, &mut cache, &options)?;

    if ranked.is_empty() {
        println!("No candidate can be fully engraved with this inventory.");
        return Ok(());
    }

    for (rank, entry) in ranked.iter().enumerate() {
        println!(
            "{:>2}. {:<20} score {:>4}  ({} solutions, {} single-shape)",
            rank + 1,
            entry.name,
            entry.score,
            entry.solution_count,
            entry.same_shape_count,
        );
    }
    Ok(())
}

fn run_shapes() -> Result<()> {
    for shape in SHAPES.iter() {
        println!(
            "{:>2}  {:<8} {:?} ({} cells)",
            shape.id,
            shape.name,
            shape.stat,
            shape.pattern.cell_count()
        );
        for row in 0..shape.pattern.height() {
            let mut line = String::from("    ");
            for col in 0..shape.pattern.width() {
                line.push(if shape.pattern.is_filled(row, col) {
                    '#'
                } else {
                    '.'
                });
            }
            println!("{line}");
        }
    }
    Ok(())
}
