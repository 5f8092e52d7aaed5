//! Best-target search: ranks candidate weapons against an inventory.
//!
//! Each candidate owns a grid template, either built in or fetched from an
//! injected lookup. The search solves every candidate's grid against the
//! same inventory, memoizing solution lists per (candidate, inventory)
//! pair, scores the results, and returns candidates in descending score
//! order. A candidate whose lookup fails is logged and skipped; a soft
//! wall-clock budget truncates the loop rather than hanging it.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grid::GridTemplate;
use crate::shapes::SlotPiece;
use crate::solver::{solve, Solution};
use crate::EngraverError;

/// A weapon evaluated by the search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u32,
    pub name: String,
    /// Progression rank. Dominates the score so results favor
    /// progression-appropriate weapons over ones that merely fit more ways.
    pub tier: u32,
    /// Built-in grid layout; candidates without one go through the
    /// injected [`GridSource`].
    #[serde(default)]
    pub template: Option<GridTemplate>,
}

/// Lookup for grid templates of candidates without built-in data.
///
/// This stands at an I/O boundary (the real source is a community data
/// service); `Ok(None)` means "no data", which is not an error.
pub trait GridSource {
    fn grid_for(&self, candidate_id: u32) -> anyhow::Result<Option<GridTemplate>>;
}

/// A source with no data; for candidate sets that carry their own templates.
pub struct NoRemoteSource;

impl GridSource for NoRemoteSource {
    fn grid_for(&self, _candidate_id: u32) -> anyhow::Result<Option<GridTemplate>> {
        Ok(None)
    }
}

/// Pluggable memoization store for per-candidate solution lists.
///
/// The backend is injected so callers can choose in-memory or persistent
/// storage. A stale or missing entry only costs a re-solve.
pub trait SolutionCache {
    fn get(&self, key: &str) -> Option<Vec<Solution>>;
    fn set(&mut self, key: &str, solutions: Vec<Solution>);
}

/// In-memory cache backend.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: FxHashMap<String, Vec<Solution>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SolutionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<Solution>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, solutions: Vec<Solution>) {
        self.entries.insert(key.to_string(), solutions);
    }
}

/// Tuning knobs for [`find_best_targets`].
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Per-candidate cap on collected solutions; bounds cost when fanning
    /// out across many candidates.
    pub max_solutions_per_candidate: usize,
    /// Soft wall-clock budget. Checked between candidates, never mid-solve.
    pub time_budget: Duration,
    /// How many solutions each ranked entry carries for display.
    pub preview_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_solutions_per_candidate: 15,
            time_budget: Duration::from_secs(30),
            preview_len: 5,
        }
    }
}

/// A scored candidate in the ranked result list.
#[derive(Clone, Debug)]
pub struct RankedCandidate {
    pub candidate_id: u32,
    pub name: String,
    pub score: u64,
    pub solution_count: usize,
    /// Solutions whose placements all use the same shape type.
    pub same_shape_count: usize,
    pub preview: Vec<Solution>,
}

/// Ranks candidates by how well `inventory` tiles their grids.
///
/// Candidates with no grid template or no solutions are omitted. The
/// result is sorted by score descending; equal scores keep the input
/// order (stable sort).
pub fn find_best_targets(
    candidates: &[Candidate],
    inventory: &[SlotPiece],
    source: &dyn GridSource,
    cache: &mut dyn SolutionCache,
    options: &SearchOptions,
) -> Result<Vec<RankedCandidate>, EngraverError> {
    let started = Instant::now();
    let mut ranked: Vec<RankedCandidate> = Vec::new();

    for candidate in candidates {
        if started.elapsed() >= options.time_budget {
            warn!(
                ranked = ranked.len(),
                skipped = candidates.len() - ranked.len(),
                "time budget exhausted, returning partial ranking"
            );
            break;
        }

        let template = match candidate.template.clone() {
            Some(template) => Some(template),
            None => match source.grid_for(candidate.id) {
                Ok(template) => template,
                Err(error) => {
                    warn!(
                        candidate = candidate.id,
                        %error,
                        "grid lookup failed, skipping candidate"
                    );
                    continue;
                }
            },
        };
        let Some(template) = template else {
            debug!(candidate = candidate.id, "no grid template, skipping");
            continue;
        };

        let grid = match template.instantiate() {
            Ok(grid) => grid,
            Err(error) => {
                // community-supplied templates can be malformed; treat like
                // a failed lookup rather than aborting the whole search
                warn!(candidate = candidate.id, %error, "bad grid template, skipping");
                continue;
            }
        };

        let key = cache_key(candidate.id, inventory);
        let solutions = match cache.get(&key) {
            Some(solutions) => {
                debug!(candidate = candidate.id, "cache hit");
                solutions
            }
            None => {
                let solutions = solve(&grid, inventory, Some(options.max_solutions_per_candidate))?;
                cache.set(&key, solutions.clone());
                solutions
            }
        };

        if solutions.is_empty() {
            continue;
        }

        let same_shape_count = solutions
            .iter()
            .filter(|solution| is_same_shape(solution))
            .count();
        let score = score(solutions.len(), same_shape_count, candidate.tier);
        let preview = solutions
            .iter()
            .take(options.preview_len)
            .cloned()
            .collect();

        ranked.push(RankedCandidate {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            score,
            solution_count: solutions.len(),
            same_shape_count,
            preview,
        });
    }

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(ranked)
}

/// Scoring formula: tier dominates solution counts for any tier gap >= 1.
fn score(solution_count: usize, same_shape_count: usize, tier: u32) -> u64 {
    solution_count as u64 + 2 * same_shape_count as u64 + 10 * tier as u64
}

/// Whether every placement in a solution uses the same shape type.
fn is_same_shape(solution: &Solution) -> bool {
    solution
        .windows(2)
        .all(|pair| pair[0].piece.shape_id == pair[1].piece.shape_id)
}

/// Memoization key: candidate id plus the inventory's sorted
/// (shape, rarity, level) triples. Slot order does not matter.
fn cache_key(candidate_id: u32, inventory: &[SlotPiece]) -> String {
    let mut triples: Vec<(u32, u8, u8)> = inventory
        .iter()
        .map(|sp| (sp.piece.shape_id, sp.piece.rarity, sp.piece.level))
        .collect();
    triples.sort_unstable();

    let mut key = candidate_id.to_string();
    for (shape_id, rarity, level) in triples {
        key.push_str(&format!(":{shape_id}-{rarity}-{level}"));
    }
    key
}
