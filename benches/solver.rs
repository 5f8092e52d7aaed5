//! Benchmarks for the engraving solver and target search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use engraver::geometry::{rotate_pattern, unique_rotations, Rotation};
use engraver::grid::{Grid, GridTemplate};
use engraver::search::{find_best_targets, Candidate, MemoryCache, NoRemoteSource, SearchOptions};
use engraver::shapes::{PieceInstance, SlotPiece};
use engraver::solver::solve;

fn mixed_inventory() -> Vec<SlotPiece> {
    [5, 5, 5, 5, 7, 7, 7, 7]
        .into_iter()
        .enumerate()
        .map(|(slot, shape_id)| SlotPiece {
            slot,
            piece: PieceInstance::new(shape_id, (slot % 6) as u8, 1).unwrap(),
        })
        .collect()
}

/// Benchmark solving a fully active 4x4 grid with a mixed inventory.
fn bench_solve_4x4(c: &mut Criterion) {
    let grid = Grid::fully_active(4).unwrap();
    let pieces = mixed_inventory();

    c.bench_function("solve_4x4_mixed", |b| {
        b.iter(|| solve(black_box(&grid), black_box(&pieces), None).unwrap())
    });
}

/// Benchmark finding the first 5 tilings of a fully active 5x5 grid.
fn bench_solve_5x5_capped(c: &mut Criterion) {
    let grid = Grid::fully_active(5).unwrap();
    let pieces: Vec<SlotPiece> = [10, 5, 5, 5, 5, 2, 2, 3]
        .into_iter()
        .enumerate()
        .map(|(slot, shape_id)| SlotPiece {
            slot,
            piece: PieceInstance::new(shape_id, 0, 1).unwrap(),
        })
        .collect();

    let mut group = c.benchmark_group("solve_5x5");
    group.sample_size(10);
    group.bench_function("first_5", |b| {
        b.iter(|| solve(black_box(&grid), black_box(&pieces), Some(5)).unwrap())
    });
    group.finish();
}

/// Benchmark rotating the largest catalog pattern through all orientations.
fn bench_rotations(c: &mut Criterion) {
    let cross = PieceInstance::new(10, 0, 1).unwrap();
    let pattern = cross.shape().unwrap().pattern.clone();

    c.bench_function("rotate_pattern_270", |b| {
        b.iter(|| rotate_pattern(black_box(&pattern), Rotation::R270))
    });
    c.bench_function("unique_rotations", |b| {
        b.iter(|| unique_rotations(black_box(&pattern)))
    });
}

/// Benchmark ranking a small candidate list with a cold cache.
fn bench_rank_candidates(c: &mut Criterion) {
    let candidates: Vec<Candidate> = (0..4)
        .map(|id| Candidate {
            id,
            name: format!("weapon-{id}"),
            tier: id,
            template: Some(GridTemplate::full(4)),
        })
        .collect();
    let pieces = mixed_inventory();

    let mut group = c.benchmark_group("rank");
    group.sample_size(10);
    group.bench_function("four_candidates_cold", |b| {
        b.iter(|| {
            let mut cache = MemoryCache::new();
            find_best_targets(
                black_box(&candidates),
                black_box(&pieces),
                &NoRemoteSource,
                &mut cache,
                &SearchOptions::default(),
            )
            .unwrap()
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_solve_4x4,
    bench_solve_5x5_capped,
    bench_rotations,
    bench_rank_candidates
);
criterion_main!(benches);
