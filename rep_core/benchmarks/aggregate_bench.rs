use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rep_core::aggregate::{faction_totals, filter_factions};
use rep_core::Grid;

/// Reputation matrix with `factions` rows and `characters` columns. Every
/// seventh cell is blank and every eleventh holds text so the parse paths for
/// skipped cells are exercised too.
fn build_matrix(factions: usize, characters: usize) -> Grid {
    let mut rows = Vec::with_capacity(factions + 1);
    let mut header = vec![String::new()];
    header.extend((0..characters).map(|c| format!("Character{c}")));
    rows.push(header);

    for f in 0..factions {
        let mut row = Vec::with_capacity(characters + 1);
        row.push(format!("Faction{f}"));
        for c in 0..characters {
            let seed = f * characters + c;
            let cell = if seed % 7 == 0 {
                String::new()
            } else if seed % 11 == 0 {
                "n/a".to_string()
            } else {
                let magnitude = (seed * 37 % 400) as i64;
                if seed % 3 == 0 {
                    (-magnitude).to_string()
                } else {
                    magnitude.to_string()
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }
    Grid::new(rows)
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("faction_aggregation");

    for &(factions, characters) in &[(32usize, 8usize), (256, 32), (1024, 64)] {
        let grid = build_matrix(factions, characters);
        let label = format!("{factions}x{characters}");

        group.bench_with_input(BenchmarkId::new("totals", &label), &grid, |b, grid| {
            b.iter(|| black_box(faction_totals(black_box(grid))));
        });
        group.bench_with_input(BenchmarkId::new("notable", &label), &grid, |b, grid| {
            b.iter(|| black_box(filter_factions(black_box(grid), 500, 0)));
        });
    }

    group.finish();
}

criterion_group!(aggregate_benches, bench_aggregation);
criterion_main!(aggregate_benches);
