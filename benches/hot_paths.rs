use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use risk_map::filter::{filter_locations, LevelFilter};
use risk_map::map::{layout, LayoutMode, MapRenderer};
use risk_map::stats::aggregate;
use risk_map::{Location, RiskLevel, RiskMapView, ViewConfig};

fn facility(n: usize) -> Vec<Location> {
    (0..n)
        .map(|i| {
            // Spread scores over [0, 100) without an RNG so runs are comparable
            let score = (i as f64 * 37.77) % 100.0;
            Location::new(i, format!("Room {} wing {}", i, i % 7), score)
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let locations = facility(2_000);
    let mut group = c.benchmark_group("layout");
    for mode in LayoutMode::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(mode.label()), &mode, |b, &mode| {
            b.iter(|| layout(black_box(&locations), mode))
        });
    }
    group.finish();
}

fn bench_filter_and_stats(c: &mut Criterion) {
    let locations = facility(2_000);
    c.bench_function("filter_level_and_query", |b| {
        b.iter(|| {
            filter_locations(
                black_box(&locations),
                LevelFilter::Only(RiskLevel::High),
                black_box("wing 3"),
            )
        })
    });
    c.bench_function("aggregate", |b| b.iter(|| aggregate(black_box(&locations))));
}

fn bench_keystroke(c: &mut Criterion) {
    // One search keystroke: refilter, relayout and render
    let mut view = RiskMapView::new(facility(2_000), ViewConfig::default());
    let renderer = MapRenderer::new();
    let queries = ["r", "ro", "roo", "room", "room 1"];
    c.bench_function("keystroke_render", |b| {
        let mut i = 0;
        b.iter(|| {
            view.set_search_query(queries[i % queries.len()]);
            i += 1;
            let markers = view.markers();
            renderer.render(&markers, view.state().layout_mode, 160, 48, i as u64)
        })
    });
}

criterion_group!(benches, bench_layout, bench_filter_and_stats, bench_keystroke);
criterion_main!(benches);
