// visibility.rs - Benchmarks for include-graph visibility and completion queries
//
// Run with: cargo bench --bench visibility --features test-support
// Compare baselines: cargo bench --bench visibility -- --baseline before

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use url::Url;

use sourcepawn_index::state::{scan_workspace, WorldState};
use sourcepawn_index::declarations::SourceScanner;
use sourcepawn_index::test_utils::fixture_workspace::{
    create_fixture_workspace, FixtureConfig, PLUGIN_FILE,
};

/// Scan a fixture workspace into a fresh state
fn indexed_state(workspace_path: &std::path::Path) -> (WorldState, Url) {
    let folder = Url::from_file_path(workspace_path).unwrap();
    let mut state = WorldState::new();
    state.add_workspace_folder(folder.clone());
    state.apply_workspace_scan(scan_workspace(&[folder], &SourceScanner));
    let plugin = Url::from_file_path(workspace_path.join(PLUGIN_FILE)).unwrap();
    (state, plugin)
}

// ---------------------------------------------------------------------------
// Benchmark: Visibility set computation with varying include chain depths
//
// Measures the include walk from plugin.sp, the head of the chain.
// ---------------------------------------------------------------------------

fn bench_visible_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("visible_files");
    group.sample_size(20);

    for &depth in &[1usize, 10, 50] {
        let config = FixtureConfig {
            file_count: (depth + 5).max(10),
            functions_per_file: 5,
            include_chain_depth: depth,
            defines_per_file: 2,
            extra_lines_per_file: 3,
        };
        let workspace = create_fixture_workspace(&config);
        let (state, plugin) = indexed_state(workspace.path());

        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, _| {
            b.iter(|| black_box(state.index.visible_files(black_box(&plugin)).unwrap()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Context-filtered completion over small, medium and large workspaces
// ---------------------------------------------------------------------------

fn bench_completions(c: &mut Criterion) {
    let mut group = c.benchmark_group("completions_at");
    group.sample_size(20);

    for (name, config) in [
        ("small", FixtureConfig::small()),
        ("medium", FixtureConfig::medium()),
        ("large", FixtureConfig::large()),
    ] {
        let workspace = create_fixture_workspace(&config);
        let (state, plugin) = indexed_state(workspace.path());

        group.bench_function(BenchmarkId::new("free_standing", name), |b| {
            b.iter(|| black_box(state.index.completions_at(&plugin, black_box("Func"), 4).unwrap().len()))
        });
        group.bench_function(BenchmarkId::new("member_access", name), |b| {
            b.iter(|| black_box(state.index.completions_at(&plugin, black_box("h."), 2).unwrap().len()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Workspace scan and full re-resolution
// ---------------------------------------------------------------------------

fn bench_workspace_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("workspace_scan");
    group.sample_size(10);

    let workspace = create_fixture_workspace(&FixtureConfig::medium());
    let folder = Url::from_file_path(workspace.path()).unwrap();

    group.bench_function("scan_medium", |b| {
        b.iter(|| black_box(scan_workspace(black_box(std::slice::from_ref(&folder)), &SourceScanner)))
    });

    let (mut state, _) = indexed_state(workspace.path());
    group.bench_function("reresolve_medium", |b| b.iter(|| state.reresolve_all()));

    group.finish();
}

criterion_group!(benches, bench_visible_files, bench_completions, bench_workspace_scan);
criterion_main!(benches);
