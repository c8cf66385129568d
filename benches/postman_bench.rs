//! Criterion benchmarks for the route-covering engines.
//!
//! Uses synthetic grid graphs (undirected streets with one-way avenues) to
//! measure engine overhead as the edge count grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_postman::aco::{AntColonyConfig, AntColonyRunner};
use u_postman::ga::{GaConfig, GaRunner};
use u_postman::graph::{Graph, GraphBuilder};
use u_postman::random::create_rng;
use u_postman::sa::{ClosedWalkProblem, SaConfig, SaRunner};
use u_postman::solver::RouteFitness;

// ===========================================================================
// Grid graph: side x side vertices
// ===========================================================================

/// Rows are undirected; columns alternate between one-way directions so the
/// grid stays strongly connected.
fn grid(side: usize) -> Graph {
    let id = |r: usize, c: usize| format!("n{r}_{c}");
    let mut builder = GraphBuilder::default();
    for r in 0..side {
        for c in 0..side {
            builder = builder.node(&id(r, c), &id(r, c));
        }
    }
    for r in 0..side {
        for c in 0..side {
            let weight = 1.0 + ((r * 7 + c * 3) % 5) as f64;
            if c + 1 < side {
                builder = builder.undirected(
                    &format!("h{r}_{c}"),
                    &id(r, c),
                    &id(r, c + 1),
                    weight,
                );
            }
            if r + 1 < side {
                let (from, to) = if c % 2 == 0 {
                    (id(r, c), id(r + 1, c))
                } else {
                    (id(r + 1, c), id(r, c))
                };
                builder = builder.directed(&format!("v{r}_{c}"), &from, &to, weight);
            }
        }
    }
    builder.build().expect("grid graph is valid")
}

fn bench_random_closed_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_closed_walk");

    for &side in &[4, 8, 16] {
        let graph = grid(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &graph, |b, g| {
            let mut rng = create_rng(42);
            b.iter(|| black_box(g.random_closed_walk(0, &mut rng)))
        });
    }
    group.finish();
}

fn bench_ga_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_grid");
    group.sample_size(10);

    for &side in &[4, 6] {
        let graph = grid(side);
        let config = GaConfig::default()
            .with_population_size(50)
            .with_iteration_count(60)
            .with_start_node(0)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::new(format!("e{}", graph.edge_count()), side),
            &(graph, config),
            |b, (g, cfg)| {
                let objective = RouteFitness::new(g, 0, None);
                b.iter(|| black_box(GaRunner::run(g, &objective, black_box(cfg))))
            },
        );
    }
    group.finish();
}

fn bench_aco_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("aco_grid");
    group.sample_size(10);

    for &side in &[4, 6] {
        let graph = grid(side);
        let config = AntColonyConfig::default()
            .with_iteration_count(20)
            .with_ant_count(40)
            .with_start_node(0)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::from_parameter(side),
            &(graph, config),
            |b, (g, cfg)| b.iter(|| black_box(AntColonyRunner::run(g, black_box(cfg)))),
        );
    }
    group.finish();
}

fn bench_sa_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("sa_grid");
    group.sample_size(10);

    for &side in &[4, 6] {
        let graph = grid(side);
        let config = SaConfig::fast().with_seed(42);
        group.bench_with_input(
            BenchmarkId::from_parameter(side),
            &(graph, config),
            |b, (g, cfg)| {
                let problem = ClosedWalkProblem::new(g, 0);
                b.iter(|| black_box(SaRunner::run(&problem, black_box(cfg))))
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_random_closed_walk,
    bench_ga_grid,
    bench_aco_grid,
    bench_sa_grid
);
criterion_main!(benches);
