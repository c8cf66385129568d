//! Island-model evolutionary loop.
//!
//! [`GaRunner`] seeds the islands with random closed walks, lets each island
//! evolve in isolation for an epoch, then migrates every island's fittest
//! chromosome one step along a ring.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;

use super::config::GaConfig;
use super::operators::{cataclysmic_mutation, Mutation};
use super::types::{Chromosome, Population, RouteObjective, WORST_FITNESS};
use crate::error::{ConfigError, Error, NoPathError, Result};
use crate::graph::{EdgeIdx, Graph, NodeIdx};
use crate::random::{create_rng, master_rng, task_seeds};

/// Attempts per seeding slot before an island gives up on a fresh walk.
const SEED_ATTEMPTS: usize = 10;

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Genes of the best chromosome seen during the run.
    pub best: Vec<EdgeIdx>,

    /// Fitness of [`best`](Self::best).
    pub best_fitness: f64,

    /// Start vertex shared by every walk.
    pub start: NodeIdx,

    /// Generations executed by each island.
    pub generations: usize,

    /// Number of migrations performed.
    pub epochs: usize,

    pub island_count: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the wall-clock limit stopped the run.
    pub timed_out: bool,

    /// Global best fitness after seeding and after each epoch.
    pub fitness_history: Vec<f64>,
}

/// Executes the island-model GA.
///
/// # Usage
///
/// ```
/// use u_postman::ga::{GaConfig, GaRunner};
/// use u_postman::graph::Graph;
/// use u_postman::solver::RouteFitness;
///
/// let graph = Graph::builder()
///     .node("a", "A")
///     .node("b", "B")
///     .undirected("ab", "a", "b", 5.0)
///     .build()
///     .unwrap();
/// let objective = RouteFitness::new(&graph, 0, None);
/// let config = GaConfig::fast().with_start_node(0).with_seed(42);
///
/// let result = GaRunner::run(&graph, &objective, &config).unwrap();
/// assert_eq!(result.best_fitness, -10.0);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA.
    ///
    /// # Errors
    /// - [`Error::Configuration`] for an invalid config or start node
    /// - [`Error::NoPath`] when an island cannot be seeded with any walk
    /// - [`Error::NoFeasibleSolution`] when nothing beat [`WORST_FITNESS`]
    pub fn run<O: RouteObjective>(
        graph: &Graph,
        objective: &O,
        config: &GaConfig,
    ) -> Result<GaResult> {
        Self::run_with_cancel(graph, objective, config, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// The flag is checked between epochs; when set, the best chromosome
    /// found so far is returned.
    pub fn run_with_cancel<O: RouteObjective>(
        graph: &Graph,
        objective: &O,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult> {
        config.validate()?;
        let started = Instant::now();
        let mut rng = master_rng(config.seed);

        let start = match config.start_node {
            Some(node) if node < graph.node_count() => node,
            Some(node) => return Err(ConfigError::UnknownStartNode(format!("#{node}")).into()),
            None => rng.random_range(0..graph.node_count()),
        };

        let island_count = config.resolved_island_count();
        log::info!(
            "genetic algorithm: {} generations, {} chromosomes in {} island(s), start {}",
            config.iteration_count,
            config.population_size,
            island_count,
            graph.node(start).label
        );

        // 1. Seed islands
        let sizes = island_sizes(config.population_size, island_count);
        let seeds = task_seeds(&mut rng, island_count);
        let seed_one = |(i, (&size, &seed)): (usize, (&usize, &u64))| {
            let mut task_rng = create_rng(seed);
            seed_island(graph, start, i, size, config.cataclysmic_seeding, &mut task_rng)
                .map(|mut population| {
                    population.evaluate(objective);
                    population.sort_by_fitness_desc();
                    population
                })
        };
        let mut islands: Vec<Population> = if config.parallel {
            sizes
                .par_iter()
                .zip(seeds.par_iter())
                .enumerate()
                .map(seed_one)
                .collect::<std::result::Result<_, NoPathError>>()?
        } else {
            sizes
                .iter()
                .zip(seeds.iter())
                .enumerate()
                .map(seed_one)
                .collect::<std::result::Result<_, NoPathError>>()?
        };

        // 2. Track best
        let mut best: Option<Chromosome> = None;
        for island in &islands {
            if let Some(candidate) = island.best() {
                update_best(&mut best, candidate);
            }
        }
        let mut fitness_history = vec![best_fitness(&best)];

        // 3. Epochs
        let mut generations = 0usize;
        let mut epochs = 0usize;
        let mut cancelled = false;
        let mut timed_out = false;

        while generations < config.iteration_count {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() as u64 >= limit {
                    timed_out = true;
                    break;
                }
            }

            let epoch_len = config
                .isolation_iterations
                .min(config.iteration_count - generations);
            let seeds = task_seeds(&mut rng, islands.len());
            let evolve_one = |(island, &seed): (&mut Population, &u64)| {
                let mut task_rng = create_rng(seed);
                evolve_island(graph, start, objective, config, island, epoch_len, &mut task_rng)
            };
            if config.parallel {
                islands
                    .par_iter_mut()
                    .zip(seeds.par_iter())
                    .map(evolve_one)
                    .collect::<Result<()>>()?;
            } else {
                islands
                    .iter_mut()
                    .zip(seeds.iter())
                    .map(evolve_one)
                    .collect::<Result<()>>()?;
            }
            generations += epoch_len;
            epochs += 1;

            for migrant in migrate(&mut islands) {
                if update_best(&mut best, &migrant) {
                    log::info!(
                        "best route updated at generation {generations}: fitness {}",
                        migrant.fitness_or_worst()
                    );
                }
            }
            fitness_history.push(best_fitness(&best));
            log::debug!(
                "epoch {epochs} done ({generations}/{} generations), best fitness {}",
                config.iteration_count,
                best_fitness(&best)
            );
        }

        match best {
            Some(best) if best.fitness_or_worst() > WORST_FITNESS => Ok(GaResult {
                best_fitness: best.fitness_or_worst(),
                best: best.into_genes(),
                start,
                generations,
                epochs,
                island_count,
                cancelled,
                timed_out,
                fitness_history,
            }),
            _ => Err(Error::NoFeasibleSolution),
        }
    }
}

/// Splits `total` chromosomes into `islands` nearly equal sizes.
fn island_sizes(total: usize, islands: usize) -> Vec<usize> {
    let base = total / islands;
    let extra = total % islands;
    (0..islands).map(|i| base + usize::from(i < extra)).collect()
}

/// Fills one island with random closed walks from `start`.
///
/// Slots whose walk cannot be built are filled with copies of walks that
/// could. Fails only when no walk at all can be built.
fn seed_island(
    graph: &Graph,
    start: NodeIdx,
    index: usize,
    size: usize,
    cataclysmic: bool,
    rng: &mut StdRng,
) -> std::result::Result<Population, NoPathError> {
    let mut entities: Vec<Chromosome> = Vec::with_capacity(size);
    let mut last_error = None;

    'slots: for _ in 0..size {
        for _ in 0..SEED_ATTEMPTS {
            match graph.random_closed_walk(start, rng) {
                Ok(mut genes) => {
                    if cataclysmic {
                        let mut shaken = genes.clone();
                        cataclysmic_mutation(graph, &mut shaken, rng);
                        if graph.covers_all_edges(&shaken) {
                            genes = shaken;
                        }
                    }
                    entities.push(Chromosome::new(genes));
                    continue 'slots;
                }
                Err(err) => {
                    log::debug!("island {index}: seeding walk failed: {err}");
                    last_error = Some(err);
                }
            }
        }
        if entities.is_empty() {
            break;
        }
    }

    if entities.is_empty() {
        return Err(last_error.unwrap_or(NoPathError::DeadEnd(start)));
    }
    while entities.len() < size {
        let copy = entities[rng.random_range(0..entities.len())].genes().to_vec();
        entities.push(Chromosome::new(copy));
    }
    Ok(Population::new(format!("island-{index}"), entities))
}

/// Runs `generations` isolated generations on one island and leaves it
/// sorted best first.
fn evolve_island<O: RouteObjective, R: Rng>(
    graph: &Graph,
    start: NodeIdx,
    objective: &O,
    config: &GaConfig,
    island: &mut Population,
    generations: usize,
    rng: &mut R,
) -> Result<()> {
    let target = island.len();

    for _ in 0..generations {
        // Selection and pairing
        let pool = config.selection.select_pool(&island.entities, rng);
        let (p1, p2) = config.pairing.pair(&pool, objective, rng);
        let (c1, c2) = breed(graph, start, objective, config, p1, p2, rng)?;

        // Offspring take the two weakest slots
        for (slot, child) in weakest_slots(&island.entities, 2).into_iter().zip([c1, c2]) {
            island.entities[slot] = child;
        }

        // Replacement
        let entities = std::mem::take(&mut island.entities);
        island.entities = config.replacement.apply(entities, rng);
        top_up(graph, start, objective, island, target, rng);
    }

    island.sort_by_fitness_desc();
    Ok(())
}

/// Recombines (below `recombination_rate`) and mutates (below
/// `mutation_rate`) a pair of parents into two evaluated offspring.
/// Parents that skip recombination pass through as clones.
fn breed<O: RouteObjective, R: Rng>(
    graph: &Graph,
    start: NodeIdx,
    objective: &O,
    config: &GaConfig,
    p1: &Chromosome,
    p2: &Chromosome,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome)> {
    let (mut c1, mut c2) = match config.recombination {
        Some(method) if rng.random::<f64>() < config.recombination_rate => {
            let (a, b) = method.apply(graph, start, p1.genes(), p2.genes(), rng)?;
            (Chromosome::new(a), Chromosome::new(b))
        }
        _ => (p1.clone(), p2.clone()),
    };

    for child in [&mut c1, &mut c2] {
        if let Some(method) = config.mutation {
            if rng.random::<f64>() < config.mutation_rate {
                mutate(method, graph, child, rng);
            }
        }
        child.evaluate(objective);
    }
    Ok((c1, c2))
}

/// A mutated clone that changed gets a fresh id.
fn mutate<R: Rng>(method: Mutation, graph: &Graph, child: &mut Chromosome, rng: &mut R) {
    let mut genes = child.genes().to_vec();
    method.apply(graph, &mut genes, rng);
    if genes != child.genes() {
        *child = Chromosome::new(genes);
    }
}

/// Indices of the `count` lowest-fitness chromosomes, later slots first
/// among ties.
fn weakest_slots(entities: &[Chromosome], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entities.len()).rev().collect();
    order.sort_by(|&a, &b| {
        entities[a]
            .fitness_or_worst()
            .partial_cmp(&entities[b].fitness_or_worst())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(count);
    order
}

/// Refills an island shrunk by replacement with fresh random walks, or
/// copies of survivors when no walk can be built.
fn top_up<O: RouteObjective, R: Rng>(
    graph: &Graph,
    start: NodeIdx,
    objective: &O,
    island: &mut Population,
    target: usize,
    rng: &mut R,
) {
    while island.len() < target {
        let genes = match graph.random_closed_walk(start, rng) {
            Ok(genes) => genes,
            Err(_) if !island.is_empty() => island.entities[rng.random_range(0..island.len())]
                .genes()
                .to_vec(),
            Err(err) => {
                log::warn!("{}: cannot refill: {err}", island.name);
                return;
            }
        };
        let mut fresh = Chromosome::new(genes);
        fresh.evaluate(objective);
        island.entities.push(fresh);
    }
}

/// Ring migration: the fittest chromosome of island `i` replaces slot 0 of
/// island `i + 1`, the last island's fittest wraps to the first.
///
/// Islands must be sorted best first. Returns the migrants.
fn migrate(islands: &mut [Population]) -> Vec<Chromosome> {
    let migrants: Vec<Chromosome> = islands
        .iter()
        .filter_map(|island| island.entities.first().cloned())
        .collect();
    if migrants.len() != islands.len() {
        return migrants;
    }
    let n = islands.len();
    for (i, migrant) in migrants.iter().enumerate() {
        islands[(i + 1) % n].entities[0] = migrant.clone();
    }
    migrants
}

/// Replaces `best` when `candidate` is fitter. Returns whether it did.
fn update_best(best: &mut Option<Chromosome>, candidate: &Chromosome) -> bool {
    let improves = best
        .as_ref()
        .is_none_or(|b| candidate.fitness_or_worst() > b.fitness_or_worst());
    if improves {
        *best = Some(candidate.clone());
    }
    improves
}

fn best_fitness(best: &Option<Chromosome>) -> f64 {
    best.as_ref().map_or(WORST_FITNESS, Chromosome::fitness_or_worst)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{Recombination, Replacement, SelectionMethod};
    use crate::solver::RouteFitness;

    fn directed_cycle() -> Graph {
        Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .node("c", "C")
            .node("d", "D")
            .directed("ab", "a", "b", 1.0)
            .directed("bc", "b", "c", 1.0)
            .directed("cd", "c", "d", 1.0)
            .directed("da", "d", "a", 1.0)
            .build()
            .unwrap()
    }

    /// Mixed graph with parallel edges and a spur.
    fn town() -> Graph {
        Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .node("c", "C")
            .node("d", "D")
            .node("e", "E")
            .undirected("ab", "a", "b", 2.0)
            .undirected("bc", "b", "c", 3.0)
            .directed("cd", "c", "d", 1.0)
            .undirected("da", "d", "a", 4.0)
            .undirected("ab2", "a", "b", 1.0)
            .undirected("ce", "c", "e", 2.0)
            .directed("ac", "a", "c", 5.0)
            .build()
            .unwrap()
    }

    fn small_config() -> GaConfig {
        GaConfig::default()
            .with_population_size(30)
            .with_iteration_count(45)
            .with_start_node(0)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_two_node_graph_scores_minus_ten() {
        let g = Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .undirected("ab", "a", "b", 5.0)
            .build()
            .unwrap();
        let objective = RouteFitness::new(&g, 0, None);
        let result = GaRunner::run(&g, &objective, &small_config()).unwrap();
        assert_eq!(result.best, vec![0, 0]);
        assert!((result.best_fitness + 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_directed_cycle() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let result = GaRunner::run(&g, &objective, &small_config()).unwrap();
        assert_eq!(result.best, vec![0, 1, 2, 3]);
        assert!((result.best_fitness + 4.0).abs() < 1e-10);
        assert_eq!(result.generations, 45);
        assert_eq!(result.epochs, 3);
    }

    #[test]
    fn test_best_is_a_valid_covering_walk() {
        let g = town();
        let objective = RouteFitness::new(&g, 0, None);
        for recombination in [
            Recombination::ChromosomeCrossover,
            Recombination::TwoPoint,
            Recombination::Shuffle,
        ] {
            let config = small_config().with_recombination(Some(recombination));
            let result = GaRunner::run(&g, &objective, &config).unwrap();
            assert!(g.covers_all_edges(&result.best), "{recombination:?}");
            let length = g.closed_walk_length(0, &result.best).unwrap();
            assert!((result.best_fitness + length).abs() < 1e-10);
        }
    }

    #[test]
    fn test_migration_never_regresses_best() {
        let g = town();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config()
            .with_population_size(40)
            .with_island_count(4)
            .with_iteration_count(90)
            .with_isolation_iterations(10);
        let result = GaRunner::run(&g, &objective, &config).unwrap();

        assert_eq!(result.island_count, 4);
        assert_eq!(result.fitness_history.len(), result.epochs + 1);
        for window in result.fitness_history.windows(2) {
            assert!(
                window[1] >= window[0],
                "best fitness regressed: {} < {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_ring_migration_moves_bests() {
        let make = |fit: usize| {
            let mut c = Chromosome::new(vec![fit]);
            c.evaluate(&LastGene);
            c
        };
        let mut islands = vec![
            Population::new("0", vec![make(10), make(1)]),
            Population::new("1", vec![make(20), make(2)]),
            Population::new("2", vec![make(30), make(3)]),
        ];
        let migrants = migrate(&mut islands);
        assert_eq!(migrants.len(), 3);
        assert_eq!(islands[0].entities[0].genes(), &[30]);
        assert_eq!(islands[1].entities[0].genes(), &[10]);
        assert_eq!(islands[2].entities[0].genes(), &[20]);
    }

    #[test]
    fn test_seeded_parallel_runs_are_reproducible() {
        let g = town();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config().with_island_count(3).with_parallel(true);
        let a = GaRunner::run(&g, &objective, &config).unwrap();
        let b = GaRunner::run(&g, &objective, &config).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_exclusion_and_roulette_run() {
        let g = town();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config()
            .with_selection(SelectionMethod::RouletteWheel)
            .with_replacement(Replacement::Exclusion);
        let result = GaRunner::run(&g, &objective, &config).unwrap();
        assert!(result.best_fitness.is_finite());
    }

    #[test]
    fn test_cancellation_returns_seeded_best() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            GaRunner::run_with_cancel(&g, &objective, &small_config(), Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.best, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_no_feasible_solution() {
        let g = directed_cycle();
        let result = GaRunner::run(&g, &NothingFits, &small_config());
        assert!(matches!(result, Err(Error::NoFeasibleSolution)));

        // a bound below the only route length
        let objective = RouteFitness::new(&g, 0, Some(3.0));
        let result = GaRunner::run(&g, &objective, &small_config());
        assert!(matches!(result, Err(Error::NoFeasibleSolution)));
    }

    #[test]
    fn test_unseedable_graph_reports_no_path() {
        let g = Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .directed("ab", "a", "b", 1.0)
            .build()
            .unwrap();
        let objective = RouteFitness::new(&g, 0, None);
        let result = GaRunner::run(&g, &objective, &small_config());
        assert!(matches!(result, Err(Error::NoPath(_))));
    }

    #[test]
    fn test_unknown_start_node() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config().with_start_node(9);
        let result = GaRunner::run(&g, &objective, &config);
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigError::UnknownStartNode(_)))
        ));
    }

    #[test]
    fn test_weakest_slots_prefers_later_ties() {
        let make = |g: usize| {
            let mut c = Chromosome::new(vec![g]);
            c.evaluate(&LastGene);
            c
        };
        let entities = vec![make(0), make(5), make(0), make(3)];
        assert_eq!(weakest_slots(&entities, 2), vec![2, 0]);
        assert_eq!(weakest_slots(&entities[..1], 2), vec![0]);
    }

    fn evaluated(objective: &RouteFitness<'_>, genes: Vec<EdgeIdx>) -> Chromosome {
        let mut c = Chromosome::new(genes);
        c.evaluate(objective);
        c
    }

    #[test]
    fn test_zero_rates_pass_parents_through() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config()
            .with_recombination(Some(Recombination::TwoPoint))
            .with_recombination_rate(0.0)
            .with_mutation(Some(Mutation::Swapping))
            .with_mutation_rate(0.0);
        let p1 = evaluated(&objective, vec![0, 1, 2, 3]);
        let p2 = evaluated(&objective, vec![0, 1, 2, 3, 0, 1, 2, 3]);
        let mut rng = create_rng(42);

        for _ in 0..50 {
            let (c1, c2) = breed(&g, 0, &objective, &config, &p1, &p2, &mut rng).unwrap();
            assert_eq!(c1.genes(), p1.genes());
            assert_eq!(c2.genes(), p2.genes());
            assert_eq!(c1.id(), p1.id());
            assert_eq!(c2.id(), p2.id());
        }
    }

    #[test]
    fn test_full_mutation_rate_changes_every_offspring() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config()
            .with_recombination_rate(0.0)
            .with_mutation(Some(Mutation::Swapping))
            .with_mutation_rate(1.0);
        let p1 = evaluated(&objective, vec![0, 1, 2, 3, 0, 1, 2, 3]);
        let p2 = evaluated(&objective, vec![1, 2, 3, 0, 1, 2, 3, 0]);
        let mut rng = create_rng(42);

        for _ in 0..50 {
            let (c1, c2) = breed(&g, 0, &objective, &config, &p1, &p2, &mut rng).unwrap();
            assert_ne!(c1.genes(), p1.genes());
            assert_ne!(c2.genes(), p2.genes());
            // A changed clone is a new chromosome.
            assert_ne!(c1.id(), p1.id());
            assert_ne!(c2.id(), p2.id());
            assert!(c1.fitness().is_some() && c2.fitness().is_some());
        }
    }

    #[test]
    fn test_zero_rates_keep_island_gene_pool() {
        let g = directed_cycle();
        let objective = RouteFitness::new(&g, 0, None);
        let config = small_config()
            .with_selection(SelectionMethod::Identity)
            .with_recombination_rate(0.0)
            .with_mutation_rate(0.0)
            .with_replacement(Replacement::Identity);
        let seeds = [vec![0, 1, 2, 3], vec![0, 1, 2, 3, 0, 1, 2, 3], vec![0, 1, 2]];
        let entities = seeds.iter().map(|genes| evaluated(&objective, genes.clone())).collect();
        let mut island = Population::new("island-0", entities);
        let mut rng = create_rng(42);

        evolve_island(&g, 0, &objective, &config, &mut island, 10, &mut rng).unwrap();

        assert_eq!(island.len(), 3);
        for c in &island.entities {
            assert!(seeds.iter().any(|genes| genes.as_slice() == c.genes()));
        }
    }

    #[test]
    fn test_island_sizes() {
        assert_eq!(island_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(island_sizes(5, 1), vec![5]);
    }

    struct LastGene;

    impl RouteObjective for LastGene {
        fn fitness(&self, genes: &[EdgeIdx]) -> f64 {
            genes.last().map_or(WORST_FITNESS, |&g| g as f64)
        }

        fn distance(&self, _: &[EdgeIdx], _: &[EdgeIdx]) -> f64 {
            0.0
        }
    }

    struct NothingFits;

    impl RouteObjective for NothingFits {
        fn fitness(&self, _: &[EdgeIdx]) -> f64 {
            WORST_FITNESS
        }

        fn distance(&self, _: &[EdgeIdx], _: &[EdgeIdx]) -> f64 {
            0.0
        }
    }
}
