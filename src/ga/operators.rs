//! Recombination and mutation operators for edge-sequence chromosomes.
//!
//! Gene-level operators work on `&[EdgeIdx]` and know nothing about the
//! graph; they may produce walks that no longer chain, which the objective
//! then scores as infeasible. The graph-aware operators
//! ([`chromosome_crossover`], [`edge_replacing_mutation`]) repair or
//! preserve connectivity.
//!
//! # Recombination
//!
//! - [`discrete_recombination`]: per-gene coin flip
//! - [`single_point_crossover`]: swap tails after one cut
//! - [`two_point_crossover`]: swap an inclusive segment `[a, b]`
//! - [`shuffle_crossover`]: random gene exchange around a single-point cut
//! - [`chromosome_crossover`]: splice a donor segment with BFS stitching
//!
//! # Mutation
//!
//! - [`replacing_mutation`]: one gene becomes a random edge
//! - [`swapping_mutation`]: transpose two interior genes
//! - [`edge_replacing_mutation`]: parallel-edge substitution
//! - [`cataclysmic_mutation`]: edge replacing repeated `len / 2` times

use rand::Rng;

use crate::error::{Error, Result};
use crate::graph::{EdgeIdx, Graph, NodeIdx};

/// Recombination operator applied to a pair of parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Recombination {
    Discrete,
    #[cfg_attr(feature = "serde", serde(alias = "SINGLE_POINT_CROSSOVER"))]
    SinglePoint,
    #[cfg_attr(feature = "serde", serde(alias = "TWO_POINT_CROSSOVER"))]
    TwoPoint,
    Shuffle,
    /// Graph-aware segment splice.
    ChromosomeCrossover,
}

impl Recombination {
    /// Produces two offspring gene sequences with randomly chosen points.
    pub fn apply<R: Rng>(
        &self,
        graph: &Graph,
        start: NodeIdx,
        parent1: &[EdgeIdx],
        parent2: &[EdgeIdx],
        rng: &mut R,
    ) -> Result<(Vec<EdgeIdx>, Vec<EdgeIdx>)> {
        match self {
            Recombination::Discrete => Ok(discrete_recombination(parent1, parent2, rng)),
            Recombination::SinglePoint => single_point_crossover(parent1, parent2, None, rng),
            Recombination::TwoPoint => two_point_crossover(parent1, parent2, None, rng),
            Recombination::Shuffle => Ok(shuffle_crossover(parent1, parent2, rng)),
            Recombination::ChromosomeCrossover => {
                Ok(chromosome_crossover(graph, start, parent1, parent2, rng))
            }
        }
    }
}

/// Mutation operator applied to one offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Mutation {
    Replacing,
    Swapping,
    EdgeReplacing,
    Cataclysmic,
}

impl Mutation {
    pub fn apply<R: Rng>(&self, graph: &Graph, genes: &mut Vec<EdgeIdx>, rng: &mut R) {
        match self {
            Mutation::Replacing => replacing_mutation(genes, graph.edge_count(), rng),
            Mutation::Swapping => swapping_mutation(genes, rng),
            Mutation::EdgeReplacing => {
                edge_replacing_mutation(graph, genes, rng);
            }
            Mutation::Cataclysmic => cataclysmic_mutation(graph, genes, rng),
        }
    }
}

// ============================================================================
// Recombination
// ============================================================================

/// Discrete recombination: each gene of each child is drawn from either
/// parent with equal probability.
///
/// Children start as copies of their own parent, so genes past the shorter
/// parent's length are kept.
pub fn discrete_recombination<R: Rng>(
    parent1: &[EdgeIdx],
    parent2: &[EdgeIdx],
    rng: &mut R,
) -> (Vec<EdgeIdx>, Vec<EdgeIdx>) {
    let n = shared_len(parent1, parent2);
    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();

    for child in [&mut child1, &mut child2] {
        for i in 0..n {
            child[i] = if rng.random_bool(0.5) {
                parent1[i]
            } else {
                parent2[i]
            };
        }
    }
    (child1, child2)
}

/// Single-point crossover: `child1 = p1[..k] + p2[k..]`,
/// `child2 = p2[..k] + p1[k..]`.
///
/// `point` defaults to a random index in the shared gene range.
///
/// # Errors
/// [`Error::InvalidRecombinationPoints`] if `point` lies outside the shared
/// gene range.
pub fn single_point_crossover<R: Rng>(
    parent1: &[EdgeIdx],
    parent2: &[EdgeIdx],
    point: Option<usize>,
    rng: &mut R,
) -> Result<(Vec<EdgeIdx>, Vec<EdgeIdx>)> {
    let n = shared_len(parent1, parent2);
    if n == 0 {
        return Ok((parent1.to_vec(), parent2.to_vec()));
    }
    let k = match point {
        Some(k) if k < n => k,
        Some(k) => {
            return Err(Error::InvalidRecombinationPoints {
                points: vec![k],
                len: n,
            })
        }
        None => rng.random_range(0..n),
    };
    Ok(splice_tails(parent1, parent2, k))
}

/// Two-point crossover: the inclusive segment `[a, b]` is exchanged.
///
/// `points` defaults to two random indices in the shared gene range, in
/// either order.
///
/// # Errors
/// [`Error::InvalidRecombinationPoints`] if a point lies outside the
/// shared gene range.
pub fn two_point_crossover<R: Rng>(
    parent1: &[EdgeIdx],
    parent2: &[EdgeIdx],
    points: Option<(usize, usize)>,
    rng: &mut R,
) -> Result<(Vec<EdgeIdx>, Vec<EdgeIdx>)> {
    let n = shared_len(parent1, parent2);
    if n == 0 {
        return Ok((parent1.to_vec(), parent2.to_vec()));
    }
    let (a, b) = match points {
        Some((a, b)) if a < n && b < n => (a.min(b), a.max(b)),
        Some((a, b)) => {
            return Err(Error::InvalidRecombinationPoints {
                points: vec![a, b],
                len: n,
            })
        }
        None => random_segment(n, rng),
    };

    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    child1[a..=b].copy_from_slice(&parent2[a..=b]);
    child2[a..=b].copy_from_slice(&parent1[a..=b]);
    Ok((child1, child2))
}

/// Shuffle crossover: genes are exchanged at random between the parents,
/// then single-point crossed, then exchanged at random again between the
/// children.
pub fn shuffle_crossover<R: Rng>(
    parent1: &[EdgeIdx],
    parent2: &[EdgeIdx],
    rng: &mut R,
) -> (Vec<EdgeIdx>, Vec<EdgeIdx>) {
    let n = shared_len(parent1, parent2);
    if n == 0 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let mut p1 = parent1.to_vec();
    let mut p2 = parent2.to_vec();
    exchange_randomly(&mut p1, &mut p2, n, rng);

    let k = rng.random_range(0..n);
    let (mut child1, mut child2) = splice_tails(&p1, &p2, k);
    exchange_randomly(&mut child1, &mut child2, n, rng);
    (child1, child2)
}

/// Graph-aware crossover producing closed walks from `start`.
///
/// Each child keeps its own parent's prefix and suffix and takes a random
/// inclusive segment of the other parent in between, stitched on both sides
/// with BFS paths. When a parent does not trace from `start` or a stitch
/// fails, the child becomes `start -> segment -> start`; if even that cannot
/// be routed the parent is copied.
pub fn chromosome_crossover<R: Rng>(
    graph: &Graph,
    start: NodeIdx,
    parent1: &[EdgeIdx],
    parent2: &[EdgeIdx],
    rng: &mut R,
) -> (Vec<EdgeIdx>, Vec<EdgeIdx>) {
    let child1 = splice_segment(graph, start, parent1, parent2, rng);
    let child2 = splice_segment(graph, start, parent2, parent1, rng);
    (child1, child2)
}

fn splice_segment<R: Rng>(
    graph: &Graph,
    start: NodeIdx,
    receiver: &[EdgeIdx],
    donor: &[EdgeIdx],
    rng: &mut R,
) -> Vec<EdgeIdx> {
    if donor.is_empty() {
        return receiver.to_vec();
    }
    let (a, b) = random_segment(donor.len(), rng);
    let segment = &donor[a..=b];

    let Some(donor_trail) = graph.trace_walk(start, donor) else {
        return receiver.to_vec();
    };
    let (seg_from, seg_to) = (donor_trail[a], donor_trail[b + 1]);

    if let Some(receiver_trail) = graph.trace_walk(start, receiver) {
        let i = a.min(receiver.len());
        let j = (b + 1).clamp(i, receiver.len());
        let head = graph.path_between(receiver_trail[i], seg_from);
        let tail = graph.path_between(seg_to, receiver_trail[j]);
        if let (Some(head), Some(tail)) = (head, tail) {
            let mut child = Vec::with_capacity(receiver.len() + segment.len());
            child.extend_from_slice(&receiver[..i]);
            child.extend(head);
            child.extend_from_slice(segment);
            child.extend(tail);
            child.extend_from_slice(&receiver[j..]);
            return child;
        }
    }

    match (
        graph.path_between(start, seg_from),
        graph.path_between(seg_to, start),
    ) {
        (Some(head), Some(tail)) => {
            let mut child = head;
            child.extend_from_slice(segment);
            child.extend(tail);
            child
        }
        _ => receiver.to_vec(),
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Replaces one random gene with a random edge of the graph.
pub fn replacing_mutation<R: Rng>(genes: &mut [EdgeIdx], edge_count: usize, rng: &mut R) {
    if genes.is_empty() || edge_count == 0 {
        return;
    }
    let idx = rng.random_range(0..genes.len());
    genes[idx] = rng.random_range(0..edge_count);
}

/// Swaps two interior genes.
///
/// Up to three genes nothing happens; with exactly four the sequence is
/// reversed; otherwise genes `i - 1` and `i + 1` are exchanged for a random
/// `i` in `2..len - 2`.
pub fn swapping_mutation<R: Rng>(genes: &mut [EdgeIdx], rng: &mut R) {
    match genes.len() {
        0..=3 => {}
        4 => genes.reverse(),
        n => {
            let idx = rng.random_range(2..n - 2);
            genes.swap(idx - 1, idx + 1);
        }
    }
}

/// Substitutes an interior gene with a parallel edge joining the same two
/// vertices, when one exists. Returns whether a gene changed.
pub fn edge_replacing_mutation<R: Rng>(graph: &Graph, genes: &mut [EdgeIdx], rng: &mut R) -> bool {
    if genes.len() < 3 {
        return false;
    }
    let idx = rng.random_range(1..genes.len() - 1);
    let (Some(from), Some(to)) = (
        graph.common_node(genes[idx - 1], genes[idx]),
        graph.common_node(genes[idx], genes[idx + 1]),
    ) else {
        return false;
    };

    let current = genes[idx];
    let alternatives: Vec<EdgeIdx> = graph
        .edges_between(from, to)
        .into_iter()
        .filter(|&e| e != current)
        .collect();
    if alternatives.is_empty() {
        return false;
    }
    genes[idx] = alternatives[rng.random_range(0..alternatives.len())];
    true
}

/// Edge-replacing mutation repeated `len / 2` times.
pub fn cataclysmic_mutation<R: Rng>(graph: &Graph, genes: &mut [EdgeIdx], rng: &mut R) {
    for _ in 0..genes.len() / 2 {
        edge_replacing_mutation(graph, genes, rng);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Number of positions both parents have.
fn shared_len(a: &[EdgeIdx], b: &[EdgeIdx]) -> usize {
    a.len().min(b.len())
}

fn splice_tails(a: &[EdgeIdx], b: &[EdgeIdx], k: usize) -> (Vec<EdgeIdx>, Vec<EdgeIdx>) {
    let mut child1 = a[..k].to_vec();
    child1.extend_from_slice(&b[k..]);
    let mut child2 = b[..k].to_vec();
    child2.extend_from_slice(&a[k..]);
    (child1, child2)
}

fn exchange_randomly<R: Rng>(a: &mut [EdgeIdx], b: &mut [EdgeIdx], n: usize, rng: &mut R) {
    for i in 0..n {
        if rng.random_bool(0.5) {
            std::mem::swap(&mut a[i], &mut b[i]);
        }
    }
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================
