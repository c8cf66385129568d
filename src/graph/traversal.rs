//! Traversal primitives: adjacency queries, breadth-first routing and
//! randomized closed-walk construction.

use std::collections::VecDeque;

use rand::Rng;

use super::types::{EdgeIdx, Graph, NodeIdx};
use crate::error::NoPathError;

impl Graph {
    /// Edges a walk standing at `node` may take next: directed edges leaving
    /// it and every incident undirected edge.
    pub fn edges_from(&self, node: NodeIdx) -> &[EdgeIdx] {
        self.outgoing(node)
    }

    /// Edges leading from `a` to `b` with respect to orientation.
    pub fn edges_between(&self, a: NodeIdx, b: NodeIdx) -> Vec<EdgeIdx> {
        self.outgoing(a)
            .iter()
            .copied()
            .filter(|&e| self.edge(e).head_from(a) == Some(b))
            .collect()
    }

    /// The vertex joining `first` to `second` when `second` directly follows
    /// `first` in a walk, or `None` when the two edges cannot be chained.
    ///
    /// A directed edge only offers its destination to its successor and its
    /// source to its predecessor; an undirected edge offers both endpoints.
    pub fn common_node(&self, first: EdgeIdx, second: EdgeIdx) -> Option<NodeIdx> {
        let entries = self.edge(second).entry_points();
        self.edge(first)
            .exit_points()
            .into_iter()
            .flatten()
            .find(|v| entries.contains(&Some(*v)))
    }

    /// Breadth-first search from `from` to `to`.
    ///
    /// Returns the path with the fewest edges (not the lightest), an empty
    /// path when `from == to`, or `None` if `to` is unreachable.
    pub fn path_between(&self, from: NodeIdx, to: NodeIdx) -> Option<Vec<EdgeIdx>> {
        if from == to {
            return Some(Vec::new());
        }
        self.bfs(from, |v| v == to, |_, _| true)
    }

    /// Builds a random closed walk from `start` that covers every edge at
    /// least once.
    ///
    /// The walker performs a randomized depth-first traversal, preferring
    /// edges it has not used yet. A vertex without usable exits is marked
    /// dead and the walker backtracks. When it wanders for too long without
    /// covering anything new, it takes the shortest route to the nearest
    /// vertex that still has an uncovered edge. Once every edge is covered
    /// the shortest path back to `start` is appended.
    ///
    /// # Errors
    /// [`NoPathError::DeadEnd`] when the dead-end cannot be recovered or an
    /// edge leads only into dead vertices, [`NoPathError::Unreachable`] when
    /// the walk cannot return to `start`.
    pub fn random_closed_walk<R: Rng>(
        &self,
        start: NodeIdx,
        rng: &mut R,
    ) -> Result<Vec<EdgeIdx>, NoPathError> {
        let edge_count = self.edge_count();
        let node_count = self.node_count();
        let stall_limit = self.stall_limit();
        let step_limit = self.walk_step_limit();

        let mut uses = vec![0u32; edge_count];
        let mut dead = vec![false; node_count];
        let mut covered = 0usize;
        let mut walk: Vec<EdgeIdx> = Vec::with_capacity(edge_count * 2);
        let mut trail: Vec<NodeIdx> = vec![start];
        let mut stalled = 0usize;
        let mut steps = 0usize;

        while covered < edge_count {
            steps += 1;
            if steps > step_limit {
                return Err(NoPathError::StepLimit(steps));
            }

            let current = trail[trail.len() - 1];
            let candidates: Vec<EdgeIdx> = self
                .outgoing(current)
                .iter()
                .copied()
                .filter(|&e| self.edge(e).head_from(current).is_some_and(|h| !dead[h]))
                .collect();

            if candidates.is_empty() {
                dead[current] = true;
                let Some(last) = walk.pop() else {
                    return Err(NoPathError::DeadEnd(current));
                };
                trail.pop();
                uses[last] -= 1;
                if uses[last] == 0 {
                    covered -= 1;
                }
                continue;
            }

            let fresh: Vec<EdgeIdx> = candidates
                .iter()
                .copied()
                .filter(|&e| uses[e] == 0)
                .collect();

            if fresh.is_empty() && stalled >= stall_limit {
                let detour = self
                    .route_to_uncovered(current, &uses, &dead)
                    .ok_or_else(|| NoPathError::DeadEnd(self.blocked_vertex(&uses, current)))?;
                for e in detour {
                    let head = self.edge(e).head_from(trail[trail.len() - 1]).unwrap_or(current);
                    uses[e] += 1;
                    if uses[e] == 1 {
                        covered += 1;
                    }
                    walk.push(e);
                    trail.push(head);
                }
                stalled = 0;
                continue;
            }

            let pool = if fresh.is_empty() { &candidates } else { &fresh };
            let next = pool[rng.random_range(0..pool.len())];
            let head = self.edge(next).head_from(current).unwrap_or(current);

            uses[next] += 1;
            if uses[next] == 1 {
                covered += 1;
                stalled = 0;
            } else {
                stalled += 1;
            }
            walk.push(next);
            trail.push(head);
        }

        let tail = trail[trail.len() - 1];
        if tail != start {
            let back = self
                .path_between(tail, start)
                .ok_or(NoPathError::Unreachable {
                    from: tail,
                    to: start,
                })?;
            walk.extend(back);
        }
        Ok(walk)
    }

    /// Sum of edge weights when every consecutive pair of edges shares a
    /// common node, otherwise `None`.
    pub fn walk_length(&self, walk: &[EdgeIdx]) -> Option<f64> {
        let chained = walk
            .windows(2)
            .all(|pair| self.common_node(pair[0], pair[1]).is_some());
        chained.then(|| walk.iter().map(|&e| self.edge(e).weight).sum())
    }

    /// Vertices visited by `walk` when it is taken from `start`, including
    /// `start` itself. `None` if some edge cannot be taken from the vertex
    /// the walk stands on.
    pub fn trace_walk(&self, start: NodeIdx, walk: &[EdgeIdx]) -> Option<Vec<NodeIdx>> {
        let mut trail = Vec::with_capacity(walk.len() + 1);
        trail.push(start);
        let mut current = start;
        for &e in walk {
            current = self.edge(e).head_from(current)?;
            trail.push(current);
        }
        Some(trail)
    }

    /// Vertex the walk ends on when taken from `start`.
    pub fn walk_end(&self, start: NodeIdx, walk: &[EdgeIdx]) -> Option<NodeIdx> {
        walk.iter()
            .try_fold(start, |current, &e| self.edge(e).head_from(current))
    }

    /// Length of `walk` if it leaves `start` and returns to it.
    pub fn closed_walk_length(&self, start: NodeIdx, walk: &[EdgeIdx]) -> Option<f64> {
        (self.walk_end(start, walk)? == start)
            .then(|| walk.iter().map(|&e| self.edge(e).weight).sum())
    }

    /// Whether every edge of the graph appears in `walk`.
    pub fn covers_all_edges(&self, walk: &[EdgeIdx]) -> bool {
        let mut seen = vec![false; self.edge_count()];
        let mut remaining = self.edge_count();
        for &e in walk {
            if !seen[e] {
                seen[e] = true;
                remaining -= 1;
            }
        }
        remaining == 0
    }

    /// Renders a walk edge by edge: `"A -> B, B -> C"`.
    pub fn describe_walk(&self, walk: &[EdgeIdx]) -> String {
        walk.iter()
            .map(|&e| {
                let edge = self.edge(e);
                format!(
                    "{} -> {}",
                    self.node(edge.source).label,
                    self.node(edge.destination).label
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders the vertex sequence of a walk taken from `start`:
    /// `"A->B->C->A"`.
    pub fn walk_node_labels(&self, start: NodeIdx, walk: &[EdgeIdx]) -> Option<String> {
        let trail = self.trace_walk(start, walk)?;
        Some(
            trail
                .iter()
                .map(|&v| self.node(v).label.as_str())
                .collect::<Vec<_>>()
                .join("->"),
        )
    }

    /// Steps a walker may take without covering a new edge before it is
    /// routed to the nearest uncovered edge.
    pub(crate) fn stall_limit(&self) -> usize {
        2 * self.edge_count().max(self.node_count())
    }

    /// Upper bound on the steps of one covering walk.
    pub(crate) fn walk_step_limit(&self) -> usize {
        let n = self.node_count();
        (self.edge_count() + n + 1) * (self.stall_limit() + n + 2)
    }

    /// Shortest route from `from` to the nearest other vertex that still has
    /// an uncovered edge leading to a live vertex.
    pub(crate) fn route_to_uncovered(
        &self,
        from: NodeIdx,
        uses: &[u32],
        dead: &[bool],
    ) -> Option<Vec<EdgeIdx>> {
        let has_uncovered = |v: NodeIdx| {
            self.outgoing(v).iter().any(|&e| {
                uses[e] == 0 && self.edge(e).head_from(v).is_some_and(|h| !dead[h])
            })
        };
        self.bfs(from, has_uncovered, |_, head| !dead[head])
    }

    /// A vertex explaining why coverage is impossible: the head of some
    /// uncovered edge, or `fallback`.
    pub(crate) fn blocked_vertex(&self, uses: &[u32], fallback: NodeIdx) -> NodeIdx {
        uses.iter()
            .position(|&u| u == 0)
            .map(|e| self.edge(e).destination)
            .unwrap_or(fallback)
    }

    /// Breadth-first search over edges accepted by `usable(edge, head)`,
    /// stopping at the first vertex other than `from` satisfying `is_goal`.
    fn bfs<G, U>(&self, from: NodeIdx, is_goal: G, usable: U) -> Option<Vec<EdgeIdx>>
    where
        G: Fn(NodeIdx) -> bool,
        U: Fn(EdgeIdx, NodeIdx) -> bool,
    {
        let mut parent: Vec<Option<(NodeIdx, EdgeIdx)>> = vec![None; self.node_count()];
        let mut seen = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back(from);

        while let Some(v) = queue.pop_front() {
            if v != from && is_goal(v) {
                let mut path = Vec::new();
                let mut cursor = v;
                while let Some((prev, e)) = parent[cursor] {
                    path.push(e);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            for &e in self.outgoing(v) {
                let Some(head) = self.edge(e).head_from(v) else {
                    continue;
                };
                if seen[head] || !usable(e, head) {
                    continue;
                }
                seen[head] = true;
                parent[head] = Some((v, e));
                queue.push_back(head);
            }
        }
        None
    }
}
