//! Graph entities and ingestion.
//!
//! Nodes and edges carry the string ids used at the boundary; inside the
//! engines they are addressed by their position in the graph's arrays
//! ([`NodeIdx`], [`EdgeIdx`]).

use std::collections::{HashMap, HashSet};

use crate::error::GraphError;

/// Position of a node in [`Graph::nodes`].
pub type NodeIdx = usize;

/// Position of an edge in [`Graph::edges`].
pub type EdgeIdx = usize;

/// Orientation of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// Traversable from source to destination only.
    #[cfg_attr(feature = "serde", serde(rename = "DIRECTED"))]
    Directed,
    /// Traversable in both directions.
    #[cfg_attr(feature = "serde", serde(rename = "NOT_ORIENTED", alias = "UNDIRECTED"))]
    Undirected,
}

/// A vertex of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
}

/// A weighted edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: NodeIdx,
    pub destination: NodeIdx,
    pub weight: f64,
    pub kind: EdgeKind,
}

impl Edge {
    /// The vertex reached by taking this edge from `from`, or `None` if the
    /// edge cannot be taken from there.
    pub fn head_from(&self, from: NodeIdx) -> Option<NodeIdx> {
        match self.kind {
            EdgeKind::Directed => (self.source == from).then_some(self.destination),
            EdgeKind::Undirected => {
                if self.source == from {
                    Some(self.destination)
                } else if self.destination == from {
                    Some(self.source)
                } else {
                    None
                }
            }
        }
    }

    /// Vertices at which a walk may stand after taking this edge.
    pub(crate) fn exit_points(&self) -> [Option<NodeIdx>; 2] {
        match self.kind {
            EdgeKind::Directed => [Some(self.destination), None],
            EdgeKind::Undirected => [Some(self.source), Some(self.destination)],
        }
    }

    /// Vertices from which a walk may take this edge.
    pub(crate) fn entry_points(&self) -> [Option<NodeIdx>; 2] {
        match self.kind {
            EdgeKind::Directed => [Some(self.source), None],
            EdgeKind::Undirected => [Some(self.source), Some(self.destination)],
        }
    }
}

/// Serializable node description with a string id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSpec {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default = "default_label"))]
    pub label: String,
}

#[cfg(feature = "serde")]
fn default_label() -> String {
    "Node".to_string()
}

/// Serializable edge description referencing nodes by id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeSpec {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub weight: f64,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EdgeKind,
}

/// A graph as supplied by the boundary: nodes and edges keyed by string id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

/// An immutable, validated multigraph with mixed edge orientation.
///
/// The adjacency table is derived once at construction. Graphs are
/// read-only afterwards and shared freely between worker tasks.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIdx>>,
}

impl Graph {
    /// Builds a graph from index-addressed nodes and edges.
    ///
    /// # Errors
    /// Returns [`GraphError`] when the node or edge set is empty, an id is
    /// duplicated, an edge points outside the node array, a weight is
    /// negative or not finite, or a node has no incident edge.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::NoNodes);
        }
        if edges.is_empty() {
            return Err(GraphError::NoEdges);
        }

        let mut node_ids = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::with_capacity(edges.len());
        let mut incident = vec![false; nodes.len()];
        for edge in &edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::DuplicateEdge(edge.id.clone()));
            }
            for endpoint in [edge.source, edge.destination] {
                if endpoint >= nodes.len() {
                    return Err(GraphError::UnknownNode {
                        edge: edge.id.clone(),
                        node: format!("#{endpoint}"),
                    });
                }
                incident[endpoint] = true;
            }
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(GraphError::InvalidWeight {
                    edge: edge.id.clone(),
                    weight: edge.weight,
                });
            }
        }

        if let Some(isolated) = incident.iter().position(|&touched| !touched) {
            return Err(GraphError::IsolatedNode {
                id: nodes[isolated].id.clone(),
                label: nodes[isolated].label.clone(),
            });
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        for (idx, edge) in edges.iter().enumerate() {
            outgoing[edge.source].push(idx);
            if edge.kind == EdgeKind::Undirected && edge.destination != edge.source {
                outgoing[edge.destination].push(idx);
            }
        }

        Ok(Self {
            nodes,
            edges,
            outgoing,
        })
    }

    /// Resolves string ids and builds the graph.
    ///
    /// # Errors
    /// See [`Graph::new`]; additionally [`GraphError::UnknownNode`] when an
    /// edge names a node id that is not declared.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self, GraphError> {
        let mut index: HashMap<&str, NodeIdx> = HashMap::with_capacity(spec.nodes.len());
        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for node in &spec.nodes {
            if index.insert(node.id.as_str(), nodes.len()).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            nodes.push(Node {
                id: node.id.clone(),
                label: node.label.clone(),
            });
        }

        let resolve = |edge: &EdgeSpec, id: &str| {
            index
                .get(id)
                .copied()
                .ok_or_else(|| GraphError::UnknownNode {
                    edge: edge.id.clone(),
                    node: id.to_string(),
                })
        };

        let edges = spec
            .edges
            .iter()
            .map(|edge| {
                Ok(Edge {
                    id: edge.id.clone(),
                    source: resolve(edge, &edge.source)?,
                    destination: resolve(edge, &edge.destination)?,
                    weight: edge.weight,
                    kind: edge.kind,
                })
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        let graph = Self::new(nodes, edges)?;
        log::debug!(
            "graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Starts a [`GraphBuilder`].
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a node by its string id.
    pub fn node_index(&self, id: &str) -> Option<NodeIdx> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Looks up an edge by its string id.
    pub fn edge_index(&self, id: &str) -> Option<EdgeIdx> {
        self.edges.iter().position(|e| e.id == id)
    }

    /// Maps edge indices to their string ids.
    pub fn edge_ids(&self, walk: &[EdgeIdx]) -> Vec<String> {
        walk.iter().map(|&e| self.edges[e].id.clone()).collect()
    }

    pub(crate) fn outgoing(&self, node: NodeIdx) -> &[EdgeIdx] {
        &self.outgoing[node]
    }
}

/// Incremental construction of a [`GraphSpec`], mostly for tests and
/// benchmarks.
///
/// ```
/// use u_postman::graph::Graph;
///
/// let graph = Graph::builder()
///     .node("a", "A")
///     .node("b", "B")
///     .undirected("ab", "a", "b", 5.0)
///     .build()
///     .unwrap();
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    spec: GraphSpec,
}

impl GraphBuilder {
    pub fn node(mut self, id: &str, label: &str) -> Self {
        self.spec.nodes.push(NodeSpec {
            id: id.to_string(),
            label: label.to_string(),
        });
        self
    }

    pub fn directed(self, id: &str, source: &str, destination: &str, weight: f64) -> Self {
        self.edge(id, source, destination, weight, EdgeKind::Directed)
    }

    pub fn undirected(self, id: &str, source: &str, destination: &str, weight: f64) -> Self {
        self.edge(id, source, destination, weight, EdgeKind::Undirected)
    }

    pub fn edge(
        mut self,
        id: &str,
        source: &str,
        destination: &str,
        weight: f64,
        kind: EdgeKind,
    ) -> Self {
        self.spec.edges.push(EdgeSpec {
            id: id.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            weight,
            kind,
        });
        self
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }

    pub fn build(self) -> Result<Graph, GraphError> {
        Graph::from_spec(&self.spec)
    }
}
