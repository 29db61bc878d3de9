//! Street-network model: nodes, edges, and the weighted board graph.
//!
//! The board is supplied by a collaborator as a [`BoardSpec`] edge list and
//! interned into a [`BoardGraph`] with validated invariants. Edges are
//! conceptually bidirectional but stored as two directed entries, which lets
//! the data give them asymmetric weights: leaving a destination costs 0 and
//! entering one costs 1, so weighted distance equals the number of moves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Index of a node inside its [`BoardGraph`]. Obtained from
/// [`BoardGraph::node_id`]; treat ids from one board as meaningless on
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u16);

/// Index of a directed edge inside its [`BoardGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIx(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A stop the fugitive can occupy and eventually commit a crime at.
    Destination,
    /// A street crossing; a connector that never serves as a destination
    /// and is skipped when reporting where the fugitive went.
    Crossing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportClass {
    Normal,
    Water,
    Shortcut,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// Riverside destinations reachable by the water tactic.
    pub water: bool,
    /// Display coordinates; validated but otherwise ignored by the core.
    pub position: Option<(f32, f32)>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub class: TransportClass,
    pub(crate) weight: f32,
}

/// Declarative board description, usually deserialized from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSpec {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    /// Fixed partition of destinations; one per-quadrant destination is
    /// drawn each round.
    pub quadrants: [Vec<String>; 4],
    /// Crossings the three pursuer tokens occupy at game start.
    pub starting_pursuers: [String; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub water: bool,
    #[serde(default)]
    pub position: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub weight: f32,
    pub class: TransportClass,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("duplicate node {0}")]
    DuplicateNode(String),
    #[error("{role} references unknown node {name}")]
    UnknownNode { role: &'static str, name: String },
    #[error("edge {from} -> {to} has no reverse counterpart of the same class")]
    MissingReverse { from: String, to: String },
    #[error("{0} is a crossing and cannot appear in a quadrant")]
    CrossingInQuadrant(String),
    #[error("{0} is a crossing and cannot be a water stop")]
    WaterCrossing(String),
    #[error("quadrant {0} has no destinations")]
    EmptyQuadrant(usize),
    #[error("starting pursuer {0} is not a crossing")]
    PursuerStartNotCrossing(String),
}

impl BoardSpec {
    /// Parse a board description from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the text is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the description and intern it into a [`BoardGraph`].
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] describing the first violated invariant.
    pub fn build(&self) -> Result<BoardGraph, BoardError> {
        let mut by_name = HashMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for spec in &self.nodes {
            if spec.water && spec.kind == NodeKind::Crossing {
                return Err(BoardError::WaterCrossing(spec.name.clone()));
            }
            let id = NodeId(nodes.len() as u16);
            if by_name.insert(spec.name.clone(), id).is_some() {
                return Err(BoardError::DuplicateNode(spec.name.clone()));
            }
            nodes.push(Node {
                name: spec.name.clone(),
                kind: spec.kind,
                water: spec.water,
                position: spec.position,
            });
        }

        let resolve = |role: &'static str, name: &str| -> Result<NodeId, BoardError> {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| BoardError::UnknownNode {
                    role,
                    name: name.to_string(),
                })
        };

        let mut edges = Vec::with_capacity(self.edges.len());
        let mut out = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        for spec in &self.edges {
            let from = resolve("edge", &spec.from)?;
            let to = resolve("edge", &spec.to)?;
            let ix = EdgeIx(edges.len() as u32);
            out[from.0 as usize].push(ix);
            incident[from.0 as usize].push(ix);
            incident[to.0 as usize].push(ix);
            edges.push(Edge {
                from,
                to,
                class: spec.class,
                weight: spec.weight,
            });
        }

        // Every directed entry must have a same-class reverse entry.
        for edge in &edges {
            let reversed = edges
                .iter()
                .any(|e| e.from == edge.to && e.to == edge.from && e.class == edge.class);
            if !reversed {
                return Err(BoardError::MissingReverse {
                    from: nodes[edge.from.0 as usize].name.clone(),
                    to: nodes[edge.to.0 as usize].name.clone(),
                });
            }
        }

        let mut quadrants: [Vec<NodeId>; 4] = Default::default();
        for (qi, group) in self.quadrants.iter().enumerate() {
            if group.is_empty() {
                return Err(BoardError::EmptyQuadrant(qi));
            }
            for name in group {
                let id = resolve("quadrant", name)?;
                if nodes[id.0 as usize].kind == NodeKind::Crossing {
                    return Err(BoardError::CrossingInQuadrant(name.clone()));
                }
                quadrants[qi].push(id);
            }
        }

        let mut starting_pursuers = [NodeId(0); 3];
        for (slot, name) in self.starting_pursuers.iter().enumerate() {
            let id = resolve("starting pursuer", name)?;
            if nodes[id.0 as usize].kind != NodeKind::Crossing {
                return Err(BoardError::PursuerStartNotCrossing(name.clone()));
            }
            starting_pursuers[slot] = id;
        }

        Ok(BoardGraph {
            nodes,
            edges,
            out,
            incident,
            by_name,
            quadrants,
            starting_pursuers,
        })
    }
}

/// The live weighted street network. The bias engine mutates edge weights
/// in place during a planning pass and is responsible for restoring every
/// mutation before the pass returns.
#[derive(Debug, Clone)]
pub struct BoardGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    out: Vec<Vec<EdgeIx>>,
    incident: Vec<Vec<EdgeIx>>,
    by_name: HashMap<String, NodeId>,
    quadrants: [Vec<NodeId>; 4],
    starting_pursuers: [NodeId; 3],
}

impl BoardGraph {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolve a display name to its id; `None` means the caller passed an
    /// unknown location and should reject the input.
    #[must_use]
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0 as usize].name
    }

    #[must_use]
    pub fn is_destination(&self, id: NodeId) -> bool {
        self.nodes[id.0 as usize].kind == NodeKind::Destination
    }

    #[must_use]
    pub fn is_water(&self, id: NodeId) -> bool {
        self.nodes[id.0 as usize].water
    }

    #[must_use]
    pub fn edge(&self, ix: EdgeIx) -> &Edge {
        &self.edges[ix.0 as usize]
    }

    #[must_use]
    pub fn weight(&self, ix: EdgeIx) -> f32 {
        self.edges[ix.0 as usize].weight
    }

    /// Outgoing edges of a node.
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeIx, &Edge)> + '_ {
        self.out[id.0 as usize]
            .iter()
            .map(|&ix| (ix, &self.edges[ix.0 as usize]))
    }

    /// Incoming edges of a node.
    pub fn in_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeIx, &Edge)> + '_ {
        self.incident[id.0 as usize]
            .iter()
            .map(|&ix| (ix, &self.edges[ix.0 as usize]))
            .filter(move |(_, e)| e.to == id)
    }

    /// Every directed edge touching a node, in either direction.
    pub fn incident_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeIx> + '_ {
        self.incident[id.0 as usize].iter().copied()
    }

    /// The cheapest direct edge from `a` to `b` under current weights.
    #[must_use]
    pub fn cheapest_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeIx> {
        self.out[a.0 as usize]
            .iter()
            .copied()
            .filter(|&ix| self.edges[ix.0 as usize].to == b)
            .min_by(|&x, &y| {
                self.edges[x.0 as usize]
                    .weight
                    .total_cmp(&self.edges[y.0 as usize].weight)
            })
    }

    /// Directed edges from `a` to `b` of one transport class.
    pub fn direct_edges(
        &self,
        a: NodeId,
        b: NodeId,
        class: TransportClass,
    ) -> impl Iterator<Item = EdgeIx> + '_ {
        self.out[a.0 as usize].iter().copied().filter(move |&ix| {
            let e = &self.edges[ix.0 as usize];
            e.to == b && e.class == class
        })
    }

    /// Indices of every edge of one transport class.
    pub fn edges_of_class(&self, class: TransportClass) -> impl Iterator<Item = EdgeIx> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.class == class)
            .map(|(i, _)| EdgeIx(i as u32))
    }

    /// Bulk rewrite of every edge of a transport class, used to toggle a
    /// tactic between its runtime cost and the blocked sentinel.
    pub fn set_class_weight(&mut self, class: TransportClass, weight: f32) {
        for edge in &mut self.edges {
            if edge.class == class {
                edge.weight = weight;
            }
        }
    }

    pub(crate) fn nudge_weight(&mut self, ix: EdgeIx, delta: f32) {
        self.edges[ix.0 as usize].weight += delta;
    }

    /// Overwrite one edge weight, returning the prior value.
    pub(crate) fn swap_weight(&mut self, ix: EdgeIx, weight: f32) -> f32 {
        std::mem::replace(&mut self.edges[ix.0 as usize].weight, weight)
    }

    #[must_use]
    pub fn quadrants(&self) -> &[Vec<NodeId>; 4] {
        &self.quadrants
    }

    #[must_use]
    pub const fn starting_pursuers(&self) -> [NodeId; 3] {
        self.starting_pursuers
    }

    /// Snapshot of every edge weight, for diagnostics and symmetry audits.
    #[must_use]
    pub fn weight_snapshot(&self) -> Vec<f32> {
        self.edges.iter().map(|e| e.weight).collect()
    }
}
