//! Transient edge-weight biasing with exact, scoped reversal.
//!
//! Every bias application returns a [`BiasToken`] recording precisely which
//! edges changed and how. Reverting the token restores each edge to its
//! prior value, so a planning pass that applies several biases and reverts
//! them in LIFO order always leaves the graph byte-identical to its
//! baseline, early-return paths included. Nothing here rediscovers state
//! at revert time; the token *is* the state.

use smallvec::SmallVec;

use crate::board::{BoardGraph, EdgeIx, NodeId, TransportClass};
use crate::config::HuntConfig;
use crate::constants::{BLOCKED_WEIGHT, RELAXED_WATER_WEIGHT};
use crate::route;

#[derive(Debug, Clone, Copy)]
enum BiasOp {
    /// Weight was nudged by `amount`; revert subtracts it.
    Delta { edge: EdgeIx, amount: f32 },
    /// Weight was overwritten; revert restores `prior`.
    Restore { edge: EdgeIx, prior: f32 },
}

/// Record of one bias application. Must be reverted before the planning
/// pass that created it returns.
#[derive(Debug, Default)]
#[must_use = "an unreverted bias corrupts the board for every later turn"]
pub struct BiasToken {
    ops: Vec<BiasOp>,
}

impl BiasToken {
    fn nudge(&mut self, graph: &mut BoardGraph, edge: EdgeIx, amount: f32) {
        graph.nudge_weight(edge, amount);
        self.ops.push(BiasOp::Delta { edge, amount });
    }

    fn overwrite(&mut self, graph: &mut BoardGraph, edge: EdgeIx, weight: f32) {
        let prior = graph.swap_weight(edge, weight);
        self.ops.push(BiasOp::Restore { edge, prior });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Undo every recorded mutation, newest first.
    pub fn revert(self, graph: &mut BoardGraph) {
        for op in self.ops.into_iter().rev() {
            match op {
                BiasOp::Delta { edge, amount } => graph.nudge_weight(edge, -amount),
                BiasOp::Restore { edge, prior } => {
                    graph.swap_weight(edge, prior);
                }
            }
        }
    }
}

/// Poison application: the token plus the set of pursuers it covered, so
/// callers can log or test exactly who was sealed off.
#[derive(Debug)]
#[must_use = "an unreverted bias corrupts the board for every later turn"]
pub struct PoisonToken {
    pub poisoned: SmallVec<[NodeId; 3]>,
    token: BiasToken,
}

impl PoisonToken {
    pub fn revert(self, graph: &mut BoardGraph) {
        self.token.revert(graph);
    }
}

/// Seal off every pursuer standing within `poison_radius` moves of the
/// fugitive by adding the blocked sentinel to each edge touching that
/// pursuer's crossing. Distances are measured with water relaxed when the
/// fugitive can still afford a water tactic, matching how it judges its own
/// mobility.
pub fn poison_pursuers(
    graph: &mut BoardGraph,
    pursuers: &[NodeId; 3],
    fugitive: NodeId,
    water_available: bool,
    cfg: &HuntConfig,
) -> PoisonToken {
    let mut poisoned = SmallVec::new();
    for &pursuer in pursuers {
        let d = relaxed_water_distance(graph, pursuer, fugitive, water_available);
        if d < cfg.poison_radius {
            poisoned.push(pursuer);
        }
    }
    let mut token = BiasToken::default();
    for &pursuer in &poisoned {
        let edges: Vec<EdgeIx> = graph.incident_edges(pursuer).collect();
        for edge in edges {
            token.nudge(graph, edge, BLOCKED_WEIGHT);
        }
    }
    PoisonToken { poisoned, token }
}

/// Softly discourage routes near pursuers. Walks each pursuer's own
/// movement view (Normal-class edges only, so shortcut webs cannot compound
/// the penalty) out to `deterrent_radius` hops, and burdens every edge at a
/// reached node that touches a destination endpoint. Crossing-to-crossing
/// edges are left alone; long crossing chains would otherwise stack the
/// penalty many times over.
pub fn discourage_pursuers(
    graph: &mut BoardGraph,
    pursuers: &[NodeId; 3],
    magnitude: f32,
    cfg: &HuntConfig,
) -> BiasToken {
    let mut token = BiasToken::default();
    if magnitude == 0.0 {
        return token;
    }
    for &pursuer in pursuers {
        let mut seen = vec![false; graph.node_count()];
        seen[pursuer.0 as usize] = true;
        let mut frontier = vec![pursuer];
        for _ in 0..cfg.deterrent_radius {
            let mut next = Vec::new();
            for &u in &frontier {
                for (_, edge) in graph.out_edges(u) {
                    if edge.class == TransportClass::Normal && !seen[edge.to.0 as usize] {
                        seen[edge.to.0 as usize] = true;
                        next.push(edge.to);
                    }
                }
            }
            for &node in &next {
                let edges: Vec<EdgeIx> = graph
                    .incident_edges(node)
                    .filter(|&ix| {
                        let e = graph.edge(ix);
                        graph.is_destination(e.from) || graph.is_destination(e.to)
                    })
                    .collect();
                for edge in edges {
                    token.nudge(graph, edge, magnitude);
                }
            }
            frontier = next;
        }
    }
    token
}

/// When time runs short or a single destination remains, stop treating the
/// river as a last resort: water edges drop to their true one-move cost for
/// the planning pass, provided a water tactic is still in hand.
pub fn desperation(
    graph: &mut BoardGraph,
    turn_count: u32,
    targets_remaining: usize,
    water_available: bool,
    cfg: &HuntConfig,
) -> BiasToken {
    let mut token = BiasToken::default();
    let desperate = turn_count > cfg.desperation_turn || targets_remaining == 1;
    if desperate && water_available {
        let edges: Vec<EdgeIx> = graph.edges_of_class(TransportClass::Water).collect();
        for edge in edges {
            token.overwrite(graph, edge, RELAXED_WATER_WEIGHT);
        }
    }
    token
}

/// Overwrite every edge of the given classes with the blocked sentinel for
/// the duration of the token. Used when planning a rapid transit, which may
/// roll through pursuers but never over water or through a shortcut.
pub fn block_classes(graph: &mut BoardGraph, classes: &[TransportClass]) -> BiasToken {
    let mut token = BiasToken::default();
    for &class in classes {
        let edges: Vec<EdgeIx> = graph.edges_of_class(class).collect();
        for edge in edges {
            token.overwrite(graph, edge, BLOCKED_WEIGHT);
        }
    }
    token
}

/// Poison one specific edge pair (both directions) of a class. Used to
/// forbid an illegal shortcut landing for the remainder of a planning pass.
pub fn poison_edge_pair(
    graph: &mut BoardGraph,
    a: NodeId,
    b: NodeId,
    class: TransportClass,
) -> BiasToken {
    let mut token = BiasToken::default();
    let edges: Vec<EdgeIx> = graph
        .direct_edges(a, b, class)
        .chain(graph.direct_edges(b, a, class))
        .collect();
    for edge in edges {
        token.nudge(graph, edge, BLOCKED_WEIGHT);
    }
    token
}

/// Move distance with water edges temporarily at their true cost (when a
/// water tactic remains). This is how the fugitive measures "how many turns
/// away", both for itself and for judging pursuer closeness.
#[must_use]
pub fn relaxed_water_distance(
    graph: &mut BoardGraph,
    from: NodeId,
    to: NodeId,
    water_available: bool,
) -> f32 {
    let mut token = BiasToken::default();
    if water_available {
        let edges: Vec<EdgeIx> = graph.edges_of_class(TransportClass::Water).collect();
        for edge in edges {
            token.overwrite(graph, edge, RELAXED_WATER_WEIGHT);
        }
    }
    let d = route::distance(graph, from, to);
    token.revert(graph);
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardSpec, EdgeSpec, NodeKind, NodeSpec};
    use crate::constants::DEFAULT_TACTIC_WEIGHT;

    fn node(name: &str, kind: NodeKind, water: bool) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            kind,
            water,
            position: None,
        }
    }

    fn link(from: &str, to: &str, weight: f32, class: TransportClass) -> EdgeSpec {
        EdgeSpec {
            from: from.to_string(),
            to: to.to_string(),
            weight,
            class,
        }
    }

    /// A corridor: w1 = c1 = a = c2 = b, with a water hop w1~a and a
    /// shortcut a~b.
    fn fixture() -> BoardGraph {
        BoardSpec {
            nodes: vec![
                node("w1", NodeKind::Destination, true),
                node("a", NodeKind::Destination, true),
                node("b", NodeKind::Destination, false),
                node("c1", NodeKind::Crossing, false),
                node("c2", NodeKind::Crossing, false),
            ],
            edges: vec![
                link("w1", "c1", 0.0, TransportClass::Normal),
                link("c1", "w1", 1.0, TransportClass::Normal),
                link("a", "c1", 0.0, TransportClass::Normal),
                link("c1", "a", 1.0, TransportClass::Normal),
                link("a", "c2", 0.0, TransportClass::Normal),
                link("c2", "a", 1.0, TransportClass::Normal),
                link("b", "c2", 0.0, TransportClass::Normal),
                link("c2", "b", 1.0, TransportClass::Normal),
                link("w1", "a", DEFAULT_TACTIC_WEIGHT, TransportClass::Water),
                link("a", "w1", DEFAULT_TACTIC_WEIGHT, TransportClass::Water),
                link("a", "b", DEFAULT_TACTIC_WEIGHT, TransportClass::Shortcut),
                link("b", "a", DEFAULT_TACTIC_WEIGHT, TransportClass::Shortcut),
            ],
            quadrants: [
                vec!["w1".to_string()],
                vec!["a".to_string()],
                vec!["b".to_string()],
                vec!["b".to_string()],
            ],
            starting_pursuers: ["c1".to_string(), "c1".to_string(), "c2".to_string()],
        }
        .build()
        .unwrap()
    }

    #[test]
    fn poison_covers_only_adjacent_pursuers_and_reverts() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let a = g.node_id("a").unwrap();
        let c1 = g.node_id("c1").unwrap();
        let c2 = g.node_id("c2").unwrap();
        let baseline = g.weight_snapshot();

        // c1 and c2 are one move from "a"; a pursuer parked on b's far side
        // would not be. Here all three qualify except none when far away.
        let token = poison_pursuers(&mut g, &[c1, c2, c1], a, true, &cfg);
        assert_eq!(token.poisoned.len(), 3);
        // Both crossings sealed: only the direct shortcut to "b" survives.
        assert_eq!(
            route::distance(&g, a, g.node_id("b").unwrap()),
            DEFAULT_TACTIC_WEIGHT
        );
        token.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }

    #[test]
    fn poison_skips_distant_pursuers() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let w1 = g.node_id("w1").unwrap();
        let c2 = g.node_id("c2").unwrap();
        let baseline = g.weight_snapshot();

        // c2 is two moves from w1 (through a), past the poison radius.
        let token = poison_pursuers(&mut g, &[c2, c2, c2], w1, false, &cfg);
        assert!(token.poisoned.is_empty());
        token.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }

    #[test]
    fn deterrent_touches_only_destination_edges_and_reverts() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let c1 = g.node_id("c1").unwrap();
        let baseline = g.weight_snapshot();

        let token = discourage_pursuers(&mut g, &[c1, c1, c1], 0.5, &cfg);
        assert!(!token.is_empty());
        for i in 0..g.edge_count() {
            let ix = EdgeIx(i as u32);
            let e = g.edge(ix);
            let crossing_to_crossing =
                !g.is_destination(e.from) && !g.is_destination(e.to);
            if crossing_to_crossing {
                assert_eq!(g.weight(ix), baseline[i], "crossing chains stay unburdened");
            }
        }
        token.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }

    #[test]
    fn zero_magnitude_deterrent_is_a_no_op() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let c1 = g.node_id("c1").unwrap();
        let token = discourage_pursuers(&mut g, &[c1, c1, c1], 0.0, &cfg);
        assert!(token.is_empty());
        token.revert(&mut g);
    }

    #[test]
    fn desperation_relaxes_water_and_restores_stacked_deltas() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let c1 = g.node_id("c1").unwrap();
        let baseline = g.weight_snapshot();

        // Deterrent first, then desperation over it; LIFO revert must
        // restore the deterrent residue exactly, then remove it.
        let deter = discourage_pursuers(&mut g, &[c1, c1, c1], 0.25, &cfg);
        let desp = desperation(&mut g, 8, 3, true, &cfg);
        assert!(!desp.is_empty());
        for ix in g.edges_of_class(TransportClass::Water).collect::<Vec<_>>() {
            assert_eq!(g.weight(ix), RELAXED_WATER_WEIGHT);
        }
        desp.revert(&mut g);
        deter.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }

    #[test]
    fn desperation_needs_time_pressure_or_last_target() {
        let mut g = fixture();
        let cfg = HuntConfig::default_config();
        let quiet = desperation(&mut g, 3, 3, true, &cfg);
        assert!(quiet.is_empty());
        quiet.revert(&mut g);

        let last = desperation(&mut g, 3, 1, true, &cfg);
        assert!(!last.is_empty());
        last.revert(&mut g);

        let spent = desperation(&mut g, 12, 1, false, &cfg);
        assert!(spent.is_empty());
        spent.revert(&mut g);
    }

    #[test]
    fn relaxed_distance_leaves_no_trace() {
        let mut g = fixture();
        let w1 = g.node_id("w1").unwrap();
        let a = g.node_id("a").unwrap();
        let baseline = g.weight_snapshot();
        let d = relaxed_water_distance(&mut g, w1, a, true);
        assert_eq!(d, 1.0);
        assert_eq!(g.weight_snapshot(), baseline);
        let d = relaxed_water_distance(&mut g, w1, a, false);
        assert_eq!(d, 1.0, "the crossing route still costs one move");
    }

    #[test]
    fn edge_pair_poison_blocks_both_directions() {
        let mut g = fixture();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        let baseline = g.weight_snapshot();
        let token = poison_edge_pair(&mut g, a, b, TransportClass::Shortcut);
        for ix in g.direct_edges(a, b, TransportClass::Shortcut).collect::<Vec<_>>() {
            assert!(g.weight(ix) >= BLOCKED_WEIGHT);
        }
        for ix in g.direct_edges(b, a, TransportClass::Shortcut).collect::<Vec<_>>() {
            assert!(g.weight(ix) >= BLOCKED_WEIGHT);
        }
        token.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }

    #[test]
    fn block_classes_remembers_priors() {
        let mut g = fixture();
        // Simulate an exhausted shortcut class, then a rapid-transit plan
        // that blocks both special classes; the revert must leave the
        // exhausted class blocked and the live class at its default.
        g.set_class_weight(TransportClass::Shortcut, BLOCKED_WEIGHT);
        let baseline = g.weight_snapshot();
        let token = block_classes(
            &mut g,
            &[TransportClass::Water, TransportClass::Shortcut],
        );
        for ix in g.edges_of_class(TransportClass::Water).collect::<Vec<_>>() {
            assert!(g.weight(ix) >= BLOCKED_WEIGHT);
        }
        token.revert(&mut g);
        assert_eq!(g.weight_snapshot(), baseline);
    }
}
