//! Per-turn movement decision kernel.
//!
//! Each turn the kernel biases the board against the pursuers, picks the
//! cheapest remaining destination, draws a path, classifies the implied
//! move, enforces move legality, and decides whether a scarce tactic is
//! worth burning. Every weight mutation made along the way is token-scoped
//! and reverted before the kernel returns, on every path, the cornered
//! early-outs included.

use rand::Rng;
use smallvec::SmallVec;

use crate::bias;
use crate::board::{BoardGraph, NodeId, TransportClass};
use crate::config::HuntConfig;
use crate::constants::{BLOCKED_WEIGHT, DIST_EPS, MAX_REPLANS};
use crate::rng::RngBundle;
use crate::route::{self, Path};
use crate::state::{HuntState, MoveKind};

/// The kernel's verdict for one turn.
#[derive(Debug)]
pub(crate) enum TurnDecision {
    Plan(TurnPlan),
    /// Every exit is sealed and no rapid transit can be played; the round
    /// is over in the pursuers' favor.
    CannotMove,
}

/// An accepted move: the sampled node sequence, its cost in moves, and the
/// travel classification.
#[derive(Debug, Clone)]
pub(crate) struct TurnPlan {
    pub kind: MoveKind,
    pub path: Path,
    pub cost: u32,
}

enum Pass {
    Plan(TurnPlan),
    /// The first hop's biased distance hit the blocked sentinel.
    Cornered,
}

pub(crate) struct TurnKernel<'a> {
    cfg: &'a HuntConfig,
}

impl<'a> TurnKernel<'a> {
    pub(crate) const fn new(cfg: &'a HuntConfig) -> Self {
        Self { cfg }
    }

    /// Decide the fugitive's move for this turn.
    ///
    /// # Panics
    ///
    /// Panics when called without a position or with no targets remaining;
    /// the session guarantees both while a game is in progress.
    pub(crate) fn decide(
        &self,
        graph: &mut BoardGraph,
        state: &mut HuntState,
        rng: &RngBundle,
    ) -> TurnDecision {
        let mut accepted: Option<TurnPlan> = None;
        let budget =
            i64::from(self.cfg.turn_limit) - i64::from(self.cfg.turn_buffer);
        for &deterrent in &self.cfg.deterrent_ladder {
            match self.pick_path(graph, state, rng, deterrent) {
                Pass::Cornered => {
                    if state.tactics.available(MoveKind::RapidTransit)
                        && state.turn_count() < self.cfg.late_rapid_cutoff
                    {
                        return match self.plan_rapid_transit(graph, state, rng) {
                            Some(plan) => TurnDecision::Plan(plan),
                            None => TurnDecision::CannotMove,
                        };
                    }
                    return TurnDecision::CannotMove;
                }
                Pass::Plan(plan) => {
                    let affordable =
                        i64::from(plan.cost) <= budget - i64::from(state.turn_count());
                    accepted = Some(plan);
                    if affordable {
                        break;
                    }
                }
            }
        }
        let mut plan = accepted.expect("deterrent ladder is never empty");

        // A cheap ordinary move with pursuers crowding in may still be worth
        // upgrading to a rapid transit -- unless the goal is one move away,
        // where a special move would be wasted or illegal.
        if plan.kind == MoveKind::Normal {
            let pos = state.pos.expect("fugitive has a position while planning");
            let target = state
                .active_target
                .expect("planning pass always selects a target");
            let water_ok = state.tactics.available(MoveKind::Water);
            let goal_distance = bias::relaxed_water_distance(graph, pos, target, water_ok);
            if (goal_distance - 1.0).abs() > DIST_EPS && self.should_rapid_transit(graph, state) {
                match self.plan_rapid_transit(graph, state, rng) {
                    Some(rapid) => plan = rapid,
                    None => return TurnDecision::CannotMove,
                }
            }
        }

        TurnDecision::Plan(plan)
    }

    /// One deterrent rung: plan, then replan with the offending shortcut
    /// sealed whenever the draw tries to shortcut straight onto the goal.
    fn pick_path(
        &self,
        graph: &mut BoardGraph,
        state: &mut HuntState,
        rng: &RngBundle,
        deterrent: f32,
    ) -> Pass {
        let mut pinned = Vec::new();
        let mut outcome = Pass::Cornered;
        for _ in 0..MAX_REPLANS {
            let pass = self.pick_path_once(graph, state, rng, deterrent);
            match pass {
                Pass::Plan(ref plan)
                    if plan.kind == MoveKind::Shortcut
                        && state.active_target == plan.path.get(1).copied() =>
                {
                    // Shortcuts may never be the terminal hop onto the
                    // goal. Seal this specific pair and try again.
                    let pos = state.pos.expect("fugitive has a position while planning");
                    let landing = plan.path[1];
                    pinned.push(bias::poison_edge_pair(
                        graph,
                        pos,
                        landing,
                        TransportClass::Shortcut,
                    ));
                }
                pass => {
                    outcome = pass;
                    break;
                }
            }
        }
        for token in pinned.into_iter().rev() {
            token.revert(graph);
        }
        outcome
    }

    /// One biased planning pass: poison, deterrent, desperation, target
    /// choice, path draw, classification. All biases are reverted before
    /// returning, whatever the outcome.
    fn pick_path_once(
        &self,
        graph: &mut BoardGraph,
        state: &mut HuntState,
        rng: &RngBundle,
        deterrent: f32,
    ) -> Pass {
        let pos = state.pos.expect("fugitive has a position while planning");
        let water_ok = state.tactics.available(MoveKind::Water);

        let poison =
            bias::poison_pursuers(graph, &state.pursuers, pos, water_ok, self.cfg);
        let deter = bias::discourage_pursuers(graph, &state.pursuers, deterrent, self.cfg);
        let desp = bias::desperation(
            graph,
            state.turn_count(),
            state.targets.len(),
            water_ok,
            self.cfg,
        );

        let tree = route::shortest_tree(graph, pos);
        let mut best: Option<(NodeId, f32)> = None;
        for &target in &state.targets {
            let d = tree.distance(target);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((target, d));
            }
        }
        let (target, _) = best.expect("at least one destination remains");
        state.active_target = Some(target);

        let path = route::sample_path(graph, &tree, target, &mut *rng.route());
        let first_hop_blocked = match path.as_ref() {
            Some(p) if p.len() >= 2 => tree.distance(p[1]) >= BLOCKED_WEIGHT,
            _ => true,
        };

        desp.revert(graph);
        deter.revert(graph);
        poison.revert(graph);

        if first_hop_blocked {
            return Pass::Cornered;
        }
        let path = path.expect("unblocked plan has a path");
        let cost = move_cost(graph, &path);
        let kind = self.classify(graph, state, rng, pos, path[1]);
        Pass::Plan(TurnPlan { kind, path, cost })
    }

    /// Classify the first hop. Direct destination-to-destination hops are
    /// special moves; which one depends on the edge actually taken.
    fn classify(
        &self,
        graph: &BoardGraph,
        state: &HuntState,
        rng: &RngBundle,
        pos: NodeId,
        first: NodeId,
    ) -> MoveKind {
        if !graph.is_destination(first) {
            return MoveKind::Normal;
        }
        if graph.is_water(pos)
            && graph.is_water(first)
            && graph.direct_edges(pos, first, TransportClass::Water).next().is_some()
        {
            return MoveKind::Water;
        }
        let via_shortcut = graph
            .cheapest_edge(pos, first)
            .is_some_and(|ix| graph.edge(ix).class == TransportClass::Shortcut);
        if !via_shortcut {
            return MoveKind::Normal;
        }
        // A shortcut an ordinary move would duplicate is usually not worth
        // a card; keep it occasionally so shortcut use stays unreadable.
        if route::normal_one_move(graph, pos, first, &state.pursuers) {
            let whim: f32 = rng.tactic().r#gen();
            if whim >= self.cfg.shortcut_whim_chance {
                return MoveKind::Normal;
            }
        }
        MoveKind::Shortcut
    }

    /// Whether pursuers are close enough to justify burning a rapid
    /// transit. Uses raw edge counts: the pursuers do not share the
    /// fugitive's weighted view of the streets.
    fn should_rapid_transit(&self, graph: &BoardGraph, state: &HuntState) -> bool {
        if !state.tactics.available(MoveKind::RapidTransit) {
            return false;
        }
        let pos = state.pos.expect("fugitive has a position while planning");
        let mut closest = u32::MAX;
        let mut sum = 0u32;
        for &pursuer in &state.pursuers {
            let d = route::edge_count_distance(graph, pos, pursuer).unwrap_or(u32::MAX);
            closest = closest.min(d);
            sum = sum.saturating_add(d);
        }
        let average = sum as f32 / state.pursuers.len() as f32;

        (closest < self.cfg.rapid_closest_threshold && state.on_evidence())
            || average < self.cfg.rapid_average_threshold
            || (state.targets.len() == 1 && average < self.cfg.rapid_final_average_threshold)
    }

    /// Plan a rapid transit: roll through pursuers if need be, but never
    /// over water or through a shortcut. Returns `None` when no route to
    /// the goal exists even so.
    fn plan_rapid_transit(
        &self,
        graph: &mut BoardGraph,
        state: &HuntState,
        rng: &RngBundle,
    ) -> Option<TurnPlan> {
        let pos = state.pos.expect("fugitive has a position while planning");
        let target = state
            .active_target
            .expect("planning pass always selects a target");

        let sealed = bias::block_classes(
            graph,
            &[TransportClass::Water, TransportClass::Shortcut],
        );
        let mut chosen: Option<(Path, u32)> = None;
        for &deterrent in &self.cfg.deterrent_ladder {
            let deter =
                bias::discourage_pursuers(graph, &state.pursuers, deterrent, self.cfg);
            let tree = route::shortest_tree(graph, pos);
            let path = (tree.distance(target) < BLOCKED_WEIGHT)
                .then(|| route::sample_path(graph, &tree, target, &mut *rng.route()))
                .flatten();
            deter.revert(graph);

            if let Some(path) = path {
                let cost = move_cost(graph, &path);
                chosen = Some((path, cost));
                let affordable = i64::from(cost)
                    <= i64::from(self.cfg.turn_limit) - i64::from(state.turn_count());
                if affordable {
                    break;
                }
            }
        }
        sealed.revert(graph);

        chosen.map(|(path, cost)| TurnPlan {
            kind: MoveKind::RapidTransit,
            path,
            cost,
        })
    }

    /// Pick the rapid transit's replacement second hop: a destination one
    /// move away that is neither the goal nor the spot just vacated.
    pub(crate) fn escape_hop(
        &self,
        graph: &BoardGraph,
        rng: &RngBundle,
        from: NodeId,
        prior: NodeId,
        goal: NodeId,
    ) -> Option<NodeId> {
        let candidates: SmallVec<[NodeId; 8]> = route::nodes_within(graph, from, 1.0)
            .into_iter()
            .filter_map(|(node, d)| {
                ((d - 1.0).abs() <= DIST_EPS
                    && graph.is_destination(node)
                    && node != prior
                    && node != goal)
                    .then_some(node)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = rng.tactic().gen_range(0..candidates.len());
        Some(candidates[pick])
    }
}

/// A move's cost is the number of destinations entered along the path:
/// crossings are waypoints, not stops.
pub(crate) fn move_cost(graph: &BoardGraph, path: &Path) -> u32 {
    let stops = path.iter().filter(|&&n| graph.is_destination(n)).count() as u32;
    stops.saturating_sub(1)
}

/// First destination after the path's origin.
pub(crate) fn first_destination(graph: &BoardGraph, path: &Path) -> Option<NodeId> {
    path.iter()
        .skip(1)
        .copied()
        .find(|&n| graph.is_destination(n))
}

/// Second destination after the path's origin.
pub(crate) fn second_destination(graph: &BoardGraph, path: &Path) -> Option<NodeId> {
    path.iter()
        .skip(1)
        .copied()
        .filter(|&n| graph.is_destination(n))
        .nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardSpec, EdgeSpec, NodeKind, NodeSpec};
    use crate::constants::DEFAULT_TACTIC_WEIGHT;
    use crate::state::GamePhase;

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

    fn street(a: &str, b: &str) -> [EdgeSpec; 2] {
        // Destination-to-crossing street pair with the usual asymmetric
        // weights: free to leave a destination, one move to enter it.
        [
            link(a, b, 0.0, TransportClass::Normal),
            link(b, a, 1.0, TransportClass::Normal),
        ]
    }

    /// Corridor fixture: s = c1 = mid = c2 = goal, plus a shortcut
    /// mid ~ goal and a far-off crossing for parking pursuers.
    fn corridor() -> (BoardGraph, HuntState) {
        let spec = BoardSpec {
            nodes: vec![
                node("s", NodeKind::Destination, false),
                node("mid", NodeKind::Destination, false),
                node("goal", NodeKind::Destination, false),
                node("c1", NodeKind::Crossing, false),
                node("c2", NodeKind::Crossing, false),
                node("far", NodeKind::Crossing, false),
                node("annex", NodeKind::Destination, false),
            ],
            edges: [
                street("s", "c1").to_vec(),
                street("mid", "c1").to_vec(),
                street("mid", "c2").to_vec(),
                street("goal", "c2").to_vec(),
                street("annex", "far").to_vec(),
                street("goal", "far").to_vec(),
                vec![
                    link("mid", "goal", DEFAULT_TACTIC_WEIGHT, TransportClass::Shortcut),
                    link("goal", "mid", DEFAULT_TACTIC_WEIGHT, TransportClass::Shortcut),
                ],
            ]
            .concat(),
            quadrants: [
                vec!["s".to_string()],
                vec!["mid".to_string()],
                vec!["goal".to_string()],
                vec!["annex".to_string()],
            ],
            starting_pursuers: ["far".to_string(), "far".to_string(), "far".to_string()],
        };
        let graph = spec.build().unwrap();
        let far = graph.node_id("far").unwrap();
        let mut state = HuntState::new([far, far, far]);
        state.phase = GamePhase::InProgress;
        (graph, state)
    }

    #[test]
    fn picks_cheapest_target_and_normal_path() {
        let (mut graph, mut state) = corridor();
        let cfg = HuntConfig::default_config();
        let rng = RngBundle::from_user_seed(5);
        let s = graph.node_id("s").unwrap();
        let goal = graph.node_id("goal").unwrap();
        let mid = graph.node_id("mid").unwrap();
        state.pos = Some(s);
        state.targets = vec![goal, mid];
        state.path_used = vec![s];

        let baseline = graph.weight_snapshot();
        let decision = TurnKernel::new(&cfg).decide(&mut graph, &mut state, &rng);
        assert_eq!(graph.weight_snapshot(), baseline);
        let TurnDecision::Plan(plan) = decision else {
            panic!("open corridor must yield a plan");
        };
        assert_eq!(state.active_target, Some(mid), "mid is one move closer");
        assert_eq!(plan.kind, MoveKind::Normal);
        assert_eq!(plan.cost, 1);
        assert_eq!(first_destination(&graph, &plan.path), Some(mid));
    }

    #[test]
    fn cornered_without_rapid_transit_is_cannot_move() {
        let (mut graph, mut state) = corridor();
        let cfg = HuntConfig::default_config();
        let rng = RngBundle::from_user_seed(5);
        let s = graph.node_id("s").unwrap();
        let c1 = graph.node_id("c1").unwrap();
        let goal = graph.node_id("goal").unwrap();
        state.pos = Some(s);
        state.targets = vec![goal];
        state.path_used = vec![s];
        state.pursuers = [c1, c1, c1];
        state.tactics.record(MoveKind::RapidTransit, 1);
        state.tactics.record(MoveKind::RapidTransit, 2);

        let baseline = graph.weight_snapshot();
        let decision = TurnKernel::new(&cfg).decide(&mut graph, &mut state, &rng);
        assert!(matches!(decision, TurnDecision::CannotMove));
        assert_eq!(
            graph.weight_snapshot(),
            baseline,
            "cornered early return must leave no residue"
        );
    }

    #[test]
    fn cornered_with_rapid_transit_rolls_through() {
        let (mut graph, mut state) = corridor();
        let cfg = HuntConfig::default_config();
        let rng = RngBundle::from_user_seed(5);
        let s = graph.node_id("s").unwrap();
        let c1 = graph.node_id("c1").unwrap();
        let goal = graph.node_id("goal").unwrap();
        state.pos = Some(s);
        state.targets = vec![goal];
        state.path_used = vec![s];
        state.pursuers = [c1, c1, c1];

        let baseline = graph.weight_snapshot();
        let decision = TurnKernel::new(&cfg).decide(&mut graph, &mut state, &rng);
        assert_eq!(graph.weight_snapshot(), baseline);
        let TurnDecision::Plan(plan) = decision else {
            panic!("a rapid transit should still be on the table");
        };
        assert_eq!(plan.kind, MoveKind::RapidTransit);
    }

    #[test]
    fn illegal_shortcut_onto_goal_is_replanned() {
        let (mut graph, mut state) = corridor();
        let cfg = HuntConfig::default_config();
        let s = graph.node_id("s").unwrap();
        let mid = graph.node_id("mid").unwrap();
        let goal = graph.node_id("goal").unwrap();
        let c2 = graph.node_id("c2").unwrap();
        // Pursuer on c2 makes the street route to the goal expensive enough
        // that the shortcut would win -- but it may not land on the goal.
        state.pos = Some(mid);
        state.targets = vec![goal];
        state.path_used = vec![s, mid];
        state.pursuers = [c2, c2, c2];

        for seed in 0..16 {
            let rng = RngBundle::from_user_seed(seed);
            let baseline = graph.weight_snapshot();
            let decision = TurnKernel::new(&cfg).decide(&mut graph, &mut state, &rng);
            assert_eq!(graph.weight_snapshot(), baseline);
            if let TurnDecision::Plan(plan) = decision {
                assert!(
                    !(plan.kind == MoveKind::Shortcut
                        && first_destination(&graph, &plan.path) == Some(goal)),
                    "seed {seed} shortcut onto the goal"
                );
            }
        }
    }

    #[test]
    fn water_hop_classifies_as_water() {
        let spec = BoardSpec {
            nodes: vec![
                node("w1", NodeKind::Destination, true),
                node("w2", NodeKind::Destination, true),
                node("dry", NodeKind::Destination, false),
                node("c1", NodeKind::Crossing, false),
            ],
            edges: [
                street("w1", "c1").to_vec(),
                street("dry", "c1").to_vec(),
                street("w2", "c1").to_vec(),
                vec![
                    link("w1", "w2", DEFAULT_TACTIC_WEIGHT, TransportClass::Water),
                    link("w2", "w1", DEFAULT_TACTIC_WEIGHT, TransportClass::Water),
                ],
            ]
            .concat(),
            quadrants: [
                vec!["w1".to_string()],
                vec!["w2".to_string()],
                vec!["dry".to_string()],
                vec!["dry".to_string()],
            ],
            starting_pursuers: ["c1".to_string(), "c1".to_string(), "c1".to_string()],
        };
        let mut graph = spec.build().unwrap();
        let w1 = graph.node_id("w1").unwrap();
        let w2 = graph.node_id("w2").unwrap();
        let c1 = graph.node_id("c1").unwrap();
        let cfg = HuntConfig::default_config();
        let rng = RngBundle::from_user_seed(11);
        let mut state = HuntState::new([c1, c1, c1]);
        state.phase = GamePhase::InProgress;
        state.pos = Some(w1);
        state.targets = vec![w2];
        state.path_used = vec![w1];
        // The pursuer parked on the only crossing forces the river, and a
        // rapid transit must not preempt it: spend both first.
        state.tactics.record(MoveKind::RapidTransit, 1);
        state.tactics.record(MoveKind::RapidTransit, 2);

        let decision = TurnKernel::new(&cfg).decide(&mut graph, &mut state, &rng);
        let TurnDecision::Plan(plan) = decision else {
            panic!("the river is open");
        };
        assert_eq!(plan.kind, MoveKind::Water);
        assert_eq!(first_destination(&graph, &plan.path), Some(w2));
    }

    #[test]
    fn escape_hop_avoids_goal_and_prior() {
        let (graph, _) = corridor();
        let cfg = HuntConfig::default_config();
        let kernel = TurnKernel::new(&cfg);
        let rng = RngBundle::from_user_seed(3);
        let goal = graph.node_id("goal").unwrap();
        let mid = graph.node_id("mid").unwrap();
        let annex = graph.node_id("annex").unwrap();
        let s = graph.node_id("s").unwrap();

        // The goal's one-move destinations are exactly mid and annex.
        let hop = kernel.escape_hop(&graph, &rng, goal, annex, s);
        assert_eq!(hop, Some(mid), "only mid survives the exclusions");
        let trapped = kernel.escape_hop(&graph, &rng, goal, mid, annex);
        assert_eq!(trapped, None, "excluding both neighbors leaves nothing");
    }
}
