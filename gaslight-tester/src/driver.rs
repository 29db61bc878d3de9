//! Trivial scripted pursuit: three tokens that chase the latest piece of
//! evidence, sweep for clues around their posts, and occasionally call an
//! arrest. Deliberately naive; the point is to exercise the fugitive core
//! under plausible pressure, not to play well.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use gaslight_game::board::{BoardGraph, NodeId, TransportClass};
use gaslight_game::route;
use gaslight_game::session::FugitiveSession;

pub struct PursuitDriver {
    rng: SmallRng,
    /// Moves between clue sweeps.
    sweep_interval: usize,
    moves_seen: usize,
    clues_seen: usize,
}

impl PursuitDriver {
    pub fn new(seed: u64, sweep_interval: usize) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            sweep_interval: sweep_interval.max(1),
            moves_seen: 0,
            clues_seen: 0,
        }
    }

    /// One pursuer turn, taken after each fugitive move: chase, then sweep,
    /// then maybe strike.
    pub fn take_turn(&mut self, session: &mut FugitiveSession) {
        self.moves_seen += 1;
        self.chase(session);
        if self.moves_seen % self.sweep_interval == 0 {
            self.sweep(session);
        }
        self.maybe_arrest(session);
    }

    /// Step every pursuer one crossing toward the latest evidence.
    fn chase(&mut self, session: &mut FugitiveSession) {
        let state = session.state();
        let Some(goal) = state.clues.last().or(state.crimes.last()).copied() else {
            return;
        };
        let mut posts = state.pursuers;
        let graph = session.board();
        for post in &mut posts {
            if let Some(next) = next_crossing_toward(graph, *post, goal) {
                *post = next;
            }
        }
        session.set_pursuers(posts);
    }

    /// Search the destinations around each post, nearest post first.
    fn sweep(&mut self, session: &mut FugitiveSession) {
        let graph = session.board();
        let mut sweep: Vec<NodeId> = Vec::new();
        for post in session.state().pursuers {
            for (node, d) in route::nodes_within(graph, post, 1.0) {
                if d > 0.0 && graph.is_destination(node) && !sweep.contains(&node) {
                    sweep.push(node);
                }
            }
        }
        session.clue_search(&sweep);
    }

    /// After a fresh clue, try an arrest at one of the spots next to the
    /// clue scene. Misses are cheap; the fugitive only narrates them.
    fn maybe_arrest(&mut self, session: &mut FugitiveSession) {
        let clues = session.state().clues.len();
        if clues <= self.clues_seen {
            return;
        }
        self.clues_seen = clues;
        let scene = *session.state().clues.last().expect("a clue was just found");
        let graph = session.board();
        let nearby: Vec<NodeId> = route::nodes_within(graph, scene, 1.0)
            .into_iter()
            .filter(|&(node, _)| graph.is_destination(node))
            .map(|(node, _)| node)
            .collect();
        if nearby.is_empty() {
            return;
        }
        let pick = nearby[self.rng.gen_range(0..nearby.len())];
        session.arrest(pick);
    }
}

/// First crossing along an ordinary-street path toward `goal`; `None` when
/// there is nowhere better to stand.
fn next_crossing_toward(graph: &BoardGraph, from: NodeId, goal: NodeId) -> Option<NodeId> {
    if from == goal {
        return None;
    }
    let mut parent: Vec<Option<NodeId>> = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();
    parent[from.0 as usize] = Some(from);
    queue.push_back(from);
    while let Some(u) = queue.pop_front() {
        if u == goal {
            break;
        }
        for (_, edge) in graph.out_edges(u) {
            if edge.class == TransportClass::Normal && parent[edge.to.0 as usize].is_none() {
                parent[edge.to.0 as usize] = Some(u);
                queue.push_back(edge.to);
            }
        }
    }
    parent[goal.0 as usize]?;

    // Walk back from the goal, then take the first crossing on the way out.
    let mut path = vec![goal];
    let mut cur = goal;
    while cur != from {
        cur = parent[cur.0 as usize].expect("reached nodes have parents");
        path.push(cur);
    }
    path.reverse();
    path.into_iter()
        .skip(1)
        .find(|&n| !graph.is_destination(n))
}
