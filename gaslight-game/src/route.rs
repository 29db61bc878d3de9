//! Weighted shortest-path queries over the board graph.
//!
//! Distances are computed under whatever weights are currently applied, so
//! the bias engine steers the planner purely through the graph. When several
//! paths tie for minimum cost, one is drawn uniformly at random from the
//! predecessor DAG, which keeps the fugitive's routes unpredictable while
//! staying reproducible under a seeded stream.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rand::Rng;
use smallvec::SmallVec;

use crate::board::{BoardGraph, NodeId, TransportClass};
use crate::constants::DIST_EPS;

/// A node sequence from origin to target, origin included.
pub type Path = SmallVec<[NodeId; 16]>;

/// Single-source shortest distances plus the tied-predecessor sets needed
/// to enumerate every minimum-cost path.
#[derive(Debug, Clone)]
pub struct ShortestTree {
    origin: NodeId,
    dist: Vec<f32>,
    preds: Vec<SmallVec<[NodeId; 4]>>,
}

impl ShortestTree {
    #[must_use]
    pub const fn origin(&self) -> NodeId {
        self.origin
    }

    /// Weighted distance from the origin; `f32::INFINITY` when unreachable.
    #[must_use]
    pub fn distance(&self, to: NodeId) -> f32 {
        self.dist[to.0 as usize]
    }
}

#[derive(PartialEq)]
struct Cost(f32);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Dijkstra from `from` under current weights, recording every tied
/// predecessor.
#[must_use]
pub fn shortest_tree(graph: &BoardGraph, from: NodeId) -> ShortestTree {
    let n = graph.node_count();
    let mut dist = vec![f32::INFINITY; n];
    let mut preds: Vec<SmallVec<[NodeId; 4]>> = vec![SmallVec::new(); n];
    dist[from.0 as usize] = 0.0;

    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), u))) = heap.pop() {
        if cost > dist[u.0 as usize] + DIST_EPS {
            continue;
        }
        for (_, edge) in graph.out_edges(u) {
            let v = edge.to;
            let next = cost + edge.weight;
            let best = dist[v.0 as usize];
            if next + DIST_EPS < best {
                dist[v.0 as usize] = next;
                preds[v.0 as usize].clear();
                preds[v.0 as usize].push(u);
                heap.push(Reverse((Cost(next), v)));
            } else if (next - best).abs() <= DIST_EPS && !preds[v.0 as usize].contains(&u) {
                preds[v.0 as usize].push(u);
            }
        }
    }

    ShortestTree {
        origin: from,
        dist,
        preds,
    }
}

/// Weighted distance between two nodes under current weights.
#[must_use]
pub fn distance(graph: &BoardGraph, from: NodeId, to: NodeId) -> f32 {
    shortest_tree(graph, from).distance(to)
}

/// Draw one path to `to`, uniformly among all minimum-cost paths.
///
/// Returns `None` when the target is unreachable. Uniformity comes from
/// weighting each backward step by the count of shortest paths through the
/// candidate predecessor.
#[must_use]
pub fn sample_path(
    graph: &BoardGraph,
    tree: &ShortestTree,
    to: NodeId,
    rng: &mut impl Rng,
) -> Option<Path> {
    if !tree.distance(to).is_finite() {
        return None;
    }

    // Path counts accumulate in ascending distance order.
    let mut order: Vec<NodeId> = (0..graph.node_count() as u16)
        .map(NodeId)
        .filter(|n| tree.dist[n.0 as usize].is_finite())
        .collect();
    order.sort_by(|a, b| tree.dist[a.0 as usize].total_cmp(&tree.dist[b.0 as usize]));

    let mut count = vec![0.0f64; graph.node_count()];
    count[tree.origin.0 as usize] = 1.0;
    for &v in &order {
        if v == tree.origin {
            continue;
        }
        count[v.0 as usize] = tree.preds[v.0 as usize]
            .iter()
            .map(|p| count[p.0 as usize])
            .sum();
    }

    let mut path: Path = SmallVec::new();
    let mut cur = to;
    path.push(cur);
    while cur != tree.origin {
        let preds = &tree.preds[cur.0 as usize];
        let total: f64 = preds.iter().map(|p| count[p.0 as usize]).sum();
        if total <= 0.0 {
            return None;
        }
        let mut draw = rng.r#gen::<f64>() * total;
        let mut chosen = *preds.last()?;
        for &p in preds {
            draw -= count[p.0 as usize];
            if draw <= 0.0 {
                chosen = p;
                break;
            }
        }
        path.push(chosen);
        cur = chosen;
    }
    path.reverse();
    Some(path)
}

/// Enumerate every minimum-cost path to `to`, in no particular order.
/// Intended for diagnostics and tests; [`sample_path`] draws from the same
/// set without materializing it.
#[must_use]
pub fn equal_shortest_paths(tree: &ShortestTree, to: NodeId) -> Vec<Path> {
    if !tree.distance(to).is_finite() {
        return Vec::new();
    }
    let mut paths = Vec::new();
    let mut stack: Path = SmallVec::new();
    stack.push(to);
    walk_preds(tree, &mut stack, &mut paths);
    paths
}

fn walk_preds(tree: &ShortestTree, stack: &mut Path, out: &mut Vec<Path>) {
    let cur = *stack.last().expect("stack is never empty");
    if cur == tree.origin {
        let mut path = stack.clone();
        path.reverse();
        out.push(path);
        return;
    }
    for &pred in &tree.preds[cur.0 as usize] {
        stack.push(pred);
        walk_preds(tree, stack, out);
        stack.pop();
    }
}

/// Every node within `limit` weighted distance of `from`, with its distance.
#[must_use]
pub fn nodes_within(graph: &BoardGraph, from: NodeId, limit: f32) -> Vec<(NodeId, f32)> {
    let tree = shortest_tree(graph, from);
    (0..graph.node_count() as u16)
        .map(NodeId)
        .filter_map(|n| {
            let d = tree.distance(n);
            (d <= limit + DIST_EPS).then_some((n, d))
        })
        .collect()
}

/// Unweighted edge-count distance, every transport class included. This is
/// the pursuers' notion of closeness when the fugitive weighs a rapid
/// transit.
#[must_use]
pub fn edge_count_distance(graph: &BoardGraph, from: NodeId, to: NodeId) -> Option<u32> {
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    seen[from.0 as usize] = true;
    queue.push_back((from, 0u32));
    while let Some((u, d)) = queue.pop_front() {
        if u == to {
            return Some(d);
        }
        for (_, edge) in graph.out_edges(u) {
            if !seen[edge.to.0 as usize] {
                seen[edge.to.0 as usize] = true;
                queue.push_back((edge.to, d + 1));
            }
        }
    }
    None
}

/// True when a single ordinary move reaches `to` from `from`: a route over
/// Normal-class edges that passes only through unoccupied crossings.
#[must_use]
pub fn normal_one_move(
    graph: &BoardGraph,
    from: NodeId,
    to: NodeId,
    occupied: &[NodeId],
) -> bool {
    let mut seen = vec![false; graph.node_count()];
    let mut stack = vec![from];
    seen[from.0 as usize] = true;
    while let Some(u) = stack.pop() {
        for (_, edge) in graph.out_edges(u) {
            if edge.class != TransportClass::Normal {
                continue;
            }
            let v = edge.to;
            if v == to {
                return true;
            }
            if !graph.is_destination(v) && !seen[v.0 as usize] && !occupied.contains(&v) {
                seen[v.0 as usize] = true;
                stack.push(v);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardSpec, EdgeSpec, NodeKind, NodeSpec};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn dest(name: &str) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            kind: NodeKind::Destination,
            water: false,
            position: None,
        }
    }

    fn crossing(name: &str) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            kind: NodeKind::Crossing,
            water: false,
            position: None,
        }
    }

    fn link(from: &str, to: &str, weight: f32) -> EdgeSpec {
        EdgeSpec {
            from: from.to_string(),
            to: to.to_string(),
            weight,
            class: TransportClass::Normal,
        }
    }

    /// Two equal-cost crossing routes between "a" and "b".
    fn diamond() -> BoardGraph {
        BoardSpec {
            nodes: vec![dest("a"), dest("b"), crossing("c1"), crossing("c2")],
            edges: vec![
                link("a", "c1", 0.0),
                link("c1", "a", 1.0),
                link("a", "c2", 0.0),
                link("c2", "a", 1.0),
                link("c1", "b", 1.0),
                link("b", "c1", 0.0),
                link("c2", "b", 1.0),
                link("b", "c2", 0.0),
            ],
            quadrants: [
                vec!["a".to_string()],
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
    fn distances_count_moves() {
        let g = diamond();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        assert_eq!(distance(&g, a, b), 1.0);
        assert_eq!(distance(&g, a, a), 0.0);
    }

    #[test]
    fn sample_path_covers_both_tied_routes() {
        let g = diamond();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        let c1 = g.node_id("c1").unwrap();
        let c2 = g.node_id("c2").unwrap();
        let tree = shortest_tree(&g, a);

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut via = [false, false];
        for _ in 0..64 {
            let path = sample_path(&g, &tree, b, &mut rng).unwrap();
            assert_eq!(path.first(), Some(&a));
            assert_eq!(path.last(), Some(&b));
            assert_eq!(path.len(), 3);
            if path[1] == c1 {
                via[0] = true;
            } else if path[1] == c2 {
                via[1] = true;
            }
        }
        assert!(via[0] && via[1], "both tied routes should be drawn");
    }

    #[test]
    fn enumeration_matches_the_tie_count() {
        let g = diamond();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        let tree = shortest_tree(&g, a);
        let paths = equal_shortest_paths(&tree, b);
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path.first(), Some(&a));
            assert_eq!(path.last(), Some(&b));
        }
    }

    #[test]
    fn unreachable_is_infinite_and_unsampled() {
        let g = BoardSpec {
            nodes: vec![dest("a"), dest("b"), crossing("c")],
            edges: vec![],
            quadrants: [
                vec!["a".to_string()],
                vec!["a".to_string()],
                vec!["b".to_string()],
                vec!["b".to_string()],
            ],
            starting_pursuers: ["c".to_string(), "c".to_string(), "c".to_string()],
        }
        .build()
        .unwrap();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        assert!(distance(&g, a, b).is_infinite());
        let tree = shortest_tree(&g, a);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(sample_path(&g, &tree, b, &mut rng).is_none());
    }

    #[test]
    fn edge_count_ignores_weights() {
        let g = diamond();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        assert_eq!(edge_count_distance(&g, a, b), Some(2));
    }

    #[test]
    fn one_move_reach_respects_occupied_crossings() {
        let g = diamond();
        let a = g.node_id("a").unwrap();
        let b = g.node_id("b").unwrap();
        let c1 = g.node_id("c1").unwrap();
        let c2 = g.node_id("c2").unwrap();
        assert!(normal_one_move(&g, a, b, &[]));
        assert!(normal_one_move(&g, a, b, &[c1]));
        assert!(!normal_one_move(&g, a, b, &[c1, c2]));
    }
}
