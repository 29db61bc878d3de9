//! Built-in demonstration board: a small grid city with a river run along
//! its southern edge, a handful of back-alley shortcuts, and a downtown
//! arcade of linked crossings.
//!
//! Destinations form a 4x6 grid named "1".."24"; a crossing sits at each
//! interior street corner ("c1".."c15") joining its four surrounding
//! destinations. Street edges carry the usual asymmetric weights (free to
//! leave a destination, one move to enter), so weighted distance equals the
//! number of moves.

use std::sync::OnceLock;

use crate::board::{BoardSpec, EdgeSpec, NodeKind, NodeSpec, TransportClass};
use crate::constants::DEFAULT_TACTIC_WEIGHT;

const GRID_ROWS: usize = 4;
const GRID_COLS: usize = 6;

/// Riverside destinations served by the ferry run.
const WATER_STOPS: &[&str] = &["19", "20", "23", "24"];

/// Back alleys. "2"-"9" deliberately duplicates an ordinary one-move
/// route, which exercises the shortcut whim rule.
const SHORTCUT_PAIRS: &[(&str, &str)] = &[("2", "9"), ("4", "17"), ("7", "20"), ("12", "23")];

/// Downtown arcade: crossings chained so one move can slide past two
/// corners.
const ARCADE_LINKS: &[(&str, &str)] = &[("c7", "c8"), ("c8", "c9")];

const STARTING_PURSUERS: [&str; 3] = ["c7", "c8", "c9"];

const QUADRANTS: [&[&str]; 4] = [
    &["1", "2", "3", "7", "8", "9"],
    &["4", "5", "6", "10", "11", "12"],
    &["13", "14", "15", "19", "20", "21"],
    &["16", "17", "18", "22", "23", "24"],
];

fn dest_name(row: usize, col: usize) -> String {
    (row * GRID_COLS + col + 1).to_string()
}

fn crossing_name(row: usize, col: usize) -> String {
    format!("c{}", row * (GRID_COLS - 1) + col + 1)
}

/// The demo city, built once and shared.
pub fn demo_board() -> &'static BoardSpec {
    static SPEC: OnceLock<BoardSpec> = OnceLock::new();
    SPEC.get_or_init(build_demo_spec)
}

#[allow(clippy::cast_precision_loss)]
fn build_demo_spec() -> BoardSpec {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let name = dest_name(row, col);
            nodes.push(NodeSpec {
                water: WATER_STOPS.contains(&name.as_str()),
                name,
                kind: NodeKind::Destination,
                position: Some((col as f32 * 120.0, row as f32 * 120.0)),
            });
        }
    }

    for row in 0..GRID_ROWS - 1 {
        for col in 0..GRID_COLS - 1 {
            let corner = crossing_name(row, col);
            nodes.push(NodeSpec {
                name: corner.clone(),
                kind: NodeKind::Crossing,
                water: false,
                position: Some((col as f32 * 120.0 + 60.0, row as f32 * 120.0 + 60.0)),
            });
            for (dr, dc) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                let stop = dest_name(row + dr, col + dc);
                edges.push(street(&stop, &corner, 0.0));
                edges.push(street(&corner, &stop, 1.0));
            }
        }
    }

    for &(a, b) in ARCADE_LINKS {
        edges.push(street(a, b, 0.0));
        edges.push(street(b, a, 0.0));
    }

    for &from in WATER_STOPS {
        for &to in WATER_STOPS {
            if from != to {
                edges.push(EdgeSpec {
                    from: from.to_string(),
                    to: to.to_string(),
                    weight: DEFAULT_TACTIC_WEIGHT,
                    class: TransportClass::Water,
                });
            }
        }
    }

    for &(a, b) in SHORTCUT_PAIRS {
        for (from, to) in [(a, b), (b, a)] {
            edges.push(EdgeSpec {
                from: from.to_string(),
                to: to.to_string(),
                weight: DEFAULT_TACTIC_WEIGHT,
                class: TransportClass::Shortcut,
            });
        }
    }

    BoardSpec {
        nodes,
        edges,
        quadrants: QUADRANTS.map(|q| q.iter().map(ToString::to_string).collect()),
        starting_pursuers: STARTING_PURSUERS.map(ToString::to_string),
    }
}

fn street(from: &str, to: &str, weight: f32) -> EdgeSpec {
    EdgeSpec {
        from: from.to_string(),
        to: to.to_string(),
        weight,
        class: TransportClass::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route;

    #[test]
    fn demo_board_validates() {
        let graph = demo_board().build().unwrap();
        assert_eq!(graph.node_count(), 24 + 15);
        for quadrant in graph.quadrants() {
            assert_eq!(quadrant.len(), 6);
        }
    }

    #[test]
    fn river_stops_are_water_destinations() {
        let graph = demo_board().build().unwrap();
        for name in WATER_STOPS {
            let id = graph.node_id(name).unwrap();
            assert!(graph.is_destination(id));
            assert!(graph.is_water(id));
        }
    }

    #[test]
    fn streets_measure_moves() {
        let graph = demo_board().build().unwrap();
        let a = graph.node_id("1").unwrap();
        let b = graph.node_id("8").unwrap();
        // "1" and "8" share the corner c1: one move.
        assert_eq!(route::distance(&graph, a, b), 1.0);
        // Opposite corners of the city are a short diagonal walk.
        let z = graph.node_id("24").unwrap();
        assert_eq!(route::distance(&graph, a, z), 3.0);
    }

    #[test]
    fn redundant_shortcut_has_an_ordinary_twin() {
        let graph = demo_board().build().unwrap();
        let two = graph.node_id("2").unwrap();
        let nine = graph.node_id("9").unwrap();
        assert!(route::normal_one_move(&graph, two, nine, &[]));
        let four = graph.node_id("4").unwrap();
        let seventeen = graph.node_id("17").unwrap();
        assert!(!route::normal_one_move(&graph, four, seventeen, &[]));
    }
}
