//! Automated QA for the Gaslight fugitive core: seeded batch games against
//! the scripted pursuit in [`driver`], with per-move weight-baseline audits
//! and an aggregated win/loss report.

mod driver;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use gaslight_game::board::{EdgeIx, TransportClass};
use gaslight_game::demo::demo_board;
use gaslight_game::events::GameEvent;
use gaslight_game::session::FugitiveSession;
use gaslight_game::state::{GamePhase, LossCause, MoveKind};

use driver::PursuitDriver;

const BLOCKED_WEIGHT: f32 = 1000.0;
const MOVE_CAP: usize = 200;

#[derive(Debug, Parser)]
#[command(name = "gaslight-tester", version)]
#[command(about = "Automated QA for the Gaslight fugitive core - seeded logic runs")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per seed (each offsets the seed)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Moves between pursuer clue sweeps
    #[arg(long, default_value_t = 4)]
    sweep_interval: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Verbose output (narrates every game event)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct GameOutcome {
    seed: u64,
    phase: GamePhase,
    loss: Option<LossCause>,
    moves: usize,
    crimes: usize,
    clues: usize,
    water_used: usize,
    shortcut_used: usize,
    rapid_transit_used: usize,
    weights_clean: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let seeds = parse_seeds(&args.seeds)?;

    let mut outcomes = Vec::new();
    for &seed in &seeds {
        for iteration in 0..args.iterations.max(1) {
            let game_seed = seed.wrapping_add(iteration as u64 * 1009);
            outcomes.push(run_game(game_seed, &args));
        }
    }

    match args.report.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        _ => print_console_report(&outcomes),
    }

    if outcomes.iter().any(|o| !o.weights_clean) {
        bail!("weight baseline audit failed; see report");
    }
    Ok(())
}

fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().with_context(|| format!("bad seed {s:?}")))
        .collect()
}

fn run_game(seed: u64, args: &Args) -> GameOutcome {
    let mut session = FugitiveSession::new(demo_board(), seed)
        .expect("the built-in demo board is valid");
    if args.verbose {
        session.set_event_sink(Box::new(|event| match event {
            GameEvent::Narrative { key, text } => log::info!(target: "gaslight", "{key}: {text}"),
            GameEvent::TacticUsed(kind) => log::info!(target: "gaslight", "tactic: {kind:?}"),
            GameEvent::NewRound { .. } => log::info!(target: "gaslight", "new round"),
            GameEvent::RedrawRequested => {}
        }));
    }

    session.reset();
    let baseline = session.board().weight_snapshot();
    let mut pursuit = PursuitDriver::new(seed ^ 0x9E37_79B9, args.sweep_interval);
    let mut weights_clean = audit_weights(&session, &baseline);
    let mut moves = 1; // the silent first move happens inside reset

    while session.phase() == GamePhase::InProgress && moves < MOVE_CAP {
        pursuit.take_turn(&mut session);
        if session.phase() != GamePhase::InProgress {
            break; // an arrest landed
        }
        session.move_fugitive();
        moves += 1;
        weights_clean &= audit_weights(&session, &baseline);
    }

    let state = session.state();
    GameOutcome {
        seed,
        phase: session.phase(),
        loss: state.loss,
        moves,
        crimes: state.crimes.len(),
        clues: state.clues.len(),
        water_used: state.tactics.uses(MoveKind::Water),
        shortcut_used: state.tactics.uses(MoveKind::Shortcut),
        rapid_transit_used: state.tactics.uses(MoveKind::RapidTransit),
        weights_clean,
    }
}

/// Outside a planning pass the board must match its post-reset baseline,
/// except for tactic classes sealed by exhaustion.
fn audit_weights(session: &FugitiveSession, baseline: &[f32]) -> bool {
    let graph = session.board();
    let state = session.state();
    graph
        .weight_snapshot()
        .iter()
        .enumerate()
        .all(|(i, &w)| {
            let sealed = match graph.edge(EdgeIx(i as u32)).class {
                TransportClass::Water => state.tactics.remaining(MoveKind::Water) == 0,
                TransportClass::Shortcut => state.tactics.remaining(MoveKind::Shortcut) == 0,
                TransportClass::Normal => false,
            };
            if sealed {
                w >= BLOCKED_WEIGHT
            } else {
                w == baseline[i]
            }
        })
}

fn print_console_report(outcomes: &[GameOutcome]) {
    let total = outcomes.len();
    let won = outcomes.iter().filter(|o| o.phase == GamePhase::Won).count();
    let stalled = outcomes
        .iter()
        .filter(|o| o.phase == GamePhase::InProgress)
        .count();

    println!("{}", "Gaslight fugitive QA".bold());
    println!("  games:     {total}");
    println!(
        "  fugitive wins: {} ({}%)",
        won.to_string().green(),
        if total == 0 { 0 } else { won * 100 / total }
    );
    for cause in [
        LossCause::Arrested,
        LossCause::CannotMove,
        LossCause::OutOfTime,
        LossCause::RapidTransitTrapped,
    ] {
        let n = outcomes.iter().filter(|o| o.loss == Some(cause)).count();
        if n > 0 {
            println!("  lost ({cause:?}): {}", n.to_string().yellow());
        }
    }
    if stalled > 0 {
        println!("  {}: {stalled}", "hit the move cap".red());
    }

    let audits_failed = outcomes.iter().filter(|o| !o.weights_clean).count();
    if audits_failed > 0 {
        println!(
            "  {}: {audits_failed} games",
            "WEIGHT AUDIT FAILED".red().bold()
        );
    } else {
        println!("  weight audit: {}", "clean".green());
    }

    let avg_moves = if total == 0 {
        0
    } else {
        outcomes.iter().map(|o| o.moves).sum::<usize>() / total
    };
    let tactics: usize = outcomes
        .iter()
        .map(|o| o.water_used + o.shortcut_used + o.rapid_transit_used)
        .sum();
    println!("  avg moves: {avg_moves}");
    println!("  tactics spent across all games: {tactics}");
}
