//! High-level session binding the board, round state, tuning, and RNG
//! streams behind the public surface collaborators call.

use std::rc::Rc;

use rand::Rng;

use crate::arbiter::{self, TurnDecision, TurnKernel, TurnPlan};
use crate::bias;
use crate::board::{BoardError, BoardGraph, BoardSpec, NodeId, TransportClass};
use crate::config::HuntConfig;
use crate::constants::{
    BLOCKED_WEIGHT, DEFAULT_TACTIC_WEIGHT, DIST_EPS, LOG_ARREST_MISSED, LOG_ARRESTED,
    LOG_CANNOT_MOVE, LOG_CLUE_EMPTY, LOG_CLUE_FOUND, LOG_CLUE_SEARCH, LOG_CRIME_DISCOVERED,
    LOG_GAME_WON, LOG_MOVED, LOG_NO_GAME, LOG_OUT_OF_TIME, LOG_PURSUERS_PLACED,
    LOG_RAPID_TRAPPED, LOG_TACTIC_RAPID, LOG_TACTIC_SHORTCUT, LOG_TACTIC_WATER,
};
use crate::events::{EventSink, GameEvent};
use crate::rng::RngBundle;
use crate::state::{GamePhase, HuntState, LossCause, MoveKind, StatusReport};

/// One fugitive game bound to a board. Strictly single-threaded and
/// synchronous: every public operation runs to completion before
/// returning, and the board is always back at its baseline weights when it
/// does.
pub struct FugitiveSession {
    board: BoardGraph,
    cfg: HuntConfig,
    state: HuntState,
    rng: Rc<RngBundle>,
    seed: u64,
    sink: Option<EventSink>,
}

impl FugitiveSession {
    /// Build a session over a validated board with default tuning.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] when the board description is invalid.
    pub fn new(spec: &BoardSpec, seed: u64) -> Result<Self, BoardError> {
        Self::with_config(spec, seed, HuntConfig::default_config())
    }

    /// Build a session with explicit tuning.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] when the board description is invalid.
    pub fn with_config(
        spec: &BoardSpec,
        seed: u64,
        cfg: HuntConfig,
    ) -> Result<Self, BoardError> {
        let board = spec.build()?;
        let state = HuntState::new(board.starting_pursuers());
        Ok(Self {
            board,
            cfg,
            state,
            rng: Rc::new(RngBundle::from_user_seed(seed)),
            seed,
            sink: None,
        })
    }

    /// Register the single observer callback. Replaces any prior sink.
    pub fn set_event_sink(&mut self, sink: EventSink) {
        self.sink = Some(sink);
    }

    /// Resolve a display name; `None` marks invalid caller input.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.board.node_id(name)
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        self.board.name(id)
    }

    #[must_use]
    pub const fn board(&self) -> &BoardGraph {
        &self.board
    }

    #[must_use]
    pub const fn state(&self) -> &HuntState {
        &self.state
    }

    /// Borrow the underlying mutable round state. Intended for scenario
    /// drivers and tests; ordinary play never needs it.
    pub const fn state_mut(&mut self) -> &mut HuntState {
        &mut self.state
    }

    /// Apply a closure to the mutable round state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut HuntState) -> R) -> R {
        f(&mut self.state)
    }

    #[must_use]
    pub const fn config(&self) -> &HuntConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Deterministically reseed the session's RNG streams.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Rc::new(RngBundle::from_user_seed(seed));
    }

    /// Start (or restart) a game: restore tactic weights, draw one
    /// destination per quadrant, and perform the fugitive's silent first
    /// move, which immediately announces the opening crime scene.
    /// Pursuer tokens keep their current placement.
    pub fn reset(&mut self) {
        self.state = HuntState::new(self.state.pursuers);
        self.state.phase = GamePhase::InProgress;
        self.board
            .set_class_weight(TransportClass::Water, DEFAULT_TACTIC_WEIGHT);
        self.board
            .set_class_weight(TransportClass::Shortcut, DEFAULT_TACTIC_WEIGHT);

        let rng = Rc::clone(&self.rng);
        for quadrant in self.board.quadrants() {
            let pick = quadrant[rng.targets().gen_range(0..quadrant.len())];
            self.state.targets.push(pick);
        }
        let start = self.state.targets[rng.targets().gen_range(0..self.state.targets.len())];
        self.state.active_target = Some(start);
        self.state.pos = Some(start);

        self.move_fugitive();
    }

    /// Take the fugitive's turn. Announces a discovered crime first (the
    /// rules reveal it only after the pursuers' turn), then plans and
    /// executes the move, then checks the remaining turn budget.
    pub fn move_fugitive(&mut self) {
        if self.state.phase != GamePhase::InProgress {
            self.emit(GameEvent::Narrative {
                key: LOG_NO_GAME,
                text: "No game in progress; start one before moving the fugitive.".to_string(),
            });
            return;
        }

        self.announce_reached_target();
        if self.state.targets.is_empty() {
            self.state.phase = GamePhase::Won;
            let crimes = self.name_list(&self.state.crimes);
            self.emit(GameEvent::Narrative {
                key: LOG_GAME_WON,
                text: format!("Game over, the fugitive won. Crime scenes: {crimes}."),
            });
            self.emit(GameEvent::RedrawRequested);
            return;
        }

        let rng = Rc::clone(&self.rng);
        let kernel = TurnKernel::new(&self.cfg);
        let decision = kernel.decide(&mut self.board, &mut self.state, &rng);
        match decision {
            TurnDecision::CannotMove => {
                self.state.phase = GamePhase::Lost;
                self.state.loss = Some(LossCause::CannotMove);
                self.emit(GameEvent::Narrative {
                    key: LOG_CANNOT_MOVE,
                    text: "The fugitive cannot move. The pursuers win.".to_string(),
                });
            }
            TurnDecision::Plan(plan) => self.apply_plan(&plan),
        }
    }

    /// Update the three pursuer tokens between turns.
    pub fn set_pursuers(&mut self, pursuers: [NodeId; 3]) {
        self.state.pursuers = pursuers;
        let names = self.name_list(&pursuers);
        self.emit(GameEvent::Narrative {
            key: LOG_PURSUERS_PLACED,
            text: format!("Pursuers now stand at {names}."),
        });
        self.emit(GameEvent::RedrawRequested);
    }

    /// Search the supplied locations, in order, against the fugitive's
    /// trail since the last crime. The first hit becomes a clue and ends
    /// the sweep. Does not advance the turn.
    pub fn clue_search(&mut self, locations: &[NodeId]) {
        let names = self.name_list(locations);
        self.emit(GameEvent::Narrative {
            key: LOG_CLUE_SEARCH,
            text: format!("Searching for clues at {names}."),
        });
        for &loc in locations {
            if self.state.path_used.contains(&loc) {
                self.state.clues.push(loc);
                self.emit(GameEvent::Narrative {
                    key: LOG_CLUE_FOUND,
                    text: format!("Clue found at {}!", self.board.name(loc)),
                });
                self.emit(GameEvent::RedrawRequested);
                break;
            }
            self.emit(GameEvent::Narrative {
                key: LOG_CLUE_EMPTY,
                text: format!("{}: no clue.", self.board.name(loc)),
            });
        }
    }

    /// Attempt an arrest. Hitting the fugitive's exact position ends the
    /// game in the pursuers' favor; anything else changes nothing.
    pub fn arrest(&mut self, location: NodeId) {
        if self.state.phase != GamePhase::InProgress {
            self.emit(GameEvent::Narrative {
                key: LOG_NO_GAME,
                text: "No game in progress.".to_string(),
            });
            return;
        }
        if self.state.pos == Some(location) {
            self.state.phase = GamePhase::Lost;
            self.state.loss = Some(LossCause::Arrested);
            let trail = self.name_list(&self.state.path_used);
            self.emit(GameEvent::Narrative {
                key: LOG_ARRESTED,
                text: format!(
                    "The fugitive was arrested at {}. The trail was: {trail}.",
                    self.board.name(location)
                ),
            });
            self.emit(GameEvent::RedrawRequested);
        } else {
            self.emit(GameEvent::Narrative {
                key: LOG_ARREST_MISSED,
                text: format!("The fugitive is not at {}.", self.board.name(location)),
            });
        }
    }

    /// Everything a pursuer player is allowed to know.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        let name = |id: &NodeId| self.board.name(*id).to_string();
        StatusReport {
            phase: self.state.phase,
            loss: self.state.loss,
            crimes: self.state.crimes.iter().map(name).collect(),
            clues: self.state.clues.iter().map(name).collect(),
            pursuers: self.state.pursuers.map(|id| self.board.name(id).to_string()),
            water_remaining: self.state.tactics.remaining(MoveKind::Water),
            shortcut_remaining: self.state.tactics.remaining(MoveKind::Shortcut),
            rapid_transit_remaining: self.state.tactics.remaining(MoveKind::RapidTransit),
            turns_remaining: i64::from(self.cfg.turn_limit) - i64::from(self.state.turn_count()),
        }
    }

    /// Announce a committed destination at the start of the next move and
    /// open the following round.
    fn announce_reached_target(&mut self) {
        let Some(pos) = self.state.pos else { return };
        // The active target is re-chosen every turn, so standing on any
        // still-uncommitted destination counts as reaching it.
        if !self.state.targets.contains(&pos) {
            return;
        }
        self.emit(GameEvent::Narrative {
            key: LOG_CRIME_DISCOVERED,
            text: format!(
                "A crime has been discovered at {} and the fugitive has moved on.",
                self.board.name(pos)
            ),
        });
        self.state.crimes.push(pos);
        self.state.path_used = vec![pos];
        self.state.targets.retain(|&t| t != pos);
        self.state.clues.clear();
        self.emit(GameEvent::NewRound { crime: pos });
    }

    fn apply_plan(&mut self, plan: &TurnPlan) {
        let target = self
            .state
            .active_target
            .expect("a plan always has an active target");

        // Spend water/shortcut up front; the class seals once exhausted,
        // after the already-planned move.
        match plan.kind {
            MoveKind::Water => self.spend_tactic(
                MoveKind::Water,
                LOG_TACTIC_WATER,
                "The fugitive took to the water",
            ),
            MoveKind::Shortcut => self.spend_tactic(
                MoveKind::Shortcut,
                LOG_TACTIC_SHORTCUT,
                "The fugitive slipped through a shortcut",
            ),
            MoveKind::Normal | MoveKind::RapidTransit => {}
        }

        let first = arbiter::first_destination(&self.board, &plan.path)
            .expect("an accepted plan reaches at least one destination");
        self.state.pos = Some(first);
        self.state.path_used.push(first);

        let water_ok = self.state.tactics.available(MoveKind::Water);
        let mut goal_distance =
            bias::relaxed_water_distance(&mut self.board, first, target, water_ok);

        if plan.kind == MoveKind::RapidTransit {
            self.state
                .tactics
                .record(MoveKind::RapidTransit, self.state.turn_count() - 1);
            self.emit(GameEvent::Narrative {
                key: LOG_TACTIC_RAPID,
                text: "The fugitive takes a rapid transit!".to_string(),
            });
            self.emit(GameEvent::TacticUsed(MoveKind::RapidTransit));

            // Second hop: from the plan when the goal is still far enough,
            // otherwise a random adjacent stop that is neither the goal nor
            // the spot just vacated.
            let prior = self.state.path_used[self.state.path_used.len() - 2];
            let planned = (goal_distance > 1.0 + DIST_EPS)
                .then(|| arbiter::second_destination(&self.board, &plan.path))
                .flatten();
            let rng = Rc::clone(&self.rng);
            let kernel = TurnKernel::new(&self.cfg);
            let second = planned
                .or_else(|| kernel.escape_hop(&self.board, &rng, first, prior, target));
            let Some(second) = second else {
                self.state.phase = GamePhase::Lost;
                self.state.loss = Some(LossCause::RapidTransitTrapped);
                self.emit(GameEvent::Narrative {
                    key: LOG_RAPID_TRAPPED,
                    text: "The fugitive took a rapid transit with the goal two stops away, \
                           found no other legal stop, and is trapped. The pursuers win."
                        .to_string(),
                });
                return;
            };
            self.state.pos = Some(second);
            self.state.path_used.push(second);
            goal_distance =
                bias::relaxed_water_distance(&mut self.board, second, target, water_ok);
        }

        let remaining =
            i64::from(self.cfg.turn_limit) - i64::from(self.state.turn_count());
        self.emit(GameEvent::Narrative {
            key: LOG_MOVED,
            text: format!("The fugitive has {remaining} moves remaining."),
        });
        self.emit(GameEvent::RedrawRequested);

        if (remaining as f32) + DIST_EPS < goal_distance {
            self.state.phase = GamePhase::Lost;
            self.state.loss = Some(LossCause::OutOfTime);
            self.emit(GameEvent::Narrative {
                key: LOG_OUT_OF_TIME,
                text: "The fugitive cannot reach the target with the moves left. \
                       The pursuers win."
                    .to_string(),
            });
        }
    }

    fn spend_tactic(&mut self, kind: MoveKind, key: &'static str, verb: &str) {
        let turn = self.state.turn_count();
        self.state.tactics.record(kind, turn);
        self.emit(GameEvent::Narrative {
            key,
            text: format!("{verb} on turn {turn}!"),
        });
        self.emit(GameEvent::TacticUsed(kind));
        if !self.state.tactics.available(kind) {
            let class = match kind {
                MoveKind::Water => TransportClass::Water,
                MoveKind::Shortcut => TransportClass::Shortcut,
                MoveKind::Normal | MoveKind::RapidTransit => return,
            };
            self.board.set_class_weight(class, BLOCKED_WEIGHT);
        }
    }

    fn name_list<'n>(&self, ids: impl IntoIterator<Item = &'n NodeId>) -> String {
        let names: Vec<&str> = ids.into_iter().map(|&id| self.board.name(id)).collect();
        names.join(", ")
    }

    fn emit(&mut self, event: GameEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&event);
        }
    }
}
