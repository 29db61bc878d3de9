//! Round state, tactic accounting, and the game lifecycle.

use serde::{Deserialize, Serialize};

use crate::board::NodeId;
use crate::constants::TACTIC_USES;

/// Game lifecycle. `InProgress` begins on reset; `Won` means all four
/// destinations were committed; `Lost` carries its cause in
/// [`HuntState::loss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

/// Why a game ended in the pursuers' favor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    /// A pursuer called an arrest on the fugitive's exact position.
    Arrested,
    /// Every exit was sealed and no rapid transit could be played.
    CannotMove,
    /// The remaining turn budget cannot cover the distance left.
    OutOfTime,
    /// A rapid transit had no legal non-destination second hop.
    RapidTransitTrapped,
}

/// How the fugitive travels on a given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Normal,
    Water,
    Shortcut,
    RapidTransit,
}

/// Spend record for the three scarce tactics. Each entry is the turn index
/// at which a use was burned, so a list's length is its usage count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticLog {
    water: Vec<u32>,
    shortcut: Vec<u32>,
    rapid_transit: Vec<u32>,
}

impl TacticLog {
    fn slot(&self, kind: MoveKind) -> Option<&Vec<u32>> {
        match kind {
            MoveKind::Water => Some(&self.water),
            MoveKind::Shortcut => Some(&self.shortcut),
            MoveKind::RapidTransit => Some(&self.rapid_transit),
            MoveKind::Normal => None,
        }
    }

    /// Uses burned so far; ordinary moves always report zero.
    #[must_use]
    pub fn uses(&self, kind: MoveKind) -> usize {
        self.slot(kind).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn remaining(&self, kind: MoveKind) -> usize {
        TACTIC_USES.saturating_sub(self.uses(kind))
    }

    #[must_use]
    pub fn available(&self, kind: MoveKind) -> bool {
        self.remaining(kind) > 0
    }

    /// Turn indices at which the tactic was spent.
    #[must_use]
    pub fn spend_turns(&self, kind: MoveKind) -> &[u32] {
        self.slot(kind).map_or(&[], Vec::as_slice)
    }

    /// Record a spend. Recording an ordinary move is a programmer error.
    ///
    /// # Panics
    ///
    /// Panics when `kind` is [`MoveKind::Normal`] or the tactic is already
    /// exhausted.
    pub fn record(&mut self, kind: MoveKind, turn: u32) {
        assert!(self.available(kind), "tactic {kind:?} is exhausted");
        match kind {
            MoveKind::Water => self.water.push(turn),
            MoveKind::Shortcut => self.shortcut.push(turn),
            MoveKind::RapidTransit => self.rapid_transit.push(turn),
            MoveKind::Normal => unreachable!("ordinary moves are not tracked"),
        }
    }
}

/// Complete mutable state of one game from the fugitive's side.
#[derive(Debug, Clone)]
pub struct HuntState {
    pub phase: GamePhase,
    pub loss: Option<LossCause>,
    /// Hidden position; `None` until a game starts.
    pub pos: Option<NodeId>,
    /// Destination currently being worked toward; re-chosen every turn.
    pub active_target: Option<NodeId>,
    /// Destinations still to visit this game (one per quadrant at start).
    pub targets: Vec<NodeId>,
    /// Committed destinations, oldest first.
    pub crimes: Vec<NodeId>,
    /// Evidence revealed by clue searches since the last crime.
    pub clues: Vec<NodeId>,
    /// Ordered trail since the last crime, starting at that crime scene.
    pub path_used: Vec<NodeId>,
    pub tactics: TacticLog,
    /// Pursuer crossings; externally positioned, read-only to the core.
    pub pursuers: [NodeId; 3],
}

impl HuntState {
    #[must_use]
    pub fn new(pursuers: [NodeId; 3]) -> Self {
        Self {
            phase: GamePhase::NotStarted,
            loss: None,
            pos: None,
            active_target: None,
            targets: Vec::new(),
            crimes: Vec::new(),
            clues: Vec::new(),
            path_used: Vec::new(),
            tactics: TacticLog::default(),
            pursuers,
        }
    }

    /// Turns consumed in the current round, the round's starting
    /// destination included.
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        self.path_used.len() as u32
    }

    /// Whether the fugitive currently stands on revealed evidence: a found
    /// clue or the latest discovered crime scene.
    #[must_use]
    pub fn on_evidence(&self) -> bool {
        let Some(pos) = self.pos else {
            return false;
        };
        self.clues.contains(&pos) || self.crimes.last() == Some(&pos)
    }
}

/// Public snapshot for collaborators; everything a pursuer player is
/// allowed to know.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub phase: GamePhase,
    pub loss: Option<LossCause>,
    pub crimes: Vec<String>,
    pub clues: Vec<String>,
    pub pursuers: [String; 3],
    pub water_remaining: usize,
    pub shortcut_remaining: usize,
    pub rapid_transit_remaining: usize,
    pub turns_remaining: i64,
}
