//! Observer hook decoupling the core from presentation.
//!
//! The core never prints or draws; it hands each notable moment to a single
//! caller-supplied callback. Narrative events carry a stable key alongside
//! display text so frontends can localize or filter without string-matching
//! prose.

use crate::board::NodeId;
use crate::state::MoveKind;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Something worth telling the players, keyed for machine handling.
    Narrative { key: &'static str, text: String },
    /// The board display should be refreshed.
    RedrawRequested,
    /// The fugitive announced a special move, as the rules require.
    TacticUsed(MoveKind),
    /// A crime was discovered and a fresh round has begun.
    NewRound { crime: NodeId },
}

/// Single-callback observer; registered on the session.
pub type EventSink = Box<dyn FnMut(&GameEvent)>;
