//! Gaslight Game Engine
//!
//! Platform-agnostic core for the hidden-movement pursuit game Gaslight:
//! the autonomous fugitive that silently draws destinations, plans routes
//! across a weighted street network, spends its scarce tactics, and leaves
//! a trail the pursuers can interrogate. This crate provides all movement
//! and round logic without UI or platform-specific dependencies; boards
//! come in as data and everything observable goes out through a single
//! event callback.
//!
//! The weighted board is the engine's one shared mutable resource. Planning
//! passes bias it and must restore it before returning; the bias layer
//! makes that a structural guarantee rather than a calling convention.

pub mod arbiter;
pub mod bias;
pub mod board;
pub mod config;
pub mod constants;
pub mod demo;
pub mod events;
pub mod rng;
pub mod route;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use bias::{BiasToken, PoisonToken};
pub use board::{
    BoardError, BoardGraph, BoardSpec, Edge, EdgeIx, EdgeSpec, Node, NodeId, NodeKind,
    NodeSpec, TransportClass,
};
pub use config::HuntConfig;
pub use demo::demo_board;
pub use events::{EventSink, GameEvent};
pub use rng::{CountingRng, RngBundle};
pub use session::FugitiveSession;
pub use state::{GamePhase, HuntState, LossCause, MoveKind, StatusReport, TacticLog};
