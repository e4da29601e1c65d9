//! QTE Sequence Engine
//!
//! Runs an attack's quick-time-event sequence: arms each challenge, routes
//! chat/controller input to it, grades the result and tells combat when to
//! deal damage and end the turn.
//!
//! ## Module Structure
//!
//! - `spec`: Sequence and challenge descriptions (data only)
//! - `tier`: Completion tiers, thresholds, per-sequence record
//! - `resolver`: Target-input selection
//! - `timer`: Tick-based challenge timer
//! - `input`: Input routing and scoped subscriptions
//! - `challenge`: The three challenge kinds
//! - `sequence`: Challenge ordering, looping, stop-on-failure
//! - `engine`: Host-facing frame loop
//! - `combat` / `presentation`: Collaborator seams
//! - `events`: Signals for the host and replay

pub mod challenge;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod input;
pub mod presentation;
pub mod resolver;
pub mod sequence;
pub mod spec;
pub mod tier;
pub mod timer;

#[cfg(test)]
mod testing;

// Re-export key types
pub use challenge::ActiveChallenge;
pub use combat::{ActingUnit, AttackContext, CombatSystem, DamageSource, UnitId};
pub use config::{EngineConfig, SequenceLibrary};
pub use engine::{QteEngine, TickResult};
pub use error::{ConfigError, QteError};
pub use events::{EndReason, QteEvent, QteEventData, Resolution};
pub use input::{InputEvent, InputPhase, InputRouter};
pub use presentation::{LogPresentation, Presentation};
pub use sequence::SequenceController;
pub use spec::{ChallengeKind, ChallengeSpec, InputBinding, InputHandle, SequenceSpec};
pub use tier::{Completion, CompletionRecord, CompletionTier, Thresholds};
