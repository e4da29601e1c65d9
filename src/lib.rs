//! # QTE Engine
//!
//! Quick-time-event sequences for a chat-driven, turn-based battle game.
//! An attack plays out as a sequence of short challenges; how well the
//! player (or chat) presses the prompted inputs decides the damage dealt.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QTE ENGINE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/              - Deterministic primitives               │
//! │  ├── rng.rs         - Xorshift128+ PRNG, turn seeding        │
//! │  └── time.rs        - Ticks and millisecond conversion       │
//! │                                                              │
//! │  qte/               - Sequence engine                        │
//! │  ├── spec.rs        - Sequence / challenge descriptions      │
//! │  ├── config.rs      - Engine config, sequence library        │
//! │  ├── tier.rs        - Scoring and completion record          │
//! │  ├── resolver.rs    - Target-input selection                 │
//! │  ├── timer.rs       - Challenge timer                        │
//! │  ├── input.rs       - Input routing, scoped subscriptions    │
//! │  ├── challenge.rs   - Mash / strict / lenient challenges     │
//! │  ├── sequence.rs    - Sequence controller                    │
//! │  ├── engine.rs      - Host frame loop                        │
//! │  ├── combat.rs      - Combat system seam                     │
//! │  ├── presentation.rs- Prompt display seam                    │
//! │  └── events.rs      - Signals                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Time is counted in ticks polled by the host, never read from a clock.
//! Target inputs are drawn from a seeded Xorshift128+ so a turn can be
//! replayed from its seed and input log.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod qte;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::time::Tick;
pub use qte::{
    CombatSystem, CompletionTier, EngineConfig, InputEvent, Presentation, QteEngine, QteEvent,
    SequenceLibrary, SequenceSpec,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine tick rate (Hz)
pub const TICK_RATE: u32 = 60;
