//! QTE Events
//!
//! Signals for the presentation layer, queued during a tick and drained by
//! the host.

use serde::{Serialize, Deserialize};

use crate::core::time::Tick;
use crate::qte::spec::{ChallengeKind, InputHandle};
use crate::qte::tier::{Completion, CompletionEntry, CompletionTier};

/// Why a sequence ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every challenge (and loop pass) ran.
    Completed,
    /// A `stop_on_failure` challenge failed.
    StoppedOnFailure,
    /// Internal invariant violation; contained and logged.
    Fault,
    /// Host cancelled the sequence.
    Aborted,
}

/// How a challenge left its active window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Window ran out.
    Timeout,
    /// Target pressed on a single-press challenge.
    Hit,
    /// Wrong input on a strict challenge.
    Misinput,
    /// Torn down by the sequence (abort or fault).
    Cancelled,
}

/// Final snapshot of a sequence run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceSummary {
    /// Results in execution order.
    pub entries: Vec<CompletionEntry>,
    /// Best graded tier.
    pub best_tier: Option<CompletionTier>,
}

/// Event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QteEventData {
    /// Sequence started.
    SequenceStarted {
        sequence: String,
        challenge_count: usize,
        pass_count: u32,
    },

    /// Sequence ended.
    SequenceEnded {
        sequence: String,
        reason: EndReason,
        summary: SequenceSummary,
    },

    /// Challenge armed; carries what the prompt and animation need.
    ChallengeStarted {
        index: usize,
        loop_pass: u32,
        kind: ChallengeKind,
        target: InputHandle,
        animation: String,
        duration_ticks: u32,
    },

    /// Challenge left its active window.
    ChallengeEnded {
        index: usize,
        loop_pass: u32,
        completion: Completion,
        resolution: Resolution,
    },

    /// Challenge graded above `Failed`.
    ChallengeSucceeded {
        index: usize,
        tier: CompletionTier,
    },

    /// Challenge graded `Failed`.
    ChallengeFailed {
        index: usize,
    },

    /// Live grade of the active challenge went up.
    CompletionTierChanged {
        tier: CompletionTier,
    },
}

/// An event with the tick it was raised on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QteEvent {
    /// Tick when event occurred
    pub tick: Tick,

    /// Event data
    pub data: QteEventData,
}

impl QteEvent {
    /// Create a new event.
    pub fn new(tick: Tick, data: QteEventData) -> Self {
        Self { tick, data }
    }

    /// Create sequence started event.
    pub fn sequence_started(tick: Tick, sequence: &str, challenge_count: usize, pass_count: u32) -> Self {
        Self::new(
            tick,
            QteEventData::SequenceStarted {
                sequence: sequence.to_string(),
                challenge_count,
                pass_count,
            },
        )
    }

    /// Create sequence ended event.
    pub fn sequence_ended(tick: Tick, sequence: &str, reason: EndReason, summary: SequenceSummary) -> Self {
        Self::new(
            tick,
            QteEventData::SequenceEnded {
                sequence: sequence.to_string(),
                reason,
                summary,
            },
        )
    }

    /// Create challenge ended event.
    pub fn challenge_ended(
        tick: Tick,
        index: usize,
        loop_pass: u32,
        completion: Completion,
        resolution: Resolution,
    ) -> Self {
        Self::new(
            tick,
            QteEventData::ChallengeEnded {
                index,
                loop_pass,
                completion,
                resolution,
            },
        )
    }

    /// Create tier changed event.
    pub fn tier_changed(tick: Tick, tier: CompletionTier) -> Self {
        Self::new(tick, QteEventData::CompletionTierChanged { tier })
    }

    /// Whether this is a sequence end.
    pub fn is_sequence_end(&self) -> bool {
        matches!(self.data, QteEventData::SequenceEnded { .. })
    }
}
