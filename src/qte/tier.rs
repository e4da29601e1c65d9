//! Scoring Engine and Completion Record
//!
//! Converts a mash success rate into a discrete tier and keeps the ordered
//! list of per-challenge results for the sequence in flight.

use serde::{Serialize, Deserialize};

// =============================================================================
// TIERS
// =============================================================================

/// Discrete performance grade, totally ordered from worst to best.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CompletionTier {
    /// Below the ok threshold.
    #[default]
    Failed = 0,
    /// Ok.
    Ok = 1,
    /// Good.
    Good = 2,
    /// Great.
    Great = 3,
    /// Perfect.
    Perfect = 4,
}

impl CompletionTier {
    /// All tiers in ascending order.
    pub const ALL: [CompletionTier; 5] = [
        CompletionTier::Failed,
        CompletionTier::Ok,
        CompletionTier::Good,
        CompletionTier::Great,
        CompletionTier::Perfect,
    ];

    /// Anything above `Failed`.
    #[inline]
    pub fn is_success(self) -> bool {
        self != CompletionTier::Failed
    }
}

/// Ascending tier thresholds on the success rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lowest rate graded `Ok`.
    pub ok: f32,
    /// Lowest rate graded `Good`.
    pub good: f32,
    /// Lowest rate graded `Great`.
    pub great: f32,
    /// Lowest rate graded `Perfect`.
    pub perfect: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ok: 0.3,
            good: 0.6,
            great: 0.8,
            perfect: 0.95,
        }
    }
}

impl Thresholds {
    /// All thresholds finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.ok, self.good, self.great, self.perfect]
            .iter()
            .all(|t| t.is_finite() && *t >= 0.0)
    }

    /// `ok <= good <= great <= perfect`.
    pub fn is_ascending(&self) -> bool {
        self.ok <= self.good && self.good <= self.great && self.great <= self.perfect
    }

    /// Grade a success rate.
    ///
    /// Buckets are half-open: a rate equal to a threshold lands in the
    /// bucket that threshold opens. NaN grades as `Failed`.
    pub fn tier(&self, rate: f32) -> CompletionTier {
        if rate >= self.perfect {
            CompletionTier::Perfect
        } else if rate >= self.great {
            CompletionTier::Great
        } else if rate >= self.good {
            CompletionTier::Good
        } else if rate >= self.ok {
            CompletionTier::Ok
        } else {
            CompletionTier::Failed
        }
    }
}

/// Ratio of correct presses to required presses.
#[inline]
pub fn success_rate(presses: u32, required: u32) -> f32 {
    if required == 0 {
        return 0.0;
    }
    presses as f32 / required as f32
}

// =============================================================================
// COMPLETION RECORD
// =============================================================================

/// Result of one executed challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Graded result.
    Scored(CompletionTier),
    /// Challenge ran but produces no grade (strict challenge timing out).
    NoResult,
}

impl Completion {
    /// Tier, if graded.
    pub fn tier(self) -> Option<CompletionTier> {
        match self {
            Completion::Scored(tier) => Some(tier),
            Completion::NoResult => None,
        }
    }

    /// Graded `Failed`.
    pub fn is_failed(self) -> bool {
        self == Completion::Scored(CompletionTier::Failed)
    }
}

/// One record entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    /// Loop pass (0 for the first pass).
    pub loop_pass: u32,
    /// Challenge index within the sequence.
    pub index: usize,
    /// Result.
    pub completion: Completion,
}

/// Ordered results of the sequence in flight. One entry per executed
/// challenge, empty outside an active sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    entries: Vec<CompletionEntry>,
}

impl CompletionRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, loop_pass: u32, index: usize, completion: Completion) {
        self.entries.push(CompletionEntry {
            loop_pass,
            index,
            completion,
        });
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&CompletionEntry> {
        self.entries.last()
    }

    /// Entry for a specific challenge execution.
    pub fn get(&self, loop_pass: u32, index: usize) -> Option<&CompletionEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.loop_pass == loop_pass && e.index == index)
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[CompletionEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Graded tiers, skipping `NoResult`.
    pub fn tiers(&self) -> impl Iterator<Item = CompletionTier> + '_ {
        self.entries.iter().filter_map(|e| e.completion.tier())
    }

    /// Best graded tier.
    pub fn best_tier(&self) -> Option<CompletionTier> {
        self.tiers().max()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
