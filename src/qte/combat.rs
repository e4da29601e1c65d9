//! Combat System Interface
//!
//! The turn-based combat system is external. The engine only asks it who is
//! acting, hands it damage, and tells it when the turn is over.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::qte::tier::CompletionTier;

/// Combat unit identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub [u8; 16]);

impl UnitId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Random unit id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for UnitId {
    /// Short hex form for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..4]))
    }
}

/// The unit whose turn it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActingUnit {
    /// Unit id.
    pub id: UnitId,
    /// Final attack value after the combat system's own modifiers.
    pub attack: u32,
}

/// What triggered a damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    /// A challenge with `inflict_damage_on_end` resolved.
    ChallengeEnd {
        /// Challenge index.
        index: usize,
        /// Grade, if the challenge was graded.
        tier: Option<CompletionTier>,
    },
    /// A sequence with `inflict_damage_on_sequence_end` ended.
    SequenceEnd {
        /// Best grade of the run.
        best_tier: Option<CompletionTier>,
    },
}

/// Context passed with every damage application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackContext {
    /// Attack the sequence belongs to.
    pub attack_name: String,
    /// Trigger.
    pub source: DamageSource,
    /// Multiplier already applied to the amount.
    pub damage_scale: f32,
}

/// External turn-based combat system.
pub trait CombatSystem {
    /// Unit currently taking its turn.
    fn current_acting_unit(&self) -> Option<ActingUnit>;

    /// Deal `amount` damage to `target`.
    fn apply_damage(&mut self, target: UnitId, amount: u32, context: &AttackContext);

    /// The acting unit's turn is over.
    fn end_turn(&mut self);
}

/// Scale an attack value, rounding to the nearest point.
pub fn scaled_damage(attack: u32, scale: f32) -> u32 {
    if !scale.is_finite() || scale <= 0.0 {
        return 0;
    }
    (attack as f64 * scale as f64).round().min(u32::MAX as f64) as u32
}
