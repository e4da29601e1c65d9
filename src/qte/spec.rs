//! Authored Challenge and Sequence Definitions
//!
//! Static configuration, read-only during play. Runtime results never live
//! here; they go to the [`CompletionRecord`](crate::qte::tier::CompletionRecord)
//! of the sequence in flight.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::qte::error::ConfigError;
use crate::qte::tier::Thresholds;

// =============================================================================
// INPUTS
// =============================================================================

/// Name of an input action (e.g. `"south"`, `"attack_left"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputHandle(String);

impl InputHandle {
    /// Create a handle from an action name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Action name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InputHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Prompt sprites for one input device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptIcon {
    /// Icon shown while the input is up.
    pub idle: String,
    /// Icon shown while the input is held.
    pub pressed: String,
}

/// An acceptable input together with its per-device prompt icons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBinding {
    /// Input action.
    pub handle: InputHandle,
    /// One icon pair per input device, indexed by device.
    #[serde(default)]
    pub icons: Vec<PromptIcon>,
}

impl InputBinding {
    /// Binding without icons.
    pub fn new(handle: impl Into<InputHandle>) -> Self {
        Self {
            handle: handle.into(),
            icons: Vec::new(),
        }
    }

    /// Add an icon pair for the next device slot.
    pub fn with_icon(mut self, idle: impl Into<String>, pressed: impl Into<String>) -> Self {
        self.icons.push(PromptIcon {
            idle: idle.into(),
            pressed: pressed.into(),
        });
        self
    }

    /// Icon for `device`, falling back to the first device.
    pub fn icon_for_device(&self, device: usize) -> Option<&PromptIcon> {
        self.icons.get(device).or_else(|| self.icons.first())
    }
}

impl From<&str> for InputBinding {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// =============================================================================
// CHALLENGE
// =============================================================================

/// Challenge variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Press the target as many times as possible before the window closes.
    SustainedMash,
    /// Press the target; any other acceptable input fails the challenge.
    StrictSingle,
    /// Press the target; other inputs are ignored.
    LenientSingle,
}

/// One timed input challenge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSpec {
    /// Variant.
    pub kind: ChallengeKind,

    /// Acceptable inputs. One of them becomes the target on each attempt.
    pub inputs: Vec<InputBinding>,

    /// Presses needed for a rate of 1.0 (mash only).
    #[serde(default)]
    pub required_presses: u32,

    /// Score thresholds (mash only).
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Active window length in milliseconds.
    pub duration_ms: u32,

    /// End the sequence if this challenge fails.
    #[serde(default)]
    pub stop_on_failure: bool,

    /// Wrong presses reduce challenge-end damage (mash only).
    #[serde(default)]
    pub fail_reduces_damage: bool,

    /// Hit every target when this challenge resolves.
    #[serde(default)]
    pub inflict_damage_on_end: bool,
}

impl ChallengeSpec {
    fn with_kind(kind: ChallengeKind, inputs: Vec<InputBinding>, duration_ms: u32) -> Self {
        Self {
            kind,
            inputs,
            required_presses: 0,
            thresholds: Thresholds::default(),
            duration_ms,
            stop_on_failure: false,
            fail_reduces_damage: false,
            inflict_damage_on_end: false,
        }
    }

    /// Mash challenge.
    pub fn mash(inputs: Vec<InputBinding>, required_presses: u32, duration_ms: u32) -> Self {
        Self {
            required_presses,
            ..Self::with_kind(ChallengeKind::SustainedMash, inputs, duration_ms)
        }
    }

    /// Strict single-press challenge.
    pub fn strict(inputs: Vec<InputBinding>, duration_ms: u32) -> Self {
        Self::with_kind(ChallengeKind::StrictSingle, inputs, duration_ms)
    }

    /// Lenient single-press challenge.
    pub fn lenient(inputs: Vec<InputBinding>, duration_ms: u32) -> Self {
        Self::with_kind(ChallengeKind::LenientSingle, inputs, duration_ms)
    }

    /// Override thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set `stop_on_failure`.
    pub fn stop_on_failure(mut self) -> Self {
        self.stop_on_failure = true;
        self
    }

    /// Set `fail_reduces_damage`.
    pub fn fail_reduces_damage(mut self) -> Self {
        self.fail_reduces_damage = true;
        self
    }

    /// Set `inflict_damage_on_end`.
    pub fn inflict_damage_on_end(mut self) -> Self {
        self.inflict_damage_on_end = true;
        self
    }

    /// Check authoring constraints. `index` is only used for diagnostics.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::EmptyInputs { index });
        }
        if self.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration { index });
        }
        if !self.thresholds.is_valid() {
            return Err(ConfigError::InvalidThreshold { index });
        }
        if !self.thresholds.is_ascending() {
            let Thresholds { ok, good, great, perfect } = self.thresholds;
            return Err(ConfigError::NonAscendingThresholds { index, ok, good, great, perfect });
        }
        if self.kind == ChallengeKind::SustainedMash && self.required_presses == 0 {
            return Err(ConfigError::ZeroRequiredPresses { index });
        }
        Ok(())
    }
}

// =============================================================================
// SEQUENCE
// =============================================================================

/// Ordered, optionally looping list of challenges run as one combat action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceSpec {
    /// Display name.
    pub name: String,

    /// Attack this sequence drives; selects the start animation.
    #[serde(default)]
    pub attack_name: String,

    /// Challenges in order.
    pub challenges: Vec<ChallengeSpec>,

    /// Repeat the whole list after the last challenge.
    #[serde(default, rename = "loop")]
    pub loop_sequence: bool,

    /// Extra passes when looping.
    #[serde(default)]
    pub loop_count: u32,

    /// Hit every target once the sequence ends.
    #[serde(default)]
    pub inflict_damage_on_sequence_end: bool,
}

impl SequenceSpec {
    /// Non-looping sequence.
    pub fn new(name: impl Into<String>, challenges: Vec<ChallengeSpec>) -> Self {
        Self {
            name: name.into(),
            attack_name: String::new(),
            challenges,
            loop_sequence: false,
            loop_count: 0,
            inflict_damage_on_sequence_end: false,
        }
    }

    /// Set the attack name.
    pub fn with_attack(mut self, attack_name: impl Into<String>) -> Self {
        self.attack_name = attack_name.into();
        self
    }

    /// Loop `loop_count` extra times.
    pub fn looping(mut self, loop_count: u32) -> Self {
        self.loop_sequence = true;
        self.loop_count = loop_count;
        self
    }

    /// Set `inflict_damage_on_sequence_end`.
    pub fn inflict_damage_on_end(mut self) -> Self {
        self.inflict_damage_on_sequence_end = true;
        self
    }

    /// Number of passes over the challenge list.
    pub fn pass_count(&self) -> u32 {
        if self.loop_sequence {
            self.loop_count.saturating_add(1)
        } else {
            1
        }
    }

    /// Upper bound on completion entries for one run.
    pub fn max_record_len(&self) -> usize {
        self.challenges.len() * self.pass_count() as usize
    }

    /// Animation trigger fired when a challenge starts.
    pub fn animation_trigger(&self) -> String {
        format!("StartQTE{}", self.attack_name)
    }

    /// Validate every challenge. Fails on the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.challenges.is_empty() {
            return Err(ConfigError::EmptySequence {
                sequence: self.name.clone(),
            });
        }
        for (index, challenge) in self.challenges.iter().enumerate() {
            challenge.validate(index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(names: &[&str]) -> Vec<InputBinding> {
        names.iter().map(|n| InputBinding::from(*n)).collect()
    }

    #[test]
    fn test_validate_ok() {
        let seq = SequenceSpec::new(
            "combo",
            vec![
                ChallengeSpec::mash(inputs(&["a"]), 10, 2000),
                ChallengeSpec::lenient(inputs(&["a", "b"]), 1000),
            ],
        );
        assert!(seq.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_sequence() {
        let seq = SequenceSpec::new("nothing", vec![]);
        assert!(matches!(seq.validate(), Err(ConfigError::EmptySequence { .. })));
    }

    #[test]
    fn test_validate_empty_inputs() {
        let seq = SequenceSpec::new(
            "bad",
            vec![
                ChallengeSpec::lenient(inputs(&["a"]), 1000),
                ChallengeSpec::lenient(vec![], 1000),
            ],
        );
        assert!(matches!(seq.validate(), Err(ConfigError::EmptyInputs { index: 1 })));
    }

    #[test]
    fn test_validate_zero_presses() {
        let challenge = ChallengeSpec::mash(inputs(&["a"]), 0, 1000);
        assert!(matches!(challenge.validate(0), Err(ConfigError::ZeroRequiredPresses { index: 0 })));

        // Only mash challenges care about presses
        assert!(ChallengeSpec::strict(inputs(&["a"]), 1000).validate(0).is_ok());
    }

    #[test]
    fn test_validate_thresholds() {
        let descending = Thresholds { ok: 0.5, good: 0.4, great: 0.8, perfect: 0.9 };
        let challenge = ChallengeSpec::mash(inputs(&["a"]), 5, 1000).with_thresholds(descending);
        assert!(matches!(challenge.validate(2), Err(ConfigError::NonAscendingThresholds { index: 2, .. })));

        let nan = Thresholds { ok: f32::NAN, ..Thresholds::default() };
        let challenge = ChallengeSpec::mash(inputs(&["a"]), 5, 1000).with_thresholds(nan);
        assert!(matches!(challenge.validate(0), Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn test_validate_zero_duration() {
        let challenge = ChallengeSpec::lenient(inputs(&["a"]), 0);
        assert!(matches!(challenge.validate(0), Err(ConfigError::ZeroDuration { .. })));
    }

    #[test]
    fn test_record_bounds() {
        let challenges = vec![
            ChallengeSpec::lenient(inputs(&["a"]), 1000),
            ChallengeSpec::lenient(inputs(&["b"]), 1000),
        ];
        let once = SequenceSpec::new("once", challenges.clone());
        assert_eq!(once.pass_count(), 1);
        assert_eq!(once.max_record_len(), 2);

        // loop_count without the loop flag is ignored
        let mut flagless = once.clone();
        flagless.loop_count = 5;
        assert_eq!(flagless.pass_count(), 1);

        let looped = SequenceSpec::new("twice", challenges).looping(1);
        assert_eq!(looped.pass_count(), 2);
        assert_eq!(looped.max_record_len(), 4);
    }

    #[test]
    fn test_icon_fallback() {
        let binding = InputBinding::new("south")
            .with_icon("pad_a", "pad_a_down")
            .with_icon("key_space", "key_space_down");

        assert_eq!(binding.icon_for_device(1).unwrap().idle, "key_space");
        assert_eq!(binding.icon_for_device(7).unwrap().idle, "pad_a");
        assert!(InputBinding::new("x").icon_for_device(0).is_none());
    }

    #[test]
    fn test_deserialize_sequence() {
        let json = r#"{
            "name": "Cleave",
            "attack_name": "Cleave",
            "loop": true,
            "loop_count": 2,
            "challenges": [
                { "kind": "sustained_mash", "inputs": [{ "handle": "south" }],
                  "required_presses": 12, "duration_ms": 3000, "stop_on_failure": true }
            ]
        }"#;

        let seq: SequenceSpec = serde_json::from_str(json).unwrap();
        assert!(seq.loop_sequence);
        assert_eq!(seq.loop_count, 2);
        assert_eq!(seq.challenges[0].kind, ChallengeKind::SustainedMash);
        assert_eq!(seq.challenges[0].thresholds, Thresholds::default());
        assert!(seq.challenges[0].stop_on_failure);
        assert_eq!(seq.animation_trigger(), "StartQTECleave");
        assert!(seq.validate().is_ok());
    }
}
