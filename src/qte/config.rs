//! Engine Configuration and Sequence Library
//!
//! Sequences are authored offline as JSON and loaded once; the engine only
//! ever reads them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::TICK_RATE;
use crate::qte::error::ConfigError;
use crate::qte::spec::SequenceSpec;

/// Engine-wide tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host frame rate (Hz); converts authored milliseconds to ticks.
    pub tick_rate: u32,
    /// Input device whose prompt icons are shown.
    pub device_index: usize,
    /// Damage scale lost per penalised wrong press.
    pub misinput_penalty: f32,
    /// Lowest damage scale a penalised challenge can reach.
    pub min_damage_scale: f32,
    /// Seed for target selection.
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            device_index: 0,
            misinput_penalty: 0.1,
            min_damage_scale: 0.25,
            rng_seed: 0x5EED,
        }
    }
}

impl EngineConfig {
    /// Check the tuning values before any challenge uses them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if !(0.0..=1.0).contains(&self.min_damage_scale) {
            return Err(ConfigError::InvalidMinDamageScale {
                value: self.min_damage_scale,
            });
        }
        if !self.misinput_penalty.is_finite() || self.misinput_penalty < 0.0 {
            return Err(ConfigError::InvalidMisinputPenalty {
                value: self.misinput_penalty,
            });
        }
        Ok(())
    }
}

/// Authored sequences keyed by attack name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceLibrary {
    /// Engine tuning shipped with the content.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Sequences.
    pub sequences: BTreeMap<String, SequenceSpec>,
}

impl SequenceLibrary {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let library: Self = serde_json::from_str(json)?;
        library.validate()?;
        Ok(library)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let library = Self::from_json_str(&json)?;
        info!(path = %path.display(), sequences = library.sequences.len(), "sequence library loaded");
        Ok(library)
    }

    /// Validate the engine block and every sequence.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(err) = self.engine.validate() {
            warn!(error = %err, "invalid engine config");
            return Err(err);
        }
        for (name, sequence) in &self.sequences {
            sequence.validate().map_err(|source| {
                warn!(sequence = %name, error = %source, "invalid sequence");
                ConfigError::InSequence {
                    name: name.clone(),
                    source: Box::new(source),
                }
            })?;
        }
        Ok(())
    }

    /// Sequence for an attack.
    pub fn get(&self, attack: &str) -> Option<Arc<SequenceSpec>> {
        self.sequences.get(attack).cloned().map(Arc::new)
    }

    /// Attack names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }
}
