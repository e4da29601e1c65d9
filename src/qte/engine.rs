//! Engine Frame Loop
//!
//! Host-facing facade. The host calls [`QteEngine::frame`] once per frame
//! with the input edges it observed; the engine routes them, advances its
//! clock, polls the active challenge's timer and returns the signals raised.

use std::sync::Arc;

use tracing::trace;

use crate::core::time::Tick;
use crate::qte::challenge::ActiveChallenge;
use crate::qte::combat::{CombatSystem, UnitId};
use crate::qte::config::EngineConfig;
use crate::qte::error::{ConfigError, QteError};
use crate::qte::events::QteEvent;
use crate::qte::input::{InputEvent, InputPhase, ListenerRole};
use crate::qte::presentation::Presentation;
use crate::qte::sequence::SequenceController;
use crate::qte::spec::{InputHandle, SequenceSpec};
use crate::qte::tier::CompletionRecord;

/// Result of a frame.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick the frame ended on.
    pub tick: Tick,
    /// Signals raised since the previous frame.
    pub events: Vec<QteEvent>,
    /// A sequence ended during this frame.
    pub sequence_ended: bool,
}

/// QTE engine bound to its combat and presentation collaborators.
pub struct QteEngine<C, P> {
    controller: SequenceController<C, P>,
    tick: Tick,
}

impl<C: CombatSystem, P: Presentation> QteEngine<C, P> {
    /// Create an idle engine at tick 0.
    ///
    /// Rejects tuning the engine cannot run with (zero tick rate, damage
    /// floor outside `0..=1`, negative penalty).
    pub fn new(config: EngineConfig, combat: C, presentation: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            controller: SequenceController::new(config, combat, presentation),
            tick: 0,
        })
    }

    /// Current tick.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Underlying controller.
    pub fn controller(&self) -> &SequenceController<C, P> {
        &self.controller
    }

    /// Combat collaborator.
    pub fn combat(&self) -> &C {
        self.controller.combat()
    }

    /// Combat collaborator (mutable).
    pub fn combat_mut(&mut self) -> &mut C {
        self.controller.combat_mut()
    }

    /// Presentation collaborator.
    pub fn presentation(&self) -> &P {
        self.controller.presentation()
    }

    /// A sequence is in flight.
    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Active challenge, if any.
    pub fn active_challenge(&self) -> Option<&ActiveChallenge> {
        self.controller.active_challenge()
    }

    /// Input the player must press right now.
    pub fn active_target(&self) -> Option<&InputHandle> {
        self.active_challenge().map(|c| c.target().handle())
    }

    /// Results of the sequence in flight.
    pub fn record(&self) -> &CompletionRecord {
        self.controller.record()
    }

    /// Live input subscriptions.
    pub fn active_listener_count(&self) -> usize {
        self.controller.router().active_count()
    }

    /// Replace the target-selection RNG seed.
    pub fn reseed(&mut self, seed: u64) {
        self.controller.reseed(seed);
    }

    /// Set the opponents this action targets.
    pub fn set_targets(&mut self, targets: Vec<UnitId>) {
        self.controller.set_targets(targets);
    }

    /// Start a sequence at the current tick.
    pub fn start_sequence(&mut self, spec: impl Into<Arc<SequenceSpec>>) -> Result<(), QteError> {
        self.controller.start(spec, self.tick)
    }

    /// Route one input edge.
    ///
    /// Returns `false` when no listener wanted it; such events are dropped
    /// without touching any state.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let mut roles = self.controller.router().listeners_for(event);
        if roles.is_empty() {
            trace!(input = %event.handle, phase = ?event.phase, "unrouted input discarded");
            return false;
        }
        roles.sort();
        roles.dedup();

        for role in roles {
            // An earlier role may have torn the challenge down
            if !self.controller.router().listeners_for(event).contains(&role) {
                continue;
            }
            match role {
                ListenerRole::Prompt => {
                    let pressed = event.phase == InputPhase::Pressed;
                    self.controller.presentation_mut().set_prompt_pressed(pressed);
                }
                ListenerRole::KeyPress => {
                    self.controller.handle_key_press(&event.handle, self.tick);
                }
            }
        }
        true
    }

    /// Advance one tick: poll the timer and drain signals.
    pub fn tick(&mut self) -> TickResult {
        self.tick += 1;
        self.controller.poll(self.tick);

        let events = self.controller.take_events();
        let sequence_ended = events.iter().any(QteEvent::is_sequence_end);
        TickResult {
            tick: self.tick,
            events,
            sequence_ended,
        }
    }

    /// Apply this frame's inputs, then tick.
    pub fn frame(&mut self, inputs: &[InputEvent]) -> TickResult {
        for input in inputs {
            self.handle_input(input);
        }
        self.tick()
    }

    /// Drain signals raised outside a frame (e.g. by `start_sequence`).
    pub fn take_events(&mut self) -> Vec<QteEvent> {
        self.controller.take_events()
    }

    /// Cancel the running sequence (host shutdown, battle aborted).
    pub fn abort(&mut self) {
        self.controller.abort(self.tick);
    }
}
