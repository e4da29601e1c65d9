//! Challenge State Machine
//!
//! Runs one challenge: `Idle -> Armed -> AwaitingInput -> Resolved -> Idle`.
//! `Idle` is the absence of an [`ActiveChallenge`]; `Resolved` consumes it.
//!
//! The challenge owns its input subscriptions and its timer, so dropping it
//! on any path (hit, misinput, timeout, abort) releases both.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::core::time::{millis_from_ticks, ticks_from_millis, Tick};
use crate::qte::config::EngineConfig;
use crate::qte::combat::{scaled_damage, AttackContext, CombatSystem, DamageSource, UnitId};
use crate::qte::events::{QteEvent, QteEventData, Resolution};
use crate::qte::input::{InputPhase, InputRouter, InputSubscription, ListenerRole};
use crate::qte::presentation::Presentation;
use crate::qte::resolver::{select_target, TargetInput};
use crate::qte::spec::{ChallengeKind, ChallengeSpec, InputHandle};
use crate::qte::tier::{success_rate, Completion, CompletionRecord, CompletionTier};
use crate::qte::timer::ChallengeTimer;

/// Tier recorded for a lenient hit.
pub const LENIENT_SUCCESS_TIER: CompletionTier = CompletionTier::Perfect;

/// Everything a challenge touches outside itself.
pub struct ChallengeContext<'a, C, P> {
    /// Current tick.
    pub now: Tick,
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Attack the running sequence belongs to.
    pub attack_name: &'a str,
    /// Target selection randomness.
    pub rng: &'a mut DeterministicRng,
    /// Listener registry.
    pub router: &'a InputRouter,
    /// Combat collaborator.
    pub combat: &'a mut C,
    /// Prompt collaborator.
    pub presentation: &'a mut P,
    /// Results of the running sequence.
    pub record: &'a mut CompletionRecord,
    /// Outgoing signals.
    pub events: &'a mut Vec<QteEvent>,
    /// Opponents hit by damage.
    pub targets: &'a [UnitId],
}

/// Lifecycle state while a challenge exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengePhase {
    /// Target chosen, prompt shown, listeners registered.
    Armed,
    /// Observing input.
    AwaitingInput,
    /// Left the window; tearing down.
    Resolved,
}

/// What a press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    /// No effect.
    Ignored,
    /// Correct press counted; challenge keeps running.
    Counted,
    /// Wrong press counted against the damage scale.
    Penalized,
    /// Challenge must resolve now.
    Resolve(Resolution),
}

/// Result handed back to the sequence controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeOutcome {
    /// Challenge index.
    pub index: usize,
    /// Loop pass.
    pub loop_pass: u32,
    /// Variant.
    pub kind: ChallengeKind,
    /// Recorded result.
    pub completion: Completion,
    /// How the window closed.
    pub resolution: Resolution,
    /// Authored flag, read by the continuation check.
    pub stop_on_failure: bool,
    /// Correct presses observed.
    pub presses: u32,
}

/// Runtime state of the one active challenge.
#[derive(Debug)]
pub struct ActiveChallenge {
    spec: ChallengeSpec,
    index: usize,
    loop_pass: u32,
    phase: ChallengePhase,
    target: TargetInput,
    timer: ChallengeTimer,
    presses: u32,
    misinputs: u32,
    reported_tier: CompletionTier,
    listeners: Vec<InputSubscription>,
}

impl ActiveChallenge {
    /// Arm a challenge and start awaiting input.
    ///
    /// Returns `None` only if the challenge has no acceptable input, which
    /// validation rules out before a sequence starts.
    pub fn arm<C, P>(
        spec: ChallengeSpec,
        index: usize,
        loop_pass: u32,
        animation: String,
        ctx: &mut ChallengeContext<'_, C, P>,
    ) -> Option<Self>
    where
        C: CombatSystem,
        P: Presentation,
    {
        let target = select_target(&spec.inputs, &mut *ctx.rng)?;
        let duration = ticks_from_millis(spec.duration_ms, ctx.config.tick_rate);
        let timer = ChallengeTimer::arm(ctx.now, duration);

        ctx.presentation.show_prompt(
            &target.binding,
            target.binding.icon_for_device(ctx.config.device_index),
        );

        // One key-press listener per distinct acceptable input
        let handles: BTreeSet<&InputHandle> = spec.inputs.iter().map(|b| &b.handle).collect();
        let mut listeners: Vec<InputSubscription> = handles
            .into_iter()
            .map(|h| ctx.router.subscribe(h.clone(), InputPhase::Pressed, ListenerRole::KeyPress))
            .collect();
        for phase in [InputPhase::Pressed, InputPhase::Released] {
            listeners.push(ctx.router.subscribe(target.handle().clone(), phase, ListenerRole::Prompt));
        }

        ctx.events.push(QteEvent::new(
            ctx.now,
            QteEventData::ChallengeStarted {
                index,
                loop_pass,
                kind: spec.kind,
                target: target.handle().clone(),
                animation,
                duration_ticks: duration,
            },
        ));

        info!(
            index,
            loop_pass,
            kind = ?spec.kind,
            target = %target.handle(),
            duration_ticks = duration,
            window_ms = millis_from_ticks(duration, ctx.config.tick_rate),
            "challenge armed"
        );

        let mut challenge = Self {
            spec,
            index,
            loop_pass,
            phase: ChallengePhase::Armed,
            target,
            timer,
            presses: 0,
            misinputs: 0,
            reported_tier: CompletionTier::Failed,
            listeners,
        };
        challenge.phase = ChallengePhase::AwaitingInput;
        Some(challenge)
    }

    /// Challenge index within the sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Loop pass.
    pub fn loop_pass(&self) -> u32 {
        self.loop_pass
    }

    /// Lifecycle state.
    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    /// Authored spec.
    pub fn spec(&self) -> &ChallengeSpec {
        &self.spec
    }

    /// Expected input.
    pub fn target(&self) -> &TargetInput {
        &self.target
    }

    /// Active window.
    pub fn timer(&self) -> &ChallengeTimer {
        &self.timer
    }

    /// Correct presses so far.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Penalised wrong presses so far.
    pub fn misinputs(&self) -> u32 {
        self.misinputs
    }

    /// Window has run out.
    pub fn is_expired(&self, now: Tick) -> bool {
        self.phase == ChallengePhase::AwaitingInput && self.timer.is_expired(now)
    }

    /// Multiplier for challenge-end damage.
    pub fn damage_scale(&self, config: &EngineConfig) -> f32 {
        if self.spec.kind == ChallengeKind::SustainedMash && self.spec.fail_reduces_damage {
            let penalty = self.misinputs as f32 * config.misinput_penalty;
            (1.0 - penalty).max(config.min_damage_scale)
        } else {
            1.0
        }
    }

    /// Feed one press of an acceptable input.
    ///
    /// Mash presses may raise the live tier; the upgrade is pushed to
    /// `events`.
    pub fn on_press(&mut self, handle: &InputHandle, now: Tick, events: &mut Vec<QteEvent>) -> PressOutcome {
        if self.phase != ChallengePhase::AwaitingInput {
            return PressOutcome::Ignored;
        }

        if self.target.matches(handle) {
            match self.spec.kind {
                ChallengeKind::SustainedMash => {
                    self.presses += 1;
                    let live = self
                        .spec
                        .thresholds
                        .tier(success_rate(self.presses, self.spec.required_presses));
                    if live > self.reported_tier {
                        self.reported_tier = live;
                        events.push(QteEvent::tier_changed(now, live));
                    }
                    PressOutcome::Counted
                }
                ChallengeKind::StrictSingle => {
                    self.presses += 1;
                    PressOutcome::Counted
                }
                ChallengeKind::LenientSingle => {
                    self.presses += 1;
                    PressOutcome::Resolve(Resolution::Hit)
                }
            }
        } else {
            debug!(index = self.index, input = %handle, expected = %self.target.handle(), "wrong input");
            match self.spec.kind {
                ChallengeKind::StrictSingle => PressOutcome::Resolve(Resolution::Misinput),
                ChallengeKind::SustainedMash if self.spec.fail_reduces_damage => {
                    self.misinputs += 1;
                    PressOutcome::Penalized
                }
                _ => PressOutcome::Ignored,
            }
        }
    }

    fn completion(&self, resolution: Resolution) -> Completion {
        match (self.spec.kind, resolution) {
            (_, Resolution::Cancelled) => Completion::NoResult,
            (ChallengeKind::SustainedMash, _) => {
                let rate = success_rate(self.presses, self.spec.required_presses);
                Completion::Scored(self.spec.thresholds.tier(rate))
            }
            (ChallengeKind::StrictSingle, Resolution::Misinput) => Completion::Scored(CompletionTier::Failed),
            (ChallengeKind::StrictSingle, _) => Completion::NoResult,
            (ChallengeKind::LenientSingle, Resolution::Hit) => Completion::Scored(LENIENT_SUCCESS_TIER),
            (ChallengeKind::LenientSingle, _) => Completion::Scored(CompletionTier::Failed),
        }
    }

    /// Leave the active window and tear down.
    ///
    /// Releases listeners, removes the prompt, records the result, emits
    /// success/failure signals, applies challenge-end damage and finally
    /// emits the ended signal. A cancelled challenge only tears down.
    pub fn resolve<C, P>(mut self, resolution: Resolution, ctx: &mut ChallengeContext<'_, C, P>) -> ChallengeOutcome
    where
        C: CombatSystem,
        P: Presentation,
    {
        self.phase = ChallengePhase::Resolved;

        for listener in &mut self.listeners {
            listener.release();
        }
        self.listeners.clear();
        ctx.presentation.hide_prompt();

        let completion = self.completion(resolution);

        if resolution != Resolution::Cancelled {
            ctx.record.push(self.loop_pass, self.index, completion);

            match completion {
                Completion::Scored(CompletionTier::Failed) => {
                    ctx.events.push(QteEvent::new(
                        ctx.now,
                        QteEventData::ChallengeFailed { index: self.index },
                    ));
                }
                Completion::Scored(tier) => {
                    if tier > self.reported_tier {
                        self.reported_tier = tier;
                        ctx.events.push(QteEvent::tier_changed(ctx.now, tier));
                    }
                    ctx.events.push(QteEvent::new(
                        ctx.now,
                        QteEventData::ChallengeSucceeded { index: self.index, tier },
                    ));
                }
                Completion::NoResult => {}
            }

            if self.spec.inflict_damage_on_end {
                let scale = self.damage_scale(ctx.config);
                let context = AttackContext {
                    attack_name: ctx.attack_name.to_string(),
                    source: DamageSource::ChallengeEnd {
                        index: self.index,
                        tier: completion.tier(),
                    },
                    damage_scale: scale,
                };
                apply_to_targets(&mut *ctx.combat, ctx.targets, &context);
            }
        }

        ctx.events.push(QteEvent::challenge_ended(
            ctx.now,
            self.index,
            self.loop_pass,
            completion,
            resolution,
        ));

        info!(
            index = self.index,
            loop_pass = self.loop_pass,
            ?resolution,
            ?completion,
            presses = self.presses,
            elapsed_ticks = self.timer.elapsed(ctx.now),
            "challenge resolved"
        );

        ChallengeOutcome {
            index: self.index,
            loop_pass: self.loop_pass,
            kind: self.spec.kind,
            completion,
            resolution,
            stop_on_failure: self.spec.stop_on_failure,
            presses: self.presses,
        }
    }
}

/// Hit every target with the acting unit's attack, scaled by the context.
pub(crate) fn apply_to_targets<C: CombatSystem>(combat: &mut C, targets: &[UnitId], context: &AttackContext) {
    let Some(actor) = combat.current_acting_unit() else {
        warn!(source = ?context.source, "no acting unit, damage skipped");
        return;
    };

    let amount = scaled_damage(actor.attack, context.damage_scale);
    for target in targets {
        debug!(attacker = %actor.id, %target, amount, "applying damage");
        combat.apply_damage(*target, amount, context);
    }
}
