//! Sequence Controller
//!
//! Runs an ordered list of challenges, one at a time, with loop passes and
//! early exit on failure. Collaborators are injected at construction.
//!
//! Continuation ladder after each resolved challenge:
//!
//! 1. `stop_on_failure` and the challenge's own entry is `Failed` → end
//! 2. more challenges in this pass → arm the next one
//! 3. looping with passes left → arm challenge 0 of the next pass
//! 4. otherwise → end

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::core::rng::DeterministicRng;
use crate::core::time::Tick;
use crate::qte::challenge::{apply_to_targets, ActiveChallenge, ChallengeContext, ChallengeOutcome, PressOutcome};
use crate::qte::combat::{AttackContext, CombatSystem, DamageSource, UnitId};
use crate::qte::config::EngineConfig;
use crate::qte::error::QteError;
use crate::qte::events::{EndReason, QteEvent, Resolution, SequenceSummary};
use crate::qte::input::InputRouter;
use crate::qte::presentation::Presentation;
use crate::qte::spec::{InputHandle, SequenceSpec};
use crate::qte::tier::CompletionRecord;

/// Sequence the controller is running.
#[derive(Clone, Debug)]
struct RunningSequence {
    spec: Arc<SequenceSpec>,
    loop_pass: u32,
    index: usize,
}

/// Orchestrates challenges for one combat action at a time.
pub struct SequenceController<C, P> {
    config: EngineConfig,
    combat: C,
    presentation: P,
    router: InputRouter,
    rng: DeterministicRng,
    record: CompletionRecord,
    targets: Vec<UnitId>,
    events: Vec<QteEvent>,
    running: Option<RunningSequence>,
    active: Option<ActiveChallenge>,
    finished: Option<ChallengeOutcome>,
}

impl<C: CombatSystem, P: Presentation> SequenceController<C, P> {
    /// Create an idle controller.
    pub fn new(config: EngineConfig, combat: C, presentation: P) -> Self {
        let rng = DeterministicRng::new(config.rng_seed);
        Self {
            config,
            combat,
            presentation,
            router: InputRouter::new(),
            rng,
            record: CompletionRecord::new(),
            targets: Vec::new(),
            events: Vec::new(),
            running: None,
            active: None,
            finished: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Listener registry used by the active challenge.
    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// Combat collaborator.
    pub fn combat(&self) -> &C {
        &self.combat
    }

    /// Combat collaborator (mutable).
    pub fn combat_mut(&mut self) -> &mut C {
        &mut self.combat
    }

    /// Presentation collaborator.
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Presentation collaborator (mutable).
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Results of the sequence in flight.
    pub fn record(&self) -> &CompletionRecord {
        &self.record
    }

    /// Opponents that damage will hit.
    pub fn targets(&self) -> &[UnitId] {
        &self.targets
    }

    /// Active challenge, if any.
    pub fn active_challenge(&self) -> Option<&ActiveChallenge> {
        self.active.as_ref()
    }

    /// A sequence is in flight.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Loop pass of the running sequence.
    pub fn loop_pass(&self) -> Option<u32> {
        self.running.as_ref().map(|r| r.loop_pass)
    }

    /// Index of the current challenge.
    pub fn challenge_index(&self) -> Option<usize> {
        self.running.as_ref().map(|r| r.index)
    }

    /// Drain queued signals.
    pub fn take_events(&mut self) -> Vec<QteEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the target-selection RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = DeterministicRng::new(seed);
    }

    /// Set the targeted opponents. Cleared when a sequence ends.
    pub fn set_targets(&mut self, targets: Vec<UnitId>) {
        self.targets = targets;
    }

    fn context<'a>(&'a mut self, now: Tick, attack_name: &'a str) -> ChallengeContext<'a, C, P> {
        ChallengeContext {
            now,
            config: &self.config,
            attack_name,
            rng: &mut self.rng,
            router: &self.router,
            combat: &mut self.combat,
            presentation: &mut self.presentation,
            record: &mut self.record,
            events: &mut self.events,
            targets: &self.targets,
        }
    }

    fn running_spec(&self) -> Option<Arc<SequenceSpec>> {
        self.running.as_ref().map(|r| Arc::clone(&r.spec))
    }

    // -------------------------------------------------------------------------
    // Sequence life-cycle
    // -------------------------------------------------------------------------

    /// Start a sequence at `now`.
    ///
    /// The sequence is validated first; an invalid sequence or one already in
    /// flight leaves the controller untouched.
    pub fn start(&mut self, spec: impl Into<Arc<SequenceSpec>>, now: Tick) -> Result<(), QteError> {
        let spec = spec.into();

        if let Some(running) = &self.running {
            return Err(QteError::SequenceAlreadyRunning {
                running: running.spec.name.clone(),
            });
        }

        if let Err(err) = spec.validate() {
            error!(sequence = %spec.name, error = %err, "sequence rejected");
            return Err(err.into());
        }

        self.record.clear();
        self.finished = None;
        self.running = Some(RunningSequence {
            spec: Arc::clone(&spec),
            loop_pass: 0,
            index: 0,
        });

        info!(
            sequence = %spec.name,
            challenges = spec.challenges.len(),
            passes = spec.pass_count(),
            targets = self.targets.len(),
            "sequence started"
        );

        let armed = self.start_challenge(0, now);
        self.events.push(QteEvent::sequence_started(
            now,
            &spec.name,
            spec.challenges.len(),
            spec.pass_count(),
        ));
        if !armed {
            self.end_sequence(EndReason::Fault, now);
        }
        Ok(())
    }

    fn start_challenge(&mut self, index: usize, now: Tick) -> bool {
        let Some(spec) = self.running_spec() else {
            error!(index, "challenge start without a running sequence");
            return false;
        };
        let Some(challenge_spec) = spec.challenges.get(index).cloned() else {
            error!(index, len = spec.challenges.len(), "challenge index out of range");
            return false;
        };
        if let Some(active) = &self.active {
            error!(index, active = active.index(), "challenge start while another is active");
            return false;
        }

        let loop_pass = self.loop_pass().unwrap_or(0);
        let animation = spec.animation_trigger();
        let mut ctx = self.context(now, &spec.attack_name);
        let Some(challenge) = ActiveChallenge::arm(challenge_spec, index, loop_pass, animation, &mut ctx) else {
            error!(index, "challenge has no acceptable input");
            return false;
        };

        self.active = Some(challenge);
        if let Some(running) = &mut self.running {
            running.index = index;
        }
        true
    }

    /// Feed a press of `handle` to the active challenge.
    pub fn handle_key_press(&mut self, handle: &InputHandle, now: Tick) {
        let Some(active) = &mut self.active else {
            debug!(input = %handle, "press with no active challenge discarded");
            return;
        };

        if let PressOutcome::Resolve(resolution) = active.on_press(handle, now, &mut self.events) {
            self.resolve_active(resolution, now);
            self.advance(now);
        }
    }

    /// Per-tick timer check.
    pub fn poll(&mut self, now: Tick) {
        let expired = self.active.as_ref().is_some_and(|a| a.is_expired(now));
        if expired {
            self.resolve_active(Resolution::Timeout, now);
            self.advance(now);
        }
    }

    fn resolve_active(&mut self, resolution: Resolution, now: Tick) {
        let Some(challenge) = self.active.take() else {
            return;
        };
        let spec = self.running_spec();
        let attack_name = spec.as_deref().map_or("", |s| s.attack_name.as_str());
        let mut ctx = self.context(now, attack_name);
        let outcome = challenge.resolve(resolution, &mut ctx);
        self.finished = Some(outcome);
    }

    /// Decide what follows the challenge that just resolved.
    ///
    /// Called internally after every resolution. Calling it without a
    /// freshly resolved challenge is a programming error: it is logged and
    /// the running sequence ends with [`EndReason::Fault`].
    pub fn advance(&mut self, now: Tick) {
        let Some(finished) = self.finished.take() else {
            error!("advance called without a resolved challenge");
            if self.running.is_some() {
                self.end_sequence(EndReason::Fault, now);
            }
            return;
        };
        let Some(running) = self.running.clone() else {
            error!(index = finished.index, "advance called without a running sequence");
            return;
        };
        let len = running.spec.challenges.len();
        if finished.index >= len || finished.index != running.index || finished.loop_pass != running.loop_pass {
            error!(
                index = finished.index,
                loop_pass = finished.loop_pass,
                expected_index = running.index,
                expected_pass = running.loop_pass,
                "resolved challenge does not match sequence position"
            );
            self.end_sequence(EndReason::Fault, now);
            return;
        }

        // 1. Early exit, only when this challenge left a graded entry
        if finished.stop_on_failure {
            match self.record.last() {
                Some(entry) if entry.index == finished.index && entry.loop_pass == finished.loop_pass => {
                    if entry.completion.is_failed() {
                        info!(index = finished.index, "challenge failed, stopping sequence");
                        self.end_sequence(EndReason::StoppedOnFailure, now);
                        return;
                    }
                }
                _ => debug!(index = finished.index, "no entry for challenge, failure check skipped"),
            }
        }

        // 2. Next challenge in this pass
        let next = finished.index + 1;
        if next < len {
            if !self.start_challenge(next, now) {
                self.end_sequence(EndReason::Fault, now);
            }
            return;
        }

        // 3. Next pass
        if running.spec.loop_sequence && running.loop_pass < running.spec.loop_count {
            if let Some(running) = &mut self.running {
                running.loop_pass += 1;
                debug!(loop_pass = running.loop_pass, "looping sequence");
            }
            if !self.start_challenge(0, now) {
                self.end_sequence(EndReason::Fault, now);
            }
            return;
        }

        // 4. Done
        self.end_sequence(EndReason::Completed, now);
    }

    /// Cancel the running sequence: listeners released, prompt removed,
    /// no damage and no turn end.
    pub fn abort(&mut self, now: Tick) {
        if self.running.is_none() {
            return;
        }
        info!("sequence aborted");
        self.end_sequence(EndReason::Aborted, now);
    }

    fn end_sequence(&mut self, reason: EndReason, now: Tick) {
        if self.active.is_some() {
            self.resolve_active(Resolution::Cancelled, now);
        }
        self.finished = None;

        let Some(running) = self.running.take() else {
            return;
        };
        let spec = running.spec;

        let deals_damage = matches!(reason, EndReason::Completed | EndReason::StoppedOnFailure);
        if deals_damage && spec.inflict_damage_on_sequence_end {
            let context = AttackContext {
                attack_name: spec.attack_name.clone(),
                source: DamageSource::SequenceEnd {
                    best_tier: self.record.best_tier(),
                },
                damage_scale: 1.0,
            };
            apply_to_targets(&mut self.combat, &self.targets, &context);
        }

        self.targets.clear();
        if reason != EndReason::Aborted {
            self.combat.end_turn();
        }

        let summary = SequenceSummary {
            entries: self.record.entries().to_vec(),
            best_tier: self.record.best_tier(),
        };
        self.record.clear();

        info!(
            sequence = %spec.name,
            ?reason,
            challenges_run = summary.entries.len(),
            best_tier = ?summary.best_tier,
            "sequence ended"
        );
        self.events.push(QteEvent::sequence_ended(now, &spec.name, reason, summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qte::events::QteEventData;
    use crate::qte::spec::{ChallengeSpec, InputBinding};
    use crate::qte::testing::{RecordingCombat, RecordingPresentation};
    use crate::qte::tier::{Completion, CompletionTier};

    type Controller = SequenceController<RecordingCombat, RecordingPresentation>;

    fn controller() -> Controller {
        let mut controller = SequenceController::new(
            EngineConfig::default(),
            RecordingCombat::with_attack(50),
            RecordingPresentation::default(),
        );
        controller.set_targets(vec![UnitId::new([7; 16]), UnitId::new([8; 16])]);
        controller
    }

    fn single(name: &str) -> Vec<InputBinding> {
        vec![InputBinding::from(name)]
    }

    fn started_indices(events: &[QteEvent]) -> Vec<(u32, usize)> {
        events
            .iter()
            .filter_map(|e| match e.data {
                QteEventData::ChallengeStarted { index, loop_pass, .. } => Some((loop_pass, index)),
                _ => None,
            })
            .collect()
    }

    fn end_reason(events: &[QteEvent]) -> Option<EndReason> {
        events.iter().find_map(|e| match e.data {
            QteEventData::SequenceEnded { reason, .. } => Some(reason),
            _ => None,
        })
    }

    fn press_target(controller: &mut Controller, now: Tick) {
        let target = controller.active_challenge().unwrap().target().handle().clone();
        controller.handle_key_press(&target, now);
    }

    #[test]
    fn test_start_order_and_state() {
        let mut c = controller();
        let seq = SequenceSpec::new("one", vec![ChallengeSpec::lenient(single("a"), 1000)]).with_attack("Slash");

        c.start(seq, 0).unwrap();
        let events = c.take_events();

        assert!(matches!(events[0].data, QteEventData::ChallengeStarted { ref animation, .. } if animation == "StartQTESlash"));
        assert!(matches!(events[1].data, QteEventData::SequenceStarted { challenge_count: 1, pass_count: 1, .. }));
        assert!(c.is_running());
        assert_eq!(c.challenge_index(), Some(0));
        assert_eq!(c.loop_pass(), Some(0));
    }

    #[test]
    fn test_stop_on_failure_skips_remaining() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "three",
            vec![
                ChallengeSpec::mash(single("a"), 10, 1000),
                ChallengeSpec::mash(single("a"), 10, 1000).stop_on_failure(),
                ChallengeSpec::mash(single("a"), 10, 1000),
            ],
        );

        c.start(seq, 0).unwrap();
        for _ in 0..10 {
            press_target(&mut c, 5);
        }
        c.poll(60);
        assert_eq!(c.challenge_index(), Some(1));

        // Challenge 2 gets nothing
        c.poll(120);

        let events = c.take_events();
        assert_eq!(started_indices(&events), vec![(0, 0), (0, 1)]);
        assert_eq!(end_reason(&events), Some(EndReason::StoppedOnFailure));
        assert!(!c.is_running());
        assert!(c.active_challenge().is_none());
        assert!(c.record().is_empty());
        assert_eq!(c.combat().turns_ended, 1);
        assert_eq!(c.router().active_count(), 0);
    }

    #[test]
    fn test_failure_without_stop_continues() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "two",
            vec![ChallengeSpec::mash(single("a"), 10, 1000), ChallengeSpec::lenient(single("b"), 1000)],
        );

        c.start(seq, 0).unwrap();
        c.poll(60);
        assert_eq!(c.challenge_index(), Some(1));
        assert!(c.record().last().unwrap().completion.is_failed());
    }

    #[test]
    fn test_loop_runs_every_pass() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "looped",
            vec![ChallengeSpec::lenient(single("a"), 1000), ChallengeSpec::lenient(single("b"), 1000)],
        )
        .looping(1);
        let max_len = seq.max_record_len();

        c.start(seq, 0).unwrap();
        let mut now = 0;
        while c.is_running() {
            now += 1;
            press_target(&mut c, now);
            assert!(c.record().len() <= max_len);
        }

        let events = c.take_events();
        assert_eq!(started_indices(&events), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(end_reason(&events), Some(EndReason::Completed));

        let summary = events.iter().find_map(|e| match &e.data {
            QteEventData::SequenceEnded { summary, .. } => Some(summary.clone()),
            _ => None,
        });
        let summary = summary.unwrap();
        assert_eq!(summary.entries.len(), 4);
        assert!(summary
            .entries
            .iter()
            .all(|e| e.completion == Completion::Scored(CompletionTier::Perfect)));
    }

    #[test]
    fn test_loop_flag_with_zero_count_runs_once() {
        let mut c = controller();
        let seq = SequenceSpec::new("once", vec![ChallengeSpec::lenient(single("a"), 1000)]).looping(0);

        c.start(seq, 0).unwrap();
        press_target(&mut c, 1);

        let events = c.take_events();
        assert_eq!(started_indices(&events).len(), 1);
        assert!(!c.is_running());
    }

    #[test]
    fn test_stop_on_failure_ignores_no_result() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "strict",
            vec![
                ChallengeSpec::strict(single("a"), 1000).stop_on_failure(),
                ChallengeSpec::lenient(single("b"), 1000),
            ],
        );

        c.start(seq, 0).unwrap();
        c.poll(60);

        // NoResult sentinel does not stop the sequence
        assert_eq!(c.record().last().unwrap().completion, Completion::NoResult);
        assert_eq!(c.challenge_index(), Some(1));
        assert!(c.is_running());
    }

    #[test]
    fn test_strict_misinput_stops_sequence() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "strict",
            vec![
                ChallengeSpec::strict(vec!["a".into(), "b".into()], 1000).stop_on_failure(),
                ChallengeSpec::lenient(single("c"), 1000),
            ],
        );

        c.start(seq, 0).unwrap();
        let target = c.active_challenge().unwrap().target().handle().clone();
        let wrong = InputHandle::new(if target.as_str() == "a" { "b" } else { "a" });
        c.handle_key_press(&wrong, 3);

        let events = c.take_events();
        assert_eq!(end_reason(&events), Some(EndReason::StoppedOnFailure));
        assert_eq!(started_indices(&events).len(), 1);
    }

    #[test]
    fn test_sequence_end_damage() {
        let mut c = controller();
        let seq = SequenceSpec::new("hit", vec![ChallengeSpec::lenient(single("a"), 1000)])
            .with_attack("Slash")
            .inflict_damage_on_end();

        c.start(seq, 0).unwrap();
        press_target(&mut c, 1);

        let damage = &c.combat().damage;
        assert_eq!(damage.len(), 2);
        assert!(damage.iter().all(|(_, amount, _)| *amount == 50));
        assert_eq!(
            damage[0].2.source,
            DamageSource::SequenceEnd { best_tier: Some(CompletionTier::Perfect) },
        );
        assert!(c.targets().is_empty());
        assert_eq!(c.combat().turns_ended, 1);
    }

    #[test]
    fn test_invalid_sequence_never_starts() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "bad",
            vec![ChallengeSpec::lenient(single("a"), 1000), ChallengeSpec::mash(single("a"), 0, 1000)],
        );

        let err = c.start(seq, 0).unwrap_err();
        assert!(matches!(err, QteError::Config(_)));
        assert!(!c.is_running());
        assert!(c.take_events().is_empty());
        assert_eq!(c.router().active_count(), 0);
        assert!(c.presentation().shown.is_empty());
    }

    #[test]
    fn test_second_start_rejected() {
        let mut c = controller();
        let seq = SequenceSpec::new("first", vec![ChallengeSpec::lenient(single("a"), 1000)]);

        c.start(seq.clone(), 0).unwrap();
        let err = c.start(seq, 1).unwrap_err();
        assert!(matches!(err, QteError::SequenceAlreadyRunning { ref running } if running == "first"));
        assert_eq!(c.challenge_index(), Some(0));
    }

    #[test]
    fn test_abort_releases_everything() {
        let mut c = controller();
        let seq = SequenceSpec::new(
            "aborted",
            vec![ChallengeSpec::mash(single("a"), 10, 1000).inflict_damage_on_end()],
        )
        .inflict_damage_on_end();

        c.start(seq, 0).unwrap();
        press_target(&mut c, 1);
        assert!(c.router().active_count() > 0);

        c.abort(2);
        let events = c.take_events();
        assert_eq!(end_reason(&events), Some(EndReason::Aborted));
        assert_eq!(c.router().active_count(), 0);
        assert!(!c.presentation().visible);
        assert!(c.combat().damage.is_empty());
        assert_eq!(c.combat().turns_ended, 0);
        assert!(c.record().is_empty());
        assert!(c.targets().is_empty());

        // Late timer poll does nothing
        c.poll(500);
        assert!(c.take_events().is_empty());
    }

    #[test]
    fn test_advance_without_resolution_faults() {
        let mut c = controller();
        let seq = SequenceSpec::new("fault", vec![ChallengeSpec::lenient(single("a"), 1000)]).inflict_damage_on_end();

        c.start(seq, 0).unwrap();
        c.take_events();
        c.advance(1);

        let events = c.take_events();
        assert_eq!(end_reason(&events), Some(EndReason::Fault));
        assert!(!c.is_running());
        assert_eq!(c.router().active_count(), 0);
        assert!(c.combat().damage.is_empty());
        assert_eq!(c.combat().turns_ended, 1);
    }

    #[test]
    fn test_advance_when_idle_is_noop() {
        let mut c = controller();
        c.advance(0);
        assert!(c.take_events().is_empty());
        assert_eq!(c.combat().turns_ended, 0);
    }

    #[test]
    fn test_press_without_challenge_is_discarded() {
        let mut c = controller();
        c.handle_key_press(&InputHandle::new("a"), 0);
        assert!(c.take_events().is_empty());
    }
}
