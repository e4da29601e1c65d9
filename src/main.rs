//! QTE Engine Demo
//!
//! Loads a sequence library and plays one turn per attack against a logging
//! combat system, with a scripted player pressing the prompted inputs.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qte_engine::{
    core::rng::{derive_turn_seed, DeterministicRng},
    qte::{
        combat::{ActingUnit, AttackContext, CombatSystem, UnitId},
        events::QteEventData,
        presentation::LogPresentation,
        spec::InputHandle,
        tier::Completion,
    },
    EngineConfig, InputEvent, QteEngine, SequenceLibrary, VERSION,
};

const BUILTIN_LIBRARY: &str = include_str!("../demos/sequences.json");

/// Upper bound on one turn's length.
const MAX_TURN_SECONDS: u64 = 30;

/// Chat participant driving the scripted presses.
const CHAT_PLAYER: [u8; 16] = [0xC4; 16];

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("QTE Engine v{}", VERSION);

    let library = match std::env::args().nth(1) {
        Some(path) => SequenceLibrary::load(&path).with_context(|| format!("loading {path}"))?,
        None => SequenceLibrary::from_json_str(BUILTIN_LIBRARY).context("parsing built-in library")?,
    };
    info!("Tick Rate: {} Hz", library.engine.tick_rate);

    let battle_id = *UnitId::random().as_bytes();
    info!("Battle ID: {}", hex::encode(battle_id));

    for (turn, attack) in library.names().enumerate() {
        demo_turn(&library, attack, &battle_id, turn as u32)?;
    }
    Ok(())
}

/// Combat system that logs damage and keeps a running total.
struct DemoCombat {
    acting: ActingUnit,
    dealt: u32,
    turns: u32,
}

impl CombatSystem for DemoCombat {
    fn current_acting_unit(&self) -> Option<ActingUnit> {
        Some(self.acting)
    }

    fn apply_damage(&mut self, target: UnitId, amount: u32, context: &AttackContext) {
        self.dealt += amount;
        info!(
            "{} hits {} for {} ({:?}, scale {:.2})",
            context.attack_name, target, amount, context.source, context.damage_scale
        );
    }

    fn end_turn(&mut self) {
        self.turns += 1;
        info!("Turn over");
    }
}

/// Turn length cap at the engine's own tick rate.
fn turn_tick_cap(config: &EngineConfig) -> u64 {
    MAX_TURN_SECONDS * u64::from(config.tick_rate)
}

/// Play one attack's sequence.
fn demo_turn(library: &SequenceLibrary, attack: &str, battle_id: &[u8; 16], turn: u32) -> Result<()> {
    let sequence = library
        .get(attack)
        .with_context(|| format!("no sequence for attack {attack}"))?;
    info!("=== Turn {}: {} ===", turn, attack);

    let acting = ActingUnit {
        id: UnitId::new([1; 16]),
        attack: 40,
    };
    let combat = DemoCombat {
        acting,
        dealt: 0,
        turns: 0,
    };
    let mut engine = QteEngine::new(library.engine.clone(), combat, LogPresentation::default())
        .context("creating engine")?;
    engine.reseed(derive_turn_seed(battle_id, turn, acting.id.as_bytes()));
    engine.set_targets(vec![UnitId::new([7; 16]), UnitId::new([8; 16])]);

    // Scripted player: reacts after a short delay and sometimes fumbles
    let mut player = DeterministicRng::for_turn(battle_id, turn, &CHAT_PLAYER);
    let max_turn_ticks = turn_tick_cap(&library.engine);

    engine.start_sequence(sequence).context("starting sequence")?;
    for event in engine.take_events() {
        log_event(&event.data);
    }

    let mut ticks: u64 = 0;
    while engine.is_running() && ticks < max_turn_ticks {
        let mut inputs = Vec::new();
        if let Some(challenge) = engine.active_challenge() {
            if player.next_int(4) == 0 {
                let handle: InputHandle = if player.next_int(5) == 0 {
                    player
                        .choose(&challenge.spec().inputs)
                        .map_or_else(|| challenge.target().handle().clone(), |b| b.handle.clone())
                } else {
                    challenge.target().handle().clone()
                };
                inputs.push(InputEvent::pressed(handle.clone()));
                inputs.push(InputEvent::released(handle));
            }
        }

        let result = engine.frame(&inputs);
        for event in &result.events {
            log_event(&event.data);
        }
        ticks += 1;
    }

    if engine.is_running() {
        warn!("Turn did not finish in {} ticks, aborting", max_turn_ticks);
        engine.abort();
    }
    info!(
        "Dealt {} damage over {} ticks (turns ended: {})",
        engine.combat().dealt,
        ticks,
        engine.combat().turns
    );
    Ok(())
}

fn log_event(data: &QteEventData) {
    match data {
        QteEventData::ChallengeStarted { index, loop_pass, kind, target, .. } => {
            info!("Challenge {}.{} ({:?}): press {}", loop_pass, index, kind, target);
        }
        QteEventData::ChallengeEnded { index, completion, resolution, .. } => match completion {
            Completion::Scored(tier) => info!("Challenge {} scored {:?} ({:?})", index, tier, resolution),
            Completion::NoResult => info!("Challenge {} ended without a result ({:?})", index, resolution),
        },
        QteEventData::SequenceEnded { sequence, reason, summary } => {
            info!(
                "Sequence {} ended: {:?}, {} results, best {:?}",
                sequence,
                reason,
                summary.entries.len(),
                summary.best_tier
            );
        }
        _ => {}
    }
}
