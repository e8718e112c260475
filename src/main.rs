//! Platform Fighter Simulator
//!
//! Headless demo host: runs a scripted match against the reference physics
//! backend, then replays the recorded input and checks the state hashes match.
//!
//! Usage: `platform-fighter-sim [config.json]`

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use platform_fighter::{
    ArenaPhysics, CharacterId, FixedStepClock, GameWorld, NullPresenter, WorldConfig, TICK_DT,
    TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        input::{ActionEvent, InputChange, InputQueue, InputRecording},
        tick::replay,
    },
};

/// Demo length in ticks (10 seconds)
const DEMO_TICKS: u32 = 600;

/// Host frame time: a 50 Hz display driving the 60 Hz simulation
const HOST_FRAME_DT: f32 = 1.0 / 50.0;

const PLAYER: CharacterId = CharacterId(0);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Platform Fighter Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_path(&path).with_context(|| format!("loading {path}"))?,
        None => WorldConfig::default(),
    };

    demo_match(config)
}

/// Scripted controller input for a tick.
fn script(queue_tick: u32) -> Vec<InputChange> {
    let mut changes = Vec::new();
    match queue_tick {
        1 => changes.push(InputChange::Movement(platform_fighter::Vec2::new(1.0, 0.0))),
        90 => changes.push(InputChange::Movement(platform_fighter::Vec2::new(-1.0, 0.0))),
        200 => changes.push(InputChange::Movement(platform_fighter::Vec2::ZERO)),
        _ => {}
    }
    if queue_tick % 45 == 0 {
        changes.push(InputChange::Action(ActionEvent::JumpPressed));
    }
    if queue_tick % 45 == 20 {
        changes.push(InputChange::Action(ActionEvent::JumpReleased));
    }
    if queue_tick % 60 == 30 {
        changes.push(InputChange::Action(ActionEvent::BasicAttack));
    }
    if queue_tick % 120 == 70 {
        changes.push(InputChange::Action(ActionEvent::ProjectileAttack));
    }
    if queue_tick == 150 {
        changes.push(InputChange::DodgePressed);
    }
    match queue_tick {
        300 => changes.push(InputChange::Action(ActionEvent::ShieldPressed)),
        340 => changes.push(InputChange::Action(ActionEvent::ShieldReleased)),
        400 => changes.push(InputChange::Action(ActionEvent::SpecialAttack)),
        _ => {}
    }
    changes
}

/// Run the demo and verify it replays to the same state.
fn demo_match(config: WorldConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let mut world = GameWorld::new(config.clone(), ArenaPhysics::default(), NullPresenter::default())?;
    let mut queue = InputQueue::new();
    let sender = queue.sender();
    let mut clock = FixedStepClock::new();
    let mut recordings: BTreeMap<CharacterId, InputRecording> = BTreeMap::new();

    let mut total_events = 0;
    while world.tick_count() < DEMO_TICKS {
        for _ in 0..clock.advance(HOST_FRAME_DT) {
            if world.tick_count() >= DEMO_TICKS {
                break;
            }
            let next = world.tick_count() + 1;
            for change in script(next) {
                if !sender.send(PLAYER, change) {
                    bail!("input queue closed at tick {next}");
                }
            }

            let inputs = queue.drain();
            for (id, frame) in &inputs {
                recordings.entry(*id).or_default().record(next, frame);
            }

            let result = world.tick(&inputs);
            world.physics_mut().step(TICK_DT);
            total_events += result.events.len();

            for event in &result.events {
                match &event.data {
                    GameEventData::EdgeGrabbed { character, position, .. } => {
                        info!("Tick {}: character {} grabbed a ledge at {}", event.tick, character.0, position);
                    }
                    GameEventData::BlastZoneExit { character, position } => {
                        info!("Tick {}: character {} left the blast zone at {}", event.tick, character.0, position);
                    }
                    GameEventData::Respawned { character, position } => {
                        info!("Tick {}: character {} respawned at {}", event.tick, character.0, position);
                    }
                    GameEventData::AttackHit { owner, target, shielded, .. } => {
                        info!("Tick {}: {} hit {} (shielded: {})", event.tick, owner.0, target.0, shielded);
                    }
                    _ => {}
                }
            }

            if next % 120 == 0 {
                info!("Tick {}: {} volumes live, {} events so far", next, world.volumes().len(), total_events);
            }
        }
    }

    info!("=== Match Results ===");
    let hash = world.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    for character in world.characters() {
        info!(
            "Character {} ({:?}) at {} in world: {}",
            character.id.0, character.role, character.position, character.in_world
        );
    }
    info!("Total events: {}", total_events);

    let (_, _, report) = world.teardown();
    info!(
        "Teardown: {} volumes and {} bodies removed, {} respawns cancelled",
        report.volumes_removed, report.bodies_removed, report.respawns_cancelled
    );

    info!("=== Verifying Determinism ===");
    let mut replayed = GameWorld::new(config, ArenaPhysics::default(), NullPresenter::default())?;
    replay(&mut replayed, &recordings, DEMO_TICKS, |physics| physics.step(TICK_DT));
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
