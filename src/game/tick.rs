//! Simulation Tick
//!
//! One fixed 60 Hz step of the world. Phases run in this order:
//!
//! 1. Advance the tick counter
//! 2. Count down character timers (jump buffer, re-grab, invulnerability)
//! 3. Dispatch contacts reported since the last tick (ledge grabs, hits)
//! 4. Re-enter characters whose respawn is due
//! 5. Apply button events (jumps, attacks, dodge, shield)
//! 6. Per character: movement, fast-fall, buffered and held jumps
//! 7. Move and expire attack volumes
//! 8. Blast-zone check
//!
//! Timers count down before anything can start them, so a timer of `n`
//! ticks started on tick `t` runs out on tick `t + n`, the same tick an
//! attack volume spawned on `t` with the same lifetime expires.
//!
//! The host steps physics between ticks. Given identical inputs and the same
//! physics backend, two runs produce identical state hashes.

use std::collections::BTreeMap;

use tracing::trace;

use crate::game::blast_zone::{check_exit, handle_exit, respawn};
use crate::game::character::CharacterId;
use crate::game::combat::{
    activate_shield, attach_shield, basic_attack, deactivate_shield, dodge, projectile_attack,
    resolve_attack_contact, special_attack, AttackKind, SpawnContext,
};
use crate::game::edge::{tick_regrab_cooldown, try_grab};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::{ActionEvent, InputFrame, InputRecording};
use crate::game::jump::{
    apply_fast_fall, continue_jump, release_jump, resolve_buffered_jump, start_jump, tick_jump_buffer, JumpOutcome,
};
use crate::game::movement::update_movement;
use crate::game::world::GameWorld;
use crate::physics::{BodyHandle, PhysicsAdapter, PhysicsCategory};
use crate::presentation::Presenter;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u32,
    /// Events generated this tick, sorted
    pub events: Vec<GameEvent>,
}

impl TickResult {
    /// Events matching a predicate on their data.
    pub fn find<'a>(&'a self, pred: impl Fn(&GameEventData) -> bool + 'a) -> impl Iterator<Item = &'a GameEvent> + 'a {
        self.events.iter().filter(move |e| pred(&e.data))
    }
}

impl<P: PhysicsAdapter, R: Presenter> GameWorld<P, R> {
    /// Run one simulation tick.
    ///
    /// `inputs` is keyed by character (BTreeMap for deterministic order).
    /// Characters with no entry hold no direction and press nothing.
    pub fn tick(&mut self, inputs: &BTreeMap<CharacterId, InputFrame>) -> TickResult {
        // 1. Advance tick counter
        self.tick += 1;

        // 2. Timers
        self.update_timers();

        // 3. Contacts from the last physics step
        self.process_contacts();

        // 4. Respawns due this tick
        self.process_respawns();

        // 5. Button events
        for (id, frame) in inputs {
            for action in &frame.actions {
                self.apply_action(*id, *action);
            }
        }

        // 6. Per-character update
        self.update_characters(inputs);

        // 7. Attack volumes
        self.update_volumes();

        // 8. Blast zone
        self.process_blast_zone();

        TickResult {
            tick: self.tick,
            events: self.take_events(),
        }
    }

    fn emit(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.tick, data));
    }

    // =========================================================================
    // TIMERS
    // =========================================================================

    fn update_timers(&mut self) {
        let tick = self.tick;
        for (id, character) in self.characters.iter_mut() {
            if !character.in_world {
                continue;
            }
            character.invulnerable_ticks = character.invulnerable_ticks.saturating_sub(1);
            tick_jump_buffer(character);
            if tick_regrab_cooldown(character, &mut self.physics) {
                self.events.push(GameEvent::new(tick, GameEventData::RegrabCooldownEnded { character: *id }));
            }
        }
    }

    // =========================================================================
    // CONTACTS
    // =========================================================================

    fn process_contacts(&mut self) {
        for contact in self.physics.drain_contacts() {
            // One contact is handled at most once; side A wins ties
            if let Some((edge, other)) = contact.split(PhysicsCategory::EDGE) {
                self.dispatch_edge_contact(edge, other);
            } else if let Some((attack, other)) = contact.split(PhysicsCategory::ATTACK) {
                self.dispatch_attack_contact(attack, other);
            } else {
                trace!(a = contact.body_a.0, b = contact.body_b.0, "contact ignored");
            }
        }
    }

    fn dispatch_edge_contact(&mut self, edge_body: BodyHandle, other: BodyHandle) {
        let (Some(edge_id), Some(id)) = (
            self.edge_bodies.get(&edge_body).copied(),
            self.character_bodies.get(&other).copied(),
        ) else {
            trace!(edge = edge_body.0, other = other.0, "edge contact with unknown body");
            return;
        };
        let (Some(edge), Some(character)) = (self.edges.get(&edge_id), self.characters.get_mut(&id)) else {
            return;
        };
        if !character.in_world {
            return;
        }

        match try_grab(character, edge, &mut self.physics, &self.config.fighter) {
            Ok(position) => self.emit(GameEventData::EdgeGrabbed {
                character: id,
                edge: edge_id,
                position,
            }),
            Err(reason) => trace!(id = id.0, edge = edge_id.0, ?reason, "ledge grab rejected"),
        }
    }

    fn dispatch_attack_contact(&mut self, attack_body: BodyHandle, other: BodyHandle) {
        let Some(volume) = self.volumes.by_body(attack_body) else {
            trace!(body = attack_body.0, "contact with expired attack");
            return;
        };
        let Some(target) = self
            .character_bodies
            .get(&other)
            .and_then(|id| self.characters.get(id))
        else {
            return;
        };

        if let Some(hit) = resolve_attack_contact(volume, target) {
            self.emit(hit);
        }
    }

    // =========================================================================
    // RESPAWNS
    // =========================================================================

    fn process_respawns(&mut self) {
        for id in self.respawns.take_due(self.tick) {
            let Some(character) = self.characters.get_mut(&id) else {
                continue;
            };
            let position = respawn(character, &mut self.physics, &mut self.presenter);
            self.emit(GameEventData::Respawned { character: id, position });
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    fn apply_action(&mut self, id: CharacterId, action: ActionEvent) {
        let tick = self.tick;
        let Some(character) = self.characters.get_mut(&id) else {
            return;
        };
        if !character.in_world {
            return;
        }

        let ctx = SpawnContext {
            tick,
            volumes: &mut self.volumes,
            physics: &mut self.physics,
            presenter: &mut self.presenter,
            config: &self.config.attacks,
        };

        let data = match action {
            ActionEvent::JumpPressed => match start_jump(character, ctx.physics, &self.config.fighter) {
                Some(JumpOutcome::Fired) => Some(GameEventData::JumpStarted { character: id }),
                Some(JumpOutcome::Buffered) => Some(GameEventData::JumpBuffered { character: id }),
                None => None,
            },
            ActionEvent::JumpReleased => {
                release_jump(character);
                None
            }
            ActionEvent::BasicAttack => basic_attack(character, ctx).map(|volume| GameEventData::AttackSpawned {
                character: id,
                volume,
                kind: AttackKind::Melee,
            }),
            ActionEvent::SpecialAttack => special_attack(character, ctx).map(|volume| GameEventData::AttackSpawned {
                character: id,
                volume,
                kind: AttackKind::Area,
            }),
            ActionEvent::ProjectileAttack => {
                projectile_attack(character, ctx).map(|volume| GameEventData::AttackSpawned {
                    character: id,
                    volume,
                    kind: AttackKind::Projectile,
                })
            }
            ActionEvent::ShieldPressed => {
                if let Some(position) = ctx.physics.position(character.body) {
                    character.position = position;
                }
                activate_shield(character, ctx.presenter, ctx.config)
                    .then_some(GameEventData::ShieldRaised { character: id })
            }
            ActionEvent::ShieldReleased => deactivate_shield(character, ctx.presenter)
                .then_some(GameEventData::ShieldLowered { character: id }),
            ActionEvent::Dodge { direction } => dodge(
                character,
                ctx.physics,
                ctx.presenter,
                direction,
                &self.config.fighter,
                ctx.config,
            )
            .then_some(GameEventData::Dodged {
                character: id,
                direction: direction.signum(),
            }),
        };

        if let Some(data) = data {
            self.emit(data);
        }
    }

    // =========================================================================
    // CHARACTERS
    // =========================================================================

    fn update_characters(&mut self, inputs: &BTreeMap<CharacterId, InputFrame>) {
        let tick = self.tick;
        let fighter = &self.config.fighter;

        // BTreeMap values_mut iterates in sorted order
        for (id, character) in self.characters.iter_mut() {
            if !character.in_world {
                continue;
            }
            let frame = inputs.get(id);
            let direction = frame.map_or(0, |f| f.direction());
            let fast_fall = frame.is_some_and(|f| f.fast_fall);

            if let Some(position) = self.physics.position(character.body) {
                character.position = position;
            }
            if let Some(velocity) = self.physics.velocity(character.body) {
                character.velocity = velocity;
            }

            update_movement(character, &mut self.physics, direction, fighter);
            apply_fast_fall(character, &mut self.physics, fast_fall, fighter);

            if resolve_buffered_jump(character, &mut self.physics, fighter) {
                self.events.push(GameEvent::new(tick, GameEventData::BufferedJumpFired { character: *id }));
            }
            continue_jump(character, &mut self.physics, fighter);

            attach_shield(character, &mut self.presenter);
            if let Some(visual) = character.visual {
                self.presenter.move_visual(visual, character.position);
            }

            #[cfg(feature = "debug-tracing")]
            trace!(
                tick,
                id = id.0,
                position = %character.position,
                velocity = %character.velocity,
                hv = character.horizontal_velocity,
                jump = ?character.jump.phase(),
                "character"
            );
        }
    }

    // =========================================================================
    // VOLUMES
    // =========================================================================

    fn update_volumes(&mut self) {
        self.volumes.sync_positions(&self.physics, &mut self.presenter);
        for volume in self.volumes.expire(self.tick, &mut self.physics, &mut self.presenter) {
            self.emit(GameEventData::AttackExpired {
                owner: volume.owner,
                volume: volume.id,
                kind: volume.kind,
            });
        }
    }

    // =========================================================================
    // BLAST ZONE
    // =========================================================================

    fn process_blast_zone(&mut self) {
        let tick = self.tick;
        for (id, character) in self.characters.iter_mut() {
            let Some(position) = check_exit(character, &self.blast_zone, &self.physics) else {
                continue;
            };
            handle_exit(
                character,
                &mut self.physics,
                &mut self.presenter,
                &mut self.respawns,
                tick,
                &self.config,
            );
            self.events.push(GameEvent::new(tick, GameEventData::BlastZoneExit { character: *id, position }));
        }
    }
}

/// Replay recorded inputs from the world's current tick.
///
/// `step_physics` runs after every tick, the same way the live host steps
/// its engine. Returns every tick's result.
pub fn replay<P, R, F>(
    world: &mut GameWorld<P, R>,
    recordings: &BTreeMap<CharacterId, InputRecording>,
    ticks: u32,
    mut step_physics: F,
) -> Vec<TickResult>
where
    P: PhysicsAdapter,
    R: Presenter,
    F: FnMut(&mut P),
{
    let mut results = Vec::with_capacity(ticks as usize);
    for _ in 0..ticks {
        let next = world.tick_count() + 1;
        let inputs: BTreeMap<CharacterId, InputFrame> = recordings
            .iter()
            .map(|(id, recording)| (*id, recording.get_input_at(next)))
            .collect();
        results.push(world.tick(&inputs));
        step_physics(world.physics_mut());
    }
    results
}
