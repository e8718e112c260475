//! Combat Controller
//!
//! Attacks, dodge and shield. Attacks are stateless spawns with no cooldown:
//! every request is honored immediately. Each spawn creates an
//! [`AttackVolume`] with a fixed lifetime; the [`VolumeSet`] removes it on
//! the exact tick that lifetime ends, or at world teardown, never both.
//!
//! Contacts between a volume and a target only produce an
//! [`AttackHit`](GameEventData::AttackHit) event. There is no health model
//! to apply damage to.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::{AttackConfig, FighterConfig};
use crate::core::hash::StateHasher;
use crate::core::time::{seconds_to_ticks, Ticks};
use crate::core::vec2::Vec2;
use crate::game::character::{Character, CharacterId, Shield};
use crate::game::events::GameEventData;
use crate::physics::{BodyDesc, BodyHandle, PhysicsAdapter, PhysicsCategory};
use crate::presentation::{spawn_or_warn, Animation, Presenter, VisualHandle, VisualKind, VisualRequest};

// =============================================================================
// ATTACK VOLUMES
// =============================================================================

/// Attack volume identifier (monotonic counter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VolumeId(pub u32);

/// Kind of attack volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttackKind {
    /// Static hitbox in front of the attacker
    Melee = 0,
    /// Growing burst centered on the attacker (cosmetic)
    Area = 1,
    /// Moving hitbox
    Projectile = 2,
}

/// A transient attack region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttackVolume {
    /// Unique id
    pub id: VolumeId,
    /// Kind
    pub kind: AttackKind,
    /// Attacker
    pub owner: CharacterId,
    /// Center position (tracked from physics for moving volumes)
    pub position: Vec2,
    /// Full size
    pub size: Vec2,
    /// Initial velocity, for moving volumes
    pub velocity: Option<Vec2>,
    /// Tick the volume was spawned
    pub spawned_tick: u32,
    /// Tick on which the volume is removed
    pub expires_tick: u32,
    /// Sensor body, if contact-tested
    pub body: Option<BodyHandle>,
    /// Presenter handle, if the visual spawned
    pub visual: Option<VisualHandle>,
}

impl AttackVolume {
    /// Lifetime in ticks.
    pub fn ttl_ticks(&self) -> Ticks {
        self.expires_tick - self.spawned_tick
    }

    /// Whether this volume takes part in contact tests.
    pub fn is_contact_tested(&self) -> bool {
        self.body.is_some()
    }
}

/// Live attack volumes, keyed by id for deterministic iteration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VolumeSet {
    volumes: BTreeMap<VolumeId, AttackVolume>,
    next_id: u32,
    /// Sensor body to volume lookup
    #[serde(skip)]
    by_body: BTreeMap<BodyHandle, VolumeId>,
}

impl VolumeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live volumes.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no volumes are live.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Look up a volume.
    pub fn get(&self, id: VolumeId) -> Option<&AttackVolume> {
        self.volumes.get(&id)
    }

    /// Find the volume owning a sensor body.
    pub fn by_body(&self, body: BodyHandle) -> Option<&AttackVolume> {
        self.by_body.get(&body).and_then(|id| self.volumes.get(id))
    }

    /// Iterate live volumes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackVolume> {
        self.volumes.values()
    }

    fn allocate_id(&mut self) -> VolumeId {
        let id = VolumeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, volume: AttackVolume) -> VolumeId {
        let id = volume.id;
        if let Some(body) = volume.body {
            self.by_body.insert(body, id);
        }
        self.volumes.insert(id, volume);
        id
    }

    /// Follow moving volumes and move their visuals along.
    pub fn sync_positions<P, R>(&mut self, physics: &P, presenter: &mut R)
    where
        P: PhysicsAdapter + ?Sized,
        R: Presenter + ?Sized,
    {
        for volume in self.volumes.values_mut() {
            if volume.velocity.is_none() {
                continue;
            }
            if let Some(position) = volume.body.and_then(|b| physics.position(b)) {
                volume.position = position;
                if let Some(visual) = volume.visual {
                    presenter.move_visual(visual, position);
                }
            }
        }
    }

    /// Remove every volume whose lifetime ends on `tick`.
    pub fn expire<P, R>(&mut self, tick: u32, physics: &mut P, presenter: &mut R) -> Vec<AttackVolume>
    where
        P: PhysicsAdapter + ?Sized,
        R: Presenter + ?Sized,
    {
        let due: Vec<VolumeId> = self
            .volumes
            .values()
            .filter(|v| tick >= v.expires_tick)
            .map(|v| v.id)
            .collect();

        due.into_iter()
            .filter_map(|id| self.remove(id, physics, presenter))
            .collect()
    }

    /// Remove a single volume and release its body and visual.
    pub fn remove<P, R>(&mut self, id: VolumeId, physics: &mut P, presenter: &mut R) -> Option<AttackVolume>
    where
        P: PhysicsAdapter + ?Sized,
        R: Presenter + ?Sized,
    {
        let volume = self.volumes.remove(&id)?;
        if let Some(body) = volume.body {
            self.by_body.remove(&body);
            physics.remove_body(body);
        }
        if let Some(visual) = volume.visual {
            presenter.remove_visual(visual);
        }
        Some(volume)
    }

    /// Remove every volume (world teardown).
    pub fn clear<P, R>(&mut self, physics: &mut P, presenter: &mut R) -> usize
    where
        P: PhysicsAdapter + ?Sized,
        R: Presenter + ?Sized,
    {
        let ids: Vec<VolumeId> = self.volumes.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.remove(id, physics, presenter))
            .count()
    }

    /// Hash live volumes for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.next_id);
        for volume in self.volumes.values() {
            hasher.update_u32(volume.id.0);
            hasher.update_u8(volume.kind as u8);
            hasher.update_u32(volume.owner.0);
            hasher.update_vec2(volume.position);
            hasher.update_u32(volume.expires_tick);
        }
    }
}

/// Everything an attack spawn needs besides the attacker.
pub struct SpawnContext<'a, P: ?Sized, R: ?Sized> {
    /// Current tick
    pub tick: u32,
    /// Live volumes
    pub volumes: &'a mut VolumeSet,
    /// Physics collaborator
    pub physics: &'a mut P,
    /// Presentation collaborator
    pub presenter: &'a mut R,
    /// Attack tuning
    pub config: &'a AttackConfig,
}

/// Fresh attacker position, or `None` if its body is gone.
fn attacker_position<P: PhysicsAdapter + ?Sized>(character: &mut Character, physics: &P) -> Option<Vec2> {
    let position = physics.position(character.body)?;
    character.position = position;
    Some(position)
}

/// Spawn a static melee hitbox in front of the attacker.
pub fn basic_attack<P, R>(character: &mut Character, ctx: SpawnContext<'_, P, R>) -> Option<VolumeId>
where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let origin = attacker_position(character, ctx.physics)?;
    let size = ctx.config.basic_size;
    let offset = character.facing.sign() * (character.size.x / 2.0 + size.x / 2.0);
    let position = origin + Vec2::new(offset, 0.0);

    let body = ctx.physics.create_body(BodyDesc::sensor(
        position,
        size,
        PhysicsCategory::ATTACK,
        character.role.attack_targets(),
    ));
    let visual = spawn_or_warn(ctx.presenter, VisualRequest::new(VisualKind::MeleeHitbox, position, size));

    let id = ctx.volumes.allocate_id();
    debug!(id = character.id.0, volume = id.0, "basic attack");
    Some(ctx.volumes.insert(AttackVolume {
        id,
        kind: AttackKind::Melee,
        owner: character.id,
        position,
        size,
        velocity: None,
        spawned_tick: ctx.tick,
        expires_tick: ctx.tick + seconds_to_ticks(ctx.config.basic_ttl),
        body: Some(body),
        visual,
    }))
}

/// Spawn the cosmetic special burst centered on the attacker.
///
/// It grows, then fades, then is removed. It has no sensor body.
pub fn special_attack<P, R>(character: &mut Character, ctx: SpawnContext<'_, P, R>) -> Option<VolumeId>
where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let position = attacker_position(character, ctx.physics)?;
    let size = ctx.config.special_size;
    let animation = Animation::GrowThenFade {
        scale: ctx.config.special_scale,
        grow: ctx.config.special_grow_time,
        fade: ctx.config.special_fade_time,
    };
    let visual = spawn_or_warn(
        ctx.presenter,
        VisualRequest::new(VisualKind::SpecialBurst, position, size).with_animation(animation),
    );

    let ttl = ctx.config.special_grow_time + ctx.config.special_fade_time;
    let id = ctx.volumes.allocate_id();
    debug!(id = character.id.0, volume = id.0, "special attack");
    Some(ctx.volumes.insert(AttackVolume {
        id,
        kind: AttackKind::Area,
        owner: character.id,
        position,
        size,
        velocity: None,
        spawned_tick: ctx.tick,
        expires_tick: ctx.tick + seconds_to_ticks(ttl),
        body: None,
        visual,
    }))
}

/// Spawn a projectile travelling forward at a fixed speed.
pub fn projectile_attack<P, R>(character: &mut Character, ctx: SpawnContext<'_, P, R>) -> Option<VolumeId>
where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let origin = attacker_position(character, ctx.physics)?;
    let size = ctx.config.projectile_size;
    let sign = character.facing.sign();
    let position = origin + Vec2::new(sign * (character.size.x / 2.0 + size.x / 2.0), 0.0);
    let velocity = Vec2::new(sign * ctx.config.projectile_speed, 0.0);

    let body = ctx.physics.create_body(BodyDesc::moving_sensor(
        position,
        size,
        velocity,
        PhysicsCategory::ATTACK,
        character.role.attack_targets(),
    ));
    let visual = spawn_or_warn(ctx.presenter, VisualRequest::new(VisualKind::Projectile, position, size));

    let id = ctx.volumes.allocate_id();
    debug!(id = character.id.0, volume = id.0, "projectile attack");
    Some(ctx.volumes.insert(AttackVolume {
        id,
        kind: AttackKind::Projectile,
        owner: character.id,
        position,
        size,
        velocity: Some(velocity),
        spawned_tick: ctx.tick,
        expires_tick: ctx.tick + seconds_to_ticks(ctx.config.projectile_ttl),
        body: Some(body),
        visual,
    }))
}

// =============================================================================
// DODGE & SHIELD
// =============================================================================

/// Lateral dodge impulse plus a fade cue.
///
/// Invulnerability only applies when `dodge_invulnerability_time` is set;
/// the shipped tuning grants none. Returns false if the body is gone.
pub fn dodge<P, R>(
    character: &mut Character,
    physics: &mut P,
    presenter: &mut R,
    direction: i8,
    fighter: &FighterConfig,
    attacks: &AttackConfig,
) -> bool
where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let Some(position) = attacker_position(character, physics) else {
        return false;
    };

    let direction = direction.signum();
    physics.apply_impulse(character.body, Vec2::new(direction as f32 * fighter.dodge_impulse, 0.0));
    character.invulnerable_ticks = seconds_to_ticks(fighter.dodge_invulnerability_time);

    let cue = Animation::FadeOutIn {
        alpha: attacks.dodge_fade_alpha,
        half_duration: attacks.dodge_fade_time,
    };
    spawn_or_warn(
        presenter,
        VisualRequest::new(VisualKind::DodgeCue, position, character.size)
            .with_ttl(attacks.dodge_fade_time * 2.0)
            .with_animation(cue),
    );
    debug!(id = character.id.0, direction, "dodge");
    true
}

/// Raise the shield. Raising it again replaces the existing one.
///
/// Returns true if no shield was up before.
pub fn activate_shield<R: Presenter + ?Sized>(
    character: &mut Character,
    presenter: &mut R,
    attacks: &AttackConfig,
) -> bool {
    let newly_raised = !deactivate_shield(character, presenter);

    let size = character.size.grow(attacks.shield_padding);
    let visual = spawn_or_warn(
        presenter,
        VisualRequest::new(VisualKind::Shield, character.position, size),
    );
    character.shield = Some(Shield {
        position: character.position,
        size,
        visual,
    });
    newly_raised
}

/// Lower the shield. Returns true if one was up.
pub fn deactivate_shield<R: Presenter + ?Sized>(character: &mut Character, presenter: &mut R) -> bool {
    match character.shield.take() {
        Some(shield) => {
            if let Some(visual) = shield.visual {
                presenter.remove_visual(visual);
            }
            true
        }
        None => false,
    }
}

/// Keep the shield centered on its owner.
pub fn attach_shield<R: Presenter + ?Sized>(character: &mut Character, presenter: &mut R) {
    let position = character.position;
    if let Some(shield) = character.shield.as_mut() {
        shield.position = position;
        if let Some(visual) = shield.visual {
            presenter.move_visual(visual, position);
        }
    }
}

/// Turn a volume/target contact into a hit event.
///
/// Own attacks, removed targets and invulnerable targets produce nothing.
pub fn resolve_attack_contact(volume: &AttackVolume, target: &Character) -> Option<GameEventData> {
    if volume.owner == target.id || !target.in_world || target.is_invulnerable() {
        return None;
    }
    Some(GameEventData::AttackHit {
        owner: volume.owner,
        volume: volume.id,
        target: target.id,
        shielded: target.shield_active(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::{Facing, Role};
    use crate::physics::ArenaPhysics;
    use crate::presentation::RecordingPresenter;

    struct Rig {
        physics: ArenaPhysics,
        presenter: RecordingPresenter,
        volumes: VolumeSet,
        config: AttackConfig,
        character: Character,
    }

    impl Rig {
        fn new() -> Self {
            let mut physics = ArenaPhysics::new(Vec2::ZERO);
            let body = physics.create_body(BodyDesc::character(
                Vec2::new(10.0, 20.0),
                Vec2::new(80.0, 80.0),
                PhysicsCategory::PLAYER,
            ));
            let character = Character::new(
                CharacterId(0),
                Role::Player,
                body,
                Vec2::new(80.0, 80.0),
                Vec2::new(10.0, 20.0),
                Vec2::ZERO,
            );
            Self {
                physics,
                presenter: RecordingPresenter::new(),
                volumes: VolumeSet::new(),
                config: AttackConfig::default(),
                character,
            }
        }

        fn ctx(&mut self, tick: u32) -> (&mut Character, SpawnContext<'_, ArenaPhysics, RecordingPresenter>) {
            (
                &mut self.character,
                SpawnContext {
                    tick,
                    volumes: &mut self.volumes,
                    physics: &mut self.physics,
                    presenter: &mut self.presenter,
                    config: &self.config,
                },
            )
        }
    }

    #[test]
    fn test_basic_attack_spawns_in_facing_direction() {
        let mut rig = Rig::new();
        rig.character.facing = Facing::Left;
        let (c, ctx) = rig.ctx(0);
        let id = basic_attack(c, ctx).unwrap();

        let volume = rig.volumes.get(id).unwrap();
        assert_eq!(volume.kind, AttackKind::Melee);
        assert_eq!(volume.position, Vec2::new(10.0 - 65.0, 20.0));
        assert_eq!(volume.ttl_ticks(), 12);
        assert!(volume.is_contact_tested());
        assert_eq!(rig.presenter.count(VisualKind::MeleeHitbox), 1);
    }

    #[test]
    fn test_projectile_moves_forward() {
        let mut rig = Rig::new();
        let (c, ctx) = rig.ctx(0);
        let id = projectile_attack(c, ctx).unwrap();

        let volume = rig.volumes.get(id).unwrap().clone();
        assert_eq!(volume.velocity, Some(Vec2::new(500.0, 0.0)));
        assert_eq!(volume.ttl_ticks(), 120);

        rig.physics.step(crate::TICK_DT);
        rig.volumes.sync_positions(&rig.physics, &mut rig.presenter);
        assert!(rig.volumes.get(id).unwrap().position.x > volume.position.x);
    }

    #[test]
    fn test_special_is_not_contact_tested() {
        let mut rig = Rig::new();
        let bodies_before = rig.physics.body_count();
        let (c, ctx) = rig.ctx(0);
        let id = special_attack(c, ctx).unwrap();

        let volume = rig.volumes.get(id).unwrap();
        assert_eq!(volume.kind, AttackKind::Area);
        assert!(!volume.is_contact_tested());
        assert_eq!(volume.ttl_ticks(), 36);
        assert_eq!(rig.physics.body_count(), bodies_before);
    }

    #[test]
    fn test_volume_expires_exactly_at_ttl() {
        let mut rig = Rig::new();
        let (c, ctx) = rig.ctx(100);
        let id = basic_attack(c, ctx).unwrap();
        let body = rig.volumes.get(id).unwrap().body.unwrap();

        for tick in 100..112 {
            assert!(rig.volumes.expire(tick, &mut rig.physics, &mut rig.presenter).is_empty());
        }
        let expired = rig.volumes.expire(112, &mut rig.physics, &mut rig.presenter);

        assert_eq!(expired.len(), 1);
        assert!(rig.volumes.is_empty());
        assert!(!rig.physics.contains(body));
        assert_eq!(rig.presenter.removed.len(), 1);

        // Removed exactly once
        assert!(rig.volumes.expire(113, &mut rig.physics, &mut rig.presenter).is_empty());
        assert_eq!(rig.presenter.removed.len(), 1);
    }

    #[test]
    fn test_clear_removes_everything_once() {
        let mut rig = Rig::new();
        for tick in 0..3 {
            let (c, ctx) = rig.ctx(tick);
            projectile_attack(c, ctx);
        }

        assert_eq!(rig.volumes.clear(&mut rig.physics, &mut rig.presenter), 3);
        assert_eq!(rig.volumes.clear(&mut rig.physics, &mut rig.presenter), 0);
        assert_eq!(rig.physics.body_count(), 1);
    }

    #[test]
    fn test_attack_without_body_is_noop() {
        let mut rig = Rig::new();
        rig.physics.remove_body(rig.character.body);
        let (c, ctx) = rig.ctx(0);
        assert!(basic_attack(c, ctx).is_none());
        assert!(rig.volumes.is_empty());
    }

    #[test]
    fn test_missing_visual_still_spawns_volume() {
        let mut rig = Rig::new();
        rig.presenter = RecordingPresenter::new().with_missing(VisualKind::Projectile);
        let (c, ctx) = rig.ctx(0);
        let id = projectile_attack(c, ctx).unwrap();

        let volume = rig.volumes.get(id).unwrap();
        assert!(volume.visual.is_none());
        assert!(volume.body.is_some());
    }

    #[test]
    fn test_dodge_impulse_and_cue() {
        let mut rig = Rig::new();
        let fighter = FighterConfig::default();

        assert!(dodge(&mut rig.character, &mut rig.physics, &mut rig.presenter, -1, &fighter, &rig.config));

        assert_eq!(rig.physics.velocity(rig.character.body), Some(Vec2::new(-300.0, 0.0)));
        assert_eq!(rig.presenter.count(VisualKind::DodgeCue), 1);
        assert!(!rig.character.is_invulnerable());
    }

    #[test]
    fn test_dodge_invulnerability_when_configured() {
        let mut rig = Rig::new();
        let fighter = FighterConfig {
            dodge_invulnerability_time: 0.25,
            ..FighterConfig::default()
        };

        dodge(&mut rig.character, &mut rig.physics, &mut rig.presenter, 1, &fighter, &rig.config);

        assert_eq!(rig.character.invulnerable_ticks, 15);
    }

    #[test]
    fn test_shield_replaces_instead_of_stacking() {
        let mut rig = Rig::new();

        assert!(activate_shield(&mut rig.character, &mut rig.presenter, &rig.config));
        assert!(!activate_shield(&mut rig.character, &mut rig.presenter, &rig.config));

        assert_eq!(rig.presenter.count(VisualKind::Shield), 1);
        assert_eq!(rig.character.shield.unwrap().size, Vec2::new(100.0, 100.0));

        assert!(deactivate_shield(&mut rig.character, &mut rig.presenter));
        assert!(!deactivate_shield(&mut rig.character, &mut rig.presenter));
        assert_eq!(rig.presenter.count(VisualKind::Shield), 0);
    }

    #[test]
    fn test_shield_follows_owner() {
        let mut rig = Rig::new();
        activate_shield(&mut rig.character, &mut rig.presenter, &rig.config);

        rig.character.position = Vec2::new(50.0, 60.0);
        attach_shield(&mut rig.character, &mut rig.presenter);

        let shield = rig.character.shield.unwrap();
        assert_eq!(shield.position, Vec2::new(50.0, 60.0));
        let visual = rig.presenter.get(shield.visual.unwrap()).unwrap();
        assert_eq!(visual.request.position, Vec2::new(50.0, 60.0));
    }

    #[test]
    fn test_resolve_attack_contact() {
        let mut rig = Rig::new();
        let (c, ctx) = rig.ctx(0);
        let id = basic_attack(c, ctx).unwrap();
        let volume = rig.volumes.get(id).unwrap().clone();

        let mut target = Character::new(
            CharacterId(1),
            Role::Enemy,
            BodyHandle(50),
            Vec2::new(40.0, 40.0),
            Vec2::ZERO,
            Vec2::ZERO,
        );

        // Own attack never hits
        assert!(resolve_attack_contact(&volume, &rig.character).is_none());

        target.shield = Some(Shield { position: Vec2::ZERO, size: Vec2::ZERO, visual: None });
        assert_eq!(
            resolve_attack_contact(&volume, &target),
            Some(GameEventData::AttackHit {
                owner: CharacterId(0),
                volume: id,
                target: CharacterId(1),
                shielded: true,
            })
        );

        target.invulnerable_ticks = 3;
        assert!(resolve_attack_contact(&volume, &target).is_none());
    }
}
