//! Blast Zone and Respawn
//!
//! A character whose position leaves the visible area expanded by the blast
//! zone padding is taken out of the world and put back at its respawn point
//! after a fixed delay. Pending respawns live in a [`RespawnSchedule`] keyed
//! by character, checked once per tick and cancelled wholesale on teardown.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::WorldConfig;
use crate::core::hash::StateHasher;
use crate::core::time::seconds_to_ticks;
use crate::core::vec2::Vec2;
use crate::game::character::{Character, CharacterId};
use crate::game::combat::deactivate_shield;
use crate::physics::PhysicsAdapter;
use crate::presentation::{spawn_or_warn, Presenter, VisualKind, VisualRequest};

// =============================================================================
// BOUNDS
// =============================================================================

/// Padded play rectangle, centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlastZone {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl BlastZone {
    /// Visible half extents grown by `padding` on every side.
    pub fn new(half_width: f32, half_height: f32, padding: f32) -> Self {
        let half = Vec2::new(half_width + padding, half_height + padding);
        Self { min: -half, max: half }
    }

    /// Zone for a world configuration.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.half_width, config.half_height, config.blast_zone_padding)
    }

    /// Whether `position` is still in play. The boundary itself is inside.
    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.y >= self.min.y
            && position.y <= self.max.y
    }
}

// =============================================================================
// RESPAWN SCHEDULE
// =============================================================================

/// Pending respawns: character to the tick it re-enters on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RespawnSchedule {
    due: BTreeMap<CharacterId, u32>,
}

impl RespawnSchedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` to respawn on `tick`. A later call replaces an earlier one.
    pub fn schedule(&mut self, id: CharacterId, tick: u32) {
        self.due.insert(id, tick);
    }

    /// Tick `id` is due on, if pending.
    pub fn due_tick(&self, id: CharacterId) -> Option<u32> {
        self.due.get(&id).copied()
    }

    /// Remove and return every character due on or before `tick`, in id order.
    pub fn take_due(&mut self, tick: u32) -> Vec<CharacterId> {
        let ready: Vec<CharacterId> = self
            .due
            .iter()
            .filter(|(_, &due)| due <= tick)
            .map(|(&id, _)| id)
            .collect();
        for id in &ready {
            self.due.remove(id);
        }
        ready
    }

    /// Drop every pending respawn. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.due.len();
        self.due.clear();
        count
    }

    /// Number of pending respawns.
    pub fn len(&self) -> usize {
        self.due.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    /// Hash pending respawns for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.due.len() as u32);
        for (id, tick) in &self.due {
            hasher.update_u32(id.0);
            hasher.update_u32(*tick);
        }
    }
}

// =============================================================================
// MONITOR
// =============================================================================

/// Return the character's position if it has left `zone`.
///
/// Characters out of the world or without a body are never reported.
pub fn check_exit<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    zone: &BlastZone,
    physics: &P,
) -> Option<Vec2> {
    if !character.in_world {
        return None;
    }
    let position = physics.position(character.body)?;
    character.position = position;
    (!zone.contains(position)).then_some(position)
}

/// Take `character` out of the world and schedule its respawn.
///
/// The explosion is cosmetic: if its visual can't be spawned the exit still
/// happens.
pub fn handle_exit<P, R>(
    character: &mut Character,
    physics: &mut P,
    presenter: &mut R,
    schedule: &mut RespawnSchedule,
    tick: u32,
    config: &WorldConfig,
) where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let position = character.position;
    spawn_or_warn(
        presenter,
        VisualRequest::new(VisualKind::Explosion, position, character.size).with_ttl(config.explosion_ttl),
    );

    physics.set_active(character.body, false);
    if let Some(visual) = character.visual {
        presenter.set_visible(visual, false);
    }
    deactivate_shield(character, presenter);
    character.in_world = false;

    let due = tick + seconds_to_ticks(config.respawn_delay);
    schedule.schedule(character.id, due);
    debug!(id = character.id.0, position = %position, due, "blast zone exit");
}

/// Put `character` back at its respawn point at rest.
pub fn respawn<P, R>(character: &mut Character, physics: &mut P, presenter: &mut R) -> Vec2
where
    P: PhysicsAdapter + ?Sized,
    R: Presenter + ?Sized,
{
    let position = character.respawn_point;
    if !physics.is_active(character.body) {
        physics.set_active(character.body, true);
    }
    physics.set_position(character.body, position);
    physics.set_velocity(character.body, Vec2::ZERO);
    physics.set_angular_velocity(character.body, 0.0);

    character.reset_motion();
    character.position = position;
    character.in_world = true;

    if let Some(visual) = character.visual {
        presenter.move_visual(visual, position);
        presenter.set_visible(visual, true);
    }
    debug!(id = character.id.0, position = %position, "respawned");
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::Role;
    use crate::physics::{ArenaPhysics, BodyDesc, PhysicsCategory};
    use crate::presentation::RecordingPresenter;

    fn setup(position: Vec2) -> (ArenaPhysics, RecordingPresenter, Character) {
        let mut physics = ArenaPhysics::default();
        let mut presenter = RecordingPresenter::new();
        let size = Vec2::new(40.0, 40.0);
        let body = physics.create_body(BodyDesc::character(position, size, PhysicsCategory::ENEMY));
        let mut character = Character::new(
            CharacterId(1),
            Role::Enemy,
            body,
            size,
            position,
            Vec2::new(100.0, 180.0),
        );
        character.visual = presenter
            .spawn_visual(VisualRequest::new(VisualKind::Character, position, size))
            .ok();
        (physics, presenter, character)
    }

    #[test]
    fn test_zone_boundaries() {
        let zone = BlastZone::new(640.0, 360.0, 200.0);

        assert!(zone.contains(Vec2::ZERO));
        assert!(zone.contains(Vec2::new(840.0, -560.0)));
        assert!(!zone.contains(Vec2::new(840.1, 0.0)));
        assert!(!zone.contains(Vec2::new(-840.1, 0.0)));
        assert!(!zone.contains(Vec2::new(0.0, 560.1)));
        assert!(!zone.contains(Vec2::new(0.0, -560.1)));
    }

    #[test]
    fn test_zone_from_default_config() {
        let zone = BlastZone::from_config(&WorldConfig::default());
        assert_eq!(zone.max, Vec2::new(840.0, 560.0));
        assert_eq!(zone.min, Vec2::new(-840.0, -560.0));
    }

    #[test]
    fn test_schedule_take_due() {
        let mut schedule = RespawnSchedule::new();
        schedule.schedule(CharacterId(2), 130);
        schedule.schedule(CharacterId(0), 120);

        assert!(schedule.take_due(119).is_empty());
        assert_eq!(schedule.take_due(120), vec![CharacterId(0)]);
        assert_eq!(schedule.take_due(200), vec![CharacterId(2)]);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_schedule_cancel_all() {
        let mut schedule = RespawnSchedule::new();
        schedule.schedule(CharacterId(0), 10);
        schedule.schedule(CharacterId(1), 20);

        assert_eq!(schedule.cancel_all(), 2);
        assert!(schedule.take_due(u32::MAX).is_empty());
    }

    #[test]
    fn test_check_exit() {
        let zone = BlastZone::new(640.0, 360.0, 200.0);
        let (mut physics, _, mut c) = setup(Vec2::new(0.0, -900.0));

        assert_eq!(check_exit(&mut c, &zone, &physics), Some(Vec2::new(0.0, -900.0)));

        physics.set_position(c.body, Vec2::ZERO);
        assert_eq!(check_exit(&mut c, &zone, &physics), None);

        physics.set_position(c.body, Vec2::new(0.0, -900.0));
        c.in_world = false;
        assert_eq!(check_exit(&mut c, &zone, &physics), None);
    }

    #[test]
    fn test_exit_then_respawn() {
        let config = WorldConfig::default();
        let (mut physics, mut presenter, mut c) = setup(Vec2::new(0.0, -900.0));
        let mut schedule = RespawnSchedule::new();
        physics.set_velocity(c.body, Vec2::new(50.0, -700.0));
        c.horizontal_velocity = 50.0;
        c.position = Vec2::new(0.0, -900.0);

        handle_exit(&mut c, &mut physics, &mut presenter, &mut schedule, 40, &config);

        assert!(!c.in_world);
        assert!(!physics.is_active(c.body));
        assert_eq!(schedule.due_tick(c.id), Some(160));
        assert_eq!(presenter.count(VisualKind::Explosion), 1);
        assert!(!presenter.get(c.visual.unwrap()).unwrap().visible);

        let position = respawn(&mut c, &mut physics, &mut presenter);

        assert_eq!(position, Vec2::new(100.0, 180.0));
        assert!(c.in_world);
        assert!(physics.is_active(c.body));
        assert_eq!(physics.position(c.body), Some(position));
        assert_eq!(physics.velocity(c.body), Some(Vec2::ZERO));
        assert_eq!(physics.angular_velocity(c.body), Some(0.0));
        assert_eq!(c.horizontal_velocity, 0.0);
        assert!(presenter.get(c.visual.unwrap()).unwrap().visible);
    }

    #[test]
    fn test_exit_survives_missing_explosion() {
        let config = WorldConfig::default();
        let (mut physics, _, mut c) = setup(Vec2::new(2000.0, 0.0));
        let mut presenter = RecordingPresenter::new().with_missing(VisualKind::Explosion);
        let mut schedule = RespawnSchedule::new();

        handle_exit(&mut c, &mut physics, &mut presenter, &mut schedule, 0, &config);

        assert!(!c.in_world);
        assert_eq!(schedule.len(), 1);
    }
}
