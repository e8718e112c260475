//! Game World
//!
//! Owns every character, attack volume, platform and ledge sensor, plus the
//! physics and presentation collaborators. The world is an ordinary value:
//! built by [`GameWorld::new`], advanced by [`GameWorld::tick`] and taken
//! apart by [`GameWorld::teardown`]. Nothing is global.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::{ConfigError, WorldConfig};
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::vec2::Vec2;
use crate::game::blast_zone::{BlastZone, RespawnSchedule};
use crate::game::character::{Character, CharacterId};
use crate::game::combat::{deactivate_shield, VolumeSet};
use crate::game::edge::{EdgeId, EdgeSide, EdgeZone};
use crate::game::events::GameEvent;
use crate::physics::{BodyDesc, BodyHandle, PhysicsAdapter};
use crate::presentation::{spawn_or_warn, Presenter, VisualHandle, VisualKind, VisualRequest};

/// A solid platform and its two ledge sensors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Platform {
    /// Center position
    pub position: Vec2,
    /// Full size
    pub size: Vec2,
    /// Static body
    pub body: BodyHandle,
    /// Presenter handle, if the visual spawned
    pub visual: Option<VisualHandle>,
    /// Left and right ledges
    pub edges: [EdgeId; 2],
}

/// What [`GameWorld::teardown`] released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Attack volumes removed
    pub volumes_removed: usize,
    /// Character, platform and ledge bodies removed
    pub bodies_removed: usize,
    /// Pending respawns cancelled
    pub respawns_cancelled: usize,
}

/// The simulation: characters, volumes, stage and collaborators.
pub struct GameWorld<P: PhysicsAdapter, R: Presenter> {
    pub(crate) config: WorldConfig,
    pub(crate) tick: u32,
    pub(crate) characters: BTreeMap<CharacterId, Character>,
    /// Character body to character lookup
    pub(crate) character_bodies: BTreeMap<BodyHandle, CharacterId>,
    pub(crate) volumes: VolumeSet,
    pub(crate) edges: BTreeMap<EdgeId, EdgeZone>,
    /// Edge sensor body to edge lookup
    pub(crate) edge_bodies: BTreeMap<BodyHandle, EdgeId>,
    pub(crate) platforms: Vec<Platform>,
    pub(crate) blast_zone: BlastZone,
    pub(crate) respawns: RespawnSchedule,
    pub(crate) physics: P,
    pub(crate) presenter: R,
    pub(crate) events: Vec<GameEvent>,
}

impl<P: PhysicsAdapter, R: Presenter> GameWorld<P, R> {
    /// Validate `config` and build the stage and roster.
    ///
    /// Character ids follow roster order starting at 0.
    pub fn new(config: WorldConfig, mut physics: P, mut presenter: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut edges = BTreeMap::new();
        let mut edge_bodies = BTreeMap::new();
        let mut platforms = Vec::with_capacity(config.platforms.len());

        for platform in &config.platforms {
            let body = physics.create_body(BodyDesc::platform(platform.position, platform.size));
            let visual = spawn_or_warn(
                &mut presenter,
                VisualRequest::new(VisualKind::Platform, platform.position, platform.size),
            );

            let [left, right] = platform.edge_positions();
            let mut ids = [EdgeId(0); 2];
            for (slot, (side, position)) in [(EdgeSide::Left, left), (EdgeSide::Right, right)]
                .into_iter()
                .enumerate()
            {
                let id = EdgeId(edges.len() as u32);
                let zone = EdgeZone::spawn(&mut physics, id, side, position, platform.edge_size());
                edge_bodies.insert(zone.body, id);
                edges.insert(id, zone);
                ids[slot] = id;
            }

            platforms.push(Platform {
                position: platform.position,
                size: platform.size,
                body,
                visual,
                edges: ids,
            });
        }

        let mut characters = BTreeMap::new();
        let mut character_bodies = BTreeMap::new();
        for (index, entry) in config.roster.iter().enumerate() {
            let id = CharacterId(index as u32);
            let body = physics.create_body(BodyDesc::character(entry.spawn, entry.size, entry.role.category()));
            let mut character = Character::new(id, entry.role, body, entry.size, entry.spawn, entry.respawn);
            character.visual = spawn_or_warn(
                &mut presenter,
                VisualRequest::new(VisualKind::Character, entry.spawn, entry.size),
            );
            character_bodies.insert(body, id);
            characters.insert(id, character);
        }

        info!(
            characters = characters.len(),
            platforms = platforms.len(),
            edges = edges.len(),
            "world created"
        );

        Ok(Self {
            blast_zone: BlastZone::from_config(&config),
            config,
            tick: 0,
            characters,
            character_bodies,
            volumes: VolumeSet::new(),
            edges,
            edge_bodies,
            platforms,
            respawns: RespawnSchedule::new(),
            physics,
            presenter,
            events: Vec::new(),
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Ticks simulated so far.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// World configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Look up a character.
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    /// Mutable character lookup, for hosts scripting state directly.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// All characters in id order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Character owning a physics body.
    pub fn character_by_body(&self, body: BodyHandle) -> Option<CharacterId> {
        self.character_bodies.get(&body).copied()
    }

    /// Live attack volumes.
    pub fn volumes(&self) -> &VolumeSet {
        &self.volumes
    }

    /// Ledge sensors in id order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeZone> {
        self.edges.values()
    }

    /// Platforms in config order.
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Padded play rectangle.
    pub fn blast_zone(&self) -> &BlastZone {
        &self.blast_zone
    }

    /// Pending respawns.
    pub fn respawns(&self) -> &RespawnSchedule {
        &self.respawns
    }

    /// Physics collaborator.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable physics collaborator; hosts step it between ticks.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Presentation collaborator.
    pub fn presenter(&self) -> &R {
        &self.presenter
    }

    /// Mutable presentation collaborator.
    pub fn presenter_mut(&mut self) -> &mut R {
        &mut self.presenter
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Take all events, sorted deterministically.
    pub(crate) fn take_events(&mut self) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.events);
        events.sort();
        events
    }

    // =========================================================================
    // VERIFICATION
    // =========================================================================

    /// Hash tick, characters, volumes and pending respawns.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            hasher.update_u32(self.characters.len() as u32);
            for character in self.characters.values() {
                character.hash_into(hasher);
            }
            self.volumes.hash_into(hasher);
            self.respawns.hash_into(hasher);
        })
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Remove every volume exactly once, lower shields, cancel pending
    /// respawns, release the roster and stage, and hand the collaborators
    /// back empty of anything this world created.
    pub fn teardown(mut self) -> (P, R, TeardownReport) {
        let volumes_removed = self.volumes.clear(&mut self.physics, &mut self.presenter);
        let respawns_cancelled = self.respawns.cancel_all();

        let mut bodies_removed = 0;
        for character in self.characters.values_mut() {
            deactivate_shield(character, &mut self.presenter);
            if let Some(visual) = character.visual.take() {
                self.presenter.remove_visual(visual);
            }
            self.physics.remove_body(character.body);
            bodies_removed += 1;
        }
        for platform in &mut self.platforms {
            if let Some(visual) = platform.visual.take() {
                self.presenter.remove_visual(visual);
            }
            self.physics.remove_body(platform.body);
            bodies_removed += 1;
        }
        for edge in self.edges.values() {
            self.physics.remove_body(edge.body);
            bodies_removed += 1;
        }

        let report = TeardownReport {
            volumes_removed,
            bodies_removed,
            respawns_cancelled,
        };
        debug!(?report, tick = self.tick, "world torn down");
        (self.physics, self.presenter, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::Role;
    use crate::physics::ArenaPhysics;
    use crate::presentation::RecordingPresenter;

    fn world() -> GameWorld<ArenaPhysics, RecordingPresenter> {
        GameWorld::new(WorldConfig::default(), ArenaPhysics::default(), RecordingPresenter::new()).unwrap()
    }

    #[test]
    fn test_world_creation() {
        let world = world();

        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.characters().count(), 2);
        assert_eq!(world.platforms().len(), 1);
        assert_eq!(world.edges().count(), 2);

        let player = world.character(CharacterId(0)).unwrap();
        assert_eq!(player.role, Role::Player);
        assert_eq!(player.respawn_point, Vec2::new(0.0, 180.0));
        assert_eq!(world.character_by_body(player.body), Some(CharacterId(0)));

        // 1 platform + 2 edges + 2 characters
        assert_eq!(world.physics().body_count(), 5);
        assert_eq!(world.presenter().count(VisualKind::Character), 2);
        assert_eq!(world.presenter().count(VisualKind::Platform), 1);
    }

    #[test]
    fn test_edges_sit_at_platform_ends() {
        let world = world();
        let [left, right] = world.platforms()[0].edges;

        let left = &world.edges[&left];
        let right = &world.edges[&right];
        assert_eq!(left.side, EdgeSide::Left);
        assert_eq!(left.position, Vec2::new(-300.0, -130.0));
        assert_eq!(right.position, Vec2::new(300.0, -130.0));
        assert_eq!(right.size, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = WorldConfig::default();
        config.fighter.max_speed = 0.0;

        let result = GameWorld::new(config, ArenaPhysics::default(), RecordingPresenter::new());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_character_sprite_is_not_fatal() {
        let presenter = RecordingPresenter::new().with_missing(VisualKind::Character);
        let world = GameWorld::new(WorldConfig::default(), ArenaPhysics::default(), presenter).unwrap();

        assert!(world.characters().all(|c| c.visual.is_none()));
        assert_eq!(world.characters().count(), 2);
    }

    #[test]
    fn test_hash_is_stable() {
        let a = world();
        let b = world();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_teardown_of_fresh_world() {
        let (physics, presenter, report) = world().teardown();

        assert_eq!(
            report,
            TeardownReport {
                volumes_removed: 0,
                bodies_removed: 5,
                respawns_cancelled: 0,
            }
        );
        assert_eq!(physics.body_count(), 0);
        // 2 characters + 1 platform
        assert_eq!(presenter.removed.len(), 3);
        assert!(presenter.live.is_empty());
    }
}
