//! Character State
//!
//! Everything the controllers read and mutate for one fighter. Position and
//! velocity belong to the physics collaborator; the copies here are the
//! snapshot taken at the start of the current tick.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::time::Ticks;
use crate::core::vec2::Vec2;
use crate::physics::{BodyHandle, PhysicsCategory};
use crate::presentation::VisualHandle;

// =============================================================================
// IDENTITY
// =============================================================================

/// Character identifier, assigned in roster order.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

/// Which side a character fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Human-controlled
    Player,
    /// Opponent
    Enemy,
}

impl Role {
    /// Physics category bit for this role.
    pub fn category(self) -> u32 {
        match self {
            Role::Player => PhysicsCategory::PLAYER,
            Role::Enemy => PhysicsCategory::ENEMY,
        }
    }

    /// Categories this role's attacks are contact-tested against.
    pub fn attack_targets(self) -> u32 {
        match self {
            Role::Player => PhysicsCategory::ENEMY,
            Role::Enemy => PhysicsCategory::PLAYER,
        }
    }
}

/// Horizontal facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing -X
    Left,
    /// Facing +X
    #[default]
    Right,
}

impl Facing {
    /// -1.0 or +1.0.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing for a non-zero direction, `None` for zero.
    pub fn from_direction(direction: i8) -> Option<Self> {
        match direction.signum() {
            -1 => Some(Facing::Left),
            1 => Some(Facing::Right),
            _ => None,
        }
    }
}

// =============================================================================
// JUMP STATE
// =============================================================================

/// Jump sub-state.
///
/// Counters are whole ticks. `hold_ticks` never exceeds the configured hold
/// window; `buffer_ticks` only means something while `queued` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpState {
    /// Jump button held since a jump fired
    pub held: bool,
    /// Airborne jump request waiting to fire
    pub queued: bool,
    /// Ticks left before a queued jump fires anyway
    pub buffer_ticks: Ticks,
    /// Ticks the hold impulse has been applied
    pub hold_ticks: Ticks,
}

/// Named view of the jump state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpPhase {
    /// No jump in progress
    Idle,
    /// Waiting to fire
    Buffered,
    /// Fired and button still held
    Held,
}

impl JumpState {
    /// Current phase.
    pub fn phase(&self) -> JumpPhase {
        if self.queued {
            JumpPhase::Buffered
        } else if self.held {
            JumpPhase::Held
        } else {
            JumpPhase::Idle
        }
    }
}

// =============================================================================
// SHIELD
// =============================================================================

/// Shield bubble attached to its owner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Center, follows the owner every tick
    pub position: Vec2,
    /// Full size (owner size plus padding)
    pub size: Vec2,
    /// Presenter handle, if the visual spawned
    pub visual: Option<VisualHandle>,
}

// =============================================================================
// CHARACTER
// =============================================================================

/// State of a single fighter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Character {
    /// Unique id
    pub id: CharacterId,
    /// Player or enemy
    pub role: Role,
    /// Physics body
    pub body: BodyHandle,
    /// Sprite handle, if the visual spawned
    pub visual: Option<VisualHandle>,
    /// Full body size
    pub size: Vec2,
    /// Position read from physics this tick
    pub position: Vec2,
    /// Velocity read from physics this tick
    pub velocity: Vec2,
    /// Facing direction
    pub facing: Facing,
    /// Target horizontal speed, clamped to the max speed
    pub horizontal_velocity: f32,
    /// Jump state machine
    pub jump: JumpState,
    /// Active shield, at most one
    pub shield: Option<Shield>,
    /// Where the character reappears after a blast-zone exit
    pub respawn_point: Vec2,
    /// In the active world (false between blast-zone exit and respawn)
    pub in_world: bool,
    /// Ticks left before another ledge grab is allowed
    pub regrab_cooldown_ticks: Ticks,
    /// Ticks of attack immunity left
    pub invulnerable_ticks: Ticks,
}

impl Character {
    /// Create a character bound to an existing physics body.
    pub fn new(
        id: CharacterId,
        role: Role,
        body: BodyHandle,
        size: Vec2,
        position: Vec2,
        respawn_point: Vec2,
    ) -> Self {
        Self {
            id,
            role,
            body,
            visual: None,
            size,
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            horizontal_velocity: 0.0,
            jump: JumpState::default(),
            shield: None,
            respawn_point,
            in_world: true,
            regrab_cooldown_ticks: 0,
            invulnerable_ticks: 0,
        }
    }

    /// Grounded approximation: vertical velocity is exactly zero.
    ///
    /// There is no ground sensor, so anything that zeroes vertical velocity
    /// (resting against a wall, the apex of a jump) also reads as grounded.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.velocity.y == 0.0
    }

    /// Whether a shield is up.
    #[inline]
    pub fn shield_active(&self) -> bool {
        self.shield.is_some()
    }

    /// Whether attack contacts should be ignored.
    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ticks > 0
    }

    /// Whether a ledge grab is allowed right now.
    #[inline]
    pub fn can_grab_ledge(&self) -> bool {
        self.regrab_cooldown_ticks == 0
    }

    /// Clear motion and jump state (used on respawn).
    pub fn reset_motion(&mut self) {
        self.velocity = Vec2::ZERO;
        self.horizontal_velocity = 0.0;
        self.jump = JumpState::default();
        self.regrab_cooldown_ticks = 0;
        self.invulnerable_ticks = 0;
    }

    /// Hash this character's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_f32(self.horizontal_velocity);
        hasher.update_bool(self.facing == Facing::Right);
        hasher.update_bool(self.jump.held);
        hasher.update_bool(self.jump.queued);
        hasher.update_u32(self.jump.buffer_ticks);
        hasher.update_u32(self.jump.hold_ticks);
        hasher.update_bool(self.shield.is_some());
        hasher.update_bool(self.in_world);
        hasher.update_u32(self.regrab_cooldown_ticks);
        hasher.update_u32(self.invulnerable_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> Character {
        Character::new(
            CharacterId(0),
            Role::Player,
            BodyHandle(1),
            Vec2::new(80.0, 80.0),
            Vec2::ZERO,
            Vec2::new(0.0, 180.0),
        )
    }

    #[test]
    fn test_grounded_is_exact_zero() {
        let mut c = character();
        assert!(c.is_grounded());

        c.velocity.y = -0.0001;
        assert!(!c.is_grounded());

        // Sliding along a wall still reads as grounded
        c.velocity = Vec2::new(120.0, 0.0);
        assert!(c.is_grounded());
    }

    #[test]
    fn test_jump_phase() {
        let mut jump = JumpState::default();
        assert_eq!(jump.phase(), JumpPhase::Idle);

        jump.queued = true;
        assert_eq!(jump.phase(), JumpPhase::Buffered);

        jump.queued = false;
        jump.held = true;
        assert_eq!(jump.phase(), JumpPhase::Held);
    }

    #[test]
    fn test_facing() {
        assert_eq!(Facing::from_direction(-1), Some(Facing::Left));
        assert_eq!(Facing::from_direction(1), Some(Facing::Right));
        assert_eq!(Facing::from_direction(0), None);
        assert_eq!(Facing::Left.sign(), -1.0);
    }

    #[test]
    fn test_role_categories() {
        assert_eq!(Role::Player.category(), PhysicsCategory::PLAYER);
        assert_eq!(Role::Player.attack_targets(), PhysicsCategory::ENEMY);
        assert_eq!(Role::Enemy.attack_targets(), PhysicsCategory::PLAYER);
    }

    #[test]
    fn test_reset_motion() {
        let mut c = character();
        c.horizontal_velocity = 250.0;
        c.velocity = Vec2::new(250.0, -300.0);
        c.jump.queued = true;
        c.jump.buffer_ticks = 4;
        c.regrab_cooldown_ticks = 10;

        c.reset_motion();

        assert_eq!(c.horizontal_velocity, 0.0);
        assert_eq!(c.velocity, Vec2::ZERO);
        assert_eq!(c.jump, JumpState::default());
        assert!(c.can_grab_ledge());
    }
}
