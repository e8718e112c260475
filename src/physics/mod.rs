//! Physics Collaborator
//!
//! The simulation never integrates bodies itself. It talks to an external
//! engine through [`PhysicsAdapter`]: impulses, velocity reads and writes,
//! teleports, and a feed of begin-contact events tagged with category bits.
//!
//! Every accessor tolerates unknown handles. A getter returns `None` and a
//! setter does nothing, so a character whose body went missing degrades
//! into a no-op instead of aborting the tick.

pub mod sandbox;

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;

pub use sandbox::ArenaPhysics;

// =============================================================================
// CATEGORIES
// =============================================================================

/// Category bitmask table (combinable flags).
pub struct PhysicsCategory;

impl PhysicsCategory {
    /// No category
    pub const NONE: u32 = 0;
    /// Player-controlled character
    pub const PLAYER: u32 = 0x1 << 0;
    /// Opponent character
    pub const ENEMY: u32 = 0x1 << 1;
    /// Attack volume (sensor)
    pub const ATTACK: u32 = 0x1 << 2;
    /// Ledge sensor zone
    pub const EDGE: u32 = 0x1 << 3;
    /// Solid platform
    pub const PLATFORM: u32 = 0x1 << 4;
    /// Platform bit as originally shipped; collides with [`ENEMY`](Self::ENEMY).
    pub const LEGACY_PLATFORM: u32 = 0x1 << 1;

    /// Any character category.
    pub const CHARACTER: u32 = Self::PLAYER | Self::ENEMY;
}

// =============================================================================
// BODIES
// =============================================================================

/// Opaque handle to a body owned by the physics collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Description of a body to create.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDesc {
    /// Center position
    pub position: Vec2,
    /// Full width/height of the axis-aligned box
    pub size: Vec2,
    /// Dynamic bodies move; static bodies never do
    pub dynamic: bool,
    /// Whether gravity acts on this body (dynamic only)
    pub affected_by_gravity: bool,
    /// Initial linear velocity
    pub velocity: Vec2,
    /// Mass used to turn impulses into velocity changes
    pub mass: f32,
    /// What this body is
    pub category: u32,
    /// Categories this body physically collides with
    pub collision_mask: u32,
    /// Categories that generate contact events with this body
    pub contact_mask: u32,
}

impl BodyDesc {
    /// Dynamic, gravity-affected character body.
    pub fn character(position: Vec2, size: Vec2, category: u32) -> Self {
        Self {
            position,
            size,
            dynamic: true,
            affected_by_gravity: true,
            velocity: Vec2::ZERO,
            mass: 1.0,
            category,
            collision_mask: PhysicsCategory::PLATFORM,
            contact_mask: PhysicsCategory::PLATFORM | PhysicsCategory::EDGE,
        }
    }

    /// Static solid platform.
    pub fn platform(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            dynamic: false,
            affected_by_gravity: false,
            velocity: Vec2::ZERO,
            mass: 1.0,
            category: PhysicsCategory::PLATFORM,
            collision_mask: PhysicsCategory::NONE,
            contact_mask: PhysicsCategory::NONE,
        }
    }

    /// Static, non-colliding sensor.
    pub fn sensor(position: Vec2, size: Vec2, category: u32, contact_mask: u32) -> Self {
        Self {
            position,
            size,
            dynamic: false,
            affected_by_gravity: false,
            velocity: Vec2::ZERO,
            mass: 1.0,
            category,
            collision_mask: PhysicsCategory::NONE,
            contact_mask,
        }
    }

    /// Moving, non-colliding sensor with a fixed velocity.
    pub fn moving_sensor(
        position: Vec2,
        size: Vec2,
        velocity: Vec2,
        category: u32,
        contact_mask: u32,
    ) -> Self {
        Self {
            dynamic: true,
            velocity,
            ..Self::sensor(position, size, category, contact_mask)
        }
    }
}

/// A begin-contact event between two bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    /// First body
    pub body_a: BodyHandle,
    /// Second body
    pub body_b: BodyHandle,
    /// Category bits of the first body
    pub category_a: u32,
    /// Category bits of the second body
    pub category_b: u32,
}

impl ContactEvent {
    /// If either side carries `category`, return `(that side, other side)`.
    ///
    /// Side A is checked first, so a contact where both sides match always
    /// resolves to `(body_a, body_b)`.
    pub fn split(&self, category: u32) -> Option<(BodyHandle, BodyHandle)> {
        if self.category_a & category != 0 {
            Some((self.body_a, self.body_b))
        } else if self.category_b & category != 0 {
            Some((self.body_b, self.body_a))
        } else {
            None
        }
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

/// Interface to the external physics engine.
pub trait PhysicsAdapter {
    /// Create a body and return its handle.
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Destroy a body. Unknown handles are ignored.
    fn remove_body(&mut self, body: BodyHandle);

    /// Add or remove a body from simulation without destroying it.
    fn set_active(&mut self, body: BodyHandle, active: bool);

    /// Whether the body currently takes part in simulation.
    fn is_active(&self, body: BodyHandle) -> bool;

    /// Apply an instantaneous impulse.
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2);

    /// Current linear velocity.
    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;

    /// Overwrite linear velocity.
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);

    /// Overwrite angular velocity.
    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32);

    /// Current center position.
    fn position(&self, body: BodyHandle) -> Option<Vec2>;

    /// Teleport a body.
    fn set_position(&mut self, body: BodyHandle, position: Vec2);

    /// Take every contact event generated since the last call.
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_bit_is_distinct() {
        assert_eq!(PhysicsCategory::PLATFORM & PhysicsCategory::ENEMY, 0);
        assert_ne!(PhysicsCategory::LEGACY_PLATFORM & PhysicsCategory::ENEMY, 0);
    }

    #[test]
    fn test_categories_are_single_bits() {
        for bit in [
            PhysicsCategory::PLAYER,
            PhysicsCategory::ENEMY,
            PhysicsCategory::ATTACK,
            PhysicsCategory::EDGE,
            PhysicsCategory::PLATFORM,
        ] {
            assert_eq!(bit.count_ones(), 1);
        }
    }

    #[test]
    fn test_contact_split() {
        let contact = ContactEvent {
            body_a: BodyHandle(1),
            body_b: BodyHandle(2),
            category_a: PhysicsCategory::PLAYER,
            category_b: PhysicsCategory::EDGE,
        };
        assert_eq!(
            contact.split(PhysicsCategory::EDGE),
            Some((BodyHandle(2), BodyHandle(1)))
        );
        assert_eq!(contact.split(PhysicsCategory::ATTACK), None);
    }

    #[test]
    fn test_contact_split_prefers_side_a() {
        let contact = ContactEvent {
            body_a: BodyHandle(7),
            body_b: BodyHandle(8),
            category_a: PhysicsCategory::EDGE,
            category_b: PhysicsCategory::EDGE,
        };
        assert_eq!(
            contact.split(PhysicsCategory::EDGE),
            Some((BodyHandle(7), BodyHandle(8)))
        );
    }
}
