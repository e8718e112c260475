//! Ledge Grabbing
//!
//! Each platform end carries a thin [`EdgeZone`] sensor. When a falling
//! character touches one close enough to its height band, the character is
//! stopped and snapped onto the ledge, then locked out of further grabs for
//! the re-grab cooldown.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::FighterConfig;
use crate::core::time::seconds_to_ticks;
use crate::core::vec2::Vec2;
use crate::game::character::Character;
use crate::physics::{BodyDesc, BodyHandle, PhysicsAdapter, PhysicsCategory};

/// Edge zone identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// Which end of its platform an edge sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSide {
    /// Low-X end
    Left,
    /// High-X end
    Right,
}

/// Static ledge sensor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeZone {
    /// Unique id
    pub id: EdgeId,
    /// Platform end
    pub side: EdgeSide,
    /// Center position
    pub position: Vec2,
    /// Full size
    pub size: Vec2,
    /// Sensor body
    pub body: BodyHandle,
}

impl EdgeZone {
    /// Create the sensor body and return the zone.
    pub fn spawn<P: PhysicsAdapter + ?Sized>(
        physics: &mut P,
        id: EdgeId,
        side: EdgeSide,
        position: Vec2,
        size: Vec2,
    ) -> Self {
        let body = physics.create_body(BodyDesc::sensor(
            position,
            size,
            PhysicsCategory::EDGE,
            PhysicsCategory::CHARACTER,
        ));
        Self { id, side, position, size, body }
    }

    /// Where a grabbing character of `size` is placed.
    pub fn snap_position(&self, size: Vec2) -> Vec2 {
        Vec2::new(self.position.x, self.position.y + size.y / 2.0)
    }
}

/// Why a ledge contact did not become a grab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabRejection {
    /// Still locked out from the previous grab
    Cooldown,
    /// Rising or stationary
    NotFalling,
    /// Outside the edge's height band
    OutOfReach,
    /// Character body is missing
    NoBody,
}

/// Try to snap `character` onto `edge`.
///
/// On success velocity is zeroed, the character is placed on the ledge and
/// the re-grab cooldown starts. On rejection nothing is changed.
pub fn try_grab<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    edge: &EdgeZone,
    physics: &mut P,
    config: &FighterConfig,
) -> Result<Vec2, GrabRejection> {
    if !character.can_grab_ledge() {
        return Err(GrabRejection::Cooldown);
    }
    let velocity = physics.velocity(character.body).ok_or(GrabRejection::NoBody)?;
    let position = physics.position(character.body).ok_or(GrabRejection::NoBody)?;

    if velocity.y >= 0.0 {
        return Err(GrabRejection::NotFalling);
    }
    if (position.y - edge.position.y).abs() > character.size.y {
        return Err(GrabRejection::OutOfReach);
    }

    let snapped = edge.snap_position(character.size);
    physics.set_velocity(character.body, Vec2::ZERO);
    physics.set_position(character.body, snapped);
    character.velocity = Vec2::ZERO;
    character.position = snapped;
    character.regrab_cooldown_ticks = seconds_to_ticks(config.regrab_cooldown);

    debug!(id = character.id.0, edge = edge.id.0, position = %snapped, "ledge grabbed");
    Ok(snapped)
}

/// Count down the re-grab lockout by one tick.
///
/// Runs at the start of a tick, before contacts, so a lockout set on tick
/// `t` ends on tick `t + regrab_cooldown_ticks`. On the tick it ends, velocity is forced to zero to cancel any drift
/// picked up while hanging. Returns true on that tick.
pub fn tick_regrab_cooldown<P: PhysicsAdapter + ?Sized>(character: &mut Character, physics: &mut P) -> bool {
    if character.regrab_cooldown_ticks == 0 {
        return false;
    }
    character.regrab_cooldown_ticks -= 1;
    if character.regrab_cooldown_ticks > 0 {
        return false;
    }

    physics.set_velocity(character.body, Vec2::ZERO);
    character.velocity = Vec2::ZERO;
    true
}
