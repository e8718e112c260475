//! Jump Controller
//!
//! Buffered, hold-extended jumping and fast-fall.
//!
//! ```text
//!   Idle ──start (grounded)──▶ Held ──release──▶ Idle
//!     │
//!     └──start (airborne)──▶ Buffered ──grounded or buffer expired──▶ Idle
//! ```
//!
//! Every jump is a single `short_hop_impulse`. Holding the button afterwards
//! adds `hold_impulse` per tick for at most `jump_hold_time`.

use tracing::debug;

use crate::config::FighterConfig;
use crate::core::time::seconds_to_ticks;
use crate::core::vec2::Vec2;
use crate::game::character::Character;
use crate::physics::PhysicsAdapter;

/// What a jump press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpOutcome {
    /// Jumped immediately
    Fired,
    /// Queued until grounded or the buffer expires
    Buffered,
}

/// Refresh the velocity snapshot from physics.
fn refresh_velocity<P: PhysicsAdapter + ?Sized>(character: &mut Character, physics: &P) -> bool {
    match physics.velocity(character.body) {
        Some(velocity) => {
            character.velocity = velocity;
            true
        }
        None => false,
    }
}

fn fire<P: PhysicsAdapter + ?Sized>(character: &mut Character, physics: &mut P, impulse: f32) {
    physics.apply_impulse(character.body, Vec2::new(0.0, impulse));
    if let Some(velocity) = physics.velocity(character.body) {
        character.velocity = velocity;
    }
}

/// Handle a jump press.
///
/// Returns `None` if the character has no physics body.
pub fn start_jump<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    config: &FighterConfig,
) -> Option<JumpOutcome> {
    if !refresh_velocity(character, physics) {
        return None;
    }

    if character.is_grounded() {
        fire(character, physics, config.short_hop_impulse);
        character.jump.held = true;
        character.jump.queued = false;
        character.jump.buffer_ticks = 0;
        debug!(id = character.id.0, "jump fired");
        Some(JumpOutcome::Fired)
    } else {
        character.jump.queued = true;
        character.jump.buffer_ticks = seconds_to_ticks(config.jump_buffer_time);
        debug!(id = character.id.0, ticks = character.jump.buffer_ticks, "jump buffered");
        Some(JumpOutcome::Buffered)
    }
}

/// Count a queued jump's buffer down by one tick.
///
/// Runs at the start of a tick, so a buffer set during tick `t` reaches zero
/// on tick `t + buffer_ticks`.
pub fn tick_jump_buffer(character: &mut Character) {
    if character.jump.queued {
        character.jump.buffer_ticks = character.jump.buffer_ticks.saturating_sub(1);
    }
}

/// Fire a queued jump if its buffer ran out or the character is grounded,
/// whichever comes first. Returns true on the tick the jump fires.
pub fn resolve_buffered_jump<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    config: &FighterConfig,
) -> bool {
    if !character.jump.queued || !refresh_velocity(character, physics) {
        return false;
    }

    if character.jump.buffer_ticks == 0 || character.is_grounded() {
        fire(character, physics, config.short_hop_impulse);
        character.jump.queued = false;
        character.jump.buffer_ticks = 0;
        debug!(id = character.id.0, "buffered jump fired");
        return true;
    }
    false
}

/// Extend a held jump by one tick.
///
/// With `hold_requires_ground` set (the shipped tuning) the extension only
/// applies while grounded; otherwise it applies in the air.
pub fn continue_jump<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    config: &FighterConfig,
) -> bool {
    let window = seconds_to_ticks(config.jump_hold_time);
    if !character.jump.held || character.jump.hold_ticks >= window {
        return false;
    }
    if !refresh_velocity(character, physics) {
        return false;
    }
    if config.hold_requires_ground && !character.is_grounded() {
        return false;
    }

    fire(character, physics, config.hold_impulse);
    character.jump.hold_ticks += 1;
    true
}

/// Handle a jump release.
pub fn release_jump(character: &mut Character) {
    character.jump.held = false;
    character.jump.hold_ticks = 0;
}

/// Clamp a falling character's vertical speed while fast-fall is held.
///
/// Sets `velocity.y = max(velocity.y, fast_fall_speed)` when falling; rising
/// characters and released input leave velocity untouched.
pub fn apply_fast_fall<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    fast_fall: bool,
    config: &FighterConfig,
) {
    if !fast_fall || !refresh_velocity(character, physics) {
        return;
    }
    let mut velocity = character.velocity;
    if velocity.y < 0.0 {
        velocity.y = velocity.y.max(config.fast_fall_speed);
        physics.set_velocity(character.body, velocity);
        character.velocity = velocity;
    }
}
