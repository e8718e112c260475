//! Horizontal Movement
//!
//! Per-tick acceleration toward the held direction and deceleration back to
//! rest. Values are per tick, not scaled by elapsed time: the step is the
//! fixed 60 Hz tick.

use crate::config::FighterConfig;
use crate::game::character::{Character, Facing};
use crate::physics::PhysicsAdapter;

/// Accelerate toward `direction` (-1, 0 or 1) and write the clamped speed.
///
/// Missing bodies make this a no-op.
pub fn accelerate<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    direction: i8,
    config: &FighterConfig,
) {
    let Some(mut velocity) = physics.velocity(character.body) else {
        return;
    };

    let direction = direction.signum();
    if let Some(facing) = Facing::from_direction(direction) {
        character.facing = facing;
    }

    let hv = character.horizontal_velocity + direction as f32 * config.acceleration;
    character.horizontal_velocity = hv.clamp(-config.max_speed, config.max_speed);

    velocity.x = character.horizontal_velocity;
    physics.set_velocity(character.body, velocity);
    character.velocity = velocity;
}

/// Push the horizontal speed toward zero by one tick of deceleration.
///
/// Snaps to exactly zero once the remaining speed is smaller than one step,
/// so the speed never oscillates around rest.
pub fn decelerate<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    config: &FighterConfig,
) {
    let Some(mut velocity) = physics.velocity(character.body) else {
        return;
    };

    let mut hv = character.horizontal_velocity;
    if hv > 0.0 {
        hv -= config.deceleration;
    } else if hv < 0.0 {
        hv += config.deceleration;
    }
    if hv.abs() < config.deceleration {
        hv = 0.0;
    }
    character.horizontal_velocity = hv;

    velocity.x = hv;
    physics.set_velocity(character.body, velocity);
    character.velocity = velocity;
}

/// Run one tick of horizontal movement for the held direction.
pub fn update_movement<P: PhysicsAdapter + ?Sized>(
    character: &mut Character,
    physics: &mut P,
    direction: i8,
    config: &FighterConfig,
) {
    if direction != 0 {
        accelerate(character, physics, direction, config);
    } else {
        decelerate(character, physics, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::core::vec2::Vec2;
    use crate::game::character::{CharacterId, Role};
    use crate::physics::{ArenaPhysics, BodyDesc, BodyHandle, PhysicsCategory};

    fn setup() -> (ArenaPhysics, Character) {
        let mut physics = ArenaPhysics::default();
        let body = physics.create_body(BodyDesc::character(
            Vec2::ZERO,
            Vec2::new(80.0, 80.0),
            PhysicsCategory::PLAYER,
        ));
        let character = Character::new(
            CharacterId(0),
            Role::Player,
            body,
            Vec2::new(80.0, 80.0),
            Vec2::ZERO,
            Vec2::ZERO,
        );
        (physics, character)
    }

    #[test]
    fn test_accelerate_adds_per_tick() {
        let (mut physics, mut c) = setup();
        let config = FighterConfig::default();

        accelerate(&mut c, &mut physics, 1, &config);
        accelerate(&mut c, &mut physics, 1, &config);

        assert_eq!(c.horizontal_velocity, 40.0);
        assert_eq!(physics.velocity(c.body).unwrap().x, 40.0);
        assert_eq!(c.facing, Facing::Right);
    }

    #[test]
    fn test_accelerate_clamps_and_preserves_vertical() {
        let (mut physics, mut c) = setup();
        let config = FighterConfig::default();
        physics.set_velocity(c.body, Vec2::new(0.0, -200.0));

        for _ in 0..100 {
            accelerate(&mut c, &mut physics, -1, &config);
        }

        assert_eq!(c.horizontal_velocity, -300.0);
        assert_eq!(physics.velocity(c.body), Some(Vec2::new(-300.0, -200.0)));
        assert_eq!(c.facing, Facing::Left);
    }

    #[test]
    fn test_decelerate_reaches_exact_zero() {
        let (mut physics, mut c) = setup();
        let config = FighterConfig::default();
        c.horizontal_velocity = config.max_speed;

        let bound = (config.max_speed / config.deceleration).ceil() as usize;
        for _ in 0..bound {
            decelerate(&mut c, &mut physics, &config);
        }

        assert_eq!(c.horizontal_velocity, 0.0);
        assert_eq!(physics.velocity(c.body).unwrap().x, 0.0);
    }

    #[test]
    fn test_decelerate_snaps_small_speeds() {
        let (mut physics, mut c) = setup();
        let config = FighterConfig::default();
        c.horizontal_velocity = -45.0;

        decelerate(&mut c, &mut physics, &config);

        assert_eq!(c.horizontal_velocity, 0.0);
    }

    #[test]
    fn test_missing_body_is_noop() {
        let mut physics = ArenaPhysics::default();
        let mut c = Character::new(
            CharacterId(0),
            Role::Player,
            BodyHandle(42),
            Vec2::new(80.0, 80.0),
            Vec2::ZERO,
            Vec2::ZERO,
        );

        update_movement(&mut c, &mut physics, 1, &FighterConfig::default());

        assert_eq!(c.horizontal_velocity, 0.0);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_clamped(inputs in prop::collection::vec(-1i8..=1, 0..400)) {
            let (mut physics, mut c) = setup();
            let config = FighterConfig::default();

            for direction in inputs {
                update_movement(&mut c, &mut physics, direction, &config);
                prop_assert!(c.horizontal_velocity >= -config.max_speed);
                prop_assert!(c.horizontal_velocity <= config.max_speed);
            }
        }

        #[test]
        fn prop_release_stops_within_bound(inputs in prop::collection::vec(-1i8..=1, 0..100)) {
            let (mut physics, mut c) = setup();
            let config = FighterConfig::default();

            for direction in inputs {
                update_movement(&mut c, &mut physics, direction, &config);
            }

            let bound = (config.max_speed / config.deceleration).ceil() as usize;
            for _ in 0..bound {
                update_movement(&mut c, &mut physics, 0, &config);
            }
            prop_assert_eq!(c.horizontal_velocity, 0.0);
        }
    }
}
