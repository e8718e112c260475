//! World and Fighter Configuration
//!
//! Every tuning constant lives here with defaults matching the shipped feel.
//! Durations are in seconds and converted to ticks when the world is built;
//! speeds and impulses are per-tick values on the 60 Hz step.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::character::Role;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Movement, jump and defensive tuning shared by every character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    /// Horizontal speed cap (units/s)
    pub max_speed: f32,
    /// Horizontal speed gained per tick while a direction is held
    pub acceleration: f32,
    /// Horizontal speed lost per tick with no direction held
    pub deceleration: f32,
    /// Upward impulse of every jump
    pub short_hop_impulse: f32,
    /// Upward impulse added each tick the jump is held
    pub hold_impulse: f32,
    /// Seconds an airborne jump request stays queued
    pub jump_buffer_time: f32,
    /// Seconds the hold impulse may be applied
    pub jump_hold_time: f32,
    /// Only extend a held jump while grounded (shipped behavior)
    pub hold_requires_ground: bool,
    /// Floor applied to falling vertical velocity while fast-falling (negative)
    pub fast_fall_speed: f32,
    /// Lateral impulse of a dodge
    pub dodge_impulse: f32,
    /// Seconds of invulnerability a dodge grants (0 = none)
    pub dodge_invulnerability_time: f32,
    /// Seconds after a ledge grab before another grab is allowed
    pub regrab_cooldown: f32,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            max_speed: 300.0,
            acceleration: 20.0,
            deceleration: 30.0,
            short_hop_impulse: 500.0,
            hold_impulse: 20.0,
            jump_buffer_time: 0.2,
            jump_hold_time: 0.3,
            hold_requires_ground: true,
            fast_fall_speed: -500.0,
            dodge_impulse: 300.0,
            dodge_invulnerability_time: 0.0,
            regrab_cooldown: 0.5,
        }
    }
}

/// Attack volume and shield tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Basic attack hitbox size
    pub basic_size: Vec2,
    /// Basic attack lifetime (s)
    pub basic_ttl: f32,
    /// Projectile size
    pub projectile_size: Vec2,
    /// Projectile forward speed (units/s)
    pub projectile_speed: f32,
    /// Projectile lifetime (s)
    pub projectile_ttl: f32,
    /// Special attack starting size
    pub special_size: Vec2,
    /// Special attack final scale
    pub special_scale: f32,
    /// Seconds the special grows
    pub special_grow_time: f32,
    /// Seconds the special fades after growing
    pub special_fade_time: f32,
    /// Extra width/height of the shield around its owner
    pub shield_padding: f32,
    /// Lowest alpha of the dodge cue
    pub dodge_fade_alpha: f32,
    /// Seconds for each half of the dodge cue
    pub dodge_fade_time: f32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            basic_size: Vec2::new(50.0, 20.0),
            basic_ttl: 0.2,
            projectile_size: Vec2::new(20.0, 10.0),
            projectile_speed: 500.0,
            projectile_ttl: 2.0,
            special_size: Vec2::new(60.0, 60.0),
            special_scale: 2.0,
            special_grow_time: 0.3,
            special_fade_time: 0.3,
            shield_padding: 20.0,
            dodge_fade_alpha: 0.5,
            dodge_fade_time: 0.1,
        }
    }
}

/// A solid platform with a ledge sensor at each end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Center position
    pub position: Vec2,
    /// Full size
    pub size: Vec2,
}

impl PlatformConfig {
    /// Size of each ledge sensor: thin, half the platform's thickness.
    pub fn edge_size(&self) -> Vec2 {
        Vec2::new(10.0, self.size.y / 2.0)
    }

    /// Centers of the left and right ledge sensors.
    pub fn edge_positions(&self) -> [Vec2; 2] {
        let half = self.size.half();
        let y = self.position.y - half.y;
        [
            Vec2::new(self.position.x - half.x, y),
            Vec2::new(self.position.x + half.x, y),
        ]
    }
}

/// One roster entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Player or enemy
    pub role: Role,
    /// Full body size
    pub size: Vec2,
    /// Position at world start
    pub spawn: Vec2,
    /// Position after a blast-zone respawn
    pub respawn: Vec2,
}

/// Complete world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half width of the visible play area (centered on the origin)
    pub half_width: f32,
    /// Half height of the visible play area
    pub half_height: f32,
    /// Distance beyond the visible area before a character is out
    pub blast_zone_padding: f32,
    /// Seconds between a blast-zone exit and the respawn
    pub respawn_delay: f32,
    /// Seconds the exit explosion stays on screen
    pub explosion_ttl: f32,
    /// Character tuning
    pub fighter: FighterConfig,
    /// Attack tuning
    pub attacks: AttackConfig,
    /// Stage layout
    pub platforms: Vec<PlatformConfig>,
    /// Characters created at world start, in id order
    pub roster: Vec<CharacterConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::for_view(640.0, 360.0)
    }
}

impl WorldConfig {
    /// Default stage laid out for a visible area of the given half extents.
    pub fn for_view(half_width: f32, half_height: f32) -> Self {
        let width = half_width * 2.0;
        let height = half_height * 2.0;
        Self {
            half_width,
            half_height,
            blast_zone_padding: 200.0,
            respawn_delay: 2.0,
            explosion_ttl: 1.0,
            fighter: FighterConfig::default(),
            attacks: AttackConfig::default(),
            platforms: vec![PlatformConfig {
                position: Vec2::new(0.0, -height / 6.0),
                size: Vec2::new(600.0, 20.0),
            }],
            roster: vec![
                CharacterConfig {
                    role: Role::Player,
                    size: Vec2::new(80.0, 80.0),
                    spawn: Vec2::ZERO,
                    respawn: Vec2::new(0.0, height / 4.0),
                },
                CharacterConfig {
                    role: Role::Enemy,
                    size: Vec2::new(40.0, 40.0),
                    spawn: Vec2::new(width / 4.0, -height / 6.0),
                    respawn: Vec2::new(100.0, height / 4.0),
                },
            ],
        }
    }

    /// Parse from a JSON string and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a JSON file and validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
            }
        }
        fn non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")))
            }
        }
        fn size(name: &str, value: Vec2) -> Result<(), ConfigError> {
            positive(&format!("{name}.x"), value.x)?;
            positive(&format!("{name}.y"), value.y)
        }

        positive("half_width", self.half_width)?;
        positive("half_height", self.half_height)?;
        non_negative("blast_zone_padding", self.blast_zone_padding)?;
        non_negative("respawn_delay", self.respawn_delay)?;
        non_negative("explosion_ttl", self.explosion_ttl)?;

        let f = &self.fighter;
        positive("fighter.max_speed", f.max_speed)?;
        positive("fighter.acceleration", f.acceleration)?;
        positive("fighter.deceleration", f.deceleration)?;
        non_negative("fighter.short_hop_impulse", f.short_hop_impulse)?;
        non_negative("fighter.hold_impulse", f.hold_impulse)?;
        non_negative("fighter.jump_buffer_time", f.jump_buffer_time)?;
        non_negative("fighter.jump_hold_time", f.jump_hold_time)?;
        non_negative("fighter.dodge_impulse", f.dodge_impulse)?;
        non_negative("fighter.dodge_invulnerability_time", f.dodge_invulnerability_time)?;
        non_negative("fighter.regrab_cooldown", f.regrab_cooldown)?;
        if !(f.fast_fall_speed.is_finite() && f.fast_fall_speed < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fighter.fast_fall_speed must be negative, got {}",
                f.fast_fall_speed
            )));
        }

        let a = &self.attacks;
        size("attacks.basic_size", a.basic_size)?;
        positive("attacks.basic_ttl", a.basic_ttl)?;
        size("attacks.projectile_size", a.projectile_size)?;
        non_negative("attacks.projectile_speed", a.projectile_speed)?;
        positive("attacks.projectile_ttl", a.projectile_ttl)?;
        size("attacks.special_size", a.special_size)?;
        positive("attacks.special_scale", a.special_scale)?;
        non_negative("attacks.special_grow_time", a.special_grow_time)?;
        non_negative("attacks.special_fade_time", a.special_fade_time)?;
        positive(
            "attacks.special_grow_time + special_fade_time",
            a.special_grow_time + a.special_fade_time,
        )?;
        non_negative("attacks.shield_padding", a.shield_padding)?;

        for (i, platform) in self.platforms.iter().enumerate() {
            size(&format!("platforms[{i}].size"), platform.size)?;
        }
        if self.roster.is_empty() {
            return Err(ConfigError::Invalid("roster must not be empty".into()));
        }
        for (i, entry) in self.roster.iter().enumerate() {
            size(&format!("roster[{i}].size"), entry.size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_layout() {
        let config = WorldConfig::for_view(640.0, 360.0);
        assert_eq!(config.platforms[0].position, Vec2::new(0.0, -120.0));
        assert_eq!(config.roster[0].respawn, Vec2::new(0.0, 180.0));
        assert_eq!(config.roster[1].spawn, Vec2::new(320.0, -120.0));
        assert_eq!(config.roster[1].respawn, Vec2::new(100.0, 180.0));
    }

    #[test]
    fn test_edge_layout() {
        let platform = PlatformConfig {
            position: Vec2::new(0.0, -120.0),
            size: Vec2::new(600.0, 20.0),
        };
        assert_eq!(platform.edge_size(), Vec2::new(10.0, 10.0));
        assert_eq!(
            platform.edge_positions(),
            [Vec2::new(-300.0, -130.0), Vec2::new(300.0, -130.0)]
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json_str(
            r#"{ "blast_zone_padding": 50.0, "fighter": { "max_speed": 400.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.blast_zone_padding, 50.0);
        assert_eq!(config.fighter.max_speed, 400.0);
        assert_eq!(config.fighter.acceleration, 20.0);
        assert_eq!(config.roster.len(), 2);
    }

    #[test]
    fn test_rejects_positive_fast_fall() {
        let mut config = WorldConfig::default();
        config.fighter.fast_fall_speed = 100.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_deceleration() {
        let mut config = WorldConfig::default();
        config.fighter.deceleration = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_roster() {
        let mut config = WorldConfig::default();
        config.roster.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            WorldConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            WorldConfig::from_path("/nonexistent/platform-fighter.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
