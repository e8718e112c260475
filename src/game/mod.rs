//! Game Logic Module
//!
//! Character simulation and combat resolution, driven one fixed tick at a
//! time by [`GameWorld`].
//!
//! ## Module Structure
//!
//! - `input`: Input snapshots, single-consumer queue, recordings
//! - `character`: Character and jump state
//! - `movement`: Horizontal acceleration and deceleration
//! - `jump`: Buffered and held jumps, fast-fall
//! - `combat`: Attacks, dodge, shield, attack volumes
//! - `edge`: Ledge sensors and grabbing
//! - `blast_zone`: Out-of-bounds detection and respawn scheduling
//! - `events`: Events returned from each tick
//! - `world`: World construction, ownership and teardown
//! - `tick`: Per-tick orchestration and replay

pub mod input;
pub mod character;
pub mod movement;
pub mod jump;
pub mod combat;
pub mod edge;
pub mod blast_zone;
pub mod events;
pub mod world;
pub mod tick;

// Re-export key types
pub use input::{ActionEvent, InputChange, InputFrame, InputQueue, InputRecording, InputSender};
pub use character::{Character, CharacterId, Facing, JumpPhase, JumpState, Role};
pub use combat::{AttackKind, AttackVolume, VolumeId, VolumeSet};
pub use edge::{EdgeId, EdgeZone};
pub use blast_zone::{BlastZone, RespawnSchedule};
pub use events::{GameEvent, GameEventData};
pub use world::{GameWorld, TeardownReport};
pub use tick::{replay, TickResult};
