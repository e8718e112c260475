//! # Platform Fighter Core
//!
//! Fixed-step character simulation and combat resolution for a 2D platform
//! fighter. Physics and rendering are collaborators behind traits; this crate
//! owns the game feel: movement, jumps, attacks, ledges and the blast zone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  PLATFORM FIGHTER CORE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Primitives                               │
//! │  ├── vec2.rs      - 2D vector                                │
//! │  ├── time.rs      - Seconds to ticks, fixed-step clock       │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  physics/         - Physics collaborator                     │
//! │  ├── mod.rs       - PhysicsAdapter, categories, contacts     │
//! │  └── sandbox.rs   - ArenaPhysics reference backend           │
//! │                                                              │
//! │  game/            - Game logic                               │
//! │  ├── input.rs     - Input snapshots and queue                │
//! │  ├── character.rs - Character and jump state                 │
//! │  ├── movement.rs  - Acceleration and deceleration            │
//! │  ├── jump.rs      - Buffered / held jumps, fast-fall         │
//! │  ├── combat.rs    - Attacks, dodge, shield                   │
//! │  ├── edge.rs      - Ledge grabbing                           │
//! │  ├── blast_zone.rs- Out of bounds and respawn                │
//! │  ├── world.rs     - World ownership and teardown             │
//! │  └── tick.rs      - Per-tick orchestration                   │
//! │                                                              │
//! │  config.rs        - Tuning and stage layout (JSON)           │
//! │  presentation.rs  - Presenter collaborator                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Every timer counts whole ticks at [`TICK_RATE`]. Characters, volumes and
//! pending respawns live in BTreeMaps, and input is applied only at tick
//! boundaries. Given the same inputs and physics backend, two runs end with
//! the same [`GameWorld::compute_hash`].
//!
//! ## Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use platform_fighter::{ArenaPhysics, CharacterId, GameWorld, InputFrame, NullPresenter, WorldConfig, TICK_DT};
//!
//! let mut world = GameWorld::new(WorldConfig::default(), ArenaPhysics::default(), NullPresenter::default()).unwrap();
//! let inputs = BTreeMap::from([(CharacterId(0), InputFrame::from_stick(1.0, 0.0))]);
//! for _ in 0..60 {
//!     world.tick(&inputs);
//!     world.physics_mut().step(TICK_DT);
//! }
//! assert_eq!(world.tick_count(), 60);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod physics;
pub mod game;
pub mod config;
pub mod presentation;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::time::{FixedStepClock, Ticks};
pub use core::hash::StateHash;
pub use physics::{ArenaPhysics, PhysicsAdapter, PhysicsCategory};
pub use presentation::{NullPresenter, Presenter, RecordingPresenter};
pub use config::{ConfigError, WorldConfig};
pub use game::{CharacterId, GameEvent, GameEventData, GameWorld, InputFrame, InputQueue, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Seconds per tick
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;
