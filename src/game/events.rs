//! Game Events
//!
//! Events generated during a tick, returned to the host for audio, UI and
//! logging. Nothing inside the simulation consumes them.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::character::CharacterId;
use crate::game::combat::{AttackKind, VolumeId};
use crate::game::edge::EdgeId;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Characters leaving or re-entering the world
    Lifecycle = 0,
    /// Attack contacts
    Hit = 1,
    /// Ledge grabs
    Ledge = 2,
    /// Attacks, shields, dodges
    Action = 3,
    /// Jumps
    Movement = 4,
    /// Lowest priority
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Grounded jump fired immediately
    JumpStarted { character: CharacterId },

    /// Airborne jump queued
    JumpBuffered { character: CharacterId },

    /// Queued jump fired
    BufferedJumpFired { character: CharacterId },

    /// Attack volume spawned
    AttackSpawned {
        character: CharacterId,
        volume: VolumeId,
        kind: AttackKind,
    },

    /// Attack volume reached the end of its lifetime
    AttackExpired {
        owner: CharacterId,
        volume: VolumeId,
        kind: AttackKind,
    },

    /// Attack volume touched a target (no damage model consumes this yet)
    AttackHit {
        owner: CharacterId,
        volume: VolumeId,
        target: CharacterId,
        shielded: bool,
    },

    /// Shield went up
    ShieldRaised { character: CharacterId },

    /// Shield went down
    ShieldLowered { character: CharacterId },

    /// Dodge performed
    Dodged { character: CharacterId, direction: i8 },

    /// Character snapped to a ledge
    EdgeGrabbed {
        character: CharacterId,
        edge: EdgeId,
        position: Vec2,
    },

    /// Ledge re-grab lockout finished
    RegrabCooldownEnded { character: CharacterId },

    /// Character left the blast zone
    BlastZoneExit { character: CharacterId, position: Vec2 },

    /// Character re-entered the world
    Respawned { character: CharacterId, position: Vec2 },
}

impl GameEventData {
    /// Character this event is about.
    pub fn character(&self) -> CharacterId {
        match self {
            GameEventData::JumpStarted { character }
            | GameEventData::JumpBuffered { character }
            | GameEventData::BufferedJumpFired { character }
            | GameEventData::AttackSpawned { character, .. }
            | GameEventData::ShieldRaised { character }
            | GameEventData::ShieldLowered { character }
            | GameEventData::Dodged { character, .. }
            | GameEventData::EdgeGrabbed { character, .. }
            | GameEventData::RegrabCooldownEnded { character }
            | GameEventData::BlastZoneExit { character, .. }
            | GameEventData::Respawned { character, .. } => *character,
            GameEventData::AttackExpired { owner, .. } => *owner,
            GameEventData::AttackHit { target, .. } => *target,
        }
    }

    fn priority(&self) -> EventPriority {
        match self {
            GameEventData::BlastZoneExit { .. } | GameEventData::Respawned { .. } => {
                EventPriority::Lifecycle
            }
            GameEventData::AttackHit { .. } => EventPriority::Hit,
            GameEventData::EdgeGrabbed { .. } | GameEventData::RegrabCooldownEnded { .. } => {
                EventPriority::Ledge
            }
            GameEventData::AttackSpawned { .. }
            | GameEventData::ShieldRaised { .. }
            | GameEventData::ShieldLowered { .. }
            | GameEventData::Dodged { .. } => EventPriority::Action,
            GameEventData::JumpStarted { .. }
            | GameEventData::JumpBuffered { .. }
            | GameEventData::BufferedJumpFired { .. } => EventPriority::Movement,
            GameEventData::AttackExpired { .. } => EventPriority::Other,
        }
    }
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Character involved (for tie-breaking)
    pub character: CharacterId,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event; priority and character are derived from the data.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self {
            tick,
            priority: data.priority(),
            character: data.character(),
            data,
        }
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.character == other.character
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then character
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.character.cmp(&other.character))
    }
}
