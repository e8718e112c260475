//! Input Snapshots and Queue
//!
//! Input devices deliver changes whenever they like, possibly from another
//! thread. Nothing they send touches character state directly: every change
//! goes through an [`InputSender`] into the single-consumer [`InputQueue`],
//! which the host drains exactly once per tick into per-character
//! [`InputFrame`]s.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::vec2::Vec2;
use crate::game::character::CharacterId;

// =============================================================================
// STICK THRESHOLDS
// =============================================================================

/// Horizontal stick magnitude below which there is no movement intent.
pub const STICK_DEADZONE: f32 = 0.1;

/// Vertical stick value below which fast-fall is engaged.
pub const FAST_FALL_THRESHOLD: f32 = -0.5;

/// Resolve a horizontal stick value to -1, 0 or 1.
#[inline]
pub fn stick_direction(x: f32) -> i8 {
    if x > STICK_DEADZONE {
        1
    } else if x < -STICK_DEADZONE {
        -1
    } else {
        0
    }
}

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Discrete button event, applied on the tick it arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionEvent {
    /// Jump pressed
    JumpPressed,
    /// Jump released
    JumpReleased,
    /// Basic attack
    BasicAttack,
    /// Special attack
    SpecialAttack,
    /// Projectile attack
    ProjectileAttack,
    /// Shield pressed
    ShieldPressed,
    /// Shield released
    ShieldReleased,
    /// Dodge, direction resolved from movement at press time
    Dodge {
        /// -1, 0 or 1
        direction: i8,
    },
}

/// Input for one character for one tick.
///
/// Movement and fast-fall are held state; `actions` only contains events
/// that arrived since the previous tick, in arrival order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Stick position, each axis in [-1, 1]
    pub movement: Vec2,
    /// Fast-fall engaged
    pub fast_fall: bool,
    /// Button events this tick
    pub actions: Vec<ActionEvent>,
}

impl InputFrame {
    /// Create an idle frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame from a raw stick position; fast-fall follows the vertical axis.
    pub fn from_stick(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)),
            fast_fall: y < FAST_FALL_THRESHOLD,
            actions: Vec::new(),
        }
    }

    /// Add a button event.
    pub fn with_action(mut self, action: ActionEvent) -> Self {
        self.actions.push(action);
        self
    }

    /// Horizontal direction: -1, 0 or 1.
    #[inline]
    pub fn direction(&self) -> i8 {
        stick_direction(self.movement.x)
    }

    /// Whether the held part (stick and fast-fall) matches `other`.
    #[inline]
    pub fn same_hold(&self, other: &InputFrame) -> bool {
        self.movement == other.movement && self.fast_fall == other.fast_fall
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.movement.is_zero() && !self.fast_fall && self.actions.is_empty()
    }
}

// =============================================================================
// QUEUE
// =============================================================================

/// One change reported by an input device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputChange {
    /// Stick moved
    Movement(Vec2),
    /// Fast-fall toggled independently of the stick
    FastFall(bool),
    /// Dodge pressed; direction comes from the latest movement
    DodgePressed,
    /// Any other button event
    Action(ActionEvent),
}

/// An input change addressed to a character.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    /// Target character
    pub character: CharacterId,
    /// What changed
    pub change: InputChange,
}

/// Cloneable handle input callbacks publish through.
#[derive(Clone, Debug)]
pub struct InputSender {
    tx: Sender<InputMessage>,
}

impl InputSender {
    /// Publish a change. Returns false if the queue is gone.
    pub fn send(&self, character: CharacterId, change: InputChange) -> bool {
        self.tx.send(InputMessage { character, change }).is_ok()
    }

    /// Publish a stick position.
    pub fn movement(&self, character: CharacterId, x: f32, y: f32) -> bool {
        self.send(character, InputChange::Movement(Vec2::new(x, y)))
    }

    /// Publish a button event.
    pub fn action(&self, character: CharacterId, action: ActionEvent) -> bool {
        self.send(character, InputChange::Action(action))
    }
}

/// Single-consumer input queue, drained once per tick.
#[derive(Debug)]
pub struct InputQueue {
    tx: Sender<InputMessage>,
    rx: Receiver<InputMessage>,
    held: BTreeMap<CharacterId, InputFrame>,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InputQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            held: BTreeMap::new(),
        }
    }

    /// New producer handle.
    pub fn sender(&self) -> InputSender {
        InputSender { tx: self.tx.clone() }
    }

    /// Fold every pending change into per-character frames.
    ///
    /// Held state carries over from previous drains; actions are cleared
    /// first so each event is delivered on exactly one tick.
    pub fn drain(&mut self) -> BTreeMap<CharacterId, InputFrame> {
        for frame in self.held.values_mut() {
            frame.actions.clear();
        }

        while let Ok(message) = self.rx.try_recv() {
            let frame = self.held.entry(message.character).or_default();
            match message.change {
                InputChange::Movement(stick) => {
                    let actions = std::mem::take(&mut frame.actions);
                    *frame = InputFrame::from_stick(stick.x, stick.y);
                    frame.actions = actions;
                }
                InputChange::FastFall(engaged) => frame.fast_fall = engaged,
                InputChange::DodgePressed => {
                    let direction = frame.direction();
                    frame.actions.push(ActionEvent::Dodge { direction });
                }
                InputChange::Action(action) => frame.actions.push(action),
            }
            trace!(id = message.character.0, change = ?message.change, "input");
        }

        self.held.clone()
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Input frame that took effect on a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick the frame was applied on
    pub tick: u32,
    /// The frame
    pub frame: InputFrame,
}

/// Recorded input for one character, for replay.
///
/// Only stores ticks where held input changed or buttons were pressed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// Last recorded tick
    pub end_tick: u32,
    deltas: Vec<InputDelta>,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the frame applied on `tick`. Ticks must be non-decreasing.
    pub fn record(&mut self, tick: u32, frame: &InputFrame) {
        self.end_tick = tick;

        let changed = match self.deltas.last() {
            Some(last) => !last.frame.same_hold(frame),
            None => !frame.is_idle(),
        };
        if changed || !frame.actions.is_empty() {
            self.deltas.push(InputDelta {
                tick,
                frame: frame.clone(),
            });
        }
    }

    /// Input in effect on `tick`.
    ///
    /// Held state comes from the last delta at or before `tick`; actions only
    /// from a delta recorded on `tick` itself.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            return InputFrame::new();
        }

        let delta = &self.deltas[idx - 1];
        let mut frame = delta.frame.clone();
        if delta.tick != tick {
            frame.actions.clear();
        }
        frame
    }

    /// Recorded entries.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of recorded entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: CharacterId = CharacterId(0);
    const P2: CharacterId = CharacterId(1);

    #[test]
    fn test_stick_direction_deadzone() {
        assert_eq!(stick_direction(0.05), 0);
        assert_eq!(stick_direction(-0.1), 0);
        assert_eq!(stick_direction(0.11), 1);
        assert_eq!(stick_direction(-1.0), -1);
    }

    #[test]
    fn test_from_stick_fast_fall() {
        assert!(InputFrame::from_stick(0.0, -0.6).fast_fall);
        assert!(!InputFrame::from_stick(0.0, -0.5).fast_fall);
        assert_eq!(InputFrame::from_stick(3.0, 0.0).movement.x, 1.0);
    }

    #[test]
    fn test_drain_carries_held_state() {
        let mut queue = InputQueue::new();
        let sender = queue.sender();

        sender.movement(P1, 1.0, 0.0);
        sender.action(P1, ActionEvent::BasicAttack);
        let first = queue.drain();
        assert_eq!(first[&P1].direction(), 1);
        assert_eq!(first[&P1].actions, vec![ActionEvent::BasicAttack]);

        // Nothing new: stick still held, action delivered once
        let second = queue.drain();
        assert_eq!(second[&P1].direction(), 1);
        assert!(second[&P1].actions.is_empty());
    }

    #[test]
    fn test_dodge_direction_resolved_at_press() {
        let mut queue = InputQueue::new();
        let sender = queue.sender();

        sender.movement(P1, -0.8, 0.0);
        sender.send(P1, InputChange::DodgePressed);
        sender.movement(P1, 0.8, 0.0);
        let frames = queue.drain();

        assert_eq!(frames[&P1].actions, vec![ActionEvent::Dodge { direction: -1 }]);
        assert_eq!(frames[&P1].direction(), 1);
    }

    #[test]
    fn test_actions_keep_arrival_order() {
        let mut queue = InputQueue::new();
        let sender = queue.sender();

        sender.action(P2, ActionEvent::ShieldPressed);
        sender.movement(P2, 0.0, -1.0);
        sender.action(P2, ActionEvent::ShieldReleased);
        let frames = queue.drain();

        assert!(frames[&P2].fast_fall);
        assert_eq!(
            frames[&P2].actions,
            vec![ActionEvent::ShieldPressed, ActionEvent::ShieldReleased]
        );
        assert!(!frames.contains_key(&P1));
    }

    #[test]
    fn test_sender_from_another_thread() {
        let mut queue = InputQueue::new();
        let sender = queue.sender();

        std::thread::spawn(move || {
            sender.action(P1, ActionEvent::JumpPressed);
        })
        .join()
        .unwrap();

        assert_eq!(queue.drain()[&P1].actions, vec![ActionEvent::JumpPressed]);
    }

    #[test]
    fn test_send_fails_once_queue_is_gone() {
        let queue = InputQueue::new();
        let sender = queue.sender();
        assert!(sender.action(P1, ActionEvent::BasicAttack));

        drop(queue);
        assert!(!sender.action(P1, ActionEvent::BasicAttack));
        assert!(!sender.send(P1, InputChange::DodgePressed));
    }

    #[test]
    fn test_recording_compression() {
        let mut recording = InputRecording::new();
        let right = InputFrame::from_stick(1.0, 0.0);

        for tick in 1..=4 {
            recording.record(tick, &right);
        }
        assert_eq!(recording.delta_count(), 1);

        recording.record(5, &right.clone().with_action(ActionEvent::JumpPressed));
        recording.record(6, &InputFrame::new());
        assert_eq!(recording.delta_count(), 3);
        assert_eq!(recording.end_tick, 6);

        let ticks: Vec<u32> = recording.deltas().iter().map(|d| d.tick).collect();
        assert_eq!(ticks, vec![1, 5, 6]);
        assert_eq!(recording.deltas()[1].frame.actions, vec![ActionEvent::JumpPressed]);
    }

    #[test]
    fn test_recording_get_at() {
        let mut recording = InputRecording::new();
        recording.record(3, &InputFrame::from_stick(-1.0, 0.0).with_action(ActionEvent::Dodge { direction: -1 }));
        recording.record(4, &InputFrame::from_stick(-1.0, 0.0));
        recording.record(10, &InputFrame::new());

        assert!(recording.get_input_at(1).is_idle());
        assert_eq!(recording.get_input_at(3).actions.len(), 1);

        // Held stick persists, the dodge does not
        let later = recording.get_input_at(7);
        assert_eq!(later.direction(), -1);
        assert!(later.actions.is_empty());

        assert!(recording.get_input_at(12).is_idle());
    }
}
