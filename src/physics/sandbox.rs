//! Reference Physics Backend
//!
//! A deliberately small engine behind [`PhysicsAdapter`]: gravity, explicit
//! Euler integration, axis-aligned boxes pushed out of static solids, and
//! begin-contact events for sensor pairs. It exists so the demo binary and
//! the tests can drive a [`GameWorld`](crate::game::world::GameWorld)
//! without a real engine.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::vec2::Vec2;
use super::{BodyDesc, BodyHandle, ContactEvent, PhysicsAdapter};

/// Default downward acceleration (units/s²).
pub const DEFAULT_GRAVITY: f32 = -1500.0;

#[derive(Clone, Debug)]
struct SandboxBody {
    desc: BodyDesc,
    position: Vec2,
    velocity: Vec2,
    angular_velocity: f32,
    active: bool,
}

impl SandboxBody {
    fn overlaps(&self, other: &SandboxBody) -> bool {
        boxes_overlap(self.position, self.desc.size, other.position, other.desc.size)
    }

    fn wants_contact_with(&self, other: &SandboxBody) -> bool {
        self.desc.contact_mask & other.desc.category != 0
            || other.desc.contact_mask & self.desc.category != 0
    }
}

/// Inclusive AABB overlap test (touching counts).
fn boxes_overlap(pos_a: Vec2, size_a: Vec2, pos_b: Vec2, size_b: Vec2) -> bool {
    let half_a = size_a.half();
    let half_b = size_b.half();
    (pos_a.x - pos_b.x).abs() <= half_a.x + half_b.x
        && (pos_a.y - pos_b.y).abs() <= half_a.y + half_b.y
}

/// Minimal physics world.
#[derive(Clone, Debug)]
pub struct ArenaPhysics {
    bodies: BTreeMap<BodyHandle, SandboxBody>,
    next_id: u32,
    gravity: Vec2,
    contacts: Vec<ContactEvent>,
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
}

impl Default for ArenaPhysics {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, DEFAULT_GRAVITY))
    }
}

impl ArenaPhysics {
    /// Create an empty world with the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
            gravity,
            contacts: Vec::new(),
            touching: BTreeSet::new(),
        }
    }

    /// Number of bodies that exist (active or not).
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether a handle refers to an existing body.
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(&body)
    }

    /// Angular velocity of a body.
    pub fn angular_velocity(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.angular_velocity)
    }

    /// Queue a contact event as if the engine had produced it.
    pub fn inject_contact(&mut self, contact: ContactEvent) {
        self.contacts.push(contact);
    }

    /// Advance the world by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integrate(dt);
        self.resolve_solids();
        self.detect_contacts();
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if !body.active || !body.desc.dynamic {
                continue;
            }
            if body.desc.affected_by_gravity {
                body.velocity = body.velocity + gravity * dt;
            }
            body.position = body.position + body.velocity * dt;
        }
    }

    fn resolve_solids(&mut self) {
        let solids: Vec<(Vec2, Vec2, u32)> = self
            .bodies
            .values()
            .filter(|b| b.active && !b.desc.dynamic)
            .map(|b| (b.position, b.desc.size, b.desc.category))
            .collect();

        for body in self.bodies.values_mut() {
            if !body.active || !body.desc.dynamic || body.desc.collision_mask == 0 {
                continue;
            }
            for (solid_pos, solid_size, category) in &solids {
                if body.desc.collision_mask & category == 0 {
                    continue;
                }
                let half = body.desc.size.half() + solid_size.half();
                let delta = body.position - *solid_pos;
                let pen_x = half.x - delta.x.abs();
                let pen_y = half.y - delta.y.abs();
                if pen_x <= 0.0 || pen_y <= 0.0 {
                    continue;
                }

                if pen_y <= pen_x {
                    let sign = if delta.y >= 0.0 { 1.0 } else { -1.0 };
                    body.position.y = solid_pos.y + sign * half.y;
                    body.velocity.y = 0.0;
                } else {
                    let sign = if delta.x >= 0.0 { 1.0 } else { -1.0 };
                    body.position.x = solid_pos.x + sign * half.x;
                    body.velocity.x = 0.0;
                }
            }
        }
    }

    fn detect_contacts(&mut self) {
        let active: Vec<(&BodyHandle, &SandboxBody)> =
            self.bodies.iter().filter(|(_, b)| b.active).collect();

        let mut now_touching = BTreeSet::new();
        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                let (handle_a, a) = active[i];
                let (handle_b, b) = active[j];
                if a.wants_contact_with(b) && a.overlaps(b) {
                    now_touching.insert((*handle_a, *handle_b));
                }
            }
        }

        for pair in now_touching.difference(&self.touching) {
            let (a, b) = *pair;
            if let (Some(body_a), Some(body_b)) = (self.bodies.get(&a), self.bodies.get(&b)) {
                self.contacts.push(ContactEvent {
                    body_a: a,
                    body_b: b,
                    category_a: body_a.desc.category,
                    category_b: body_b.desc.category,
                });
            }
        }
        self.touching = now_touching;
    }
}

impl PhysicsAdapter for ArenaPhysics {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        let body = SandboxBody {
            position: desc.position,
            velocity: desc.velocity,
            angular_velocity: 0.0,
            active: true,
            desc,
        };
        self.bodies.insert(handle, body);
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.touching.retain(|(a, b)| *a != body && *b != body);
    }

    fn set_active(&mut self, body: BodyHandle, active: bool) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.active = active;
        }
        if !active {
            self.touching.retain(|(a, b)| *a != body && *b != body);
        }
    }

    fn is_active(&self, body: BodyHandle) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.active)
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if b.desc.dynamic && b.desc.mass > 0.0 {
                b.velocity = b.velocity + impulse * (1.0 / b.desc.mass);
            }
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.position = position;
        }
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }
}
