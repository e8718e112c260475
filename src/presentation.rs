//! Presentation Collaborator
//!
//! Rendering lives outside the simulation. The world asks a [`Presenter`]
//! to spawn, hide and remove visuals and keeps only the returned handles.
//! A presenter failure is never allowed to stop a game-state mutation:
//! callers log it and carry on.

use thiserror::Error;
use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::vec2::Vec2;

/// Opaque handle to a visual owned by the presenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// What a visual represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    /// Player or enemy sprite
    Character,
    /// Solid platform
    Platform,
    /// Basic attack hitbox
    MeleeHitbox,
    /// Special attack burst
    SpecialBurst,
    /// Projectile
    Projectile,
    /// Shield bubble
    Shield,
    /// Dodge fade cue
    DodgeCue,
    /// Blast-zone explosion
    Explosion,
}

/// Optional animation played on a spawned visual.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Animation {
    /// Scale up by `scale` over `grow` seconds, then fade out over `fade` seconds.
    GrowThenFade {
        /// Final scale factor
        scale: f32,
        /// Seconds spent growing
        grow: f32,
        /// Seconds spent fading
        fade: f32,
    },
    /// Fade to `alpha` over `half_duration`, then back to opaque.
    FadeOutIn {
        /// Lowest alpha reached
        alpha: f32,
        /// Seconds for each half of the cue
        half_duration: f32,
    },
}

/// Request to spawn a visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualRequest {
    /// Kind of visual
    pub kind: VisualKind,
    /// Center position
    pub position: Vec2,
    /// Full size
    pub size: Vec2,
    /// Self-expiry in seconds; `None` when the world removes it explicitly
    pub ttl: Option<f32>,
    /// Optional animation
    pub animation: Option<Animation>,
}

impl VisualRequest {
    /// Request a visual the world will remove itself.
    pub fn new(kind: VisualKind, position: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            position,
            size,
            ttl: None,
            animation: None,
        }
    }

    /// Let the presenter expire the visual after `ttl` seconds.
    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Attach an animation.
    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }
}

/// Presentation errors.
#[derive(Debug, Error)]
pub enum PresentationError {
    /// The asset backing this visual could not be loaded.
    #[error("visual resource unavailable: {0:?}")]
    MissingResource(VisualKind),
    /// Renderer-specific failure.
    #[error("presenter backend error: {0}")]
    Backend(String),
}

/// Interface to the rendering collaborator.
pub trait Presenter {
    /// Spawn a visual.
    fn spawn_visual(&mut self, request: VisualRequest) -> Result<VisualHandle, PresentationError>;

    /// Remove a visual. Unknown handles are ignored.
    fn remove_visual(&mut self, handle: VisualHandle);

    /// Move a visual to a new center position.
    fn move_visual(&mut self, handle: VisualHandle, position: Vec2);

    /// Show or hide a visual.
    fn set_visible(&mut self, handle: VisualHandle, visible: bool);
}

/// Spawn a visual, logging instead of failing.
pub fn spawn_or_warn<P: Presenter + ?Sized>(
    presenter: &mut P,
    request: VisualRequest,
) -> Option<VisualHandle> {
    match presenter.spawn_visual(request) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(kind = ?request.kind, position = %request.position, "visual skipped: {err}");
            None
        }
    }
}

/// Presenter that draws nothing (headless hosts).
#[derive(Clone, Debug, Default)]
pub struct NullPresenter {
    next_id: u32,
}

impl Presenter for NullPresenter {
    fn spawn_visual(&mut self, _request: VisualRequest) -> Result<VisualHandle, PresentationError> {
        self.next_id += 1;
        Ok(VisualHandle(self.next_id))
    }

    fn remove_visual(&mut self, _handle: VisualHandle) {}

    fn move_visual(&mut self, _handle: VisualHandle, _position: Vec2) {}

    fn set_visible(&mut self, _handle: VisualHandle, _visible: bool) {}
}

/// A visual tracked by [`RecordingPresenter`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedVisual {
    /// Original request (position updated by `move_visual`)
    pub request: VisualRequest,
    /// Current visibility
    pub visible: bool,
}

/// Presenter that records every call, for tests and debugging hosts.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    next_id: u32,
    /// Visuals currently alive
    pub live: std::collections::BTreeMap<VisualHandle, RecordedVisual>,
    /// Handles removed, in order
    pub removed: Vec<VisualHandle>,
    /// Kinds whose resources are "missing"
    pub missing: Vec<VisualKind>,
}

impl RecordingPresenter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every spawn of `kind` fail with `MissingResource`.
    pub fn with_missing(mut self, kind: VisualKind) -> Self {
        self.missing.push(kind);
        self
    }

    /// Number of live visuals of a kind.
    pub fn count(&self, kind: VisualKind) -> usize {
        self.live.values().filter(|v| v.request.kind == kind).count()
    }

    /// Look up a live visual.
    pub fn get(&self, handle: VisualHandle) -> Option<&RecordedVisual> {
        self.live.get(&handle)
    }
}

impl Presenter for RecordingPresenter {
    fn spawn_visual(&mut self, request: VisualRequest) -> Result<VisualHandle, PresentationError> {
        if self.missing.contains(&request.kind) {
            return Err(PresentationError::MissingResource(request.kind));
        }
        self.next_id += 1;
        let handle = VisualHandle(self.next_id);
        self.live.insert(handle, RecordedVisual { request, visible: true });
        Ok(handle)
    }

    fn remove_visual(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle).is_some() {
            self.removed.push(handle);
        }
    }

    fn move_visual(&mut self, handle: VisualHandle, position: Vec2) {
        if let Some(visual) = self.live.get_mut(&handle) {
            visual.request.position = position;
        }
    }

    fn set_visible(&mut self, handle: VisualHandle, visible: bool) {
        if let Some(visual) = self.live.get_mut(&handle) {
            visual.visible = visible;
        }
    }
}
