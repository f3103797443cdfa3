// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The contract every runtime effect implements.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityProfile;
use crate::pointer::PointerState;
use crate::quality::QualityTier;
use crate::visibility::VisibilityRecord;

/// The closed set of effect kinds the runtime knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Ambient particles with cursor forcing and a proximity graph.
    ParticleField,
    /// A trail of dots chasing the pointer.
    CursorFollower,
    /// Layers offset by scroll progress.
    Parallax,
}

impl EffectKind {
    /// Snake-case name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::ParticleField => "particle_field",
            EffectKind::CursorFollower => "cursor_follower",
            EffectKind::Parallax => "parallax",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a registered effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectState {
    /// Registered, never played.
    #[default]
    Idle,
    /// Advanced every frame while visible.
    Playing,
    /// Keeps its state and subscription, not advanced.
    Paused,
    /// Subscription released; `play` starts it again.
    Stopped,
}

/// Errors an effect can report from [`Effect::advance`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    /// The simulation reached a state it cannot continue from.
    #[error("simulation error: {0}")]
    Simulation(String),
    /// A computed value became NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    /// The effect was configured with unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Read-only per-frame inputs handed to [`Effect::advance`].
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Seconds since the previous frame, already clamped by the runtime.
    pub dt: f32,
    /// Host timestamp of this frame in milliseconds.
    pub timestamp_ms: f64,
    /// Number of ticks since the runtime was created.
    pub frame_index: u64,
    /// Effective quality tier for this frame.
    pub quality: QualityTier,
    /// The device profile.
    pub profile: &'a CapabilityProfile,
    /// Shared pointer state.
    pub pointer: &'a PointerState,
    /// Visibility of the element this effect is bound to.
    pub visibility: &'a VisibilityRecord,
}

/// A per-frame visual effect driven by the runtime.
///
/// Implementations own their simulation state and expose it through their
/// concrete type; the rendering layer reaches it by downcasting via
/// [`as_any`](Effect::as_any).
pub trait Effect: Send {
    /// The kind of this effect.
    fn kind(&self) -> EffectKind;

    /// Advances the effect by one frame.
    fn advance(&mut self, ctx: &FrameContext<'_>) -> Result<(), EffectError>;

    /// Applies a new quality tier. Called on registration and on every
    /// tier change, whatever the lifecycle state.
    fn on_quality_change(&mut self, tier: QualityTier, profile: &CapabilityProfile);

    /// Called when the effect starts or resumes playing.
    fn on_play(&mut self) {}

    /// Called when the effect is paused.
    fn on_pause(&mut self) {}

    /// Called when the effect is stopped, including after a failure.
    fn on_stop(&mut self) {}

    /// Allows downcasting to concrete effect types.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to concrete effect types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(EffectKind::ParticleField.to_string(), "particle_field");
        let kind: EffectKind = serde_json::from_str("\"cursor_follower\"").unwrap();
        assert_eq!(kind, EffectKind::CursorFollower);
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(EffectState::default(), EffectState::Idle);
    }
}
