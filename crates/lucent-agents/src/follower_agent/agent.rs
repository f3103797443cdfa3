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

//! Defines the CursorFollowerEffect.

use std::any::Any;

use lucent_core::math::{ease_factor, Vec2};
use lucent_core::{
    CapabilityProfile, Effect, EffectError, EffectKind, FrameContext, QualityTier, TierTable,
};
use serde::{Deserialize, Serialize};

/// Tuning of the cursor follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Number of dots per tier.
    pub dots: TierTable<usize>,
    /// Delay between consecutive dots, in ms of pointer history.
    pub spacing_ms: f64,
    /// Per-frame (60 Hz) easing of a dot toward its target.
    pub easing: f32,
    /// Per-frame (60 Hz) easing of opacity.
    pub fade: f32,
    /// Radius of the leading dot.
    pub radius: f32,
    /// Radius multiplier from one dot to the next.
    pub radius_falloff: f32,
    /// Opacity of the leading dot while the pointer is active.
    pub max_opacity: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            dots: TierTable::new(4, 8, 12),
            spacing_ms: 24.0,
            easing: 0.35,
            fade: 0.12,
            radius: 6.0,
            radius_falloff: 0.88,
            max_opacity: 0.85,
        }
    }
}

impl FollowerConfig {
    fn validate(&self) -> Result<(), EffectError> {
        if !(self.spacing_ms.is_finite() && self.spacing_ms >= 0.0) {
            return Err(EffectError::InvalidConfig("spacing_ms must be >= 0".into()));
        }
        for (name, value) in [
            ("easing", self.easing),
            ("fade", self.fade),
            ("radius_falloff", self.radius_falloff),
            ("max_opacity", self.max_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EffectError::InvalidConfig(format!("{name} must be within [0, 1]")));
            }
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(EffectError::InvalidConfig("radius must be positive".into()));
        }
        Ok(())
    }
}

/// One dot of the trail.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FollowerDot {
    /// Position in page pixels.
    pub position: Vec2,
    /// Radius in pixels.
    pub radius: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

/// Dots easing toward where the pointer was `i * spacing_ms` ago.
pub struct CursorFollowerEffect {
    config: FollowerConfig,
    dots: Vec<FollowerDot>,
    was_active: bool,
}

impl CursorFollowerEffect {
    /// Creates an empty trail; dots appear once a tier is applied.
    pub fn new(config: FollowerConfig) -> Result<Self, EffectError> {
        config.validate()?;
        Ok(Self {
            config,
            dots: Vec::new(),
            was_active: false,
        })
    }

    /// Current dots, leading dot first.
    pub fn dots(&self) -> &[FollowerDot] {
        &self.dots
    }

    /// `true` while any dot is visible.
    pub fn is_visible(&self) -> bool {
        self.dots.iter().any(|d| d.opacity > 0.0)
    }

    /// The configuration in use.
    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    fn target_opacity(&self, index: usize, active: bool) -> f32 {
        if !active {
            return 0.0;
        }
        let n = self.dots.len().max(1) as f32;
        self.config.max_opacity * (1.0 - 0.7 * index as f32 / n)
    }
}

impl Effect for CursorFollowerEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::CursorFollower
    }

    fn advance(&mut self, ctx: &FrameContext<'_>) -> Result<(), EffectError> {
        let pointer = ctx.pointer;
        let active = pointer.is_active();

        // Snap the whole trail to the pointer when it (re)appears, so dots
        // do not sweep in from their last resting place.
        if active && !self.was_active {
            let at = pointer.position();
            for dot in &mut self.dots {
                dot.position = at;
            }
        }
        self.was_active = active;

        let follow = ease_factor(self.config.easing, ctx.dt);
        let fade = ease_factor(self.config.fade, ctx.dt);
        for i in 0..self.dots.len() {
            let target_opacity = self.target_opacity(i, active);
            let dot = &mut self.dots[i];
            if active {
                let delay = i as f64 * self.config.spacing_ms;
                let target = pointer
                    .delayed_position(ctx.timestamp_ms, delay)
                    .unwrap_or_else(|| pointer.smoothed_position());
                dot.position = Vec2::lerp(dot.position, target, follow);
            }
            dot.opacity += (target_opacity - dot.opacity) * fade;
            if dot.opacity < 1e-3 && !active {
                dot.opacity = 0.0;
            }
            if !dot.position.is_finite() || !dot.opacity.is_finite() {
                return Err(EffectError::NonFinite("cursor follower dot"));
            }
        }
        Ok(())
    }

    fn on_quality_change(&mut self, tier: QualityTier, _profile: &CapabilityProfile) {
        let count = self.config.dots.at(tier);
        let anchor = self.dots.last().map(|d| d.position).unwrap_or(Vec2::ZERO);
        let mut radius = self
            .dots
            .last()
            .map(|d| d.radius * self.config.radius_falloff)
            .unwrap_or(self.config.radius);
        while self.dots.len() < count {
            self.dots.push(FollowerDot {
                position: anchor,
                radius,
                opacity: 0.0,
            });
            radius *= self.config.radius_falloff;
        }
        self.dots.truncate(count);
        log::debug!("Cursor follower uses {} dots at tier {}.", count, tier);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
