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

use std::any::Any;

use lucent_core::math::ease_factor;
use lucent_core::{CapabilityProfile, Effect, EffectError, EffectKind, FrameContext, QualityTier};
use serde::{Deserialize, Serialize};

/// Tuning of the parallax effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    /// Offset of a depth-1 layer at either end of the scroll range is
    /// `amplitude / 2`.
    pub amplitude: f32,
    /// Per-frame (60 Hz) easing toward the target offset.
    pub easing: f32,
    /// Layers that still move on `Low`.
    pub low_tier_layers: usize,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            amplitude: 120.0,
            easing: 0.12,
            low_tier_layers: 2,
        }
    }
}

/// One parallax layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallaxLayer {
    /// Depth factor; 0 is fixed, negative moves against the scroll.
    pub depth: f32,
    /// Current vertical offset in pixels.
    pub offset: f32,
}

/// Layers offset by the scroll progress of their element.
pub struct ParallaxEffect {
    config: ParallaxConfig,
    layers: Vec<ParallaxLayer>,
    tier: QualityTier,
}

impl ParallaxEffect {
    /// Creates one layer per depth factor.
    pub fn new(config: ParallaxConfig, depths: &[f32]) -> Result<Self, EffectError> {
        if !config.amplitude.is_finite() {
            return Err(EffectError::InvalidConfig("amplitude must be finite".into()));
        }
        if !(0.0..=1.0).contains(&config.easing) {
            return Err(EffectError::InvalidConfig("easing must be within [0, 1]".into()));
        }
        if depths.iter().any(|d| !d.is_finite()) {
            return Err(EffectError::InvalidConfig("layer depths must be finite".into()));
        }
        Ok(Self {
            config,
            layers: depths
                .iter()
                .map(|&depth| ParallaxLayer { depth, offset: 0.0 })
                .collect(),
            tier: QualityTier::default(),
        })
    }

    /// Current layers, in the order they were given.
    pub fn layers(&self) -> &[ParallaxLayer] {
        &self.layers
    }

    /// Tier of the last quality change.
    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Offset a layer of `depth` settles at for `progress`.
    pub fn target_offset(&self, progress: f32, depth: f32) -> f32 {
        (progress.clamp(0.0, 1.0) - 0.5) * depth * self.config.amplitude
    }
}

impl Effect for ParallaxEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Parallax
    }

    fn advance(&mut self, ctx: &FrameContext<'_>) -> Result<(), EffectError> {
        let progress = ctx.visibility.scroll_progress;
        if !progress.is_finite() {
            return Err(EffectError::NonFinite("parallax scroll progress"));
        }
        let low = ctx.quality == QualityTier::Low;
        let factor = ease_factor(self.config.easing, ctx.dt);

        for i in 0..self.layers.len() {
            if low && i >= self.config.low_tier_layers {
                continue;
            }
            let target = self.target_offset(progress, self.layers[i].depth);
            let layer = &mut self.layers[i];
            if low {
                layer.offset = target;
            } else {
                layer.offset += (target - layer.offset) * factor;
            }
        }
        Ok(())
    }

    fn on_quality_change(&mut self, tier: QualityTier, _profile: &CapabilityProfile) {
        self.tier = tier;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
