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

//! Tuning of the particle field.

use lucent_core::{EffectError, QualityTier, TierTable};
use serde::{Deserialize, Serialize};

/// A closed `[min, max]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl Span {
    /// Creates a span.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `true` if both bounds are finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Configuration of a [`ParticleField`](super::ParticleField).
///
/// Distances are in page pixels, speeds in px/s, durations in seconds
/// unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFieldConfig {
    /// Population cap per tier.
    pub population: TierTable<usize>,
    /// Initial speed range per tier.
    pub speed: TierTable<Span>,
    /// Maximum number of connection edges per tier.
    pub max_connections: TierTable<usize>,
    /// Ticks between connection-graph rebuilds, per tier.
    pub connection_interval: TierTable<u32>,
    /// Pairs closer than this are connected.
    pub connection_distance: f32,
    /// Edges per particle, if limited.
    pub max_links_per_particle: Option<usize>,
    /// Radius of the cursor's influence.
    pub influence_radius: f32,
    /// Acceleration toward a slow cursor at zero distance.
    pub attraction_strength: f32,
    /// Acceleration away from a fast cursor at zero distance.
    pub repulsion_strength: f32,
    /// Pointer speed above which the cursor repels.
    pub repulsion_speed_threshold: f32,
    /// Velocity retained per 60 Hz frame.
    pub damping: f32,
    /// Speed limit applied after forcing.
    pub max_speed: f32,
    /// Particle lifetime range.
    pub lifetime: Span,
    /// Particle radius range.
    pub radius: Span,
    /// Base opacity range.
    pub opacity: Span,
    /// How far back in the pointer history the field follows, in ms.
    pub follow_delay_ms: f64,
    /// Per-frame (60 Hz) easing of the follow point toward the pointer.
    pub pointer_smoothing: f32,
    /// Longest remaining life of a particle retired by a shrinking cap.
    pub retire_seconds: f32,
    /// Spawn budget per tick.
    pub max_spawn_per_tick: usize,
    /// Particles further than this outside the bounds are removed.
    pub cull_margin: f32,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            population: TierTable::new(100, 250, 500),
            speed: TierTable::new(Span::new(6.0, 18.0), Span::new(8.0, 26.0), Span::new(10.0, 34.0)),
            max_connections: TierTable::new(80, 250, 500),
            connection_interval: TierTable::new(3, 2, 1),
            connection_distance: 120.0,
            max_links_per_particle: None,
            influence_radius: 180.0,
            attraction_strength: 420.0,
            repulsion_strength: 1600.0,
            repulsion_speed_threshold: 900.0,
            damping: 0.985,
            max_speed: 480.0,
            lifetime: Span::new(8.0, 20.0),
            radius: Span::new(1.0, 2.6),
            opacity: Span::new(0.35, 0.9),
            follow_delay_ms: 60.0,
            pointer_smoothing: 0.2,
            retire_seconds: 1.0,
            max_spawn_per_tick: 8,
            cull_margin: 48.0,
            seed: None,
        }
    }
}

impl ParticleFieldConfig {
    /// Population cap at `tier`.
    pub fn cap(&self, tier: QualityTier) -> usize {
        self.population.at(tier)
    }

    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), EffectError> {
        let positive = [
            ("connection_distance", self.connection_distance),
            ("influence_radius", self.influence_radius),
            ("max_speed", self.max_speed),
            ("retire_seconds", self.retire_seconds),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EffectError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(EffectError::InvalidConfig("damping must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.pointer_smoothing) {
            return Err(EffectError::InvalidConfig(
                "pointer_smoothing must be within [0, 1]".into(),
            ));
        }
        let spans = [
            ("lifetime", self.lifetime),
            ("radius", self.radius),
            ("opacity", self.opacity),
        ];
        for (name, span) in spans {
            if !span.is_valid() {
                return Err(EffectError::InvalidConfig(format!("{name} range is invalid")));
            }
        }
        if self.lifetime.min <= 0.0 {
            return Err(EffectError::InvalidConfig("lifetime must be positive".into()));
        }
        for tier in QualityTier::ALL {
            if !self.speed.get(tier).is_valid() {
                return Err(EffectError::InvalidConfig(format!("speed range for {tier} is invalid")));
            }
        }
        Ok(())
    }
}
