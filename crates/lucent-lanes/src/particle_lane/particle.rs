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

//! Particle and edge records produced by the field.

use lucent_core::math::Vec2;

/// Fraction of a particle's life spent fading in.
pub const FADE_IN_FRACTION: f32 = 0.1;
/// Fraction of a particle's life spent fading out.
pub const FADE_OUT_FRACTION: f32 = 0.2;

/// A single simulated particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Stable identifier, unique within its field.
    pub id: u64,
    /// Position in page pixels.
    pub position: Vec2,
    /// Velocity in px/s.
    pub velocity: Vec2,
    /// Drawn radius in pixels.
    pub radius: f32,
    /// Opacity at full life.
    pub base_opacity: f32,
    /// Seconds since spawn.
    pub age: f32,
    /// Seconds the particle lives for.
    pub lifetime: f32,
    /// Marked for removal by a population cap reduction.
    pub retiring: bool,
}

impl Particle {
    /// Fraction of the lifetime already elapsed, in `[0, 1]`.
    #[inline]
    pub fn life_fraction(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    /// Current opacity: the base opacity faded in and out over the lifetime.
    pub fn opacity(&self) -> f32 {
        let t = self.life_fraction();
        let fade_in = (t / FADE_IN_FRACTION).min(1.0);
        let fade_out = ((1.0 - t) / FADE_OUT_FRACTION).min(1.0);
        self.base_opacity * fade_in.min(fade_out)
    }

    /// `true` once the particle has outlived its lifetime.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }

    /// GPU-ready view of this particle.
    pub fn vertex(&self) -> ParticleVertex {
        ParticleVertex {
            position: [self.position.x, self.position.y],
            radius: self.radius,
            opacity: self.opacity(),
        }
    }
}

/// Flat, `Pod` representation of a particle for upload to a renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    /// Position in page pixels.
    pub position: [f32; 2],
    /// Radius in pixels.
    pub radius: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

/// A line between two nearby particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionEdge {
    /// The lower of the two particle ids.
    pub a: u64,
    /// The higher of the two particle ids.
    pub b: u64,
    /// Distance between the particles when the edge was built.
    pub distance: f32,
    /// `1 - distance / cutoff`.
    pub opacity: f32,
}

/// Cursor force falloff: `(1 - d/r)^2` inside the radius, `0` outside.
///
/// Continuous and monotone non-increasing in `d`, exactly `0` at `d == r`.
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    if radius.is_nan() || distance.is_nan() || radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let k = 1.0 - distance.max(0.0) / radius;
    k * k
}
