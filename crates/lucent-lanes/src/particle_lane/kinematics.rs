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

//! Free motion: integration and velocity damping.

use super::particle::Particle;

/// Velocity multiplier for a step of `dt` seconds, given the fraction
/// retained per 60 Hz frame.
#[inline]
pub fn damping_factor(per_frame: f32, dt: f32) -> f32 {
    per_frame.clamp(0.0, 1.0).powf(dt.max(0.0) * 60.0)
}

/// Moves every particle along its velocity, then damps the velocity.
pub fn integrate(particles: &mut [Particle], dt: f32, damping: f32) {
    let factor = damping_factor(damping, dt);
    for p in particles.iter_mut() {
        p.position += p.velocity * dt;
        p.velocity *= factor;
    }
}
