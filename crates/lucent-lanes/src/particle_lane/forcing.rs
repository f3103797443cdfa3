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

//! Cursor-driven magnetic forcing.
//!
//! The field does not react to the raw pointer. It follows a point that
//! eases toward where the pointer was `follow_delay_ms` ago, which gives the
//! characteristic lagging swirl. A slow cursor attracts nearby particles, a
//! fast one scatters them.

use lucent_core::math::{ease_factor, Vec2};
use lucent_core::PointerState;

use super::config::ParticleFieldConfig;
use super::kinematics::damping_factor;
use super::particle::{falloff, Particle};

/// Whether the cursor currently pulls or pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Pull toward the follow point.
    Attract,
    /// Push away from the follow point.
    Repel,
}

/// Follow-point state carried between ticks.
#[derive(Debug, Clone, Default)]
pub struct CursorForce {
    follow: Option<Vec2>,
}

impl CursorForce {
    /// Creates a force with no follow point.
    pub fn new() -> Self {
        Self::default()
    }

    /// The eased point particles currently react to.
    pub fn follow_point(&self) -> Option<Vec2> {
        self.follow
    }

    /// Drops the follow point so the next active pointer snaps to it.
    pub fn reset(&mut self) {
        self.follow = None;
    }

    /// Eases the follow point toward the delayed pointer position.
    ///
    /// Returns `None` while the pointer is inactive.
    pub fn update_follow(
        &mut self,
        pointer: &PointerState,
        now_ms: f64,
        dt: f32,
        config: &ParticleFieldConfig,
    ) -> Option<Vec2> {
        if !pointer.is_active() {
            self.follow = None;
            return None;
        }
        let target = pointer
            .delayed_position(now_ms, config.follow_delay_ms)
            .unwrap_or_else(|| pointer.smoothed_position());
        let next = match self.follow {
            Some(current) => {
                Vec2::lerp(current, target, ease_factor(config.pointer_smoothing, dt))
            }
            None => target,
        };
        self.follow = Some(next);
        Some(next)
    }

    /// Mode implied by the pointer's current speed.
    pub fn mode(pointer: &PointerState, config: &ParticleFieldConfig) -> ForceMode {
        if pointer.speed() > config.repulsion_speed_threshold {
            ForceMode::Repel
        } else {
            ForceMode::Attract
        }
    }
}

/// Applies the cursor force around `center`, damps, and clamps speed.
///
/// Returns the number of particles inside the influence radius.
pub fn apply(
    particles: &mut [Particle],
    center: Vec2,
    mode: ForceMode,
    dt: f32,
    config: &ParticleFieldConfig,
) -> usize {
    let radius = config.influence_radius;
    let radius_sq = radius * radius;
    let (strength, sign) = match mode {
        ForceMode::Attract => (config.attraction_strength, 1.0),
        ForceMode::Repel => (config.repulsion_strength, -1.0),
    };
    let damping = damping_factor(config.damping, dt);

    let mut influenced = 0;
    for p in particles.iter_mut() {
        let offset = center - p.position;
        let d_sq = offset.length_squared();
        if d_sq >= radius_sq {
            continue;
        }
        let weight = falloff(d_sq.sqrt(), radius);
        if weight <= 0.0 {
            continue;
        }
        influenced += 1;
        let dir = offset.normalize() * sign;
        p.velocity += dir * (strength * weight * dt);
        p.velocity *= damping;
        p.velocity = p.velocity.clamp_length(config.max_speed);
    }
    influenced
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::PointerConfig;

    fn resting(id: u64, x: f32, y: f32) -> Particle {
        Particle {
            id,
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: 1.0,
            base_opacity: 1.0,
            age: 1.0,
            lifetime: 10.0,
            retiring: false,
        }
    }

    #[test]
    fn test_attraction_pulls_toward_center() {
        let config = ParticleFieldConfig::default();
        let mut particles = vec![resting(1, 100.0, 0.0), resting(2, 500.0, 0.0)];
        let hit = apply(&mut particles, Vec2::ZERO, ForceMode::Attract, 1.0 / 60.0, &config);
        assert_eq!(hit, 1);
        assert!(particles[0].velocity.x < 0.0);
        assert_eq!(particles[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_repulsion_pushes_away_and_respects_speed_limit() {
        let config = ParticleFieldConfig {
            repulsion_strength: 1.0e9,
            ..Default::default()
        };
        let mut particles = vec![resting(1, 10.0, 0.0)];
        apply(&mut particles, Vec2::ZERO, ForceMode::Repel, 1.0 / 60.0, &config);
        assert!(particles[0].velocity.x > 0.0);
        assert!(particles[0].velocity.length() <= config.max_speed + 1e-3);
    }

    #[test]
    fn test_particle_on_radius_is_untouched() {
        let config = ParticleFieldConfig::default();
        let mut particles = vec![resting(1, config.influence_radius, 0.0)];
        let hit = apply(&mut particles, Vec2::ZERO, ForceMode::Attract, 1.0 / 60.0, &config);
        assert_eq!(hit, 0);
        assert_eq!(particles[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_follow_point_tracks_active_pointer_only() {
        let config = ParticleFieldConfig::default();
        let mut pointer = PointerState::new(PointerConfig::default());
        let mut force = CursorForce::new();
        assert!(force.update_follow(&pointer, 0.0, 0.016, &config).is_none());

        pointer.record_move(Vec2::new(200.0, 100.0), 1000.0);
        let first = force.update_follow(&pointer, 1000.0, 0.016, &config);
        assert_eq!(first, Some(Vec2::new(200.0, 100.0)));

        pointer.record_move(Vec2::new(400.0, 100.0), 1100.0);
        let eased = force.update_follow(&pointer, 1200.0, 0.016, &config).unwrap();
        assert!(eased.x > 200.0 && eased.x < 400.0);

        pointer.leave();
        assert!(force.update_follow(&pointer, 1300.0, 0.016, &config).is_none());
        assert!(force.follow_point().is_none());
    }
}
