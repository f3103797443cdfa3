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

//! Ageing, culling, retirement and spawning.

use std::f32::consts::{FRAC_PI_2, PI};

use lucent_core::math::{Rect, RootMargin, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{ParticleFieldConfig, Span};
use super::particle::Particle;

/// Angular spread of spawn velocities around the inward normal.
const SPAWN_SPREAD: f32 = PI / 3.0;

/// Creates particles from a seeded or entropy-backed RNG.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: StdRng,
    next_id: u64,
}

impl Spawner {
    /// Seeds deterministically when `seed` is set.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, next_id: 0 }
    }

    /// A particle anywhere inside `bounds`, moving in a random direction.
    ///
    /// With `staggered` the particle starts at a random point of its life so
    /// that an initial fill does not expire all at once.
    pub fn inside(
        &mut self,
        bounds: Rect,
        speed: Span,
        config: &ParticleFieldConfig,
        staggered: bool,
    ) -> Particle {
        let position = Vec2::new(
            sample(&mut self.rng, bounds.left(), bounds.right()),
            sample(&mut self.rng, bounds.top(), bounds.bottom()),
        );
        let angle = self.rng.gen_range(0.0..(2.0 * PI));
        let velocity = heading(angle) * sample(&mut self.rng, speed.min, speed.max);
        let mut particle = self.make(position, velocity, config);
        if staggered {
            particle.age = self.rng.gen::<f32>() * particle.lifetime;
        }
        particle
    }

    /// A particle on a random edge of `bounds`, heading inwards.
    pub fn at_edge(&mut self, bounds: Rect, speed: Span, config: &ParticleFieldConfig) -> Particle {
        let edge = self.rng.gen_range(0..4u8);
        let along_x = sample(&mut self.rng, bounds.left(), bounds.right());
        let along_y = sample(&mut self.rng, bounds.top(), bounds.bottom());
        // Inward normal angle for each edge, y pointing down.
        let (position, inward) = match edge {
            0 => (Vec2::new(along_x, bounds.top()), FRAC_PI_2),
            1 => (Vec2::new(bounds.right(), along_y), PI),
            2 => (Vec2::new(along_x, bounds.bottom()), -FRAC_PI_2),
            _ => (Vec2::new(bounds.left(), along_y), 0.0),
        };
        let angle = inward + sample(&mut self.rng, -SPAWN_SPREAD * 0.5, SPAWN_SPREAD * 0.5);
        let velocity = heading(angle) * sample(&mut self.rng, speed.min, speed.max);
        self.make(position, velocity, config)
    }

    fn make(&mut self, position: Vec2, velocity: Vec2, config: &ParticleFieldConfig) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        Particle {
            id,
            position,
            velocity,
            radius: sample(&mut self.rng, config.radius.min, config.radius.max),
            base_opacity: sample(&mut self.rng, config.opacity.min, config.opacity.max),
            age: 0.0,
            lifetime: sample(&mut self.rng, config.lifetime.min, config.lifetime.max),
            retiring: false,
        }
    }
}

fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Uniform sample in `[min, max]`, tolerating an empty range.
fn sample(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Advances every particle's age.
pub fn age(particles: &mut [Particle], dt: f32) {
    for p in particles.iter_mut() {
        p.age += dt;
    }
}

/// Removes expired, non-finite, and far out-of-bounds particles.
///
/// Returns how many were removed.
pub fn cull(particles: &mut Vec<Particle>, bounds: Rect, margin: f32) -> usize {
    let keep_zone = bounds.expand(&RootMargin::uniform(margin.max(0.0)));
    let before = particles.len();
    particles.retain(|p| {
        !p.is_expired()
            && p.position.is_finite()
            && p.velocity.is_finite()
            && keep_zone.contains(p.position)
    });
    before - particles.len()
}

/// Marks the oldest particles beyond `cap` as retiring.
///
/// A retiring particle's remaining life is capped at `retire_seconds`;
/// particles already retiring are not counted against the cap.
pub fn retire_excess(particles: &mut [Particle], cap: usize, retire_seconds: f32) -> usize {
    let live = particles.iter().filter(|p| !p.retiring).count();
    if live <= cap {
        return 0;
    }
    let excess = live - cap;

    let mut candidates: Vec<usize> = particles
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.retiring)
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by(|&a, &b| {
        particles[b]
            .age
            .total_cmp(&particles[a].age)
            .then(particles[a].id.cmp(&particles[b].id))
    });

    for &i in candidates.iter().take(excess) {
        let p = &mut particles[i];
        p.retiring = true;
        p.lifetime = p.lifetime.min(p.age + retire_seconds);
    }
    excess
}

/// Spawns at edges until `cap` is reached or `budget` is spent.
pub fn replenish(
    particles: &mut Vec<Particle>,
    spawner: &mut Spawner,
    cap: usize,
    budget: usize,
    bounds: Rect,
    speed: Span,
    config: &ParticleFieldConfig,
) -> usize {
    let missing = cap.saturating_sub(particles.len()).min(budget);
    for _ in 0..missing {
        particles.push(spawner.at_edge(bounds, speed, config));
    }
    missing
}
