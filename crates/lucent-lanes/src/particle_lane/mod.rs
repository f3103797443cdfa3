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

//! The particle-field simulation lane.
//!
//! A [`ParticleField`] advances a bounded population of particles through
//! four ordered stages per tick: kinematics, cursor forcing, lifecycle and
//! the connection graph. Population caps and connection budgets come from
//! per-tier tables and are re-read on every [`ParticleField::configure`].

pub mod config;
pub mod connections;
pub mod forcing;
pub mod kinematics;
pub mod lifecycle;
pub mod particle;

pub use config::{ParticleFieldConfig, Span};
pub use connections::{build_edges, ConnectionGraph};
pub use forcing::{CursorForce, ForceMode};
pub use particle::{falloff, ConnectionEdge, Particle, ParticleVertex};

use lucent_core::math::Rect;
use lucent_core::{CapabilityProfile, EffectError, PointerState, QualityTier};

use self::lifecycle::Spawner;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    /// Particles alive after the tick.
    pub population: usize,
    /// Current population cap.
    pub cap: usize,
    /// Particles marked retiring.
    pub retiring: usize,
    /// Particles spawned this tick.
    pub spawned: usize,
    /// Particles removed this tick.
    pub culled: usize,
    /// Particles inside the cursor's influence radius.
    pub influenced: usize,
    /// Edges in the connection graph.
    pub edges: usize,
    /// The connection graph was rebuilt this tick.
    pub rebuilt_connections: bool,
}

/// A bounded, cursor-reactive particle field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: ParticleFieldConfig,
    bounds: Rect,
    tier: QualityTier,
    cap: usize,
    speed: Span,
    max_connections: usize,
    connection_interval: u32,
    forcing_enabled: bool,
    configured: bool,
    particles: Vec<Particle>,
    graph: ConnectionGraph,
    force: CursorForce,
    spawner: Spawner,
}

impl ParticleField {
    /// Creates an empty field over `bounds`.
    ///
    /// Nothing is spawned until the first [`configure`](Self::configure).
    pub fn new(config: ParticleFieldConfig, bounds: Rect) -> Result<Self, EffectError> {
        config.validate()?;
        let tier = QualityTier::default();
        Ok(Self {
            spawner: Spawner::new(config.seed),
            cap: 0,
            speed: config.speed.at(tier),
            max_connections: config.max_connections.at(tier),
            connection_interval: config.connection_interval.at(tier),
            forcing_enabled: true,
            configured: false,
            particles: Vec::new(),
            graph: ConnectionGraph::new(),
            force: CursorForce::new(),
            tier,
            bounds,
            config,
        })
    }

    /// Applies the per-tier tables for `tier`.
    ///
    /// The first call fills the field to the cap at once. Later calls that
    /// shrink the cap retire the oldest excess particles; calls that grow it
    /// let the spawner catch up over the following ticks.
    pub fn configure(&mut self, profile: &CapabilityProfile, tier: QualityTier) {
        let previous_cap = self.cap;
        self.tier = tier;
        self.cap = self.config.cap(tier);
        self.speed = self.config.speed.at(tier);
        self.max_connections = self.config.max_connections.at(tier);
        self.connection_interval = self.config.connection_interval.at(tier).max(1);
        self.forcing_enabled = !profile.touch_primary;
        self.graph.invalidate();

        if !self.configured {
            self.configured = true;
            self.particles.reserve(self.cap);
            for _ in 0..self.cap {
                let p = self
                    .spawner
                    .inside(self.bounds, self.speed, &self.config, true);
                self.particles.push(p);
            }
            log::debug!(
                "Particle field filled with {} particles at tier {}.",
                self.cap,
                tier
            );
            return;
        }

        if self.cap < previous_cap {
            let retired =
                lifecycle::retire_excess(&mut self.particles, self.cap, self.config.retire_seconds);
            log::debug!(
                "Particle cap {} -> {} at tier {}; retiring {} particles.",
                previous_cap,
                self.cap,
                tier,
                retired
            );
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        pointer: &PointerState,
        now_ms: f64,
    ) -> Result<FieldStats, EffectError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(EffectError::NonFinite("particle field dt"));
        }
        let mut stats = FieldStats {
            cap: self.cap,
            ..Default::default()
        };
        if self.cap == 0 && self.particles.is_empty() {
            self.force.reset();
            return Ok(stats);
        }

        // 1. Kinematics
        kinematics::integrate(&mut self.particles, dt, self.config.damping);

        // 2. Cursor forcing
        let follow = if self.forcing_enabled {
            self.force.update_follow(pointer, now_ms, dt, &self.config)
        } else {
            self.force.reset();
            None
        };
        if let Some(center) = follow {
            let mode = CursorForce::mode(pointer, &self.config);
            stats.influenced =
                forcing::apply(&mut self.particles, center, mode, dt, &self.config);
        }

        // 3. Lifecycle
        lifecycle::age(&mut self.particles, dt);
        stats.culled = lifecycle::cull(&mut self.particles, self.bounds, self.config.cull_margin);
        stats.spawned = lifecycle::replenish(
            &mut self.particles,
            &mut self.spawner,
            self.cap,
            self.config.max_spawn_per_tick,
            self.bounds,
            self.speed,
            &self.config,
        );

        // 4. Connection graph
        stats.rebuilt_connections = self.graph.tick(
            &self.particles,
            self.connection_interval,
            self.config.connection_distance,
            self.max_connections,
            self.config.max_links_per_particle,
        );

        stats.population = self.particles.len();
        stats.retiring = self.particles.iter().filter(|p| p.retiring).count();
        stats.edges = self.graph.edges().len();
        log::trace!(
            "Particle field tick: {} alive, {} spawned, {} culled, {} edges.",
            stats.population,
            stats.spawned,
            stats.culled,
            stats.edges
        );
        Ok(stats)
    }

    /// Changes the simulation bounds. Particles far outside are culled on
    /// the next tick.
    pub fn resize(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.graph.invalidate();
    }

    /// Live particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Current connection edges.
    pub fn edges(&self) -> &[ConnectionEdge] {
        self.graph.edges()
    }

    /// `Pod` vertices for every particle.
    pub fn vertices(&self) -> Vec<ParticleVertex> {
        self.particles.iter().map(Particle::vertex).collect()
    }

    /// Population cap at the current tier.
    pub fn population_cap(&self) -> usize {
        self.cap
    }

    /// Edge budget at the current tier.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Tier of the last [`configure`](Self::configure).
    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Whether cursor forcing is enabled for this device.
    pub fn forcing_enabled(&self) -> bool {
        self.forcing_enabled
    }

    /// Current follow point of the cursor force.
    pub fn follow_point(&self) -> Option<lucent_core::math::Vec2> {
        self.force.follow_point()
    }

    /// Simulation bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The configuration in use.
    pub fn config(&self) -> &ParticleFieldConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::math::Vec2;
    use lucent_core::{HostHints, PointerConfig};

    const DT: f32 = 1.0 / 60.0;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 800.0)
    }

    fn seeded() -> ParticleFieldConfig {
        ParticleFieldConfig {
            seed: Some(0xC0FFEE),
            ..Default::default()
        }
    }

    fn profile() -> CapabilityProfile {
        CapabilityProfile::with_tier(QualityTier::High)
    }

    fn idle_pointer() -> PointerState {
        PointerState::new(PointerConfig::default())
    }

    #[test]
    fn test_initial_fill_matches_tier_cap() {
        for (tier, cap) in [
            (QualityTier::Low, 100),
            (QualityTier::Medium, 250),
            (QualityTier::High, 500),
        ] {
            let mut field = ParticleField::new(seeded(), bounds()).unwrap();
            field.configure(&profile(), tier);
            assert_eq!(field.particles().len(), cap);
            assert!(field.particles().iter().all(|p| bounds().contains(p.position)));
        }
    }

    #[test]
    fn test_population_never_exceeds_cap() {
        let mut field = ParticleField::new(seeded(), bounds()).unwrap();
        field.configure(&profile(), QualityTier::Medium);
        let pointer = idle_pointer();
        for i in 0..1200 {
            let stats = field.tick(DT, &pointer, i as f64 * 16.0).unwrap();
            assert!(stats.population <= 250);
        }
    }

    #[test]
    fn test_downgrade_converges_without_growth() {
        let mut field = ParticleField::new(seeded(), bounds()).unwrap();
        field.configure(&profile(), QualityTier::High);
        assert_eq!(field.particles().len(), 500);

        field.configure(&profile(), QualityTier::Low);
        assert_eq!(field.population_cap(), 100);

        let pointer = idle_pointer();
        let mut previous = field.particles().len();
        let mut converged_at = None;
        // retire_seconds is 1 s, so 2 s of ticks is a generous bound.
        for i in 0..120 {
            let stats = field.tick(DT, &pointer, i as f64 * 16.0).unwrap();
            assert!(stats.population <= 500);
            if stats.population > 100 {
                assert!(stats.population <= previous, "population grew during convergence");
            }
            previous = stats.population;
            if stats.population <= 100 && converged_at.is_none() {
                converged_at = Some(i);
            }
        }
        assert!(converged_at.is_some(), "population did not converge");
        assert!(field.particles().len() <= 100);
    }

    #[test]
    fn test_zero_cap_is_inert() {
        let mut config = seeded();
        config.population = lucent_core::TierTable::new(0, 0, 0);
        let mut field = ParticleField::new(config, bounds()).unwrap();
        field.configure(&profile(), QualityTier::High);
        let stats = field.tick(DT, &idle_pointer(), 0.0).unwrap();
        assert_eq!(stats.population, 0);
        assert_eq!(stats.spawned, 0);
        assert!(field.edges().is_empty());
    }

    #[test]
    fn test_edges_stay_within_budget() {
        let mut config = seeded();
        config.connection_distance = 400.0;
        let mut field = ParticleField::new(config, bounds()).unwrap();
        field.configure(&profile(), QualityTier::Low);
        let stats = field.tick(DT, &idle_pointer(), 0.0).unwrap();
        assert!(stats.rebuilt_connections);
        assert_eq!(stats.edges, 80);
        assert!(field.edges().len() <= field.max_connections());
    }

    #[test]
    fn test_seeded_fields_are_deterministic() {
        let run = || {
            let mut field = ParticleField::new(seeded(), bounds()).unwrap();
            field.configure(&profile(), QualityTier::Medium);
            let mut pointer = idle_pointer();
            for i in 0..90 {
                let now = i as f64 * 16.0;
                pointer.record_move(Vec2::new(300.0 + i as f32 * 4.0, 400.0), now);
                field.tick(DT, &pointer, now).unwrap();
            }
            field.vertices()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_touch_profile_disables_forcing() {
        let touch = CapabilityProfile::from_hints(
            &HostHints {
                touch_primary: true,
                fine_pointer: false,
                ..HostHints::conservative()
            },
            true,
        );
        let mut field = ParticleField::new(seeded(), bounds()).unwrap();
        field.configure(&touch, QualityTier::Low);
        assert!(!field.forcing_enabled());

        let mut pointer = idle_pointer();
        pointer.record_move(Vec2::new(640.0, 400.0), 0.0);
        let stats = field.tick(DT, &pointer, 0.0).unwrap();
        assert_eq!(stats.influenced, 0);
        assert!(field.follow_point().is_none());
    }

    #[test]
    fn test_slow_cursor_gathers_particles() {
        let mut field = ParticleField::new(seeded(), bounds()).unwrap();
        field.configure(&profile(), QualityTier::High);
        let centre = Vec2::new(640.0, 400.0);
        let mut pointer = idle_pointer();

        let near = |field: &ParticleField| {
            field
                .particles()
                .iter()
                .filter(|p| p.position.distance(centre) < 60.0)
                .count()
        };
        let before = near(&field);
        for i in 0..180 {
            let now = i as f64 * 16.0;
            pointer.record_move(centre, now);
            field.tick(DT, &pointer, now).unwrap();
        }
        assert!(near(&field) > before);
    }

    #[test]
    fn test_non_finite_dt_is_rejected() {
        let mut field = ParticleField::new(seeded(), bounds()).unwrap();
        field.configure(&profile(), QualityTier::Low);
        assert!(field.tick(f32::NAN, &idle_pointer(), 0.0).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ParticleFieldConfig {
            influence_radius: -1.0,
            ..Default::default()
        };
        assert!(ParticleField::new(config, bounds()).is_err());
    }
}
