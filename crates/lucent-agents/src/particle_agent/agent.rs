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

//! Defines the ParticleFieldEffect.

use std::any::Any;

use lucent_core::math::Rect;
use lucent_core::telemetry::MetricsResult;
use lucent_core::{CapabilityProfile, Effect, EffectError, EffectKind, FrameContext, QualityTier};
use lucent_lanes::particle_lane::FieldStats;
use lucent_lanes::{ConnectionEdge, Particle, ParticleField, ParticleFieldConfig, ParticleVertex};
use lucent_telemetry::{GaugeHandle, MetricsRegistry};

/// Telemetry handles of one particle field. The gauges leave the registry
/// when the handles are dropped.
struct FieldMetrics {
    registry: MetricsRegistry,
    population: GaugeHandle,
    edges: GaugeHandle,
    influenced: GaugeHandle,
}

impl FieldMetrics {
    fn register(registry: &MetricsRegistry, label: &str) -> MetricsResult<Self> {
        let gauge = |name: &str, description: &str| {
            registry.register_gauge_with_labels(
                "particles",
                name,
                description,
                "count",
                vec![("effect".to_string(), label.to_string())],
            )
        };
        Ok(Self {
            registry: registry.clone(),
            population: gauge("population", "Live particles")?,
            edges: gauge("edges", "Connection edges")?,
            influenced: gauge("influenced", "Particles inside the cursor radius")?,
        })
    }
}

impl Drop for FieldMetrics {
    fn drop(&mut self) {
        for gauge in [&self.population, &self.edges, &self.influenced] {
            if let Err(e) = self.registry.unregister(gauge.id()) {
                log::trace!("Particle gauge already gone: {}", e);
            }
        }
    }
}

/// A particle field driven by the effect runtime.
pub struct ParticleFieldEffect {
    field: ParticleField,
    last_stats: FieldStats,
    metrics: Option<FieldMetrics>,
}

impl ParticleFieldEffect {
    /// Creates the effect. The field stays empty until the runtime applies
    /// the first quality tier.
    pub fn new(config: ParticleFieldConfig, bounds: Rect) -> Result<Self, EffectError> {
        Ok(Self {
            field: ParticleField::new(config, bounds)?,
            last_stats: FieldStats::default(),
            metrics: None,
        })
    }

    /// Publishes population, edge and influence gauges under the
    /// `particles` namespace, labelled with `label`.
    pub fn with_telemetry(mut self, registry: &MetricsRegistry, label: &str) -> Self {
        self.attach_telemetry(registry, label);
        self
    }

    /// Same as [`with_telemetry`](Self::with_telemetry) on a registered
    /// effect. Gauges from a previous attachment are removed first.
    pub fn attach_telemetry(&mut self, registry: &MetricsRegistry, label: &str) {
        self.metrics = None;
        match FieldMetrics::register(registry, label) {
            Ok(metrics) => self.metrics = Some(metrics),
            Err(e) => log::warn!("Particle field '{}' runs without telemetry: {}", label, e),
        }
    }

    /// The underlying simulation.
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Live particles.
    pub fn particles(&self) -> &[Particle] {
        self.field.particles()
    }

    /// Current connection edges.
    pub fn edges(&self) -> &[ConnectionEdge] {
        self.field.edges()
    }

    /// `Pod` vertices ready for upload.
    pub fn vertices(&self) -> Vec<ParticleVertex> {
        self.field.vertices()
    }

    /// Statistics of the last advance.
    pub fn last_stats(&self) -> FieldStats {
        self.last_stats
    }

    /// Changes the simulation bounds, e.g. after a viewport resize.
    pub fn resize(&mut self, bounds: Rect) {
        self.field.resize(bounds);
    }

    fn publish(&self) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let stats = &self.last_stats;
        let results = [
            metrics.population.set(stats.population as f64),
            metrics.edges.set(stats.edges as f64),
            metrics.influenced.set(stats.influenced as f64),
        ];
        for result in results {
            if let Err(e) = result {
                log::trace!("Particle gauge update failed: {}", e);
            }
        }
    }
}

impl Effect for ParticleFieldEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::ParticleField
    }

    fn advance(&mut self, ctx: &FrameContext<'_>) -> Result<(), EffectError> {
        self.last_stats = self.field.tick(ctx.dt, ctx.pointer, ctx.timestamp_ms)?;
        self.publish();
        Ok(())
    }

    fn on_quality_change(&mut self, tier: QualityTier, profile: &CapabilityProfile) {
        self.field.configure(profile, tier);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
