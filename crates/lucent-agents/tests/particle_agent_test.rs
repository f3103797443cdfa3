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

use lucent_agents::ParticleFieldEffect;
use lucent_control::{EffectRuntime, EffectTarget, MonitorConfig, PerformanceMonitor, RuntimeConfig};
use lucent_core::math::Rect;
use lucent_core::telemetry::MetricId;
use lucent_core::{
    CapabilityProfile, Effect, EffectKind, FrameContext, PointerConfig, PointerState, QualityTier,
    VisibilityRecord,
};
use lucent_data::VisibilityTracker;
use lucent_lanes::ParticleFieldConfig;
use lucent_telemetry::MetricsRegistry;

fn seeded() -> ParticleFieldConfig {
    ParticleFieldConfig {
        seed: Some(11),
        ..Default::default()
    }
}

fn viewport() -> Rect {
    Rect::new(0.0, 0.0, 1024.0, 768.0)
}

#[test]
fn test_quality_change_configures_the_field() {
    let profile = CapabilityProfile::with_tier(QualityTier::High);
    let mut effect = ParticleFieldEffect::new(seeded(), viewport()).unwrap();
    assert_eq!(effect.kind(), EffectKind::ParticleField);
    assert!(effect.particles().is_empty());

    effect.on_quality_change(QualityTier::High, &profile);
    assert_eq!(effect.particles().len(), 500);
    assert_eq!(effect.field().population_cap(), 500);

    effect.on_quality_change(QualityTier::Low, &profile);
    assert_eq!(effect.field().population_cap(), 100);
    assert!(effect.particles().iter().filter(|p| p.retiring).count() >= 400);
}

#[test]
fn test_advance_publishes_gauges() {
    let registry = MetricsRegistry::new();
    let profile = CapabilityProfile::with_tier(QualityTier::Medium);
    let pointer = PointerState::new(PointerConfig::default());
    let visibility = VisibilityRecord::always_visible();
    let mut effect = ParticleFieldEffect::new(seeded(), viewport())
        .unwrap()
        .with_telemetry(&registry, "hero");
    effect.on_quality_change(QualityTier::Medium, &profile);

    let ctx = FrameContext {
        dt: 1.0 / 60.0,
        timestamp_ms: 16.0,
        frame_index: 0,
        quality: QualityTier::Medium,
        profile: &profile,
        pointer: &pointer,
        visibility: &visibility,
    };
    effect.advance(&ctx).unwrap();

    let id = MetricId::new("particles", "population").with_label("effect", "hero");
    let population = registry.get_metric(&id).unwrap().value.as_gauge().unwrap();
    assert_eq!(population as usize, effect.last_stats().population);
    assert!(population > 0.0 && population <= 250.0);
}

#[test]
fn test_dropping_the_effect_removes_its_gauges() {
    let registry = MetricsRegistry::new();
    let id = MetricId::new("particles", "edges").with_label("effect", "hero");

    let mut effect = ParticleFieldEffect::new(seeded(), viewport()).unwrap();
    effect.attach_telemetry(&registry, "hero");
    assert_eq!(registry.metric_count(), 3);

    // Re-attaching replaces the gauges instead of stacking them.
    effect.attach_telemetry(&registry, "hero");
    assert_eq!(registry.metric_count(), 3);
    assert!(registry.contains_metric(&id));

    drop(effect);
    assert_eq!(registry.metric_count(), 0);
}

#[test]
fn test_low_profile_runtime_holds_low_cap() {
    let profile = CapabilityProfile::with_tier(QualityTier::Low);
    let monitor = PerformanceMonitor::new(MonitorConfig::default(), &profile, Some(0.1));
    let tracker = VisibilityTracker::create(None);
    let mut runtime = EffectRuntime::create(RuntimeConfig::default(), profile, monitor, tracker);

    let effect = ParticleFieldEffect::new(seeded(), viewport()).unwrap();
    let handle = runtime
        .register("field", Box::new(effect), EffectTarget::Detached)
        .unwrap();
    runtime.play(handle.id()).unwrap();

    for i in 0..120 {
        runtime.tick(i as f64 * 16.7);
        let field = runtime.effect::<ParticleFieldEffect>(handle.id()).unwrap();
        assert!(field.particles().len() <= 100);
    }
    let field = runtime.effect::<ParticleFieldEffect>(handle.id()).unwrap();
    assert!(field.last_stats().population > 0);
}
