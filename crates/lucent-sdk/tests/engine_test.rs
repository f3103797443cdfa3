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

use lucent_control::RuntimeError;
use lucent_core::telemetry::MetricId;
use lucent_core::HostHints;
use lucent_infra::GeometricObservers;
use lucent_sdk::prelude::*;

const FRAME_MS: f64 = 1000.0 / 60.0;

fn low_end_hints() -> HostHints {
    HostHints {
        hardware_concurrency: Some(2),
        device_memory_gib: Some(2.0),
        network: None,
        fine_pointer: true,
        touch_primary: false,
    }
}

fn workstation_hints() -> HostHints {
    HostHints {
        hardware_concurrency: Some(16),
        device_memory_gib: Some(32.0),
        network: None,
        fine_pointer: true,
        touch_primary: false,
    }
}

fn seeded_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.particle.seed = Some(42);
    config
}

#[test]
fn test_low_profile_starts_at_low_cap_and_stays_below_high() {
    let mut engine =
        EffectEngine::create(seeded_config(), EngineHost::fixed(low_end_hints(), true)).unwrap();
    assert_eq!(engine.capability_profile().performance_tier, QualityTier::Low);
    assert_eq!(engine.quality_tier(), QualityTier::Low);

    let field = engine
        .particle_field("field", Rect::new(0.0, 0.0, 1280.0, 720.0), EffectTarget::Detached)
        .unwrap();
    engine.play(field.id()).unwrap();
    let population = engine
        .effect::<ParticleFieldEffect>(field.id())
        .unwrap()
        .particles()
        .len();
    assert_eq!(population, 100);

    // Twenty seconds of perfect frames.
    for frame in 0..1200 {
        let report = engine.tick(frame as f64 * FRAME_MS);
        assert!(report.quality <= QualityTier::Medium);
        let effect = engine.effect::<ParticleFieldEffect>(field.id()).unwrap();
        assert!(effect.particles().len() <= 250);
    }

    assert_eq!(engine.set_quality_override(Some(QualityTier::High)), QualityTier::High);
    engine.tick(1200.0 * FRAME_MS);
    assert_eq!(engine.quality_tier(), QualityTier::High);
}

#[test]
fn test_parallax_waits_for_its_element() {
    let layout = GeometricObservers::new(Rect::new(0.0, 0.0, 1000.0, 800.0));
    layout.place(ElementId(1), Rect::new(0.0, 2000.0, 1000.0, 400.0));
    let host = EngineHost::fixed(workstation_hints(), true).with_observers(layout.clone());
    let mut engine = EffectEngine::create(EngineConfig::default(), host).unwrap();

    let hero = engine
        .parallax("hero", ElementId(1), ObserverOptions::default())
        .unwrap();
    engine.play(hero.id()).unwrap();

    let report = engine.tick(0.0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.advanced, 0);

    layout.scroll_to(1500.0);
    layout.refresh();
    let report = engine.tick(FRAME_MS);
    assert_eq!(report.advanced, 1);
    assert!(engine.visibility(hero.id()).unwrap().is_visible);

    let parallax = engine.effect::<ParallaxEffect>(hero.id()).unwrap();
    assert!(parallax.layers().iter().any(|layer| layer.offset != 0.0));
}

#[test]
fn test_cursor_follower_tracks_pointer() {
    let mut engine =
        EffectEngine::create(EngineConfig::default(), EngineHost::fixed(workstation_hints(), true))
            .unwrap();
    let follower = engine.cursor_follower("cursor").unwrap();
    engine.play(follower.id()).unwrap();

    for frame in 0..30 {
        let t = frame as f64 * FRAME_MS;
        engine.pointer_moved(400.0, 300.0, t);
        engine.tick(t);
    }

    let effect = engine.effect::<CursorFollowerEffect>(follower.id()).unwrap();
    assert!(effect.is_visible());
    let lead = effect.dots()[0].position;
    assert!((lead - Vec2::new(400.0, 300.0)).length() < 1.0);
}

#[test]
fn test_telemetry_records_every_tick() {
    let mut engine =
        EffectEngine::create(EngineConfig::default(), EngineHost::fixed(workstation_hints(), true))
            .unwrap();
    for frame in 0..30 {
        engine.tick(frame as f64 * FRAME_MS);
    }
    assert_eq!(engine.telemetry().frames(), 30);
    let registry = engine.telemetry().registry();
    assert!(registry.contains_metric(&MetricId::new("lucent", "tick_cost_ms")));
    assert!(registry.contains_metric(&MetricId::new("lucent", "fps")));
}

#[test]
fn test_particle_gauges_follow_the_effect_lifecycle() {
    let mut engine =
        EffectEngine::create(seeded_config(), EngineHost::fixed(workstation_hints(), true))
            .unwrap();
    let population = MetricId::new("particles", "population").with_label("effect", "hero");
    let bounds = Rect::new(0.0, 0.0, 1280.0, 720.0);

    let first = engine
        .particle_field("hero", bounds, EffectTarget::Detached)
        .unwrap()
        .detach();
    engine.play(&first).unwrap();
    engine.tick(0.0);
    engine.tick(FRAME_MS);
    let live_count = engine.telemetry().registry().metric_count();
    assert!(engine.telemetry().registry().contains_metric(&population));

    // A rejected duplicate leaves the live gauges untouched.
    assert!(matches!(
        engine.particle_field("hero", bounds, EffectTarget::Detached),
        Err(EngineError::Runtime(RuntimeError::DuplicateId(_)))
    ));
    let gauge = engine.telemetry().registry().get_metric(&population).unwrap();
    assert!(gauge.value.as_gauge().unwrap() > 0.0);
    assert_eq!(engine.telemetry().registry().metric_count(), live_count);

    assert!(engine.dispose_effect(&first));
    assert!(!engine.telemetry().registry().contains_metric(&population));
    assert_eq!(engine.telemetry().registry().metric_count(), live_count - 3);

    let second = engine
        .particle_field("hero", bounds, EffectTarget::Detached)
        .unwrap();
    engine.play(second.id()).unwrap();
    engine.tick(2.0 * FRAME_MS);
    assert_eq!(engine.telemetry().registry().metric_count(), live_count);
    let published = engine
        .telemetry()
        .registry()
        .get_metric(&population)
        .unwrap()
        .value
        .as_gauge()
        .unwrap();
    let stats = engine.effect::<ParticleFieldEffect>(second.id()).unwrap().last_stats();
    assert_eq!(published as usize, stats.population);

    // Releasing through the handle drops the gauges on the next tick.
    drop(second);
    engine.tick(3.0 * FRAME_MS);
    assert!(!engine.telemetry().registry().contains_metric(&population));
    assert_eq!(engine.telemetry().registry().metric_count(), live_count - 3);
}

#[test]
fn test_quality_listener_sees_override() {
    use std::sync::{Arc, Mutex};

    let mut engine =
        EffectEngine::create(EngineConfig::default(), EngineHost::fixed(workstation_hints(), true))
            .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.add_quality_listener(Box::new(move |from, to| sink.lock().unwrap().push((from, to))));

    engine.set_quality_override(Some(QualityTier::Low));
    assert_eq!(seen.lock().unwrap().as_slice(), &[(QualityTier::High, QualityTier::Low)]);
}

#[test]
fn test_dispose_is_final() {
    let mut engine =
        EffectEngine::create(EngineConfig::default(), EngineHost::fixed(workstation_hints(), true))
            .unwrap();
    let follower = engine.cursor_follower("cursor").unwrap().detach();
    engine.dispose();
    engine.dispose();
    assert!(engine.is_disposed());
    assert!(engine.state(&follower).is_none());
    assert!(matches!(
        engine.cursor_follower("again"),
        Err(EngineError::Runtime(RuntimeError::Disposed))
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = EngineConfig::default();
    config.monitor.upgrade_windows = 0;
    assert!(matches!(
        EffectEngine::create(config, EngineHost::fixed(workstation_hints(), true)),
        Err(EngineError::Config(_))
    ));
}
