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

//! Integration tests for the effect runtime loop.

use std::any::Any;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use lucent_control::{
    EffectId, EffectRuntime, EffectTarget, MonitorConfig, PerformanceMonitor, RuntimeConfig,
    RuntimeError,
};
use lucent_core::math::Rect;
use lucent_core::platform::{IntersectionSink, ObserverBackend};
use lucent_core::visibility::{
    ElementId, IntersectionEntry, ObserverHandle, ObserverOptions, VisibilityError,
};
use lucent_core::{
    CapabilityProfile, Effect, EffectError, EffectKind, EffectState, FrameContext, QualityTier,
};
use lucent_data::VisibilityTracker;

// ─── Fixtures ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct ScriptedBackend {
    sinks: Arc<Mutex<Vec<(ObserverHandle, IntersectionSink)>>>,
}

impl ScriptedBackend {
    fn set_ratio(&self, element: ElementId, ratio: f32) {
        for (handle, sink) in self.sinks.lock().unwrap().iter() {
            sink.deliver(
                *handle,
                vec![IntersectionEntry {
                    element,
                    is_intersecting: ratio > 0.0,
                    intersection_ratio: ratio,
                    bounding_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                    root_bounds: Some(Rect::new(0.0, 0.0, 800.0, 600.0)),
                }],
            );
        }
    }
}

impl ObserverBackend for ScriptedBackend {
    fn create(
        &mut self,
        _: &ObserverOptions,
        sink: IntersectionSink,
    ) -> Result<ObserverHandle, VisibilityError> {
        let mut sinks = self.sinks.lock().unwrap();
        let handle = ObserverHandle(sinks.len() as u64 + 1);
        sinks.push((handle, sink));
        Ok(handle)
    }
    fn observe(&mut self, _: ObserverHandle, _: ElementId) -> Result<(), VisibilityError> {
        Ok(())
    }
    fn unobserve(&mut self, _: ObserverHandle, _: ElementId) {}
    fn disconnect(&mut self, handle: ObserverHandle) {
        self.sinks.lock().unwrap().retain(|(h, _)| *h != handle);
    }
}

#[derive(Default)]
struct StubEffect {
    advanced: u32,
    last_dt: f32,
    tiers: Vec<QualityTier>,
    stopped: u32,
    pointer_active: bool,
    fail_with: Option<&'static str>,
    panic: bool,
}

impl Effect for StubEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Parallax
    }

    fn advance(&mut self, ctx: &FrameContext<'_>) -> Result<(), EffectError> {
        if self.panic {
            panic!("stub exploded");
        }
        if let Some(reason) = self.fail_with {
            return Err(EffectError::Simulation(reason.to_string()));
        }
        self.advanced += 1;
        self.last_dt = ctx.dt;
        self.pointer_active = ctx.pointer.is_active();
        Ok(())
    }

    fn on_quality_change(&mut self, tier: QualityTier, _: &CapabilityProfile) {
        self.tiers.push(tier);
    }

    fn on_stop(&mut self) {
        self.stopped += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn runtime_with(backend: Option<ScriptedBackend>) -> EffectRuntime {
    let profile = CapabilityProfile::with_tier(QualityTier::High);
    let monitor = PerformanceMonitor::new(MonitorConfig::default(), &profile, Some(0.1));
    let tracker = VisibilityTracker::create(
        backend.map(|b| Box::new(b) as Box<dyn ObserverBackend>),
    );
    EffectRuntime::create(RuntimeConfig::default(), profile, monitor, tracker)
}

fn element_target(id: u64) -> EffectTarget {
    EffectTarget::Element {
        element: ElementId(id),
        options: ObserverOptions::default(),
    }
}

fn stub<'a>(rt: &'a EffectRuntime, id: &EffectId) -> &'a StubEffect {
    rt.effect::<StubEffect>(id).expect("stub registered")
}

// ─── Visibility gating ──────────────────────────────────────────────

#[test]
fn hidden_effects_are_never_advanced() {
    let backend = ScriptedBackend::default();
    let mut rt = runtime_with(Some(backend.clone()));
    let id = EffectId::from("hero");
    let _handle = rt
        .register(id.clone(), Box::new(StubEffect::default()), element_target(1))
        .unwrap();
    rt.play(&id).unwrap();

    backend.set_ratio(ElementId(1), 0.0);
    let mut t = 0.0;
    for _ in 0..10 {
        let report = rt.tick(t);
        assert_eq!(report.advanced, 0);
        assert_eq!(report.skipped, 1);
        t += 16.0;
    }
    assert_eq!(stub(&rt, &id).advanced, 0);

    backend.set_ratio(ElementId(1), 0.25);
    let report = rt.tick(t);
    assert_eq!(report.advanced, 1);
    assert_eq!(stub(&rt, &id).advanced, 1);
}

#[test]
fn effects_sharing_an_element_all_advance() {
    let backend = ScriptedBackend::default();
    let mut rt = runtime_with(Some(backend.clone()));
    let a = EffectId::from("hero-particles");
    let b = EffectId::from("hero-parallax");
    let _ha = rt.register(a.clone(), Box::new(StubEffect::default()), element_target(7)).unwrap();
    let _hb = rt.register(b.clone(), Box::new(StubEffect::default()), element_target(7)).unwrap();
    rt.play(&a).unwrap();
    rt.play(&b).unwrap();

    backend.set_ratio(ElementId(7), 1.0);
    assert_eq!(rt.tick(0.0).advanced, 2);

    // Registered after the element's last entry: starts from the shared record.
    let c = EffectId::from("hero-glow");
    let _hc = rt.register(c.clone(), Box::new(StubEffect::default()), element_target(7)).unwrap();
    rt.play(&c).unwrap();
    assert_eq!(rt.tick(16.0).advanced, 3);
    assert_eq!(stub(&rt, &a).advanced, 2);
    assert_eq!(stub(&rt, &b).advanced, 2);
    assert_eq!(stub(&rt, &c).advanced, 1);
}

#[test]
fn paused_and_idle_effects_are_not_advanced() {
    let mut rt = runtime_with(None);
    let a = EffectId::from("a");
    let b = EffectId::from("b");
    let _ha = rt.register(a.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    let _hb = rt.register(b.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    rt.play(&a).unwrap();
    rt.play(&b).unwrap();
    rt.pause(&b).unwrap();
    rt.pause(&b).unwrap();

    let report = rt.tick(0.0);
    assert_eq!(report.advanced, 1);
    assert_eq!(rt.state(&b), Some(EffectState::Paused));
}

// ─── Lifecycle ──────────────────────────────────────────────────────

#[test]
fn duplicate_ids_are_rejected() {
    let mut rt = runtime_with(None);
    let _h = rt.register("x", Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    let err = rt
        .register("x", Box::new(StubEffect::default()), EffectTarget::Detached)
        .unwrap_err();
    assert_eq!(err, RuntimeError::DuplicateId(EffectId::from("x")));
}

#[test]
fn unknown_ids_report_an_error() {
    let mut rt = runtime_with(None);
    assert!(matches!(
        rt.play(&EffectId::from("ghost")),
        Err(RuntimeError::UnknownEffect(_))
    ));
}

#[test]
fn dropping_the_handle_disposes_on_next_tick() {
    let mut rt = runtime_with(None);
    let handle = rt.register("a", Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    let kept = rt
        .register("b", Box::new(StubEffect::default()), EffectTarget::Detached)
        .unwrap()
        .detach();

    drop(handle);
    assert_eq!(rt.registry().len(), 2);
    rt.tick(0.0);
    assert_eq!(rt.registry().len(), 1);
    assert!(rt.state(&kept).is_some());
}

#[test]
fn stop_releases_subscription_and_play_reacquires() {
    let backend = ScriptedBackend::default();
    let mut rt = runtime_with(Some(backend));
    let id = EffectId::from("s");
    let _h = rt.register(id.clone(), Box::new(StubEffect::default()), element_target(4)).unwrap();
    assert_eq!(rt.tracker().subscription_count(), 1);

    rt.play(&id).unwrap();
    rt.stop(&id).unwrap();
    rt.stop(&id).unwrap();
    assert_eq!(rt.tracker().subscription_count(), 0);
    assert_eq!(rt.tracker().observer_count(), 0);
    assert_eq!(stub(&rt, &id).stopped, 1);

    rt.play(&id).unwrap();
    assert_eq!(rt.tracker().subscription_count(), 1);
    assert_eq!(rt.state(&id), Some(EffectState::Playing));
}

// ─── Failure isolation ──────────────────────────────────────────────

#[test]
fn failing_effects_are_stopped_and_others_continue() {
    let backend = ScriptedBackend::default();
    let mut rt = runtime_with(Some(backend.clone()));
    let bad = EffectId::from("bad");
    let boom = EffectId::from("boom");
    let good = EffectId::from("good");

    let failing = StubEffect {
        fail_with: Some("diverged"),
        ..Default::default()
    };
    let panicking = StubEffect {
        panic: true,
        ..Default::default()
    };
    let _h1 = rt.register(bad.clone(), Box::new(failing), element_target(1)).unwrap();
    let _h2 = rt.register(boom.clone(), Box::new(panicking), EffectTarget::Detached).unwrap();
    let _h3 = rt.register(good.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    for id in [&bad, &boom, &good] {
        rt.play(id).unwrap();
    }
    backend.set_ratio(ElementId(1), 1.0);

    let report = rt.tick(0.0);
    assert_eq!(report.failures, 2);
    assert_eq!(report.advanced, 1);
    assert_eq!(rt.state(&bad), Some(EffectState::Stopped));
    assert_eq!(rt.state(&boom), Some(EffectState::Stopped));
    assert_eq!(rt.state(&good), Some(EffectState::Playing));
    assert_eq!(rt.tracker().subscription_count(), 0);
    assert_eq!(stub(&rt, &bad).stopped, 1);

    let report = rt.tick(16.0);
    assert_eq!(report.failures, 0);
    assert_eq!(stub(&rt, &good).advanced, 2);
}

// ─── Quality ────────────────────────────────────────────────────────

#[test]
fn quality_changes_reach_every_effect() {
    let mut rt = runtime_with(None);
    let playing = EffectId::from("p");
    let idle = EffectId::from("i");
    let _h1 = rt.register(playing.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    let _h2 = rt.register(idle.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    rt.play(&playing).unwrap();

    assert_eq!(stub(&rt, &idle).tiers, vec![QualityTier::High]);
    rt.set_quality_override(Some(QualityTier::Low));
    rt.set_quality_override(Some(QualityTier::Low));
    assert_eq!(rt.quality_tier(), QualityTier::Low);
    assert_eq!(stub(&rt, &idle).tiers, vec![QualityTier::High, QualityTier::Low]);
    assert_eq!(stub(&rt, &playing).tiers, vec![QualityTier::High, QualityTier::Low]);
}

#[test]
fn sustained_slow_frames_degrade_during_ticks() {
    let mut rt = runtime_with(None);
    let id = EffectId::from("p");
    let _h = rt.register(id.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    let mut changed = None;
    let mut t = 0.0;
    // 25 fps for three seconds.
    for _ in 0..=75 {
        let report = rt.tick(t);
        if report.quality_changed.is_some() {
            changed = report.quality_changed;
        }
        t += 40.0;
    }
    assert_eq!(changed, Some((QualityTier::High, QualityTier::Medium)));
    assert_eq!(stub(&rt, &id).tiers.last(), Some(&QualityTier::Medium));
}

// ─── Timing and input ───────────────────────────────────────────────

#[test]
fn first_tick_uses_nominal_dt_and_later_ticks_are_clamped() {
    let mut rt = runtime_with(None);
    let id = EffectId::from("p");
    let _h = rt.register(id.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    rt.play(&id).unwrap();

    rt.tick(1000.0);
    assert_relative_eq!(stub(&rt, &id).last_dt, 1.0 / 60.0);
    rt.tick(1020.0);
    assert_relative_eq!(stub(&rt, &id).last_dt, 0.02);
    rt.tick(1520.0);
    assert_relative_eq!(stub(&rt, &id).last_dt, 0.1);
}

#[test]
fn pointer_messages_apply_at_the_next_tick() {
    let mut rt = runtime_with(None);
    let id = EffectId::from("p");
    let _h = rt.register(id.clone(), Box::new(StubEffect::default()), EffectTarget::Detached).unwrap();
    rt.play(&id).unwrap();

    rt.pointer_moved(10.0, 20.0, 0.0);
    assert!(!rt.pointer().is_active());
    rt.tick(0.0);
    assert!(stub(&rt, &id).pointer_active);

    rt.pointer_left();
    rt.tick(16.0);
    assert!(!stub(&rt, &id).pointer_active);
}

#[test]
fn dispose_removes_everything() {
    let backend = ScriptedBackend::default();
    let mut rt = runtime_with(Some(backend));
    let h = rt.register("a", Box::new(StubEffect::default()), element_target(1)).unwrap();
    rt.dispose();
    assert!(rt.is_disposed());
    assert!(rt.registry().is_empty());
    assert_eq!(rt.tracker().observer_count(), 0);
    drop(h);
    assert_eq!(rt.tick(0.0).advanced, 0);
    assert!(rt.register("b", Box::new(StubEffect::default()), EffectTarget::Detached).is_err());
}
