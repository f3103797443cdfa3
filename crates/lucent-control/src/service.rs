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

//! The effect runtime: one cooperative loop per frame.
//!
//! Hosts call [`EffectRuntime::tick`] once per display frame. Pointer input
//! and released handles arrive as [`RuntimeCommand`]s through the runtime's
//! inbox and are only applied at the start of a tick, so effects never
//! observe input changing mid-frame.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lucent_core::event::EventBus;
use lucent_core::math::Vec2;
use lucent_core::visibility::{SubscriptionId, VisibilityRecord};
use lucent_core::{
    CapabilityProfile, Effect, EffectState, FrameContext, PointerConfig, PointerState, QualityTier,
};
use lucent_data::VisibilityTracker;
use serde::{Deserialize, Serialize};

use crate::monitor::{FrameMetrics, PerformanceMonitor};
use crate::registry::{EffectEntry, EffectId, EffectRegistry, EffectTarget};

/// Timestep used for the very first tick.
const FIRST_FRAME_DT: f32 = 1.0 / 60.0;

/// Configuration of the runtime loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on the timestep handed to effects.
    pub max_delta_ms: f64,
    /// Pointer smoothing and activity tuning.
    pub pointer: PointerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: 100.0,
            pointer: PointerConfig::default(),
        }
    }
}

/// Messages accepted by the runtime inbox.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCommand {
    /// The pointer moved to `(x, y)`.
    PointerMoved {
        /// Horizontal page position.
        x: f32,
        /// Vertical page position.
        y: f32,
        /// Host timestamp.
        timestamp_ms: f64,
    },
    /// The pointer left the page.
    PointerLeft,
    /// An [`EffectHandle`] was dropped.
    Release(EffectId),
}

/// Errors returned by runtime operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// An effect with this id is already registered.
    #[error("effect '{0}' is already registered")]
    DuplicateId(EffectId),
    /// No effect with this id is registered.
    #[error("no effect registered as '{0}'")]
    UnknownEffect(EffectId),
    /// The runtime was disposed.
    #[error("the runtime has been disposed")]
    Disposed,
}

/// Scoped registration of one effect.
///
/// Dropping the handle disposes the effect at the start of the next tick.
/// Call [`detach`](Self::detach) to keep the effect registered instead.
#[derive(Debug)]
pub struct EffectHandle {
    id: EffectId,
    inbox: flume::Sender<RuntimeCommand>,
    armed: bool,
}

impl EffectHandle {
    /// The effect identifier.
    pub fn id(&self) -> &EffectId {
        &self.id
    }

    /// Disarms the handle; the effect stays until disposed explicitly.
    pub fn detach(mut self) -> EffectId {
        self.armed = false;
        std::mem::replace(&mut self.id, EffectId(String::new()))
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        if self.armed {
            // Fails only once the runtime itself is gone.
            let _ = self.inbox.send(RuntimeCommand::Release(self.id.clone()));
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Index of this tick, starting at 0.
    pub frame_index: u64,
    /// Timestep handed to effects, in seconds.
    pub dt: f32,
    /// Effective tier after sampling.
    pub quality: QualityTier,
    /// `(previous, current)` if the tier changed this tick.
    pub quality_changed: Option<(QualityTier, QualityTier)>,
    /// Playing effects advanced.
    pub advanced: usize,
    /// Playing effects skipped because their element is hidden.
    pub skipped: usize,
    /// Effects that failed and were stopped.
    pub failures: usize,
    /// Visibility records refreshed by the tracker flush.
    pub visibility_updates: usize,
    /// Frame budget after sampling.
    pub fps: f32,
    /// Rolling frame time after sampling.
    pub frame_time_ms: f32,
}

/// The per-frame effect runtime.
pub struct EffectRuntime {
    config: RuntimeConfig,
    profile: CapabilityProfile,
    monitor: PerformanceMonitor,
    tracker: VisibilityTracker,
    registry: EffectRegistry,
    pointer: PointerState,
    inbox: EventBus<RuntimeCommand>,
    applied_tier: QualityTier,
    last_tick_ms: Option<f64>,
    frame_index: u64,
    disposed: bool,
}

impl EffectRuntime {
    /// Assembles a runtime from its collaborators.
    pub fn create(
        config: RuntimeConfig,
        profile: CapabilityProfile,
        monitor: PerformanceMonitor,
        tracker: VisibilityTracker,
    ) -> Self {
        let applied_tier = monitor.quality_tier();
        log::info!(
            "Effect runtime created (tier {applied_tier}, visibility fail-open: {}).",
            tracker.is_fail_open()
        );
        Self {
            pointer: PointerState::new(config.pointer),
            config,
            profile,
            monitor,
            tracker,
            registry: EffectRegistry::new(),
            inbox: EventBus::new(),
            applied_tier,
            last_tick_ms: None,
            frame_index: 0,
            disposed: false,
        }
    }

    /// Registers an effect. It starts `Idle`; call [`play`](Self::play).
    pub fn register(
        &mut self,
        id: impl Into<EffectId>,
        mut effect: Box<dyn Effect>,
        target: EffectTarget,
    ) -> Result<EffectHandle, RuntimeError> {
        if self.disposed {
            return Err(RuntimeError::Disposed);
        }
        let id = id.into();
        if self.registry.contains(&id) {
            return Err(RuntimeError::DuplicateId(id));
        }

        effect.on_quality_change(self.applied_tier, &self.profile);
        let subscription = self.acquire_subscription(&target);
        self.registry.insert(EffectEntry {
            id: id.clone(),
            effect,
            state: EffectState::Idle,
            target,
            subscription,
        });

        Ok(EffectHandle {
            id,
            inbox: self.inbox.sender(),
            armed: true,
        })
    }

    /// Starts or resumes an effect. Re-acquires its subscription after a stop.
    pub fn play(&mut self, id: &EffectId) -> Result<(), RuntimeError> {
        let entry = self
            .registry
            .get_mut(id)
            .ok_or_else(|| RuntimeError::UnknownEffect(id.clone()))?;
        if entry.state == EffectState::Playing {
            return Ok(());
        }
        if entry.subscription.is_none() {
            entry.subscription = acquire(&mut self.tracker, &entry.target);
        }
        entry.state = EffectState::Playing;
        entry.effect.on_play();
        log::debug!("Effect '{id}' playing.");
        Ok(())
    }

    /// Pauses a playing effect; it keeps its state and subscription.
    pub fn pause(&mut self, id: &EffectId) -> Result<(), RuntimeError> {
        let entry = self
            .registry
            .get_mut(id)
            .ok_or_else(|| RuntimeError::UnknownEffect(id.clone()))?;
        if entry.state == EffectState::Playing {
            entry.state = EffectState::Paused;
            entry.effect.on_pause();
            log::debug!("Effect '{id}' paused.");
        }
        Ok(())
    }

    /// Stops an effect and releases its visibility subscription.
    pub fn stop(&mut self, id: &EffectId) -> Result<(), RuntimeError> {
        let entry = self
            .registry
            .get_mut(id)
            .ok_or_else(|| RuntimeError::UnknownEffect(id.clone()))?;
        if entry.state == EffectState::Stopped {
            return Ok(());
        }
        entry.state = EffectState::Stopped;
        if let Some(sub) = entry.subscription.take() {
            self.tracker.unsubscribe(sub);
        }
        entry.effect.on_stop();
        log::debug!("Effect '{id}' stopped.");
        Ok(())
    }

    /// Removes an effect. Returns `false` if it was not registered.
    pub fn dispose_effect(&mut self, id: &EffectId) -> bool {
        let Some(mut entry) = self.registry.remove(id) else {
            return false;
        };
        if let Some(sub) = entry.subscription.take() {
            self.tracker.unsubscribe(sub);
        }
        if entry.state != EffectState::Stopped {
            entry.effect.on_stop();
        }
        log::info!("Effect '{id}' disposed.");
        true
    }

    /// Forces the effective tier (`None` returns to automatic control).
    ///
    /// A resulting change is broadcast to every effect immediately.
    pub fn set_quality_override(&mut self, tier: Option<QualityTier>) -> QualityTier {
        let effective = self.monitor.set_override(tier);
        self.apply_tier(effective);
        effective
    }

    /// Queues a pointer move.
    pub fn pointer_moved(&self, x: f32, y: f32, timestamp_ms: f64) {
        self.inbox.publish(RuntimeCommand::PointerMoved { x, y, timestamp_ms });
    }

    /// Queues a pointer-leave.
    pub fn pointer_left(&self) {
        self.inbox.publish(RuntimeCommand::PointerLeft);
    }

    /// A sender into the inbox, for hosts producing input on other threads.
    pub fn inbox(&self) -> flume::Sender<RuntimeCommand> {
        self.inbox.sender()
    }

    /// Runs one frame.
    pub fn tick(&mut self, timestamp_ms: f64) -> TickReport {
        if self.disposed {
            log::trace!("Tick on a disposed runtime ignored.");
            return TickReport {
                quality: self.applied_tier,
                ..TickReport::default()
            };
        }

        let mut report = TickReport {
            frame_index: self.frame_index,
            ..TickReport::default()
        };

        // 1. Inbox
        for command in self.inbox.drain() {
            match command {
                RuntimeCommand::PointerMoved { x, y, timestamp_ms } => {
                    self.pointer.record_move(Vec2::new(x, y), timestamp_ms)
                }
                RuntimeCommand::PointerLeft => self.pointer.leave(),
                RuntimeCommand::Release(id) => {
                    self.dispose_effect(&id);
                }
            }
        }

        // 2. Visibility
        report.visibility_updates = self.tracker.flush();

        // 3. Frame budget
        let previous = self.applied_tier;
        let tier = self.monitor.sample(timestamp_ms);
        if self.apply_tier(tier) {
            report.quality_changed = Some((previous, tier));
        }
        report.quality = tier;

        // 4. Pointer
        let dt = self.next_dt(timestamp_ms);
        report.dt = dt;
        self.pointer.decay(dt, timestamp_ms);

        // 5. Effects
        let always_visible = VisibilityRecord::always_visible();
        for entry in self.registry.iter_mut() {
            if entry.state != EffectState::Playing {
                continue;
            }
            let visibility = match entry.subscription {
                Some(sub) => self.tracker.record(sub).unwrap_or_default(),
                None => always_visible,
            };
            if !visibility.allows_work() {
                report.skipped += 1;
                continue;
            }

            let ctx = FrameContext {
                dt,
                timestamp_ms,
                frame_index: self.frame_index,
                quality: tier,
                profile: &self.profile,
                pointer: &self.pointer,
                visibility: &visibility,
            };
            let outcome = catch_unwind(AssertUnwindSafe(|| entry.effect.advance(&ctx)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    report.advanced += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            log::error!("Effect '{}' failed and was stopped: {failure}", entry.id);
            report.failures += 1;
            entry.state = EffectState::Stopped;
            if let Some(sub) = entry.subscription.take() {
                self.tracker.unsubscribe(sub);
            }
            let _ = catch_unwind(AssertUnwindSafe(|| entry.effect.on_stop()));
        }

        let metrics = self.monitor.metrics();
        report.fps = metrics.fps;
        report.frame_time_ms = metrics.frame_time_ms;
        self.frame_index += 1;
        report
    }

    /// Stops and removes every effect and disposes the tracker.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let mut count = 0;
        for mut entry in self.registry.drain() {
            if entry.state != EffectState::Stopped {
                entry.effect.on_stop();
            }
            count += 1;
        }
        self.tracker.dispose();
        self.inbox.drain();
        self.disposed = true;
        log::info!("Effect runtime disposed ({count} effect(s) removed).");
    }

    /// Effective quality tier.
    pub fn quality_tier(&self) -> QualityTier {
        self.applied_tier
    }

    /// The device profile.
    pub fn capability_profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    /// Current frame budget.
    pub fn metrics(&self) -> FrameMetrics {
        self.monitor.metrics()
    }

    /// Lifecycle state of an effect.
    pub fn state(&self, id: &EffectId) -> Option<EffectState> {
        self.registry.state(id)
    }

    /// Typed read access to a registered effect.
    pub fn effect<T: Effect + 'static>(&self, id: &EffectId) -> Option<&T> {
        self.registry
            .get(id)
            .and_then(|e| e.effect.as_any().downcast_ref::<T>())
    }

    /// Typed write access to a registered effect.
    pub fn effect_mut<T: Effect + 'static>(&mut self, id: &EffectId) -> Option<&mut T> {
        self.registry
            .get_mut(id)
            .and_then(|e| e.effect.as_any_mut().downcast_mut::<T>())
    }

    /// Last visibility record of an effect; `always_visible` for detached ones.
    pub fn visibility(&self, id: &EffectId) -> Option<VisibilityRecord> {
        let entry = self.registry.get(id)?;
        Some(match entry.subscription {
            Some(sub) => self.tracker.record(sub).unwrap_or_default(),
            None if entry.target == EffectTarget::Detached => VisibilityRecord::always_visible(),
            None => VisibilityRecord::default(),
        })
    }

    /// Registered effects.
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Shared pointer state.
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// The performance monitor.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Mutable access to the performance monitor, e.g. to add listeners.
    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }

    /// The visibility tracker.
    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    /// Mutable access to the visibility tracker for direct subscriptions.
    pub fn tracker_mut(&mut self) -> &mut VisibilityTracker {
        &mut self.tracker
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// `true` after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn acquire_subscription(&mut self, target: &EffectTarget) -> Option<SubscriptionId> {
        acquire(&mut self.tracker, target)
    }

    /// Broadcasts `tier` to every effect if it differs from the last one applied.
    fn apply_tier(&mut self, tier: QualityTier) -> bool {
        if tier == self.applied_tier {
            return false;
        }
        self.applied_tier = tier;
        for entry in self.registry.iter_mut() {
            entry.effect.on_quality_change(tier, &self.profile);
        }
        true
    }

    fn next_dt(&mut self, timestamp_ms: f64) -> f32 {
        match self.last_tick_ms {
            None if timestamp_ms.is_finite() => {
                self.last_tick_ms = Some(timestamp_ms);
                FIRST_FRAME_DT
            }
            None => FIRST_FRAME_DT,
            Some(last) if timestamp_ms.is_finite() && timestamp_ms > last => {
                self.last_tick_ms = Some(timestamp_ms);
                ((timestamp_ms - last).min(self.config.max_delta_ms) / 1000.0) as f32
            }
            Some(_) => 0.0,
        }
    }
}

impl Drop for EffectRuntime {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn acquire(tracker: &mut VisibilityTracker, target: &EffectTarget) -> Option<SubscriptionId> {
    match target {
        EffectTarget::Detached => None,
        EffectTarget::Element { element, options } => {
            Some(tracker.subscribe(*element, options, None).detach())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
