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

//! The engine facade.

use lucent_agents::{CursorFollowerEffect, ParallaxEffect, ParticleFieldEffect};
use lucent_control::{
    EffectHandle, EffectId, EffectRuntime, EffectTarget, FrameMetrics, ListenerId,
    PerformanceMonitor, QualityListener, RuntimeCommand, RuntimeError, TickReport,
};
use lucent_core::math::Rect;
use lucent_core::platform::FrameClock;
use lucent_core::{
    CapabilityProfile, Effect, EffectError, EffectState, ElementId, ObserverOptions, QualityTier,
    SubscriptionId, VisibilityRecord,
};
use lucent_data::{Subscription, VisibilityCallback, VisibilityTracker};
use lucent_infra::CapabilityProbe;
use lucent_telemetry::{
    HistogramHandle, ScopedMetricTimer, TelemetryService, FRAME_TIME_BUCKETS_MS, NAMESPACE,
};

use crate::config::{ConfigError, EngineConfig};
use crate::host::EngineHost;

/// Errors returned by [`EffectEngine`] operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The runtime refused the operation.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// An effect could not be built.
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// One independent effects engine.
///
/// Owns the runtime (monitor, tracker and registry), the telemetry service
/// and the frame clock. Nothing is global: two engines never share state.
pub struct EffectEngine {
    config: EngineConfig,
    runtime: EffectRuntime,
    telemetry: TelemetryService,
    tick_cost: Option<HistogramHandle>,
    clock: Box<dyn FrameClock>,
}

impl EffectEngine {
    /// Probes the host once and assembles the engine.
    ///
    /// Only an invalid `config` fails; every host failure degrades to a
    /// conservative default and is logged.
    pub fn create(config: EngineConfig, host: EngineHost) -> Result<Self, EngineError> {
        config.validate()?;

        let timer_resolution = host.timer_resolution();
        let EngineHost {
            hints,
            graphics,
            observers,
            clock,
            ..
        } = host;

        let profile = CapabilityProbe::new(hints, graphics).probe();
        let monitor = PerformanceMonitor::new(config.monitor, &profile, timer_resolution);
        let tracker = VisibilityTracker::create(observers);
        let runtime = EffectRuntime::create(config.runtime, profile, monitor, tracker);

        let telemetry = TelemetryService::new();
        let tick_cost = if config.time_ticks {
            telemetry
                .registry()
                .register_histogram(
                    NAMESPACE,
                    "tick_cost_ms",
                    "Wall time spent inside one engine tick",
                    "ms",
                    FRAME_TIME_BUCKETS_MS.to_vec(),
                )
                .map_err(|e| log::warn!("Tick timing disabled: {}", e))
                .ok()
        } else {
            None
        };

        log::info!("Effect engine created at {} quality.", runtime.quality_tier());
        Ok(Self {
            config,
            runtime,
            telemetry,
            tick_cost,
            clock,
        })
    }

    // --- Registration ---

    /// Registers any effect. It starts `Idle`.
    pub fn register(
        &mut self,
        id: impl Into<EffectId>,
        effect: Box<dyn Effect>,
        target: EffectTarget,
    ) -> Result<EffectHandle, EngineError> {
        Ok(self.runtime.register(id, effect, target)?)
    }

    /// Registers a particle field over `bounds`, sized for the current tier
    /// and reporting its gauges into the engine telemetry.
    pub fn particle_field(
        &mut self,
        id: impl Into<EffectId>,
        bounds: Rect,
        target: EffectTarget,
    ) -> Result<EffectHandle, EngineError> {
        let id = id.into();
        let effect = ParticleFieldEffect::new(self.config.particle.clone(), bounds)?;
        let handle = self.register(id.clone(), Box::new(effect), target)?;
        // Gauges live exactly as long as the registered effect.
        if let Some(field) = self.runtime.effect_mut::<ParticleFieldEffect>(&id) {
            field.attach_telemetry(self.telemetry.registry(), id.as_str());
        }
        Ok(handle)
    }

    /// Registers a cursor follower. Followers are bound to the whole page.
    pub fn cursor_follower(&mut self, id: impl Into<EffectId>) -> Result<EffectHandle, EngineError> {
        let effect = CursorFollowerEffect::new(self.config.follower.clone())?;
        self.register(id, Box::new(effect), EffectTarget::Detached)
    }

    /// Registers a scroll parallax driven by the visibility of `element`.
    pub fn parallax(
        &mut self,
        id: impl Into<EffectId>,
        element: ElementId,
        options: ObserverOptions,
    ) -> Result<EffectHandle, EngineError> {
        let effect = ParallaxEffect::new(self.config.parallax.clone(), &self.config.parallax_depths)?;
        self.register(id, Box::new(effect), EffectTarget::Element { element, options })
    }

    // --- Lifecycle ---

    /// Starts or resumes an effect.
    pub fn play(&mut self, id: &EffectId) -> Result<(), EngineError> {
        Ok(self.runtime.play(id)?)
    }

    /// Pauses an effect, keeping its state.
    pub fn pause(&mut self, id: &EffectId) -> Result<(), EngineError> {
        Ok(self.runtime.pause(id)?)
    }

    /// Stops an effect and releases its visibility subscription.
    pub fn stop(&mut self, id: &EffectId) -> Result<(), EngineError> {
        Ok(self.runtime.stop(id)?)
    }

    /// Removes one effect. Returns `false` if it was not registered.
    pub fn dispose_effect(&mut self, id: &EffectId) -> bool {
        self.runtime.dispose_effect(id)
    }

    // --- Frame loop ---

    /// Runs one frame at a host-supplied timestamp.
    pub fn tick(&mut self, timestamp_ms: f64) -> TickReport {
        let report = {
            let _timer = self.tick_cost.as_ref().map(ScopedMetricTimer::new);
            self.runtime.tick(timestamp_ms)
        };
        if !self.runtime.is_disposed() {
            self.telemetry.record(&report);
        }
        if let Some((from, to)) = report.quality_changed {
            log::debug!("Frame {}: quality {} -> {}.", report.frame_index, from, to);
        }
        report
    }

    /// Runs one frame stamped by the engine clock.
    pub fn tick_now(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        self.tick(now)
    }

    // --- Input ---

    /// Queues a pointer move, applied at the next tick.
    pub fn pointer_moved(&self, x: f32, y: f32, timestamp_ms: f64) {
        self.runtime.pointer_moved(x, y, timestamp_ms);
    }

    /// Queues a pointer-leave, applied at the next tick.
    pub fn pointer_left(&self) {
        self.runtime.pointer_left();
    }

    /// A sender for input produced on other threads.
    pub fn inbox(&self) -> flume::Sender<RuntimeCommand> {
        self.runtime.inbox()
    }

    // --- Quality ---

    /// Forces the tier, or returns to automatic control with `None`.
    pub fn set_quality_override(&mut self, tier: Option<QualityTier>) -> QualityTier {
        self.runtime.set_quality_override(tier)
    }

    /// Calls `listener` with `(previous, current)` on every tier change.
    pub fn add_quality_listener(&mut self, listener: QualityListener) -> ListenerId {
        self.runtime.monitor_mut().add_listener(listener)
    }

    /// Removes a quality listener.
    pub fn remove_quality_listener(&mut self, id: ListenerId) -> bool {
        self.runtime.monitor_mut().remove_listener(id)
    }

    // --- Visibility ---

    /// Subscribes to the visibility of an element outside any effect.
    pub fn subscribe(
        &mut self,
        element: ElementId,
        options: &ObserverOptions,
        callback: Option<VisibilityCallback>,
    ) -> Subscription {
        self.runtime.tracker_mut().subscribe(element, options, callback)
    }

    /// Ends a subscription immediately.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.runtime.tracker_mut().unsubscribe(id)
    }

    /// Last record of a subscription.
    pub fn visibility_record(&self, id: SubscriptionId) -> Option<VisibilityRecord> {
        self.runtime.tracker().record(id)
    }

    // --- Queries ---

    /// Effective quality tier.
    pub fn quality_tier(&self) -> QualityTier {
        self.runtime.quality_tier()
    }

    /// The device profile measured at creation.
    pub fn capability_profile(&self) -> &CapabilityProfile {
        self.runtime.capability_profile()
    }

    /// Current frame budget.
    pub fn metrics(&self) -> FrameMetrics {
        self.runtime.metrics()
    }

    /// Lifecycle state of an effect.
    pub fn state(&self, id: &EffectId) -> Option<EffectState> {
        self.runtime.state(id)
    }

    /// Visibility of an effect's element.
    pub fn visibility(&self, id: &EffectId) -> Option<VisibilityRecord> {
        self.runtime.visibility(id)
    }

    /// Typed read access to a registered effect.
    pub fn effect<T: Effect + 'static>(&self, id: &EffectId) -> Option<&T> {
        self.runtime.effect::<T>(id)
    }

    /// Typed write access to a registered effect.
    pub fn effect_mut<T: Effect + 'static>(&mut self, id: &EffectId) -> Option<&mut T> {
        self.runtime.effect_mut::<T>(id)
    }

    /// The telemetry service fed by every tick.
    pub fn telemetry(&self) -> &TelemetryService {
        &self.telemetry
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &EffectRuntime {
        &self.runtime
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether [`dispose`](Self::dispose) ran.
    pub fn is_disposed(&self) -> bool {
        self.runtime.is_disposed()
    }

    /// Stops every effect, releases every subscription and observer.
    /// Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.runtime.is_disposed() {
            return;
        }
        self.runtime.dispose();
        log::info!(
            "Effect engine disposed after {} recorded frame(s).",
            self.telemetry.frames()
        );
    }
}

impl Drop for EffectEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for EffectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectEngine")
            .field("quality", &self.runtime.quality_tier())
            .field("effects", &self.runtime.registry().len())
            .field("disposed", &self.runtime.is_disposed())
            .finish_non_exhaustive()
    }
}
