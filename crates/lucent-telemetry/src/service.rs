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

//! Per-frame telemetry for the effect runtime.

use lucent_control::TickReport;
use lucent_core::telemetry::MetricsResult;
use lucent_core::QualityTier;
use serde::Serialize;

use crate::metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};

/// Namespace of every runtime metric.
pub const NAMESPACE: &str = "lucent";

/// Bucket bounds of the frame-time histogram, in milliseconds.
pub const FRAME_TIME_BUCKETS_MS: [f64; 6] = [8.3, 16.7, 22.2, 33.3, 50.0, 100.0];

struct RuntimeMetrics {
    fps: GaugeHandle,
    frame_time_ms: GaugeHandle,
    effects_advanced: CounterHandle,
    effects_skipped: CounterHandle,
    effect_failures: CounterHandle,
    quality_changes: CounterHandle,
    frame_time_hist: HistogramHandle,
}

impl RuntimeMetrics {
    fn register(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            fps: registry.register_gauge(NAMESPACE, "fps", "Measured frames per second", "fps")?,
            frame_time_ms: registry.register_gauge(
                NAMESPACE,
                "frame_time_ms",
                "Rolling average frame time",
                "ms",
            )?,
            effects_advanced: registry.register_counter(
                NAMESPACE,
                "effects_advanced",
                "Effect advances performed",
            )?,
            effects_skipped: registry.register_counter(
                NAMESPACE,
                "effects_skipped",
                "Playing effects skipped while hidden",
            )?,
            effect_failures: registry.register_counter(
                NAMESPACE,
                "effect_failures",
                "Effects stopped after a failure",
            )?,
            quality_changes: registry.register_counter(
                NAMESPACE,
                "quality_changes",
                "Effective quality tier transitions",
            )?,
            frame_time_hist: registry.register_histogram(
                NAMESPACE,
                "frame_time_hist",
                "Distribution of per-tick timesteps",
                "ms",
                FRAME_TIME_BUCKETS_MS.to_vec(),
            )?,
        })
    }
}

/// Point-in-time summary, serializable for debug overlays and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Ticks recorded.
    pub frames: u64,
    /// Last measured frames per second.
    pub fps: f64,
    /// Last rolling frame time.
    pub frame_time_ms: f64,
    /// Effective tier of the last recorded tick.
    pub quality: QualityTier,
    /// Total effect advances.
    pub effects_advanced: u64,
    /// Total hidden skips.
    pub effects_skipped: u64,
    /// Total effect failures.
    pub effect_failures: u64,
    /// Total tier transitions.
    pub quality_changes: u64,
    /// Mean timestep, if any tick was recorded.
    pub mean_dt_ms: Option<f64>,
}

/// Records the runtime's standard metrics.
pub struct TelemetryService {
    registry: MetricsRegistry,
    metrics: Option<RuntimeMetrics>,
    frames: u64,
    quality: QualityTier,
}

impl std::fmt::Debug for TelemetryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryService")
            .field("registry", &self.registry)
            .field("frames", &self.frames)
            .field("quality", &self.quality)
            .finish()
    }
}

impl TelemetryService {
    /// Registers the `lucent:*` metrics in a fresh in-memory registry.
    pub fn new() -> Self {
        Self::with_registry(MetricsRegistry::new())
    }

    /// Registers the `lucent:*` metrics in `registry`.
    ///
    /// A registration failure leaves the service recording nothing; it is
    /// logged and otherwise ignored.
    pub fn with_registry(registry: MetricsRegistry) -> Self {
        let metrics = match RuntimeMetrics::register(&registry) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                log::warn!("Telemetry disabled, metric registration failed: {}", e);
                None
            }
        };
        Self {
            registry,
            metrics,
            frames: 0,
            quality: QualityTier::default(),
        }
    }

    /// Records one tick.
    pub fn record(&mut self, report: &TickReport) {
        self.frames += 1;
        self.quality = report.quality;
        let Some(metrics) = &self.metrics else {
            return;
        };
        if let Err(e) = Self::write(metrics, report) {
            log::warn!("Failed to record tick {}: {}", report.frame_index, e);
        }
    }

    fn write(metrics: &RuntimeMetrics, report: &TickReport) -> MetricsResult<()> {
        metrics.fps.set(f64::from(report.fps))?;
        metrics.frame_time_ms.set(f64::from(report.frame_time_ms))?;
        metrics.effects_advanced.increment_by(report.advanced as u64)?;
        metrics.effects_skipped.increment_by(report.skipped as u64)?;
        metrics.effect_failures.increment_by(report.failures as u64)?;
        if report.quality_changed.is_some() {
            metrics.quality_changes.increment()?;
        }
        metrics.frame_time_hist.observe(f64::from(report.dt) * 1000.0)?;
        Ok(())
    }

    /// Current values of every runtime metric.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snapshot = TelemetrySnapshot {
            frames: self.frames,
            fps: 0.0,
            frame_time_ms: 0.0,
            quality: self.quality,
            effects_advanced: 0,
            effects_skipped: 0,
            effect_failures: 0,
            quality_changes: 0,
            mean_dt_ms: None,
        };
        if let Some(m) = &self.metrics {
            snapshot.fps = m.fps.get().unwrap_or(0.0);
            snapshot.frame_time_ms = m.frame_time_ms.get().unwrap_or(0.0);
            snapshot.effects_advanced = m.effects_advanced.get().unwrap_or(0);
            snapshot.effects_skipped = m.effects_skipped.get().unwrap_or(0);
            snapshot.effect_failures = m.effect_failures.get().unwrap_or(0);
            snapshot.quality_changes = m.quality_changes.get().unwrap_or(0);
            snapshot.mean_dt_ms = m.frame_time_hist.mean().ok().flatten();
        }
        snapshot
    }

    /// The snapshot as a JSON string.
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    /// Number of ticks recorded.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The registry, for registering effect-specific metrics next to the
    /// runtime ones.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new()
    }
}
