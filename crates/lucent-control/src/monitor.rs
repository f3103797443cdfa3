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

//! The performance monitor.
//!
//! Frame timestamps are fed once per frame through [`PerformanceMonitor::sample`].
//! Every `window_ms` the frames of the window are averaged and classified;
//! the automatic tier only moves after `downgrade_windows` (or the larger
//! `upgrade_windows`) consecutive windows agree.

use lucent_core::{CapabilityProfile, QualityTier, RingBuffer};
use serde::{Deserialize, Serialize};

use crate::analysis::{TierThresholds, WindowAnalyzer, WindowReport, WindowVerdict};

/// Frame deltas kept for the rolling frame-time average.
pub const FRAME_HISTORY: usize = 120;

/// Tuning of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Length of one measurement window.
    pub window_ms: f64,
    /// Consecutive degrading windows needed to step down.
    pub downgrade_windows: u32,
    /// Consecutive recovering windows needed to step up.
    pub upgrade_windows: u32,
    /// Clocks coarser than this freeze the tier.
    pub max_timer_resolution_ms: f64,
    /// Frame-rate boundaries.
    pub thresholds: TierThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000.0,
            downgrade_windows: 2,
            upgrade_windows: 4,
            max_timer_resolution_ms: 5.0,
            thresholds: TierThresholds::default(),
        }
    }
}

/// Snapshot of the frame budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Frames per second derived from the rolling frame time.
    pub fps: f32,
    /// Rolling average frame time.
    pub frame_time_ms: f32,
    /// Effective quality tier.
    pub quality_tier: QualityTier,
}

/// Automatic quality state owned by the monitor.
#[derive(Debug, Clone)]
pub struct QualityState {
    /// Current automatic tier.
    pub tier: QualityTier,
    /// Rolling frame deltas in milliseconds.
    pub frame_times: RingBuffer<f32, FRAME_HISTORY>,
    /// Timestamp of the last automatic transition.
    pub last_transition_ms: Option<f64>,
    /// Consecutive degrading windows.
    pub below_windows: u32,
    /// Consecutive recovering windows.
    pub above_windows: u32,
}

impl QualityState {
    fn new(tier: QualityTier) -> Self {
        Self {
            tier,
            frame_times: RingBuffer::new(),
            last_transition_ms: None,
            below_windows: 0,
            above_windows: 0,
        }
    }

    fn reset_counters(&mut self) {
        self.below_windows = 0;
        self.above_windows = 0;
    }
}

/// Callback invoked with `(previous, current)` on every effective tier change.
pub type QualityListener = Box<dyn FnMut(QualityTier, QualityTier) + Send>;

/// Handle returned by [`PerformanceMonitor::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Frame-budget monitor with hysteretic tier transitions.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    analyzer: WindowAnalyzer,
    state: QualityState,
    ceiling: QualityTier,
    override_tier: Option<QualityTier>,
    frozen: bool,
    last_timestamp_ms: Option<f64>,
    window_start_ms: Option<f64>,
    window_frames: u32,
    last_window: Option<WindowReport>,
    listeners: Vec<(ListenerId, QualityListener)>,
    next_listener: u64,
}

impl PerformanceMonitor {
    /// Creates a monitor seeded from the device profile.
    ///
    /// `timer_resolution_ms` is the granularity of the clock that will feed
    /// [`sample`](Self::sample). An unknown or too coarse clock freezes the
    /// tier at `min(initial, Medium)`.
    pub fn new(
        config: MonitorConfig,
        profile: &CapabilityProfile,
        timer_resolution_ms: Option<f64>,
    ) -> Self {
        let initial = profile.performance_tier;
        let clock_ok = matches!(
            timer_resolution_ms,
            Some(r) if r.is_finite() && r >= 0.0 && r <= config.max_timer_resolution_ms
        );

        let mut monitor = Self {
            config,
            analyzer: WindowAnalyzer::new(config.thresholds),
            state: QualityState::new(initial),
            ceiling: initial.step_up(),
            override_tier: None,
            frozen: false,
            last_timestamp_ms: None,
            window_start_ms: None,
            window_frames: 0,
            last_window: None,
            listeners: Vec::new(),
            next_listener: 0,
        };

        if !clock_ok {
            log::warn!(
                "Timer resolution {timer_resolution_ms:?} ms is unusable; quality adaptation disabled."
            );
            monitor.freeze();
        }
        log::info!(
            "Performance monitor started at {} (ceiling {}, frozen: {}).",
            monitor.state.tier,
            monitor.ceiling,
            monitor.frozen
        );
        monitor
    }

    /// Records one frame and returns the effective tier.
    ///
    /// Listeners run synchronously before this returns when the effective
    /// tier changes.
    pub fn sample(&mut self, timestamp_ms: f64) -> QualityTier {
        if !timestamp_ms.is_finite() {
            if !self.frozen {
                log::warn!("Non-finite frame timestamp; quality adaptation disabled.");
                self.freeze();
            }
            return self.quality_tier();
        }

        let Some(last) = self.last_timestamp_ms else {
            self.last_timestamp_ms = Some(timestamp_ms);
            self.window_start_ms = Some(timestamp_ms);
            return self.quality_tier();
        };
        if timestamp_ms <= last {
            log::trace!("Ignoring non-monotonic frame timestamp {timestamp_ms} <= {last}.");
            return self.quality_tier();
        }

        let delta = timestamp_ms - last;
        self.last_timestamp_ms = Some(timestamp_ms);
        self.state.frame_times.push(delta as f32);

        if delta > self.config.window_ms {
            // Host was suspended; this stretch says nothing about rendering cost.
            log::debug!("Frame gap of {delta:.0} ms; restarting measurement window.");
            self.window_start_ms = Some(timestamp_ms);
            self.window_frames = 0;
            return self.quality_tier();
        }

        self.window_frames += 1;
        let start = *self.window_start_ms.get_or_insert(last);
        let elapsed = timestamp_ms - start;
        if elapsed >= self.config.window_ms {
            let average_fps = (self.window_frames as f64 * 1000.0 / elapsed) as f32;
            let verdict = self.analyzer.classify(self.state.tier, average_fps, self.ceiling);
            let report = WindowReport {
                frames: self.window_frames,
                average_fps,
                verdict,
            };
            self.window_start_ms = Some(timestamp_ms);
            self.window_frames = 0;
            self.last_window = Some(report);
            log::trace!("Window closed: {average_fps:.1} fps -> {verdict:?}.");

            if !self.frozen {
                self.apply_verdict(verdict, timestamp_ms);
            }
        }

        self.quality_tier()
    }

    /// Forces the effective tier, or returns to the automatic one with `None`.
    ///
    /// Overrides bypass the automatic ceiling and apply even when frozen.
    pub fn set_override(&mut self, tier: Option<QualityTier>) -> QualityTier {
        let previous = self.quality_tier();
        self.override_tier = tier;
        let current = self.quality_tier();
        match tier {
            Some(t) => log::info!("Quality override set to {t}."),
            None => log::info!("Quality override cleared; automatic tier is {}.", self.state.tier),
        }
        if previous != current {
            self.notify(previous, current);
        }
        current
    }

    /// Registers a tier-change listener.
    pub fn add_listener(&mut self, listener: QualityListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Effective tier: the override if set, the automatic tier otherwise.
    pub fn quality_tier(&self) -> QualityTier {
        self.override_tier.unwrap_or(self.state.tier)
    }

    /// Current frame budget snapshot.
    pub fn metrics(&self) -> FrameMetrics {
        let frame_time_ms = self.state.frame_times.average();
        let fps = if frame_time_ms > 0.0 {
            1000.0 / frame_time_ms
        } else {
            0.0
        };
        FrameMetrics {
            fps,
            frame_time_ms,
            quality_tier: self.quality_tier(),
        }
    }

    /// The automatic tier, ignoring any override.
    pub fn automatic_tier(&self) -> QualityTier {
        self.state.tier
    }

    /// The highest tier automatic recovery may reach.
    pub fn ceiling(&self) -> QualityTier {
        self.ceiling
    }

    /// The active override, if any.
    pub fn override_tier(&self) -> Option<QualityTier> {
        self.override_tier
    }

    /// `true` once automatic transitions are disabled.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The most recently closed window.
    pub fn last_window(&self) -> Option<&WindowReport> {
        self.last_window.as_ref()
    }

    /// The full automatic state.
    pub fn state(&self) -> &QualityState {
        &self.state
    }

    fn apply_verdict(&mut self, verdict: WindowVerdict, timestamp_ms: f64) {
        match verdict {
            WindowVerdict::Degrade => {
                self.state.above_windows = 0;
                self.state.below_windows += 1;
                if self.state.below_windows >= self.config.downgrade_windows {
                    self.transition(self.state.tier.step_down(), timestamp_ms);
                }
            }
            WindowVerdict::Recover => {
                self.state.below_windows = 0;
                self.state.above_windows += 1;
                if self.state.above_windows >= self.config.upgrade_windows {
                    let target = self.state.tier.step_up().min(self.ceiling);
                    self.transition(target, timestamp_ms);
                }
            }
            WindowVerdict::Neutral => self.state.reset_counters(),
        }
    }

    fn transition(&mut self, tier: QualityTier, timestamp_ms: f64) {
        self.state.reset_counters();
        if tier == self.state.tier {
            return;
        }
        let previous = self.quality_tier();
        log::info!("Quality tier {} -> {tier} at {timestamp_ms:.0} ms.", self.state.tier);
        self.state.tier = tier;
        self.state.last_transition_ms = Some(timestamp_ms);

        let current = self.quality_tier();
        if previous != current {
            self.notify(previous, current);
        }
    }

    fn freeze(&mut self) {
        self.frozen = true;
        self.state.reset_counters();
        let frozen_tier = self.state.tier.min(QualityTier::Medium);
        if frozen_tier != self.state.tier {
            let previous = self.quality_tier();
            self.state.tier = frozen_tier;
            let current = self.quality_tier();
            if previous != current {
                self.notify(previous, current);
            }
        }
    }

    fn notify(&mut self, previous: QualityTier, current: QualityTier) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(previous, current);
        }
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("tier", &self.state.tier)
            .field("override", &self.override_tier)
            .field("ceiling", &self.ceiling)
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    fn monitor_at(tier: QualityTier) -> PerformanceMonitor {
        let profile = CapabilityProfile::with_tier(tier);
        let mut m = PerformanceMonitor::new(MonitorConfig::default(), &profile, Some(0.1));
        m.sample(0.0);
        m
    }

    /// Feeds one full window at `fps` starting at `*t`.
    fn feed_window(m: &mut PerformanceMonitor, t: &mut f64, fps: u32) -> QualityTier {
        let start = *t;
        let mut tier = m.quality_tier();
        for k in 1..=fps {
            tier = m.sample(start + 1000.0 * k as f64 / fps as f64);
        }
        *t = start + 1000.0;
        tier
    }

    #[test]
    fn test_single_bad_window_does_not_degrade() {
        let mut m = monitor_at(QualityTier::High);
        let mut t = 0.0;
        for fps in [50, 50, 40, 50, 50] {
            feed_window(&mut m, &mut t, fps);
        }
        assert_eq!(m.quality_tier(), QualityTier::High);
    }

    #[test]
    fn test_two_bad_windows_degrade_once() {
        let mut m = monitor_at(QualityTier::High);
        let mut t = 0.0;
        feed_window(&mut m, &mut t, 40);
        assert_eq!(m.quality_tier(), QualityTier::High);
        assert_eq!(feed_window(&mut m, &mut t, 40), QualityTier::Medium);
        // Counters reset after the transition: one more bad window is not enough.
        feed_window(&mut m, &mut t, 20);
        assert_eq!(m.quality_tier(), QualityTier::Medium);
        feed_window(&mut m, &mut t, 20);
        assert_eq!(m.quality_tier(), QualityTier::Low);
    }

    #[test]
    fn test_upgrade_needs_more_windows_than_downgrade() {
        let mut m = monitor_at(QualityTier::High);
        let mut t = 0.0;
        feed_window(&mut m, &mut t, 40);
        feed_window(&mut m, &mut t, 40);
        assert_eq!(m.quality_tier(), QualityTier::Medium);

        for _ in 0..3 {
            feed_window(&mut m, &mut t, 60);
            assert_eq!(m.quality_tier(), QualityTier::Medium);
        }
        feed_window(&mut m, &mut t, 60);
        assert_eq!(m.quality_tier(), QualityTier::High);
    }

    #[test]
    fn test_low_profile_never_auto_upgrades_past_medium() {
        let mut m = monitor_at(QualityTier::Low);
        assert_eq!(m.ceiling(), QualityTier::Medium);
        let mut t = 0.0;
        for _ in 0..20 {
            feed_window(&mut m, &mut t, 60);
        }
        assert_eq!(m.quality_tier(), QualityTier::Medium);

        m.set_override(Some(QualityTier::High));
        assert_eq!(m.quality_tier(), QualityTier::High);
        m.set_override(None);
        assert_eq!(m.quality_tier(), QualityTier::Medium);
    }

    #[test]
    fn test_coarse_timer_freezes_at_medium() {
        let profile = CapabilityProfile::with_tier(QualityTier::High);
        let mut m = PerformanceMonitor::new(MonitorConfig::default(), &profile, Some(16.0));
        assert!(m.is_frozen());
        assert_eq!(m.quality_tier(), QualityTier::Medium);

        let mut t = 0.0;
        m.sample(t);
        for _ in 0..5 {
            feed_window(&mut m, &mut t, 10);
        }
        assert_eq!(m.quality_tier(), QualityTier::Medium);

        m.set_override(Some(QualityTier::Low));
        assert_eq!(m.quality_tier(), QualityTier::Low);
    }

    #[test]
    fn test_unknown_timer_keeps_low_profile_low() {
        let profile = CapabilityProfile::with_tier(QualityTier::Low);
        let m = PerformanceMonitor::new(MonitorConfig::default(), &profile, None);
        assert!(m.is_frozen());
        assert_eq!(m.quality_tier(), QualityTier::Low);
    }

    #[test]
    fn test_non_finite_timestamp_freezes() {
        let mut m = monitor_at(QualityTier::High);
        m.sample(f64::NAN);
        assert!(m.is_frozen());
        assert_eq!(m.quality_tier(), QualityTier::Medium);
    }

    #[test]
    fn test_non_monotonic_timestamps_are_ignored() {
        let mut m = monitor_at(QualityTier::High);
        m.sample(16.0);
        m.sample(10.0);
        m.sample(16.0);
        assert_eq!(m.state().frame_times.count(), 1);
    }

    #[test]
    fn test_listeners_run_on_change() {
        let mut m = monitor_at(QualityTier::High);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = m.add_listener(Box::new(move |prev, cur| sink.lock().unwrap().push((prev, cur))));

        let mut t = 0.0;
        feed_window(&mut m, &mut t, 40);
        feed_window(&mut m, &mut t, 40);
        m.set_override(Some(QualityTier::Medium)); // no change, no call
        m.set_override(Some(QualityTier::Low));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (QualityTier::High, QualityTier::Medium),
                (QualityTier::Medium, QualityTier::Low),
            ]
        );
        assert!(m.remove_listener(id));
        assert!(!m.remove_listener(id));
    }

    #[test]
    fn test_long_gap_restarts_window() {
        let mut m = monitor_at(QualityTier::High);
        m.sample(5000.0);
        m.sample(5016.0);
        assert!(m.last_window().is_none());
        assert_eq!(m.quality_tier(), QualityTier::High);
    }

    #[test]
    fn test_metrics_from_frame_times() {
        let mut m = monitor_at(QualityTier::Medium);
        for i in 1..=10 {
            m.sample(i as f64 * 20.0);
        }
        let metrics = m.metrics();
        assert_relative_eq!(metrics.frame_time_ms, 20.0, epsilon = 1e-3);
        assert_relative_eq!(metrics.fps, 50.0, epsilon = 1e-2);
        assert_eq!(metrics.quality_tier, QualityTier::Medium);
    }
}
