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

//! Classification of measurement windows.
//!
//! The monitor closes a window every `window_ms` and asks the
//! [`WindowAnalyzer`] whether its average frame rate argues for a lower tier,
//! a higher tier, or neither. The decision to actually move is left to the
//! monitor's consecutive-window counters.

use lucent_core::QualityTier;
use serde::{Deserialize, Serialize};

/// Below this average, `High` degrades.
const HIGH_FLOOR_FPS: f32 = 45.0;
/// Below this average, `Medium` degrades.
const MEDIUM_FLOOR_FPS: f32 = 30.0;
/// At or above this average, `Low` recovers.
const MEDIUM_RECOVERY_FPS: f32 = 45.0;
/// At or above this average, `Medium` recovers.
const HIGH_RECOVERY_FPS: f32 = 55.0;

/// Frame-rate boundaries between tiers.
///
/// Recovery thresholds sit at or above the matching floors so a device
/// hovering around one boundary does not oscillate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// `High` -> `Medium` below this.
    pub high_floor_fps: f32,
    /// `Medium` -> `Low` below this.
    pub medium_floor_fps: f32,
    /// `Low` -> `Medium` at or above this.
    pub medium_recovery_fps: f32,
    /// `Medium` -> `High` at or above this.
    pub high_recovery_fps: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high_floor_fps: HIGH_FLOOR_FPS,
            medium_floor_fps: MEDIUM_FLOOR_FPS,
            medium_recovery_fps: MEDIUM_RECOVERY_FPS,
            high_recovery_fps: HIGH_RECOVERY_FPS,
        }
    }
}

/// Outcome of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVerdict {
    /// The window was too slow for the current tier.
    Degrade,
    /// The window was fast enough for the next tier up, within the ceiling.
    Recover,
    /// Neither.
    Neutral,
}

/// Summary of a closed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowReport {
    /// Frames counted in the window.
    pub frames: u32,
    /// Average frames per second over the window.
    pub average_fps: f32,
    /// Classification against the tier that was current when it closed.
    pub verdict: WindowVerdict,
}

/// Stateless window classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowAnalyzer {
    thresholds: TierThresholds,
}

impl WindowAnalyzer {
    /// Creates an analyzer with the given boundaries.
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// The boundaries in use.
    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Classifies `average_fps` for a monitor currently at `current`.
    ///
    /// `ceiling` is the highest tier automatic recovery may reach.
    pub fn classify(
        &self,
        current: QualityTier,
        average_fps: f32,
        ceiling: QualityTier,
    ) -> WindowVerdict {
        if !average_fps.is_finite() {
            return WindowVerdict::Neutral;
        }
        let t = &self.thresholds;
        match current {
            QualityTier::High if average_fps < t.high_floor_fps => WindowVerdict::Degrade,
            QualityTier::High => WindowVerdict::Neutral,
            QualityTier::Medium if average_fps < t.medium_floor_fps => WindowVerdict::Degrade,
            QualityTier::Medium
                if average_fps >= t.high_recovery_fps && ceiling > QualityTier::Medium =>
            {
                WindowVerdict::Recover
            }
            QualityTier::Medium => WindowVerdict::Neutral,
            QualityTier::Low
                if average_fps >= t.medium_recovery_fps && ceiling > QualityTier::Low =>
            {
                WindowVerdict::Recover
            }
            QualityTier::Low => WindowVerdict::Neutral,
        }
    }
}
