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

//! Pointer tracking shared by every cursor-driven effect.

use serde::{Deserialize, Serialize};

use crate::math::{ease_factor, Vec2};
use crate::utils::ring_buffer::RingBuffer;

/// Number of timestamped samples kept for delayed lookups.
pub const POINTER_HISTORY: usize = 32;

/// Tuning of the pointer state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Per-frame (60 Hz) easing of the smoothed position toward the raw one.
    pub smoothing: f32,
    /// Weight of a new instantaneous velocity in the blended velocity.
    pub velocity_blend: f32,
    /// Per-frame (60 Hz) velocity decay while the pointer rests.
    pub velocity_decay: f32,
    /// Time without movement after which the pointer counts as inactive.
    pub inactivity_timeout_ms: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.15,
            velocity_blend: 0.3,
            velocity_decay: 0.1,
            inactivity_timeout_ms: 3000.0,
        }
    }
}

/// One raw pointer position and when it was observed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Position in page pixels.
    pub position: Vec2,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
}

/// Current pointer state.
///
/// Mutated by the runtime when it drains pointer messages, decayed once per
/// tick, and read by effects through a shared reference.
#[derive(Debug, Clone)]
pub struct PointerState {
    config: PointerConfig,
    position: Vec2,
    smoothed: Vec2,
    velocity: Vec2,
    history: RingBuffer<PointerSample, POINTER_HISTORY>,
    active: bool,
    last_move_ms: Option<f64>,
}

impl PointerState {
    /// An inactive pointer with no history.
    pub fn new(config: PointerConfig) -> Self {
        Self {
            config,
            position: Vec2::ZERO,
            smoothed: Vec2::ZERO,
            velocity: Vec2::ZERO,
            history: RingBuffer::new(),
            active: false,
            last_move_ms: None,
        }
    }

    /// Records a pointer move. Non-finite input is ignored.
    pub fn record_move(&mut self, position: Vec2, timestamp_ms: f64) {
        if !position.is_finite() || !timestamp_ms.is_finite() {
            log::trace!("Ignoring non-finite pointer sample.");
            return;
        }

        match self.history.latest().copied() {
            Some(prev) if self.active => {
                let dt_ms = timestamp_ms - prev.timestamp_ms;
                if dt_ms > 0.0 {
                    let instant = (position - prev.position) * (1000.0 / dt_ms as f32);
                    self.velocity = Vec2::lerp(self.velocity, instant, self.config.velocity_blend);
                }
            }
            _ => {
                // First contact, or re-entry after leaving: no stale trail.
                self.smoothed = position;
                self.velocity = Vec2::ZERO;
                self.history.clear();
            }
        }

        self.position = position;
        self.history.push(PointerSample {
            position,
            timestamp_ms,
        });
        self.active = true;
        self.last_move_ms = Some(timestamp_ms);
    }

    /// The pointer left the page.
    pub fn leave(&mut self) {
        self.active = false;
        self.velocity = Vec2::ZERO;
    }

    /// Passive per-frame update: eases the smoothed position, decays the
    /// velocity and deactivates the pointer after the inactivity timeout.
    pub fn decay(&mut self, dt: f32, now_ms: f64) {
        self.smoothed = Vec2::lerp(
            self.smoothed,
            self.position,
            ease_factor(self.config.smoothing, dt),
        );
        self.velocity *= 1.0 - ease_factor(self.config.velocity_decay, dt);

        if let Some(last) = self.last_move_ms {
            if self.active && now_ms - last > self.config.inactivity_timeout_ms {
                log::trace!("Pointer inactive after {:.0} ms.", now_ms - last);
                self.leave();
            }
        }
    }

    /// Where the pointer was `delay_ms` before `now_ms`, interpolated
    /// between the two bracketing samples.
    ///
    /// Clamps to the oldest sample when the history does not reach that far
    /// back, and to the newest when the target is in the future.
    pub fn delayed_position(&self, now_ms: f64, delay_ms: f64) -> Option<Vec2> {
        let newest = *self.history.latest()?;
        let target = now_ms - delay_ms.max(0.0);
        if target >= newest.timestamp_ms {
            return Some(newest.position);
        }

        let mut newer = newest;
        for sample in self.history.iter().rev().skip(1) {
            if sample.timestamp_ms <= target {
                let span = newer.timestamp_ms - sample.timestamp_ms;
                if span <= 0.0 {
                    return Some(newer.position);
                }
                let t = ((target - sample.timestamp_ms) / span) as f32;
                return Some(Vec2::lerp(sample.position, newer.position, t));
            }
            newer = *sample;
        }
        Some(newer.position)
    }

    /// Raw position.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Exponentially smoothed position.
    pub fn smoothed_position(&self) -> Vec2 {
        self.smoothed
    }

    /// Blended velocity in px/s.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Speed in px/s.
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// `false` before the first move, after leaving, or after the inactivity timeout.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Recent samples, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &PointerSample> {
        self.history.iter()
    }

    /// The configuration in use.
    pub fn config(&self) -> &PointerConfig {
        &self.config
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}
