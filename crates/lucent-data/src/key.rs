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

//! Canonical observer options.

use std::fmt;

use lucent_core::math::RootMargin;
use lucent_core::ObserverOptions;

/// Threshold quantization step: thresholds are stored in thousandths.
const THRESHOLD_SCALE: f32 = 1000.0;

/// Normalized form of [`ObserverOptions`], used as the observer pool key.
///
/// - margins are rounded to whole pixels,
/// - thresholds are clamped to `[0, 1]`, quantized to 1/1000, sorted and
///   deduplicated; an empty list becomes `[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverKey {
    margin: [i32; 4],
    thresholds: Vec<u16>,
}

impl ObserverKey {
    /// Normalizes an option set.
    pub fn from_options(options: &ObserverOptions) -> Self {
        let m = &options.root_margin;
        let margin = [m.top, m.right, m.bottom, m.left].map(round_px);

        let mut thresholds: Vec<u16> = options
            .thresholds
            .iter()
            .filter(|t| t.is_finite())
            .map(|t| (t.clamp(0.0, 1.0) * THRESHOLD_SCALE).round() as u16)
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        if thresholds.is_empty() {
            thresholds.push(0);
        }

        Self { margin, thresholds }
    }

    /// The canonical root margin.
    pub fn root_margin(&self) -> RootMargin {
        let [top, right, bottom, left] = self.margin.map(|v| v as f32);
        RootMargin {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The canonical thresholds, ascending.
    pub fn thresholds(&self) -> impl Iterator<Item = f32> + '_ {
        self.thresholds.iter().map(|&t| t as f32 / THRESHOLD_SCALE)
    }

    /// Canonical options handed to the platform backend.
    pub fn to_options(&self) -> ObserverOptions {
        ObserverOptions {
            root_margin: self.root_margin(),
            thresholds: self.thresholds().collect(),
        }
    }
}

impl From<&ObserverOptions> for ObserverKey {
    fn from(options: &ObserverOptions) -> Self {
        Self::from_options(options)
    }
}

impl fmt::Display for ObserverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [t, r, b, l] = self.margin;
        write!(f, "margin({t}px {r}px {b}px {l}px) thresholds[")?;
        for (i, th) in self.thresholds.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", *th as f32 / THRESHOLD_SCALE)?;
        }
        f.write_str("]")
    }
}

fn round_px(value: f32) -> i32 {
    if value.is_finite() {
        value.round() as i32
    } else {
        0
    }
}
