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

//! Discrete rendering-intensity levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering-intensity level governing population caps and feature toggles.
///
/// The variant order is meaningful: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Minimum work: small populations, sparse connection graphs.
    Low,
    /// Balanced default.
    #[default]
    Medium,
    /// Full intensity.
    High,
}

impl QualityTier {
    /// All tiers, lowest first.
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    /// The next tier up, saturating at `High`.
    pub fn step_up(self) -> Self {
        match self {
            QualityTier::Low => QualityTier::Medium,
            QualityTier::Medium | QualityTier::High => QualityTier::High,
        }
    }

    /// The next tier down, saturating at `Low`.
    pub fn step_down(self) -> Self {
        match self {
            QualityTier::High => QualityTier::Medium,
            QualityTier::Medium | QualityTier::Low => QualityTier::Low,
        }
    }

    /// Lowercase name, as used in configuration files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality tier '{0}'")]
pub struct ParseTierError(pub String);

impl FromStr for QualityTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityTier::Low),
            "medium" | "mid" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}

/// One value per quality tier.
///
/// Used throughout the configuration surface for anything that scales with
/// quality (population caps, connection budgets, follower counts...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    /// Value used at [`QualityTier::Low`].
    pub low: T,
    /// Value used at [`QualityTier::Medium`].
    pub medium: T,
    /// Value used at [`QualityTier::High`].
    pub high: T,
}

impl<T> TierTable<T> {
    /// Creates a table from its three values.
    pub const fn new(low: T, medium: T, high: T) -> Self {
        Self { low, medium, high }
    }

    /// Returns the value for `tier`.
    pub fn get(&self, tier: QualityTier) -> &T {
        match tier {
            QualityTier::Low => &self.low,
            QualityTier::Medium => &self.medium,
            QualityTier::High => &self.high,
        }
    }
}

impl<T: Copy> TierTable<T> {
    /// Returns a copy of the value for `tier`.
    pub fn at(&self, tier: QualityTier) -> T {
        *self.get(tier)
    }
}
