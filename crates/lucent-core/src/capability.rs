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

//! The static device capability profile.
//!
//! Raw [`HostHints`] are gathered once at startup by a platform
//! [`HintSource`](crate::platform::HintSource) and folded into an immutable
//! [`CapabilityProfile`]. The profile seeds the initial quality tier and the
//! initial particle population; it is never recomputed mid-session.

use serde::{Deserialize, Serialize};

use crate::quality::QualityTier;

/// Coarse classification of installed memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTier {
    /// Less than 4 GiB.
    Low,
    /// 4 to 8 GiB, or unknown.
    Mid,
    /// 8 GiB or more.
    High,
}

impl MemoryTier {
    /// Classifies a memory hint given in GiB. Unknown memory is `Mid`.
    pub fn from_gib(gib: Option<f32>) -> Self {
        match gib {
            Some(g) if g.is_finite() && g < 4.0 => MemoryTier::Low,
            Some(g) if g.is_finite() && g < 8.0 => MemoryTier::Mid,
            Some(g) if g.is_finite() => MemoryTier::High,
            _ => MemoryTier::Mid,
        }
    }
}

/// Coarse classification of the network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTier {
    /// 2G-class links or data-saver mode.
    Slow,
    /// 3G-class links, or unknown.
    Moderate,
    /// 4G-class and better.
    Fast,
}

impl NetworkTier {
    /// Classifies an optional network hint. Unknown networks are `Moderate`.
    pub fn from_hint(hint: Option<&NetworkHint>) -> Self {
        let Some(hint) = hint else {
            return NetworkTier::Moderate;
        };
        if hint.save_data {
            return NetworkTier::Slow;
        }
        match hint.effective_type.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "2g" => NetworkTier::Slow,
            "3g" => NetworkTier::Moderate,
            _ => NetworkTier::Fast,
        }
    }
}

/// Network information reported by the host, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHint {
    /// Effective connection type (`"slow-2g"`, `"2g"`, `"3g"`, `"4g"`).
    pub effective_type: String,
    /// The user asked for reduced data usage.
    #[serde(default)]
    pub save_data: bool,
}

/// Raw, unclassified device hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHints {
    /// Logical core count, if exposed.
    pub hardware_concurrency: Option<usize>,
    /// Installed memory in GiB, if exposed.
    pub device_memory_gib: Option<f32>,
    /// Network hint, if exposed.
    pub network: Option<NetworkHint>,
    /// The primary pointer is precise (mouse, trackpad).
    pub fine_pointer: bool,
    /// The primary input is touch.
    pub touch_primary: bool,
}

impl HostHints {
    /// Substitute used when the host cannot provide hints.
    pub fn conservative() -> Self {
        Self {
            hardware_concurrency: Some(4),
            device_memory_gib: None,
            network: None,
            fine_pointer: true,
            touch_primary: false,
        }
    }
}

impl Default for HostHints {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Immutable capability profile, created once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// Logical core count.
    pub core_count: usize,
    /// Memory classification.
    pub memory_tier: MemoryTier,
    /// Network classification.
    pub network_tier: NetworkTier,
    /// The primary pointer is precise.
    pub fine_pointer: bool,
    /// The primary input is touch.
    pub touch_primary: bool,
    /// Hardware-accelerated graphics are available.
    pub gpu_accelerated: bool,
    /// Tier derived from everything above.
    pub performance_tier: QualityTier,
}

impl CapabilityProfile {
    /// Folds raw hints and the acceleration probe result into a profile.
    pub fn from_hints(hints: &HostHints, gpu_accelerated: bool) -> Self {
        let core_count = hints.hardware_concurrency.filter(|&c| c > 0).unwrap_or(4);
        let memory_tier = MemoryTier::from_gib(hints.device_memory_gib);
        let network_tier = NetworkTier::from_hint(hints.network.as_ref());

        let performance_tier = derive_performance_tier(
            core_count,
            memory_tier,
            network_tier,
            gpu_accelerated,
            hints.touch_primary,
        );

        Self {
            core_count,
            memory_tier,
            network_tier,
            fine_pointer: hints.fine_pointer,
            touch_primary: hints.touch_primary,
            gpu_accelerated,
            performance_tier,
        }
    }

    /// A profile that forces a given tier; handy for embedding hosts that
    /// already know what the device can do.
    pub fn with_tier(tier: QualityTier) -> Self {
        let mut profile = Self::from_hints(&HostHints::conservative(), true);
        profile.performance_tier = tier;
        profile
    }
}

/// Scores the hints and maps the score onto a tier.
///
/// Software rendering and dual-core devices are capped at `Low` whatever
/// the rest of the score says.
fn derive_performance_tier(
    cores: usize,
    memory: MemoryTier,
    network: NetworkTier,
    gpu_accelerated: bool,
    touch_primary: bool,
) -> QualityTier {
    if !gpu_accelerated || cores <= 2 {
        return QualityTier::Low;
    }

    let mut score: i32 = 0;
    score += match cores {
        c if c >= 8 => 2,
        c if c >= 4 => 1,
        _ => 0,
    };
    score += match memory {
        MemoryTier::High => 2,
        MemoryTier::Mid => 1,
        MemoryTier::Low => 0,
    };
    score += match network {
        NetworkTier::Fast => 1,
        NetworkTier::Moderate => 0,
        NetworkTier::Slow => -1,
    };
    score += 1; // acceleration
    if touch_primary {
        score -= 1;
    }

    match score {
        s if s >= 5 => QualityTier::High,
        s if s >= 3 => QualityTier::Medium,
        _ => QualityTier::Low,
    }
}
