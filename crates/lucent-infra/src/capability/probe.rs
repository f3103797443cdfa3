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

//! Folds host hints and the graphics probe into a [`CapabilityProfile`].

use std::panic::{self, AssertUnwindSafe};

use lucent_core::platform::{GraphicsProbe, HintSource};
use lucent_core::{CapabilityProfile, HostHints};

/// Runs once per engine and never fails.
pub struct CapabilityProbe {
    hints: Box<dyn HintSource>,
    graphics: Box<dyn GraphicsProbe>,
}

impl CapabilityProbe {
    /// Creates a probe over the given host sources.
    pub fn new(hints: Box<dyn HintSource>, graphics: Box<dyn GraphicsProbe>) -> Self {
        Self { hints, graphics }
    }

    /// Reads the hints, probes graphics acceleration and derives the profile.
    ///
    /// Hint errors fall back to [`HostHints::conservative`]; a graphics
    /// probe that errors or panics counts as no acceleration.
    pub fn probe(&self) -> CapabilityProfile {
        let hints = match self.hints.hints() {
            Ok(hints) => hints,
            Err(e) => {
                log::warn!("Host hints unavailable ({}); using conservative defaults.", e);
                HostHints::conservative()
            }
        };

        let graphics = &self.graphics;
        let accelerated = match panic::catch_unwind(AssertUnwindSafe(|| graphics.probe_acceleration())) {
            Ok(Ok(accelerated)) => accelerated,
            Ok(Err(e)) => {
                log::warn!("Graphics probe failed ({}); assuming no acceleration.", e);
                false
            }
            Err(_) => {
                log::warn!("Graphics probe panicked; assuming no acceleration.");
                false
            }
        };

        let profile = CapabilityProfile::from_hints(&hints, accelerated);
        log::info!(
            "Capability profile: {} cores, {:?} memory, {:?} network, gpu={}, touch={} -> {} tier.",
            profile.core_count,
            profile.memory_tier,
            profile.network_tier,
            profile.gpu_accelerated,
            profile.touch_primary,
            profile.performance_tier
        );
        profile
    }
}
