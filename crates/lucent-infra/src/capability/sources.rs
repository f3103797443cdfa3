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

//! Host hint sources and fixed graphics answers.

use std::sync::Mutex;

use lucent_core::platform::{GraphicsProbe, HintSource, ProbeError};
use lucent_core::{HostHints, NetworkHint};
use sysinfo::System;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Reads core count and installed memory from the operating system.
///
/// Native hosts have no notion of pointer precision or effective network
/// type, so those come from the builder methods and default to a desktop
/// with a mouse and an unknown network.
pub struct SysinfoHintSource {
    system: Mutex<System>,
    network: Option<NetworkHint>,
    fine_pointer: bool,
    touch_primary: bool,
}

impl SysinfoHintSource {
    /// Creates a source for a desktop host.
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            network: None,
            fine_pointer: true,
            touch_primary: false,
        }
    }

    /// Reports a network hint.
    pub fn with_network(mut self, hint: NetworkHint) -> Self {
        self.network = Some(hint);
        self
    }

    /// Overrides the input flags.
    pub fn with_pointer(mut self, fine_pointer: bool, touch_primary: bool) -> Self {
        self.fine_pointer = fine_pointer;
        self.touch_primary = touch_primary;
        self
    }

    fn memory_gib(&self) -> Option<f32> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        let total = system.total_memory();
        (total > 0).then(|| (total as f64 / BYTES_PER_GIB) as f32)
    }
}

impl Default for SysinfoHintSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HintSource for SysinfoHintSource {
    fn hints(&self) -> Result<HostHints, ProbeError> {
        let hardware_concurrency = std::thread::available_parallelism()
            .ok()
            .map(|n| n.get());
        let device_memory_gib = self.memory_gib();
        if hardware_concurrency.is_none() && device_memory_gib.is_none() {
            return Err(ProbeError::Unavailable(
                "neither core count nor memory size is exposed".into(),
            ));
        }
        log::debug!(
            "Host hints: cores={:?}, memory={:?} GiB.",
            hardware_concurrency,
            device_memory_gib
        );
        Ok(HostHints {
            hardware_concurrency,
            device_memory_gib,
            network: self.network.clone(),
            fine_pointer: self.fine_pointer,
            touch_primary: self.touch_primary,
        })
    }
}

/// Hands out fixed hints.
#[derive(Debug, Clone)]
pub struct StaticHintSource(HostHints);

impl StaticHintSource {
    /// Wraps `hints`.
    pub fn new(hints: HostHints) -> Self {
        Self(hints)
    }
}

impl HintSource for StaticHintSource {
    fn hints(&self) -> Result<HostHints, ProbeError> {
        Ok(self.0.clone())
    }
}

/// Answers the acceleration probe with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedGraphicsProbe(pub bool);

impl GraphicsProbe for FixedGraphicsProbe {
    fn probe_acceleration(&self) -> Result<bool, ProbeError> {
        Ok(self.0)
    }
}
