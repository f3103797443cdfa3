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

use lucent_core::platform::{GraphicsProbe, ProbeError};

/// Requests a throwaway wgpu adapter and reports whether it is hardware.
///
/// The instance and adapter are dropped before `probe_acceleration`
/// returns; no device is created.
#[derive(Debug, Clone, Copy)]
pub struct WgpuGraphicsProbe {
    power_preference: wgpu::PowerPreference,
}

impl WgpuGraphicsProbe {
    /// Probes with the default power preference.
    pub fn new() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::default(),
        }
    }

    /// Prefers a discrete adapter when several are present.
    pub fn high_performance() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl Default for WgpuGraphicsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsProbe for WgpuGraphicsProbe {
    fn probe_acceleration(&self) -> Result<bool, ProbeError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: self.power_preference,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .map_err(|e| ProbeError::Graphics(format!("no suitable adapter: {e}")))?;

        let info = adapter.get_info();
        let accelerated = info.device_type != wgpu::DeviceType::Cpu;
        log::info!(
            "Graphics probe: {} ({:?}, {:?}) accelerated={}.",
            info.name,
            info.backend,
            info.device_type,
            accelerated
        );
        Ok(accelerated)
    }
}
