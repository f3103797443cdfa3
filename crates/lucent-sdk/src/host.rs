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

//! The host services an engine is built on.

use lucent_core::platform::{FrameClock, GraphicsProbe, HintSource, ObserverBackend};
use lucent_core::HostHints;
use lucent_infra::{FixedGraphicsProbe, InstantClock, StaticHintSource, SysinfoHintSource};

/// Bundles every platform dependency of an [`EffectEngine`](crate::EffectEngine).
pub struct EngineHost {
    pub(crate) hints: Box<dyn HintSource>,
    pub(crate) graphics: Box<dyn GraphicsProbe>,
    pub(crate) observers: Option<Box<dyn ObserverBackend>>,
    pub(crate) clock: Box<dyn FrameClock>,
    pub(crate) timer_resolution_ms: Option<Option<f64>>,
}

impl EngineHost {
    /// Operating-system hints, the wgpu acceleration probe (when the
    /// `graphics` feature is on) and a monotonic clock.
    ///
    /// Native hosts have no page layout, so visibility runs fail-open until
    /// a backend is supplied with [`with_observers`](Self::with_observers).
    pub fn native() -> Self {
        #[cfg(feature = "graphics")]
        let graphics: Box<dyn GraphicsProbe> = Box::new(lucent_infra::WgpuGraphicsProbe::new());
        #[cfg(not(feature = "graphics"))]
        let graphics: Box<dyn GraphicsProbe> = Box::new(FixedGraphicsProbe(false));

        Self {
            hints: Box::new(SysinfoHintSource::new()),
            graphics,
            observers: None,
            clock: Box::new(InstantClock::new()),
            timer_resolution_ms: None,
        }
    }

    /// Fixed hints and a fixed acceleration answer; reproducible across
    /// machines.
    pub fn fixed(hints: HostHints, gpu_accelerated: bool) -> Self {
        Self {
            hints: Box::new(StaticHintSource::new(hints)),
            graphics: Box::new(FixedGraphicsProbe(gpu_accelerated)),
            observers: None,
            clock: Box::new(InstantClock::new()),
            timer_resolution_ms: None,
        }
    }

    /// Replaces the hint source.
    pub fn with_hints(mut self, hints: impl HintSource + 'static) -> Self {
        self.hints = Box::new(hints);
        self
    }

    /// Replaces the graphics probe.
    pub fn with_graphics(mut self, graphics: impl GraphicsProbe + 'static) -> Self {
        self.graphics = Box::new(graphics);
        self
    }

    /// Supplies the viewport-observation backend.
    pub fn with_observers(mut self, observers: impl ObserverBackend + 'static) -> Self {
        self.observers = Some(Box::new(observers));
        self
    }

    /// Replaces the frame clock.
    pub fn with_clock(mut self, clock: impl FrameClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Declares the resolution of the timestamps the host will pass to
    /// [`tick`](crate::EffectEngine::tick), overriding the clock's own.
    ///
    /// `None` means unknown, which disables quality adaptation.
    pub fn with_timer_resolution(mut self, resolution_ms: Option<f64>) -> Self {
        self.timer_resolution_ms = Some(resolution_ms);
        self
    }

    pub(crate) fn timer_resolution(&self) -> Option<f64> {
        match self.timer_resolution_ms {
            Some(declared) => declared,
            None => self.clock.resolution_ms(),
        }
    }
}

impl std::fmt::Debug for EngineHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHost")
            .field("observers", &self.observers.is_some())
            .field("timer_resolution_ms", &self.timer_resolution())
            .finish_non_exhaustive()
    }
}
