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

//! The public-facing API of the Lucent effects runtime.
//!
//! An [`EffectEngine`] is created once per page (or window) from an
//! [`EngineConfig`] and an [`EngineHost`], driven by one [`tick`] per
//! display frame and torn down with [`dispose`].
//!
//! [`tick`]: EffectEngine::tick
//! [`dispose`]: EffectEngine::dispose

#![warn(missing_docs)]

mod config;
mod engine;
mod host;

pub use config::{ConfigError, EngineConfig};
pub use engine::{EffectEngine, EngineError};
pub use host::EngineHost;

/// Types needed by most embedders.
pub mod prelude {
    pub use crate::{EffectEngine, EngineConfig, EngineError, EngineHost};
    pub use lucent_agents::{
        CursorFollowerEffect, FollowerConfig, ParallaxConfig, ParallaxEffect,
        ParticleFieldEffect,
    };
    pub use lucent_control::{
        EffectHandle, EffectId, EffectTarget, MonitorConfig, RuntimeConfig, TickReport,
    };
    pub use lucent_core::math::{Rect, RootMargin, Vec2};
    pub use lucent_core::{
        CapabilityProfile, Effect, EffectState, ElementId, ObserverOptions, QualityTier,
        VisibilityRecord,
    };
    pub use lucent_data::Subscription;
    pub use lucent_lanes::ParticleFieldConfig;
}
