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

//! # Lucent Control
//!
//! The control plane of the runtime:
//!
//! - [`monitor`] samples frame timestamps and moves the quality tier with
//!   hysteresis,
//! - [`analysis`] classifies closed measurement windows,
//! - [`registry`] keeps registered effects in registration order,
//! - [`service`] runs the single per-frame loop that ties everything together.

#![warn(missing_docs)]

pub mod analysis;
pub mod monitor;
pub mod registry;
pub mod service;

pub use analysis::{TierThresholds, WindowAnalyzer, WindowReport, WindowVerdict};
pub use monitor::{FrameMetrics, ListenerId, MonitorConfig, PerformanceMonitor, QualityListener};
pub use registry::{EffectId, EffectRegistry, EffectTarget};
pub use service::{EffectHandle, EffectRuntime, RuntimeCommand, RuntimeConfig, RuntimeError, TickReport};
