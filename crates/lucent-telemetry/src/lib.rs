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

//! # Lucent Telemetry
//!
//! Metric storage and the per-frame telemetry service.
//!
//! [`MetricsRegistry`] hands out typed handles over a pluggable
//! [`MetricsBackend`]; [`TelemetryService`] registers the runtime's
//! standard metrics and records a [`TickReport`](lucent_control::TickReport)
//! every frame.

#![warn(missing_docs)]

pub mod metrics;
pub mod service;
pub mod storage;
pub mod utils;

pub use metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
pub use service::{TelemetryService, TelemetrySnapshot, FRAME_TIME_BUCKETS_MS, NAMESPACE};
pub use storage::backend::{BackendStats, MetricsBackend};
pub use storage::memory_backend::InMemoryBackend;
pub use utils::timer::ScopedMetricTimer;
