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

//! # Lucent Infra
//!
//! Concrete implementations of the host traits declared in
//! [`lucent_core::platform`]:
//!
//! - [`capability`]: the one-shot capability probe and its hint sources,
//! - [`graphics`]: a wgpu-backed acceleration probe (feature `graphics`),
//! - [`platform`]: the native frame clock,
//! - [`visibility`]: a geometric viewport-observer backend for hosts that
//!   lay elements out themselves.

#![warn(missing_docs)]

pub mod capability;
#[cfg(feature = "graphics")]
pub mod graphics;
pub mod platform;
pub mod visibility;

pub use capability::{CapabilityProbe, FixedGraphicsProbe, StaticHintSource, SysinfoHintSource};
#[cfg(feature = "graphics")]
pub use graphics::WgpuGraphicsProbe;
pub use platform::InstantClock;
pub use visibility::GeometricObservers;
