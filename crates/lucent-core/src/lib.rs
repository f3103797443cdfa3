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

//! # Lucent Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! shared by every layer of the effects runtime: quality tiers, the device
//! capability profile, the `Effect` contract, visibility records, pointer
//! state and the host platform abstractions.

#![warn(missing_docs)]

pub mod capability;
pub mod effect;
pub mod event;
pub mod math;
pub mod platform;
pub mod pointer;
pub mod quality;
pub mod telemetry;
pub mod utils;
pub mod visibility;

pub use capability::{CapabilityProfile, HostHints, MemoryTier, NetworkHint, NetworkTier};
pub use effect::{Effect, EffectError, EffectKind, EffectState, FrameContext};
pub use pointer::{PointerConfig, PointerSample, PointerState};
pub use quality::{QualityTier, TierTable};
pub use utils::ring_buffer::RingBuffer;
pub use visibility::{
    ElementId, ObserverHandle, ObserverOptions, ScrollDirection, SubscriptionId, VisibilityRecord,
};
