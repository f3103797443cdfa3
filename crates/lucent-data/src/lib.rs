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

//! # Lucent Data
//!
//! Shared viewport-visibility tracking.
//!
//! Every effect bound to a page element needs to know whether that element
//! is on screen. Instead of one platform observer per effect, the
//! [`VisibilityTracker`] pools observers by their normalized options
//! ([`ObserverKey`]), coalesces platform notifications, and hands each
//! subscriber an enriched [`VisibilityRecord`](lucent_core::VisibilityRecord)
//! once per frame.

#![warn(missing_docs)]

pub mod key;
pub mod record;
pub mod tracker;

pub use key::ObserverKey;
pub use record::enrich;
pub use tracker::{Subscription, VisibilityCallback, VisibilityTracker};
