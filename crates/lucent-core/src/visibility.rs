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

//! Viewport-visibility vocabulary shared by the tracker, the platform
//! observer backends and the effects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::{Rect, RootMargin};

/// Opaque identifier of an observed element, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Identifier of one visibility subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Identifier of a platform observer, issued by an
/// [`ObserverBackend`](crate::platform::ObserverBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// Options requested by a subscriber.
///
/// Two option sets that normalize to the same key share one platform observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    /// Margin applied around the viewport.
    pub root_margin: RootMargin,
    /// Visibility ratios at which the platform should notify, in `[0, 1]`.
    pub thresholds: Vec<f32>,
}

impl ObserverOptions {
    /// Options with the given thresholds and no margin.
    pub fn with_thresholds(thresholds: impl Into<Vec<f32>>) -> Self {
        Self {
            root_margin: RootMargin::default(),
            thresholds: thresholds.into(),
        }
    }

    /// Replaces the root margin.
    pub fn margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::default(),
            thresholds: vec![0.0],
        }
    }
}

/// Where an element sits relative to the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScrollDirection {
    /// No notification received yet.
    #[default]
    Unknown,
    /// The element center is below the viewport center.
    FromBelow,
    /// The element center is at or above the viewport center.
    FromAbove,
}

/// The last known visibility of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRecord {
    /// The element intersects the (margin-adjusted) viewport.
    pub is_visible: bool,
    /// Visible fraction of the element, `0..=1`.
    pub intersection_ratio: f32,
    /// Travel of the element through the viewport: 0 when its top enters at
    /// the bottom edge, 1 when its bottom leaves at the top edge.
    pub scroll_progress: f32,
    /// Position relative to the viewport center.
    pub direction: ScrollDirection,
}

impl VisibilityRecord {
    /// Record used when observation is unavailable: fully visible,
    /// progress centered.
    pub const fn always_visible() -> Self {
        Self {
            is_visible: true,
            intersection_ratio: 1.0,
            scroll_progress: 0.5,
            direction: ScrollDirection::Unknown,
        }
    }

    /// Returns `true` if effects bound to this record may run.
    #[inline]
    pub fn allows_work(&self) -> bool {
        self.intersection_ratio > 0.0
    }
}

impl Default for VisibilityRecord {
    fn default() -> Self {
        Self {
            is_visible: false,
            intersection_ratio: 0.0,
            scroll_progress: 0.0,
            direction: ScrollDirection::Unknown,
        }
    }
}

/// One raw notification for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    /// The element the entry is about.
    pub element: ElementId,
    /// The element intersects the root.
    pub is_intersecting: bool,
    /// Visible fraction reported by the platform.
    pub intersection_ratio: f32,
    /// Element bounds at notification time.
    pub bounding_rect: Rect,
    /// Root bounds (margin applied) at notification time, if known.
    pub root_bounds: Option<Rect>,
}

/// A set of entries delivered together by one platform observer.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionBatch {
    /// The observer that produced the entries.
    pub observer: ObserverHandle,
    /// Entries in delivery order.
    pub entries: Vec<IntersectionEntry>,
}

/// Errors raised by observer backends.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VisibilityError {
    /// The host has no viewport-observation primitive.
    #[error("viewport observation is unavailable on this host")]
    Unavailable,
    /// The backend does not know this observer.
    #[error("unknown observer {0:?}")]
    UnknownObserver(ObserverHandle),
    /// Any other backend failure.
    #[error("observer backend failure: {0}")]
    Backend(String),
}
