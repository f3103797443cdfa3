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

//! Turning raw platform entries into visibility records.

use lucent_core::math::Rect;
use lucent_core::visibility::{IntersectionEntry, ScrollDirection, VisibilityRecord};

/// Builds the record for `entry`, falling back to `previous` for fields
/// that need root geometry when the platform did not report it.
pub fn enrich(entry: &IntersectionEntry, previous: &VisibilityRecord) -> VisibilityRecord {
    let intersection_ratio = if entry.is_intersecting && entry.intersection_ratio.is_finite() {
        entry.intersection_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let (scroll_progress, direction) = match entry.root_bounds {
        Some(root) => (
            scroll_progress(&root, &entry.bounding_rect),
            direction(&root, &entry.bounding_rect),
        ),
        None => (previous.scroll_progress, previous.direction),
    };

    VisibilityRecord {
        is_visible: entry.is_intersecting,
        intersection_ratio,
        scroll_progress,
        direction,
    }
}

/// Travel of `element` through `root`, `0` when its top touches the root
/// bottom and `1` when its bottom touches the root top.
pub fn scroll_progress(root: &Rect, element: &Rect) -> f32 {
    let span = root.height + element.height;
    if span.is_nan() || span <= 0.0 {
        return if element.top() < root.bottom() { 1.0 } else { 0.0 };
    }
    ((root.bottom() - element.top()) / span).clamp(0.0, 1.0)
}

/// Position of `element` relative to the center of `root`.
pub fn direction(root: &Rect, element: &Rect) -> ScrollDirection {
    if element.center().y > root.center().y {
        ScrollDirection::FromBelow
    } else {
        ScrollDirection::FromAbove
    }
}
