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

//! Axis-aligned rectangles for viewport and element bounds.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// An axis-aligned rectangle in page pixels (`y` grows downwards).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width, never negative for a well-formed rectangle.
    pub width: f32,
    /// Height, never negative for a well-formed rectangle.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Surface area, zero for degenerate rectangles.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Returns `true` if `point` lies inside the rectangle (edges inclusive).
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Returns the overlapping region of two rectangles.
    ///
    /// Touching edges produce a zero-area intersection rather than `None`,
    /// matching how viewport observation treats an element sitting exactly on
    /// the viewport boundary as intersecting.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grows (or shrinks, with negative values) the rectangle by a margin.
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        Rect::new(
            self.x - margin.left,
            self.y - margin.top,
            (self.width + margin.left + margin.right).max(0.0),
            (self.height + margin.top + margin.bottom).max(0.0),
        )
    }

    /// Returns this rectangle moved by `offset`.
    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

/// Margins applied around the observation root, in pixels.
///
/// Positive values grow the root so elements are reported as visible before
/// they actually scroll into view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    /// Margin above the root.
    pub top: f32,
    /// Margin right of the root.
    pub right: f32,
    /// Margin below the root.
    pub bottom: f32,
    /// Margin left of the root.
    pub left: f32,
}

impl RootMargin {
    /// The same margin on every side.
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Vertical-only margin, the common case for scroll-driven effects.
    pub const fn vertical(value: f32) -> Self {
        Self {
            top: value,
            right: 0.0,
            bottom: value,
            left: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection_partial() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let element = Rect::new(50.0, 80.0, 100.0, 40.0);
        let inter = viewport.intersection(&element).unwrap();
        assert_eq!(inter, Rect::new(50.0, 80.0, 50.0, 20.0));
    }

    #[test]
    fn test_rect_intersection_disjoint_and_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&Rect::new(20.0, 0.0, 5.0, 5.0)).is_none());
        let touching = a.intersection(&Rect::new(10.0, 0.0, 5.0, 5.0)).unwrap();
        assert_eq!(touching.area(), 0.0);
    }

    #[test]
    fn test_rect_expand_with_margin() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0).expand(&RootMargin::vertical(10.0));
        assert_eq!(r, Rect::new(0.0, -10.0, 100.0, 70.0));
        let shrunk = Rect::new(0.0, 0.0, 10.0, 10.0).expand(&RootMargin::uniform(-20.0));
        assert_eq!(shrunk.area(), 0.0);
    }

    #[test]
    fn test_rect_contains_and_center() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Vec2::new(10.0, 30.0)));
        assert!(!r.contains(Vec2::new(31.0, 15.0)));
        assert_eq!(r.center(), Vec2::new(20.0, 20.0));
    }
}
