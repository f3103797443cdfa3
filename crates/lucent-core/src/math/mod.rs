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

//! 2D math primitives used by the simulation and the viewport geometry.
//!
//! Everything here works in CSS-pixel space with `y` growing downwards, the
//! coordinate system of the host page.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub mod geometry;
pub mod vector;

pub use self::geometry::{Rect, RootMargin};
pub use self::vector::Vec2;

/// Frame-rate independent exponential smoothing factor.
///
/// Converts a per-frame easing factor tuned at 60 Hz into the factor to use
/// for an arbitrary `dt` (in seconds), so that easing converges at the same
/// wall-clock speed whatever the actual frame rate is.
///
/// # Examples
///
/// ```
/// use lucent_core::math::ease_factor;
/// let f = ease_factor(0.2, 1.0 / 60.0);
/// assert!((f - 0.2).abs() < 1e-4);
/// ```
#[inline]
pub fn ease_factor(per_frame: f32, dt: f32) -> f32 {
    let per_frame = per_frame.clamp(0.0, 1.0);
    1.0 - (1.0 - per_frame).powf(dt.max(0.0) * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ease_factor_is_frame_rate_independent() {
        // One 30 Hz step covers the same ground as two 60 Hz steps.
        let one_slow = ease_factor(0.25, 1.0 / 30.0);
        let two_fast = 1.0 - (1.0 - ease_factor(0.25, 1.0 / 60.0)).powi(2);
        assert_relative_eq!(one_slow, two_fast, epsilon = 1e-5);
    }

    #[test]
    fn test_ease_factor_bounds() {
        assert_eq!(ease_factor(0.5, 0.0), 0.0);
        assert_eq!(ease_factor(1.0, 0.016), 1.0);
        assert_eq!(ease_factor(-3.0, 0.016), 0.0);
    }
}
