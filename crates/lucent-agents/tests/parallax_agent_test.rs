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

use approx::assert_relative_eq;
use lucent_agents::{ParallaxConfig, ParallaxEffect};
use lucent_core::{
    CapabilityProfile, Effect, FrameContext, PointerConfig, PointerState, QualityTier,
    ScrollDirection, VisibilityRecord,
};

fn record(progress: f32) -> VisibilityRecord {
    VisibilityRecord {
        is_visible: true,
        intersection_ratio: 1.0,
        scroll_progress: progress,
        direction: ScrollDirection::Unknown,
    }
}

fn advance(effect: &mut ParallaxEffect, progress: f32, tier: QualityTier) {
    let profile = CapabilityProfile::with_tier(tier);
    let pointer = PointerState::new(PointerConfig::default());
    let visibility = record(progress);
    let ctx = FrameContext {
        dt: 1.0 / 60.0,
        timestamp_ms: 0.0,
        frame_index: 0,
        quality: tier,
        profile: &profile,
        pointer: &pointer,
        visibility: &visibility,
    };
    effect.advance(&ctx).unwrap();
}

#[test]
fn test_offsets_ease_toward_target() {
    let mut effect = ParallaxEffect::new(ParallaxConfig::default(), &[0.2, 0.5, 1.0]).unwrap();
    advance(&mut effect, 1.0, QualityTier::High);
    let first = effect.layers()[2].offset;
    assert!(first > 0.0 && first < 60.0);

    for _ in 0..600 {
        advance(&mut effect, 1.0, QualityTier::High);
    }
    // (1.0 - 0.5) * depth * 120
    assert_relative_eq!(effect.layers()[0].offset, 12.0, epsilon = 1e-2);
    assert_relative_eq!(effect.layers()[1].offset, 30.0, epsilon = 1e-2);
    assert_relative_eq!(effect.layers()[2].offset, 60.0, epsilon = 1e-2);
}

#[test]
fn test_centered_element_has_no_offset() {
    let mut effect = ParallaxEffect::new(ParallaxConfig::default(), &[1.0, -1.0]).unwrap();
    advance(&mut effect, 0.5, QualityTier::Medium);
    assert!(effect.layers().iter().all(|l| l.offset == 0.0));
}

#[test]
fn test_low_tier_snaps_and_moves_two_layers() {
    let mut effect = ParallaxEffect::new(ParallaxConfig::default(), &[1.0, 0.5, 0.25]).unwrap();
    advance(&mut effect, 0.0, QualityTier::Low);
    let layers = effect.layers();
    assert_relative_eq!(layers[0].offset, -60.0);
    assert_relative_eq!(layers[1].offset, -30.0);
    assert_eq!(layers[2].offset, 0.0);
}

#[test]
fn test_quality_change_is_recorded() {
    let mut effect = ParallaxEffect::new(ParallaxConfig::default(), &[1.0]).unwrap();
    effect.on_quality_change(QualityTier::Low, &CapabilityProfile::with_tier(QualityTier::Low));
    assert_eq!(effect.tier(), QualityTier::Low);
}

#[test]
fn test_non_finite_depth_is_rejected() {
    assert!(ParallaxEffect::new(ParallaxConfig::default(), &[f32::NAN]).is_err());
}
