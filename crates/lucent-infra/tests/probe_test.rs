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

use lucent_core::platform::{GraphicsProbe, HintSource};
use lucent_core::{HostHints, QualityTier};
use lucent_infra::{CapabilityProbe, FixedGraphicsProbe, StaticHintSource, SysinfoHintSource};

#[test]
fn test_native_hints_never_fail_the_probe() {
    let probe = CapabilityProbe::new(
        Box::new(SysinfoHintSource::new()),
        Box::new(FixedGraphicsProbe(false)),
    );
    let profile = probe.probe();
    assert!(profile.core_count >= 1);
    assert_eq!(profile.performance_tier, QualityTier::Low);
}

#[test]
fn test_static_sources_are_deterministic() {
    let hints = HostHints::conservative();
    let source = StaticHintSource::new(hints.clone());
    assert_eq!(source.hints().unwrap(), hints);
    assert!(FixedGraphicsProbe(true).probe_acceleration().unwrap());
}
