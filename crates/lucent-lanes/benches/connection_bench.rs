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

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lucent_core::math::{Rect, Vec2};
use lucent_core::{CapabilityProfile, PointerConfig, PointerState, QualityTier};
use lucent_lanes::particle_lane::build_edges;
use lucent_lanes::{ParticleField, ParticleFieldConfig};

fn bench_connections(c: &mut Criterion) {
    let bounds = Rect::new(0.0, 0.0, 1920.0, 1080.0);
    let config = ParticleFieldConfig {
        seed: Some(1),
        ..Default::default()
    };
    let profile = CapabilityProfile::with_tier(QualityTier::High);

    let mut field = ParticleField::new(config.clone(), bounds).expect("valid config");
    field.configure(&profile, QualityTier::High);
    let particles = field.particles().to_vec();

    let mut group = c.benchmark_group("Connection Graph");

    group.bench_function("Grid build (500 particles, 500 edges)", |b| {
        b.iter(|| {
            let edges = build_edges(black_box(&particles), config.connection_distance, 500, None);
            black_box(edges.len());
        });
    });

    group.bench_function("Grid build (500 particles, 4 links each)", |b| {
        b.iter(|| {
            let edges = build_edges(black_box(&particles), config.connection_distance, 500, Some(4));
            black_box(edges.len());
        });
    });

    group.finish();

    let mut group = c.benchmark_group("Particle Field");
    let mut pointer = PointerState::new(PointerConfig::default());
    let mut now = 0.0;

    group.bench_function("Full tick (High tier, active cursor)", |b| {
        b.iter(|| {
            now += 16.0;
            pointer.record_move(Vec2::new(960.0 + (now as f32 * 0.01).sin() * 300.0, 540.0), now);
            let stats = field.tick(1.0 / 60.0, &pointer, now).expect("finite dt");
            black_box(stats);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_connections);
criterion_main!(benches);
