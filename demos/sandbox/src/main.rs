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

// Lucent Sandbox
// Drives one engine over a synthetic page: a pointer tracing a Lissajous
// curve, a page scrolling past a hero section, and a slow stretch in the
// middle so quality adaptation has something to react to.

use anyhow::{Context, Result};
use lucent_infra::GeometricObservers;
use lucent_sdk::prelude::*;

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1280.0, 720.0);
const HERO: ElementId = ElementId(1);
const GALLERY: ElementId = ElementId(2);
const FRAMES: u32 = 900;

/// Frame duration at `frame`: 60 fps, with a 25 fps stretch in the middle.
fn frame_duration_ms(frame: u32) -> f64 {
    if (300..480).contains(&frame) {
        40.0
    } else {
        1000.0 / 60.0
    }
}

fn pointer_at(t_ms: f64) -> Vec2 {
    let t = (t_ms / 1000.0) as f32;
    Vec2::new(
        VIEWPORT.center().x + (t * 1.3).sin() * 420.0,
        VIEWPORT.center().y + (t * 2.1).sin() * 220.0,
    )
}

fn load_config() -> Result<EngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading engine config from {path}")),
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();

    let config = load_config()?;

    let layout = GeometricObservers::new(VIEWPORT);
    layout.place(HERO, Rect::new(0.0, 0.0, 1280.0, 720.0));
    layout.place(GALLERY, Rect::new(0.0, 1400.0, 1280.0, 900.0));

    let host = EngineHost::native().with_observers(layout.clone());
    let mut engine = EffectEngine::create(config, host).context("creating the effect engine")?;
    log::info!("Device profile: {:?}", engine.capability_profile());

    engine.add_quality_listener(Box::new(|from, to| {
        log::info!("Quality changed: {from} -> {to}");
    }));

    let hero_target = EffectTarget::Element {
        element: HERO,
        options: ObserverOptions::default(),
    };
    let field = engine.particle_field("hero-field", VIEWPORT, hero_target)?;
    let cursor = engine.cursor_follower("cursor")?;
    let gallery = engine.parallax(
        "gallery-parallax",
        GALLERY,
        ObserverOptions::with_thresholds([0.0, 0.25, 0.5, 0.75, 1.0])
            .margin(RootMargin::vertical(120.0)),
    )?;
    for handle in [&field, &cursor, &gallery] {
        engine.play(handle.id())?;
    }

    let mut now = 0.0;
    let mut skipped = 0;
    for frame in 0..FRAMES {
        now += frame_duration_ms(frame);

        let pointer = pointer_at(now);
        engine.pointer_moved(pointer.x, pointer.y, now);

        // Scroll down through the page over the run.
        let scroll = (frame as f32 / FRAMES as f32) * 1800.0;
        layout.scroll_to(scroll);
        layout.refresh();

        let report = engine.tick(now);
        skipped += report.skipped;

        if frame % 120 == 0 {
            let particles = engine
                .effect::<ParticleFieldEffect>(field.id())
                .map(|f| (f.particles().len(), f.edges().len()))
                .unwrap_or_default();
            log::info!(
                "frame {:>4}: {:>5.1} fps, {} quality, {} particles, {} links, scroll {:.0}px",
                frame,
                report.fps,
                report.quality,
                particles.0,
                particles.1,
                scroll
            );
        }
    }

    log::info!("Effects skipped while off-screen: {skipped}");
    let snapshot = engine
        .telemetry()
        .snapshot_json()
        .context("serializing telemetry")?;
    println!("{snapshot}");

    engine.dispose();
    Ok(())
}
