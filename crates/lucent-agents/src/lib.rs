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

//! # Lucent Agents
//!
//! The closed set of effect kinds. Each agent implements
//! [`Effect`](lucent_core::Effect) and owns whatever simulation state it
//! needs; heavy numeric work lives in `lucent-lanes`.

#![warn(missing_docs)]

pub mod follower_agent;
pub mod parallax_agent;
pub mod particle_agent;

pub use follower_agent::{CursorFollowerEffect, FollowerConfig, FollowerDot};
pub use parallax_agent::{ParallaxConfig, ParallaxEffect, ParallaxLayer};
pub use particle_agent::ParticleFieldEffect;
