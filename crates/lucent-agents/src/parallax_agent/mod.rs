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

//! Scroll-driven parallax layers.
//!
//! Each layer's offset follows `(scroll_progress - 0.5) * depth * amplitude`,
//! where scroll progress comes from the visibility record of the element the
//! effect is bound to. On `Low` the easing is dropped and only the first
//! layers move.

mod agent;

pub use agent::*;
