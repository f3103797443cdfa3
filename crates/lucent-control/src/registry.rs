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

//! Ordered storage of registered effects.

use std::fmt;

use lucent_core::visibility::{ElementId, ObserverOptions, SubscriptionId};
use lucent_core::{Effect, EffectState};

/// Caller-chosen, unique effect identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub String);

impl EffectId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EffectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an effect's visibility is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectTarget {
    /// Not bound to an element; always considered visible.
    Detached,
    /// Bound to the visibility of a page element.
    Element {
        /// The element.
        element: ElementId,
        /// Observation options.
        options: ObserverOptions,
    },
}

/// One registered effect and its runtime bookkeeping.
pub(crate) struct EffectEntry {
    pub(crate) id: EffectId,
    pub(crate) effect: Box<dyn Effect>,
    pub(crate) state: EffectState,
    pub(crate) target: EffectTarget,
    pub(crate) subscription: Option<SubscriptionId>,
}

/// Registry of effects, iterated in registration order.
#[derive(Default)]
pub struct EffectRegistry {
    entries: Vec<EffectEntry>,
}

impl EffectRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: EffectEntry) {
        log::info!(
            "EffectRegistry: registered '{}' ({})",
            entry.id,
            entry.effect.kind()
        );
        self.entries.push(entry);
    }

    pub(crate) fn remove(&mut self, id: &EffectId) -> Option<EffectEntry> {
        let index = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn get(&self, id: &EffectId) -> Option<&EffectEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &EffectId) -> Option<&mut EffectEntry> {
        self.entries.iter_mut().find(|e| &e.id == id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EffectEntry> {
        self.entries.iter_mut()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, EffectEntry> {
        self.entries.drain(..)
    }

    /// Returns `true` if an effect with this id is registered.
    pub fn contains(&self, id: &EffectId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &EffectId> {
        self.entries.iter().map(|e| &e.id)
    }

    /// Lifecycle state of an effect.
    pub fn state(&self, id: &EffectId) -> Option<EffectState> {
        self.get(id).map(|e| e.state)
    }
}
