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

//! The pooled visibility tracker.

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use lucent_core::event::EventBus;
use lucent_core::platform::{IntersectionSink, ObserverBackend};
use lucent_core::visibility::{
    ElementId, IntersectionBatch, IntersectionEntry, ObserverHandle, ObserverOptions,
    SubscriptionId, VisibilityError, VisibilityRecord,
};

use crate::key::ObserverKey;
use crate::record::enrich;

/// Callback invoked during [`VisibilityTracker::flush`] with the updated record.
pub type VisibilityCallback = Box<dyn FnMut(SubscriptionId, &VisibilityRecord) + Send>;

/// Scoped guard for one subscription.
///
/// Dropping the guard queues the release; the tracker applies it before
/// its next flush (and between callbacks of a flush in progress).
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    releases: flume::Sender<SubscriptionId>,
    armed: bool,
}

impl Subscription {
    /// The subscription identifier.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Disarms the guard. The subscription then lives until
    /// [`VisibilityTracker::unsubscribe`] is called.
    pub fn detach(mut self) -> SubscriptionId {
        self.armed = false;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.armed {
            // The tracker may already be gone, in which case there is nothing to release.
            let _ = self.releases.send(self.id);
        }
    }
}

struct SubscriptionEntry {
    element: ElementId,
    key: ObserverKey,
    record: VisibilityRecord,
    callback: Option<VisibilityCallback>,
    /// `false` for fail-open subscriptions that have no platform observer.
    pooled: bool,
    /// `record` reflects at least one platform entry (or fail-open).
    seeded: bool,
}

struct PooledObserver {
    handle: ObserverHandle,
    /// Subscriptions per observed element, in subscription order.
    elements: AHashMap<ElementId, Vec<SubscriptionId>>,
    subscribers: usize,
}

/// Shared viewport-visibility tracking.
///
/// Subscriptions whose options normalize to the same [`ObserverKey`] share
/// one platform observer, and an element is observed once per observer no
/// matter how many subscriptions watch it. Platform notifications are queued
/// and only processed by [`flush`](Self::flush), once per frame.
pub struct VisibilityTracker {
    backend: Option<Box<dyn ObserverBackend>>,
    fail_open: bool,
    pools: AHashMap<ObserverKey, PooledObserver>,
    keys_by_handle: AHashMap<ObserverHandle, ObserverKey>,
    subscriptions: BTreeMap<SubscriptionId, SubscriptionEntry>,
    next_id: u64,
    notifications: EventBus<IntersectionBatch>,
    releases: EventBus<SubscriptionId>,
    /// Fail-open subscriptions that have not received their first callback.
    pending_initial: Vec<SubscriptionId>,
}

impl VisibilityTracker {
    /// Creates a tracker over `backend`.
    ///
    /// Without a backend, or with one that reports itself unavailable, every
    /// subscription is recorded as permanently visible.
    pub fn create(backend: Option<Box<dyn ObserverBackend>>) -> Self {
        let fail_open = match &backend {
            None => {
                log::warn!("No viewport observer backend; effects will run as always visible.");
                true
            }
            Some(b) if !b.is_available() => {
                log::warn!("Viewport observation unavailable; effects will run as always visible.");
                true
            }
            Some(_) => false,
        };

        Self {
            backend,
            fail_open,
            pools: AHashMap::new(),
            keys_by_handle: AHashMap::new(),
            subscriptions: BTreeMap::new(),
            next_id: 1,
            notifications: EventBus::new(),
            releases: EventBus::new(),
            pending_initial: Vec::new(),
        }
    }

    /// Subscribes to the visibility of `element`.
    pub fn subscribe(
        &mut self,
        element: ElementId,
        options: &ObserverOptions,
        callback: Option<VisibilityCallback>,
    ) -> Subscription {
        self.apply_releases();

        let key = ObserverKey::from_options(options);
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let pooled = !self.fail_open && self.attach(&key, element, id);
        let (record, seeded) = if !pooled {
            self.pending_initial.push(id);
            (VisibilityRecord::always_visible(), true)
        } else if let Some(record) = self.sibling_record(&key, element, id) {
            // The element was already observed: no fresh platform entry will come.
            self.pending_initial.push(id);
            (record, true)
        } else {
            (VisibilityRecord::default(), false)
        };

        log::debug!("Subscribed {id} to {element} with {key} (pooled: {pooled}).");
        self.subscriptions.insert(
            id,
            SubscriptionEntry {
                element,
                key,
                record,
                callback,
                pooled,
                seeded,
            },
        );

        Subscription {
            id,
            releases: self.releases.sender(),
            armed: true,
        }
    }

    /// Removes a subscription immediately. Returns `false` if it was
    /// already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(entry) = self.subscriptions.remove(&id) else {
            return false;
        };
        self.pending_initial.retain(|pending| *pending != id);
        if entry.pooled {
            self.detach_from_pool(&entry.key, entry.element, id);
        }
        log::debug!("Released {id}.");
        true
    }

    /// Applies the releases queued by dropped [`Subscription`] guards.
    pub fn apply_releases(&mut self) -> usize {
        self.releases
            .drain()
            .into_iter()
            .filter(|id| self.unsubscribe(*id))
            .count()
    }

    /// Processes every queued platform notification in one batch.
    ///
    /// Entries are coalesced to the latest one per observer and element.
    /// Returns the number of subscription records updated.
    pub fn flush(&mut self) -> usize {
        self.apply_releases();

        let mut order: Vec<(ObserverHandle, ElementId)> = Vec::new();
        let mut latest: AHashMap<(ObserverHandle, ElementId), IntersectionEntry> =
            AHashMap::new();
        for batch in self.notifications.drain() {
            for entry in batch.entries {
                let slot = (batch.observer, entry.element);
                if latest.insert(slot, entry).is_none() {
                    order.push(slot);
                }
            }
        }

        let mut dispatch = std::mem::take(&mut self.pending_initial);
        let mut updated = 0;
        for slot in order {
            let Some(entry) = latest.remove(&slot) else {
                continue;
            };
            let Some(ids) = self
                .keys_by_handle
                .get(&slot.0)
                .and_then(|key| self.pools.get(key))
                .and_then(|pool| pool.elements.get(&entry.element))
            else {
                log::trace!("Dropping entry from disconnected observer {:?}.", slot.0);
                continue;
            };
            for id in ids {
                let Some(sub) = self.subscriptions.get_mut(id) else {
                    continue;
                };
                sub.record = enrich(&entry, &sub.record);
                sub.seeded = true;
                updated += 1;
                if sub.callback.is_some() {
                    dispatch.push(*id);
                }
            }
        }

        let mut dispatched = AHashSet::with_capacity(dispatch.len());
        for id in dispatch {
            if !dispatched.insert(id) {
                continue;
            }
            self.apply_releases();
            self.dispatch(id);
        }

        if updated > 0 {
            log::trace!("Visibility flush updated {updated} record(s).");
        }
        updated
    }

    /// Last known record of a subscription.
    pub fn record(&self, id: SubscriptionId) -> Option<VisibilityRecord> {
        self.subscriptions.get(&id).map(|s| s.record)
    }

    /// Number of live platform observers.
    pub fn observer_count(&self) -> usize {
        self.pools.len()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// `true` when subscriptions are recorded as always visible.
    pub fn is_fail_open(&self) -> bool {
        self.fail_open
    }

    /// A sink feeding this tracker, for hosts that push notifications
    /// without going through a backend.
    pub fn sink(&self) -> IntersectionSink {
        IntersectionSink::new(self.notifications.sender())
    }

    /// Disconnects every observer and drops every subscription.
    pub fn dispose(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            for pool in self.pools.values() {
                backend.disconnect(pool.handle);
            }
        }
        let released = self.subscriptions.len();
        self.pools.clear();
        self.keys_by_handle.clear();
        self.subscriptions.clear();
        self.pending_initial.clear();
        self.notifications.drain();
        self.releases.drain();
        if released > 0 {
            log::info!("Visibility tracker disposed ({released} subscription(s) released).");
        }
    }

    fn attach(&mut self, key: &ObserverKey, element: ElementId, id: SubscriptionId) -> bool {
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };

        if !self.pools.contains_key(key) {
            let sink = IntersectionSink::new(self.notifications.sender());
            match backend.create(&key.to_options(), sink) {
                Ok(handle) => {
                    log::debug!("Created observer {handle:?} for {key}.");
                    self.pools.insert(
                        key.clone(),
                        PooledObserver {
                            handle,
                            elements: AHashMap::new(),
                            subscribers: 0,
                        },
                    );
                    self.keys_by_handle.insert(handle, key.clone());
                }
                Err(VisibilityError::Unavailable) => {
                    log::warn!("Viewport observation became unavailable; switching to always visible.");
                    self.fail_open = true;
                    return false;
                }
                Err(e) => {
                    log::warn!("Could not create observer for {key}: {e}. Treating as visible.");
                    return false;
                }
            }
        }

        let Some(pool) = self.pools.get_mut(key) else {
            return false;
        };
        if !pool.elements.contains_key(&element) {
            if let Err(e) = backend.observe(pool.handle, element) {
                log::warn!("Could not observe {element}: {e}. Treating as visible.");
                if pool.subscribers == 0 {
                    let handle = pool.handle;
                    backend.disconnect(handle);
                    self.pools.remove(key);
                    self.keys_by_handle.remove(&handle);
                }
                return false;
            }
        }
        pool.elements.entry(element).or_default().push(id);
        pool.subscribers += 1;
        true
    }

    /// Record of an already seeded subscription watching the same element
    /// through the same observer.
    fn sibling_record(
        &self,
        key: &ObserverKey,
        element: ElementId,
        id: SubscriptionId,
    ) -> Option<VisibilityRecord> {
        let ids = self.pools.get(key)?.elements.get(&element)?;
        ids.iter()
            .filter(|sibling| **sibling != id)
            .filter_map(|sibling| self.subscriptions.get(sibling))
            .find(|sibling| sibling.seeded)
            .map(|sibling| sibling.record)
    }

    fn detach_from_pool(&mut self, key: &ObserverKey, element: ElementId, id: SubscriptionId) {
        let (Some(pool), Some(backend)) = (self.pools.get_mut(key), self.backend.as_mut()) else {
            return;
        };

        if let Some(ids) = pool.elements.get_mut(&element) {
            ids.retain(|watcher| *watcher != id);
            if ids.is_empty() {
                pool.elements.remove(&element);
                backend.unobserve(pool.handle, element);
            }
        }

        pool.subscribers = pool.subscribers.saturating_sub(1);
        if pool.subscribers == 0 {
            let handle = pool.handle;
            backend.disconnect(handle);
            self.pools.remove(key);
            self.keys_by_handle.remove(&handle);
            log::debug!("Disconnected observer {handle:?} for {key}.");
        }
    }

    fn dispatch(&mut self, id: SubscriptionId) {
        let Some(sub) = self.subscriptions.get_mut(&id) else {
            return;
        };
        let Some(mut callback) = sub.callback.take() else {
            return;
        };
        let record = sub.record;
        callback(id, &record);
        if let Some(sub) = self.subscriptions.get_mut(&id) {
            sub.callback = Some(callback);
        }
    }
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("fail_open", &self.fail_open)
            .field("observers", &self.pools.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
