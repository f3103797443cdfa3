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

//! Observer pooling behaviour of the visibility tracker.

use std::sync::{Arc, Mutex};

use lucent_core::math::{Rect, RootMargin};
use lucent_core::platform::{IntersectionSink, ObserverBackend};
use lucent_core::visibility::{
    ElementId, IntersectionEntry, ObserverHandle, ObserverOptions, VisibilityError,
    VisibilityRecord,
};
use lucent_data::{VisibilityCallback, VisibilityTracker};

#[derive(Default)]
struct Counters {
    created: usize,
    observe_calls: usize,
    unobserve_calls: usize,
    disconnected: usize,
}

#[derive(Clone, Default)]
struct CountingBackend(Arc<Mutex<Counters>>);

impl ObserverBackend for CountingBackend {
    fn create(
        &mut self,
        _options: &ObserverOptions,
        _sink: IntersectionSink,
    ) -> Result<ObserverHandle, VisibilityError> {
        let mut c = self.0.lock().unwrap();
        c.created += 1;
        Ok(ObserverHandle(c.created as u64))
    }

    fn observe(&mut self, _: ObserverHandle, _: ElementId) -> Result<(), VisibilityError> {
        self.0.lock().unwrap().observe_calls += 1;
        Ok(())
    }

    fn unobserve(&mut self, _: ObserverHandle, _: ElementId) {
        self.0.lock().unwrap().unobserve_calls += 1;
    }

    fn disconnect(&mut self, _: ObserverHandle) {
        self.0.lock().unwrap().disconnected += 1;
    }
}

// ─── Sharing ────────────────────────────────────────────────────────

#[test]
fn hundred_equal_subscriptions_share_one_observer() {
    let backend = CountingBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));
    let options = ObserverOptions::with_thresholds(vec![0.0, 0.5]).margin(RootMargin::vertical(50.0));

    let subs: Vec<_> = (0..100)
        .map(|i| tracker.subscribe(ElementId(i), &options, None))
        .collect();

    assert_eq!(tracker.observer_count(), 1);
    assert_eq!(tracker.subscription_count(), 100);
    assert_eq!(backend.0.lock().unwrap().created, 1);
    assert_eq!(backend.0.lock().unwrap().observe_calls, 100);

    drop(subs);
    tracker.flush();

    assert_eq!(tracker.observer_count(), 0);
    assert_eq!(tracker.subscription_count(), 0);
    let c = backend.0.lock().unwrap();
    assert_eq!(c.disconnected, 1);
    assert_eq!(c.unobserve_calls, 100);
}

#[test]
fn same_element_is_observed_once_per_observer() {
    let backend = CountingBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));
    let options = ObserverOptions::default();

    let a = tracker.subscribe(ElementId(7), &options, None);
    let b = tracker.subscribe(ElementId(7), &options, None);
    assert_eq!(backend.0.lock().unwrap().observe_calls, 1);

    drop(a);
    tracker.flush();
    assert_eq!(backend.0.lock().unwrap().unobserve_calls, 0);
    assert_eq!(tracker.observer_count(), 1);

    assert!(tracker.unsubscribe(b.id()));
    assert_eq!(backend.0.lock().unwrap().unobserve_calls, 1);
    assert_eq!(tracker.observer_count(), 0);
}

// ─── Keys ───────────────────────────────────────────────────────────

#[test]
fn distinct_options_get_distinct_observers() {
    let backend = CountingBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));

    let _a = tracker.subscribe(ElementId(1), &ObserverOptions::default(), None);
    let _b = tracker.subscribe(ElementId(1), &ObserverOptions::with_thresholds(vec![0.25]), None);
    let _c = tracker.subscribe(
        ElementId(1),
        &ObserverOptions::with_thresholds(vec![0.2500001, 0.25]),
        None,
    );

    assert_eq!(tracker.observer_count(), 2);
    assert_eq!(backend.0.lock().unwrap().created, 2);
}

// ─── Shared elements ────────────────────────────────────────────────

/// Backend that reports the current state of an element once when it starts
/// being observed, the way a platform observer does.
#[derive(Clone, Default)]
struct InitialEntryBackend {
    sinks: Arc<Mutex<Vec<(ObserverHandle, IntersectionSink)>>>,
    observe_calls: Arc<Mutex<usize>>,
}

impl ObserverBackend for InitialEntryBackend {
    fn create(
        &mut self,
        _options: &ObserverOptions,
        sink: IntersectionSink,
    ) -> Result<ObserverHandle, VisibilityError> {
        let mut sinks = self.sinks.lock().unwrap();
        let handle = ObserverHandle(sinks.len() as u64 + 1);
        sinks.push((handle, sink));
        Ok(handle)
    }

    fn observe(&mut self, handle: ObserverHandle, element: ElementId) -> Result<(), VisibilityError> {
        *self.observe_calls.lock().unwrap() += 1;
        for (h, sink) in self.sinks.lock().unwrap().iter() {
            if *h == handle {
                sink.deliver(
                    handle,
                    vec![IntersectionEntry {
                        element,
                        is_intersecting: true,
                        intersection_ratio: 1.0,
                        bounding_rect: Rect::new(0.0, 100.0, 200.0, 200.0),
                        root_bounds: Some(Rect::new(0.0, 0.0, 800.0, 600.0)),
                    }],
                );
            }
        }
        Ok(())
    }

    fn unobserve(&mut self, _: ObserverHandle, _: ElementId) {}

    fn disconnect(&mut self, handle: ObserverHandle) {
        self.sinks.lock().unwrap().retain(|(h, _)| *h != handle);
    }
}

fn counting_callback(calls: &Arc<Mutex<Vec<VisibilityRecord>>>) -> VisibilityCallback {
    let calls = Arc::clone(calls);
    Box::new(move |_, record| calls.lock().unwrap().push(*record))
}

#[test]
fn late_subscriber_inherits_the_current_record() {
    let backend = InitialEntryBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));
    let options = ObserverOptions::default();

    let a = tracker.subscribe(ElementId(7), &options, None);
    tracker.flush();
    assert!(tracker.record(a.id()).unwrap().is_visible);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let b = tracker.subscribe(ElementId(7), &options, Some(counting_callback(&calls)));
    assert_eq!(*backend.observe_calls.lock().unwrap(), 1);

    let record = tracker.record(b.id()).unwrap();
    assert!(record.is_visible);
    assert!(record.allows_work());

    tracker.flush();
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].intersection_ratio, 1.0);
}

#[test]
fn entries_reach_every_subscriber_of_an_element() {
    let backend = InitialEntryBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));
    let options = ObserverOptions::default();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let a = tracker.subscribe(ElementId(7), &options, Some(counting_callback(&calls)));
    let b = tracker.subscribe(ElementId(7), &options, Some(counting_callback(&calls)));
    let other = tracker.subscribe(ElementId(8), &options, None);

    // Nothing has been flushed yet, so b has no sibling record to copy.
    assert!(!tracker.record(b.id()).unwrap().is_visible);

    assert_eq!(tracker.flush(), 3);
    assert!(tracker.record(a.id()).unwrap().is_visible);
    assert!(tracker.record(b.id()).unwrap().is_visible);
    assert!(tracker.record(other.id()).unwrap().is_visible);
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn released_subscriber_leaves_its_siblings_observed() {
    let backend = InitialEntryBackend::default();
    let mut tracker = VisibilityTracker::create(Some(Box::new(backend.clone())));
    let options = ObserverOptions::default();

    let a = tracker.subscribe(ElementId(7), &options, None);
    let b = tracker.subscribe(ElementId(7), &options, None);
    tracker.flush();

    drop(a);
    tracker.flush();
    assert_eq!(tracker.subscription_count(), 1);
    assert!(tracker.record(b.id()).unwrap().is_visible);

    // A fresh subscriber copies b's record instead of waiting for the platform.
    let c = tracker.subscribe(ElementId(7), &options, None);
    assert!(tracker.record(c.id()).unwrap().is_visible);
    assert_eq!(*backend.observe_calls.lock().unwrap(), 1);
}
