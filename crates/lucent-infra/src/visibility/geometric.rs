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

//! An [`ObserverBackend`] computing intersections from host-supplied
//! rectangles.
//!
//! Elements are placed in page coordinates and the viewport scrolls over
//! them. Entries are reported in viewport coordinates, so
//! `bounding_rect` and `root_bounds` share an origin at the viewport's
//! top-left corner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lucent_core::math::Rect;
use lucent_core::platform::{IntersectionSink, ObserverBackend};
use lucent_core::visibility::{IntersectionEntry, VisibilityError};
use lucent_core::{ElementId, ObserverHandle, ObserverOptions};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Observed {
    band: usize,
    intersecting: bool,
    rect: Rect,
}

struct ObserverSlot {
    options: ObserverOptions,
    sink: IntersectionSink,
    watched: HashMap<ElementId, Option<Observed>>,
}

struct Shared {
    available: bool,
    viewport: Rect,
    elements: HashMap<ElementId, Rect>,
    observers: HashMap<ObserverHandle, ObserverSlot>,
    next_handle: u64,
}

/// Shared handle to a geometric observer host.
///
/// Clones share state: hand one clone to the visibility tracker and keep
/// another to move the viewport and lay out elements, then call
/// [`refresh`](Self::refresh) once per layout change.
#[derive(Clone)]
pub struct GeometricObservers {
    shared: Arc<Mutex<Shared>>,
}

impl GeometricObservers {
    /// Creates a host with the given viewport, in page coordinates.
    pub fn new(viewport: Rect) -> Self {
        Self::with_availability(viewport, true)
    }

    /// A host that reports viewport observation as unsupported.
    pub fn unavailable() -> Self {
        Self::with_availability(Rect::default(), false)
    }

    fn with_availability(viewport: Rect, available: bool) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                available,
                viewport,
                elements: HashMap::new(),
                observers: HashMap::new(),
                next_handle: 1,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current viewport, in page coordinates.
    pub fn viewport(&self) -> Rect {
        self.lock().viewport
    }

    /// Replaces the viewport (resize and scroll at once).
    pub fn set_viewport(&self, viewport: Rect) {
        self.lock().viewport = viewport;
    }

    /// Scrolls the viewport vertically to `y`.
    pub fn scroll_to(&self, y: f32) {
        self.lock().viewport.y = y;
    }

    /// Places or moves an element.
    pub fn place(&self, element: ElementId, rect: Rect) {
        self.lock().elements.insert(element, rect);
    }

    /// Removes an element from the layout.
    ///
    /// Observers watching it report it as no longer intersecting on the
    /// next refresh.
    pub fn remove(&self, element: ElementId) {
        self.lock().elements.remove(&element);
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Recomputes every watched element and delivers the entries that
    /// changed. Returns the number of entries delivered.
    ///
    /// An entry is delivered when the element crosses a threshold, starts or
    /// stops intersecting, or moves while intersecting.
    pub fn refresh(&self) -> usize {
        let mut guard = self.lock();
        let shared = &mut *guard;
        let mut delivered = 0;

        for (handle, slot) in shared.observers.iter_mut() {
            let mut entries = Vec::new();
            for (element, last) in slot.watched.iter_mut() {
                let Some(rect) = shared.elements.get(element) else {
                    if let Some(previous) = last.take() {
                        if previous.intersecting {
                            entries.push(departed(*element, previous.rect, &shared.viewport, &slot.options));
                        }
                    }
                    continue;
                };
                let (entry, now) = measure(*element, rect, &shared.viewport, &slot.options);
                let changed = match last {
                    None => true,
                    Some(prev) => {
                        prev.band != now.band
                            || prev.intersecting != now.intersecting
                            || (now.intersecting && prev.rect != now.rect)
                    }
                };
                *last = Some(now);
                if changed {
                    entries.push(entry);
                }
            }
            if entries.is_empty() {
                continue;
            }
            delivered += entries.len();
            if !slot.sink.deliver(*handle, entries) {
                log::trace!("Observer {:?} has no listener left.", handle);
            }
        }

        delivered
    }
}

impl std::fmt::Debug for GeometricObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("GeometricObservers")
            .field("available", &shared.available)
            .field("viewport", &shared.viewport)
            .field("elements", &shared.elements.len())
            .field("observers", &shared.observers.len())
            .finish()
    }
}

impl ObserverBackend for GeometricObservers {
    fn is_available(&self) -> bool {
        self.lock().available
    }

    fn create(
        &mut self,
        options: &ObserverOptions,
        sink: IntersectionSink,
    ) -> Result<ObserverHandle, VisibilityError> {
        let mut shared = self.lock();
        if !shared.available {
            return Err(VisibilityError::Unavailable);
        }
        let handle = ObserverHandle(shared.next_handle);
        shared.next_handle += 1;
        shared.observers.insert(
            handle,
            ObserverSlot {
                options: options.clone(),
                sink,
                watched: HashMap::new(),
            },
        );
        log::debug!("Created geometric observer {:?}.", handle);
        Ok(handle)
    }

    fn observe(
        &mut self,
        observer: ObserverHandle,
        element: ElementId,
    ) -> Result<(), VisibilityError> {
        let mut guard = self.lock();
        let shared = &mut *guard;
        let slot = shared
            .observers
            .get_mut(&observer)
            .ok_or(VisibilityError::UnknownObserver(observer))?;

        // Unplaced elements get their first entry once they are laid out.
        let initial = shared.elements.get(&element).map(|rect| {
            measure(element, rect, &shared.viewport, &slot.options)
        });
        slot.watched.insert(element, initial.as_ref().map(|(_, state)| *state));
        if let Some((entry, _)) = initial {
            slot.sink.deliver(observer, vec![entry]);
        }
        Ok(())
    }

    fn unobserve(&mut self, observer: ObserverHandle, element: ElementId) {
        if let Some(slot) = self.lock().observers.get_mut(&observer) {
            slot.watched.remove(&element);
        }
    }

    fn disconnect(&mut self, observer: ObserverHandle) {
        if self.lock().observers.remove(&observer).is_some() {
            log::debug!("Disconnected geometric observer {:?}.", observer);
        }
    }
}

fn root_for(viewport: &Rect, options: &ObserverOptions) -> Rect {
    viewport.expand(&options.root_margin)
}

fn to_viewport_space(rect: &Rect, viewport: &Rect) -> Rect {
    Rect::new(rect.x - viewport.x, rect.y - viewport.y, rect.width, rect.height)
}

/// Fraction of `element` inside `root`. Zero-area elements count as fully
/// inside once they touch the root.
fn intersection_ratio(element: &Rect, root: &Rect) -> Option<f32> {
    let overlap = root.intersection(element)?;
    let area = element.area();
    if area <= 0.0 {
        return Some(1.0);
    }
    Some((overlap.area() / area).clamp(0.0, 1.0))
}

/// Number of thresholds at or below `ratio`.
fn threshold_band(ratio: f32, thresholds: &[f32]) -> usize {
    thresholds.iter().filter(|t| ratio >= **t).count()
}

fn measure(
    element: ElementId,
    rect: &Rect,
    viewport: &Rect,
    options: &ObserverOptions,
) -> (IntersectionEntry, Observed) {
    let root = root_for(viewport, options);
    let ratio = intersection_ratio(rect, &root);
    let intersecting = ratio.is_some();
    let ratio = ratio.unwrap_or(0.0);
    let band = if intersecting {
        threshold_band(ratio, &options.thresholds)
    } else {
        0
    };
    let entry = IntersectionEntry {
        element,
        is_intersecting: intersecting,
        intersection_ratio: ratio,
        bounding_rect: to_viewport_space(rect, viewport),
        root_bounds: Some(to_viewport_space(&root, viewport)),
    };
    (
        entry,
        Observed {
            band,
            intersecting,
            rect: *rect,
        },
    )
}

fn departed(
    element: ElementId,
    last_rect: Rect,
    viewport: &Rect,
    options: &ObserverOptions,
) -> IntersectionEntry {
    IntersectionEntry {
        element,
        is_intersecting: false,
        intersection_ratio: 0.0,
        bounding_rect: to_viewport_space(&last_rect, viewport),
        root_bounds: Some(to_viewport_space(&root_for(viewport, options), viewport)),
    }
}
