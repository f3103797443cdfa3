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

//! Abstractions over the host environment.
//!
//! The runtime never talks to the operating system, the graphics stack or
//! the page layout directly. Everything it needs from the host goes through
//! the traits below; `lucent-infra` provides the concrete implementations.

use crate::capability::HostHints;
use crate::visibility::{
    ElementId, IntersectionBatch, IntersectionEntry, ObserverHandle, ObserverOptions,
    VisibilityError,
};

/// Errors raised while probing the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// The host does not expose the requested information.
    #[error("host information unavailable: {0}")]
    Unavailable(String),
    /// Creating a graphics context failed.
    #[error("graphics probe failed: {0}")]
    Graphics(String),
}

/// Source of raw device hints.
pub trait HintSource: Send + Sync {
    /// Reads the current hints. Called once per engine.
    fn hints(&self) -> Result<HostHints, ProbeError>;
}

/// Detects hardware-accelerated graphics.
pub trait GraphicsProbe: Send + Sync {
    /// Creates and tears down a throwaway graphics context.
    ///
    /// Returns `Ok(false)` when only a software path exists.
    fn probe_acceleration(&self) -> Result<bool, ProbeError>;
}

/// A monotonic clock driving frame timestamps.
pub trait FrameClock: Send + Sync {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> f64;

    /// Granularity of [`now_ms`](Self::now_ms), if known.
    ///
    /// The performance monitor refuses to adapt on clocks coarser than its
    /// configured limit.
    fn resolution_ms(&self) -> Option<f64>;
}

/// Sending half through which observer backends deliver notifications.
///
/// Cheap to clone and safe to use from any thread. Deliveries are queued
/// and only processed when the visibility tracker flushes.
#[derive(Debug, Clone)]
pub struct IntersectionSink {
    sender: flume::Sender<IntersectionBatch>,
}

impl IntersectionSink {
    /// Wraps the sending half of a channel.
    pub fn new(sender: flume::Sender<IntersectionBatch>) -> Self {
        Self { sender }
    }

    /// Queues a batch of entries produced by `observer`.
    ///
    /// Returns `false` if the tracker is gone.
    pub fn deliver(&self, observer: ObserverHandle, entries: Vec<IntersectionEntry>) -> bool {
        if entries.is_empty() {
            return true;
        }
        self.sender
            .send(IntersectionBatch { observer, entries })
            .is_ok()
    }
}

/// Host viewport-observation primitive.
///
/// One backend observer corresponds to one normalized option set; the
/// tracker multiplexes every subscription with equal options onto it.
pub trait ObserverBackend: Send {
    /// Returns `false` when the host cannot observe visibility at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Creates an observer. Notifications go to `sink`.
    fn create(
        &mut self,
        options: &ObserverOptions,
        sink: IntersectionSink,
    ) -> Result<ObserverHandle, VisibilityError>;

    /// Starts observing `element`. The backend delivers an initial entry.
    fn observe(
        &mut self,
        observer: ObserverHandle,
        element: ElementId,
    ) -> Result<(), VisibilityError>;

    /// Stops observing `element`.
    fn unobserve(&mut self, observer: ObserverHandle, element: ElementId);

    /// Tears the observer down.
    fn disconnect(&mut self, observer: ObserverHandle);
}
