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

/// A generic, thread-safe message channel with one logical owner.
///
/// The bus is generic over the message type `T` so that `lucent-core`
/// stays decoupled from the concrete inbox messages defined by higher-level
/// crates.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a new bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends a message, logging an error if the receiver is gone.
    ///
    /// The bus owns its receiver, so this only fails if the bus itself is
    /// being torn down.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing an event.");
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sending end.
    ///
    /// Hand this to producers; it is `Send` and can outlive borrows of the bus.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiving end.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every message queued so far, oldest first.
    ///
    /// Messages published while the returned vector is processed stay queued
    /// for the next drain.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no message is queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Moved { x: i32, y: i32 },
        Left,
    }

    #[test]
    fn event_bus_creation() {
        let bus = EventBus::<TestEvent>::new();
        let _sender = bus.sender();
        assert!(bus.is_empty());
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();
        assert!(matches!(bus.receiver().try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn drain_preserves_order() {
        let bus = EventBus::<TestEvent>::new();
        bus.publish(TestEvent::Moved { x: 1, y: 2 });
        bus.publish(TestEvent::Left);
        bus.publish(TestEvent::Moved { x: 3, y: 4 });
        assert_eq!(bus.len(), 3);

        let drained = bus.drain();
        assert_eq!(
            drained,
            vec![
                TestEvent::Moved { x: 1, y: 2 },
                TestEvent::Left,
                TestEvent::Moved { x: 3, y: 4 },
            ]
        );
        assert!(bus.is_empty());
    }

    #[test]
    fn send_from_other_threads() {
        let bus = EventBus::<TestEvent>::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = bus.sender();
                thread::spawn(move || {
                    sender
                        .send(TestEvent::Moved { x: i, y: i })
                        .expect("Send should succeed");
                })
            })
            .collect();
        for h in handles {
            h.join().expect("Producer thread panicked");
        }
        assert_eq!(bus.drain().len(), 4);
    }
}
