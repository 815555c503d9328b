//! Event bus for scorekit services
//!
//! A thin wrapper over a tokio broadcast channel. Each service defines its own
//! event enum and instantiates `EventBus<ThatEvent>`; the bus itself is
//! agnostic of the payload.

use tokio::sync::broadcast;

/// Broadcast event bus
///
/// Cloning an `EventBus` yields another handle to the same channel.
#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers start
    ///   lagging (oldest events are dropped for them)
    ///
    /// # Examples
    ///
    /// ```
    /// use scorekit_common::EventBus;
    ///
    /// let event_bus: EventBus<String> = EventBus::new(100);
    /// let mut rx = event_bus.subscribe();
    /// event_bus.emit_lossy("ready".to_string());
    /// assert_eq!(rx.try_recv().unwrap(), "ready");
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(n)` with the number of subscribers reached.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: E) -> Result<usize, broadcast::error::SendError<E>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events are advisory: a job keeps running whether or not
    /// anyone is watching.
    pub fn emit_lossy(&self, event: E) {
        if self.emit(event).is_err() {
            tracing::trace!("Event dropped, no subscribers");
        }
    }
}
