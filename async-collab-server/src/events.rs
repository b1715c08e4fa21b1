//! Listener fan-out for proxy events.
//!
//! The proxy exposes a handful of events collaborators (typically the
//! directory that created it) can observe. Each event is a [`Listeners`]
//! instance: a plain vector of callbacks invoked in registration order.
//! The reject-join hook is not one of these; it accumulates a verdict and
//! lives on [`crate::JoinAuthenticator`].

use crate::engine::ConnectionRef;

/// A set of callbacks for one event.
pub struct Listeners<A: ?Sized> {
    handlers: Vec<Box<dyn Fn(&A) + Send + Sync>>,
}

impl<A: ?Sized> Default for Listeners<A> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<A: ?Sized> Listeners<A> {
    /// Create an empty listener set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn connect(&mut self, handler: impl Fn(&A) + Send + Sync + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Invoke every callback in registration order.
    pub fn emit(&self, arg: &A) {
        for handler in &self.handlers {
            handler(arg);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// `true` if no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Payload of the add-subscription event.
pub struct SubscriptionEvent {
    /// The newly subscribed connection.
    pub connection: ConnectionRef,
    /// The directory-assigned sequence identifier of the subscription.
    pub seq_id: u32,
}
