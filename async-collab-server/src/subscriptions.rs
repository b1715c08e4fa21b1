//! The registry of peer connections subscribed to the session's change
//! stream.

use crate::engine::ConnectionRef;
use crate::user::UserRef;

/// Membership of one peer connection in the session's change stream.
pub struct Subscription {
    connection: ConnectionRef,
    seq_id: u32,
    /// The users joined via this connection. Detached one by one as they
    /// become unavailable.
    pub(crate) users: Vec<UserRef>,
}

impl Subscription {
    /// Get the subscribed connection.
    pub fn connection(&self) -> &ConnectionRef {
        &self.connection
    }

    /// Get the directory-assigned sequence identifier used to build reply
    /// correlation tokens.
    pub fn seq_id(&self) -> u32 {
        self.seq_id
    }

    /// Get the users joined via this connection.
    pub fn users(&self) -> &[UserRef] {
        &self.users
    }
}

/// The set of current subscriptions, keyed by connection identity.
///
/// Lookups are linear; cardinality is bounded by the number of peers
/// subscribed to one session.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the subscription for a connection.
    pub fn find(&self, connection: &ConnectionRef) -> Option<&Subscription> {
        self.entries
            .iter()
            .find(|s| s.connection.id() == connection.id())
    }

    /// Find the subscription for a connection, mutably.
    pub(crate) fn find_mut(&mut self, connection: &ConnectionRef) -> Option<&mut Subscription> {
        self.entries
            .iter_mut()
            .find(|s| s.connection.id() == connection.id())
    }

    /// Record a new subscription. The caller guarantees the connection is
    /// not yet subscribed.
    pub(crate) fn add(&mut self, connection: ConnectionRef, seq_id: u32) {
        debug_assert!(self.find(&connection).is_none());
        self.entries.push(Subscription {
            connection,
            seq_id,
            users: Vec::new(),
        });
    }

    /// Remove the subscription for a connection, returning it.
    pub(crate) fn remove(&mut self, connection: &ConnectionRef) -> Option<Subscription> {
        let idx = self
            .entries
            .iter()
            .position(|s| s.connection.id() == connection.id())?;
        Some(self.entries.remove(idx))
    }

    /// Get the connection of the first remaining subscription. Teardown
    /// drains the registry through this.
    pub(crate) fn first_connection(&self) -> Option<ConnectionRef> {
        self.entries.first().map(|s| s.connection.clone())
    }

    /// Iterate over the subscriptions.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    /// `true` if no connection is subscribed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
