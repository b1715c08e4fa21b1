//! Capability interfaces the proxy is written against: the peer
//! connection, the transport-level subscription group and the session
//! engine itself.

use std::fmt::{self, Display};
use std::sync::Arc;

use collab_types::Error;
use collab_xml::XmlFrame;

use crate::props::UserProps;
use crate::user::{UserRef, UserTable};

/// Opaque identity of a peer connection. Two connection handles refer to
/// the same peer iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A remote peer connection.
pub trait Connection: Send + Sync {
    /// Get the identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Get a human-readable identifier of the remote peer, for logging.
    fn remote_id(&self) -> &str;
}

/// Shared handle to a peer connection.
pub type ConnectionRef = Arc<dyn Connection>;

/// The transport-level multicast group delivering session frames to all
/// subscribed peers.
///
/// Membership changes are asynchronous on real transports: after
/// [`SubscriptionGroup::remove_member`] the transport must deliver
/// [`SessionProxy::member_removed`](crate::SessionProxy::member_removed)
/// exactly once for that connection. The proxy never assumes the
/// notification arrives synchronously.
pub trait SubscriptionGroup: Send + Sync {
    /// Get the name of this group.
    fn name(&self) -> &str;

    /// Add a connection to the group.
    fn add_member(&self, connection: &ConnectionRef);

    /// Remove a connection from the group.
    fn remove_member(&self, connection: &ConnectionRef);

    /// Send a frame to a single group member.
    fn send_message(&self, connection: &ConnectionRef, frame: &XmlFrame);
}

/// Shared handle to a subscription group.
pub type GroupRef = Arc<dyn SubscriptionGroup>;

/// Lifecycle state of the underlying session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session is still receiving its initial state from a remote
    /// peer (bring-up).
    Synchronizing,
    /// The session is live.
    Running,
    /// The session has been closed.
    Closed,
}

/// State of a push-synchronization towards one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No synchronization with this connection.
    None,
    /// State is still being transferred.
    InProgress,
    /// All state has been sent; waiting for the peer's acknowledgement.
    AwaitingAck,
}

/// Whether the transport may relay an inbound frame to the other group
/// members, or must treat it as point-to-point traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryScope {
    /// The frame concerns only the sender; do not relay.
    PointToPoint,
    /// The frame is part of the session stream; relay to the group.
    Group,
}

/// The underlying collaborative session.
///
/// The engine owns the document, the user table and the synchronization
/// machinery; the proxy owns membership. Mutations the engine performs
/// outside a proxy call must be routed back to the proxy by whatever
/// drives both:
///
/// - a user record inserted into the table (for example during bring-up
///   synchronization) → [`SessionProxy::user_added`],
/// - a status the engine assigns to a user →
///   [`SessionProxy::user_status_changed`],
/// - an external close → [`SessionProxy::session_closed`],
/// - synchronization lifecycle →
///   [`SessionProxy::synchronization_begin`] /
///   [`SessionProxy::synchronization_complete`] /
///   [`SessionProxy::synchronization_failed`].
///
/// The engine never calls into the proxy directly; that keeps both sides
/// single-threaded run-to-completion.
///
/// [`SessionProxy::user_added`]: crate::SessionProxy::user_added
/// [`SessionProxy::user_status_changed`]: crate::SessionProxy::user_status_changed
/// [`SessionProxy::session_closed`]: crate::SessionProxy::session_closed
/// [`SessionProxy::synchronization_begin`]: crate::SessionProxy::synchronization_begin
/// [`SessionProxy::synchronization_complete`]: crate::SessionProxy::synchronization_complete
/// [`SessionProxy::synchronization_failed`]: crate::SessionProxy::synchronization_failed
pub trait SessionEngine: Send + Sync {
    /// Get the lifecycle state of the session.
    fn status(&self) -> SessionStatus;

    /// Close the session. Idempotent; only flips the engine's state. The
    /// caller is responsible for running the proxy's close path.
    fn close(&self);

    /// Get the session's user table.
    fn user_table(&self) -> &UserTable;

    /// Hand the subscription group to the engine, or take it away at
    /// teardown. Frames broadcast with
    /// [`SessionEngine::send_to_subscriptions`] go to this group.
    fn set_subscription_group(&self, group: Option<GroupRef>);

    /// Broadcast a frame to every current member of the subscription
    /// group.
    fn send_to_subscriptions(&self, frame: &XmlFrame);

    /// Validate a fully-filled property bag before a user is created or
    /// resurrected from it. `exclude` is the rejoin candidate, which must
    /// not count as a name or id collision with itself.
    fn validate_user_props(&self, props: &UserProps, exclude: Option<&UserRef>)
        -> Result<(), Error>;

    /// Extract the session-specific user properties from an inbound
    /// `user-join` frame. `connection` is the originating peer, if any.
    fn read_user_props(
        &self,
        frame: &XmlFrame,
        connection: Option<&ConnectionRef>,
    ) -> Result<UserProps, Error>;

    /// Append the full serialized state of `user` to an outbound frame.
    fn write_user_props(&self, user: &UserRef, frame: &mut XmlFrame);

    /// Construct a new user from a validated property bag and insert it
    /// into the user table. Does not notify the proxy; the caller invokes
    /// [`SessionProxy::user_added`](crate::SessionProxy::user_added).
    fn add_user(&self, props: &UserProps) -> Result<UserRef, Error>;

    /// `true` while any synchronization, in either direction, is ongoing.
    fn has_synchronizations(&self) -> bool;

    /// Get the state of the push-synchronization towards `connection`.
    fn synchronization_status(&self, connection: &ConnectionRef) -> SyncStatus;

    /// Cancel an in-progress synchronization towards `connection`.
    fn cancel_synchronization(&self, connection: &ConnectionRef);

    /// Begin pushing the session state into `group`, addressed to
    /// `connection`.
    fn synchronize_to(&self, group: &GroupRef, connection: &ConnectionRef);

    /// Process a frame that the proxy does not own: synchronization
    /// traffic and session operations.
    fn receive_frame(
        &self,
        connection: &ConnectionRef,
        frame: &XmlFrame,
    ) -> Result<DeliveryScope, Error>;
}

/// Shared handle to a session engine.
pub type SessionRef = Arc<dyn SessionEngine>;
