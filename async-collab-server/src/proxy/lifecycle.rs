//! Teardown paths: connection loss, session close, synchronization
//! lifecycle and dispose.

use collab_types::UserStatus;
use log::{debug, info};

use crate::engine::{ConnectionRef, SessionStatus};
use crate::messages;
use crate::user::UserRef;

use super::SessionProxy;

impl SessionProxy {
    /// The transport reports that `connection` left the subscription
    /// group, whether through graceful unsubscription, an inbound
    /// `session-unsubscribe`, or connection loss.
    ///
    /// The remaining subscribers are told that the connection's users are
    /// gone before any local state changes; the leaving peer itself is no
    /// longer reachable and gets nothing.
    pub fn member_removed(&mut self, connection: &ConnectionRef) {
        let Some(subscription) = self.registry.find(connection) else {
            // Already torn down, e.g. the session closed first.
            return;
        };
        let users: Vec<UserRef> = subscription.users.to_vec();
        for user in &users {
            self.session.send_to_subscriptions(&messages::user_status_change(
                user.id(),
                UserStatus::Unavailable,
            ));
        }
        self.teardown_subscription(connection);
    }

    /// Detach a subscription and everything hanging off it. Emits no
    /// frames; callers that still can reach their peers have announced
    /// the departure already.
    pub(crate) fn teardown_subscription(&mut self, connection: &ConnectionRef) {
        // Drain loop: the status observer detaches each user from the
        // record, so the head moves on every pass. The explicit retain
        // keeps the loop finite even for a user the observer no longer
        // tracks.
        loop {
            let head = self
                .registry
                .find(connection)
                .and_then(|s| s.users.first().cloned());
            let Some(user) = head else {
                break;
            };
            self.set_user_unavailable(&user);
            if let Some(sub) = self.registry.find_mut(connection) {
                sub.users.retain(|u| u.id() != user.id());
            }
        }
        if self.registry.remove(connection).is_some() {
            info!(
                "Removed subscription of connection {}",
                connection.remote_id()
            );
            self.update_idle();
            self.remove_subscription.emit(connection);
        }
    }

    /// The session was closed, by the engine or by the proxy itself.
    ///
    /// Remaining subscriptions are torn down without emitting frames the
    /// peers will never receive, local users become unavailable, and the
    /// subscription group is released last so that no emission can hit a
    /// freed group.
    pub fn session_closed(&mut self) {
        while let Some(connection) = self.registry.first_connection() {
            self.teardown_subscription(&connection);
        }
        while let Some(user) = self.local_users.first().cloned() {
            self.set_user_unavailable(&user);
            self.local_users.retain(|u| u.id() != user.id());
        }
        self.session.set_subscription_group(None);
        self.subscription_group = None;
        self.update_idle();
        info!("Session proxy shut down");
    }

    /// A synchronization towards `connection` has begun.
    pub fn synchronization_begin(&mut self, connection: &ConnectionRef) {
        debug!("Synchronization to {} started", connection.remote_id());
        self.update_idle();
    }

    /// A synchronization towards `connection` finished successfully.
    pub fn synchronization_complete(&mut self, connection: &ConnectionRef) {
        debug!("Synchronization to {} complete", connection.remote_id());
        self.update_idle();
    }

    /// A synchronization involving `connection` failed.
    ///
    /// If the session keeps running and the peer is still subscribed, the
    /// peer is dropped from the transport group; the member-removed
    /// notification then runs the normal teardown.
    pub fn synchronization_failed(&mut self, connection: &ConnectionRef) {
        debug!("Synchronization with {} failed", connection.remote_id());
        if self.session.status() == SessionStatus::Running && self.is_subscribed(connection) {
            if let Some(group) = self.subscription_group.clone() {
                group.remove_member(connection);
            }
        }
        self.update_idle();
    }
}

impl Drop for SessionProxy {
    fn drop(&mut self) {
        if self.session.status() != SessionStatus::Closed {
            self.session.close();
            self.session_closed();
        }
        self.observed.clear();
    }
}
