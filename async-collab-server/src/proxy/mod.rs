//! The session proxy: one per logical editing session.

mod dispatch;
mod join;
mod lifecycle;

use std::sync::Arc;

use collab_types::{Error, ErrorCode};
use hashbrown::HashSet;
use log::{debug, info};
use tokio::sync::Notify;

use crate::authenticator::JoinAuthenticator;
use crate::engine::{ConnectionRef, GroupRef, SessionRef, SessionStatus};
use crate::events::{Listeners, SubscriptionEvent};
use crate::subscriptions::SubscriptionRegistry;
use crate::user::UserRef;

/// Coordinates the subscriptions, users and lifecycle of a single
/// session.
///
/// See the [crate docs](crate) for the threading model and the engine
/// event contract.
pub struct SessionProxy {
    registry: SubscriptionRegistry,
    local_users: Vec<UserRef>,
    /// Ids of users with an attached one-shot status observer.
    observed: HashSet<u32>,
    user_id_counter: u32,
    idle: bool,
    session: SessionRef,
    notify: Arc<Notify>,
    subscription_group: Option<GroupRef>,
    add_subscription: Listeners<SubscriptionEvent>,
    remove_subscription: Listeners<ConnectionRef>,
    idle_changed: Listeners<bool>,
    authenticators: Vec<Arc<dyn JoinAuthenticator>>,
}

impl SessionProxy {
    /// Create a proxy for `session`, delivering frames through
    /// `subscription_group` and signalling idle edges on `notify`.
    ///
    /// The group is handed to the engine so that
    /// broadcast traffic reaches every subscriber; it is taken away again
    /// when the session closes.
    pub fn new(notify: Arc<Notify>, session: SessionRef, subscription_group: GroupRef) -> Self {
        session.set_subscription_group(Some(subscription_group.clone()));
        let idle = !session.has_synchronizations();
        Self {
            registry: SubscriptionRegistry::new(),
            local_users: Vec::new(),
            observed: HashSet::new(),
            user_id_counter: 1,
            idle,
            session,
            notify,
            subscription_group: Some(subscription_group),
            add_subscription: Listeners::new(),
            remove_subscription: Listeners::new(),
            idle_changed: Listeners::new(),
            authenticators: Vec::new(),
        }
    }

    /// Get the underlying session engine.
    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    /// `true` iff no connection is subscribed, no local user is joined
    /// and the session runs no synchronization. A directory uses the
    /// transitions of this flag to decide when the session may be
    /// unloaded.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// `true` iff `connection` is subscribed to this session.
    pub fn is_subscribed(&self, connection: &ConnectionRef) -> bool {
        self.registry.find(connection).is_some()
    }

    /// `true` iff any connection is subscribed.
    pub fn has_subscriptions(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Iterate over the current subscriptions.
    pub fn subscriptions(&self) -> impl Iterator<Item = &crate::subscriptions::Subscription> {
        self.registry.iter()
    }

    /// Get the users joined directly at the server.
    pub fn local_users(&self) -> &[UserRef] {
        &self.local_users
    }

    /// Get the sequence identifier assigned to a subscribed connection.
    pub fn subscription_seq_id(&self, connection: &ConnectionRef) -> Option<u32> {
        self.registry.find(connection).map(|s| s.seq_id())
    }

    /// Register a callback for the add-subscription event. Fires after
    /// the subscription is recorded.
    pub fn connect_add_subscription(
        &mut self,
        handler: impl Fn(&SubscriptionEvent) + Send + Sync + 'static,
    ) {
        self.add_subscription.connect(handler);
    }

    /// Register a callback for the remove-subscription event. Fires after
    /// the subscription is removed.
    pub fn connect_remove_subscription(
        &mut self,
        handler: impl Fn(&ConnectionRef) + Send + Sync + 'static,
    ) {
        self.remove_subscription.connect(handler);
    }

    /// Register a callback for idle transitions. Fires exactly on edges.
    pub fn connect_idle_changed(&mut self, handler: impl Fn(&bool) + Send + Sync + 'static) {
        self.idle_changed.connect(handler);
    }

    /// Add a join authenticator. The join is rejected iff any registered
    /// authenticator vetoes it.
    pub fn add_authenticator(&mut self, authenticator: Arc<dyn JoinAuthenticator>) {
        self.authenticators.push(authenticator);
    }

    /// Subscribe `connection` to the session's change stream under the
    /// directory-assigned `seq_id`.
    ///
    /// With `synchronize` set, the current session state is pushed to the
    /// peer first; this requires a running session. The one caller that
    /// passes `synchronize = false` on a non-running session is the
    /// directory registering the synchronizing peer itself during session
    /// bring-up.
    pub fn subscribe_to(
        &mut self,
        connection: ConnectionRef,
        seq_id: u32,
        synchronize: bool,
    ) -> Result<(), Error> {
        let Some(group) = self.subscription_group.clone() else {
            return Err(Error::new(
                ErrorCode::SessionClosed,
                "cannot subscribe to a closed session",
            ));
        };
        if self.is_subscribed(&connection) {
            return Err(Error::new(
                ErrorCode::AlreadySubscribed,
                format!("connection {} is already subscribed", connection.remote_id()),
            ));
        }
        match self.session.status() {
            SessionStatus::Running => {}
            SessionStatus::Synchronizing if !synchronize => {}
            SessionStatus::Synchronizing => {
                return Err(Error::new(
                    ErrorCode::SessionSynchronizing,
                    "cannot push state while the session is still synchronizing",
                ));
            }
            SessionStatus::Closed => {
                return Err(Error::new(
                    ErrorCode::SessionClosed,
                    "cannot subscribe to a closed session",
                ));
            }
        }

        group.add_member(&connection);
        self.registry.add(connection.clone(), seq_id);
        info!(
            "Subscribed connection {} (seq-id {}) to session group \"{}\"",
            connection.remote_id(),
            seq_id,
            group.name()
        );
        self.update_idle();
        self.add_subscription.emit(&SubscriptionEvent {
            connection: connection.clone(),
            seq_id,
        });

        if synchronize {
            self.session.synchronize_to(&group, &connection);
            self.update_idle();
        }
        Ok(())
    }

    /// Gracefully unsubscribe `connection`.
    ///
    /// If a push-synchronization to the peer is still transferring state
    /// it is cancelled; otherwise the peer is told the session is going
    /// away with a `session-close` frame. Either way the connection is
    /// removed from the transport group, and the resulting member-removed
    /// notification drives the actual teardown.
    pub fn unsubscribe(&mut self, connection: &ConnectionRef) -> Result<(), Error> {
        match self.session.status() {
            SessionStatus::Running => {}
            SessionStatus::Synchronizing => {
                return Err(Error::new(
                    ErrorCode::SessionSynchronizing,
                    "cannot unsubscribe while the session is still synchronizing",
                ));
            }
            SessionStatus::Closed => {
                return Err(Error::new(
                    ErrorCode::SessionClosed,
                    "cannot unsubscribe from a closed session",
                ));
            }
        }
        let Some(group) = self.subscription_group.clone() else {
            return Err(Error::new(ErrorCode::SessionClosed, "no subscription group"));
        };
        if !self.is_subscribed(connection) {
            return Err(Error::new(
                ErrorCode::NotSubscribed,
                format!("connection {} is not subscribed", connection.remote_id()),
            ));
        }

        if self.session.synchronization_status(connection) == crate::engine::SyncStatus::InProgress
        {
            self.session.cancel_synchronization(connection);
        } else {
            group.send_message(connection, &crate::messages::session_close());
        }
        group.remove_member(connection);
        Ok(())
    }

    /// Recompute the idle flag and notify on edges.
    pub(crate) fn update_idle(&mut self) {
        let idle = self.registry.is_empty()
            && self.local_users.is_empty()
            && !self.session.has_synchronizations();
        if idle != self.idle {
            self.idle = idle;
            debug!("Session proxy idle changed to {}", idle);
            self.idle_changed.emit(&idle);
            self.notify.notify_waiters();
        }
    }
}
