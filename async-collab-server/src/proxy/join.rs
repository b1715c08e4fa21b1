//! The user join/rejoin pipeline and the per-user bookkeeping the proxy
//! performs as users come and go.

use collab_types::{Error, ErrorCode, SeqToken, UserFlags, UserStatus};
use collab_xml::XmlFrame;
use log::{error, info, warn};

use crate::engine::{ConnectionRef, SessionStatus};
use crate::messages;
use crate::props::{PropValue, UserProps, PROP_CONNECTION, PROP_FLAGS, PROP_ID, PROP_NAME, PROP_STATUS};
use crate::request::UserJoinRequest;
use crate::user::UserRef;

use super::SessionProxy;

impl SessionProxy {
    /// Join a user directly at the server, with no originating peer
    /// connection. The resulting user carries the `LOCAL` flag.
    ///
    /// The returned request completes before this method returns; see
    /// [`UserJoinRequest::recv`].
    pub fn join_user(&mut self, props: UserProps) -> UserJoinRequest {
        let (sender, request) = UserJoinRequest::channel();
        let result = self.perform_user_join(props, None, None);
        // The receiver is still alive at this point, it is in `request`.
        let _ = sender.send(result);
        request
    }

    /// Run the ordered join pipeline. `connection` is the originating
    /// peer (`None` for server-side joins); `seq` is the reply
    /// correlation token for remote joins.
    pub(crate) fn perform_user_join(
        &mut self,
        mut props: UserProps,
        connection: Option<ConnectionRef>,
        seq: Option<SeqToken>,
    ) -> Result<UserRef, Error> {
        // 1. The proposal must name the user.
        let name = props
            .string(PROP_NAME)
            .ok_or_else(|| Error::no_such_attribute(PROP_NAME))?
            .to_owned();

        // 2. An available user owning the name blocks the join; an
        // unavailable one becomes the rejoin candidate.
        let rejoin = match self.session.user_table().find_by_name(&name) {
            Some(user) if user.status().is_available() => {
                return Err(Error::new(
                    ErrorCode::NameInUse,
                    format!("name \"{name}\" is already in use"),
                ));
            }
            other => other,
        };

        // 3. The id is server-chosen: the candidate's on rejoin, the next
        // counter value on a fresh join.
        if props.contains(PROP_ID) {
            return Err(Error::invalid_attribute(PROP_ID));
        }
        let id = rejoin
            .as_ref()
            .map(|u| u.id())
            .unwrap_or(self.user_id_counter);
        props.set(PROP_ID, PropValue::UInt(id));

        // 4. Status defaults to active; joining as unavailable makes no
        // sense.
        let status = if let Some(value) = props.get(PROP_STATUS) {
            match value {
                PropValue::Status(UserStatus::Unavailable) => {
                    return Err(Error::new(
                        ErrorCode::InvalidAttribute,
                        "a user cannot join with status \"unavailable\"",
                    ));
                }
                PropValue::Status(status) => *status,
                _ => return Err(Error::invalid_attribute(PROP_STATUS)),
            }
        } else {
            props.set(PROP_STATUS, PropValue::Status(UserStatus::Active));
            UserStatus::Active
        };

        // 5. / 6. Flags and connection are server-assigned.
        if props.contains(PROP_FLAGS) {
            return Err(Error::invalid_attribute(PROP_FLAGS));
        }
        let flags = if connection.is_none() {
            UserFlags::LOCAL
        } else {
            UserFlags::empty()
        };
        props.set(PROP_FLAGS, PropValue::Flags(flags));
        if props.contains(PROP_CONNECTION) {
            return Err(Error::invalid_attribute(PROP_CONNECTION));
        }
        props.set(PROP_CONNECTION, PropValue::Connection(connection.clone()));

        // 7. Session-level validation, excluding the candidate so it does
        // not collide with itself.
        self.session.validate_user_props(&props, rejoin.as_ref())?;

        // 8. The authenticator veto.
        if self
            .authenticators
            .iter()
            .any(|a| a.reject_user_join(connection.as_ref(), &props, rejoin.as_ref()))
        {
            return Err(Error::new(
                ErrorCode::NotAuthorized,
                format!("join of \"{name}\" was rejected"),
            ));
        }

        // 9. Apply and announce.
        let (user, element) = match rejoin {
            None => {
                let user = self.session.add_user(&props)?;
                self.user_added(&user);
                (user, messages::USER_JOIN)
            }
            Some(user) => {
                user.set_status(status);
                user.set_flags(flags);
                user.set_connection(connection.clone());
                (user, messages::USER_REJOIN)
            }
        };
        let mut frame = XmlFrame::new(element);
        self.session.write_user_props(&user, &mut frame);
        messages::apply_seq(&mut frame, seq);
        self.session.send_to_subscriptions(&frame);

        // 10. Track the user: status observer, plus the membership list
        // its availability hangs off.
        self.observed.insert(user.id());
        match &connection {
            Some(conn) => {
                if let Some(sub) = self.registry.find_mut(conn) {
                    if !sub.users.iter().any(|u| u.id() == user.id()) {
                        sub.users.push(user.clone());
                    }
                }
            }
            None => {
                if !self.local_users.iter().any(|u| u.id() == user.id()) {
                    self.local_users.push(user.clone());
                }
                self.update_idle();
            }
        }
        info!(
            "User \"{}\" (id {}) {} the session{}",
            user.name(),
            user.id(),
            if element == messages::USER_JOIN {
                "joined"
            } else {
                "rejoined"
            },
            match &connection {
                Some(c) => format!(" via {}", c.remote_id()),
                None => " locally".to_owned(),
            }
        );
        Ok(user)
    }

    /// Bookkeeping for a user record inserted into the session's user
    /// table, both by the join pipeline and by the engine during bring-up
    /// synchronization.
    ///
    /// Keeps the id counter strictly above every known id. While the
    /// session is synchronizing, an available user may only arrive
    /// through the already-subscribed synchronizing connection; anything
    /// else is a protocol violation that closes the session.
    pub fn user_added(&mut self, user: &UserRef) {
        self.user_id_counter = self.user_id_counter.max(user.id() + 1);

        if self.session.status() != SessionStatus::Synchronizing || !user.status().is_available() {
            return;
        }
        let subscribed = user
            .connection()
            .filter(|conn| self.registry.find(conn).is_some());
        match subscribed {
            Some(conn) => {
                if let Some(sub) = self.registry.find_mut(&conn) {
                    if !sub.users.iter().any(|u| u.id() == user.id()) {
                        sub.users.push(user.clone());
                    }
                }
                self.observed.insert(user.id());
            }
            None => {
                error!(
                    "Available user \"{}\" (id {}) added during synchronization without a \
                     subscribed connection; closing session",
                    user.name(),
                    user.id()
                );
                self.session.close();
                self.session_closed();
            }
        }
    }

    /// One-shot status observer, fired for every status transition of a
    /// tracked user. Transitions to unavailable detach the user from its
    /// membership list and drop the observer; everything else is ignored.
    pub fn user_status_changed(&mut self, user: &UserRef) {
        if !self.observed.contains(&user.id()) || user.status().is_available() {
            return;
        }
        self.observed.remove(&user.id());

        if let Some(conn) = user.connection() {
            if let Some(sub) = self.registry.find_mut(&conn) {
                sub.users.retain(|u| u.id() != user.id());
            } else {
                warn!(
                    "User \"{}\" (id {}) became unavailable on an unknown connection",
                    user.name(),
                    user.id()
                );
            }
            user.set_connection(None);
        } else {
            self.local_users.retain(|u| u.id() != user.id());
            self.update_idle();
        }
    }

    /// Make a user unavailable on the proxy's own initiative (connection
    /// loss, unsubscription, session close) and run the status observer.
    pub(crate) fn set_user_unavailable(&mut self, user: &UserRef) {
        user.set_status(UserStatus::Unavailable);
        self.user_status_changed(user);
    }
}
