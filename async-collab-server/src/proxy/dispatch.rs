//! Classification of inbound frames into proxy-owned messages and
//! session-forwarded traffic.

use collab_types::{Error, ErrorCode, SeqToken};
use collab_xml::XmlFrame;
use log::warn;

use crate::engine::{ConnectionRef, DeliveryScope, SyncStatus};
use crate::messages;

use super::SessionProxy;

impl SessionProxy {
    /// Process a frame received from a subscribed connection.
    ///
    /// Synchronization traffic and session operations are forwarded to
    /// the engine verbatim. The proxy owns exactly two messages:
    /// `user-join`, which runs the join pipeline and replies with
    /// `request-failed` on error, and `session-unsubscribe`, which drops
    /// the sender from the transport group so that the member-removed
    /// notification performs the teardown. Proxy-owned messages are never
    /// relayed.
    ///
    /// The returned error is a protocol fault the transport should act
    /// on; per-request failures are reported to the peer in-band and
    /// yield `Ok`.
    pub fn receive_message(
        &mut self,
        connection: &ConnectionRef,
        frame: &XmlFrame,
    ) -> Result<DeliveryScope, Error> {
        if !self.is_subscribed(connection) {
            return Err(Error::new(
                ErrorCode::NotSubscribed,
                format!(
                    "received \"{}\" from unsubscribed connection {}",
                    frame.name(),
                    connection.remote_id()
                ),
            ));
        }
        if self.session.synchronization_status(connection) != SyncStatus::None {
            return self.session.receive_frame(connection, frame);
        }

        match frame.name() {
            messages::USER_JOIN => self.receive_user_join(connection, frame),
            messages::SESSION_UNSUBSCRIBE => {
                if let Some(group) = self.subscription_group.clone() {
                    group.remove_member(connection);
                }
                Ok(DeliveryScope::PointToPoint)
            }
            _ => self.session.receive_frame(connection, frame),
        }
    }

    fn receive_user_join(
        &mut self,
        connection: &ConnectionRef,
        frame: &XmlFrame,
    ) -> Result<DeliveryScope, Error> {
        // A malformed seq leaves nothing to correlate a reply with; that
        // is a protocol fault, not a failed request.
        let seq_id = self
            .subscription_seq_id(connection)
            .unwrap_or_default();
        let seq = frame
            .uint_attribute(messages::ATTR_SEQ)
            .map_err(|e| Error::new(ErrorCode::InvalidNumber, e.to_string()))?
            .map(|seq| SeqToken::new(seq_id, seq));

        let props = self.session.read_user_props(frame, Some(connection));
        let result =
            props.and_then(|props| self.perform_user_join(props, Some(connection.clone()), seq));
        if let Err(error) = result {
            warn!(
                "User join from {} failed: {}",
                connection.remote_id(),
                error
            );
            if let Some(group) = &self.subscription_group {
                group.send_message(connection, &messages::request_failed(&error, seq));
            }
        }
        Ok(DeliveryScope::PointToPoint)
    }
}
