//! Completion handle for server-initiated user joins.

use collab_types::{Error, ErrorCode};
use log::warn;
use tokio::sync::oneshot;

use crate::user::UserRef;

/// Handle returned by [`SessionProxy::join_user`](crate::SessionProxy::join_user).
///
/// The proxy runs the join to completion before returning the handle, so
/// [`UserJoinRequest::recv`] resolves immediately; the channel shape just
/// keeps the API uniform with requests that genuinely take time.
pub struct UserJoinRequest {
    recv: oneshot::Receiver<Result<UserRef, Error>>,
}

impl UserJoinRequest {
    pub(crate) fn channel() -> (oneshot::Sender<Result<UserRef, Error>>, Self) {
        let (send, recv) = oneshot::channel();
        (send, Self { recv })
    }

    /// Get the request type.
    pub fn kind(&self) -> &'static str {
        "user-join"
    }

    /// Receive the outcome of the join: the new or resurrected user, or
    /// the error that failed the pipeline.
    pub async fn recv(self) -> Result<UserRef, Error> {
        match self.recv.await {
            Ok(result) => result,
            Err(_) => {
                // This shouldn't be possible at all.
                warn!("Failed to receive response to user-join request, sender dropped.");
                Err(Error::new(
                    ErrorCode::Internal,
                    "user-join request was dropped before completion",
                ))
            }
        }
    }
}
