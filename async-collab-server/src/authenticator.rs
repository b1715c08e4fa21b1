//! The [`JoinAuthenticator`] trait, the extensible veto hook invoked once
//! per join attempt.

use crate::engine::ConnectionRef;
use crate::props::UserProps;
use crate::user::UserRef;

/// Decides whether a proposed user join is allowed.
///
/// A proxy can carry any number of authenticators; the join is rejected
/// iff any of them returns `true` (short-circuit). The default
/// implementation accepts everything, so an authenticator only overrides
/// the cases it cares about.
///
/// Authenticators observe the proposed properties after the proxy has
/// filled in the server-chosen entries (`id`, `status`, `flags`,
/// `connection`); they must not mutate them.
pub trait JoinAuthenticator: Send + Sync + 'static {
    /// Return `true` to veto the join. `connection` is the originating
    /// peer (`None` for server-side joins) and `rejoin` is the
    /// unavailable user this join would resurrect, if any.
    fn reject_user_join(
        &self,
        connection: Option<&ConnectionRef>,
        props: &UserProps,
        rejoin: Option<&UserRef>,
    ) -> bool {
        let _ = (connection, props, rejoin);
        false
    }
}

/// The accepting default authenticator.
pub struct DefaultJoinAuthenticator;

impl JoinAuthenticator for DefaultJoinAuthenticator {}
