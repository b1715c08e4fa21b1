//! Server-side session proxy for the collab session substrate.
//!
//! One [`SessionProxy`] manages exactly one logical editing session. It
//! tracks the peer connections subscribed to the session's change stream,
//! coordinates user joins and rejoins (including id allocation, name
//! uniqueness and the authenticator veto hook), derives the `idle` flag a
//! directory uses to decide when a session may be unloaded, and classifies
//! inbound frames into proxy-owned messages and session-forwarded traffic.
//!
//! The session engine, the peer connections and the transport group are
//! capability traits ([`SessionEngine`], [`Connection`],
//! [`SubscriptionGroup`]); the proxy is fully specified against those
//! interfaces and never touches a socket or a document itself.
//!
//! All proxy state is mutated through `&mut self` entry points that run to
//! completion; the expectation is a single-threaded reactor driving both
//! the proxy and its session engine. Callers that need cross-thread access
//! wrap the proxy in `Arc<RwLock<...>>` the same way they would any other
//! single-session coordinator.

mod authenticator;
mod engine;
mod events;
pub mod messages;
mod props;
mod proxy;
mod request;
mod subscriptions;
mod user;

pub use authenticator::{DefaultJoinAuthenticator, JoinAuthenticator};
pub use engine::{
    Connection, ConnectionId, ConnectionRef, DeliveryScope, GroupRef, SessionEngine, SessionRef,
    SessionStatus, SubscriptionGroup, SyncStatus,
};
pub use events::{Listeners, SubscriptionEvent};
pub use props::{PropValue, UserProps, PROP_CONNECTION, PROP_FLAGS, PROP_ID, PROP_NAME, PROP_STATUS};
pub use proxy::SessionProxy;
pub use request::UserJoinRequest;
pub use subscriptions::Subscription;
pub use user::{User, UserRef, UserTable};
