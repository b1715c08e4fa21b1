//! User records and the session user table.

use std::fmt;
use std::sync::Arc;

use collab_types::{Error, UserFlags, UserStatus};
use collab_xml::XmlFrame;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::engine::ConnectionRef;
use crate::props::{UserProps, PROP_CONNECTION, PROP_FLAGS, PROP_ID, PROP_NAME, PROP_STATUS};

/// A user joined to a session.
///
/// Records are owned by the session's [`UserTable`] and live there for the
/// session's entire lifetime; a user that leaves becomes
/// [`UserStatus::Unavailable`] rather than being removed, so a later join
/// under the same name resurrects it with the original id.
pub struct User {
    id: u32,
    name: String,
    status: RwLock<UserStatus>,
    flags: RwLock<UserFlags>,
    connection: RwLock<Option<ConnectionRef>>,
}

/// Shared handle to a user record.
pub type UserRef = Arc<User>;

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .field("flags", &self.flags())
            .field("connection", &self.connection().map(|c| c.id()))
            .finish()
    }
}

impl User {
    /// Construct a user from a fully-filled property bag. The join
    /// pipeline guarantees `name`, `id` and `status` are present.
    pub fn from_props(props: &UserProps) -> Result<Self, Error> {
        let name = props
            .string(PROP_NAME)
            .ok_or_else(|| Error::no_such_attribute(PROP_NAME))?
            .to_owned();
        let id = props
            .uint(PROP_ID)
            .ok_or_else(|| Error::no_such_attribute(PROP_ID))?;
        let status = props
            .status(PROP_STATUS)
            .ok_or_else(|| Error::no_such_attribute(PROP_STATUS))?;
        let flags = props.flags(PROP_FLAGS).unwrap_or_default();
        let connection = props.connection(PROP_CONNECTION).unwrap_or(None);
        Ok(Self {
            id,
            name,
            status: RwLock::new(status),
            flags: RwLock::new(flags),
            connection: RwLock::new(connection),
        })
    }

    /// Get the session-unique id of this user. Stable across rejoins.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the name of this user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current status of this user.
    pub fn status(&self) -> UserStatus {
        *self.status.read()
    }

    /// Assign a new status. The proxy reacts to transitions through its
    /// status-change entry point, not here.
    pub fn set_status(&self, status: UserStatus) {
        *self.status.write() = status;
    }

    /// Get the flag set of this user.
    pub fn flags(&self) -> UserFlags {
        *self.flags.read()
    }

    /// Assign a new flag set.
    pub fn set_flags(&self, flags: UserFlags) {
        *self.flags.write() = flags;
    }

    /// `true` if this user was joined directly at the server.
    pub fn is_local(&self) -> bool {
        self.flags().contains(UserFlags::LOCAL)
    }

    /// Get the connection this user is reachable through, or `None` for
    /// local users and users whose connection has gone away.
    pub fn connection(&self) -> Option<ConnectionRef> {
        self.connection.read().clone()
    }

    /// Assign the connection this user is reachable through.
    pub fn set_connection(&self, connection: Option<ConnectionRef>) {
        *self.connection.write() = connection;
    }

    /// Append the base wire attributes (`id`, `name`, `status`) to an
    /// outbound frame.
    pub fn write_xml_attrs(&self, frame: &mut XmlFrame) {
        frame.set_attribute(PROP_ID, self.id.to_string());
        frame.set_attribute(PROP_NAME, self.name.clone());
        frame.set_attribute(PROP_STATUS, self.status().as_str());
    }
}

/// The session's user table.
///
/// Owned by the session engine; the proxy and its subscriptions only hold
/// references into it. Users are inserted once and never removed.
#[derive(Default)]
pub struct UserTable {
    users: RwLock<HashMap<u32, UserRef>>,
}

impl UserTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user, returning the shared handle. Replaces nothing; ids
    /// are unique by construction.
    pub fn insert(&self, user: User) -> UserRef {
        let user = Arc::new(user);
        self.users.write().insert(user.id, user.clone());
        user
    }

    /// Find a user by id.
    pub fn find_by_id(&self, id: u32) -> Option<UserRef> {
        self.users.read().get(&id).cloned()
    }

    /// Find a user by name, available or not. Linear over the table;
    /// cardinality is bounded by session membership.
    pub fn find_by_name(&self, name: &str) -> Option<UserRef> {
        self.users
            .read()
            .values()
            .find(|u| u.name == name)
            .cloned()
    }

    /// Snapshot all user records.
    pub fn snapshot(&self) -> Vec<UserRef> {
        self.users.read().values().cloned().collect()
    }

    /// Number of users ever joined.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// `true` if no user has ever joined.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}
