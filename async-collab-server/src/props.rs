//! The keyed property bag passed through the join pipeline.

use std::fmt;

use collab_types::{Error, UserFlags, UserStatus};
use collab_xml::XmlFrame;

use crate::engine::ConnectionRef;

/// Property key for the user name.
pub const PROP_NAME: &str = "name";
/// Property key for the server-chosen user id.
pub const PROP_ID: &str = "id";
/// Property key for the user status.
pub const PROP_STATUS: &str = "status";
/// Property key for the server-assigned flag set.
pub const PROP_FLAGS: &str = "flags";
/// Property key for the originating connection.
pub const PROP_CONNECTION: &str = "connection";

/// A single property value.
#[derive(Clone)]
pub enum PropValue {
    /// A string value.
    String(String),
    /// An unsigned integer value.
    UInt(u32),
    /// A user status value.
    Status(UserStatus),
    /// A user flag set.
    Flags(UserFlags),
    /// A connection handle, or none for local users.
    Connection(Option<ConnectionRef>),
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Self::Status(v) => f.debug_tuple("Status").field(v).finish(),
            Self::Flags(v) => f.debug_tuple("Flags").field(v).finish(),
            Self::Connection(Some(c)) => f.debug_tuple("Connection").field(&c.id()).finish(),
            Self::Connection(None) => f.debug_tuple("Connection").field(&"local").finish(),
        }
    }
}

/// An ordered, keyed bag of proposed user properties.
///
/// The join pipeline both reads client-supplied entries (`name`, and the
/// illegal `id`/`status`/`flags`/`connection`) and fills in the
/// server-chosen ones before handing the bag to the session engine.
#[derive(Debug, Clone, Default)]
pub struct UserProps {
    entries: Vec<(String, PropValue)>,
}

impl UserProps {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bag proposing just a user name; the common case for
    /// server-initiated joins.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut props = Self::new();
        props.set(PROP_NAME, PropValue::String(name.into()));
        props
    }

    /// Read the base wire properties from an inbound `user-join` frame.
    ///
    /// Parses `name`, plus `id` and `status` when a client illegally
    /// supplies them, so the pipeline gets the chance to reject them. The
    /// reply correlation attribute `seq` is not a user property and is
    /// skipped.
    pub fn from_xml_frame(frame: &XmlFrame) -> Result<Self, Error> {
        let mut props = Self::new();
        if let Some(name) = frame.attribute(PROP_NAME) {
            props.set(PROP_NAME, PropValue::String(name.to_owned()));
        }
        if let Some(id) = frame
            .uint_attribute(PROP_ID)
            .map_err(|e| Error::new(collab_types::ErrorCode::InvalidNumber, e.to_string()))?
        {
            props.set(PROP_ID, PropValue::UInt(id));
        }
        if let Some(status) = frame.attribute(PROP_STATUS) {
            props.set(PROP_STATUS, PropValue::Status(UserStatus::from_str(status)?));
        }
        Ok(props)
    }

    /// Set a property, replacing any existing value for the same key.
    pub fn set(&mut self, name: impl Into<String>, value: PropValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Get a property value.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// `true` if the bag carries a property with the given key.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Get a string property.
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(PropValue::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Get an unsigned integer property.
    pub fn uint(&self, name: &str) -> Option<u32> {
        match self.get(name) {
            Some(PropValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a status property.
    pub fn status(&self, name: &str) -> Option<UserStatus> {
        match self.get(name) {
            Some(PropValue::Status(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a flag-set property.
    pub fn flags(&self, name: &str) -> Option<UserFlags> {
        match self.get(name) {
            Some(PropValue::Flags(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a connection property. The outer `Option` is presence of the
    /// key, the inner one distinguishes remote from local.
    pub fn connection(&self, name: &str) -> Option<Option<ConnectionRef>> {
        match self.get(name) {
            Some(PropValue::Connection(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
