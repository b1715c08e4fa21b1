// Async Collab for Rust
// SPDX-License-Identifier: MPL-2.0

//! User availability status.

use std::fmt::{self, Display};

use crate::{Error, ErrorCode};

/// Availability of a user within a session.
///
/// A user is *available* when its status is anything other than
/// [`UserStatus::Unavailable`]. Unavailable users remain in the session's
/// user table so that a later join under the same name resurrects them
/// with their original id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStatus {
    /// The user is actively editing.
    Active,
    /// The user is joined but currently passive.
    Inactive,
    /// The user has left; the record is retained for rejoin.
    Unavailable,
}

impl UserStatus {
    /// Get the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unavailable => "unavailable",
        }
    }

    /// Parse a status from its wire representation.
    pub fn from_str(val: &str) -> Result<Self, Error> {
        match val {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(Error::new(
                ErrorCode::InvalidStatus,
                format!("unknown user status \"{other}\""),
            )),
        }
    }

    /// `true` unless this status is [`UserStatus::Unavailable`].
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
