// Async Collab for Rust
// SPDX-License-Identifier: MPL-2.0

//! The central [`Error`] type and its stable wire codes.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use log::error;

/// Stable error codes carried on the wire in `request-failed` messages.
///
/// Discriminants and domain tokens are part of the protocol; do not
/// renumber existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// A required attribute was missing from a request.
    NoSuchAttribute = 1,
    /// The client supplied an attribute it must not supply, or an
    /// attribute had a value that is never acceptable.
    InvalidAttribute = 2,
    /// A numeric attribute failed to parse.
    InvalidNumber = 3,
    /// The requested user name is owned by a user that is still available.
    NameInUse = 4,
    /// A join was vetoed by an authenticator.
    NotAuthorized = 5,
    /// An unknown user status string was supplied.
    InvalidStatus = 6,
    /// The connection is already subscribed to this session.
    AlreadySubscribed = 7,
    /// The connection is not subscribed to this session.
    NotSubscribed = 8,
    /// The session has been closed.
    SessionClosed = 9,
    /// The session is still synchronizing.
    SessionSynchronizing = 10,
    /// The session engine rejected the proposed user properties.
    ValidationFailed = 11,
    /// An internal error that should not be observable.
    Internal = 12,
}

impl ErrorCode {
    /// Get the wire domain token of this code.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::NoSuchAttribute | Self::InvalidAttribute | Self::InvalidNumber => "request-error",
            Self::NameInUse | Self::NotAuthorized | Self::InvalidStatus => "user-error",
            Self::AlreadySubscribed
            | Self::NotSubscribed
            | Self::SessionClosed
            | Self::SessionSynchronizing
            | Self::ValidationFailed
            | Self::Internal => "session-error",
        }
    }

    /// Get the numeric wire value of this code.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get the symbolic name of this code.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoSuchAttribute => "no-such-attribute",
            Self::InvalidAttribute => "invalid-attribute",
            Self::InvalidNumber => "invalid-number",
            Self::NameInUse => "name-in-use",
            Self::NotAuthorized => "not-authorized",
            Self::InvalidStatus => "invalid-status",
            Self::AlreadySubscribed => "already-subscribed",
            Self::NotSubscribed => "not-subscribed",
            Self::SessionClosed => "session-closed",
            Self::SessionSynchronizing => "session-synchronizing",
            Self::ValidationFailed => "validation-failed",
            Self::Internal => "internal-error",
        }
    }

    /// Look up a code from its wire domain and numeric value.
    pub fn from_domain_code(domain: &str, code: u32) -> Option<Self> {
        let res = match code {
            1 => Self::NoSuchAttribute,
            2 => Self::InvalidAttribute,
            3 => Self::InvalidNumber,
            4 => Self::NameInUse,
            5 => Self::NotAuthorized,
            6 => Self::InvalidStatus,
            7 => Self::AlreadySubscribed,
            8 => Self::NotSubscribed,
            9 => Self::SessionClosed,
            10 => Self::SessionSynchronizing,
            11 => Self::ValidationFailed,
            12 => Self::Internal,
            _ => return None,
        };
        (res.domain() == domain).then_some(res)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// General error for per-request failures in the session substrate.
///
/// Carries a stable [`ErrorCode`] for the wire plus a dynamic context
/// describing what actually went wrong.
#[derive(Debug)]
pub struct Error {
    code: ErrorCode,
    context: Box<dyn StdError + Send + Sync>,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.context)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.context)
    }
}

impl Error {
    /// Create a new error with the specified `code` and `context` as a
    /// dynamic error source.
    pub fn new(code: ErrorCode, context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            code,
            context: context.into(),
        }
    }

    /// Create a new `NoSuchAttribute` error naming the missing attribute.
    pub fn no_such_attribute(name: &str) -> Self {
        Self::new(
            ErrorCode::NoSuchAttribute,
            format!("missing required attribute \"{name}\""),
        )
    }

    /// Create a new `InvalidAttribute` error naming the offending attribute.
    pub fn invalid_attribute(name: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAttribute,
            format!("attribute \"{name}\" must not be supplied"),
        )
    }

    /// Create a new `ValidationFailed` error with `context` as a dynamic
    /// error source.
    pub fn validation(context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(ErrorCode::ValidationFailed, context)
    }

    /// Get the wire code of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the human-readable message for the wire, falling back to the
    /// symbolic code name if the context renders empty.
    pub fn message(&self) -> String {
        let msg = self.context.to_string();
        if msg.is_empty() {
            self.code.name().to_owned()
        } else {
            msg
        }
    }
}

impl From<Error> for ErrorCode {
    fn from(value: Error) -> Self {
        error!("{}", value);
        value.code()
    }
}
