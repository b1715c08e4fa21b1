// Async Collab for Rust
// SPDX-License-Identifier: MPL-2.0

//! Reply sequence tokens.

use std::fmt::{self, Display};

/// Correlation token for a reply to an inbound request that carried a
/// numeric `seq` attribute.
///
/// The wire form is `"{seq_id}/{seq}"`, where `seq_id` is the value the
/// directory assigned to the subscription at subscribe time and `seq` is
/// the number the peer put on its request. Requests without a `seq` get
/// replies without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqToken {
    /// The subscription's directory-assigned identifier.
    pub seq_id: u32,
    /// The request sequence number chosen by the peer.
    pub seq: u32,
}

impl SeqToken {
    /// Create a new token from a subscription `seq_id` and an inbound `seq`.
    pub fn new(seq_id: u32, seq: u32) -> Self {
        Self { seq_id, seq }
    }
}

impl Display for SeqToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.seq_id, self.seq)
    }
}
