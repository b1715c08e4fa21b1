// Async Collab for Rust
// SPDX-License-Identifier: MPL-2.0

//! User flag bitset.

use bitflags::bitflags;

bitflags! {
    /// Flags attached to a user record by the server.
    ///
    /// Flags are never accepted from the wire; the proxy assigns them
    /// during the join pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UserFlags: u32 {
        /// The user was joined directly at the server, with no
        /// originating peer connection.
        const LOCAL = 0x1;
    }
}
