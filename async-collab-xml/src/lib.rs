#![warn(missing_docs)]

//! XML frame model for the collab session wire protocol.
//!
//! Every message exchanged within a session's subscription group is a
//! single XML element with attributes and optional child elements. This
//! crate provides the owned [`XmlFrame`] tree, parsing with the
//! `roxmltree` crate and serialization with `quick-xml`.

mod error;
mod frame;

pub use error::{XmlReadError, XmlWriteError};
pub use frame::XmlFrame;
