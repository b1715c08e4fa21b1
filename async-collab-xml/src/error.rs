use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
/// Error produced when reading XML.
pub enum XmlReadError {
    #[error("Failed to load XML: {0}")]
    /// Failed to parse the document.
    Xml(#[from] roxmltree::Error),
    #[error("Document has no root element")]
    /// The document contained no root element.
    MissingRoot,
    #[error("Expected attribute: {0}")]
    /// A required attribute was missing.
    MissingAttribute(String),
    #[error("Failed to parse {0} as integer: {1}")]
    /// An attribute failed to parse as an integer.
    ParseInt(String, ParseIntError),
    #[error("Failed to parse {0}: {1}")]
    /// An attribute failed to parse as some other value.
    Parse(String, String),
}

#[derive(Debug, Error)]
/// Error produced when writing XML.
pub enum XmlWriteError {
    #[error("{0}")]
    /// Invalid XML output.
    Xml(#[from] quick_xml::Error),
    #[error("Failed to write to stream: {0}")]
    /// Failed to write to the underlying stream.
    Io(#[from] std::io::Error),
}
