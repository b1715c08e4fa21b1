use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{XmlReadError, XmlWriteError};

/// A single protocol message: one XML element with attributes, optional
/// text content and optional child elements.
///
/// Attribute order is preserved, both when parsing and when writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlFrame {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlFrame>,
    text: Option<String>,
}

impl XmlFrame {
    /// Create a new, empty frame with the given element name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Parse a frame from a string containing a single XML document.
    pub fn parse(data: &str) -> Result<Self, XmlReadError> {
        let doc = roxmltree::Document::parse(data)?;
        let root = doc
            .root()
            .first_element_child()
            .ok_or(XmlReadError::MissingRoot)?;
        Ok(Self::from_node(&root))
    }

    fn from_node(node: &roxmltree::Node<'_, '_>) -> Self {
        let mut frame = XmlFrame::new(node.tag_name().name());
        for attr in node.attributes() {
            frame
                .attributes
                .push((attr.name().to_owned(), attr.value().to_owned()));
        }
        for child in node.children() {
            if child.is_element() {
                frame.children.push(Self::from_node(&child));
            } else if child.is_text() {
                let text = child.text().unwrap_or_default().trim();
                if !text.is_empty() {
                    frame.text = Some(text.to_owned());
                }
            }
        }
        frame
    }

    /// Get the element name of this frame.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute, replacing any existing value without disturbing
    /// attribute order.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Get the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the value of an attribute, failing if it is missing.
    pub fn require_attribute(&self, name: &str) -> Result<&str, XmlReadError> {
        self.attribute(name)
            .ok_or_else(|| XmlReadError::MissingAttribute(name.to_owned()))
    }

    /// Parse an attribute as an unsigned integer. A missing attribute
    /// yields `Ok(None)`; a malformed one is an error.
    pub fn uint_attribute(&self, name: &str) -> Result<Option<u32>, XmlReadError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|e| XmlReadError::ParseInt(name.to_owned(), e)),
        }
    }

    /// Parse an attribute with any [`FromStr`] type. A missing attribute
    /// yields `Ok(None)`; a malformed one is an error.
    pub fn parse_attribute<T>(&self, name: &str) -> Result<Option<T>, XmlReadError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.attribute(name) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|e: T::Err| XmlReadError::Parse(name.to_owned(), e.to_string())),
        }
    }

    /// Iterate over the attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: XmlFrame) {
        self.children.push(child);
    }

    /// Get the child elements of this frame.
    pub fn children(&self) -> &[XmlFrame] {
        &self.children
    }

    /// Set the text content of this frame.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Get the text content of this frame.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Serialize this frame to a stream.
    pub fn write(&self, stream: &mut impl Write) -> Result<(), XmlWriteError> {
        let mut writer = quick_xml::Writer::new(stream);
        self.write_inner(&mut writer)
    }

    fn write_inner(&self, writer: &mut quick_xml::Writer<impl Write>) -> Result<(), XmlWriteError> {
        let mut start = BytesStart::new(&self.name);
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_inner(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(&self.name)))?;
        Ok(())
    }

    /// Serialize this frame to a string.
    pub fn to_xml_string(&self) -> Result<String, XmlWriteError> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
