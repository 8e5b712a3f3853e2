//! NDN names and name components.
//!
//! A [`Name`] is an ordered list of opaque byte components. Version and
//! segment components use the marker convention: a one-byte marker (`0xFD`
//! for versions, `0x00` for segments) followed by a non-negative integer in
//! its shortest legal width. Segment 0 therefore prints as `%00%00` in URI
//! form.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::tlv;

/// Marker byte prefixing a version component value.
pub const VERSION_MARKER: u8 = 0xFD;
/// Marker byte prefixing a segment component value.
pub const SEGMENT_MARKER: u8 = 0x00;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid percent-escape in name component {0:?}")]
    BadEscape(String),
}

/// A single name component: an opaque byte sequence.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component {
    bytes: Vec<u8>,
}

impl Component {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// A component carrying `value` after the given marker byte.
    pub fn from_number_with_marker(marker: u8, value: u64) -> Self {
        let mut bytes = vec![marker];
        bytes.extend_from_slice(&tlv::non_negative(value));
        Self { bytes }
    }

    /// A version component carrying microseconds since the Unix epoch.
    pub fn from_version(version: u64) -> Self {
        Self::from_number_with_marker(VERSION_MARKER, version)
    }

    /// A segment component carrying a segment number.
    pub fn from_segment(segment: u64) -> Self {
        Self::from_number_with_marker(SEGMENT_MARKER, segment)
    }

    /// Decode the number after `marker`, if this component carries one.
    pub fn to_number_with_marker(&self, marker: u8) -> Option<u64> {
        match self.bytes.split_first() {
            Some((&first, rest)) if first == marker => tlv::parse_non_negative(rest),
            _ => None,
        }
    }

    pub fn to_version(&self) -> Option<u64> {
        self.to_number_with_marker(VERSION_MARKER)
    }

    pub fn to_segment(&self) -> Option<u64> {
        self.to_number_with_marker(SEGMENT_MARKER)
    }

    pub fn is_version(&self) -> bool {
        self.to_version().is_some()
    }

    pub fn is_segment(&self) -> bool {
        self.to_segment().is_some()
    }

    /// The raw byte payload of this component.
    pub fn value(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn from_escaped(raw: &str) -> Result<Self, NameError> {
        let mut bytes = Vec::with_capacity(raw.len());
        let mut chars = raw.bytes();
        while let Some(byte) = chars.next() {
            if byte == b'%' {
                let high = chars.next().and_then(hex_value);
                let low = chars.next().and_then(hex_value);
                match (high, low) {
                    (Some(high), Some(low)) => bytes.push((high << 4) | low),
                    _ => return Err(NameError::BadEscape(raw.to_string())),
                }
            } else {
                bytes.push(byte);
            }
        }
        Ok(Self { bytes })
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}

fn is_unescaped(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.bytes {
            if is_unescaped(byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "%{byte:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self)
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<Vec<u8>> for Component {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// A hierarchical NDN name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URI of the form `/a/b/%00%01`. Empty path segments are
    /// ignored, so `/` is the empty name. An optional `ndn:` scheme prefix
    /// is accepted.
    pub fn from_uri(uri: &str) -> Result<Self, NameError> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        let mut components = Vec::new();
        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }
            components.push(Component::from_escaped(segment)?);
        }
        Ok(Self { components })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn append(&mut self, component: impl Into<Component>) {
        self.components.push(component.into());
    }

    /// Builder-style [`append`](Self::append).
    pub fn appended(mut self, component: impl Into<Component>) -> Self {
        self.append(component);
        self
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.len() >= self.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(ours, theirs)| ours == theirs)
    }

    /// TLV wire form of this name.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for component in &self.components {
            tlv::write_element(tlv::COMPONENT, component.value(), &mut payload);
        }
        let mut out = Vec::new();
        tlv::write_element(tlv::NAME, &payload, &mut out);
        out
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        Self::from_uri(uri)
    }
}
