//! Document buffers passed to and returned from converters.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Per-render options handed through from the dispatcher.
///
/// No keys are recognized yet.
pub type RenderOptions = BTreeMap<String, serde_json::Value>;

/// Declared character encoding of a [`Content`] buffer.
///
/// The label travels with the bytes; nothing is transcoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8 text.
    #[default]
    Utf8,
    /// 7-bit ASCII text.
    Ascii,
    /// Raw bytes with no character semantics.
    Binary,
    /// Any other encoding, kept by its (lowercased) label.
    Named(String),
}

impl FromStr for Encoding {
    type Err = Infallible;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let label = label.trim().to_ascii_lowercase();
        Ok(match label.as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "us-ascii" | "ascii" => Self::Ascii,
            "binary" | "ascii-8bit" => Self::Binary,
            _ => Self::Named(label),
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Ascii => f.write_str("US-ASCII"),
            Self::Binary => f.write_str("BINARY"),
            Self::Named(label) => f.write_str(label),
        }
    }
}

/// A byte buffer together with its declared encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Content {
    bytes: Vec<u8>,
    encoding: Encoding,
}

impl Content {
    /// Wraps `bytes` declared as `encoding`.
    pub fn new(bytes: impl Into<Vec<u8>>, encoding: Encoding) -> Self {
        Self {
            bytes: bytes.into(),
            encoding,
        }
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The declared encoding.
    #[must_use]
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Returns `true` if there are no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bytes as text, when they are valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns the UTF-8 decoding error for non-UTF-8 bytes.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// The bytes as text, replacing invalid sequences.
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Whether the bytes conform to the declared encoding.
    ///
    /// Only UTF-8 and ASCII are checked; other labels are taken on trust.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.encoding {
            Encoding::Utf8 => self.text().is_ok(),
            Encoding::Ascii => self.bytes.is_ascii(),
            Encoding::Binary | Encoding::Named(_) => true,
        }
    }

    /// Applies a text transform, keeping the encoding.
    ///
    /// Buffers that are not valid UTF-8 are returned untouched.
    #[must_use]
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => Self {
                bytes: f(text).into_bytes(),
                encoding: self.encoding,
            },
            Err(_) => self,
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes(), Encoding::Utf8)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::from(text.to_owned())
    }
}
