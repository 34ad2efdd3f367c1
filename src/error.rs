//! Error types for place file encoding and decoding
//!
//! Every error carries a code so failures can be categorised in logs.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E3xxx**: Instance tree and value errors
//! - **E4xxx**: Binary format errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error writing output
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E2005`: XML writing error
//! - `E3001`: Invalid instance tree
//! - `E3002`: Numeric parse error
//! - `E3003`: Property type conflict
//! - `E4001`: Invalid binary payload

use std::io;
use thiserror::Error;

/// Result type for place file operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting or importing a place
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while writing output
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Unclosed or mismatched tags
    /// - Invalid character encoding
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Duplicate attribute
    /// - Attribute without a quoted value
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Document has no root element
    /// - DTD declarations
    /// - Items nested deeper than the configured limit
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Invalid instance tree
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Parent id that does not exist yet
    /// - Lookup of an id outside the tree
    #[error("[E3001] Invalid instance tree: {0}")]
    InvalidTree(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    ///
    /// **Suggestions**:
    /// - Verify numeric values use proper format (e.g., "1.5" not "1,5")
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// Two instances of one class carry different value types for the same property
    ///
    /// **Error Code**: E3003
    #[error("[E3003] Property type conflict: {0}")]
    PropertyType(String),

    /// Binary payload could not be decoded
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Wrong magic or signature bytes
    /// - Chunk shorter than its declared length
    /// - Unknown property type id
    #[error("[E4001] Invalid binary payload: {0}")]
    InvalidBinary(String),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error with element context
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_xml_element("Item", "nested too deeply")
    /// ```
    pub fn invalid_xml_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create a ParseError with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The name of the field being parsed (e.g., "CFrame R01")
    /// * `value` - The value that failed to parse
    /// * `expected_type` - The expected type (e.g., "floating-point number")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::ParseError(format!(
            "Failed to parse '{}': expected {}, got '{}'. \
             Verify the value is properly formatted.",
            field_name, expected_type, value
        ))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Create an InvalidBinary error for a read past the end of the payload
    pub fn truncated(what: &str) -> Self {
        Error::InvalidBinary(format!("unexpected end of data while reading {}", what))
    }
}
