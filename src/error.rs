//! Error types for the XPD importer.

use thiserror::Error;

use crate::types::{Section, Warning};

/// Result type alias for XPD operations.
pub type Result<T> = std::result::Result<T, XpdError>;

/// Fatal error conditions.
///
/// Anything that breaks the file layout (wrong section announce, a header or
/// payload that ends early) is a format error and aborts the operation in
/// progress. Recoverable channel and sample-rate problems are reported as
/// [`Warning`]s instead and only become errors through [`XpdError::Degraded`]
/// when the caller asks for strict behaviour.
#[derive(Error, Debug)]
pub enum XpdError {
    /// A section announce code did not match the expected marker.
    #[error("unexpected input while reading {section} announce at byte {offset}: expected {expected}, found {found}")]
    UnexpectedMarker {
        section: Section,
        expected: u16,
        found: u16,
        offset: u64,
    },

    /// The stream ended before a fixed-size record or payload was complete.
    #[error("truncated {what} at byte {offset}: needed {needed} bytes")]
    Truncated {
        what: &'static str,
        offset: u64,
        needed: u64,
    },

    /// A codec was handed a buffer shorter than its fixed record size.
    #[error("short {what} buffer: expected {expected} bytes, got {actual}")]
    ShortBuffer {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A tetrode number outside the wired range 1..=16.
    #[error("invalid tetrode {0}: tetrodes are numbered 1 to 16")]
    InvalidTetrode(u32),

    /// A recoverable condition promoted to an error by strict mode.
    #[error("degraded data: {0}")]
    Degraded(Warning),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XpdError {
    /// Returns true for errors caused by a malformed or truncated file.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            XpdError::UnexpectedMarker { .. }
                | XpdError::Truncated { .. }
                | XpdError::ShortBuffer { .. }
        )
    }
}
