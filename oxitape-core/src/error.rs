//! Error types for OxiTape operations.
//!
//! A single error enum covers every failure the restorer can hit: I/O and
//! mapping errors, bounds-check failures on the raw archive bytes, malformed
//! compressed streams, and header validation errors. Reconciliation
//! mismatches are deliberately *not* errors — they are reported as warnings
//! by the reconciler and the run continues.

use std::io;
use thiserror::Error;

/// The main error type for OxiTape operations.
#[derive(Debug, Error)]
pub enum OxiTapeError {
    /// I/O error from opening or mapping the archive.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A bounds-checked read ran past the end of the underlying bytes.
    #[error("Unexpected end of input at offset {offset}: need {needed} bytes, have {available}")]
    UnexpectedEof {
        /// Offset at which the read was attempted.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes actually available from that offset.
        available: usize,
    },

    /// The bit stream ran out of bits mid-token.
    #[error("Bit stream exhausted at bit position {bit_position}")]
    TruncatedBitstream {
        /// Bit position of the failed read.
        bit_position: usize,
    },

    /// A compressed stream or record is self-inconsistent.
    #[error("Malformed stream: {message}")]
    MalformedStream {
        /// Description of the inconsistency.
        message: String,
    },

    /// A fixed-layout header failed validation.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// The archive uses a feature this restorer does not handle.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// Text field could not be decoded.
    #[error("Encoding error: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },
}

/// Result type alias for OxiTape operations.
pub type Result<T> = std::result::Result<T, OxiTapeError>;

impl OxiTapeError {
    /// Create an unexpected-EOF error.
    pub fn unexpected_eof(offset: usize, needed: usize, available: usize) -> Self {
        Self::UnexpectedEof {
            offset,
            needed,
            available,
        }
    }

    /// Create a truncated-bitstream error.
    pub fn truncated_bitstream(bit_position: usize) -> Self {
        Self::TruncatedBitstream { bit_position }
    }

    /// Create a malformed-stream error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedStream {
            message: message.into(),
        }
    }

    /// Create an invalid-header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }
}
