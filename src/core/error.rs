//! Error types for the Winbox protocol client.

use thiserror::Error;

/// Errors from encoding or decoding a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended inside a field.
    #[error("truncated message: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Bytes still required to finish the current field.
        needed: usize,
        /// Offset into the raw buffer where the shortfall occurred.
        offset: usize,
    },

    /// The type word carries bits that map to no known type.
    #[error("unknown type word: 0x{0:08x}")]
    UnknownType(u32),

    /// A nested message did not start with the `M2` sub-header.
    #[error("sub-header mismatch: expected 'M2', got {0:02x?}")]
    SubHeaderMismatch([u8; 2]),

    /// A message was queried before being parsed or marked ready.
    #[error("message not parsed yet")]
    NotParsed,

    /// `parse` was called on a message holding no raw bytes.
    #[error("no raw data to parse")]
    NoRawData,

    /// A field id does not fit in the 24 bits reserved for names.
    #[error("field id 0x{0:x} exceeds 24 bits")]
    IdOutOfRange(u32),

    /// A length does not fit its wire-format length field.
    #[error("value of {len} bytes does not fit a {max}-byte length field")]
    ValueTooLarge {
        /// Actual byte length (or element count) of the value.
        len: usize,
        /// Widest length prefix the wire format allows here.
        max: usize,
    },
}

/// Errors from wrapping or unwrapping packet framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer already carries chunk framing.
    #[error("buffer is already wrapped")]
    AlreadyWrapped,

    /// The buffer carries no `M2` sub-header where one is required.
    #[error("buffer has no M2 header")]
    MissingHeader,

    /// The first chunk's chain marker is not 0x01.
    #[error("bad first chunk marker: 0x{0:02x}")]
    BadFirstChunk(u8),

    /// A non-first chunk's chain marker is not 0xff.
    #[error("broken chunk chain: chunk {chunk} carries marker 0x{marker:02x}")]
    BrokenChain {
        /// Ordinal of the offending chunk (1-based).
        chunk: usize,
        /// Marker byte found instead of 0xff.
        marker: u8,
    },

    /// The chunk stream ended before its declared length.
    #[error("truncated chunk stream: chunk {chunk} declares {declared} bytes, {available} available")]
    Truncated {
        /// Ordinal of the truncated chunk (1-based).
        chunk: usize,
        /// Payload length declared by the chunk header.
        declared: usize,
        /// Bytes actually present after the header.
        available: usize,
    },
}

/// Errors from the protocol flows (session establishment, login, transfer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The remote reported an error code in its reply.
    #[error("remote error 0x{code:x}{}", .description.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Remote {
        /// Remote error code (`SYS_ERRNO`).
        code: u32,
        /// Optional description (`SYS_ERRSTR`), present for some codes.
        description: Option<String>,
    },

    /// A successful reply carried no session id.
    #[error("reply carried no session id")]
    NoSessionId,

    /// The challenge reply carried no salt.
    #[error("challenge reply carried no salt")]
    NoSalt,

    /// The download-open reply carried no file size.
    #[error("download reply carried no file size")]
    NoFileSize,

    /// A download reply carried no data part.
    #[error("download reply carried no data part")]
    NoPartData,

    /// Login was attempted on an already-authenticated session.
    #[error("already logged in")]
    AlreadyLoggedIn,

    /// An operation required an authenticated or established session.
    #[error("no session established")]
    NoSession,
}

/// Top-level Winbox client errors.
#[derive(Debug, Error)]
pub enum WinboxError {
    /// Message codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Packet framing error.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// Protocol flow error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer closed the connection before any bytes arrived.
    #[error("peer closed the connection")]
    Disconnected,

    /// A connect or read exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Build a [`ProtocolError::Remote`] from an errno and optional description bytes.
    ///
    /// Description bytes are decoded as UTF-8, lossily; descriptions are
    /// human-readable diagnostics, not protocol data.
    pub fn remote(code: u32, description: Option<&[u8]>) -> Self {
        Self::Remote {
            code,
            description: description.map(|d| String::from_utf8_lossy(d).into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = ProtocolError::remote(crate::core::ERROR_FAILED, Some(b"no such file"));
        assert_eq!(err.to_string(), "remote error 0xfe0006: no such file");

        let err = ProtocolError::remote(crate::core::ERROR_BUSY, None);
        assert_eq!(err.to_string(), "remote error 0xfe000c");
    }

    #[test]
    fn test_error_conversions() {
        let err: WinboxError = CodecError::NotParsed.into();
        assert!(matches!(err, WinboxError::Codec(CodecError::NotParsed)));

        let err: WinboxError = FrameError::MissingHeader.into();
        assert!(matches!(err, WinboxError::Frame(FrameError::MissingHeader)));
    }
}
