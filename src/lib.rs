//! # Winbox Protocol
//!
//! A client implementation of the Winbox binary management protocol spoken by
//! MikroTik RouterOS devices on TCP port 8291. It provides:
//!
//! - **Codec**: typed tagged-record messages with nested messages and arrays
//! - **Framing**: the chunked `M2` packet wrapper used on the wire
//! - **Transport**: timeout-bounded TCP exchange of whole messages
//! - **Client**: session establishment, MD5 and cleartext login, and
//!   fragmented file download
//!
//! ## Feature Flags
//!
//! - `transport` (default): TCP transport (requires tokio)
//! - `client` (default): session and file-transfer flows (implies `transport`)
//!
//! ## Modules
//!
//! - [`core`]: protocol constants and error types (always included)
//! - [`codec`]: message encoding and decoding (always included)
//! - [`framing`]: packet chunk framing (always included)
//! - [`transport`]: TCP transport (requires `transport` feature)
//! - [`client`]: protocol sessions and downloads (requires `client` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use winbox_protocol::prelude::*;
//!
//! // Build a request and serialize it for the wire.
//! let mut msg = Message::new();
//! msg.set_to(2, Some(2));
//! msg.set_command(7);
//! msg.set_reply_expected(true);
//! msg.add_string(1, &b"list"[..]);
//! let raw = msg.to_bytes().unwrap();
//!
//! // Wrap it in chunk framing, then strip the framing back off.
//! let mut pkt = Packet::new(raw.clone());
//! pkt.wrap().unwrap();
//! pkt.unwrap().unwrap();
//! assert_eq!(pkt.raw(), raw.as_slice());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Message codec (always included)
pub mod codec;

// Packet framing (always included)
pub mod framing;

// TCP transport (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Client API (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    // Constants and error types
    pub use crate::core::*;

    // Codec and framing types
    pub use crate::codec::{BaseType, Field, FieldType, Message, Value};
    pub use crate::framing::{wire_complete, Packet};

    // Transport types (when enabled)
    #[cfg(feature = "transport")]
    pub use crate::transport::{TcpConnection, Transport};

    // Client types (when enabled)
    #[cfg(feature = "client")]
    pub use crate::client::{FileRequest, SessionPhase, WinboxSession};
}

// Re-export commonly used items at crate root
pub use crate::codec::{Field, FieldType, Message, Value};
pub use crate::core::{CodecError, FrameError, ProtocolError, WinboxError};
pub use crate::framing::Packet;

#[cfg(feature = "transport")]
pub use crate::transport::Transport;

#[cfg(feature = "client")]
pub use crate::client::{FileRequest, WinboxSession};
