//! Packet framing: the chunked transport wrapper.
//!
//! Framing is purely a transport concern; it never alters message semantics.
//! [`Packet`] wraps and unwraps one message's serialized bytes, and
//! [`wire_complete`] lets receive loops detect when a full chunk chain has
//! arrived.

mod packet;

pub use packet::{wire_complete, Packet};
