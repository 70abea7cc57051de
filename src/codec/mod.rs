//! Message codec: the tagged-record binary format.
//!
//! This module is pure — it never touches a socket. It provides:
//!
//! - **Typed values**: [`Value`], a recursive sum type over the closed set of
//!   base types and their array counterparts
//! - **Type-word bit layout**: [`BaseType`] / [`FieldType`] encode and decode
//!   the 32-bit tag carried by every field
//! - **Messages**: [`Message`] with `build`, `parse`, and (id, type) lookup

mod message;
mod value;

pub use message::{Field, Message};
pub use value::{bits, BaseType, FieldType, Value};
