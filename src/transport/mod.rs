//! Transport layer: TCP connection plus whole-message exchange.
//!
//! - [`TcpConnection`]: one socket, raw byte send/receive with timeout
//! - [`Transport`]: composes the connection with the packet framer to send
//!   and receive whole messages
//!
//! The protocol above this layer is strictly sequential — one request, one
//! awaited reply — so the transport carries no queues and no shared state.

mod connection;
mod session;

pub use connection::TcpConnection;
pub use session::Transport;
