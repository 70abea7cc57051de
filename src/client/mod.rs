//! High-level client: protocol sessions and file transfers.
//!
//! [`WinboxSession`] handles session establishment and the two login flows
//! (MD5 challenge-response and cleartext); [`FileRequest`] downloads a file
//! over an authenticated session.

mod session;
mod transfer;

pub use session::{SessionPhase, WinboxSession};
pub use transfer::FileRequest;
