//! Protocol session: establishment and authentication.
//!
//! [`WinboxSession`] drives the stateful login flows on top of the transport:
//!
//! ```text
//! Connected ──list──▶ Listed ──challenge──▶ Challenged ──md5 login──▶ Authenticated
//!     │                                                                    ▲
//!     └──────────────────────cleartext login──────────────────────────────┘
//! ```
//!
//! Every request carries a strictly increasing per-session request id, and
//! each send awaits exactly one reply before the next request goes out.
//! Remote-reported errors surface as [`ProtocolError::Remote`] values; the
//! codec and framer never see them as failures.

use std::time::Duration;

use md5::{Digest, Md5};

use crate::codec::Message;
use crate::core::constants::{
    DEFAULT_FRAGMENT_SIZE, DEFAULT_PORT, DEFAULT_TIMEOUT, STD_ID, SYS_ERRNO, SYS_ERRSTR, SYS_TYPE,
};
use crate::core::error::{ProtocolError, WinboxError};
use crate::transport::Transport;

/// Lifecycle phase of a protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP connection established, no protocol exchange yet.
    Connected,
    /// "list" request succeeded; a remote session id is held.
    Listed,
    /// A login salt has been obtained from the remote.
    Challenged,
    /// One of the login flows succeeded.
    Authenticated,
    /// The connection has been closed; the session id is gone.
    Disconnected,
}

/// A Winbox protocol session over one TCP connection.
///
/// The session owns the transport exclusively; there is no sharing and no
/// locking. Closing the connection invalidates the session id.
#[derive(Debug)]
pub struct WinboxSession {
    transport: Transport,
    phase: SessionPhase,
    session_id: Option<u32>,
    request_id: u32,
    fragment_size: usize,
    last_error: Option<ProtocolError>,
}

impl WinboxSession {
    /// Connect to a Winbox service.
    pub async fn connect(host: &str, port: u16) -> Result<Self, WinboxError> {
        Self::connect_with_timeout(host, port, DEFAULT_TIMEOUT).await
    }

    /// Connect to the default Winbox port.
    pub async fn connect_default(host: &str) -> Result<Self, WinboxError> {
        Self::connect(host, DEFAULT_PORT).await
    }

    /// Connect with an explicit connect/read timeout.
    pub async fn connect_with_timeout(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, WinboxError> {
        Ok(Self {
            transport: Transport::connect(host, port, timeout).await?,
            phase: SessionPhase::Connected,
            session_id: None,
            request_id: 0,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            last_error: None,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The remote-assigned session id, once established.
    pub fn session_id(&self) -> Option<u32> {
        self.session_id
    }

    /// The request id most recently issued.
    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    /// The most recent remote-reported error, if any.
    pub fn last_error(&self) -> Option<&ProtocolError> {
        self.last_error.as_ref()
    }

    /// Access the underlying transport (for collaborators issuing their own
    /// requests).
    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Issue the next request id. Starts at 1 and increases by one per
    /// request for the lifetime of the connection.
    pub fn next_request_id(&mut self) -> u32 {
        self.request_id += 1;
        self.request_id
    }

    /// Send one request and await its reply.
    pub async fn exchange(&mut self, msg: &Message) -> Result<Message, WinboxError> {
        let fragment_size = self.fragment_size;
        self.exchange_with_fragment(msg, fragment_size).await
    }

    /// Send one request and await its reply, reading `fragment_size`-byte
    /// fragments until the chunk chain is complete.
    pub async fn exchange_with_fragment(
        &mut self,
        msg: &Message,
        fragment_size: usize,
    ) -> Result<Message, WinboxError> {
        self.transport.send_message(msg).await?;
        let pkt = self.transport.receive_complete(fragment_size).await?;
        Ok(Message::parse_bytes(pkt.raw())?)
    }

    /// Extract a remote-reported error from a reply, recording it as the
    /// session's last error.
    fn remote_error(&mut self, reply: &Message) -> Result<Option<ProtocolError>, WinboxError> {
        if let Some(code) = reply.get_u32(SYS_ERRNO)? {
            let err = ProtocolError::remote(code, reply.get_string(SYS_ERRSTR)?);
            self.last_error = Some(err.clone());
            return Ok(Some(err));
        }
        Ok(None)
    }

    /// Request a session from the remote's list handler.
    ///
    /// On success the remote-assigned session id is captured and the phase
    /// moves to [`SessionPhase::Listed`]. A remote error leaves the phase
    /// unchanged and surfaces the error code.
    pub async fn request_list(&mut self) -> Result<u32, WinboxError> {
        let rid = self.next_request_id();
        let mut msg = Message::new();
        msg.set_to(2, Some(2));
        msg.set_from(0, Some(11));
        msg.set_command(7);
        msg.set_request_id(rid);
        msg.set_reply_expected(true);
        msg.add_string(1, b"list".to_vec());

        let reply = self.exchange(&msg).await?;
        if let Some(err) = self.remote_error(&reply)? {
            return Err(err.into());
        }

        // A clean reply without a session id breaks the protocol contract.
        let session_id = reply.get_u32(STD_ID)?.ok_or(ProtocolError::NoSessionId)?;
        self.session_id = Some(session_id);
        self.phase = SessionPhase::Listed;
        Ok(session_id)
    }

    /// Request the login salt for the MD5 challenge-response flow.
    ///
    /// Requires a listed session. Sends a session-scoped command followed by
    /// the challenge request proper, then reads one reply carrying the salt.
    pub async fn request_challenge(&mut self) -> Result<Vec<u8>, WinboxError> {
        let session_id = self.session_id.ok_or(ProtocolError::NoSession)?;
        let rid = self.next_request_id();

        let mut msg = Message::new();
        msg.set_session_id(session_id);
        msg.set_command(5);
        msg.set_from(0, Some(11));
        msg.set_to(2, Some(2));
        self.transport.send_message(&msg).await?;

        msg.clear();
        msg.set_reply_expected(true);
        msg.set_request_id(rid);
        msg.set_command(4);
        msg.set_from(0, Some(11));
        msg.set_to(13, Some(4));
        self.transport.send_message(&msg).await?;

        let pkt = self.transport.receive_complete(self.fragment_size).await?;
        let reply = Message::parse_bytes(pkt.raw())?;
        let salt = reply.get_raw(9)?.ok_or(ProtocolError::NoSalt)?.to_vec();
        self.phase = SessionPhase::Challenged;
        Ok(salt)
    }

    /// MD5 challenge-response login.
    ///
    /// Runs the list and challenge steps, then authenticates with
    /// `MD5(0x00 ‖ password ‖ salt)`. On a remote error the session id is
    /// cleared and the failure is surfaced; there is no automatic retry.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<(), WinboxError> {
        if self.session_id.is_some() {
            return Err(ProtocolError::AlreadyLoggedIn.into());
        }
        self.request_list().await?;
        let salt = self.request_challenge().await?;

        let mut digest = Md5::new();
        digest.update([0u8]);
        digest.update(password.as_bytes());
        digest.update(&salt);
        let mut hashed = vec![0u8];
        hashed.extend_from_slice(&digest.finalize());

        let session_id = self.session_id.ok_or(ProtocolError::NoSessionId)?;
        let rid = self.next_request_id();
        let mut msg = Message::new();
        msg.set_to(13, Some(4));
        msg.set_from(0, Some(8));
        msg.set_command(1);
        msg.set_request_id(rid);
        msg.set_session_id(session_id);
        msg.set_reply_expected(true);
        msg.add_string(1, user.as_bytes().to_vec());
        msg.add_raw(9, salt);
        msg.add_raw(10, hashed);

        let reply = self.exchange(&msg).await?;
        if let Some(err) = self.remote_error(&reply)? {
            self.session_id = None;
            self.phase = SessionPhase::Connected;
            return Err(err.into());
        }
        self.phase = SessionPhase::Authenticated;
        Ok(())
    }

    /// Cleartext username/password login (Dude-style deployments).
    ///
    /// Bypasses the salt/digest steps entirely; the remote assigns the
    /// session id in its reply.
    pub async fn login_cleartext(&mut self, user: &str, password: &str) -> Result<(), WinboxError> {
        if self.session_id.is_some() {
            return Err(ProtocolError::AlreadyLoggedIn.into());
        }
        let rid = self.next_request_id();
        let mut msg = Message::new();
        msg.set_to(13, Some(4));
        msg.set_from(0, Some(8));
        msg.add_u32(7, 11);
        msg.add_u32(SYS_TYPE, 1);
        msg.set_request_id(rid);
        msg.set_command(1);
        msg.add_string(1, user.as_bytes().to_vec());
        msg.add_string(3, password.as_bytes().to_vec());

        let reply = self.exchange(&msg).await?;
        if let Some(err) = self.remote_error(&reply)? {
            return Err(err.into());
        }
        let session_id = reply.get_u32(STD_ID)?.ok_or(ProtocolError::NoSessionId)?;
        self.session_id = Some(session_id);
        self.phase = SessionPhase::Authenticated;
        Ok(())
    }

    /// Close the session; the session id does not survive the connection.
    pub async fn close(mut self) -> Result<(), WinboxError> {
        self.session_id = None;
        self.phase = SessionPhase::Disconnected;
        self.transport.close().await
    }
}
