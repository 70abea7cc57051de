//! Fragmented file download over an authenticated session.
//!
//! A download runs in two steps: [`FileRequest::request_download`] opens the
//! transfer and learns the download id and file size, then
//! [`FileRequest::download`] pulls the file part by part. Each part request
//! asks for at most `part_size` bytes; a part shorter than `part_size`
//! (including an empty one) marks the end of the file.

use crate::codec::Message;
use crate::core::constants::{
    DEFAULT_FRAGMENT_SIZE, DEFAULT_PART_SIZE, ERROR_FAILED, STD_ID, SYS_ERRNO, SYS_ERRSTR,
};
use crate::core::error::{ProtocolError, WinboxError};

use super::session::{SessionPhase, WinboxSession};

/// A single file download bound to an authenticated session.
///
/// The request borrows the session exclusively for its lifetime; the session's
/// request-id counter keeps running across the transfer, so other requests can
/// follow on the same session once the download is done.
#[derive(Debug)]
pub struct FileRequest<'a> {
    session: &'a mut WinboxSession,
    filename: Vec<u8>,
    download_id: Option<u32>,
    file_size: Option<u32>,
    fragment_size: usize,
    part_size: usize,
    buffer: Vec<u8>,
}

impl<'a> FileRequest<'a> {
    /// Prepare a download of `filename` over `session`.
    pub fn new(session: &'a mut WinboxSession, filename: impl Into<Vec<u8>>) -> Self {
        Self {
            session,
            filename: filename.into(),
            download_id: None,
            file_size: None,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            part_size: DEFAULT_PART_SIZE,
            buffer: Vec::new(),
        }
    }

    /// Override the per-read fragment size.
    pub fn set_fragment_size(&mut self, size: usize) {
        self.fragment_size = size;
    }

    /// Override the per-round part size.
    pub fn set_part_size(&mut self, size: usize) {
        self.part_size = size;
    }

    /// The remote-assigned download id, once the transfer is open.
    pub fn download_id(&self) -> Option<u32> {
        self.download_id
    }

    /// The file size reported by the remote, once the transfer is open.
    pub fn file_size(&self) -> Option<u32> {
        self.file_size
    }

    /// Bytes downloaded so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the request, yielding the downloaded bytes.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    async fn exchange(&mut self, msg: &Message) -> Result<Message, WinboxError> {
        self.session.exchange_with_fragment(msg, self.fragment_size).await
    }

    /// Only `ERROR_FAILED` replies carry a human-readable description.
    fn remote_error(reply: &Message) -> Result<Option<ProtocolError>, WinboxError> {
        if let Some(code) = reply.get_u32(SYS_ERRNO)? {
            let description = if code == ERROR_FAILED {
                reply.get_string(SYS_ERRSTR)?
            } else {
                None
            };
            return Ok(Some(ProtocolError::remote(code, description)));
        }
        Ok(None)
    }

    /// Open the download: learn the download id and file size.
    ///
    /// Requires an authenticated session. A remote error (for instance a
    /// missing file) surfaces as [`ProtocolError::Remote`] with the remote's
    /// description when it sends one.
    pub async fn request_download(&mut self) -> Result<u32, WinboxError> {
        if self.session.phase() != SessionPhase::Authenticated {
            return Err(ProtocolError::NoSession.into());
        }
        let rid = self.session.next_request_id();

        let mut msg = Message::new();
        msg.set_reply_expected(true);
        msg.set_request_id(rid);
        msg.set_command(3);
        msg.add_string(1, self.filename.clone());
        msg.set_from(0, Some(8));
        msg.set_to(2, Some(2));

        let reply = self.exchange(&msg).await?;
        if let Some(err) = Self::remote_error(&reply)? {
            return Err(err.into());
        }

        let download_id = reply.get_u32(STD_ID)?.ok_or(ProtocolError::NoSessionId)?;
        let file_size = reply.get_u32(2)?.ok_or(ProtocolError::NoFileSize)?;
        self.download_id = Some(download_id);
        self.file_size = Some(file_size);
        Ok(file_size)
    }

    /// Pull the file part by part until a short part marks the end.
    ///
    /// Returns the complete file contents. Every round awaits its full reply
    /// before the next part request goes out.
    pub async fn download(&mut self) -> Result<&[u8], WinboxError> {
        let download_id = self.download_id.ok_or(ProtocolError::NoSession)?;
        if self.file_size.is_none() {
            return Err(ProtocolError::NoFileSize.into());
        }
        loop {
            let rid = self.session.next_request_id();
            let mut msg = Message::new();
            msg.set_reply_expected(true);
            msg.set_request_id(rid);
            msg.set_session_id(download_id);
            msg.add_u32(2, self.part_size as u32);
            msg.set_command(4);
            msg.set_from(0, Some(8));
            msg.set_to(2, Some(2));

            let reply = self.exchange(&msg).await?;
            if let Some(err) = Self::remote_error(&reply)? {
                return Err(err.into());
            }
            let part = reply.get_raw(3)?.ok_or(ProtocolError::NoPartData)?;
            let part_len = part.len();
            self.buffer.extend_from_slice(part);
            if part_len < self.part_size {
                break;
            }
        }
        Ok(&self.buffer)
    }
}
