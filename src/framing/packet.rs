//! Chunked packet framing around a serialized message.
//!
//! Wire format: a packet is a chain of chunks, each `[length u8][marker u8]`
//! followed by up to 0xff payload bytes. The first chunk's marker is 0x01,
//! every later chunk's is 0xff. The chunk payload stream is
//! `[inner length u16 BE = message length + 2][M2][message bytes]`.
//!
//! A message whose wrapped size fits below 0xff travels as a single chunk.
//! The inner-length field is big-endian — one of the protocol's two
//! intentional endianness exceptions.

use crate::core::constants::{CHUNK_FIRST, CHUNK_MAX, CHUNK_NEXT, M2_HEADER};
use crate::core::error::FrameError;

/// Transport wrapper around one message's serialized bytes.
///
/// A packet is either headerless (raw message bytes only) or wrapped in chunk
/// framing; [`Packet::has_header`] inspects the bytes themselves, so packets
/// built from received data are recognized correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    raw: Vec<u8>,
}

impl Packet {
    /// Create a packet over the given bytes.
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// Current byte length.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// Borrow the current bytes (wrapped or not).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the packet, yielding its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// Drop all bytes so the packet can be reused.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Whether the bytes carry chunk framing, detected by the `M2` sub-header
    /// sitting at its fixed offset.
    pub fn has_header(&self) -> bool {
        self.raw.len() >= 6 && self.raw[4..6] == M2_HEADER
    }

    /// Wrap the raw message bytes in chunk framing.
    ///
    /// Wrapping an already-wrapped packet is a usage error.
    pub fn wrap(&mut self) -> Result<&[u8], FrameError> {
        if self.has_header() {
            return Err(FrameError::AlreadyWrapped);
        }
        let size = self.raw.len();
        // Inner length wraps modulo 2^16 for oversized payloads; chain
        // termination never relies on it alone.
        let inner = (size + 2) as u16;
        let mut buf = Vec::with_capacity(size + 8);

        if size + 4 < CHUNK_MAX {
            buf.push((size + 4) as u8);
            buf.push(CHUNK_FIRST);
            buf.extend_from_slice(&inner.to_be_bytes());
            buf.extend_from_slice(&M2_HEADER);
            buf.extend_from_slice(&self.raw);
        } else {
            let mut headed = Vec::with_capacity(size + 4);
            headed.extend_from_slice(&inner.to_be_bytes());
            headed.extend_from_slice(&M2_HEADER);
            headed.extend_from_slice(&self.raw);

            let mut first = true;
            for piece in headed.chunks(CHUNK_MAX) {
                buf.push(piece.len() as u8);
                buf.push(if first { CHUNK_FIRST } else { CHUNK_NEXT });
                first = false;
                buf.extend_from_slice(piece);
            }
        }

        self.raw = buf;
        Ok(&self.raw)
    }

    /// Strip chunk framing, leaving the message's raw bytes.
    ///
    /// Validates the chain markers (0x01 first, 0xff after) and fails on a
    /// truncated chunk stream. Unwrapping a headerless buffer is a usage
    /// error.
    pub fn unwrap(&mut self) -> Result<&[u8], FrameError> {
        if !self.has_header() {
            return Err(FrameError::MissingHeader);
        }
        let first_len = self.raw[0] as usize;
        let first_marker = self.raw[1];
        if first_marker != CHUNK_FIRST {
            return Err(FrameError::BadFirstChunk(first_marker));
        }

        let payload = if first_len < CHUNK_MAX {
            let available = self.raw.len() - 2;
            if available < first_len {
                return Err(FrameError::Truncated {
                    chunk: 1,
                    declared: first_len,
                    available,
                });
            }
            self.raw[2..2 + first_len].to_vec()
        } else {
            let mut payload = Vec::with_capacity(self.raw.len());
            let mut pos = 0;
            let mut chunk = 0;
            while pos < self.raw.len() {
                chunk += 1;
                if self.raw.len() - pos < 2 {
                    return Err(FrameError::Truncated {
                        chunk,
                        declared: 2,
                        available: self.raw.len() - pos,
                    });
                }
                let size = self.raw[pos] as usize;
                let marker = self.raw[pos + 1];
                if chunk > 1 && marker != CHUNK_NEXT {
                    return Err(FrameError::BrokenChain { chunk, marker });
                }
                pos += 2;
                if self.raw.len() - pos < size {
                    return Err(FrameError::Truncated {
                        chunk,
                        declared: size,
                        available: self.raw.len() - pos,
                    });
                }
                payload.extend_from_slice(&self.raw[pos..pos + size]);
                pos += size;
            }
            payload
        };

        // The payload must at least cover its own inner-length + sub-header.
        if payload.len() < 4 {
            return Err(FrameError::Truncated {
                chunk: 1,
                declared: 4,
                available: payload.len(),
            });
        }
        self.raw = payload[4..].to_vec();
        Ok(&self.raw)
    }
}

/// Whether `buf` holds a complete chunk chain.
///
/// Used by receive loops to read until framing completion instead of relying
/// on read timing: returns `Ok(false)` while more bytes are needed,
/// `Ok(true)` once the chain has fully arrived (a terminal chunk shorter than
/// 0xff, or the accumulated payload matching inner-length + 2 exactly), and
/// an error on marker corruption.
pub fn wire_complete(buf: &[u8]) -> Result<bool, FrameError> {
    if buf.len() < 2 {
        return Ok(false);
    }
    if buf[1] != CHUNK_FIRST {
        return Err(FrameError::BadFirstChunk(buf[1]));
    }
    let first_len = buf[0] as usize;
    if first_len < CHUNK_MAX {
        return Ok(buf.len() >= 2 + first_len);
    }

    let mut pos = 0;
    let mut chunk = 0;
    let mut payload = 0usize;
    let mut inner: Option<usize> = None;
    while pos < buf.len() {
        if buf.len() - pos < 2 {
            return Ok(false);
        }
        chunk += 1;
        let size = buf[pos] as usize;
        let marker = buf[pos + 1];
        if chunk > 1 && marker != CHUNK_NEXT {
            return Err(FrameError::BrokenChain { chunk, marker });
        }
        pos += 2;
        if buf.len() - pos < size {
            return Ok(false);
        }
        pos += size;
        payload += size;
        if inner.is_none() && payload >= 2 {
            inner = Some(u16::from_be_bytes([buf[2], buf[3]]) as usize);
        }
        if size < CHUNK_MAX {
            return Ok(true);
        }
        // The inner-length field wraps modulo 2^16, so a payload that merely
        // exceeds it proves nothing on oversized streams. Only an exact match
        // marks a chain that ends on a full chunk.
        if let Some(il) = inner {
            if payload == il + 2 {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_unwrap(payload: Vec<u8>) {
        let mut pkt = Packet::new(payload.clone());
        pkt.wrap().expect("wrap");
        assert!(pkt.has_header());
        pkt.unwrap().expect("unwrap");
        assert_eq!(pkt.raw(), payload.as_slice());
    }

    #[test]
    fn test_roundtrip_sizes() {
        for size in [0usize, 250, 255, 1000, 70000] {
            wrap_unwrap((0..size).map(|i| i as u8).collect());
        }
    }

    #[test]
    fn test_short_form_layout() {
        let mut pkt = Packet::new(vec![0xaa; 10]);
        let raw = pkt.wrap().unwrap();
        assert_eq!(raw[0], 14); // payload + 4 bytes of inner framing
        assert_eq!(raw[1], CHUNK_FIRST);
        assert_eq!(&raw[2..4], &12u16.to_be_bytes()); // inner length, big-endian
        assert_eq!(&raw[4..6], b"M2");
        assert_eq!(&raw[6..], &[0xaa; 10]);
    }

    #[test]
    fn test_long_form_markers() {
        let mut pkt = Packet::new(vec![0xbb; 1000]);
        let raw = pkt.wrap().unwrap().to_vec();

        let mut pos = 0;
        let mut markers = Vec::new();
        while pos < raw.len() {
            let size = raw[pos] as usize;
            markers.push(raw[pos + 1]);
            pos += 2 + size;
        }
        assert!(markers.len() > 1);
        assert_eq!(markers[0], CHUNK_FIRST);
        assert!(markers[1..].iter().all(|m| *m == CHUNK_NEXT));
    }

    #[test]
    fn test_boundary_single_vs_multi_chunk() {
        // 250 + 4 = 254 still fits one short chunk
        let mut pkt = Packet::new(vec![0; 250]);
        let raw = pkt.wrap().unwrap();
        assert_eq!(raw.len(), 2 + 254);

        // 251 + 4 = 255 switches to the chunked regime
        let mut pkt = Packet::new(vec![0; 251]);
        let raw = pkt.wrap().unwrap();
        assert_eq!(raw[0] as usize, CHUNK_MAX);
    }

    #[test]
    fn test_broken_chain_marker_fails() {
        let mut pkt = Packet::new(vec![0xcc; 1000]);
        let mut raw = pkt.wrap().unwrap().to_vec();

        // Second chunk header sits right after the first full chunk.
        let second_marker = 2 + CHUNK_MAX + 1;
        assert_eq!(raw[second_marker], CHUNK_NEXT);
        raw[second_marker] = 0x7f;

        let mut corrupt = Packet::new(raw);
        assert!(matches!(
            corrupt.unwrap(),
            Err(FrameError::BrokenChain { chunk: 2, marker: 0x7f })
        ));
    }

    #[test]
    fn test_bad_first_marker_fails() {
        let mut pkt = Packet::new(vec![0xdd; 50]);
        let mut raw = pkt.wrap().unwrap().to_vec();
        raw[1] = 0x02;
        let mut corrupt = Packet::new(raw);
        assert!(matches!(corrupt.unwrap(), Err(FrameError::BadFirstChunk(0x02))));
    }

    #[test]
    fn test_truncated_chunk_stream_fails() {
        let mut pkt = Packet::new(vec![0xee; 1000]);
        let raw = pkt.wrap().unwrap().to_vec();
        let cut = raw.len() - 100;
        let mut truncated = Packet::new(raw[..cut].to_vec());
        assert!(matches!(truncated.unwrap(), Err(FrameError::Truncated { .. })));
    }

    #[test]
    fn test_double_wrap_is_usage_error() {
        let mut pkt = Packet::new(vec![1, 2, 3]);
        pkt.wrap().unwrap();
        assert_eq!(pkt.wrap(), Err(FrameError::AlreadyWrapped));
    }

    #[test]
    fn test_unwrap_without_header_is_usage_error() {
        let mut pkt = Packet::new(vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(pkt.unwrap(), Err(FrameError::MissingHeader));
    }

    #[test]
    fn test_wire_complete_incremental() {
        let mut pkt = Packet::new(vec![0x11; 1000]);
        let raw = pkt.wrap().unwrap().to_vec();

        assert!(!wire_complete(&[]).unwrap());
        assert!(!wire_complete(&raw[..1]).unwrap());
        for cut in [2, 100, 257, raw.len() - 1] {
            assert!(!wire_complete(&raw[..cut]).unwrap(), "cut at {cut}");
        }
        assert!(wire_complete(&raw).unwrap());
    }

    #[test]
    fn test_wire_complete_oversized_stream_not_early() {
        // 70000 bytes of message: the inner-length field holds
        // (70002 mod 2^16) = 4466, far below the real stream size.
        let mut pkt = Packet::new(vec![0x44; 70000]);
        let raw = pkt.wrap().unwrap().to_vec();

        // 20 full chunks carry 5100 payload bytes, already past the wrapped
        // inner-length; the stream must still read as incomplete.
        assert!(!wire_complete(&raw[..20 * 257]).unwrap());
        for cut in [2, 300, 30000, raw.len() - 1] {
            assert!(!wire_complete(&raw[..cut]).unwrap(), "cut at {cut}");
        }
        assert!(wire_complete(&raw).unwrap());
    }

    #[test]
    fn test_wire_complete_chain_ending_on_full_chunk() {
        // 506 message bytes frame to exactly two full chunks, so termination
        // rests on the inner-length match alone.
        let mut pkt = Packet::new(vec![0x55; 506]);
        let raw = pkt.wrap().unwrap().to_vec();
        assert_eq!(raw.len(), 2 * 257);
        assert!(!wire_complete(&raw[..257]).unwrap());
        assert!(wire_complete(&raw).unwrap());
    }

    #[test]
    fn test_wire_complete_short_packet() {
        let mut pkt = Packet::new(vec![0x22; 30]);
        let raw = pkt.wrap().unwrap().to_vec();
        assert!(!wire_complete(&raw[..raw.len() - 1]).unwrap());
        assert!(wire_complete(&raw).unwrap());
    }

    #[test]
    fn test_wire_complete_detects_corruption() {
        let mut pkt = Packet::new(vec![0x33; 600]);
        let mut raw = pkt.wrap().unwrap().to_vec();
        raw[2 + CHUNK_MAX + 1] = 0x00;
        assert!(wire_complete(&raw).is_err());
    }

    #[test]
    fn test_empty_payload_roundtrip_layout() {
        let mut pkt = Packet::new(Vec::new());
        let raw = pkt.wrap().unwrap();
        assert_eq!(raw, &[0x04, 0x01, 0x00, 0x02, b'M', b'2']);
        pkt.unwrap().unwrap();
        assert!(pkt.raw().is_empty());
    }
}
