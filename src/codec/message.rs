//! The tagged-record message codec.
//!
//! A [`Message`] is an ordered sequence of fields, each a (24-bit id, type,
//! value) triple. `build` serializes the fields in insertion order; `parse`
//! recovers fields from raw bytes. Field order matters for wire reproduction,
//! lookup is by (id, type) with first match winning, and duplicate ids are
//! permitted.
//!
//! Wire layout per field: a 4-byte little-endian type word, then an optional
//! length prefix, then the value bytes. Integers are little-endian. The two
//! big-endian exceptions (packet inner length, message-array element length)
//! are a protocol quirk preserved for interoperability.

use crate::core::constants::M2_HEADER;
use crate::core::error::CodecError;

use super::value::{bits, BaseType, FieldType, Value};

/// One (id, type, value) entry of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// 24-bit field identifier.
    pub id: u32,
    /// Typed field value.
    pub value: Value,
}

/// An ordered collection of typed, identified fields.
///
/// A message starts out unbuilt (fields only). [`Message::build`] produces and
/// caches the raw wire bytes; [`Message::parse`] consumes raw bytes into
/// fields. Querying with [`Message::get`] requires the message to have been
/// parsed (or explicitly marked ready via [`Message::mark_ready`]).
#[derive(Debug, Clone, Default)]
pub struct Message {
    fields: Vec<Field>,
    raw: Option<Vec<u8>>,
    parsed: bool,
}

impl PartialEq for Message {
    /// Messages compare by their fields; cached raw bytes and parse state are
    /// transient.
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unparsed message holding raw wire bytes.
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self {
            fields: Vec::new(),
            raw: Some(raw),
            parsed: false,
        }
    }

    /// Parse raw wire bytes directly into a queryable message.
    pub fn parse_bytes(raw: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            fields: parse_fields(raw)?,
            raw: Some(raw.to_vec()),
            parsed: true,
        })
    }

    /// Reset fields, raw bytes, and parse state so the message can be reused.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.raw = None;
        self.parsed = false;
    }

    /// The fields currently held, in insertion (or wire) order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The cached raw bytes, if the message has been built or set from raw.
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Replace the raw wire bytes (clears parse state).
    pub fn set_raw(&mut self, raw: Vec<u8>) {
        self.raw = Some(raw);
        self.parsed = false;
    }

    /// Allow queries on a message that was assembled by hand rather than
    /// parsed off the wire.
    pub fn mark_ready(&mut self) {
        self.parsed = true;
    }

    // =========================================================================
    // FIELD INSERTION
    // =========================================================================

    /// Append an arbitrary field.
    pub fn add(&mut self, id: u32, value: Value) {
        self.fields.push(Field { id, value });
    }

    /// Append a boolean field.
    pub fn add_bool(&mut self, id: u32, value: bool) {
        self.add(id, Value::Bool(value));
    }

    /// Append a u32 field.
    pub fn add_u32(&mut self, id: u32, value: u32) {
        self.add(id, Value::U32(value));
    }

    /// Append a u64 field.
    pub fn add_u64(&mut self, id: u32, value: u64) {
        self.add(id, Value::U64(value));
    }

    /// Append a 16-byte address field.
    pub fn add_addr6(&mut self, id: u32, value: [u8; 16]) {
        self.add(id, Value::Addr6(value));
    }

    /// Append a byte-string field.
    pub fn add_string(&mut self, id: u32, value: impl Into<Vec<u8>>) {
        self.add(id, Value::String(value.into()));
    }

    /// Append an opaque-bytes field.
    pub fn add_raw(&mut self, id: u32, value: impl Into<Vec<u8>>) {
        self.add(id, Value::Raw(value.into()));
    }

    /// Append a nested-message field.
    pub fn add_message(&mut self, id: u32, value: Message) {
        self.add(id, Value::Message(value));
    }

    /// Append an array-of-u32 field.
    pub fn add_u32_array(&mut self, id: u32, value: Vec<u32>) {
        self.add(id, Value::U32Array(value));
    }

    /// Append an array-of-messages field.
    pub fn add_message_array(&mut self, id: u32, value: Vec<Message>) {
        self.add(id, Value::MessageArray(value));
    }

    // =========================================================================
    // WELL-KNOWN SYSTEM FIELDS
    // =========================================================================

    /// Set the destination handler (and optional subhandler) of a request.
    pub fn set_to(&mut self, handler: u32, subhandler: Option<u32>) {
        let mut pair = vec![handler];
        pair.extend(subhandler);
        self.add(crate::core::SYS_TO, Value::U32Array(pair));
    }

    /// Set the source handler (and optional subhandler) of a request.
    pub fn set_from(&mut self, handler: u32, subhandler: Option<u32>) {
        let mut pair = vec![handler];
        pair.extend(subhandler);
        self.add(crate::core::SYS_FROM, Value::U32Array(pair));
    }

    /// Set the command code to execute.
    pub fn set_command(&mut self, command: u32) {
        self.add_u32(crate::core::SYS_CMD, command);
    }

    /// Set the request id correlating this request with its reply.
    pub fn set_request_id(&mut self, id: u32) {
        self.add_u32(crate::core::SYS_REQID, id);
    }

    /// Set whether a reply is expected for this request.
    pub fn set_reply_expected(&mut self, value: bool) {
        self.add_bool(crate::core::SYS_REPLYEXP, value);
    }

    /// Set the session id this request belongs to.
    pub fn set_session_id(&mut self, id: u32) {
        self.add_u32(crate::core::STD_ID, id);
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Look up the first field matching (id, type).
    ///
    /// Fails with [`CodecError::NotParsed`] unless the message has been parsed
    /// or marked ready.
    pub fn get(&self, id: u32, ty: FieldType) -> Result<Option<&Value>, CodecError> {
        if !self.parsed {
            return Err(CodecError::NotParsed);
        }
        Ok(self
            .fields
            .iter()
            .find(|f| f.id == id && f.value.field_type() == ty)
            .map(|f| &f.value))
    }

    /// Whether a field with the given (id, type) is present, with any value.
    pub fn has(&self, id: u32, ty: FieldType) -> Result<bool, CodecError> {
        Ok(self.get(id, ty)?.is_some())
    }

    /// Get a boolean field.
    pub fn get_bool(&self, id: u32) -> Result<Option<bool>, CodecError> {
        Ok(match self.get(id, FieldType::BOOL)? {
            Some(Value::Bool(v)) => Some(*v),
            _ => None,
        })
    }

    /// Get a u32 field.
    pub fn get_u32(&self, id: u32) -> Result<Option<u32>, CodecError> {
        Ok(match self.get(id, FieldType::U32)? {
            Some(Value::U32(v)) => Some(*v),
            _ => None,
        })
    }

    /// Get a u64 field.
    pub fn get_u64(&self, id: u32) -> Result<Option<u64>, CodecError> {
        Ok(match self.get(id, FieldType::U64)? {
            Some(Value::U64(v)) => Some(*v),
            _ => None,
        })
    }

    /// Get a byte-string field.
    pub fn get_string(&self, id: u32) -> Result<Option<&[u8]>, CodecError> {
        Ok(match self.get(id, FieldType::STRING)? {
            Some(Value::String(v)) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Get an opaque-bytes field.
    pub fn get_raw(&self, id: u32) -> Result<Option<&[u8]>, CodecError> {
        Ok(match self.get(id, FieldType::RAW)? {
            Some(Value::Raw(v)) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Get a nested-message field.
    pub fn get_message(&self, id: u32) -> Result<Option<&Message>, CodecError> {
        Ok(match self.get(id, FieldType::MESSAGE)? {
            Some(Value::Message(v)) => Some(v),
            _ => None,
        })
    }

    /// Get an array-of-u32 field.
    pub fn get_u32_array(&self, id: u32) -> Result<Option<&[u32]>, CodecError> {
        Ok(match self.get(id, FieldType::U32_ARRAY)? {
            Some(Value::U32Array(v)) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Get an array-of-messages field.
    pub fn get_message_array(&self, id: u32) -> Result<Option<&[Message]>, CodecError> {
        Ok(match self.get(id, FieldType::MESSAGE_ARRAY)? {
            Some(Value::MessageArray(v)) => Some(v.as_slice()),
            _ => None,
        })
    }

    // =========================================================================
    // BUILD / PARSE
    // =========================================================================

    /// Serialize the fields and cache the result as this message's raw bytes.
    ///
    /// Building twice without modifying the fields yields identical bytes.
    pub fn build(&mut self) -> Result<&[u8], CodecError> {
        let raw = self.to_bytes()?;
        self.raw = Some(raw);
        Ok(self.raw.as_deref().unwrap_or_default())
    }

    /// Serialize the fields without touching the cached raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        for field in &self.fields {
            encode_field(&mut buf, field)?;
        }
        Ok(buf)
    }

    /// Parse the cached raw bytes into fields, appending to any already held.
    pub fn parse(&mut self) -> Result<(), CodecError> {
        let raw = self.raw.as_deref().ok_or(CodecError::NoRawData)?;
        let mut fields = parse_fields(raw)?;
        self.fields.append(&mut fields);
        self.parsed = true;
        Ok(())
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Short form applies to lengths and one-byte integer values below 0xff.
fn fits_short(n: usize) -> bool {
    n < 0xff
}

fn encode_len(buf: &mut Vec<u8>, word: &mut u32, len: usize) -> Result<(), CodecError> {
    if fits_short(len) {
        *word |= bits::SHORTLEN;
        buf.push(len as u8);
    } else if len <= u16::MAX as usize {
        buf.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        return Err(CodecError::ValueTooLarge { len, max: 2 });
    }
    Ok(())
}

/// Serialize one nested message with its `M2` sub-header, returning the
/// length value to prefix (sub-message length + 2).
fn encode_sub_message(m: &Message) -> Result<(u16, Vec<u8>), CodecError> {
    let sub = m.to_bytes()?;
    let framed_len = sub.len() + M2_HEADER.len();
    if framed_len > u16::MAX as usize {
        return Err(CodecError::ValueTooLarge {
            len: sub.len(),
            max: 2,
        });
    }
    Ok((framed_len as u16, sub))
}

fn encode_field(buf: &mut Vec<u8>, field: &Field) -> Result<(), CodecError> {
    if field.id > bits::NAME_FILTER {
        return Err(CodecError::IdOutOfRange(field.id));
    }
    let mut word = field.id | field.value.field_type().type_bits();
    let mut body = Vec::new();

    match &field.value {
        Value::Bool(v) => {
            // The value bit shares the short-length position in the type word.
            word |= (*v as u32) << 24;
        }
        Value::U32(v) => {
            if fits_short(*v as usize) {
                word |= bits::SHORTLEN;
                body.push(*v as u8);
            } else {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }
        Value::U64(v) => body.extend_from_slice(&v.to_le_bytes()),
        Value::Addr6(v) => body.extend_from_slice(v),
        Value::String(v) | Value::Raw(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            body.extend_from_slice(v);
        }
        Value::Message(m) => {
            let (framed_len, sub) = encode_sub_message(m)?;
            body.extend_from_slice(&framed_len.to_le_bytes());
            body.extend_from_slice(&M2_HEADER);
            body.extend_from_slice(&sub);
        }
        Value::BoolArray(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            body.extend(v.iter().map(|b| *b as u8));
        }
        Value::U32Array(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            for e in v {
                body.extend_from_slice(&e.to_le_bytes());
            }
        }
        Value::U64Array(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            for e in v {
                body.extend_from_slice(&e.to_le_bytes());
            }
        }
        Value::Addr6Array(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            for e in v {
                body.extend_from_slice(e);
            }
        }
        Value::StringArray(v) | Value::RawArray(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            for e in v {
                if e.len() > u16::MAX as usize {
                    return Err(CodecError::ValueTooLarge { len: e.len(), max: 2 });
                }
                body.extend_from_slice(&(e.len() as u16).to_le_bytes());
                body.extend_from_slice(e);
            }
        }
        Value::MessageArray(v) => {
            encode_len(&mut body, &mut word, v.len())?;
            for m in v {
                let (framed_len, sub) = encode_sub_message(m)?;
                // Message-array element lengths are big-endian on the wire.
                body.extend_from_slice(&framed_len.to_be_bytes());
                body.extend_from_slice(&M2_HEADER);
                body.extend_from_slice(&sub);
            }
        }
    }

    buf.extend_from_slice(&word.to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(())
}

// =============================================================================
// DECODING
// =============================================================================

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                needed: n - self.remaining(),
                offset: self.pos,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u16_be(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32_le(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64_le(&mut self) -> Result<u64, CodecError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }

    fn addr6(&mut self) -> Result<[u8; 16], CodecError> {
        let mut b = [0u8; 16];
        b.copy_from_slice(self.take(16)?);
        Ok(b)
    }

    /// Read a length prefix: one byte in short form, u16 LE otherwise.
    fn length(&mut self, short: bool) -> Result<usize, CodecError> {
        Ok(if short {
            self.u8()? as usize
        } else {
            self.u16_le()? as usize
        })
    }

    /// Verify the 2-byte `M2` sub-header marker.
    fn sub_header(&mut self) -> Result<(), CodecError> {
        let hdr = self.take(2)?;
        if hdr != M2_HEADER {
            return Err(CodecError::SubHeaderMismatch([hdr[0], hdr[1]]));
        }
        Ok(())
    }

    /// Read one length-prefixed nested message body and parse it.
    ///
    /// `framed_len` counts the sub-header; the recursive payload is
    /// `framed_len - 2` bytes.
    fn sub_message(&mut self, framed_len: usize) -> Result<Message, CodecError> {
        if framed_len < M2_HEADER.len() {
            return Err(CodecError::Truncated {
                needed: M2_HEADER.len() - framed_len,
                offset: self.pos,
            });
        }
        self.sub_header()?;
        let body = self.take(framed_len - M2_HEADER.len())?;
        Ok(Message {
            fields: parse_fields(body)?,
            raw: None,
            parsed: true,
        })
    }
}

fn parse_fields(raw: &[u8]) -> Result<Vec<Field>, CodecError> {
    let mut cur = Cursor::new(raw);
    let mut fields = Vec::new();

    // Trailing 1-3 bytes are chunk-alignment padding, never a field.
    while cur.remaining() >= 4 {
        let word = cur.u32_le()?;
        let id = word & bits::NAME_FILTER;
        let short = word & bits::SHORTLEN != 0;
        let ty = FieldType::from_word(word).ok_or(CodecError::UnknownType(word))?;

        let value = if ty.array {
            let count = cur.length(short)?;
            match ty.base {
                BaseType::Bool => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        v.push(cur.u8()? != 0);
                    }
                    Value::BoolArray(v)
                }
                BaseType::U32 => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        v.push(cur.u32_le()?);
                    }
                    Value::U32Array(v)
                }
                BaseType::U64 => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        v.push(cur.u64_le()?);
                    }
                    Value::U64Array(v)
                }
                BaseType::Addr6 => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        v.push(cur.addr6()?);
                    }
                    Value::Addr6Array(v)
                }
                BaseType::String | BaseType::Raw => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        let len = cur.u16_le()? as usize;
                        v.push(cur.take(len)?.to_vec());
                    }
                    if ty.base == BaseType::String {
                        Value::StringArray(v)
                    } else {
                        Value::RawArray(v)
                    }
                }
                BaseType::Message => {
                    let mut v = Vec::with_capacity(count);
                    for _ in 0..count {
                        let framed_len = cur.u16_be()? as usize;
                        v.push(cur.sub_message(framed_len)?);
                    }
                    Value::MessageArray(v)
                }
            }
        } else {
            match ty.base {
                // A scalar boolean's value sits in the short-length bit.
                BaseType::Bool => Value::Bool(short),
                BaseType::U32 => Value::U32(if short {
                    cur.u8()? as u32
                } else {
                    cur.u32_le()?
                }),
                BaseType::U64 => Value::U64(cur.u64_le()?),
                BaseType::Addr6 => Value::Addr6(cur.addr6()?),
                BaseType::String => {
                    let len = cur.length(short)?;
                    Value::String(cur.take(len)?.to_vec())
                }
                BaseType::Raw => {
                    let len = cur.length(short)?;
                    Value::Raw(cur.take(len)?.to_vec())
                }
                BaseType::Message => {
                    let framed_len = cur.u16_le()? as usize;
                    Value::Message(cur.sub_message(framed_len)?)
                }
            }
        };

        fields.push(Field { id, value });
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SYS_CMD, SYS_TO};

    fn roundtrip(msg: &Message) -> Message {
        let raw = msg.to_bytes().expect("build");
        Message::parse_bytes(&raw).expect("parse")
    }

    #[test]
    fn test_roundtrip_scalars() {
        let mut msg = Message::new();
        msg.add_bool(1, true);
        msg.add_bool(2, false);
        msg.add_u32(3, 0);
        msg.add_u32(4, 0xdead_beef);
        msg.add_u64(5, 0x0102_0304_0506_0708);
        msg.add_addr6(6, [0xab; 16]);
        msg.add_string(7, b"list".to_vec());
        msg.add_raw(8, vec![0x00, 0xff, 0x7f]);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_roundtrip_arrays() {
        let mut inner = Message::new();
        inner.add_u32(1, 99);

        let mut msg = Message::new();
        msg.add(1, Value::BoolArray(vec![true, false, true]));
        msg.add_u32_array(2, vec![0, 1, 0xffff_ffff]);
        msg.add(3, Value::U64Array(vec![u64::MAX, 7]));
        msg.add(4, Value::Addr6Array(vec![[1; 16], [2; 16]]));
        msg.add(5, Value::StringArray(vec![b"a".to_vec(), b"bc".to_vec()]));
        msg.add(6, Value::RawArray(vec![vec![], vec![9, 9, 9]]));
        msg.add_message_array(7, vec![inner.clone(), inner]);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_roundtrip_nested_three_levels() {
        let mut leaf = Message::new();
        leaf.add_string(1, b"deep".to_vec());

        let mut mid = Message::new();
        mid.add_message(2, leaf);
        mid.add_u32(3, 42);

        let mut msg = Message::new();
        msg.add_message(4, mid);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_scalar_nested_message_decode() {
        // The scalar nested-message path keeps the outer field's own id.
        let mut inner = Message::new();
        inner.add_u32(0x10, 5);

        let mut msg = Message::new();
        msg.add_message(0x1234, inner);

        let parsed = roundtrip(&msg);
        let nested = parsed.get_message(0x1234).unwrap().expect("nested field");
        assert_eq!(nested.fields().len(), 1);
        assert_eq!(nested.fields()[0].id, 0x10);
    }

    #[test]
    fn test_u32_short_long_boundary() {
        let mut msg = Message::new();
        msg.add_u32(1, 254);
        // type word + 1 value byte
        assert_eq!(msg.to_bytes().unwrap().len(), 5);

        let mut msg = Message::new();
        msg.add_u32(1, 255);
        // type word + 4 value bytes
        assert_eq!(msg.to_bytes().unwrap().len(), 8);

        let mut both = Message::new();
        both.add_u32(1, 254);
        both.add_u32(2, 255);
        assert_eq!(roundtrip(&both), both);
    }

    #[test]
    fn test_string_short_long_boundary() {
        let mut msg = Message::new();
        msg.add_string(1, vec![b'x'; 254]);
        // type word + 1 length byte + payload
        assert_eq!(msg.to_bytes().unwrap().len(), 4 + 1 + 254);

        let mut msg = Message::new();
        msg.add_raw(1, vec![b'x'; 255]);
        // type word + 2 length bytes + payload
        assert_eq!(msg.to_bytes().unwrap().len(), 4 + 2 + 255);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_bool_packs_into_type_word() {
        let mut msg = Message::new();
        msg.add_bool(7, true);
        let raw = msg.to_bytes().unwrap();
        assert_eq!(raw.len(), 4);
        assert_eq!(roundtrip(&msg), msg);

        let mut msg = Message::new();
        msg.add_bool(7, false);
        assert_eq!(msg.to_bytes().unwrap().len(), 4);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_known_wire_bytes() {
        // u32 id=7 value=11: word 0x09000007 (U32 | SHORTLEN), one value byte
        let mut msg = Message::new();
        msg.add_u32(7, 11);
        assert_eq!(hex::encode(msg.to_bytes().unwrap()), "070000090b");

        // bool id=SYS_REPLYEXP value=true: the value bit lands on bit 24
        let mut msg = Message::new();
        msg.set_reply_expected(true);
        assert_eq!(hex::encode(msg.to_bytes().unwrap()), "0500ff01");
    }

    #[test]
    fn test_well_known_setters() {
        let mut msg = Message::new();
        msg.set_to(2, Some(2));
        msg.set_command(7);
        let parsed = roundtrip(&msg);
        assert_eq!(parsed.get_u32_array(SYS_TO).unwrap(), Some(&[2, 2][..]));
        assert_eq!(parsed.get_u32(SYS_CMD).unwrap(), Some(7));
    }

    #[test]
    fn test_build_idempotent() {
        let mut msg = Message::new();
        msg.set_to(2, Some(2));
        msg.add_string(1, b"list".to_vec());
        msg.add_u32(2, 1000);
        let first = msg.build().unwrap().to_vec();
        let second = msg.build().unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_fields_first_match_wins() {
        let mut msg = Message::new();
        msg.add_u32(1, 10);
        msg.add_u32(1, 20);
        let parsed = roundtrip(&msg);
        assert_eq!(parsed.get_u32(1).unwrap(), Some(10));
        assert_eq!(parsed.fields().len(), 2);
    }

    #[test]
    fn test_lookup_distinguishes_types() {
        let mut msg = Message::new();
        msg.add_u32(1, 10);
        msg.add_string(1, b"ten".to_vec());
        let parsed = roundtrip(&msg);
        assert_eq!(parsed.get_string(1).unwrap(), Some(&b"ten"[..]));
        assert_eq!(parsed.get_u32(1).unwrap(), Some(10));
        assert_eq!(parsed.get_u64(1).unwrap(), None);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut msg = Message::new();
        msg.add_u32(1, 5);
        let mut raw = msg.to_bytes().unwrap();
        raw.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
        let parsed = Message::parse_bytes(&raw).unwrap();
        assert_eq!(parsed.fields().len(), 1);
        assert_eq!(parsed.get_u32(1).unwrap(), Some(5));
    }

    #[test]
    fn test_unknown_type_word_fails() {
        // Base bits 0x38 are outside the closed type set.
        let word: u32 = 0x3800_0001;
        let raw = word.to_le_bytes();
        assert!(matches!(
            Message::parse_bytes(&raw),
            Err(CodecError::UnknownType(_))
        ));
    }

    #[test]
    fn test_subheader_mismatch_fails() {
        let mut inner = Message::new();
        inner.add_u32(1, 1);
        let mut msg = Message::new();
        msg.add_message(2, inner);
        let mut raw = msg.to_bytes().unwrap();
        // Corrupt the M2 marker that follows word (4) + length (2).
        raw[6] = b'X';
        assert!(matches!(
            Message::parse_bytes(&raw),
            Err(CodecError::SubHeaderMismatch(_))
        ));
    }

    #[test]
    fn test_truncated_fails() {
        let mut msg = Message::new();
        msg.add_string(1, vec![b'x'; 40]);
        let raw = msg.to_bytes().unwrap();
        assert!(matches!(
            Message::parse_bytes(&raw[..raw.len() - 10]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_get_before_parse_is_error() {
        let mut msg = Message::new();
        msg.add_u32(1, 5);
        assert_eq!(msg.get_u32(1), Err(CodecError::NotParsed));

        msg.mark_ready();
        assert_eq!(msg.get_u32(1).unwrap(), Some(5));
    }

    #[test]
    fn test_parse_without_raw_fails() {
        let mut msg = Message::new();
        assert_eq!(msg.parse(), Err(CodecError::NoRawData));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut msg = Message::new();
        msg.add_u32(1, 5);
        msg.build().unwrap();
        msg.clear();
        assert!(msg.fields().is_empty());
        assert!(msg.raw().is_none());
        assert_eq!(msg.get_u32(1), Err(CodecError::NotParsed));
    }

    #[test]
    fn test_id_out_of_range_fails() {
        let mut msg = Message::new();
        msg.add_u32(0x0100_0000, 5);
        assert!(matches!(
            msg.to_bytes(),
            Err(CodecError::IdOutOfRange(0x0100_0000))
        ));
    }
}
