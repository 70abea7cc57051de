//! Protocol constants for the Winbox wire format.
//!
//! These values are fixed by the protocol and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// FRAMING
// =============================================================================

/// The 2-byte sub-header marker (`M2`) preceding every framed message body.
pub const M2_HEADER: [u8; 2] = *b"M2";

/// Chain marker carried by the first chunk of a packet.
pub const CHUNK_FIRST: u8 = 0x01;

/// Chain marker carried by every chunk after the first.
pub const CHUNK_NEXT: u8 = 0xff;

/// Maximum payload bytes a single chunk can carry.
pub const CHUNK_MAX: usize = 0xff;

// =============================================================================
// TRANSPORT DEFAULTS
// =============================================================================

/// Default Winbox service TCP port.
pub const DEFAULT_PORT: u16 = 8291;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default single-read size when polling for a reply fragment.
pub const DEFAULT_FRAGMENT_SIZE: usize = 1460;

/// Default file-download part size requested per transfer round.
pub const DEFAULT_PART_SIZE: usize = 32168;

// =============================================================================
// SYSTEM FIELD IDS
// =============================================================================

/// Destination handler pair for a request.
pub const SYS_TO: u32 = 0xff0001;

/// Source handler pair for a request.
pub const SYS_FROM: u32 = 0xff0002;

/// Message type (request or reply).
pub const SYS_TYPE: u32 = 0xff0003;

/// Reply status.
pub const SYS_STATUS: u32 = 0xff0004;

/// Set to expect a reply after a request.
pub const SYS_REPLYEXP: u32 = 0xff0005;

/// Per-session request id correlating a request with its reply.
pub const SYS_REQID: u32 = 0xff0006;

/// Command code to execute.
pub const SYS_CMD: u32 = 0xff0007;

/// Remote error code in a reply.
pub const SYS_ERRNO: u32 = 0xff0008;

/// Human-readable remote error description in a reply.
pub const SYS_ERRSTR: u32 = 0xff0009;

/// Authenticated user name.
pub const SYS_USER: u32 = 0xff000a;

/// Policy bitmask of the authenticated user.
pub const SYS_POLICY: u32 = 0xff000b;

/// Control channel field.
pub const SYS_CTRL: u32 = 0xff000d;

/// Control channel argument field.
pub const SYS_CTRL_ARG: u32 = 0xff000f;

/// Request originator.
pub const SYS_ORIGINATOR: u32 = 0xff0012;

/// Remote IPv6 address of the requester.
pub const SYS_RADDR6: u32 = 0xff0013;

// =============================================================================
// STANDARD COMMAND CODES
// =============================================================================

/// Query the policies of the current session.
pub const CMD_GETPOLICIES: u32 = 0xfe0001;

/// Fetch a single object by id.
pub const CMD_GETOBJ: u32 = 0xfe0002;

/// Mutate a single object by id.
pub const CMD_SETOBJ: u32 = 0xfe0003;

/// Enumerate all objects of a handler.
pub const CMD_GETALL: u32 = 0xfe0004;

/// Asynchronous notification.
pub const CMD_NOTIFY: u32 = 0xfe000b;

/// Fetch a value.
pub const CMD_GET: u32 = 0xfe000d;

/// Subscribe to change notifications.
pub const CMD_SUBSCRIBE: u32 = 0xfe0012;

// =============================================================================
// STANDARD FIELD IDS
// =============================================================================

/// Server-assigned session (or download-session) identifier.
pub const STD_ID: u32 = 0xfe0001;

/// Object list in a `CMD_GETALL` reply.
pub const STD_OBJS: u32 = 0xfe0002;

/// Get-all continuation id.
pub const STD_GETALLID: u32 = 0xfe0003;

/// Get-all continuation counter.
pub const STD_GETALLNO: u32 = 0xfe0004;

/// Next object id.
pub const STD_NEXTID: u32 = 0xfe0005;

/// Undo id.
pub const STD_UNDOID: u32 = 0xfe0006;

/// Object is dynamic.
pub const STD_DYNAMIC: u32 = 0xfe0007;

/// Object is inactive.
pub const STD_INACTIVE: u32 = 0xfe0008;

/// Object description string.
pub const STD_DESCR: u32 = 0xfe0009;

/// Object is disabled.
pub const STD_DISABLED: u32 = 0xfe000a;

/// Operation finished marker.
pub const STD_FINISHED: u32 = 0xfe000b;

/// Query filter.
pub const STD_FILTER: u32 = 0xfe000c;

/// Object is dead.
pub const STD_DEAD: u32 = 0xfe0013;

/// Object count in an enumeration reply.
pub const STD_OBJ_COUNT: u32 = 0xfe0019;

// =============================================================================
// MESSAGE TYPES AND STATUS
// =============================================================================

/// `SYS_TYPE` value marking a request.
pub const TYPE_REQUEST: u32 = 1;

/// `SYS_TYPE` value marking a reply.
pub const TYPE_REPLY: u32 = 2;

/// `SYS_STATUS` value for success.
pub const STATUS_OK: u32 = 1;

/// `SYS_STATUS` value for failure.
pub const STATUS_ERROR: u32 = 2;

// =============================================================================
// REMOTE ERROR CODES
// =============================================================================

/// Unknown error.
pub const ERROR_UNKNOWN: u32 = 0xfe0001;

/// Unknown object id.
pub const ERROR_UNKNOWNID: u32 = 0xfe0004;

/// Operation failed; the reply carries a description string.
pub const ERROR_FAILED: u32 = 0xfe0006;

/// Object already exists.
pub const ERROR_EXISTS: u32 = 0xfe0007;

/// Operation not allowed for the current policy.
pub const ERROR_NOTALLOWED: u32 = 0xfe0009;

/// Value or object too big.
pub const ERROR_TOOBIG: u32 = 0xfe000a;

/// Handler busy.
pub const ERROR_BUSY: u32 = 0xfe000c;

/// Operation timed out on the remote side.
pub const ERROR_TIMEOUT: u32 = 0xfe000d;
