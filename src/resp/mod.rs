//! RESP Module
//!
//! Minimal Redis serialization protocol codec shared by the wire frontend
//! and the backing store client.
//!
//! Only what the proxy speaks is supported: arrays of bulk strings on the
//! request side, and simple/error/integer/bulk replies on the reply side.

mod command;
mod reply;

use crate::error::FrameError;

pub use command::{encode_command, match_get, CommandDecoder, Frame};
pub use reply::{decode_reply, encode_bulk, encode_error, Reply};

// == Public Constants ==
/// Largest command frame accepted from a client
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Largest bulk reply accepted from the backing store (Redis's own string limit)
pub const MAX_REPLY_SIZE: usize = 512 * 1024 * 1024;

/// Line terminator
pub(crate) const CRLF: &[u8] = b"\r\n";

/// Returns the line starting at `start` (without CRLF) and the offset past it.
pub(crate) fn read_line(src: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = src.get(start..)?;
    let idx = rest.windows(2).position(|w| w == CRLF)?;
    Some((&rest[..idx], start + idx + 2))
}

/// Parses a `<prefix><integer>` header line.
pub(crate) fn parse_header(line: &[u8], prefix: u8) -> Result<i64, FrameError> {
    match line.split_first() {
        Some((first, digits)) if *first == prefix => std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                FrameError::Malformed(format!(
                    "bad length in header {:?}",
                    String::from_utf8_lossy(line)
                ))
            }),
        _ => Err(FrameError::Malformed(format!(
            "expected '{}' header",
            prefix as char
        ))),
    }
}

/// Reads a bulk payload of `len` bytes at `start`, followed by CRLF.
///
/// Returns the payload range and the offset past the trailing CRLF, or
/// `None` when more input is needed. Payloads over `limit` are rejected.
pub(crate) fn read_payload(
    src: &[u8],
    start: usize,
    len: i64,
    limit: usize,
) -> Result<Option<(std::ops::Range<usize>, usize)>, FrameError> {
    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= limit)
        .ok_or(FrameError::TooLarge(limit))?;
    let end = start + len;
    if src.len() < end + CRLF.len() {
        return Ok(None);
    }
    if &src[end..end + CRLF.len()] != CRLF {
        return Err(FrameError::Malformed(
            "bulk payload not terminated by CRLF".to_string(),
        ));
    }
    Ok(Some((start..end, end + CRLF.len())))
}
