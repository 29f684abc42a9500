//! Command frames: arrays of bulk strings.

use std::ops::Range;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{parse_header, read_line, read_payload, CRLF, MAX_FRAME_SIZE};
use crate::error::FrameError;

/// Upper bound on array length accepted from a client.
const MAX_ELEMENTS: i64 = 1024;

/// Outcome of scanning the front of a buffer for one command.
enum Parsed {
    Complete(Vec<Range<usize>>, usize),
    Incomplete,
    /// An element would push the frame past [`MAX_FRAME_SIZE`]. Its payload
    /// starts at `payload_start`; `elements_left` more follow it.
    Oversized {
        payload_start: usize,
        len: usize,
        elements_left: usize,
    },
}

fn split_frame(buf: &mut BytesMut, ranges: Vec<Range<usize>>, consumed: usize) -> Vec<Bytes> {
    let frame = buf.split_to(consumed).freeze();
    ranges.into_iter().map(|r| frame.slice(r)).collect()
}

fn parse_command(src: &[u8]) -> Result<Parsed, FrameError> {
    let Some((header, mut pos)) = read_line(src, 0) else {
        return Ok(Parsed::Incomplete);
    };
    let count = parse_header(header, b'*')?;
    if !(0..=MAX_ELEMENTS).contains(&count) {
        return Err(FrameError::Malformed(format!(
            "unsupported array length {}",
            count
        )));
    }

    let mut elements = Vec::with_capacity(count as usize);
    for index in 0..count {
        let Some((header, start)) = read_line(src, pos) else {
            return Ok(Parsed::Incomplete);
        };
        let len = element_len(header)?;
        if start + len + CRLF.len() > MAX_FRAME_SIZE {
            return Ok(Parsed::Oversized {
                payload_start: start,
                len,
                elements_left: (count - index - 1) as usize,
            });
        }
        let Some((range, next)) = read_payload(src, start, len as i64, MAX_FRAME_SIZE)? else {
            return Ok(Parsed::Incomplete);
        };
        elements.push(range);
        pos = next;
    }

    Ok(Parsed::Complete(elements, pos))
}

fn element_len(header: &[u8]) -> Result<usize, FrameError> {
    let len = parse_header(header, b'$')?;
    usize::try_from(len)
        .map_err(|_| FrameError::Malformed("null element in command".to_string()))
}

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Command(Vec<Bytes>),
    /// A well-formed command too large to buffer, dropped unread
    Skipped,
}

/// Bytes of an oversized command still to be dropped.
#[derive(Debug, Clone, Copy)]
struct Discard {
    /// Rest of the current element's payload, CRLF included
    bytes: usize,
    /// Elements after the current one
    elements: usize,
}

// == Command Decoder ==
/// Decoder for a client stream.
///
/// Frames may arrive split across calls or several per buffer. An element
/// too large to buffer does not fail the stream: the frame's declared bytes
/// are discarded as they arrive and the frame decodes to [`Frame::Skipped`],
/// so later pipelined commands stay aligned with their replies.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    discard: Option<Discard>,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next frame from the front of `buf`, consuming its bytes.
    ///
    /// Returns `Ok(None)` when more input is needed. On error the decoder
    /// resets; the caller should drop the buffered input.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let result = self.decode_inner(buf);
        if result.is_err() {
            self.discard = None;
        }
        result
    }

    fn decode_inner(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if self.discard.is_none() {
            match parse_command(buf)? {
                Parsed::Complete(ranges, consumed) => {
                    return Ok(Some(Frame::Command(split_frame(buf, ranges, consumed))));
                }
                Parsed::Incomplete if buf.len() > MAX_FRAME_SIZE => {
                    return Err(FrameError::TooLarge(MAX_FRAME_SIZE));
                }
                Parsed::Incomplete => return Ok(None),
                Parsed::Oversized {
                    payload_start,
                    len,
                    elements_left,
                } => {
                    buf.advance(payload_start);
                    self.discard = Some(Discard {
                        bytes: len + CRLF.len(),
                        elements: elements_left,
                    });
                }
            }
        }

        if self.skip(buf)? {
            self.discard = None;
            Ok(Some(Frame::Skipped))
        } else {
            Ok(None)
        }
    }

    /// Drops discarded bytes from `buf`. Returns true once the frame is gone.
    fn skip(&mut self, buf: &mut BytesMut) -> Result<bool, FrameError> {
        let Some(discard) = self.discard.as_mut() else {
            return Ok(true);
        };
        loop {
            let n = discard.bytes.min(buf.len());
            buf.advance(n);
            discard.bytes -= n;
            if discard.bytes > 0 {
                return Ok(false);
            }
            if discard.elements == 0 {
                return Ok(true);
            }

            let Some((header, start)) = read_line(buf, 0) else {
                return if buf.len() > MAX_FRAME_SIZE {
                    Err(FrameError::TooLarge(MAX_FRAME_SIZE))
                } else {
                    Ok(false)
                };
            };
            let len = element_len(header)?;
            buf.advance(start);
            discard.bytes = len + CRLF.len();
            discard.elements -= 1;
        }
    }
}

/// Returns the key of a two-element `GET key` command.
///
/// The command name is matched case-insensitively; any other shape yields `None`.
pub fn match_get(parts: &[Bytes]) -> Option<&Bytes> {
    match parts {
        [cmd, key] if cmd.eq_ignore_ascii_case(b"GET") => Some(key),
        _ => None,
    }
}

/// Encodes a command as an array of bulk strings.
pub fn encode_command(parts: &[&[u8]]) -> Bytes {
    let mut out = BytesMut::new();
    out.put_slice(format!("*{}", parts.len()).as_bytes());
    out.put_slice(CRLF);
    for part in parts {
        out.put_slice(format!("${}", part.len()).as_bytes());
        out.put_slice(CRLF);
        out.put_slice(part);
        out.put_slice(CRLF);
    }
    out.freeze()
}
