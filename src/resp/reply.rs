//! Reply frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::{parse_header, read_line, read_payload, CRLF, MAX_FRAME_SIZE, MAX_REPLY_SIZE};
use crate::error::FrameError;

/// A decoded reply from a RESP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Simple(String),
    /// `-ERR ...`
    Error(String),
    /// `:1`
    Integer(i64),
    /// `$3\r\nbar` or the null bulk `$-1`
    Bulk(Option<Bytes>),
}

/// Encodes a bulk string reply; `None` becomes the null bulk `$-1\r\n`.
pub fn encode_bulk(value: Option<&[u8]>) -> Bytes {
    match value {
        Some(value) => {
            let mut out = BytesMut::with_capacity(value.len() + 16);
            out.put_slice(format!("${}", value.len()).as_bytes());
            out.put_slice(CRLF);
            out.put_slice(value);
            out.put_slice(CRLF);
            out.freeze()
        }
        None => Bytes::from_static(b"$-1\r\n"),
    }
}

/// Encodes an error reply. Line breaks in `message` are replaced by spaces.
pub fn encode_error(message: &str) -> Bytes {
    let line = message.replace(['\r', '\n'], " ");
    Bytes::from(format!("-{}\r\n", line))
}

/// Decodes one reply from the front of `buf`.
///
/// Returns `Ok(None)` when more input is needed. Bulk payloads may be as large
/// as [`MAX_REPLY_SIZE`]; only a header line is held to [`MAX_FRAME_SIZE`].
pub fn decode_reply(buf: &mut BytesMut) -> Result<Option<Reply>, FrameError> {
    let Some((line, next)) = read_line(buf, 0) else {
        return if buf.len() > MAX_FRAME_SIZE {
            Err(FrameError::TooLarge(MAX_FRAME_SIZE))
        } else {
            Ok(None)
        };
    };

    let (reply, consumed) = match line.first() {
        Some(b'+') => (Reply::Simple(text(&line[1..])), next),
        Some(b'-') => (Reply::Error(text(&line[1..])), next),
        Some(b':') => (Reply::Integer(parse_header(line, b':')?), next),
        Some(b'$') => {
            let len = parse_header(line, b'$')?;
            if len < 0 {
                (Reply::Bulk(None), next)
            } else {
                let Some((range, end)) = read_payload(buf, next, len, MAX_REPLY_SIZE)? else {
                    return Ok(None);
                };
                let frame = buf.split_to(end).freeze();
                return Ok(Some(Reply::Bulk(Some(frame.slice(range)))));
            }
        }
        _ => {
            return Err(FrameError::Malformed(format!(
                "unexpected reply {:?}",
                String::from_utf8_lossy(line)
            )))
        }
    };

    let _ = buf.split_to(consumed);
    Ok(Some(reply))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
