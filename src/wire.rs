//! Wire frames for the streaming search endpoints
//!
//! Newline-delimited JSON: one `Book` object per line. A provider that
//! fails mid-scan writes a final `{"error":"..."}` line and closes the body.

use crate::catalog::Book;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Upper bound on a single line; a book is well under 1KB
pub const LINE_LENGTH_MAX: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    /// Line is neither a book nor an error frame
    Malformed { reason: String },
    /// Provider reported a failure in-band
    Remote(String),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::Malformed { reason } => write!(f, "Malformed wire record: {}", reason),
            WireError::Remote(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for WireError {}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Frame {
    Book(Book),
    Error { error: String },
}

pub fn encode_book(book: &Book) -> Bytes {
    encode_frame(&Frame::Book(book.clone()))
}

pub fn encode_error(message: &str) -> Bytes {
    encode_frame(&Frame::Error {
        error: message.to_string(),
    })
}

fn encode_frame(frame: &Frame) -> Bytes {
    let mut buf = BytesMut::with_capacity(160).writer();
    serde_json::to_writer(&mut buf, frame).expect("frame serialization is infallible");
    let mut buf = buf.into_inner();
    buf.put_u8(b'\n');
    buf.freeze()
}

pub fn decode_line(line: &str) -> Result<Book, WireError> {
    match serde_json::from_str::<Frame>(line.trim_end_matches('\r')) {
        Ok(Frame::Book(book)) => Ok(book),
        Ok(Frame::Error { error }) => Err(WireError::Remote(error)),
        Err(e) => Err(WireError::Malformed {
            reason: e.to_string(),
        }),
    }
}
