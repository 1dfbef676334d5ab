//! Frame codec for the transport layer
//!
//! Protocol messages are multi-line text, so the stream needs explicit
//! message boundaries. A frame is a UTF-8 payload terminated by a blank
//! line. Protocol text never contains a blank line, which makes the
//! terminator unambiguous; an empty frame (bare terminator) is the
//! session-close signal.

use bytes::{Buf, BufMut, BytesMut};
use std::string::FromUtf8Error;
use thiserror::Error;

/// Byte sequence marking the end of a frame
pub const FRAME_TERMINATOR: &[u8] = b"\n\n";

/// Frame codec errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame too large: {0} bytes (max: {1})")]
    TooLarge(usize, usize),

    #[error("frame payload contains the terminator sequence")]
    ContainsTerminator,

    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Encodes text payloads into terminated frames
pub struct Encoder {
    max_frame_size: usize,
}

impl Encoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Append one frame to the buffer
    pub fn encode(&self, text: &str, buf: &mut BytesMut) -> Result<(), FrameError> {
        if text.len() > self.max_frame_size {
            return Err(FrameError::TooLarge(text.len(), self.max_frame_size));
        }
        if text.as_bytes().windows(2).any(|w| w == FRAME_TERMINATOR) {
            return Err(FrameError::ContainsTerminator);
        }

        buf.put_slice(text.as_bytes());
        buf.put_slice(FRAME_TERMINATOR);
        Ok(())
    }
}

/// Decodes terminated frames from a byte stream
pub struct Decoder {
    max_frame_size: usize,
}

impl Decoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Attempt to decode one frame from the buffer
    /// Returns Ok(None) if more data is needed
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<String>, FrameError> {
        let Some(end) = buf.windows(2).position(|w| w == FRAME_TERMINATOR) else {
            // No terminator yet; a partial payload already past the limit
            // can never complete into a valid frame.
            if buf.len() > self.max_frame_size {
                return Err(FrameError::TooLarge(buf.len(), self.max_frame_size));
            }
            return Ok(None);
        };

        if end > self.max_frame_size {
            return Err(FrameError::TooLarge(end, self.max_frame_size));
        }

        let payload = buf.split_to(end);
        buf.advance(FRAME_TERMINATOR.len());

        Ok(Some(String::from_utf8(payload.to_vec())?))
    }
}
