//! Protocol module - Defines the CNET wire protocol
//!
//! CNET is a line-based text protocol. A message is a fixed, ordered set of
//! `KEY:value` lines joined by newlines, with no trailing newline:
//!
//! ```text
//! OPERATION:ADD
//! OPERAND1:3
//! OPERAND2:4
//! ```
//!
//! Requests carry an arithmetic operation and two operands; responses carry
//! a result, a status and a human-readable message. There is exactly one
//! wire format, not versioned.

mod codec;
mod message;

pub use codec::*;
pub use message::*;

use thiserror::Error;

/// Default port for CNET servers
pub const DEFAULT_PORT: u16 = 8080;

/// Validation errors
///
/// Raised when message fields are present but semantically invalid. Always
/// recoverable: fix the input and construct again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    #[error("invalid status: {0:?}")]
    InvalidStatus(String),
}

/// Malformed wire text: a required key is absent from the input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedMessageError {
    #[error("required key {0:?} not found in message")]
    MissingKey(&'static str),
}

/// Everything that can go wrong while decoding wire text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] MalformedMessageError),

    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
}
