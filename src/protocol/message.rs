//! Protocol message definitions
//!
//! Typed `Request` and `Response` messages with their validation rules.
//! Construction always runs full validation, so an instance in hand is
//! always a valid message.

use std::fmt;
use std::str::FromStr;

use super::codec::Wire;
use super::ValidationError;

/// Arithmetic operations accepted by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    /// Wire token for this operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mul => "MUL",
            Operation::Div => "DIV",
        }
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    // Case-sensitive: `add` is not a valid operation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(Operation::Add),
            "SUB" => Ok(Operation::Sub),
            "MUL" => Ok(Operation::Mul),
            "DIV" => Ok(Operation::Div),
            other => Err(ValidationError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    /// Wire token for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
        }
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Status::Ok),
            "ERROR" => Ok(Status::Error),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for one arithmetic operation on two operands.
///
/// Operands are kept as the caller's original text so encoding reproduces
/// input exactly; validation guarantees they parse as finite numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    operation: Operation,
    operand1: String,
    operand2: String,
}

impl Request {
    /// Build a validated request.
    ///
    /// Checks run in fixed order: field presence, operand numeric format,
    /// then operation membership. The first violated rule is reported.
    pub fn new(operation: &str, operand1: &str, operand2: &str) -> Result<Self, ValidationError> {
        require_present("OPERATION", operation)?;
        require_present("OPERAND1", operand1)?;
        require_present("OPERAND2", operand2)?;
        require_numeric("OPERAND1", operand1)?;
        require_numeric("OPERAND2", operand2)?;
        let operation = operation.parse()?;
        Ok(Self {
            operation,
            operand1: operand1.to_string(),
            operand2: operand2.to_string(),
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn operand1(&self) -> &str {
        &self.operand1
    }

    pub fn operand2(&self) -> &str {
        &self.operand2
    }
}

impl Wire for Request {
    const KEYS: &'static [&'static str] = &["OPERATION", "OPERAND1", "OPERAND2"];

    fn values(&self) -> Vec<&str> {
        vec![self.operation.as_str(), &self.operand1, &self.operand2]
    }

    fn from_values(values: Vec<String>) -> Result<Self, ValidationError> {
        Self::new(&values[0], &values[1], &values[2])
    }
}

/// A server reply: a result value, a status and a descriptive message.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    result: String,
    status: Status,
    message: String,
}

impl Response {
    /// Build a validated response.
    ///
    /// All three fields must be non-empty and the status must be one of the
    /// two allowed tokens. Presence is checked before status membership.
    pub fn new(result: &str, status: &str, message: &str) -> Result<Self, ValidationError> {
        require_present("RESULT", result)?;
        require_present("STATUS", status)?;
        require_present("MESSAGE", message)?;
        let status = status.parse()?;
        Ok(Self {
            result: result.to_string(),
            status,
            message: message.to_string(),
        })
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Wire for Response {
    const KEYS: &'static [&'static str] = &["RESULT", "STATUS", "MESSAGE"];

    fn values(&self) -> Vec<&str> {
        vec![&self.result, self.status.as_str(), &self.message]
    }

    fn from_values(values: Vec<String>) -> Result<Self, ValidationError> {
        Self::new(&values[0], &values[1], &values[2])
    }
}

fn require_present(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

// Standard decimal parsing: integers, negatives and decimals all pass;
// "abc" and anything non-finite (NaN, inf) are rejected.
fn require_numeric(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(ValidationError::NotNumeric {
            field,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MalformedMessageError, ProtocolError};

    #[test]
    fn test_request_encode() {
        let req = Request::new("ADD", "3", "4").unwrap();
        assert_eq!(req.encode(), "OPERATION:ADD\nOPERAND1:3\nOPERAND2:4");
    }

    #[test]
    fn test_request_roundtrip() {
        for (op, a, b) in [("ADD", "3", "4"), ("SUB", "-1.5", "2"), ("DIV", "10", "0.25")] {
            let req = Request::new(op, a, b).unwrap();
            let decoded = Request::decode(&req.encode()).unwrap();
            assert_eq!(req, decoded);
        }
    }

    #[test]
    fn test_request_rejects_unknown_operation() {
        assert_eq!(
            Request::new("POW", "1", "2"),
            Err(ValidationError::UnknownOperation("POW".to_string()))
        );
    }

    #[test]
    fn test_request_operation_is_case_sensitive() {
        assert!(matches!(
            Request::new("add", "1", "2"),
            Err(ValidationError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_request_rejects_non_numeric_operand() {
        assert_eq!(
            Request::new("ADD", "x", "2"),
            Err(ValidationError::NotNumeric {
                field: "OPERAND1",
                value: "x".to_string()
            })
        );
        assert!(matches!(
            Request::new("ADD", "1", "NaN"),
            Err(ValidationError::NotNumeric { field: "OPERAND2", .. })
        ));
    }

    #[test]
    fn test_request_presence_checked_before_format() {
        // An empty operand reports MissingField, not NotNumeric.
        assert_eq!(
            Request::new("ADD", "", "2"),
            Err(ValidationError::MissingField("OPERAND1"))
        );
        // An empty operation reports MissingField, not UnknownOperation.
        assert_eq!(
            Request::new("", "1", "2"),
            Err(ValidationError::MissingField("OPERATION"))
        );
    }

    #[test]
    fn test_request_format_checked_before_membership() {
        assert!(matches!(
            Request::new("POW", "x", "2"),
            Err(ValidationError::NotNumeric { field: "OPERAND1", .. })
        ));
    }

    #[test]
    fn test_request_decode_missing_key() {
        assert_eq!(
            Request::decode("OPERATION:ADD\nOPERAND1:3"),
            Err(ProtocolError::Malformed(MalformedMessageError::MissingKey(
                "OPERAND2"
            )))
        );
    }

    #[test]
    fn test_request_decode_invalid_fields() {
        let err = Request::decode("OPERATION:POW\nOPERAND1:1\nOPERAND2:2").unwrap_err();
        assert!(matches!(err, ProtocolError::Validation(_)));
    }

    #[test]
    fn test_response_decode() {
        let resp = Response::decode("RESULT:7\nSTATUS:OK\nMESSAGE:done").unwrap();
        assert_eq!(resp.result(), "7");
        assert_eq!(resp.status(), Status::Ok);
        assert_eq!(resp.message(), "done");
    }

    #[test]
    fn test_response_rejects_invalid_status() {
        assert_eq!(
            Response::new("7", "MAYBE", "x"),
            Err(ValidationError::InvalidStatus("MAYBE".to_string()))
        );
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = Response::new("42", "ERROR", "division by zero").unwrap();
        assert_eq!(Response::decode(&resp.encode()).unwrap(), resp);
    }
}
