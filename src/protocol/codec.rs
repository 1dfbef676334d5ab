//! Line-record codec for CNET messages
//!
//! Both message kinds share the same shape: an ordered schema of keys, one
//! `KEY:value` line per field. The codec lives here once; `Request` and
//! `Response` only declare their schemas.

use super::{MalformedMessageError, ProtocolError, ValidationError};

/// A message serialized as ordered `KEY:value` lines.
///
/// Implementors declare their field schema via [`Wire::KEYS`] and convert
/// between field values and a validated instance. Encoding and decoding are
/// provided by the trait.
pub trait Wire: Sized {
    /// Field keys, in wire order.
    const KEYS: &'static [&'static str];

    /// Field values, in the same order as [`Wire::KEYS`].
    fn values(&self) -> Vec<&str>;

    /// Build an instance from values extracted in [`Wire::KEYS`] order,
    /// running full validation.
    fn from_values(values: Vec<String>) -> Result<Self, ValidationError>;

    /// Serialize to canonical wire text: `KEY:value` lines joined by `\n`,
    /// no trailing newline.
    fn encode(&self) -> String {
        Self::KEYS
            .iter()
            .zip(self.values())
            .map(|(key, value)| format!("{key}:{value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse wire text into a validated instance.
    ///
    /// Every key in the schema must be present; extracted values then go
    /// through [`Wire::from_values`], so a decoded instance is always valid.
    fn decode(text: &str) -> Result<Self, ProtocolError> {
        let lines: Vec<&str> = text.split('\n').collect();
        let values = Self::KEYS
            .iter()
            .map(|&key| extract_value(&lines, key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_values(values)?)
    }
}

/// Scan `lines` for the first line carrying `key` and return its value,
/// trimmed of surrounding whitespace.
///
/// The key token must end exactly at the `:` separator; a key that is a
/// prefix of another (`OPERAND1` vs `OPERAND1X`) never cross-matches.
fn extract_value(lines: &[&str], key: &'static str) -> Result<String, MalformedMessageError> {
    lines
        .iter()
        .find_map(|line| {
            let rest = line.strip_prefix(key)?;
            let value = rest.strip_prefix(':')?;
            Some(value.trim().to_string())
        })
        .ok_or(MalformedMessageError::MissingKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_value_first_match_wins() {
        let lines = vec!["RESULT:1", "RESULT:2"];
        assert_eq!(extract_value(&lines, "RESULT").unwrap(), "1");
    }

    #[test]
    fn test_extract_value_trims_whitespace() {
        let lines = vec!["MESSAGE:  all good  "];
        assert_eq!(extract_value(&lines, "MESSAGE").unwrap(), "all good");
    }

    #[test]
    fn test_extract_value_splits_on_first_colon() {
        let lines = vec!["MESSAGE:ratio 1:2"];
        assert_eq!(extract_value(&lines, "MESSAGE").unwrap(), "ratio 1:2");
    }

    #[test]
    fn test_extract_value_missing_key() {
        let lines = vec!["OPERATION:ADD"];
        assert_eq!(
            extract_value(&lines, "OPERAND1"),
            Err(MalformedMessageError::MissingKey("OPERAND1"))
        );
    }

    #[test]
    fn test_extract_value_requires_exact_key_token() {
        // OPERAND1X must not satisfy a lookup for OPERAND1
        let lines = vec!["OPERAND1X:9", "OPERAND1:3"];
        assert_eq!(extract_value(&lines, "OPERAND1").unwrap(), "3");
    }
}
