//! Parsing of command-line signal assignments and frame payloads

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Expected SIGNAL=VALUE, got '{0}'")]
    InvalidAssignment(String),

    #[error("Invalid value '{value}' for signal '{signal}'")]
    InvalidNumber { signal: String, value: String },

    #[error("Invalid hex payload '{0}'")]
    InvalidHex(String),
}

/// Parse `NAME=VALUE` into a signal name and physical value
pub fn parse_assignment(text: &str) -> Result<(String, f64), InputError> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| InputError::InvalidAssignment(text.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::InvalidAssignment(text.to_string()));
    }

    let value = value.trim();
    let physical = value.parse::<f64>().map_err(|_| InputError::InvalidNumber {
        signal: name.to_string(),
        value: value.to_string(),
    })?;

    Ok((name.to_string(), physical))
}

/// Parse a frame payload such as `FAFF1F00`, `0xFAFF1F` or `FA FF 1F`
pub fn parse_hex(text: &str) -> Result<Vec<u8>, InputError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '_')
        .collect();

    hex::decode(&digits).map_err(|e| {
        log::debug!("Rejected payload '{}': {}", text, e);
        InputError::InvalidHex(text.to_string())
    })
}

/// Render bytes as upper-case hex, accepted back by `parse_hex`
pub fn format_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("EngineSpeed=1500.5").unwrap(),
            ("EngineSpeed".to_string(), 1500.5)
        );
        assert_eq!(parse_assignment(" Temp = -40 ").unwrap(), ("Temp".to_string(), -40.0));
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert_eq!(
            parse_assignment("EngineSpeed"),
            Err(InputError::InvalidAssignment("EngineSpeed".to_string()))
        );
        assert!(matches!(parse_assignment("=1"), Err(InputError::InvalidAssignment(_))));
        assert_eq!(
            parse_assignment("Temp=hot"),
            Err(InputError::InvalidNumber {
                signal: "Temp".to_string(),
                value: "hot".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("FAFF1F00").unwrap(), vec![0xFA, 0xFF, 0x1F, 0x00]);
        assert_eq!(parse_hex("0xfaff1f").unwrap(), vec![0xFA, 0xFF, 0x1F]);
        assert_eq!(parse_hex("FA FF:1F").unwrap(), vec![0xFA, 0xFF, 0x1F]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_hex_errors() {
        assert!(matches!(parse_hex("FAF"), Err(InputError::InvalidHex(_))));
        assert!(matches!(parse_hex("ZZ"), Err(InputError::InvalidHex(_))));
        // Sign characters are not hex digits
        assert_eq!(parse_hex("+F"), Err(InputError::InvalidHex("+F".to_string())));
        assert!(matches!(parse_hex("-1"), Err(InputError::InvalidHex(_))));
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xFA, 0x0F, 0x00]), "FA0F00");
        assert_eq!(format_hex(&[]), "");
        assert_eq!(parse_hex(&format_hex(&[0xFA, 0x0F])).unwrap(), vec![0xFA, 0x0F]);
    }
}
