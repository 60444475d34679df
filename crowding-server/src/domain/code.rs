//! Station and line code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid station or line code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} code: {reason}")]
pub struct InvalidCode {
    kind: &'static str,
    reason: &'static str,
}

/// Validate a 3-letter uppercase code and return its bytes.
fn parse_code(s: &str, kind: &'static str) -> Result<[u8; 3], InvalidCode> {
    let bytes = s.as_bytes();

    if bytes.len() != 3 {
        return Err(InvalidCode {
            kind,
            reason: "must be exactly 3 characters",
        });
    }

    if !bytes.iter().all(|b| b.is_ascii_uppercase()) {
        return Err(InvalidCode {
            kind,
            reason: "must be uppercase ASCII letters A-Z",
        });
    }

    Ok([bytes[0], bytes[1], bytes[2]])
}

fn code_str(bytes: &[u8; 3]) -> &str {
    // Only ASCII uppercase letters are ever stored.
    std::str::from_utf8(bytes).unwrap_or("???")
}

/// A 3-letter station code, e.g. `CEN` for Central.
///
/// Always 3 uppercase ASCII letters; any `StationCode` value is valid by
/// construction.
///
/// ```
/// use crowding_server::domain::StationCode;
///
/// let cen = StationCode::parse("CEN").unwrap();
/// assert_eq!(cen.as_str(), "CEN");
///
/// assert!(StationCode::parse("cen").is_err());
/// assert_eq!(StationCode::parse_normalized(" cen ").unwrap(), cen);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode([u8; 3]);

impl StationCode {
    /// Parse a station code. The input must be exactly 3 uppercase letters.
    pub fn parse(s: &str) -> Result<Self, InvalidCode> {
        parse_code(s, "station").map(Self)
    }

    /// Parse after trimming whitespace and upper-casing.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        code_str(&self.0)
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StationCode {
    type Error = InvalidCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationCode> for String {
    fn from(code: StationCode) -> Self {
        code.as_str().to_string()
    }
}

/// A 3-letter line code, e.g. `ISL` for the Island Line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineCode([u8; 3]);

impl LineCode {
    /// Parse a line code. The input must be exactly 3 uppercase letters.
    pub fn parse(s: &str) -> Result<Self, InvalidCode> {
        parse_code(s, "line").map(Self)
    }

    /// Parse after trimming whitespace and upper-casing.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        code_str(&self.0)
    }
}

impl fmt::Debug for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineCode({})", self.as_str())
    }
}

impl fmt::Display for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LineCode {
    type Error = InvalidCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LineCode> for String {
    fn from(code: LineCode) -> Self {
        code.as_str().to_string()
    }
}
