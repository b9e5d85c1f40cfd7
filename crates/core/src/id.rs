//! Strongly-typed identifiers used across the auth crates.

use core::str::FromStr;

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of every session identifier, in characters.
pub const SESSION_ID_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid session id: expected {SESSION_ID_LEN} alphanumeric characters")]
    InvalidSessionId,
}

/// Identifier of a user as handed out by the external user directory.
///
/// Directories disagree on whether ids are numbers or strings, so both are
/// accepted. Derived equality is strict; use [`UserId::loosely_eq`] where a
/// numeric id and its decimal string form must compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Num(i64),
    Text(String),
}

/// Largest magnitude below which every integer has an exact `f64` form.
const MAX_EXACT_F64_INT: u64 = 1 << 53;

impl UserId {
    /// Structural comparison across representations.
    ///
    /// - same representation: plain equality
    /// - number vs string: the string is parsed as a decimal number
    ///
    /// Blank strings never match a number.
    pub fn loosely_eq(&self, other: &UserId) -> bool {
        match (self, other) {
            (UserId::Num(a), UserId::Num(b)) => a == b,
            (UserId::Text(a), UserId::Text(b)) => a == b,
            (UserId::Num(n), UserId::Text(s)) | (UserId::Text(s), UserId::Num(n)) => {
                let s = s.trim();
                if s.is_empty() {
                    return false;
                }
                if let Ok(parsed) = s.parse::<i64>() {
                    return parsed == *n;
                }
                // Non-integral forms ("5.0") only where f64 is exact.
                n.unsigned_abs() <= MAX_EXACT_F64_INT
                    && s.parse::<f64>().is_ok_and(|parsed| parsed == *n as f64)
            }
        }
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserId::Num(n) => write!(f, "{n}"),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Opaque session identifier: exactly [`SESSION_ID_LEN`] characters from
/// `[A-Za-z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Draw a fresh identifier from the operating system CSPRNG.
    pub fn generate() -> Self {
        let id: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Validate an identifier received from the outside (cookie, header).
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.len() == SESSION_ID_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(s.to_string()))
        } else {
            Err(IdError::InvalidSessionId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to put in logs.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_session_id_is_32_alphanumerics() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), SESSION_ID_LEN);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_session_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn parse_rejects_wrong_length_and_alphabet() {
        assert!(SessionId::parse("short").is_err());
        assert!(SessionId::parse(&"a".repeat(33)).is_err());
        assert!(SessionId::parse(&format!("{}-", "a".repeat(31))).is_err());
        assert!(SessionId::parse(&"aZ9".repeat(10)[..30]).is_err());

        let ok = "abcdefghijklmnopqrstuvwxyzABCDEF";
        assert_eq!(SessionId::parse(ok).unwrap().as_str(), ok);
    }

    #[test]
    fn session_id_serde_validates() {
        let ok: SessionId = serde_json::from_str("\"0123456789abcdefghijABCDEFGHIJkl\"").unwrap();
        assert_eq!(ok.short(), "01234567");
        assert!(serde_json::from_str::<SessionId>("\"nope\"").is_err());
    }

    #[test]
    fn user_id_accepts_numbers_and_strings() {
        let n: UserId = serde_json::from_str("5").unwrap();
        let s: UserId = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(n, UserId::Num(5));
        assert_eq!(s, UserId::Text("5".to_string()));
        assert_ne!(n, s);
    }

    #[test]
    fn loose_equality_crosses_representations() {
        assert!(UserId::Num(5).loosely_eq(&UserId::from("5")));
        assert!(UserId::from("5").loosely_eq(&UserId::Num(5)));
        assert!(UserId::Num(5).loosely_eq(&UserId::from(" 5.0 ")));
        assert!(!UserId::from("5").loosely_eq(&UserId::from("5.0")));
        assert!(!UserId::Num(5).loosely_eq(&UserId::from("6")));
        assert!(!UserId::Num(0).loosely_eq(&UserId::from("")));
        assert!(!UserId::Num(7).loosely_eq(&UserId::from("seven")));
    }

    #[test]
    fn loose_equality_is_exact_for_large_ids() {
        let big = UserId::Num(9_007_199_254_740_993);
        assert!(!big.loosely_eq(&UserId::from("9007199254740992")));
        assert!(!big.loosely_eq(&UserId::from("9007199254740992.0")));
        assert!(big.loosely_eq(&UserId::from("9007199254740993")));
        assert!(UserId::Num(i64::MAX).loosely_eq(&UserId::from(i64::MAX.to_string())));
        assert!(!UserId::Num(i64::MIN).loosely_eq(&UserId::from("-9223372036854775807")));
    }

    proptest! {
        #[test]
        fn number_loosely_equals_its_decimal_string(n in -1_000_000_000i64..1_000_000_000) {
            prop_assert!(UserId::from(n).loosely_eq(&UserId::from(n.to_string())));
        }
    }
}
