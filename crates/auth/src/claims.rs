use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Token payload: an arbitrary JSON object of claims.
pub type Claims = Map<String, Value>;

/// Issued-at claim, in milliseconds since the Unix epoch.
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Subject claim.
pub const SUBJECT_CLAIM: &str = "sub";

/// Role claim.
pub const ROLE_CLAIM: &str = "role";

/// Read the issued-at claim, if present and numeric.
pub fn issued_at(claims: &Claims) -> Option<DateTime<Utc>> {
    let millis = claims.get(ISSUED_AT_CLAIM)?.as_i64()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Replace any issued-at claim with `now`.
pub fn stamp_issued_at(claims: &mut Claims, now: DateTime<Utc>) {
    claims.remove(ISSUED_AT_CLAIM);
    claims.insert(
        ISSUED_AT_CLAIM.to_string(),
        Value::from(now.timestamp_millis()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn stamp_replaces_previous_issued_at() {
        let earlier = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let later = earlier + Duration::seconds(30);

        let mut claims = Claims::new();
        claims.insert("sub".into(), json!("42"));
        stamp_issued_at(&mut claims, earlier);
        stamp_issued_at(&mut claims, later);

        assert_eq!(claims.len(), 2);
        assert_eq!(issued_at(&claims), Some(later));
    }

    #[test]
    fn non_numeric_issued_at_is_ignored() {
        let mut claims = Claims::new();
        claims.insert(ISSUED_AT_CLAIM.into(), json!("yesterday"));
        assert_eq!(issued_at(&claims), None);
    }
}
