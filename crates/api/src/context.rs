use warden_auth::Claims;

/// Verified bearer token for a request.
///
/// Inserted by the bearer middleware; only present on token routes.
#[derive(Debug, Clone, PartialEq)]
pub struct BearerContext {
    token: String,
    claims: Claims,
}

impl BearerContext {
    pub fn new(token: String, claims: Claims) -> Self {
        Self { token, claims }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
