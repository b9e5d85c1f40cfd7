//! Post-login redirect allow-list.

/// Where a successful login lands when the requested target is refused.
pub const DEFAULT_REDIRECT: &str = "/dashboard";

/// Where logout always sends the user agent.
pub const LOGIN_LOCATION: &str = "/login";

/// Accepts a redirect target only if it is a same-origin path or starts
/// with the configured base URL. Everything else falls back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    base_url: String,
    default_location: String,
}

impl RedirectPolicy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_location: DEFAULT_REDIRECT.to_string(),
        }
    }

    pub fn with_default(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    /// Anchored prefix checks only; a base URL appearing later in the
    /// string does not count.
    pub fn is_safe(&self, target: &str) -> bool {
        if target.is_empty() || target.chars().any(char::is_control) {
            return false;
        }

        if let Some(rest) = target.strip_prefix('/') {
            // `//host` and `/\host` are scheme-relative to browsers.
            return !rest.starts_with(['/', '\\']);
        }

        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return false;
        }
        match target.strip_prefix(base) {
            // The base must end at a boundary: `https://app.example.com.evil.io`
            // is not under `https://app.example.com`.
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }

    /// The target if it is safe, the default otherwise.
    pub fn resolve(&self, target: Option<&str>) -> String {
        match target {
            Some(t) if self.is_safe(t) => t.to_string(),
            _ => self.default_location.clone(),
        }
    }
}
