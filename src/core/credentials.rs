//! One-shot API key resolution from the environment.
//!
//! The key is looked up once at startup. A missing key does not stop the
//! process: the error value is handed to the transport, which fails each turn
//! with a configuration error instead.

use std::error::Error;
use std::fmt;

/// Environment variables consulted, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

const QUICK_FIXES: &[&str] = &[
    "export GEMINI_API_KEY=...       # Key from Google AI Studio",
    "export API_KEY=...              # Generic name, checked first",
];

#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    Missing { searched: &'static [&'static str] },
}

impl CredentialError {
    pub fn quick_fixes(&self) -> &'static [&'static str] {
        QUICK_FIXES
    }
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Missing { searched } => write!(
                f,
                "API key not found in environment variables (checked {})",
                searched.join(", ")
            ),
        }
    }
}

impl Error for CredentialError {}

/// Resolves the API key from the process environment.
pub fn resolve_api_key() -> Result<ApiKey, CredentialError> {
    resolve_api_key_with(|name| std::env::var(name).ok())
}

/// Resolves the API key through `lookup`. Blank values count as unset.
pub fn resolve_api_key_with<F>(lookup: F) -> Result<ApiKey, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .map(ApiKey)
        .ok_or(CredentialError::Missing {
            searched: &API_KEY_ENV_VARS,
        })
}

/// Base URL override from the environment, if set and non-blank.
pub fn base_url_override_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(BASE_URL_ENV_VAR)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn first_conventional_name_wins() {
        let key = resolve_api_key_with(env(&[
            ("GOOGLE_API_KEY", "google"),
            ("API_KEY", "generic"),
            ("GEMINI_API_KEY", "gemini"),
        ]))
        .expect("key resolved");
        assert_eq!(key.expose(), "generic");
    }

    #[test]
    fn blank_values_fall_through_to_later_names() {
        let key = resolve_api_key_with(env(&[("API_KEY", "   "), ("GOOGLE_API_KEY", " g-key ")]))
            .expect("key resolved");
        assert_eq!(key.expose(), "g-key");
    }

    #[test]
    fn missing_key_lists_searched_names() {
        let err = resolve_api_key_with(env(&[])).expect_err("no key");
        let text = err.to_string();
        for name in API_KEY_ENV_VARS {
            assert!(text.contains(name), "{text}");
        }
        assert!(!err.quick_fixes().is_empty());
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret-value");
        assert!(!format!("{key:?}").contains("secret-value"));
    }

    #[test]
    fn base_url_override_ignores_blank() {
        assert_eq!(base_url_override_with(env(&[("GEMINI_BASE_URL", " ")])), None);
        assert_eq!(
            base_url_override_with(env(&[("GEMINI_BASE_URL", "http://localhost:9")])),
            Some("http://localhost:9".to_string())
        );
    }
}
