//! Joining API roots and endpoint paths.

/// Joins `base_url` and `endpoint` with exactly one slash between them.
///
/// ```
/// use bankchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url(
///         "https://generativelanguage.googleapis.com/v1beta/",
///         "/models/x:streamGenerateContent"
///     ),
///     "https://generativelanguage.googleapis.com/v1beta/models/x:streamGenerateContent"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_and_leading_slashes_collapse() {
        assert_eq!(
            construct_api_url("http://localhost:8080/v1beta///", "models/m"),
            "http://localhost:8080/v1beta/models/m"
        );
        assert_eq!(
            construct_api_url("http://localhost:8080", "//models/m"),
            "http://localhost:8080/models/m"
        );
    }

    #[test]
    fn query_strings_are_preserved() {
        assert_eq!(
            construct_api_url(
                "https://example.test/v1beta",
                "models/m:streamGenerateContent?alt=sse"
            ),
            "https://example.test/v1beta/models/m:streamGenerateContent?alt=sse"
        );
    }
}
