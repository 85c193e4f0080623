//! Endpoint URL helpers for the connect-time DNS diagnostic.

/// Extracts the host (with any explicit port) from an HTTP(S) URL.
pub fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = &rest[..rest.find('/').unwrap_or(rest.len())];
    (!host.is_empty()).then_some(host)
}

/// `host:port` pair suitable for a socket-address lookup. HTTPS defaults to
/// 443, plain HTTP to 80.
pub fn resolve_target(url: &str) -> Option<String> {
    let host = host_of(url)?;
    if host.contains(':') {
        Some(host.to_string())
    } else if url.starts_with("https://") {
        Some(format!("{host}:443"))
    } else {
        Some(format!("{host}:80"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_path() {
        assert_eq!(
            host_of("https://classify.example.dev/classify"),
            Some("classify.example.dev")
        );
        assert_eq!(host_of("http://192.168.254.15:8000/test"), Some("192.168.254.15:8000"));
    }

    #[test]
    fn bare_host_passes_through() {
        assert_eq!(host_of("classify.example.dev"), Some("classify.example.dev"));
    }

    #[test]
    fn empty_host_is_rejected() {
        assert_eq!(host_of("http:///classify"), None);
        assert_eq!(host_of(""), None);
    }

    #[test]
    fn resolve_target_fills_the_default_port() {
        assert_eq!(
            resolve_target("https://classify.example.dev/classify").as_deref(),
            Some("classify.example.dev:443")
        );
        assert_eq!(
            resolve_target("http://classify.example.dev/classify").as_deref(),
            Some("classify.example.dev:80")
        );
        assert_eq!(
            resolve_target("http://192.168.254.15:8000/classify").as_deref(),
            Some("192.168.254.15:8000")
        );
    }
}
