use url::Url;

const REST_MARKERS: [&str; 4] = ["/rest/v1", "/auth/v1", "/auth/", "/realtime"];

/// True when `host` is the backend domain suffix or a subdomain of it.
pub fn host_matches(host: &str, backend_domain: &str) -> bool {
    let suffix = backend_domain.trim_matches('.').to_ascii_lowercase();
    if suffix.is_empty() {
        return false;
    }

    let host = host.to_ascii_lowercase();
    host == suffix || host.ends_with(&format!(".{}", suffix))
}

/// Decides whether a call belongs to the backend's REST/Auth/Realtime surface.
///
/// Anything that fails to parse, or whose host is outside the backend domain,
/// is a generic API call regardless of its path.
pub fn is_backend_rest_url(url: &str, backend_domain: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    let on_backend = parsed
        .host_str()
        .map(|host| host_matches(host, backend_domain))
        .unwrap_or(false);
    if !on_backend {
        return false;
    }

    let path = parsed.path();
    REST_MARKERS.iter().any(|marker| path.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "example-backend.co";

    fn backend(url: &str) -> bool {
        is_backend_rest_url(url, DOMAIN)
    }

    #[test]
    fn recognises_backend_surfaces() {
        assert!(backend("https://proj.example-backend.co/rest/v1/jobs?select=id"));
        assert!(backend("https://proj.example-backend.co/auth/v1/token"));
        assert!(backend("https://proj.example-backend.co/auth/callback"));
        assert!(backend("https://proj.example-backend.co/realtime/v1/websocket"));
    }

    #[test]
    fn foreign_hosts_are_generic_even_with_matching_paths() {
        assert!(!backend("https://api.example.com/rest/v1/jobs"));
        assert!(!backend("https://example-backend.co.evil.net/rest/v1/jobs"));
        assert!(!backend("https://notexample-backend.co/rest/v1/jobs"));
    }

    #[test]
    fn backend_host_without_known_path_is_generic() {
        assert!(!backend("https://proj.example-backend.co/storage/v1/object/x"));
    }

    #[test]
    fn unparsable_input_is_generic() {
        assert!(!backend("not a url"));
        assert!(!backend(""));
        assert!(!backend("/rest/v1/jobs"));
    }

    #[test]
    fn host_match_is_case_insensitive() {
        assert!(host_matches("PROJ.Example-Backend.CO", DOMAIN));
        assert!(host_matches("example-backend.co", ".example-backend.co"));
        assert!(!host_matches("example-backend.co", ""));
    }
}
