use sha2::{Digest, Sha256};

/// Compute the client fingerprint used as the secondary blocking key next to
/// the IP: a SHA-256 over the User-Agent and Accept-Language header values.
/// Headers a browser sends consistently, cheap to compute, and stable across
/// requests from the same client even when the IP rotates.
pub fn client_fingerprint(user_agent: &str, accept_language: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    hasher.update(accept_language.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_headers() {
        let a = client_fingerprint("Mozilla/5.0", "es-AR,es;q=0.9");
        let b = client_fingerprint("Mozilla/5.0", "es-AR,es;q=0.9");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_when_either_header_differs() {
        let base = client_fingerprint("Mozilla/5.0", "es-AR");
        assert_ne!(base, client_fingerprint("curl/8.0", "es-AR"));
        assert_ne!(base, client_fingerprint("Mozilla/5.0", "en-US"));
    }

    #[test]
    fn hex_encoded_sha256() {
        let fp = client_fingerprint("ua", "lang");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
