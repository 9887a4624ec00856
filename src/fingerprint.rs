use sha2::{Digest, Sha256};

// Short, log-safe identifier for an API key (first 8 bytes of its SHA-256)
pub fn key_fingerprint(api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_hides_key() {
        let a = key_fingerprint("demo-free-key-2026");
        assert_eq!(a.len(), 16);
        assert_eq!(a, key_fingerprint("demo-free-key-2026"));
        assert_ne!(a, key_fingerprint("demo-pro-key-2026"));
        assert!(!a.contains("demo"));
    }
}
