//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The fragment is not part of the key: `/logo.png#a` and `/logo.png`
/// address the same stored response.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/image.png");
        let hash2 = compute_cache_key("GET", "https://example.com/image.png");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_ignores_fragment() {
        let plain = compute_cache_key("GET", "https://example.com/image.png");
        let fragment = compute_cache_key("GET", "https://example.com/image.png#top");
        assert_eq!(plain, fragment);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", "https://example.com/"),
            compute_cache_key("GET", "https://example.com/")
        );
    }

    #[test]
    fn test_hash_different_query() {
        let a = compute_cache_key("GET", "https://example.com/font.woff2?v=1");
        let b = compute_cache_key("GET", "https://example.com/font.woff2?v=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
