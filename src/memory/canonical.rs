//! URL canonicalization and content hashing
//!
//! Two URLs collide iff their canonical forms are byte-equal: lowercased
//! scheme+host+path, leading `www.` stripped from the host, trailing `/`
//! stripped from the path, fragment and query dropped.

use sha2::{Digest, Sha256};
use url::Url;

/// Hex length of the truncated content hash.
const CONTENT_HASH_LEN: usize = 16;

/// Canonical form of a URL, used for equality.
///
/// Unparseable inputs fall back to a trimmed lowercase of the raw string so
/// dedup still functions on malformed search output.
pub fn canonicalize(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(parsed) => {
            let scheme = parsed.scheme().to_lowercase();
            let host = parsed
                .host_str()
                .map(strip_www)
                .unwrap_or_default()
                .to_lowercase();
            let path = parsed.path().trim_end_matches('/').to_lowercase();
            format!("{}://{}{}", scheme, host, path)
        }
        Err(_) => raw.trim().trim_end_matches('/').to_lowercase(),
    }
}

/// Host with any leading `www.` stripped, lowercased.
pub fn domain_of(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| strip_www(h).to_lowercase()))
        .unwrap_or_default()
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Truncated SHA-256 of `lower(title)|lower(description)`.
pub fn content_hash(title: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(description.to_lowercase().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..CONTENT_HASH_LEN].to_string()
}
