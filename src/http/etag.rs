//! 32-bit fingerprints for client keys and conditional-GET tags.
//!
//! The same FNV-1a hash backs both the page-instance cache key (IP + user
//! agent) and the ETag emitted on cacheable responses, so a tag is stable
//! for as long as the client, query, and handler output are stable.

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over a sequence of byte slices, hashed as one stream.
pub fn fnv1a32(parts: &[&[u8]]) -> u32 {
    let mut hash = FNV_OFFSET;
    for part in parts {
        for &b in *part {
            hash ^= b as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Cache key for one (client IP, user agent) pair.
pub fn client_key(ip: &str, user_agent: &str) -> u32 {
    fnv1a32(&[ip.as_bytes(), user_agent.as_bytes()])
}

/// ETag for a cacheable response: 8 lowercase hex digits over the query
/// string, client identity, and the raw handler output (before any status
/// override prefix is stripped).
pub fn compute(query: &str, ip: &str, user_agent: &str, output: &[u8]) -> String {
    format!(
        "{:08x}",
        fnv1a32(&[query.as_bytes(), ip.as_bytes(), user_agent.as_bytes(), output])
    )
}
