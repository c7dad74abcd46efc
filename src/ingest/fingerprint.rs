use sha2::{Digest, Sha256};
use std::io::{self, Read};

const CHUNK_SIZE: usize = 8192;

/// SHA-256 over the full byte content, read in fixed-size chunks so
/// arbitrarily large files never have to sit in memory twice.
pub fn fingerprint_stream<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    // Reading from a slice cannot fail.
    fingerprint_stream(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stable_across_read_strategies() {
        let content: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let chunked = fingerprint_stream(Cursor::new(&content)).expect("digest");
        let oneshot = fingerprint_bytes(&content);
        assert_eq!(chunked, oneshot);
        assert_eq!(chunked.len(), 64);
        assert!(chunked.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_content_distinct_fingerprint() {
        assert_ne!(fingerprint_bytes(b"a"), fingerprint_bytes(b"b"));
        assert_eq!(fingerprint_bytes(b"a"), fingerprint_bytes(b"a"));
    }
}
