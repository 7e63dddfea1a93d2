use sha2::{Digest, Sha256};

/// Number of hex characters kept from the fingerprint digest.
pub const DEVICE_ID_LEN: usize = 10;

/// Derive a short, stable device identifier from a fingerprint string
/// (user agent, locale, screen size and the like). The id is the first ten hex
/// characters of the SHA-256 of the fingerprint.
pub fn derive_device_id(fingerprint: &str) -> String {
    let mut id = hex::encode(Sha256::digest(fingerprint.as_bytes()));
    id.truncate(DEVICE_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fingerprint() {
        assert_eq!(derive_device_id("x"), "2d711642b7");
    }

    #[test]
    fn stable_and_short() {
        let a = derive_device_id("Mozilla/5.0 en-US 1920 1080 -60");
        assert_eq!(a, derive_device_id("Mozilla/5.0 en-US 1920 1080 -60"));
        assert_eq!(a.len(), DEVICE_ID_LEN);
        assert_ne!(a, derive_device_id("Mozilla/5.0 en-US 1920 1080 0"));
    }
}
