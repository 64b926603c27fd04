//! Content fingerprint: order-independent digest of two binary blobs.
//!
//! Two submissions with the same parent images (in either order) must map
//! to the same fingerprint so the registry can deduplicate them.

use std::fmt;

use sha2::{Digest, Sha256};

/// Order-independent SHA-256 fingerprint of a blob pair.
///
/// Used only as a registry map key; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Compute the fingerprint of a blob pair.
///
/// Each blob is hashed independently, the two hex digests are ordered
/// lexicographically, concatenated, and hashed again. Ordering the
/// intermediate digests is what makes `fingerprint(a, b) ==
/// fingerprint(b, a)`; the outer hash keeps the result fixed-length and
/// collision-resistant at SHA-256 strength.
pub fn fingerprint(a: &[u8], b: &[u8]) -> Fingerprint {
    let hash_a = format!("{:x}", Sha256::digest(a));
    let hash_b = format!("{:x}", Sha256::digest(b));

    let combined = if hash_a <= hash_b {
        format!("{hash_a}{hash_b}")
    } else {
        format!("{hash_b}{hash_a}")
    };

    Fingerprint(format!("{:x}", Sha256::digest(combined.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore};
    use rstest::rstest;

    #[rstest]
    #[case::plain(b"parent-one".as_slice(), b"parent-two".as_slice())]
    #[case::empty_left(b"".as_slice(), b"x".as_slice())]
    #[case::both_empty(b"".as_slice(), b"".as_slice())]
    #[case::identical(b"same".as_slice(), b"same".as_slice())]
    fn fingerprint_is_symmetric(#[case] a: &[u8], #[case] b: &[u8]) {
        assert_eq!(fingerprint(a, b), fingerprint(b, a));
    }

    #[test]
    fn fingerprint_is_symmetric_for_random_pairs() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut a = vec![0u8; rng.gen_range(1..512)];
            let mut b = vec![0u8; rng.gen_range(1..512)];
            rng.fill_bytes(&mut a);
            rng.fill_bytes(&mut b);

            assert_eq!(fingerprint(&a, &b), fingerprint(&b, &a));
        }
    }

    #[test]
    fn single_bit_flip_changes_fingerprint() {
        // Statistical check over random samples, not exhaustive.
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut a = vec![0u8; 64];
            let mut b = vec![0u8; 64];
            rng.fill_bytes(&mut a);
            rng.fill_bytes(&mut b);

            let original = fingerprint(&a, &b);

            let byte = rng.gen_range(0..a.len());
            let bit = rng.gen_range(0..8);
            a[byte] ^= 1 << bit;

            assert_ne!(fingerprint(&a, &b), original);
        }
    }

    #[test]
    fn fingerprint_is_fixed_length_hex() {
        let fp = fingerprint(b"a", b"b");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint(b"a", b"b"), fingerprint(b"a", b"b"));
    }
}
