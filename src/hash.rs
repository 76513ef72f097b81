use crate::data::Location;

/// Fast 2-value hash with xorshift
#[inline(always)]
pub fn hash2(a: u64, b: u64) -> u64 {
    let mut seed = a.wrapping_mul(2654435761).wrapping_add(b.wrapping_mul(2246822519));
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// Fast 3-value hash with xorshift
#[inline(always)]
pub fn hash3(a: u64, b: u64, c: u64) -> u64 {
    let mut seed = a
        .wrapping_mul(2654435761)
        .wrapping_add(b.wrapping_mul(2246822519))
        .wrapping_add(c);
    seed ^= seed << 13;
    seed ^= seed >> 7;
    seed ^= seed << 17;
    seed
}

/// FNV-1a over raw bytes
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325, |acc, &b| {
        (acc ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

/// Order-sensitive fingerprint of everything in a snapshot that can change
/// what gets drawn. Two snapshots with equal fingerprints are treated as the
/// same version.
pub fn snapshot_fingerprint(locations: &[Location]) -> u64 {
    locations.iter().fold(locations.len() as u64, |acc, loc| {
        let ident = hash2(hash_bytes(loc.id.as_str().as_bytes()), hash_bytes(loc.name.as_bytes()));
        let extra = [&loc.description, &loc.last_incident, &loc.last_updated]
            .iter()
            .fold(0u64, |h, field| {
                hash2(h, field.as_deref().map_or(0, |s| hash_bytes(s.as_bytes())))
            });
        hash3(acc, ident, hash2(loc.risk_score.to_bits(), extra))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable() {
        let a = vec![Location::new(1, "a", 10.0), Location::new(2, "b", 20.0)];
        assert_eq!(snapshot_fingerprint(&a), snapshot_fingerprint(&a.clone()));
    }

    #[test]
    fn test_fingerprint_sees_changes() {
        let a = vec![Location::new(1, "a", 10.0), Location::new(2, "b", 20.0)];
        let rescored = vec![Location::new(1, "a", 10.0), Location::new(2, "b", 21.0)];
        let reordered = vec![Location::new(2, "b", 20.0), Location::new(1, "a", 10.0)];
        let described = vec![
            Location::new(1, "a", 10.0).with_description("wet floor"),
            Location::new(2, "b", 20.0),
        ];

        let base = snapshot_fingerprint(&a);
        assert_ne!(base, snapshot_fingerprint(&rescored));
        assert_ne!(base, snapshot_fingerprint(&reordered));
        assert_ne!(base, snapshot_fingerprint(&described));
        assert_ne!(base, snapshot_fingerprint(&a[..1]));
    }

    #[test]
    fn test_hash_bytes_differs() {
        assert_ne!(hash_bytes(b"OR1"), hash_bytes(b"OR2"));
        assert_eq!(hash_bytes(b""), 0xcbf29ce484222325);
    }
}
