//! 32-bit MurmurHash3 (x86 variant)
//!
//! Non-cryptographic, stable across platforms and releases. Bucketing
//! depends on these exact bits: changing this function reshuffles every
//! running experiment.

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// MurmurHash3 `x86_32` of `data` with `seed`.
#[must_use]
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        let k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        h ^= mix_k(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k |= u32::from(*byte) << (8 * i);
        }
        h ^= mix_k(k);
    }

    // Length is folded in modulo 2^32, as in the reference implementation.
    #[allow(clippy::cast_possible_truncation)]
    let len = data.len() as u32;
    fmix32(h ^ len)
}

#[inline]
const fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
const fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Hash `namespace:key` to a point in `[0, 1]`.
#[must_use]
pub fn hash_to_unit(namespace: &str, key: &str) -> f64 {
    let joined = format!("{namespace}:{key}");
    f64::from(murmur3_32(joined.as_bytes(), 0)) / f64::from(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514e_28b7);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4f_f723
        );
    }

    #[test]
    fn test_seed_changes_hash() {
        assert_ne!(murmur3_32(b"user-1", 0), murmur3_32(b"user-1", 1));
    }

    #[test]
    fn test_hash_to_unit_range() {
        for i in 0..1000 {
            let h = hash_to_unit("exp-1", &format!("user-{i}"));
            assert!((0.0..=1.0).contains(&h));
        }
    }

    #[test]
    fn test_namespaces_are_independent() {
        assert_ne!(
            hash_to_unit("exp-1", "user-1"),
            hash_to_unit("exp-1:traffic", "user-1")
        );
    }
}
