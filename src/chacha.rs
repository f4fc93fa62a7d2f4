//! ChaCha20-based scalar PRF.
//!
//! Reimplements `secp256k1_scalar_chacha20`: one ChaCha20 block keyed by
//! the seed, with the index split across the counter words, yields two
//! candidate scalars. Candidates ≥ n bump the over-counter in word 15 and
//! rerun, so every emitted scalar is canonical.
//!
//! The block function is written out here because the reference consumes
//! the keystream at word granularity with its own counter layout; a stream
//! cipher API cannot reproduce that byte-for-byte.

use k256::Scalar;

use crate::curve::scalar_from_bytes;

// "expand 32-byte k"
const CHACHA_CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

#[inline]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

fn chacha_block(seed: &[u8; 32], idx: u64, over_count: u32) -> [u8; 64] {
    let mut state = [0u32; 16];
    state[..4].copy_from_slice(&CHACHA_CONSTANTS);
    for (i, word) in state[4..12].iter_mut().enumerate() {
        *word = u32::from_le_bytes(seed[4 * i..4 * i + 4].try_into().expect("4-byte chunk"));
    }
    state[12] = idx as u32;
    state[13] = (idx >> 32) as u32;
    state[14] = 0;
    state[15] = over_count;

    let mut x = state;
    // 10 double rounds = 20 rounds
    for _ in 0..10 {
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 1, 5, 9, 13);
        quarter_round(&mut x, 2, 6, 10, 14);
        quarter_round(&mut x, 3, 7, 11, 15);
        quarter_round(&mut x, 0, 5, 10, 15);
        quarter_round(&mut x, 1, 6, 11, 12);
        quarter_round(&mut x, 2, 7, 8, 13);
        quarter_round(&mut x, 3, 4, 9, 14);
    }
    for (word, init) in x.iter_mut().zip(state.iter()) {
        *word = word.wrapping_add(*init);
    }

    let mut out = [0u8; 64];
    for (i, word) in x.iter().enumerate() {
        out[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
    }
    out
}

/// Derive two deterministic scalars from a 32-byte seed and an index.
///
/// The first keystream half becomes the first scalar (interpreted as a
/// 32-byte big-endian integer), the second half the second. Either half
/// overflowing n reruns the block with the over-counter incremented, so
/// the result is always canonical.
pub fn scalar_chacha20(seed: &[u8; 32], idx: u64) -> (Scalar, Scalar) {
    let mut over_count = 0u32;
    loop {
        let stream = chacha_block(seed, idx, over_count);
        let r1: [u8; 32] = stream[..32].try_into().expect("keystream half");
        let r2: [u8; 32] = stream[32..].try_into().expect("keystream half");
        match (scalar_from_bytes(&r1), scalar_from_bytes(&r2)) {
            (Ok(s1), Ok(s2)) => return (s1, s2),
            _ => over_count = over_count.wrapping_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_keystream() {
        // Standard ChaCha20 all-zero test vector: seed 0, idx 0 leaves the
        // whole initial state zero outside the constants.
        let (s1, s2) = scalar_chacha20(&[0u8; 32], 0);
        assert_eq!(
            hex::encode(s1.to_bytes()),
            "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7"
        );
        assert_eq!(
            hex::encode(s2.to_bytes()),
            "da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586"
        );
    }

    #[test]
    fn test_index_separates_streams() {
        let seed = [7u8; 32];
        let (a0, b0) = scalar_chacha20(&seed, 0);
        let (a1, b1) = scalar_chacha20(&seed, 1);
        assert_ne!(a0, a1);
        assert_ne!(b0, b1);
        // High index bits land in counter word 13.
        let (ah, _) = scalar_chacha20(&seed, 1u64 << 32);
        assert_ne!(a1, ah);
        assert_ne!(a0, ah);
    }

    #[test]
    fn test_deterministic() {
        let seed = [0xabu8; 32];
        assert_eq!(scalar_chacha20(&seed, 42), scalar_chacha20(&seed, 42));
    }
}
