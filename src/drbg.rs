//! RFC6979 HMAC-SHA256 DRBG.
//!
//! Exact K/V state machine of `secp256k1_rfc6979_hmac_sha256`: the first
//! `generate` call skips the retry step, every later call performs it.
//! The bulletproof generator vector is seeded from this DRBG.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// RFC6979 HMAC-SHA256 deterministic random byte generator.
pub struct Rfc6979HmacSha256 {
    k: [u8; 32],
    v: [u8; 32],
    retry: bool,
}

impl Rfc6979HmacSha256 {
    /// Seed the generator (RFC 6979 3.2.b–g).
    pub fn new(seed: &[u8]) -> Self {
        let mut k = [0u8; 32];
        let mut v = [1u8; 32];

        // K = HMAC_K(V ‖ 0x00 ‖ seed); V = HMAC_K(V)
        k = hmac(&k, &[&v, &[0x00], seed]);
        v = hmac(&k, &[&v]);

        // K = HMAC_K(V ‖ 0x01 ‖ seed); V = HMAC_K(V)
        k = hmac(&k, &[&v, &[0x01], seed]);
        v = hmac(&k, &[&v]);

        Self { k, v, retry: false }
    }

    /// Fill `out` with the next bytes of the stream, in 32-byte chunks.
    pub fn generate(&mut self, out: &mut [u8]) {
        if self.retry {
            self.k = hmac(&self.k, &[&self.v, &[0x00]]);
            self.v = hmac(&self.k, &[&self.v]);
        }

        for chunk in out.chunks_mut(32) {
            self.v = hmac(&self.k, &[&self.v]);
            chunk.copy_from_slice(&self.v[..chunk.len()]);
        }

        self.retry = true;
    }

    /// Convenience: the next 32 bytes.
    pub fn generate_32(&mut self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.generate(&mut out);
        out
    }
}
