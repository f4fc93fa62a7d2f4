//! BIP-340 Schnorr signatures over k256 primitives.
//!
//! Kernel, output and input signatures are 64-byte x-only Schnorr
//! signatures. Signing is deterministic (all-zero aux randomness), so a
//! builder given fixed entropy produces identical transactions.

use k256::{
    elliptic_curve::{ops::MulByGenerator, Group},
    ProjectivePoint, Scalar,
};
use sha2::{Digest, Sha256};

use crate::curve::{point_x_bytes, point_y_is_odd, scalar_reduce};
use crate::{CryptoError, MwebError, Result, VerifyError};

fn tagged_hash(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let tag_digest: [u8; 32] = Sha256::digest(tag.as_bytes()).into();
    let mut sha = Sha256::new();
    sha.update(tag_digest);
    sha.update(tag_digest);
    for part in parts {
        sha.update(part);
    }
    sha.finalize().into()
}

/// Sign a 32-byte message with a secret scalar.
///
/// The key and nonce are negated to even-y form per BIP-340; the returned
/// signature is `R.x ‖ s`.
pub fn sign(secret: &Scalar, msg: &[u8; 32]) -> Result<[u8; 64]> {
    if bool::from(secret.is_zero()) {
        return Err(MwebError::Crypto(CryptoError::ScalarOutOfRange));
    }

    let pubkey = ProjectivePoint::mul_by_generator(secret);
    let d = if point_y_is_odd(&pubkey) { -*secret } else { *secret };
    let px = point_x_bytes(&pubkey);

    // t = d XOR H_aux(zeros)
    let aux = tagged_hash("BIP0340/aux", &[&[0u8; 32]]);
    let mut t: [u8; 32] = d.to_bytes().into();
    for (byte, mask) in t.iter_mut().zip(aux.iter()) {
        *byte ^= mask;
    }

    let k0 = scalar_reduce(&tagged_hash("BIP0340/nonce", &[&t, &px, msg]));
    if bool::from(k0.is_zero()) {
        return Err(MwebError::Crypto(CryptoError::ScalarOutOfRange));
    }

    let r_point = ProjectivePoint::mul_by_generator(&k0);
    let k = if point_y_is_odd(&r_point) { -k0 } else { k0 };
    let rx = point_x_bytes(&r_point);

    let e = scalar_reduce(&tagged_hash("BIP0340/challenge", &[&rx, &px, msg]));
    let s = k + e * d;

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&rx);
    sig[32..].copy_from_slice(&s.to_bytes());
    Ok(sig)
}

/// Verify a signature against a public key point.
///
/// Only the x-coordinate of `pubkey` participates (x-only verification);
/// callers pass commitment or pubkey points directly.
pub fn verify(pubkey: &ProjectivePoint, msg: &[u8; 32], sig: &[u8; 64]) -> bool {
    let rx: [u8; 32] = sig[..32].try_into().expect("64-byte signature");
    let s_bytes: [u8; 32] = sig[32..].try_into().expect("64-byte signature");

    let s = match crate::curve::scalar_from_bytes(&s_bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };
    // Lift the pubkey x to its even-y point.
    let p = match lift_x(&point_x_bytes(pubkey)) {
        Ok(p) => p,
        Err(_) => return false,
    };

    let px = point_x_bytes(&p);
    let e = scalar_reduce(&tagged_hash("BIP0340/challenge", &[&rx, &px, msg]));

    let r_point = ProjectivePoint::mul_by_generator(&s) - p * e;
    if bool::from(r_point.is_identity()) || point_y_is_odd(&r_point) {
        return false;
    }
    point_x_bytes(&r_point) == rx
}

/// Verify, mapping failure to a caller-chosen error.
pub fn verify_or(pubkey: &ProjectivePoint, msg: &[u8; 32], sig: &[u8; 64], err: VerifyError) -> Result<()> {
    if verify(pubkey, msg, sig) {
        Ok(())
    } else {
        Err(MwebError::Verify(err))
    }
}

/// The even-y point with the given x-coordinate.
pub fn lift_x(x: &[u8; 32]) -> Result<ProjectivePoint> {
    let quad = crate::curve::point_from_x(x, false)?;
    Ok(if point_y_is_odd(&quad) { -quad } else { quad })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let secret = Scalar::from(0xdeadbeefu64);
        let msg = [7u8; 32];
        let sig = sign(&secret, &msg).unwrap();
        let pubkey = ProjectivePoint::mul_by_generator(&secret);
        assert!(verify(&pubkey, &msg, &sig));
    }

    #[test]
    fn test_verify_rejects_wrong_message() {
        let secret = Scalar::from(12345u64);
        let sig = sign(&secret, &[1u8; 32]).unwrap();
        let pubkey = ProjectivePoint::mul_by_generator(&secret);
        assert!(!verify(&pubkey, &[2u8; 32], &sig));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let sig = sign(&Scalar::from(111u64), &[1u8; 32]).unwrap();
        let other = ProjectivePoint::mul_by_generator(&Scalar::from(222u64));
        assert!(!verify(&other, &[1u8; 32], &sig));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let secret = Scalar::from(999u64);
        let msg = [3u8; 32];
        let mut sig = sign(&secret, &msg).unwrap();
        sig[40] ^= 0x01;
        let pubkey = ProjectivePoint::mul_by_generator(&secret);
        assert!(!verify(&pubkey, &msg, &sig));
    }

    #[test]
    fn test_odd_y_key_signs() {
        // Find a secret whose pubkey has odd y, to cover the negation path.
        let mut secret = Scalar::ONE;
        while !point_y_is_odd(&ProjectivePoint::mul_by_generator(&secret)) {
            secret += Scalar::ONE;
        }
        let msg = [9u8; 32];
        let sig = sign(&secret, &msg).unwrap();
        assert!(verify(&ProjectivePoint::mul_by_generator(&secret), &msg, &sig));
        assert!(!bool::from(ProjectivePoint::mul_by_generator(&secret).is_identity()));
    }
}
