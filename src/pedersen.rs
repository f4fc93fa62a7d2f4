//! Pedersen commitments and blinding-factor algebra.
//!
//! `Commit(v, r) = v·H + r·G`, with H the secp256k1-zkp value generator.
//! The switch commitment re-randomizes a blind against the J generator so
//! the blind is bound to the committed value.

use k256::{
    elliptic_curve::ops::MulByGenerator,
    ProjectivePoint, Scalar,
};

use crate::curve::{generator_h, generator_j, scalar_reduce, serialize_commitment, serialize_pubkey};
use crate::hasher::Hasher;

/// Create a Pedersen commitment point `v·H + r·G`.
pub fn commit(value: u64, blind: &Scalar) -> ProjectivePoint {
    let value_scalar = Scalar::from(value);
    ProjectivePoint::mul_by_generator(blind) + generator_h() * value_scalar
}

/// Create a Pedersen commitment in its 33-byte wire form.
pub fn commit_serialized(value: u64, blind: &Scalar) -> [u8; 33] {
    serialize_commitment(&commit(value, blind))
}

/// Switch-blind a raw blinding factor:
/// `r' = r + Blake3(commit(v, r) ‖ (v·J + r·G)) mod n`.
///
/// Deterministic; both sender and receiver derive the same r' from (r, v).
pub fn blind_switch(blind: &Scalar, value: u64) -> Scalar {
    let commitment = commit_serialized(value, blind);
    let value_scalar = Scalar::from(value);
    let j_term = generator_j() * value_scalar + ProjectivePoint::mul_by_generator(blind);

    let hash = Hasher::new()
        .append(&commitment)
        .append(&serialize_pubkey(&j_term))
        .finalize();

    *blind + scalar_reduce(&hash)
}

/// Sum blinding factors: `Σ positive − Σ negative mod n`.
pub fn add_blinding_factors(positive: &[Scalar], negative: &[Scalar]) -> Scalar {
    let mut acc = Scalar::ZERO;
    for blind in positive {
        acc += blind;
    }
    for blind in negative {
        acc -= blind;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::scalar_from_bytes;

    fn scalar_hex(s: &str) -> Scalar {
        let bytes: [u8; 32] = hex::decode(s).unwrap().try_into().unwrap();
        scalar_from_bytes(&bytes).unwrap()
    }

    // Test vectors generated from the C implementation.

    #[test]
    fn test_commit_c_vector_1() {
        let blind =
            scalar_hex("7e05e476e3159797fe8f0578ad37bfd5775a70e0674ad928bdec74ab7e430880");
        let commitment = commit_serialized(1_100_000_000, &blind);
        assert_eq!(
            hex::encode(commitment),
            "09e2fc408916f7813179b6540c91d7d39e779ccc42a522bdfb154004cae85409d2"
        );
    }

    #[test]
    fn test_commit_c_vector_2() {
        let blind =
            scalar_hex("c5bb492b50cd862cdea0f411b0ee3ec464670f3f6e1a93909da06575475c6648");
        let commitment = commit_serialized(600_000_000, &blind);
        assert_eq!(
            hex::encode(commitment),
            "08744532b82ac2131ee55f9c1c12fb6859d3bbbbd505a952ddcca142e097eb4409"
        );
    }

    #[test]
    fn test_commit_zero_value_is_blind_g() {
        // value = 0 leaves only blind·G.
        let blind =
            scalar_hex("4242424242424242424242424242424242424242424242424242424242424242");
        let commitment = commit_serialized(0, &blind);
        assert_eq!(
            hex::encode(commitment),
            "0824653eac434488002cc06bbfb7f10fe18991e35f9fe4302dbea6d2353dc0ab1c"
        );
    }

    #[test]
    fn test_blind_sum_matches_c() {
        let one = scalar_hex("0101010101010101010101010101010101010101010101010101010101010101");
        let two = scalar_hex("0202020202020202020202020202020202020202020202020202020202020202");
        let three =
            scalar_hex("0303030303030303030303030303030303030303030303030303030303030303");
        let four = scalar_hex("0404040404040404040404040404040404040404040404040404040404040404");

        assert_eq!(add_blinding_factors(&[one, two], &[]), three);
        let five = scalar_hex("0505050505050505050505050505050505050505050505050505050505050505");
        assert_eq!(add_blinding_factors(&[five], &[three]), two);
        assert_eq!(add_blinding_factors(&[one, two, three], &[four]), two);
    }

    #[test]
    fn test_blind_switch_deterministic_and_value_bound() {
        let blind =
            scalar_hex("7e05e476e3159797fe8f0578ad37bfd5775a70e0674ad928bdec74ab7e430880");
        let a = blind_switch(&blind, 1000);
        let b = blind_switch(&blind, 1000);
        let c = blind_switch(&blind, 1001);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, blind);
    }

    #[test]
    fn test_commitment_homomorphism() {
        let r1 = scalar_hex("0101010101010101010101010101010101010101010101010101010101010101");
        let r2 = scalar_hex("0202020202020202020202020202020202020202020202020202020202020202");
        let sum = commit(30, &(r1 + r2));
        assert_eq!(commit(10, &r1) + commit(20, &r2), sum);
    }
}
