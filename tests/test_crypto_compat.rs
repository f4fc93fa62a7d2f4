//! Compatibility tests against the C secp256k1-zkp reference.
//!
//! Known-answer vectors for the ChaCha20 scalar PRF, the RFC6979 DRBG as
//! seeded by the generator chain, and Pedersen commitments observed on
//! chain. A mismatch in any of these silently breaks interoperability, so
//! they pin exact bytes wherever the reference bytes are known.

use k256::Scalar;
use mweb_crypto::bulletproof::inner_product_proof_length;
use mweb_crypto::chacha::scalar_chacha20;
use mweb_crypto::curve::{scalar_from_bytes, GENERATOR_G};
use mweb_crypto::drbg::Rfc6979HmacSha256;
use mweb_crypto::pedersen::{add_blinding_factors, blind_switch, commit_serialized};

fn scalar_hex(s: &str) -> Scalar {
    let bytes: [u8; 32] = hex::decode(s).unwrap().try_into().unwrap();
    scalar_from_bytes(&bytes).unwrap()
}

#[test]
fn test_scalar_chacha20_zero_seed_kat() {
    // seed = 0^256, idx = 0. Both outputs must sit below the group order
    // on the first try, so they are exactly the first ChaCha20 keystream
    // block of the all-zero key.
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
fn test_scalar_chacha20_counter_layout() {
    // idx lands in counter words 12/13: low and high halves must both
    // change the stream.
    let seed = [0x11u8; 32];
    let (base, _) = scalar_chacha20(&seed, 0);
    let (low, _) = scalar_chacha20(&seed, 1);
    let (high, _) = scalar_chacha20(&seed, 1u64 << 32);
    assert_ne!(base, low);
    assert_ne!(base, high);
    assert_ne!(low, high);
}

#[test]
fn test_rfc6979_generator_seed_kat() {
    // The bulletproof generator chain seeds the DRBG with Gx ‖ Gy; the
    // reference's first two draws start/end with these bytes.
    let mut drbg = Rfc6979HmacSha256::new(&GENERATOR_G);
    let first = drbg.generate_32();
    let second = drbg.generate_32();

    assert_eq!(&first[..4], &[0xed, 0xc8, 0x83, 0xa9]);
    assert_eq!(&first[30..], &[0x88, 0xc7]);
    assert_eq!(&second[..4], &[0xd9, 0x99, 0x94, 0xe5]);
    assert_eq!(&second[30..], &[0xb6, 0x5f]);
}

#[test]
fn test_pedersen_commit_chain_vectors() {
    // Live commitments from the reference implementation.
    let blind = scalar_hex("7e05e476e3159797fe8f0578ad37bfd5775a70e0674ad928bdec74ab7e430880");
    assert_eq!(
        hex::encode(commit_serialized(1_100_000_000, &blind)),
        "09e2fc408916f7813179b6540c91d7d39e779ccc42a522bdfb154004cae85409d2"
    );

    let blind = scalar_hex("c5bb492b50cd862cdea0f411b0ee3ec464670f3f6e1a93909da06575475c6648");
    assert_eq!(
        hex::encode(commit_serialized(600_000_000, &blind)),
        "08744532b82ac2131ee55f9c1c12fb6859d3bbbbd505a952ddcca142e097eb4409"
    );
}

#[test]
fn test_blind_sum_vectors() {
    let one = scalar_hex("0101010101010101010101010101010101010101010101010101010101010101");
    let two = scalar_hex("0202020202020202020202020202020202020202020202020202020202020202");
    let three = scalar_hex("0303030303030303030303030303030303030303030303030303030303030303");
    let five = scalar_hex("0505050505050505050505050505050505050505050505050505050505050505");

    assert_eq!(add_blinding_factors(&[one, two], &[]).to_bytes(), three.to_bytes());
    assert_eq!(add_blinding_factors(&[five], &[three]).to_bytes(), two.to_bytes());
    assert_eq!(
        add_blinding_factors(&[], &[]).to_bytes(),
        Scalar::ZERO.to_bytes()
    );
}

#[test]
fn test_blind_switch_binds_value() {
    let blind = scalar_hex("0101010101010101010101010101010101010101010101010101010101010101");
    let switched_low = blind_switch(&blind, 1);
    let switched_high = blind_switch(&blind, 2);
    assert_ne!(switched_low.to_bytes(), switched_high.to_bytes());
    // Re-derivation is exact; the receiver computes the same switch.
    assert_eq!(
        blind_switch(&blind, 1).to_bytes(),
        switched_low.to_bytes()
    );
}

#[test]
fn test_inner_product_proof_lengths() {
    // Reference lengths for the secp256k1-zkp inner-product encoding.
    assert_eq!(inner_product_proof_length(0), 32);
    assert_eq!(inner_product_proof_length(1), 96);
    assert_eq!(inner_product_proof_length(2), 160);
    assert_eq!(inner_product_proof_length(4), 225);
    assert_eq!(inner_product_proof_length(8), 289);
    assert_eq!(inner_product_proof_length(16), 353);
    assert_eq!(inner_product_proof_length(32), 417);
    assert_eq!(inner_product_proof_length(64), 482);
    assert_eq!(inner_product_proof_length(128), 546);
}
