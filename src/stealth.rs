//! Stealth addresses, one-time outputs, and the coins recovered from them.
//!
//! An output is built for a recipient `(Bi, Ai = a·Bi)` from an ephemeral
//! send key derived off the payment parameters. The receiver reverses the
//! ECDH with only its scan key: view tag first (cheap filter), then the
//! shared secret opens the masked value/nonce, and the recomputed
//! commitment and key-exchange pubkey authenticate the result.

use k256::{elliptic_curve::ops::MulByGenerator, ProjectivePoint, Scalar};
use zeroize::Zeroize;

use crate::bulletproof::{RangeProof, PROOF_MESSAGE_SIZE};
use crate::curve::{scalar_reduce, serialize_pubkey};
use crate::hasher::{hashed_tag, HashTag, Hasher};
use crate::models::{Commitment, Hash, Output, OutputMessage, PublicKey, Signature, StandardFields};
use crate::pedersen::{blind_switch, commit};
use crate::schnorr;
use crate::Result;

/// A wallet destination: spend pubkey Bi and scan pubkey Ai = a·Bi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealthAddress {
    /// Ai, the per-address scan pubkey
    pub scan_pubkey: PublicKey,
    /// Bi, the per-address spend pubkey
    pub spend_pubkey: PublicKey,
}

impl StealthAddress {
    /// Derive the address for a spend pubkey under scan scalar `a`.
    pub fn from_spend_pubkey(scan_key: &Scalar, spend_pubkey: &ProjectivePoint) -> Self {
        Self {
            scan_pubkey: PublicKey::from_point(&(*spend_pubkey * *scan_key)),
            spend_pubkey: PublicKey::from_point(spend_pubkey),
        }
    }
}

/// Masks derived from a shared secret, opening an output's hidden fields.
pub struct OutputMask {
    /// Pre-switch blinding factor r̂
    pub blind: Scalar,
    /// XOR mask over the value
    pub value_mask: u64,
    /// XOR mask over the 16-byte nonce
    pub nonce_mask: [u8; 16],
}

impl OutputMask {
    /// Derive all masks from the 32-byte shared secret t.
    pub fn from_shared_secret(shared_secret: &[u8; 32]) -> Self {
        let blind = scalar_reduce(&hashed_tag(HashTag::Blind, shared_secret));
        let value_hash = hashed_tag(HashTag::ValueMask, shared_secret);
        let nonce_hash = hashed_tag(HashTag::NonceMask, shared_secret);

        let value_mask =
            u64::from_le_bytes(value_hash[..8].try_into().expect("8-byte mask"));
        let mut nonce_mask = [0u8; 16];
        nonce_mask.copy_from_slice(&nonce_hash[..16]);

        Self {
            blind,
            value_mask,
            nonce_mask,
        }
    }
}

/// An owned output recovered by rewinding, or remembered from building.
#[derive(Debug, Clone)]
pub struct Coin {
    /// Wallet address index the output pays, or a reserved pseudo-index
    pub address_index: u32,
    /// Pre-switch blinding factor, when recoverable
    pub blind: Option<Scalar>,
    /// Amount in satoshi
    pub amount: i64,
    /// Id of the output this coin spends from
    pub output_id: Hash,
    /// The stealth address the output paid
    pub address: Option<StealthAddress>,
    /// Shared secret t, for later proof rewinds
    pub shared_secret: Option<[u8; 32]>,
    /// One-time spend key, absent for view-only recovery
    pub spend_key: Option<Scalar>,
    /// Ephemeral sender key, known only for self-built outputs
    pub sender_key: Option<Scalar>,
}

impl Drop for Coin {
    fn drop(&mut self) {
        if let Some(blind) = &mut self.blind {
            blind.zeroize();
        }
        if let Some(secret) = &mut self.shared_secret {
            secret.zeroize();
        }
        if let Some(key) = &mut self.spend_key {
            key.zeroize();
        }
        if let Some(key) = &mut self.sender_key {
            key.zeroize();
        }
    }
}

/// The ephemeral send scalar `s = Blake3_S(Ai ‖ Bi ‖ v ‖ n)`.
pub(crate) fn send_key(
    scan_pubkey: &PublicKey,
    spend_pubkey: &PublicKey,
    value: u64,
    nonce: &[u8; 16],
) -> Scalar {
    let hash = Hasher::with_tag(HashTag::SendKey)
        .append(scan_pubkey.as_bytes())
        .append(spend_pubkey.as_bytes())
        .append_u64_le(value)
        .append(nonce)
        .finalize();
    scalar_reduce(&hash)
}

/// Build a confidential output paying `value` to `recipient`.
///
/// `sender_key` and `nonce` are the caller's fresh randomness; everything
/// else is derived. Returns the output together with its switched blind,
/// which the builder folds into the kernel excess.
pub fn create_output(
    sender_key: &Scalar,
    nonce: &[u8; 16],
    value: u64,
    recipient: &StealthAddress,
) -> Result<(Output, Scalar)> {
    let scan_point = recipient.scan_pubkey.to_point()?;
    let spend_point = recipient.spend_pubkey.to_point()?;

    let s = send_key(
        &recipient.scan_pubkey,
        &recipient.spend_pubkey,
        value,
        nonce,
    );
    let key_exchange_pubkey = PublicKey::from_point(&(spend_point * s));

    // t_raw = s·Ai = s·a·Bi, known to sender and receiver alone.
    let shared_raw = serialize_pubkey(&(scan_point * s));
    let view_tag = hashed_tag(HashTag::Tag, &shared_raw)[0];
    let mut shared_secret = hashed_tag(HashTag::Derive, &shared_raw);

    // One-time output key Ko = T·Bi.
    let out_tweak = scalar_reduce(&hashed_tag(HashTag::OutKey, &shared_secret));
    let receiver_pubkey = PublicKey::from_point(&(spend_point * out_tweak));

    let mask = OutputMask::from_shared_secret(&shared_secret);
    let masked_value = value ^ mask.value_mask;
    let mut masked_nonce = [0u8; 16];
    for (i, byte) in masked_nonce.iter_mut().enumerate() {
        *byte = nonce[i] ^ mask.nonce_mask[i];
    }

    let switched_blind = blind_switch(&mask.blind, value);
    let commitment = Commitment::from_point(&commit(value, &switched_blind));

    let message = OutputMessage {
        standard: Some(StandardFields {
            key_exchange_pubkey,
            view_tag,
            masked_value,
            masked_nonce,
        }),
        extra_data: Vec::new(),
    };

    // The rewind nonce is t itself; the private nonce stays the sender's.
    let mut private_nonce = Hasher::with_tag(HashTag::Nonce)
        .append(&sender_key.to_bytes())
        .append(&shared_secret)
        .finalize();
    let range_proof = RangeProof::create(
        value,
        &switched_blind,
        &private_nonce,
        &shared_secret,
        &[0u8; PROOF_MESSAGE_SIZE],
        &message.serialized(),
    )?;

    let mut output = Output {
        commitment,
        sender_pubkey: PublicKey::from_point(&ProjectivePoint::mul_by_generator(sender_key)),
        receiver_pubkey,
        message,
        range_proof,
        signature: Signature([0u8; 64]),
    };
    output.signature = Signature(schnorr::sign(sender_key, &output.signature_message())?);

    shared_secret.zeroize();
    private_nonce.zeroize();

    Ok((output, switched_blind))
}
