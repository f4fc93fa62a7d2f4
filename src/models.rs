//! MWEB transaction model: Input, Output, Kernel, TxBody, Transaction,
//! and the outer Litecoin envelope.
//!
//! Every type carries its canonical wire form; ids are Blake3 hashes of
//! exactly the serialized bytes. Deserializers reject unknown feature
//! bits, non-canonical varints, oversized proofs and undecodable points,
//! aborting the transaction being parsed.

use crate::bulletproof::{RangeProof, PROOF_SIZE};
use crate::curve::{parse_commitment, parse_pubkey, serialize_commitment, serialize_pubkey};
use crate::hasher::hashed;
use crate::ser::{Reader, Writer};
use crate::{MwebError, ParseError, Result};

use k256::ProjectivePoint;

/// Largest extra-data payload accepted on inputs, outputs and kernels.
pub const MAX_EXTRA_DATA: usize = 100;

/// Largest pegout script accepted.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// 32-byte Blake3 identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// 33-byte compressed secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    /// Serialize a curve point.
    pub fn from_point(point: &ProjectivePoint) -> Self {
        Self(serialize_pubkey(point))
    }

    /// Decompress back to a point.
    pub fn to_point(&self) -> Result<ProjectivePoint> {
        parse_pubkey(&self.0)
    }

    /// The SEC1 bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// 33-byte Pedersen commitment (0x08/0x09 residue prefix).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment(pub [u8; 33]);

impl Commitment {
    /// Serialize a curve point in commitment form.
    pub fn from_point(point: &ProjectivePoint) -> Self {
        Self(serialize_commitment(point))
    }

    /// Load the committed point.
    pub fn to_point(&self) -> Result<ProjectivePoint> {
        parse_commitment(&self.0)
    }

    /// The wire bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// 64-byte BIP-340 Schnorr signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output message
// ---------------------------------------------------------------------------

/// The receiver-facing fields of an output (ECDHE pubkey, view tag,
/// masked value/nonce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardFields {
    /// Ke = s·Bi, the sender's key-exchange pubkey
    pub key_exchange_pubkey: PublicKey,
    /// First byte of the tagged shared-secret hash; cheap scan filter
    pub view_tag: u8,
    /// Value XOR value-mask
    pub masked_value: u64,
    /// Output nonce XOR nonce-mask
    pub masked_nonce: [u8; 16],
}

/// Feature-gated message carried in every output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputMessage {
    /// Receiver fields; absent only for non-standard outputs
    pub standard: Option<StandardFields>,
    /// Opaque extra payload
    pub extra_data: Vec<u8>,
}

impl OutputMessage {
    /// Receiver-field bit.
    pub const STANDARD_FIELDS_FEATURE_BIT: u8 = 0x01;
    /// Extra-data bit.
    pub const EXTRA_DATA_FEATURE_BIT: u8 = 0x02;
    const ALL_FEATURE_BITS: u8 = 0x03;

    /// The feature byte implied by the populated fields.
    pub fn features(&self) -> u8 {
        let mut bits = 0;
        if self.standard.is_some() {
            bits |= Self::STANDARD_FIELDS_FEATURE_BIT;
        }
        if !self.extra_data.is_empty() {
            bits |= Self::EXTRA_DATA_FEATURE_BIT;
        }
        bits
    }

    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        w.write_u8(self.features());
        if let Some(fields) = &self.standard {
            w.write_bytes(fields.key_exchange_pubkey.as_bytes());
            w.write_u8(fields.view_tag);
            w.write_u64(fields.masked_value);
            w.write_bytes(&fields.masked_nonce);
        }
        if !self.extra_data.is_empty() {
            w.write_vec(&self.extra_data);
        }
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let features = r.read_u8()?;
        if features & !Self::ALL_FEATURE_BITS != 0 {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        let standard = if features & Self::STANDARD_FIELDS_FEATURE_BIT != 0 {
            Some(StandardFields {
                key_exchange_pubkey: read_pubkey(r)?,
                view_tag: r.read_u8()?,
                masked_value: r.read_u64()?,
                masked_nonce: r.read_array()?,
            })
        } else {
            None
        };
        let extra_data = if features & Self::EXTRA_DATA_FEATURE_BIT != 0 {
            r.read_vec(MAX_EXTRA_DATA)?
        } else {
            Vec::new()
        };
        // An empty payload under a set bit would re-serialize differently.
        if features & Self::EXTRA_DATA_FEATURE_BIT != 0 && extra_data.is_empty() {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        Ok(Self {
            standard,
            extra_data,
        })
    }

    /// Canonical serialization.
    pub fn serialized(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_vec()
    }
}

fn read_pubkey(r: &mut Reader) -> Result<PublicKey> {
    let bytes: [u8; 33] = r.read_array()?;
    // Must decompress; a bad point aborts the parse.
    parse_pubkey(&bytes)?;
    Ok(PublicKey(bytes))
}

fn read_commitment(r: &mut Reader) -> Result<Commitment> {
    let bytes: [u8; 33] = r.read_array()?;
    parse_commitment(&bytes)?;
    Ok(Commitment(bytes))
}

fn read_signature(r: &mut Reader) -> Result<Signature> {
    Ok(Signature(r.read_array()?))
}

fn read_count(r: &Reader, min_item_size: usize) -> usize {
    // Upper bound for pre-allocation; actual reads still bound the stream.
    r.remaining() / min_item_size.max(1) + 1
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A confidential output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Pedersen commitment to (value, switched blind)
    pub commitment: Commitment,
    /// Ephemeral sender key; signs the output and enters the stealth sum
    pub sender_pubkey: PublicKey,
    /// One-time output key Ko owned by the receiver
    pub receiver_pubkey: PublicKey,
    /// Receiver-facing message fields
    pub message: OutputMessage,
    /// 64-bit Bulletproof over the committed value
    pub range_proof: RangeProof,
    /// Sender signature over the output
    pub signature: Signature,
}

impl Output {
    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        w.write_bytes(self.commitment.as_bytes());
        w.write_bytes(self.sender_pubkey.as_bytes());
        w.write_bytes(self.receiver_pubkey.as_bytes());
        self.message.write(w);
        w.write_vec(self.range_proof.as_bytes());
        w.write_bytes(self.signature.as_bytes());
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let commitment = read_commitment(r)?;
        let sender_pubkey = read_pubkey(r)?;
        let receiver_pubkey = read_pubkey(r)?;
        let message = OutputMessage::read(r)?;
        let proof_len = r.read_varint()? as usize;
        if proof_len > PROOF_SIZE {
            return Err(MwebError::Parse(ParseError::OversizedProof(proof_len)));
        }
        let range_proof = RangeProof::from_vec(r.read_bytes(proof_len)?.to_vec());
        let signature = read_signature(r)?;
        Ok(Self {
            commitment,
            sender_pubkey,
            receiver_pubkey,
            message,
            range_proof,
            signature,
        })
    }

    /// Canonical serialization.
    pub fn serialized(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_vec()
    }

    /// Blake3 id of the serialized output.
    pub fn id(&self) -> Hash {
        Hash(hashed(&self.serialized()))
    }

    /// The hash the sender signature commits to.
    pub fn signature_message(&self) -> [u8; 32] {
        crate::hasher::Hasher::new()
            .append(self.commitment.as_bytes())
            .append(self.sender_pubkey.as_bytes())
            .append(self.receiver_pubkey.as_bytes())
            .append(&hashed(&self.message.serialized()))
            .append(&hashed(self.range_proof.as_bytes()))
            .finalize()
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A reference spending a previous MWEB output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Id of the output being spent
    pub output_id: Hash,
    /// Commitment of the output being spent
    pub commitment: Commitment,
    /// Ephemeral input key; enters the stealth sum
    pub input_pubkey: Option<PublicKey>,
    /// One-time key of the output being spent
    pub output_pubkey: PublicKey,
    /// Opaque extra payload
    pub extra_data: Vec<u8>,
    /// Signature by the aggregated input/output key
    pub signature: Signature,
}

impl Input {
    /// Ephemeral-input-key bit.
    pub const STEALTH_KEY_FEATURE_BIT: u8 = 0x01;
    /// Extra-data bit.
    pub const EXTRA_DATA_FEATURE_BIT: u8 = 0x02;
    const ALL_FEATURE_BITS: u8 = 0x03;

    /// The feature byte implied by the populated fields.
    pub fn features(&self) -> u8 {
        let mut bits = 0;
        if self.input_pubkey.is_some() {
            bits |= Self::STEALTH_KEY_FEATURE_BIT;
        }
        if !self.extra_data.is_empty() {
            bits |= Self::EXTRA_DATA_FEATURE_BIT;
        }
        bits
    }

    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        w.write_u8(self.features());
        w.write_bytes(self.output_id.as_bytes());
        w.write_bytes(self.commitment.as_bytes());
        if let Some(input_pubkey) = &self.input_pubkey {
            w.write_bytes(input_pubkey.as_bytes());
        }
        w.write_bytes(self.output_pubkey.as_bytes());
        if !self.extra_data.is_empty() {
            w.write_vec(&self.extra_data);
        }
        w.write_bytes(self.signature.as_bytes());
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let features = r.read_u8()?;
        if features & !Self::ALL_FEATURE_BITS != 0 {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        let output_id = Hash(r.read_array()?);
        let commitment = read_commitment(r)?;
        let input_pubkey = if features & Self::STEALTH_KEY_FEATURE_BIT != 0 {
            Some(read_pubkey(r)?)
        } else {
            None
        };
        let output_pubkey = read_pubkey(r)?;
        let extra_data = if features & Self::EXTRA_DATA_FEATURE_BIT != 0 {
            r.read_vec(MAX_EXTRA_DATA)?
        } else {
            Vec::new()
        };
        if features & Self::EXTRA_DATA_FEATURE_BIT != 0 && extra_data.is_empty() {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        let signature = read_signature(r)?;
        Ok(Self {
            output_id,
            commitment,
            input_pubkey,
            output_pubkey,
            extra_data,
            signature,
        })
    }

    /// The hash the input signature commits to.
    pub fn signature_message(&self) -> [u8; 32] {
        crate::hasher::Hasher::new()
            .append(&[self.features()])
            .append(self.output_id.as_bytes())
            .finalize()
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// Value leaving the extension block for a canonical Litecoin script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PegOutCoin {
    /// Amount in satoshi
    pub amount: u64,
    /// Destination scriptPubKey, carried opaque
    pub script_pubkey: Vec<u8>,
}

impl PegOutCoin {
    fn write(&self, w: &mut Writer) {
        w.write_varint(self.amount);
        w.write_vec(&self.script_pubkey);
    }

    fn read(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            amount: r.read_varint()?,
            script_pubkey: r.read_vec(MAX_SCRIPT_SIZE)?,
        })
    }
}

/// The per-transaction kernel: signed excess plus fee/pegin/pegout data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    /// Fee paid by this kernel
    pub fee: Option<u64>,
    /// Value pegged in from the canonical side
    pub pegin: Option<u64>,
    /// Values pegged out to canonical scripts
    pub pegouts: Vec<PegOutCoin>,
    /// Minimum block height
    pub lock_height: Option<u64>,
    /// Public stealth excess for the stealth-sum check
    pub stealth_excess: Option<PublicKey>,
    /// Opaque extra payload
    pub extra_data: Vec<u8>,
    /// Commitment to the excess blind (plus the supply term on H)
    pub excess: Commitment,
    /// Signature by the excess key over the kernel message
    pub signature: Signature,
}

impl Kernel {
    /// Fee bit.
    pub const FEE_FEATURE_BIT: u8 = 0x01;
    /// Pegin bit.
    pub const PEGIN_FEATURE_BIT: u8 = 0x02;
    /// Pegout bit.
    pub const PEGOUT_FEATURE_BIT: u8 = 0x04;
    /// Lock-height bit.
    pub const HEIGHT_LOCK_FEATURE_BIT: u8 = 0x08;
    /// Stealth-excess bit.
    pub const STEALTH_EXCESS_FEATURE_BIT: u8 = 0x10;
    /// Extra-data bit.
    pub const EXTRA_DATA_FEATURE_BIT: u8 = 0x20;
    const ALL_FEATURE_BITS: u8 = 0x3f;

    /// The feature byte implied by the populated fields.
    pub fn features(&self) -> u8 {
        let mut bits = 0;
        if self.fee.is_some() {
            bits |= Self::FEE_FEATURE_BIT;
        }
        if self.pegin.is_some() {
            bits |= Self::PEGIN_FEATURE_BIT;
        }
        if !self.pegouts.is_empty() {
            bits |= Self::PEGOUT_FEATURE_BIT;
        }
        if self.lock_height.is_some() {
            bits |= Self::HEIGHT_LOCK_FEATURE_BIT;
        }
        if self.stealth_excess.is_some() {
            bits |= Self::STEALTH_EXCESS_FEATURE_BIT;
        }
        if !self.extra_data.is_empty() {
            bits |= Self::EXTRA_DATA_FEATURE_BIT;
        }
        bits
    }

    fn write_message_fields(&self, w: &mut Writer) {
        w.write_u8(self.features());
        if let Some(fee) = self.fee {
            w.write_varint(fee);
        }
        if let Some(pegin) = self.pegin {
            w.write_varint(pegin);
        }
        if !self.pegouts.is_empty() {
            w.write_varint(self.pegouts.len() as u64);
            for pegout in &self.pegouts {
                pegout.write(w);
            }
        }
        if let Some(lock_height) = self.lock_height {
            w.write_varint(lock_height);
        }
        if let Some(stealth_excess) = &self.stealth_excess {
            w.write_bytes(stealth_excess.as_bytes());
        }
        if !self.extra_data.is_empty() {
            w.write_vec(&self.extra_data);
        }
    }

    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        self.write_message_fields(w);
        w.write_bytes(self.excess.as_bytes());
        w.write_bytes(self.signature.as_bytes());
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let features = r.read_u8()?;
        if features & !Self::ALL_FEATURE_BITS != 0 {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        let fee = if features & Self::FEE_FEATURE_BIT != 0 {
            Some(r.read_varint()?)
        } else {
            None
        };
        let pegin = if features & Self::PEGIN_FEATURE_BIT != 0 {
            Some(r.read_varint()?)
        } else {
            None
        };
        let pegouts = if features & Self::PEGOUT_FEATURE_BIT != 0 {
            let count = r.read_varint()? as usize;
            if count == 0 || count > read_count(r, 2) {
                return Err(MwebError::Parse(ParseError::TruncatedStream));
            }
            let mut pegouts = Vec::with_capacity(count);
            for _ in 0..count {
                pegouts.push(PegOutCoin::read(r)?);
            }
            pegouts
        } else {
            Vec::new()
        };
        let lock_height = if features & Self::HEIGHT_LOCK_FEATURE_BIT != 0 {
            Some(r.read_varint()?)
        } else {
            None
        };
        let stealth_excess = if features & Self::STEALTH_EXCESS_FEATURE_BIT != 0 {
            Some(read_pubkey(r)?)
        } else {
            None
        };
        let extra_data = if features & Self::EXTRA_DATA_FEATURE_BIT != 0 {
            r.read_vec(MAX_EXTRA_DATA)?
        } else {
            Vec::new()
        };
        if features & Self::EXTRA_DATA_FEATURE_BIT != 0 && extra_data.is_empty() {
            return Err(MwebError::Parse(ParseError::UnknownFeatures(features)));
        }
        let excess = read_commitment(r)?;
        let signature = read_signature(r)?;
        Ok(Self {
            fee,
            pegin,
            pegouts,
            lock_height,
            stealth_excess,
            extra_data,
            excess,
            signature,
        })
    }

    /// Canonical serialization.
    pub fn serialized(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_vec()
    }

    /// Blake3 id of the serialized kernel.
    pub fn id(&self) -> Hash {
        Hash(hashed(&self.serialized()))
    }

    /// The hash the kernel signature commits to: every field except the
    /// excess and the signature itself.
    pub fn signature_message(&self) -> [u8; 32] {
        let mut w = Writer::new();
        self.write_message_fields(&mut w);
        hashed(&w.into_vec())
    }

    /// Net value this kernel adds to the extension block:
    /// `pegin − fee − Σ pegout`.
    pub fn supply_change(&self) -> i128 {
        let pegin = self.pegin.unwrap_or(0) as i128;
        let fee = self.fee.unwrap_or(0) as i128;
        let pegout: i128 = self.pegouts.iter().map(|p| p.amount as i128).sum();
        pegin - fee - pegout
    }
}

// ---------------------------------------------------------------------------
// TxBody and Transaction
// ---------------------------------------------------------------------------

/// The inputs, outputs and kernels of an MWEB transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxBody {
    /// Spent outputs
    pub inputs: Vec<Input>,
    /// Created outputs
    pub outputs: Vec<Output>,
    /// Kernels (usually exactly one)
    pub kernels: Vec<Kernel>,
}

impl TxBody {
    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        w.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.write(w);
        }
        w.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(w);
        }
        w.write_varint(self.kernels.len() as u64);
        for kernel in &self.kernels {
            kernel.write(w);
        }
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let input_count = r.read_varint()? as usize;
        if input_count > read_count(r, 131) {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(Input::read(r)?);
        }

        let output_count = r.read_varint()? as usize;
        if output_count > read_count(r, 164) {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(Output::read(r)?);
        }

        let kernel_count = r.read_varint()? as usize;
        if kernel_count > read_count(r, 98) {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        let mut kernels = Vec::with_capacity(kernel_count);
        for _ in 0..kernel_count {
            kernels.push(Kernel::read(r)?);
        }

        Ok(Self {
            inputs,
            outputs,
            kernels,
        })
    }
}

/// A full MWEB transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Published summand of the kernel excess blinds
    pub kernel_offset: [u8; 32],
    /// Published summand of the stealth keys
    pub stealth_offset: [u8; 32],
    /// Inputs, outputs, kernels
    pub body: TxBody,
}

impl Transaction {
    /// Serialize into `w`.
    pub fn write(&self, w: &mut Writer) {
        w.write_bytes(&self.kernel_offset);
        w.write_bytes(&self.stealth_offset);
        self.body.write(w);
    }

    /// Parse from `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        Ok(Self {
            kernel_offset: r.read_array()?,
            stealth_offset: r.read_array()?,
            body: TxBody::read(r)?,
        })
    }

    /// Canonical serialization.
    pub fn serialized(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_vec()
    }

    /// Parse a standalone MWEB transaction, requiring the whole buffer to
    /// be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let tx = Self::read(&mut r)?;
        if !r.is_exhausted() {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        Ok(tx)
    }

    /// Validate signatures, range proofs and balance (see
    /// [`crate::validation`]).
    pub fn validate(&self) -> Result<()> {
        crate::validation::validate_transaction(self)
    }
}

// ---------------------------------------------------------------------------
// Outer Litecoin envelope
// ---------------------------------------------------------------------------

const WITNESS_FLAG: u8 = 0x01;
const MWEB_FLAG: u8 = 0x08;

/// One outer (canonical-side) transaction input, carried opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtcTxIn {
    /// Previous output (txid ‖ index)
    pub prevout: [u8; 36],
    /// scriptSig bytes
    pub script_sig: Vec<u8>,
    /// Sequence number
    pub sequence: u32,
    /// Witness stack, one blob per item
    pub witness: Vec<Vec<u8>>,
}

/// One outer transaction output, carried opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtcTxOut {
    /// Amount in satoshi
    pub value: i64,
    /// scriptPubKey bytes
    pub script_pubkey: Vec<u8>,
}

/// The canonical-side skeleton of a Litecoin transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LtcTxData {
    /// Version field
    pub version: i32,
    /// Canonical inputs
    pub inputs: Vec<LtcTxIn>,
    /// Canonical outputs
    pub outputs: Vec<LtcTxOut>,
    /// Lock time
    pub lock_time: u32,
}

/// A Litecoin transaction, with or without the MWEB extension.
///
/// The 0x08 extension flag selects the second arm; the MWEB payload is a
/// one-byte version followed by the [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LtcTransaction {
    /// No extension data
    Regular(LtcTxData),
    /// Extension flag set: canonical skeleton plus MWEB transaction
    WithMweb {
        /// Canonical-side fields
        data: LtcTxData,
        /// MWEB transaction version byte
        mweb_version: u8,
        /// The extension transaction
        mweb: Transaction,
    },
}

// The outer envelope keeps Bitcoin wire conventions: little-endian
// integers and compact-size lengths.
fn write_compact_size(w: &mut Writer, value: u64) {
    if value < 0xfd {
        w.write_u8(value as u8);
    } else if value <= 0xffff {
        w.write_u8(0xfd);
        w.write_bytes(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        w.write_u8(0xfe);
        w.write_bytes(&(value as u32).to_le_bytes());
    } else {
        w.write_u8(0xff);
        w.write_bytes(&value.to_le_bytes());
    }
}

fn read_compact_size(r: &mut Reader) -> Result<u64> {
    let first = r.read_u8()?;
    let value = match first {
        0xfd => u64::from(u16::from_le_bytes(r.read_array()?)),
        0xfe => u64::from(u32::from_le_bytes(r.read_array()?)),
        0xff => u64::from_le_bytes(r.read_array()?),
        _ => return Ok(u64::from(first)),
    };
    // Reject non-minimal encodings.
    let minimal = match first {
        0xfd => value >= 0xfd,
        0xfe => value > 0xffff,
        _ => value > 0xffff_ffff,
    };
    if !minimal {
        return Err(MwebError::Parse(ParseError::BadVarint));
    }
    Ok(value)
}

fn read_script(r: &mut Reader) -> Result<Vec<u8>> {
    let len = read_compact_size(r)?;
    if len > MAX_SCRIPT_SIZE as u64 || len > r.remaining() as u64 {
        return Err(MwebError::Parse(ParseError::TruncatedStream));
    }
    Ok(r.read_bytes(len as usize)?.to_vec())
}

impl LtcTransaction {
    /// Parse a node-relayed transaction, branching on the extension flag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let version = i32::from_le_bytes(r.read_array()?);

        let mut flags = 0u8;
        let mut input_count = read_compact_size(&mut r)?;
        if input_count == 0 && r.remaining() > 0 {
            // BIP-144 marker: a zero here means "flags follow".
            flags = r.read_u8()?;
            if flags == 0 || flags & !(WITNESS_FLAG | MWEB_FLAG) != 0 {
                return Err(MwebError::Parse(ParseError::UnknownFlag(flags)));
            }
            input_count = read_compact_size(&mut r)?;
        }

        if input_count > r.remaining() as u64 / 41 + 1 {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            inputs.push(LtcTxIn {
                prevout: r.read_array()?,
                script_sig: read_script(&mut r)?,
                sequence: u32::from_le_bytes(r.read_array()?),
                witness: Vec::new(),
            });
        }

        let output_count = read_compact_size(&mut r)?;
        if output_count > r.remaining() as u64 / 9 + 1 {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            outputs.push(LtcTxOut {
                value: i64::from_le_bytes(r.read_array()?),
                script_pubkey: read_script(&mut r)?,
            });
        }

        if flags & WITNESS_FLAG != 0 {
            for input in &mut inputs {
                let item_count = read_compact_size(&mut r)?;
                if item_count > r.remaining() as u64 + 1 {
                    return Err(MwebError::Parse(ParseError::TruncatedStream));
                }
                for _ in 0..item_count {
                    input.witness.push(read_script(&mut r)?);
                }
            }
        }

        let mweb = if flags & MWEB_FLAG != 0 {
            let mweb_version = r.read_u8()?;
            Some((mweb_version, Transaction::read(&mut r)?))
        } else {
            None
        };

        let lock_time = u32::from_le_bytes(r.read_array()?);
        if !r.is_exhausted() {
            return Err(MwebError::Parse(ParseError::TruncatedStream));
        }

        let data = LtcTxData {
            version,
            inputs,
            outputs,
            lock_time,
        };
        Ok(match mweb {
            Some((mweb_version, mweb)) => Self::WithMweb {
                data,
                mweb_version,
                mweb,
            },
            None => Self::Regular(data),
        })
    }

    /// Serialize back to the node wire form.
    pub fn serialized(&self) -> Vec<u8> {
        let (data, mweb) = match self {
            Self::Regular(data) => (data, None),
            Self::WithMweb {
                data,
                mweb_version,
                mweb,
            } => (data, Some((*mweb_version, mweb))),
        };

        let has_witness = data.inputs.iter().any(|input| !input.witness.is_empty());
        let mut flags = 0u8;
        if has_witness {
            flags |= WITNESS_FLAG;
        }
        if mweb.is_some() {
            flags |= MWEB_FLAG;
        }

        let mut w = Writer::new();
        w.write_bytes(&data.version.to_le_bytes());
        if flags != 0 {
            w.write_u8(0x00);
            w.write_u8(flags);
        }

        write_compact_size(&mut w, data.inputs.len() as u64);
        for input in &data.inputs {
            w.write_bytes(&input.prevout);
            write_compact_size(&mut w, input.script_sig.len() as u64);
            w.write_bytes(&input.script_sig);
            w.write_bytes(&input.sequence.to_le_bytes());
        }
        write_compact_size(&mut w, data.outputs.len() as u64);
        for output in &data.outputs {
            w.write_bytes(&output.value.to_le_bytes());
            write_compact_size(&mut w, output.script_pubkey.len() as u64);
            w.write_bytes(&output.script_pubkey);
        }
        if flags & WITNESS_FLAG != 0 {
            for input in &data.inputs {
                write_compact_size(&mut w, input.witness.len() as u64);
                for item in &input.witness {
                    write_compact_size(&mut w, item.len() as u64);
                    w.write_bytes(item);
                }
            }
        }
        if let Some((mweb_version, mweb)) = mweb {
            w.write_u8(mweb_version);
            mweb.write(&mut w);
        }
        w.write_bytes(&data.lock_time.to_le_bytes());
        w.into_vec()
    }

    /// The embedded MWEB transaction, when present.
    pub fn mweb(&self) -> Option<&Transaction> {
        match self {
            Self::Regular(_) => None,
            Self::WithMweb { mweb, .. } => Some(mweb),
        }
    }
}
