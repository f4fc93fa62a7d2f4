//! MWEB Crypto Library
//!
//! Pure Rust implementation of the Litecoin MimbleWimble Extension Block
//! (MWEB) cryptographic core: Pedersen commitments, Bulletproof range
//! proofs, stealth addresses with output rewinding, and the transaction
//! builder/validator that ties them together.
//!
//! The primitives reimplement the Litecoin secp256k1-zkp fork on top of
//! k256 (pure Rust secp256k1), so the crate compiles anywhere Rust does,
//! with no C toolchain.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod builder;
pub mod bulletproof;
pub mod chacha;
pub mod curve;
pub mod drbg;
pub mod generators;
pub mod hasher;
pub mod keychain;
pub mod models;
pub mod pedersen;
pub mod schnorr;
pub mod ser;
pub mod stealth;
pub mod validation;

// Re-export main entry points for easy access
pub use builder::{build_pegin, build_transaction, PegOut, Recipient};
pub use bulletproof::{RangeProof, PROOF_SIZE};
pub use hasher::{Hasher, HashTag};
pub use keychain::{
    KeyChain, KeyLookup, ViewKeyChain, CHANGE_INDEX, CUSTOM_KEY, PEGIN_INDEX, UNKNOWN_INDEX,
};
pub use models::{
    Commitment, Hash, Input, Kernel, LtcTransaction, LtcTxData, LtcTxIn, LtcTxOut, Output,
    OutputMessage, PegOutCoin, PublicKey, Signature, StandardFields, Transaction, TxBody,
};
pub use pedersen::{add_blinding_factors, blind_switch, commit};
pub use stealth::{Coin, StealthAddress};

// Re-export k256 types for users who need them
pub use k256::{ProjectivePoint, Scalar};

/// Parse-level failures; these abort the transaction being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An outer transaction flag byte carried bits other than 0x01/0x08
    UnknownFlag(u8),
    /// A feature byte carried bits outside the allowed set
    UnknownFeatures(u8),
    /// The stream ended before the expected data
    TruncatedStream,
    /// A varint was non-canonical or overflowed 64 bits
    BadVarint,
    /// A 33-byte encoding did not decompress to a curve point
    BadPoint,
    /// A range proof exceeded the maximum serialized size
    OversizedProof(usize),
}

/// Failures inside the curve/scalar arithmetic layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// An x-coordinate had no matching curve point
    NotOnCurve,
    /// A field element required a square root that does not exist
    NotQuadraticResidue,
    /// A 32-byte string was not a canonical scalar
    ScalarOutOfRange,
    /// Inversion of zero was attempted
    InversionFailed,
}

/// Verification failures; the transaction is rejected but the caller may
/// continue with others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A range proof did not verify
    RangeProof,
    /// An output's sender signature did not verify
    SenderSig,
    /// An input's signature against its output keys did not verify
    OutputSig,
    /// A kernel signature did not verify
    KernelSig,
    /// The commitment/excess balance equation did not hold
    KernelSumMismatch,
    /// The stealth pubkey balance equation did not hold
    StealthSumMismatch,
    /// A proof had the wrong length or unparseable internals
    MalformedProof,
}

/// Failures while constructing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The spendable coins do not cover amount + fee
    InsufficientFunds,
    /// An input coin is missing its spend key or blinding factor
    NoSpendKey,
    /// An amount is negative or overflows when summed
    ValueOutOfRange,
}

/// Error type for MWEB crypto operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MwebError {
    /// Parsing failed
    Parse(ParseError),
    /// Scalar/point arithmetic failed
    Crypto(CryptoError),
    /// Verification failed
    Verify(VerifyError),
    /// Transaction construction failed
    Build(BuildError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFlag(flag) => write!(f, "unknown transaction flag 0x{flag:02x}"),
            Self::UnknownFeatures(bits) => write!(f, "unknown feature bits 0x{bits:02x}"),
            Self::TruncatedStream => write!(f, "truncated stream"),
            Self::BadVarint => write!(f, "non-canonical varint"),
            Self::BadPoint => write!(f, "invalid point encoding"),
            Self::OversizedProof(len) => write!(f, "range proof too large ({len} bytes)"),
        }
    }
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnCurve => write!(f, "not a curve point"),
            Self::NotQuadraticResidue => write!(f, "not a quadratic residue"),
            Self::ScalarOutOfRange => write!(f, "scalar out of range"),
            Self::InversionFailed => write!(f, "inversion of zero"),
        }
    }
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RangeProof => write!(f, "invalid range proof"),
            Self::SenderSig => write!(f, "invalid sender signature"),
            Self::OutputSig => write!(f, "invalid output signature"),
            Self::KernelSig => write!(f, "invalid kernel signature"),
            Self::KernelSumMismatch => write!(f, "kernel sums do not balance"),
            Self::StealthSumMismatch => write!(f, "stealth sums do not balance"),
            Self::MalformedProof => write!(f, "malformed proof"),
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds => write!(f, "insufficient funds"),
            Self::NoSpendKey => write!(f, "no spend key for input coin"),
            Self::ValueOutOfRange => write!(f, "value out of range"),
        }
    }
}

impl std::fmt::Display for MwebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Crypto(e) => write!(f, "crypto error: {e}"),
            Self::Verify(e) => write!(f, "verification error: {e}"),
            Self::Build(e) => write!(f, "build error: {e}"),
        }
    }
}

impl std::error::Error for MwebError {}

impl From<ParseError> for MwebError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<CryptoError> for MwebError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<VerifyError> for MwebError {
    fn from(e: VerifyError) -> Self {
        Self::Verify(e)
    }
}

impl From<BuildError> for MwebError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

/// Result type for MWEB crypto operations
pub type Result<T> = std::result::Result<T, MwebError>;
