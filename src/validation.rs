//! Transaction validation: range proofs, signatures, and the two balance
//! equations.
//!
//! A transaction passes when every output's proof and signature verify,
//! every input and kernel signature verifies, the commitments balance
//! against the kernel excesses plus the published offset, and the stealth
//! pubkeys balance against the stealth excesses plus their offset.

use k256::{elliptic_curve::ops::MulByGenerator, ProjectivePoint, Scalar};

use crate::builder::supply_term;
use crate::curve::{scalar_from_bytes, scalar_reduce};
use crate::hasher::Hasher;
use crate::models::{Input, Kernel, Output, Transaction, TxBody};
use crate::schnorr;
use crate::{MwebError, Result, VerifyError};

/// Validate every output: commitment decodes, range proof verifies against
/// the message it is bound to, sender signature verifies.
fn validate_output(output: &Output) -> Result<()> {
    let commitment = output.commitment.to_point()?;

    output
        .range_proof
        .verify(&commitment, &output.message.serialized())
        .map_err(|err| match err {
            MwebError::Verify(VerifyError::MalformedProof) => err,
            _ => MwebError::Verify(VerifyError::RangeProof),
        })?;

    schnorr::verify_or(
        &output.sender_pubkey.to_point()?,
        &output.signature_message(),
        output.signature.as_bytes(),
        VerifyError::SenderSig,
    )
}

/// Validate an input signature against its aggregated key
/// `Ki + H(Ki ‖ Ko)·Ko`.
fn validate_input(input: &Input) -> Result<()> {
    let output_point = input.output_pubkey.to_point()?;
    let key_point = match &input.input_pubkey {
        Some(input_pubkey) => {
            let key_hash = Hasher::new()
                .append(input_pubkey.as_bytes())
                .append(input.output_pubkey.as_bytes())
                .finalize();
            input_pubkey.to_point()? + output_point * scalar_reduce(&key_hash)
        }
        None => output_point,
    };
    schnorr::verify_or(
        &key_point,
        &input.signature_message(),
        input.signature.as_bytes(),
        VerifyError::OutputSig,
    )
}

/// Validate a kernel signature against the excess key. The stored excess
/// folds the supply change onto H; stripping it leaves `e·G`.
fn validate_kernel(kernel: &Kernel) -> Result<()> {
    let excess_point = kernel.excess.to_point()? - supply_term(kernel.supply_change());
    schnorr::verify_or(
        &excess_point,
        &kernel.signature_message(),
        kernel.signature.as_bytes(),
        VerifyError::KernelSig,
    )
}

/// Per-component checks over the whole body.
pub fn validate_body(body: &TxBody) -> Result<()> {
    for output in &body.outputs {
        validate_output(output)?;
    }
    for input in &body.inputs {
        validate_input(input)?;
    }
    for kernel in &body.kernels {
        validate_kernel(kernel)?;
    }
    Ok(())
}

fn offset_scalar(bytes: &[u8; 32]) -> Result<Scalar> {
    scalar_from_bytes(bytes)
}

/// Kernel-sum balance:
/// `Σ C_out − Σ C_in = Σ excess + kernel_offset·G`.
///
/// The fee/pegin/pegout terms cancel because each stored excess already
/// carries its kernel's supply change on H.
pub fn validate_kernel_sum(tx: &Transaction) -> Result<()> {
    let mut utxo_sum = ProjectivePoint::IDENTITY;
    for output in &tx.body.outputs {
        utxo_sum += output.commitment.to_point()?;
    }
    for input in &tx.body.inputs {
        utxo_sum -= input.commitment.to_point()?;
    }

    let offset = offset_scalar(&tx.kernel_offset)?;
    let mut kernel_sum = ProjectivePoint::mul_by_generator(&offset);
    for kernel in &tx.body.kernels {
        kernel_sum += kernel.excess.to_point()?;
    }

    if utxo_sum != kernel_sum {
        return Err(MwebError::Verify(VerifyError::KernelSumMismatch));
    }
    Ok(())
}

/// Stealth balance:
/// `Σ sender_pubkeys + Σ input_pubkeys = Σ stealth_excess + stealth_offset·G`.
pub fn validate_stealth_sum(tx: &Transaction) -> Result<()> {
    let mut key_sum = ProjectivePoint::IDENTITY;
    for output in &tx.body.outputs {
        key_sum += output.sender_pubkey.to_point()?;
    }
    for input in &tx.body.inputs {
        if let Some(input_pubkey) = &input.input_pubkey {
            key_sum += input_pubkey.to_point()?;
        }
    }

    let offset = offset_scalar(&tx.stealth_offset)?;
    let mut excess_sum = ProjectivePoint::mul_by_generator(&offset);
    for kernel in &tx.body.kernels {
        if let Some(stealth_excess) = &kernel.stealth_excess {
            excess_sum += stealth_excess.to_point()?;
        }
    }

    if key_sum != excess_sum {
        return Err(MwebError::Verify(VerifyError::StealthSumMismatch));
    }
    Ok(())
}

/// Full transaction validation.
pub fn validate_transaction(tx: &Transaction) -> Result<()> {
    validate_body(&tx.body)?;
    validate_kernel_sum(tx)?;
    validate_stealth_sum(tx)
}
