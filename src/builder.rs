//! Transaction construction: coin selection, outputs, kernel, offsets.
//!
//! The builder is deterministic given the RNG it is handed; tests inject
//! seeded RNGs and receive byte-identical transactions. Value is conserved
//! as `Σ out = Σ in + pegin − Σ pegout − fee`, with any surplus paid back
//! to the wallet's change address.

use k256::{elliptic_curve::ops::MulByGenerator, ProjectivePoint, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::curve::{generator_h, scalar_reduce};
use crate::hasher::Hasher;
use crate::keychain::{KeyLookup, CHANGE_INDEX, PEGIN_INDEX};
use crate::models::{Commitment, Input, Kernel, PegOutCoin, PublicKey, Signature, Transaction, TxBody};
use crate::pedersen::blind_switch;
use crate::schnorr;
use crate::stealth::{create_output, Coin, StealthAddress};
use crate::{BuildError, MwebError, Result};

/// A payment to a stealth address.
#[derive(Debug, Clone)]
pub struct Recipient {
    /// Amount in satoshi
    pub amount: u64,
    /// Destination address
    pub address: StealthAddress,
}

/// A payment out of the extension block to a canonical script.
#[derive(Debug, Clone)]
pub struct PegOut {
    /// Amount in satoshi
    pub amount: u64,
    /// Destination scriptPubKey
    pub script_pubkey: Vec<u8>,
}

fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    scalar_reduce(&bytes)
}

fn checked_total(amounts: impl Iterator<Item = u64>) -> Result<u64> {
    let mut total = 0u64;
    for amount in amounts {
        if amount > i64::MAX as u64 {
            return Err(MwebError::Build(BuildError::ValueOutOfRange));
        }
        total = total
            .checked_add(amount)
            .ok_or(MwebError::Build(BuildError::ValueOutOfRange))?;
    }
    if total > i64::MAX as u64 {
        return Err(MwebError::Build(BuildError::ValueOutOfRange));
    }
    Ok(total)
}

/// Smallest-first prefix selection: sort spendable coins ascending and
/// take the shortest prefix covering `needed`.
fn select_coins(coins: &[Coin], needed: u64, pegin: u64) -> Result<Vec<&Coin>> {
    if pegin >= needed {
        return Ok(Vec::new());
    }
    let mut spendable: Vec<&Coin> = coins
        .iter()
        .filter(|coin| coin.spend_key.is_some() && coin.blind.is_some() && coin.amount > 0)
        .collect();
    spendable.sort_by_key(|coin| coin.amount);

    let mut selected = Vec::new();
    let mut gathered = pegin;
    for coin in spendable {
        if gathered >= needed {
            break;
        }
        gathered = gathered.saturating_add(coin.amount as u64);
        selected.push(coin);
    }
    if gathered < needed {
        return Err(MwebError::Build(BuildError::InsufficientFunds));
    }
    Ok(selected)
}

/// Build an MWEB transaction.
///
/// `coins` is the pool of unspent coins to draw on; recipients, pegouts
/// and the optional pegin amount shape the kernel. All entropy comes from
/// `rng`.
pub fn build_transaction<K: KeyLookup, R: RngCore + CryptoRng>(
    keychain: &K,
    coins: &[Coin],
    recipients: &[Recipient],
    pegouts: &[PegOut],
    pegin: Option<u64>,
    fee: u64,
    rng: &mut R,
) -> Result<Transaction> {
    let pegin_amount = pegin.unwrap_or(0);
    let send_total = checked_total(recipients.iter().map(|r| r.amount))?;
    let pegout_total = checked_total(pegouts.iter().map(|p| p.amount))?;
    let needed = checked_total([send_total, pegout_total, fee].into_iter())?;
    checked_total([pegin_amount].into_iter())?;

    let selected = select_coins(coins, needed, pegin_amount)?;
    let input_total: u64 = selected.iter().map(|coin| coin.amount as u64).sum();

    // Pay back any surplus to the change address.
    let mut payments: Vec<Recipient> = recipients.to_vec();
    let change_wide = input_total as u128 + pegin_amount as u128 - needed as u128;
    if change_wide > i64::MAX as u128 {
        return Err(MwebError::Build(BuildError::ValueOutOfRange));
    }
    let change = change_wide as u64;
    if change > 0 {
        payments.push(Recipient {
            amount: change,
            address: keychain.stealth_address(CHANGE_INDEX),
        });
    }

    // Outputs.
    let mut outputs = Vec::with_capacity(payments.len());
    let mut output_blinds = Vec::with_capacity(payments.len());
    let mut sender_keys = Vec::with_capacity(payments.len());
    for payment in &payments {
        let sender_key = random_scalar(rng);
        let mut nonce = [0u8; 16];
        rng.fill_bytes(&mut nonce);
        let (output, switched_blind) =
            create_output(&sender_key, &nonce, payment.amount, &payment.address)?;
        outputs.push(output);
        output_blinds.push(switched_blind);
        sender_keys.push(sender_key);
    }

    // Inputs.
    let mut inputs = Vec::with_capacity(selected.len());
    let mut input_blinds = Vec::with_capacity(selected.len());
    let mut input_keys = Vec::with_capacity(selected.len());
    for coin in &selected {
        let spend_key = coin.spend_key.as_ref().ok_or(MwebError::Build(BuildError::NoSpendKey))?;
        let blind = coin.blind.as_ref().ok_or(MwebError::Build(BuildError::NoSpendKey))?;
        let input_key = random_scalar(rng);

        let input_pubkey = PublicKey::from_point(&ProjectivePoint::mul_by_generator(&input_key));
        let output_pubkey = PublicKey::from_point(&ProjectivePoint::mul_by_generator(spend_key));

        let mut input = Input {
            output_id: coin.output_id,
            commitment: Commitment::from_point(&crate::pedersen::commit(
                coin.amount as u64,
                &blind_switch(blind, coin.amount as u64),
            )),
            input_pubkey: Some(input_pubkey),
            output_pubkey,
            extra_data: Vec::new(),
            signature: Signature([0u8; 64]),
        };

        // Aggregated key: ki + H(Ki ‖ Ko)·ko signs the input.
        let key_hash = Hasher::new()
            .append(input_pubkey.as_bytes())
            .append(output_pubkey.as_bytes())
            .finalize();
        let sig_key = input_key + scalar_reduce(&key_hash) * spend_key;
        input.signature = Signature(schnorr::sign(&sig_key, &input.signature_message())?);

        inputs.push(input);
        input_blinds.push(blind_switch(blind, coin.amount as u64));
        input_keys.push(input_key);
    }

    // Offsets are fresh; the kernel keys absorb them.
    let kernel_offset = random_scalar(rng);
    let stealth_offset = random_scalar(rng);

    let excess =
        crate::pedersen::add_blinding_factors(&output_blinds, &input_blinds) - kernel_offset;
    let stealth_excess = crate::pedersen::add_blinding_factors(&sender_keys, &[])
        + crate::pedersen::add_blinding_factors(&input_keys, &[])
        - stealth_offset;

    let supply_change =
        pegin_amount as i128 - fee as i128 - pegout_total as i128;
    let excess_point = ProjectivePoint::mul_by_generator(&excess) + supply_term(supply_change);

    let mut kernel = Kernel {
        fee: (fee > 0).then_some(fee),
        pegin: pegin.filter(|amount| *amount > 0),
        pegouts: pegouts
            .iter()
            .map(|p| PegOutCoin {
                amount: p.amount,
                script_pubkey: p.script_pubkey.clone(),
            })
            .collect(),
        lock_height: None,
        stealth_excess: Some(PublicKey::from_point(&ProjectivePoint::mul_by_generator(
            &stealth_excess,
        ))),
        extra_data: Vec::new(),
        excess: Commitment::from_point(&excess_point),
        signature: Signature([0u8; 64]),
    };
    kernel.signature = Signature(schnorr::sign(&excess, &kernel.signature_message())?);

    Ok(Transaction {
        kernel_offset: kernel_offset.to_bytes().into(),
        stealth_offset: stealth_offset.to_bytes().into(),
        body: TxBody {
            inputs,
            outputs,
            kernels: vec![kernel],
        },
    })
}

/// Build a pegin: `amount` lands on the wallet's pegin address, the
/// kernel pegs in `amount + fee` from the canonical side.
pub fn build_pegin<K: KeyLookup, R: RngCore + CryptoRng>(
    keychain: &K,
    amount: u64,
    fee: u64,
    rng: &mut R,
) -> Result<Transaction> {
    let pegin = amount
        .checked_add(fee)
        .ok_or(MwebError::Build(BuildError::ValueOutOfRange))?;
    let recipient = Recipient {
        amount,
        address: keychain.stealth_address(PEGIN_INDEX),
    };
    build_transaction(keychain, &[], &[recipient], &[], Some(pegin), fee, rng)
}

/// `supply·H` with the sign of the supply change.
pub(crate) fn supply_term(supply_change: i128) -> ProjectivePoint {
    let magnitude = supply_change.unsigned_abs();
    let h = generator_h();
    let term = h * Scalar::from((magnitude >> 64) as u64) * two_pow_64()
        + h * Scalar::from(magnitude as u64);
    if supply_change >= 0 {
        term
    } else {
        -term
    }
}

fn two_pow_64() -> Scalar {
    Scalar::from(u64::MAX) + Scalar::ONE
}
