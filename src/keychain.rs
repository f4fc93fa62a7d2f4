//! Wallet key tree and output rewinding.
//!
//! Keys derive from a BIP32 seed along `m/0'/100'`: child 0' is the scan
//! key `a`, child 1' the spend master `b0`. Per-index spend keys tweak the
//! master by `mi = Blake3_A(index ‖ a)`, so the compressed spend pubkeys
//! form a lookup table the scanner can match one-time outputs against.

use std::collections::HashMap;
use std::sync::Mutex;

use hmac::{Hmac, Mac};
use k256::{elliptic_curve::ops::MulByGenerator, ProjectivePoint, Scalar};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::curve::{scalar_invert, scalar_reduce, serialize_pubkey};
use crate::hasher::{hashed_tag, HashTag, Hasher};
use crate::models::Output;
use crate::pedersen::{blind_switch, commit};
use crate::stealth::{send_key, Coin, OutputMask, StealthAddress};

/// Change outputs pay this pseudo-index.
pub const CHANGE_INDEX: u32 = u32::MAX;
/// Pegin outputs pay this pseudo-index.
pub const PEGIN_INDEX: u32 = u32::MAX - 1;
/// Marker for outputs recognized without a known index.
pub const UNKNOWN_INDEX: u32 = u32::MAX - 2;
/// Marker for outputs received on an imported custom key.
pub const CUSTOM_KEY: u32 = u32::MAX - 3;

/// Receive-address indices pre-populated in the lookup table.
const DEFAULT_ADDRESS_COUNT: u32 = 100;

type HmacSha512 = Hmac<Sha512>;

fn hmac512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// One hardened BIP32 derivation step.
fn derive_hardened(key: &Scalar, chain_code: &[u8; 32], index: u32) -> (Scalar, [u8; 32]) {
    let hardened = 0x8000_0000u32 | index;
    let key_bytes: [u8; 32] = key.to_bytes().into();
    let mut data = hmac512(chain_code, &[&[0u8], &key_bytes, &hardened.to_be_bytes()]);
    let il: [u8; 32] = data[..32].try_into().expect("hmac half");
    let mut cc = [0u8; 32];
    cc.copy_from_slice(&data[32..]);
    let child = scalar_reduce(&il) + key;
    data.zeroize();
    (child, cc)
}

/// The wallet's resident key material plus the spend-pubkey lookup table.
pub struct KeyChain {
    scan_key: Scalar,
    spend_key: Scalar,
    spend_pubkey: ProjectivePoint,
    index_by_pubkey: Mutex<HashMap<[u8; 33], u32>>,
}

/// The subset of the keychain a wallet needs: addresses and rewinding.
pub trait KeyLookup {
    /// The stealth address at `index`.
    fn stealth_address(&self, index: u32) -> StealthAddress;
    /// Attempt to recognize and open an output. `None` means not ours.
    fn rewind_output(&self, output: &Output) -> Option<Coin>;
    /// The private scan scalar `a`.
    fn private_scan_key(&self) -> &Scalar;
}

impl KeyChain {
    /// Derive the key tree from a BIP32 seed.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut master = hmac512(b"Bitcoin seed", &[seed]);
        let il: [u8; 32] = master[..32].try_into().expect("hmac half");
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&master[32..]);
        let mut key = scalar_reduce(&il);
        master.zeroize();

        // m/0'/100'
        let (account_key, account_cc) = derive_hardened(&key, &chain_code, 0);
        let (mweb_key, mweb_cc) = derive_hardened(&account_key, &account_cc, 100);
        // m/0'/100'/0' = scan, m/0'/100'/1' = spend
        let (scan_key, _) = derive_hardened(&mweb_key, &mweb_cc, 0);
        let (spend_key, _) = derive_hardened(&mweb_key, &mweb_cc, 1);
        key.zeroize();

        let keychain = Self {
            scan_key,
            spend_key,
            spend_pubkey: ProjectivePoint::mul_by_generator(&spend_key),
            index_by_pubkey: Mutex::new(HashMap::new()),
        };
        keychain.ensure_indexed(DEFAULT_ADDRESS_COUNT);
        keychain
    }

    /// The per-index key tweak `mi = Blake3_A(index ‖ a)`.
    fn address_tweak(scan_key: &Scalar, index: u32) -> Scalar {
        let hash = Hasher::with_tag(HashTag::Address)
            .append_u32_le(index)
            .append(&scan_key.to_bytes())
            .finalize();
        scalar_reduce(&hash)
    }

    /// The spend pubkey `Bi = B0 + mi·G`.
    pub fn spend_pubkey(&self, index: u32) -> ProjectivePoint {
        let tweak = Self::address_tweak(&self.scan_key, index);
        self.spend_pubkey + ProjectivePoint::mul_by_generator(&tweak)
    }

    /// The spend secret `bi = b0 + mi`.
    pub fn spend_secret(&self, index: u32) -> Scalar {
        self.spend_key + Self::address_tweak(&self.scan_key, index)
    }

    /// Extend the lookup table through `max_index`, plus the reserved
    /// pseudo-indices. Insert-only; nothing is ever evicted.
    pub fn ensure_indexed(&self, max_index: u32) {
        let mut map = self.index_by_pubkey.lock().expect("spend pubkey table");
        for index in (0..=max_index).chain([CHANGE_INDEX, PEGIN_INDEX]) {
            let tweak = Self::address_tweak(&self.scan_key, index);
            let pubkey =
                serialize_pubkey(&(self.spend_pubkey + ProjectivePoint::mul_by_generator(&tweak)));
            map.entry(pubkey).or_insert(index);
        }
    }

    /// A view-only keychain sharing the scan key and pubkey table but not
    /// the spend key.
    pub fn to_view(&self) -> ViewKeyChain {
        ViewKeyChain {
            scan_key: self.scan_key,
            spend_pubkey: self.spend_pubkey,
            index_by_pubkey: Mutex::new(
                self.index_by_pubkey
                    .lock()
                    .expect("spend pubkey table")
                    .clone(),
            ),
        }
    }
}

impl KeyLookup for KeyChain {
    fn stealth_address(&self, index: u32) -> StealthAddress {
        StealthAddress::from_spend_pubkey(&self.scan_key, &self.spend_pubkey(index))
    }

    fn rewind_output(&self, output: &Output) -> Option<Coin> {
        let map = self.index_by_pubkey.lock().expect("spend pubkey table");
        rewind_with_keys(&self.scan_key, Some(&self.spend_key), &map, output)
    }

    fn private_scan_key(&self) -> &Scalar {
        &self.scan_key
    }
}

impl Drop for KeyChain {
    fn drop(&mut self) {
        self.scan_key.zeroize();
        self.spend_key.zeroize();
    }
}

/// A keychain holding only scan material: recognizes and decrypts owned
/// outputs but cannot produce spend keys.
pub struct ViewKeyChain {
    scan_key: Scalar,
    spend_pubkey: ProjectivePoint,
    index_by_pubkey: Mutex<HashMap<[u8; 33], u32>>,
}

impl ViewKeyChain {
    /// Build from the scan secret and the spend master pubkey.
    pub fn new(scan_key: Scalar, spend_pubkey: ProjectivePoint, max_index: u32) -> Self {
        let chain = Self {
            scan_key,
            spend_pubkey,
            index_by_pubkey: Mutex::new(HashMap::new()),
        };
        {
            let mut map = chain.index_by_pubkey.lock().expect("spend pubkey table");
            for index in (0..=max_index).chain([CHANGE_INDEX, PEGIN_INDEX]) {
                let tweak = KeyChain::address_tweak(&chain.scan_key, index);
                let pubkey = serialize_pubkey(
                    &(chain.spend_pubkey + ProjectivePoint::mul_by_generator(&tweak)),
                );
                map.entry(pubkey).or_insert(index);
            }
        }
        chain
    }
}

impl KeyLookup for ViewKeyChain {
    fn stealth_address(&self, index: u32) -> StealthAddress {
        let tweak = KeyChain::address_tweak(&self.scan_key, index);
        let spend = self.spend_pubkey + ProjectivePoint::mul_by_generator(&tweak);
        StealthAddress::from_spend_pubkey(&self.scan_key, &spend)
    }

    fn rewind_output(&self, output: &Output) -> Option<Coin> {
        let map = self.index_by_pubkey.lock().expect("spend pubkey table");
        rewind_with_keys(&self.scan_key, None, &map, output)
    }

    fn private_scan_key(&self) -> &Scalar {
        &self.scan_key
    }
}

impl Drop for ViewKeyChain {
    fn drop(&mut self) {
        self.scan_key.zeroize();
    }
}

/// The shared rewind path. Every mismatch is a silent skip: scanning
/// touches mostly foreign outputs and must not raise.
fn rewind_with_keys(
    scan_key: &Scalar,
    spend_master: Option<&Scalar>,
    index_by_pubkey: &HashMap<[u8; 33], u32>,
    output: &Output,
) -> Option<Coin> {
    let fields = output.message.standard.as_ref()?;

    // Cheap filter: one ECDH mul and a single-byte tag compare.
    let ke = fields.key_exchange_pubkey.to_point().ok()?;
    let shared_raw = serialize_pubkey(&(ke * *scan_key));
    if hashed_tag(HashTag::Tag, &shared_raw)[0] != fields.view_tag {
        return None;
    }

    let shared_secret = hashed_tag(HashTag::Derive, &shared_raw);

    // Recover Bi = T⁻¹·Ko and look it up.
    let out_tweak = scalar_reduce(&hashed_tag(HashTag::OutKey, &shared_secret));
    let out_tweak_inv = scalar_invert(&out_tweak).ok()?;
    let receiver_point = output.receiver_pubkey.to_point().ok()?;
    let spend_point = receiver_point * out_tweak_inv;
    let address_index = *index_by_pubkey.get(&serialize_pubkey(&spend_point))?;

    // Open value and nonce, then re-derive the commitment.
    let mask = OutputMask::from_shared_secret(&shared_secret);
    let value = fields.masked_value ^ mask.value_mask;
    let mut nonce = [0u8; 16];
    for (i, byte) in nonce.iter_mut().enumerate() {
        *byte = fields.masked_nonce[i] ^ mask.nonce_mask[i];
    }
    let switched_blind = blind_switch(&mask.blind, value);
    if commit(value, &switched_blind) != output.commitment.to_point().ok()? {
        return None;
    }

    // Authenticate the key exchange leg.
    let address = StealthAddress::from_spend_pubkey(scan_key, &spend_point);
    let s = send_key(&address.scan_pubkey, &address.spend_pubkey, value, &nonce);
    if spend_point * s != ke {
        return None;
    }

    let spend_key = spend_master.map(|b0| {
        (KeyChain::address_tweak(scan_key, address_index) + b0) * out_tweak
    });

    Some(Coin {
        address_index,
        blind: Some(mask.blind),
        amount: value as i64,
        output_id: output.id(),
        address: Some(address),
        shared_secret: Some(shared_secret),
        spend_key,
        sender_key: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stealth::create_output;

    #[test]
    fn test_keychain_deterministic() {
        let a = KeyChain::from_seed(&[0u8; 32]);
        let b = KeyChain::from_seed(&[0u8; 32]);
        assert_eq!(a.stealth_address(0), b.stealth_address(0));
        assert_eq!(a.stealth_address(5), b.stealth_address(5));
        let c = KeyChain::from_seed(&[1u8; 32]);
        assert_ne!(a.stealth_address(0), c.stealth_address(0));
    }

    #[test]
    fn test_spend_secret_matches_pubkey() {
        let keychain = KeyChain::from_seed(b"test seed");
        for index in [0u32, 1, 9, PEGIN_INDEX, CHANGE_INDEX] {
            let secret = keychain.spend_secret(index);
            assert_eq!(
                ProjectivePoint::mul_by_generator(&secret),
                keychain.spend_pubkey(index)
            );
        }
    }

    #[test]
    fn test_addresses_unlinkable_across_indices() {
        let keychain = KeyChain::from_seed(&[7u8; 32]);
        assert_ne!(keychain.stealth_address(0), keychain.stealth_address(1));
        assert_ne!(
            keychain.stealth_address(0),
            keychain.stealth_address(CHANGE_INDEX)
        );
    }

    #[test]
    fn test_rewind_own_output() {
        let keychain = KeyChain::from_seed(&[3u8; 32]);
        let address = keychain.stealth_address(4);
        let (output, _) =
            create_output(&Scalar::from(42u64), &[9u8; 16], 77_777, &address).unwrap();

        let coin = keychain.rewind_output(&output).expect("own output");
        assert_eq!(coin.address_index, 4);
        assert_eq!(coin.amount, 77_777);
        assert_eq!(coin.output_id, output.id());

        // The recovered spend key controls the one-time output key.
        let spend_key = coin.spend_key.unwrap();
        assert_eq!(
            ProjectivePoint::mul_by_generator(&spend_key),
            output.receiver_pubkey.to_point().unwrap()
        );
    }

    #[test]
    fn test_rewind_rejects_foreign_output() {
        let keychain = KeyChain::from_seed(&[3u8; 32]);
        let other = KeyChain::from_seed(&[4u8; 32]);
        let (output, _) =
            create_output(&Scalar::from(42u64), &[9u8; 16], 1000, &other.stealth_address(0))
                .unwrap();
        assert!(keychain.rewind_output(&output).is_none());
    }

    #[test]
    fn test_rewind_is_pure() {
        let keychain = KeyChain::from_seed(&[5u8; 32]);
        let (output, _) = create_output(
            &Scalar::from(1u64),
            &[1u8; 16],
            500,
            &keychain.stealth_address(0),
        )
        .unwrap();
        let c1 = keychain.rewind_output(&output).unwrap();
        let c2 = keychain.rewind_output(&output).unwrap();
        assert_eq!(c1.address_index, c2.address_index);
        assert_eq!(c1.amount, c2.amount);
        assert_eq!(c1.blind.as_ref().unwrap(), c2.blind.as_ref().unwrap());
        assert_eq!(c1.spend_key.as_ref().unwrap(), c2.spend_key.as_ref().unwrap());
    }

    #[test]
    fn test_view_keychain_rewinds_without_spend_key() {
        let keychain = KeyChain::from_seed(&[6u8; 32]);
        let view = keychain.to_view();
        let (output, _) = create_output(
            &Scalar::from(2u64),
            &[2u8; 16],
            900,
            &keychain.stealth_address(1),
        )
        .unwrap();

        let coin = view.rewind_output(&output).expect("view key sees it");
        assert_eq!(coin.address_index, 1);
        assert_eq!(coin.amount, 900);
        assert!(coin.spend_key.is_none());
        assert!(coin.blind.is_some());
    }

    #[test]
    fn test_view_keychain_same_addresses() {
        let keychain = KeyChain::from_seed(&[8u8; 32]);
        let view = ViewKeyChain::new(
            *keychain.private_scan_key(),
            ProjectivePoint::mul_by_generator(&keychain.spend_secret(0))
                - ProjectivePoint::mul_by_generator(
                    &KeyChain::address_tweak(keychain.private_scan_key(), 0),
                ),
            10,
        );
        assert_eq!(keychain.stealth_address(3), view.stealth_address(3));
    }
}
