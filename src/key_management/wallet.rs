// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::str::FromStr as _;

use ahash::{HashMap, HashMapExt as _};
use itertools::Itertools as _;
use rand::SeedableRng as _;
use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use super::{Error, KeyInfo, KeyProvider, KeyStore, wallet_helpers};
use crate::shim::{
    address::Address,
    crypto::{Signature, SignatureType},
};

const DEFAULT_KEY_NAME: &str = "default";

fn wallet_key_name(addr: &Address) -> String {
    format!("wallet-{addr}")
}

/// A key, this contains a `KeyInfo`, an address, and a public key.
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Key {
    pub key_info: KeyInfo,
    pub public_key: Vec<u8>,
    pub address: Address,
}

impl TryFrom<KeyInfo> for Key {
    type Error = Error;

    fn try_from(key_info: KeyInfo) -> Result<Self, Self::Error> {
        let public_key = wallet_helpers::to_public(key_info.key_type(), key_info.private_key())?;
        let address = wallet_helpers::new_address(key_info.key_type(), &public_key)?;
        Ok(Key {
            key_info,
            public_key,
            address,
        })
    }
}

/// A wallet is a collection of private keys with optional persistence and
/// optional encryption.
#[derive(Clone, Debug)]
pub struct Wallet {
    keys: HashMap<Address, Key>,
    keystore: KeyStore,
    rng: ChaCha20Rng,
}

impl Wallet {
    /// Creates a wallet drawing key material from OS randomness.
    pub fn new(keystore: KeyStore) -> Result<Self, Error> {
        let rng = ChaCha20Rng::from_rng(OsRng).map_err(|e| Error::Generation(e.to_string()))?;
        Ok(Wallet {
            keys: HashMap::new(),
            keystore,
            rng,
        })
    }

    /// Creates a wallet whose generated keys are fully determined by `seed`.
    pub fn new_seeded(keystore: KeyStore, seed: u64) -> Self {
        Wallet {
            keys: HashMap::new(),
            keystore,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Return the key that is resolved by a given address. If this key is
    /// not cached in the wallet it is loaded from the keystore.
    pub fn find_key(&mut self, addr: &Address) -> Result<Option<Key>, Error> {
        if let Some(k) = self.keys.get(addr) {
            return Ok(Some(k.clone()));
        }
        let key_info = match self.keystore.get(&wallet_key_name(addr)) {
            Ok(k) => k.clone(),
            Err(_) => return Ok(None),
        };
        let new_key = Key::try_from(key_info)?;
        self.keys.insert(*addr, new_key.clone());
        Ok(Some(new_key))
    }

    /// Sign a message with the key associated with the given address.
    pub fn sign(&mut self, addr: &Address, msg: &[u8]) -> Result<Signature, Error> {
        let key = self.find_key(addr)?.ok_or(Error::KeyNotExists)?;
        wallet_helpers::sign(key.key_info.key_type(), key.key_info.private_key(), msg)
    }

    /// Return the `KeyInfo` for a given address
    pub fn export(&mut self, addr: &Address) -> Result<KeyInfo, Error> {
        let k = self.find_key(addr)?.ok_or(Error::KeyNotExists)?;
        Ok(k.key_info)
    }

    /// Add `KeyInfo` to the wallet, return the address that resolves to this
    /// newly added `KeyInfo`
    pub fn import(&mut self, key_info: KeyInfo) -> Result<Address, Error> {
        let k = Key::try_from(key_info)?;
        self.keystore
            .put(wallet_key_name(&k.address), k.key_info.clone())?;
        let address = k.address;
        self.keys.insert(address, k);
        Ok(address)
    }

    /// Return a sorted list of all addresses held by the wallet.
    pub fn list_addrs(&self) -> Result<Vec<Address>, Error> {
        let addrs = self
            .keystore
            .list()
            .into_iter()
            .filter_map(|name| name.strip_prefix("wallet-").map(str::to_owned))
            .map(|name| Address::from_str(&name).map_err(|err| Error::Other(err.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(addrs.into_iter().sorted_by_key(|a| a.to_bytes()).collect())
    }

    /// Return the address of the default key.
    pub fn get_default(&self) -> Result<Address, Error> {
        let key_info = self.keystore.get(DEFAULT_KEY_NAME)?;
        Ok(Key::try_from(key_info.clone())?.address)
    }

    /// Set a default `KeyInfo` to the wallet
    pub fn set_default(&mut self, addr: &Address) -> Result<(), Error> {
        let key_info = self.keystore.get(&wallet_key_name(addr))?.clone();
        // Absent when no key was generated yet.
        let _ = self.keystore.remove(DEFAULT_KEY_NAME);
        self.keystore.put(DEFAULT_KEY_NAME.to_owned(), key_info)
    }

    /// Generate a new address that fits the requirement of the given
    /// `SignatureType`. The first key generated becomes the default.
    pub fn generate_addr(&mut self, typ: SignatureType) -> Result<Address, Error> {
        let private_key = wallet_helpers::generate(typ, &mut self.rng)?;
        let key = Key::try_from(KeyInfo::new(typ, private_key))?;
        self.keystore
            .put(wallet_key_name(&key.address), key.key_info.clone())?;
        if self.keystore.get(DEFAULT_KEY_NAME).is_err() {
            self.keystore
                .put(DEFAULT_KEY_NAME.to_owned(), key.key_info.clone())?;
        }
        let address = key.address;
        self.keys.insert(address, key);
        debug!(%address, key_type = %typ, "generated wallet key");
        Ok(address)
    }

    /// Return whether the wallet holds a key for the given address.
    pub fn has_key(&mut self, addr: &Address) -> bool {
        matches!(self.find_key(addr), Ok(Some(_)))
    }
}

impl KeyProvider for Wallet {
    fn generate_key(&mut self, typ: SignatureType) -> Result<Address, Error> {
        self.generate_addr(typ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_tracks_default_and_listing() {
        let mut wallet = Wallet::new_seeded(KeyStore::default(), 7);
        let a = wallet.generate_addr(SignatureType::Secp256k1).unwrap();
        let b = wallet.generate_addr(SignatureType::Bls).unwrap();
        assert_ne!(a, b);
        assert_eq!(wallet.get_default().unwrap(), a);
        assert!(wallet.has_key(&b));
        assert!(!wallet.has_key(&Address::new_id(5)));

        let mut listed = vec![a, b];
        listed.sort_by_key(|a| a.to_bytes());
        assert_eq!(wallet.list_addrs().unwrap(), listed);

        wallet.set_default(&b).unwrap();
        assert_eq!(wallet.get_default().unwrap(), b);
    }

    #[test]
    fn seeded_wallets_are_reproducible() {
        let mut w1 = Wallet::new_seeded(KeyStore::default(), 42);
        let mut w2 = Wallet::new_seeded(KeyStore::default(), 42);
        for _ in 0..3 {
            assert_eq!(
                w1.generate_key(SignatureType::Secp256k1).unwrap(),
                w2.generate_key(SignatureType::Secp256k1).unwrap()
            );
        }
    }

    #[test]
    fn export_import_roundtrip() {
        let mut w1 = Wallet::new(KeyStore::default()).unwrap();
        let addr = w1.generate_addr(SignatureType::Bls).unwrap();
        let info = w1.export(&addr).unwrap();

        let mut w2 = Wallet::new_seeded(KeyStore::default(), 0);
        assert_eq!(w2.import(info.clone()).unwrap(), addr);
        assert!(matches!(w2.import(info), Err(Error::KeyExists)));
        let sig = w2.sign(&addr, b"payload").unwrap();
        assert_eq!(sig.signature_type(), SignatureType::Bls);
        assert!(matches!(
            w2.sign(&Address::new_id(1), b"payload"),
            Err(Error::KeyNotExists)
        ));
    }
}
