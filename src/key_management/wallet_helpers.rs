// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use bls_signatures::{PrivateKey as BlsPrivate, Serialize as _};
use k256::ecdsa::SigningKey;
use rand::{CryptoRng, RngCore};

use super::errors::Error;
use crate::shim::{
    address::Address,
    crypto::{Signature, SignatureType},
};

/// Return the public key for a given private key and `SignatureType`
pub fn to_public(sig_type: SignatureType, private_key: &[u8]) -> Result<Vec<u8>, Error> {
    match sig_type {
        SignatureType::Bls => Ok(BlsPrivate::from_bytes(private_key)
            .map_err(|err| Error::Other(err.to_string()))?
            .public_key()
            .as_bytes()),
        SignatureType::Secp256k1 => {
            let private_key = SigningKey::from_slice(private_key)
                .map_err(|err| Error::Other(err.to_string()))?;
            let public_key = private_key.verifying_key().to_encoded_point(false);
            Ok(public_key.as_bytes().to_vec())
        }
    }
}

/// Return a new Address that is of a given `SignatureType` and uses the
/// supplied public key
pub fn new_address(sig_type: SignatureType, public_key: &[u8]) -> Result<Address, Error> {
    match sig_type {
        SignatureType::Bls => {
            Address::new_bls(public_key).map_err(|err| Error::Other(err.to_string()))
        }
        SignatureType::Secp256k1 => {
            Address::new_secp256k1(public_key).map_err(|err| Error::Other(err.to_string()))
        }
    }
}

/// Sign takes in `SignatureType`, private key and message. Returns a
/// Signature for that message
pub fn sign(sig_type: SignatureType, private_key: &[u8], msg: &[u8]) -> Result<Signature, Error> {
    match sig_type {
        SignatureType::Bls => {
            let priv_key =
                BlsPrivate::from_bytes(private_key).map_err(|err| Error::Other(err.to_string()))?;
            let sig = priv_key.sign(msg);
            Ok(Signature::new_bls(sig.as_bytes()))
        }
        SignatureType::Secp256k1 => {
            let priv_key = SigningKey::from_slice(private_key)
                .map_err(|err| Error::Other(err.to_string()))?;
            let msg_hash = blake2b_simd::Params::new().hash_length(32).hash(msg);
            let (sig, recovery_id) = priv_key
                .sign_prehash_recoverable(msg_hash.as_bytes())
                .map_err(|err| Error::Other(err.to_string()))?;
            let mut new_bytes = [0; 65];
            new_bytes[..64].copy_from_slice(&sig.to_bytes());
            new_bytes[64] = recovery_id.to_byte();
            Ok(Signature::new_secp256k1(new_bytes.to_vec()))
        }
    }
}

/// Generate a new private key
pub fn generate<R>(sig_type: SignatureType, rng: &mut R) -> Result<Vec<u8>, Error>
where
    R: RngCore + CryptoRng,
{
    match sig_type {
        SignatureType::Bls => Ok(BlsPrivate::generate(rng).as_bytes()),
        SignatureType::Secp256k1 => Ok(SigningKey::random(rng).to_bytes().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::address::{BLS_PUB_LEN, Protocol, SECP_PUB_LEN};
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    #[rstest]
    #[case(SignatureType::Secp256k1, SECP_PUB_LEN, Protocol::Secp256k1)]
    #[case(SignatureType::Bls, BLS_PUB_LEN, Protocol::BLS)]
    fn derives_address_from_public_key(
        #[case] sig_type: SignatureType,
        #[case] pub_len: usize,
        #[case] protocol: Protocol,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let private = generate(sig_type, &mut rng).unwrap();
        let public = to_public(sig_type, &private).unwrap();
        assert_eq!(public.len(), pub_len);
        let addr = new_address(sig_type, &public).unwrap();
        assert_eq!(addr.protocol(), protocol);
    }

    #[test]
    fn secp_signature_is_recoverable_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let private = generate(SignatureType::Secp256k1, &mut rng).unwrap();
        let sig = sign(SignatureType::Secp256k1, &private, b"harness").unwrap();
        assert_eq!(sig.signature_type(), SignatureType::Secp256k1);
        assert_eq!(sig.bytes().len(), 65);
    }

    #[test]
    fn bad_private_key_is_rejected() {
        assert!(to_public(SignatureType::Secp256k1, &[0u8; 3]).is_err());
        assert!(sign(SignatureType::Bls, &[0u8; 3], b"msg").is_err());
    }
}
