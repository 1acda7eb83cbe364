// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_encoding::RawBytes;
use serde::Serialize;

/// Encodes `obj` with the canonical `dag-cbor` encoding used for message
/// parameters and actor constructor payloads.
pub fn dump_object<T: Serialize + ?Sized>(obj: &T) -> Result<RawBytes, fvm_ipld_encoding::Error> {
    fvm_ipld_encoding::to_vec(obj).map(RawBytes::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_ipld_encoding::tuple::*;

    #[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Debug)]
    struct Payload {
        a: u64,
        b: String,
    }

    #[test]
    fn dump_object_is_deterministic() {
        let p = Payload {
            a: 7,
            b: "seven".into(),
        };
        let first = dump_object(&p).unwrap();
        assert_eq!(first, dump_object(&p).unwrap());
        assert_eq!(first.deserialize::<Payload>().unwrap(), p);
    }

    #[test]
    fn unit_params_encode_to_cbor_null() {
        assert_eq!(dump_object(&()).unwrap().bytes(), &[0xf6]);
    }
}
