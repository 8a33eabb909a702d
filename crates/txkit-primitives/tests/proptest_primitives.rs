use proptest::prelude::*;

use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::{PrivateKey, PublicKey, Signature};
use txkit_primitives::hash::sha256d;
use txkit_primitives::util::{read_varint, read_varstring, write_varint, write_varstring};
use txkit_primitives::Network;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wif_keeps_key_compression_and_network(
        seed in prop::array::uniform32(any::<u8>()),
        compressed in any::<bool>(),
        testnet in any::<bool>(),
    ) {
        // Not every 32-byte array is a valid scalar.
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let pk = pk.with_compression(compressed);
            let network = if testnet { Network::Testnet } else { Network::Bitcoin };
            let (decoded, decoded_network) = PrivateKey::decode_wif(&pk.to_wif(network)).unwrap();
            prop_assert_eq!(&decoded, &pk);
            prop_assert_eq!(decoded_network, network);
            prop_assert_eq!(decoded.pub_key().to_bytes(), pk.pub_key().to_bytes());
        }
    }

    #[test]
    fn signatures_verify_and_survive_der(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let hash = sha256d(&msg);
            let sig = pk.sign(&hash).unwrap();
            prop_assert!(sig.is_low_s());
            let parsed = Signature::from_der(&sig.to_der()).unwrap();
            prop_assert_eq!(&parsed, &sig);
            let pub_key = PublicKey::from_bytes(&pk.pub_key().to_bytes()).unwrap();
            prop_assert!(pub_key.verify(&hash, &parsed));
        }
    }

    #[test]
    fn varint_decodes_what_it_encodes(value in any::<u64>(), prefix in prop::collection::vec(any::<u8>(), 0..4)) {
        let mut data = prefix.clone();
        data.extend_from_slice(&write_varint(value));
        let (decoded, next) = read_varint(&data, prefix.len()).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(next, data.len());
    }

    #[test]
    fn varstring_decodes_what_it_encodes(body in prop::collection::vec(any::<u8>(), 0..600)) {
        let encoded = write_varstring(&body);
        let (decoded, next) = read_varstring(&encoded, 0).unwrap();
        prop_assert_eq!(decoded, body);
        prop_assert_eq!(next, encoded.len());
    }

    #[test]
    fn hash_display_parses_back(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        let parsed = Hash::from_hex(&hash.to_string()).unwrap();
        prop_assert_eq!(parsed, hash);
    }
}
