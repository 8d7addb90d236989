// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use dpos_hash::Hash;
use dpos_serialization::{DeserializeError, Deserializer};
use serial_test::serial;
use std::str::FromStr;

#[test]
#[serial]
fn test_sign_and_verify() {
    let keypair = KeyPair::from_passphrase("robust swarm tell").unwrap();
    let hash = Hash::compute_from(b"SomeData");
    let signature = keypair.sign(&hash).unwrap();
    keypair
        .get_public_key()
        .verify_signature(&hash, &signature)
        .unwrap();

    let other = Hash::compute_from(b"OtherData");
    assert!(keypair
        .get_public_key()
        .verify_signature(&other, &signature)
        .is_err());
}

#[test]
#[serial]
fn test_signing_is_deterministic() {
    let keypair = KeyPair::from_passphrase("robust swarm tell").unwrap();
    let hash = Hash::compute_from(b"SomeData");
    assert_eq!(keypair.sign(&hash).unwrap(), keypair.sign(&hash).unwrap());
}

#[test]
#[serial]
fn test_wrong_key_rejected() {
    let keypair = KeyPair::generate();
    let intruder = KeyPair::generate();
    let hash = Hash::compute_from(b"SomeData");
    let signature = intruder.sign(&hash).unwrap();
    assert!(keypair
        .get_public_key()
        .verify_signature(&hash, &signature)
        .is_err());
}

#[test]
#[serial]
fn test_public_key_text_form() {
    let public_key = KeyPair::generate().get_public_key();
    let text = public_key.to_string();
    assert_eq!(text.len(), 2 * PUBLIC_KEY_SIZE_BYTES);
    assert_eq!(PublicKey::from_str(&text).unwrap(), public_key);
    assert!(PublicKey::from_str("02ff").is_err());
}

#[test]
#[serial]
fn test_signature_length_is_self_describing() {
    let keypair = KeyPair::generate();
    let first = keypair.sign(&Hash::compute_from(b"first")).unwrap();
    let second = keypair.sign(&Hash::compute_from(b"second")).unwrap();
    let mut buffer = first.to_bytes().to_vec();
    buffer.extend(second.to_bytes());
    buffer.push(0xAA);

    let deserializer = SignatureDeserializer::new();
    let (rest, parsed_first) = deserializer
        .deserialize::<DeserializeError>(&buffer)
        .unwrap();
    let (rest, parsed_second) = deserializer.deserialize::<DeserializeError>(rest).unwrap();
    assert_eq!(parsed_first, first);
    assert_eq!(parsed_second, second);
    assert_eq!(rest, &[0xAA]);
}

#[test]
#[serial]
fn test_signature_serde() {
    let keypair = KeyPair::generate();
    let signature = keypair.sign(&Hash::compute_from(b"data")).unwrap();
    let serialized = serde_json::to_string(&signature).unwrap();
    let deserialized: Signature = serde_json::from_str(&serialized).unwrap();
    assert_eq!(signature, deserialized);
}
