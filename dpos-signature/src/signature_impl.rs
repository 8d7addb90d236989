// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::DposSignatureError;
use dpos_hash::Hash;
use dpos_serialization::{fixed_bytes, Deserializer};
use nom::{
    error::{context, ContextError, ErrorKind, ParseError},
    IResult,
};
use std::str::FromStr;

/// Size of a compressed public key
pub const PUBLIC_KEY_SIZE_BYTES: usize = 33;
/// Size of a secret key
pub const SECRET_KEY_SIZE_BYTES: usize = 32;
/// Maximum size of a DER-encoded signature
pub const MAX_SIGNATURE_SIZE_BYTES: usize = 72;

const DER_SEQUENCE_TAG: u8 = 0x30;

/// `KeyPair` is used for signing
#[derive(Clone)]
pub struct KeyPair {
    secret: libsecp256k1::SecretKey,
    public: PublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "KeyPair({})", self.public)
    }
}

impl KeyPair {
    /// Generate a new random `KeyPair`
    ///
    /// # Example
    ///  ```
    /// # use dpos_signature::KeyPair;
    /// # use dpos_hash::Hash;
    /// let keypair = KeyPair::generate();
    /// let data = Hash::compute_from("Hello World!".as_bytes());
    /// let signature = keypair.sign(&data).unwrap();
    /// ```
    pub fn generate() -> KeyPair {
        let secret = libsecp256k1::SecretKey::random(&mut rand::thread_rng());
        KeyPair::from_secret(secret)
    }

    /// Derive a `KeyPair` from a passphrase: the secret key is the sha256 of the passphrase.
    ///
    /// # Example
    ///  ```
    /// # use dpos_signature::KeyPair;
    /// let a = KeyPair::from_passphrase("delegate secret").unwrap();
    /// let b = KeyPair::from_passphrase("delegate secret").unwrap();
    /// assert_eq!(a.get_public_key(), b.get_public_key());
    /// ```
    pub fn from_passphrase(passphrase: &str) -> Result<KeyPair, DposSignatureError> {
        KeyPair::from_secret_bytes(Hash::compute_from(passphrase.as_bytes()).to_bytes())
    }

    /// Build a `KeyPair` from raw secret key bytes
    pub fn from_secret_bytes(
        data: &[u8; SECRET_KEY_SIZE_BYTES],
    ) -> Result<KeyPair, DposSignatureError> {
        let secret = libsecp256k1::SecretKey::parse(data)
            .map_err(|err| DposSignatureError::ParsingError(format!("{:?}", err)))?;
        Ok(KeyPair::from_secret(secret))
    }

    fn from_secret(secret: libsecp256k1::SecretKey) -> KeyPair {
        let public =
            PublicKey(libsecp256k1::PublicKey::from_secret_key(&secret).serialize_compressed());
        KeyPair { secret, public }
    }

    /// Raw secret key bytes
    pub fn to_secret_bytes(&self) -> [u8; SECRET_KEY_SIZE_BYTES] {
        self.secret.serialize()
    }

    /// Public key of this keypair
    pub fn get_public_key(&self) -> PublicKey {
        self.public
    }

    /// Returns the DER signature produced by signing a hash with the secret key.
    pub fn sign(&self, hash: &Hash) -> Result<Signature, DposSignatureError> {
        let message = libsecp256k1::Message::parse(hash.to_bytes());
        let (signature, _recovery_id) = libsecp256k1::sign(&message, &self.secret);
        Ok(Signature(signature.serialize_der().as_ref().to_vec()))
    }
}

/// Compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE_BYTES]);

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PublicKey {
    type Err = DposSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; PUBLIC_KEY_SIZE_BYTES];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|err| DposSignatureError::ParsingError(format!("{}", err)))?;
        PublicKey::from_bytes(&bytes)
    }
}

impl PublicKey {
    /// Checks if the `Signature` associated with data bytes
    /// was produced with the `KeyPair` associated to this `PublicKey`
    ///
    /// # Example
    ///  ```
    /// # use dpos_signature::KeyPair;
    /// # use dpos_hash::Hash;
    /// let keypair = KeyPair::generate();
    /// let data = Hash::compute_from("Hello World!".as_bytes());
    /// let signature = keypair.sign(&data).unwrap();
    /// assert!(keypair.get_public_key().verify_signature(&data, &signature).is_ok());
    /// ```
    pub fn verify_signature(
        &self,
        hash: &Hash,
        signature: &Signature,
    ) -> Result<(), DposSignatureError> {
        let public = libsecp256k1::PublicKey::parse_compressed(&self.0)
            .map_err(|err| DposSignatureError::EngineError(format!("{:?}", err)))?;
        let mut parsed = libsecp256k1::Signature::parse_der(&signature.0)
            .map_err(|err| DposSignatureError::ParsingError(format!("{:?}", err)))?;
        parsed.normalize_s();
        let message = libsecp256k1::Message::parse(hash.to_bytes());
        if libsecp256k1::verify(&message, &parsed, &public) {
            Ok(())
        } else {
            Err(DposSignatureError::SignatureVerificationFailed(format!(
                "signature does not match public key {}",
                self
            )))
        }
    }

    /// Raw compressed bytes
    pub fn to_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE_BYTES] {
        &self.0
    }

    /// Parse compressed key bytes, checking that they encode a curve point
    pub fn from_bytes(
        data: &[u8; PUBLIC_KEY_SIZE_BYTES],
    ) -> Result<PublicKey, DposSignatureError> {
        libsecp256k1::PublicKey::parse_compressed(data)
            .map_err(|err| DposSignatureError::ParsingError(format!("{:?}", err)))?;
        Ok(PublicKey(*data))
    }
}

impl ::serde::Serialize for PublicKey {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        let s = String::deserialize(d)?;
        PublicKey::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Deserializer for `PublicKey`
#[derive(Default, Clone)]
pub struct PublicKeyDeserializer;

impl PublicKeyDeserializer {
    /// Creates a `PublicKeyDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<PublicKey> for PublicKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], PublicKey, E> {
        context("Failed public key deserialization", |input: &'a [u8]| {
            let (rest, bytes) = fixed_bytes::<PUBLIC_KEY_SIZE_BYTES, E>(input)?;
            let key = PublicKey::from_bytes(&bytes)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
            Ok((rest, key))
        })(buffer)
    }
}

/// DER-encoded ECDSA signature, kept byte-exact as received
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(Vec<u8>);

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for Signature {
    type Err = DposSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes =
            hex::decode(s).map_err(|err| DposSignatureError::ParsingError(format!("{}", err)))?;
        Signature::from_der(&bytes)
    }
}

impl Signature {
    /// Raw DER bytes
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse DER bytes. Strict DER is required so that the byte length is self-describing.
    pub fn from_der(data: &[u8]) -> Result<Signature, DposSignatureError> {
        if data.len() > MAX_SIGNATURE_SIZE_BYTES {
            return Err(DposSignatureError::ParsingError(format!(
                "signature is {} bytes long",
                data.len()
            )));
        }
        libsecp256k1::Signature::parse_der(data)
            .map_err(|err| DposSignatureError::ParsingError(format!("{:?}", err)))?;
        Ok(Signature(data.to_vec()))
    }
}

impl ::serde::Serialize for Signature {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for Signature {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Signature, D::Error> {
        let s = String::deserialize(d)?;
        Signature::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Deserializer for DER `Signature`: reads the sequence header to find the signature length.
#[derive(Default, Clone)]
pub struct SignatureDeserializer;

impl SignatureDeserializer {
    /// Creates a `SignatureDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Signature> for SignatureDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Signature, E> {
        context("Failed signature deserialization", |input: &'a [u8]| {
            if input.len() < 2 || input[0] != DER_SEQUENCE_TAG || input[1] >= 0x80 {
                return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag)));
            }
            let total = input[1] as usize + 2;
            if input.len() < total {
                return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof)));
            }
            let (bytes, rest) = input.split_at(total);
            let signature = Signature::from_der(bytes)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
            Ok((rest, signature))
        })(buffer)
    }
}
