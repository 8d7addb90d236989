// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Signature management over secp256k1: compressed public keys and DER-encoded ECDSA signatures.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]
mod error;
mod signature_impl;

pub use error::DposSignatureError;
pub use signature_impl::{
    KeyPair, PublicKey, PublicKeyDeserializer, Signature, SignatureDeserializer,
    MAX_SIGNATURE_SIZE_BYTES, PUBLIC_KEY_SIZE_BYTES, SECRET_KEY_SIZE_BYTES,
};

#[cfg(test)]
mod tests;
