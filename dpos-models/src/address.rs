// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ModelsError;
use dpos_serialization::{fixed_bytes, Deserializer};
use dpos_signature::PublicKey;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use ripemd::{Digest, Ripemd160};
use std::str::FromStr;

/// Size of an address payload: version byte followed by ripemd160(public key)
pub const ADDRESS_SIZE_BYTES: usize = 21;

/// Derived from a public key: network version byte followed by ripemd160 of the compressed key.
/// Rendered in base58check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE_BYTES]);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).with_check().into_string())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Address {
    type Err = ModelsError;
    /// ## Example
    /// ```rust
    /// # use dpos_signature::KeyPair;
    /// # use std::str::FromStr;
    /// # use dpos_models::address::Address;
    /// let keypair = KeyPair::generate();
    /// let address = Address::from_public_key(&keypair.get_public_key(), 0x17);
    /// let res = Address::from_str(&address.to_string()).unwrap();
    /// assert_eq!(address, res);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|err| ModelsError::AddressParseError(format!("{}: {}", s, err)))?;
        let bytes: [u8; ADDRESS_SIZE_BYTES] = decoded.as_slice().try_into().map_err(|_| {
            ModelsError::AddressParseError(format!("{}: wrong payload length", s))
        })?;
        Ok(Address(bytes))
    }
}

impl Address {
    /// Computes the address associated with the given public key
    pub fn from_public_key(public_key: &PublicKey, version: u8) -> Self {
        let digest = Ripemd160::digest(public_key.to_bytes());
        let mut bytes = [0u8; ADDRESS_SIZE_BYTES];
        bytes[0] = version;
        bytes[1..].copy_from_slice(&digest);
        Address(bytes)
    }

    /// Rejects the versions 0x02 and 0x03: a requester public key starts with one of
    /// these bytes and is told apart from the recipient address by it
    pub fn check_version(version: u8) -> Result<(), ModelsError> {
        match version {
            0x02 | 0x03 => Err(ModelsError::ReservedAddressVersion(version)),
            _ => Ok(()),
        }
    }

    /// Network version byte
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    /// Raw payload
    pub fn to_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
        &self.0
    }

    /// Build from a raw payload
    pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Address {
        Address(*data)
    }
}

impl ::serde::Serialize for Address {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        Address::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Deserializer for the 21-byte recipient field, where all zeros means "no recipient"
#[derive(Default, Clone)]
pub struct RecipientDeserializer;

impl RecipientDeserializer {
    /// Creates a new deserializer for the recipient field
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Option<Address>> for RecipientDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Option<Address>, E> {
        context("Failed recipient deserialization", |input: &'a [u8]| {
            let (rest, bytes) = fixed_bytes::<ADDRESS_SIZE_BYTES, E>(input)?;
            if bytes.iter().all(|b| *b == 0) {
                Ok((rest, None))
            } else {
                Ok((rest, Some(Address(bytes))))
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_signature::KeyPair;

    #[test]
    fn test_key_prefixes_are_not_address_versions() {
        assert!(Address::check_version(0x17).is_ok());
        assert!(Address::check_version(0x00).is_ok());
        assert!(matches!(
            Address::check_version(0x02),
            Err(ModelsError::ReservedAddressVersion(0x02))
        ));
        assert!(Address::check_version(0x03).is_err());
    }

    #[test]
    fn test_checksum_is_checked() {
        let keypair = KeyPair::from_passphrase("address test").unwrap();
        let address = Address::from_public_key(&keypair.get_public_key(), 0x17);
        assert_eq!(address.version(), 0x17);
        let mut text = address.to_string();
        let last = text.pop().unwrap();
        text.push(if last == 'a' { 'b' } else { 'a' });
        assert!(Address::from_str(&text).is_err());
    }
}
