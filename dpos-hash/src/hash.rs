// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::DposHashError;
use crate::settings::HASH_SIZE_BYTES;
use dpos_serialization::{fixed_bytes, Deserializer, SerializeError, Serializer};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// SHA-256 digest
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct Hash([u8; HASH_SIZE_BYTES]);

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Hash {
    /// Compute a hash from data.
    ///
    /// # Example
    ///  ```
    /// # use dpos_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// ```
    pub fn compute_from(data: &[u8]) -> Self {
        Hash(Sha256::digest(data).into())
    }

    /// Hash of the concatenation of several byte slices, without allocating the concatenation.
    pub fn compute_from_tuple(data: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for chunk in data {
            hasher.update(chunk);
        }
        Hash(hasher.finalize().into())
    }

    /// Lowercase hexadecimal rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hexadecimal string
    ///
    /// # Example
    ///  ```
    /// # use dpos_hash::Hash;
    /// let hash = Hash::compute_from(&"hello world".as_bytes());
    /// let parsed = Hash::from_hex(&hash.to_hex()).unwrap();
    /// assert_eq!(hash, parsed);
    /// ```
    pub fn from_hex(data: &str) -> Result<Hash, DposHashError> {
        let mut bytes = [0u8; HASH_SIZE_BYTES];
        hex::decode_to_slice(data, &mut bytes)
            .map_err(|err| DposHashError::ParsingError(format!("{}", err)))?;
        Ok(Hash(bytes))
    }

    /// Borrow the raw digest bytes.
    pub fn to_bytes(&self) -> &[u8; HASH_SIZE_BYTES] {
        &self.0
    }

    /// Convert into the raw digest bytes.
    pub fn into_bytes(self) -> [u8; HASH_SIZE_BYTES] {
        self.0
    }

    /// Build a hash from its raw digest bytes.
    pub fn from_bytes(data: &[u8; HASH_SIZE_BYTES]) -> Hash {
        Hash(*data)
    }
}

impl FromStr for Hash {
    type Err = DposHashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl ::serde::Serialize for Hash {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_hex())
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Hash {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Hash::from_hex(&s).map_err(::serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(d)?;
            let array: [u8; HASH_SIZE_BYTES] = bytes
                .as_slice()
                .try_into()
                .map_err(::serde::de::Error::custom)?;
            Ok(Hash::from_bytes(&array))
        }
    }
}

/// Serializer for `Hash`
#[derive(Default, Clone)]
pub struct HashSerializer;

impl HashSerializer {
    /// Creates a serializer for `Hash`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Hash> for HashSerializer {
    fn serialize(&self, value: &Hash, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Hash`
#[derive(Default, Clone)]
pub struct HashDeserializer;

impl HashDeserializer {
    /// Creates a deserializer for `Hash`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Hash> for HashDeserializer {
    /// ```
    /// use dpos_serialization::{Serializer, Deserializer, DeserializeError};
    /// use dpos_hash::{Hash, HashDeserializer, HashSerializer};
    ///
    /// let hash = Hash::compute_from("hello world".as_bytes());
    /// let mut serialized = Vec::new();
    /// HashSerializer::new().serialize(&hash, &mut serialized).unwrap();
    /// let (rest, deserialized) = HashDeserializer::new().deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(deserialized, hash);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Hash, E> {
        context("Failed hash deserialization", |input: &'a [u8]| {
            let (rest, bytes) = fixed_bytes::<HASH_SIZE_BYTES, E>(input)?;
            Ok((rest, Hash::from_bytes(&bytes)))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn example() -> Hash {
        Hash::compute_from("hello world".as_bytes())
    }

    #[test]
    #[serial]
    fn test_serde_json() {
        let hash = example();
        let serialized = serde_json::to_string(&hash).unwrap();
        let deserialized = serde_json::from_str(&serialized).unwrap();
        assert_eq!(hash, deserialized)
    }

    #[test]
    #[serial]
    fn test_hash() {
        let data = "abc".as_bytes();
        let hash = Hash::compute_from(data);
        let hash_ref: [u8; HASH_SIZE_BYTES] = [
            186, 120, 22, 191, 143, 1, 207, 234, 65, 65, 64, 222, 93, 174, 34, 35, 176, 3, 97, 163,
            150, 23, 122, 156, 180, 16, 255, 97, 242, 0, 21, 173,
        ];
        assert_eq!(hash.to_bytes(), &hash_ref);
        assert_eq!(
            hash.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    #[serial]
    fn test_tuple_matches_concatenation() {
        let joined = Hash::compute_from(b"helloworld");
        let tuple = Hash::compute_from_tuple(&[b"hello", b"world"]);
        assert_eq!(joined, tuple);
    }
}
