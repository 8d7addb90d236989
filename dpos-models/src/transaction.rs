// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::address::{Address, RecipientDeserializer, ADDRESS_SIZE_BYTES};
use crate::amount::{Amount, AmountDeserializer};
use crate::config::constants::{MAX_USERNAME_LENGTH, MAX_VENDOR_FIELD_LENGTH};
use crate::error::{ModelsError, ModelsResult};
use dpos_hash::Hash;
use dpos_serialization::{
    fixed_bytes, Deserializer, SerializeError, Serializer, U32LeDeserializer, U8Deserializer,
};
use dpos_signature::{
    KeyPair, PublicKey, PublicKeyDeserializer, Signature, SignatureDeserializer,
    PUBLIC_KEY_SIZE_BYTES,
};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a `+<hex public key>` token in vote and keysgroup assets
pub const SET_ENTRY_LENGTH: usize = 1 + 2 * PUBLIC_KEY_SIZE_BYTES;

/// Transaction id: hex of the sha256 of the fully signed bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(Hash);

impl TransactionId {
    /// Wrap a hash
    pub fn new(hash: Hash) -> Self {
        TransactionId(hash)
    }

    /// Underlying hash
    pub fn get_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TransactionId(Hash::from_str(s)?))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(TransactionId(Hash::deserialize(d)?))
    }
}

/// Transaction type tag, first byte of the encoding
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum TransactionType {
    /// coin transfer
    Transfer = 0,
    /// second signature registration
    SecondSignature = 1,
    /// delegate registration
    DelegateRegistration = 2,
    /// vote / unvote
    Vote = 3,
    /// multisignature registration
    Multisignature = 4,
}

/// Direction of a set entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SetAction {
    /// `+`
    Add,
    /// `-`
    Remove,
}

/// One `+key` / `-key` token of a vote or keysgroup asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetEntry {
    /// add or remove
    pub action: SetAction,
    /// targeted public key
    pub public_key: PublicKey,
}

impl SetEntry {
    /// `+key`
    pub fn add(public_key: PublicKey) -> Self {
        SetEntry {
            action: SetAction::Add,
            public_key,
        }
    }

    /// `-key`
    pub fn remove(public_key: PublicKey) -> Self {
        SetEntry {
            action: SetAction::Remove,
            public_key,
        }
    }
}

impl fmt::Display for SetEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.action {
            SetAction::Add => '+',
            SetAction::Remove => '-',
        };
        write!(f, "{}{}", sign, self.public_key)
    }
}

impl FromStr for SetEntry {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.chars().next() {
            Some('+') => SetAction::Add,
            Some('-') => SetAction::Remove,
            _ => {
                return Err(ModelsError::DeserializeError(format!(
                    "invalid set entry {}",
                    s
                )))
            }
        };
        let public_key = PublicKey::from_str(&s[1..])?;
        Ok(SetEntry { action, public_key })
    }
}

impl Serialize for SetEntry {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SetEntry {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        SetEntry::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Type-specific payload. The variant determines the transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionAsset {
    /// coin transfer, no payload
    Transfer,
    /// registers a second public key whose signature becomes mandatory
    SecondSignature {
        /// second public key
        public_key: PublicKey,
    },
    /// registers the sender as a delegate
    DelegateRegistration {
        /// unique delegate name
        username: String,
    },
    /// adds and removes votes of the sender
    Vote {
        /// vote tokens
        votes: Vec<SetEntry>,
    },
    /// turns the sender into a multisignature account
    Multisignature {
        /// number of co-signatures required
        min: u8,
        /// hours a pending transaction of this account stays in the pool
        lifetime: u8,
        /// co-signers, all `+key`
        keysgroup: Vec<SetEntry>,
    },
}

impl TransactionAsset {
    /// Transaction type of this asset
    pub fn kind(&self) -> TransactionType {
        match self {
            TransactionAsset::Transfer => TransactionType::Transfer,
            TransactionAsset::SecondSignature { .. } => TransactionType::SecondSignature,
            TransactionAsset::DelegateRegistration { .. } => TransactionType::DelegateRegistration,
            TransactionAsset::Vote { .. } => TransactionType::Vote,
            TransactionAsset::Multisignature { .. } => TransactionType::Multisignature,
        }
    }

    /// Encoded asset bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            TransactionAsset::Transfer => Vec::new(),
            TransactionAsset::SecondSignature { public_key } => public_key.to_bytes().to_vec(),
            TransactionAsset::DelegateRegistration { username } => username.as_bytes().to_vec(),
            TransactionAsset::Vote { votes } => votes
                .iter()
                .map(|vote| vote.to_string())
                .collect::<String>()
                .into_bytes(),
            TransactionAsset::Multisignature {
                min,
                lifetime,
                keysgroup,
            } => {
                let mut bytes = vec![*min, *lifetime];
                for key in keysgroup {
                    bytes.extend(key.to_string().into_bytes());
                }
                bytes
            }
        }
    }
}

/// A signed transaction.
///
/// `signatures` (co-signatures) are not part of the encoded bytes: they sign the signing hash
/// and are attached while the transaction waits in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// id declared by the creator, checked against `compute_id`
    pub id: TransactionId,
    /// seconds since the chain epoch
    pub timestamp: u32,
    /// sender
    pub sender_public_key: PublicKey,
    /// multisignature member signing on behalf of the sender
    pub requester_public_key: Option<PublicKey>,
    /// transfer recipient
    pub recipient: Option<Address>,
    /// free text, at most 64 bytes
    pub vendor_field: Option<String>,
    /// transferred amount
    pub amount: Amount,
    /// fee paid to the forger
    pub fee: Amount,
    /// type-specific payload
    pub asset: TransactionAsset,
    /// sender (or requester) signature
    pub signature: Option<Signature>,
    /// second signature
    pub second_signature: Option<Signature>,
    /// co-signatures of multisignature members
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Builds an unsigned transaction. Its id is only meaningful after `sign`.
    pub fn new(
        asset: TransactionAsset,
        sender_public_key: PublicKey,
        recipient: Option<Address>,
        amount: Amount,
        fee: Amount,
        timestamp: u32,
    ) -> Self {
        let mut transaction = Transaction {
            id: TransactionId(Hash::compute_from(&[])),
            timestamp,
            sender_public_key,
            requester_public_key: None,
            recipient,
            vendor_field: None,
            amount,
            fee,
            asset,
            signature: None,
            second_signature: None,
            signatures: Vec::new(),
        };
        transaction.id = transaction.compute_id();
        transaction
    }

    /// Transaction type
    pub fn kind(&self) -> TransactionType {
        self.asset.kind()
    }

    /// amount + fee, None on overflow
    pub fn total_cost(&self) -> Option<Amount> {
        self.amount.checked_add(self.fee)
    }

    /// Encoded bytes, optionally without the signatures
    pub fn to_bytes(&self, include_signature: bool, include_second_signature: bool) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(256);
        buffer.push(self.kind().into());
        buffer.extend(self.timestamp.to_le_bytes());
        buffer.extend(self.sender_public_key.to_bytes());
        if let Some(requester) = &self.requester_public_key {
            buffer.extend(requester.to_bytes());
        }
        match &self.recipient {
            Some(recipient) => buffer.extend(recipient.to_bytes()),
            None => buffer.extend([0u8; ADDRESS_SIZE_BYTES]),
        }
        let mut vendor = [0u8; MAX_VENDOR_FIELD_LENGTH];
        if let Some(vendor_field) = &self.vendor_field {
            let bytes = vendor_field.as_bytes();
            let len = bytes.len().min(MAX_VENDOR_FIELD_LENGTH);
            vendor[..len].copy_from_slice(&bytes[..len]);
        }
        buffer.extend(vendor);
        buffer.extend(self.amount.to_raw().to_le_bytes());
        buffer.extend(self.fee.to_raw().to_le_bytes());
        buffer.extend(self.asset.to_bytes());
        if include_signature {
            if let Some(signature) = &self.signature {
                buffer.extend(signature.to_bytes());
            }
            if include_second_signature {
                if let Some(second_signature) = &self.second_signature {
                    buffer.extend(second_signature.to_bytes());
                }
            }
        }
        buffer
    }

    /// Hash signed by the sender (and co-signers): bytes without any signature
    pub fn signing_hash(&self) -> Hash {
        Hash::compute_from(&self.to_bytes(false, false))
    }

    /// Hash signed by the second key: bytes with the first signature only
    pub fn second_signing_hash(&self) -> Hash {
        Hash::compute_from(&self.to_bytes(true, false))
    }

    /// Id computed from the full bytes
    pub fn compute_id(&self) -> TransactionId {
        TransactionId(Hash::compute_from(&self.to_bytes(true, true)))
    }

    /// Signs with the sender (or requester) key, optionally with a second key, and sets the id
    pub fn sign(&mut self, keypair: &KeyPair, second_keypair: Option<&KeyPair>) -> ModelsResult<()> {
        self.signature = Some(keypair.sign(&self.signing_hash())?);
        self.second_signature = match second_keypair {
            Some(second) => Some(second.sign(&self.second_signing_hash())?),
            None => None,
        };
        self.id = self.compute_id();
        Ok(())
    }

    /// Produces a co-signature of this transaction
    pub fn cosign(&self, keypair: &KeyPair) -> ModelsResult<Signature> {
        Ok(keypair.sign(&self.signing_hash())?)
    }
}

/// Serializer for `Transaction`: full bytes, signatures included
#[derive(Clone, Default)]
pub struct TransactionSerializer;

impl TransactionSerializer {
    /// Creates a new `TransactionSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        if let Some(vendor_field) = &value.vendor_field {
            if vendor_field.len() > MAX_VENDOR_FIELD_LENGTH {
                return Err(SerializeError::StringTooBig(format!(
                    "vendor field of {} bytes",
                    vendor_field.len()
                )));
            }
        }
        buffer.extend(value.to_bytes(true, true));
        Ok(())
    }
}

/// Deserializer for `Transaction`.
///
/// The encoding has no length prefixes, so boundaries are recovered from the data:
/// * a requester key is present when the byte after the sender key is a compressed key prefix;
/// * vote and keysgroup assets are runs of fixed-size `+key` / `-key` tokens;
/// * signatures are DER, whose header carries their length;
/// * a username ends where the remaining bytes parse as one or two signatures.
///
/// The transaction must be the last thing in the buffer when its type is a delegate registration.
#[derive(Clone, Default)]
pub struct TransactionDeserializer {
    u8_deserializer: U8Deserializer,
    u32_deserializer: U32LeDeserializer,
    amount_deserializer: AmountDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    recipient_deserializer: RecipientDeserializer,
    signature_deserializer: SignatureDeserializer,
}

impl TransactionDeserializer {
    /// Creates a new `TransactionDeserializer`
    pub fn new() -> Self {
        Self::default()
    }

    fn deserialize_set_entries<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        mut input: &'a [u8],
        allow_remove: bool,
    ) -> IResult<&'a [u8], Vec<SetEntry>, E> {
        let mut entries = Vec::new();
        while let Some(first) = input.first() {
            if *first != b'+' && !(allow_remove && *first == b'-') {
                break;
            }
            let (rest, token) = fixed_bytes::<SET_ENTRY_LENGTH, E>(input)?;
            let entry = std::str::from_utf8(&token)
                .ok()
                .and_then(|text| SetEntry::from_str(text).ok())
                .ok_or_else(|| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
            entries.push(entry);
            input = rest;
        }
        Ok((input, entries))
    }

    /// Parses one optional signature and one optional second signature
    fn deserialize_signatures<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], (Option<Signature>, Option<Signature>), E> {
        if input.is_empty() {
            return Ok((input, (None, None)));
        }
        let (rest, signature) = self.signature_deserializer.deserialize(input)?;
        if rest.is_empty() {
            return Ok((rest, (Some(signature), None)));
        }
        let (rest, second_signature) = self.signature_deserializer.deserialize(rest)?;
        Ok((rest, (Some(signature), Some(second_signature))))
    }

    /// Splits a username from the trailing signatures
    fn deserialize_username_and_signatures<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], (String, Option<Signature>, Option<Signature>), E> {
        let max_len = input.len().min(MAX_USERNAME_LENGTH);
        for len in 1..=max_len {
            let (name, tail) = input.split_at(len);
            if !is_username_bytes(name) {
                break;
            }
            if tail.is_empty() {
                return Ok((tail, (bytes_to_string(name), None, None)));
            }
            if let Ok((rest, (signature, second_signature))) =
                self.deserialize_signatures::<nom::error::Error<&'a [u8]>>(tail)
            {
                if rest.is_empty() {
                    return Ok((rest, (bytes_to_string(name), signature, second_signature)));
                }
            }
        }
        Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))
    }
}

fn is_username_bytes(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"!@$&_.".contains(b))
}

fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

impl TransactionDeserializer {
    fn deserialize_asset<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        kind: TransactionType,
        input: &'a [u8],
    ) -> IResult<&'a [u8], TransactionAsset, E> {
        match kind {
            TransactionType::Transfer => Ok((input, TransactionAsset::Transfer)),
            TransactionType::SecondSignature => {
                let (rest, public_key) = self.public_key_deserializer.deserialize(input)?;
                Ok((rest, TransactionAsset::SecondSignature { public_key }))
            }
            TransactionType::Vote => {
                let (rest, votes) = self.deserialize_set_entries(input, true)?;
                Ok((rest, TransactionAsset::Vote { votes }))
            }
            TransactionType::Multisignature => {
                let (rest, min) = self.u8_deserializer.deserialize(input)?;
                let (rest, lifetime) = self.u8_deserializer.deserialize(rest)?;
                let (rest, keysgroup) = self.deserialize_set_entries(rest, false)?;
                Ok((
                    rest,
                    TransactionAsset::Multisignature {
                        min,
                        lifetime,
                        keysgroup,
                    },
                ))
            }
            // the username cannot be delimited without looking at the signatures
            TransactionType::DelegateRegistration => {
                Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag)))
            }
        }
    }

    fn deserialize_transaction<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        let (rest, type_byte) = context("Failed type deserialization", |input| {
            self.u8_deserializer.deserialize(input)
        })(input)?;
        let kind = TransactionType::try_from(type_byte)
            .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag)))?;
        let (rest, timestamp) = context("Failed timestamp deserialization", |input| {
            self.u32_deserializer.deserialize(input)
        })(rest)?;
        let (rest, sender_public_key) = self.public_key_deserializer.deserialize(rest)?;
        let (rest, requester_public_key) = match rest.first() {
            Some(0x02) | Some(0x03) => {
                let (rest, key) = self.public_key_deserializer.deserialize(rest)?;
                (rest, Some(key))
            }
            _ => (rest, None),
        };
        let (rest, recipient) = self.recipient_deserializer.deserialize(rest)?;
        let (rest, vendor) = fixed_bytes::<MAX_VENDOR_FIELD_LENGTH, E>(rest)?;
        let vendor_len = vendor
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        let vendor_field = if vendor_len == 0 {
            None
        } else {
            Some(
                String::from_utf8(vendor[..vendor_len].to_vec())
                    .map_err(|_| nom::Err::Error(E::from_error_kind(rest, ErrorKind::Char)))?,
            )
        };
        let (rest, amount) = self.amount_deserializer.deserialize(rest)?;
        let (rest, fee) = self.amount_deserializer.deserialize(rest)?;

        let (rest, asset, signature, second_signature) =
            if kind == TransactionType::DelegateRegistration {
                let (rest, (username, signature, second_signature)) =
                    self.deserialize_username_and_signatures(rest)?;
                (
                    rest,
                    TransactionAsset::DelegateRegistration { username },
                    signature,
                    second_signature,
                )
            } else {
                let (rest, asset) = self.deserialize_asset(kind, rest)?;
                let (rest, (signature, second_signature)) = self.deserialize_signatures(rest)?;
                (rest, asset, signature, second_signature)
            };

        let consumed = &input[..input.len() - rest.len()];
        Ok((
            rest,
            Transaction {
                id: TransactionId(Hash::compute_from(consumed)),
                timestamp,
                sender_public_key,
                requester_public_key,
                recipient,
                vendor_field,
                amount,
                fee,
                asset,
                signature,
                second_signature,
                signatures: Vec::new(),
            },
        ))
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context("Failed transaction deserialization", |input| {
            self.deserialize_transaction(input)
        })(buffer)
    }
}
