// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::{Amount, AmountDeserializer};
use crate::error::{ModelsError, ModelsResult};
use crate::transaction::Transaction;
use dpos_hash::{Hash, HashDeserializer};
use dpos_serialization::{
    Deserializer, SerializeError, Serializer, U32LeDeserializer, U64BeDeserializer,
};
use dpos_signature::{KeyPair, PublicKey, PublicKeyDeserializer, Signature, SignatureDeserializer};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Block id: the first 8 bytes of the sha256 of the signed header, byte-reversed and read
/// as an unsigned big-endian integer. Rendered in decimal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    /// Wrap a numeric id
    pub const fn new(value: u64) -> Self {
        BlockId(value)
    }

    /// Numeric value
    pub fn to_u64(&self) -> u64 {
        self.0
    }

    /// Id of a header hash
    ///
    /// ```
    /// # use dpos_models::BlockId;
    /// # use dpos_hash::Hash;
    /// let mut digest = [0u8; 32];
    /// digest[0] = 1;
    /// assert_eq!(BlockId::from_hash(&Hash::from_bytes(&digest)).to_string(), "1");
    /// ```
    pub fn from_hash(hash: &Hash) -> Self {
        let mut first = [0u8; 8];
        first.copy_from_slice(&hash.to_bytes()[..8]);
        first.reverse();
        BlockId(u64::from_be_bytes(first))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelsError::BlockIdParseError(s.to_string()));
        }
        u64::from_str(s)
            .map(BlockId)
            .map_err(|_| ModelsError::BlockIdParseError(s.to_string()))
    }
}

impl Serialize for BlockId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        BlockId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Block and round of a confirmed ledger change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTag {
    /// enclosing block
    pub block_id: BlockId,
    /// round of the enclosing block
    pub round: u64,
    /// whether the enclosing block is the genesis block
    pub genesis: bool,
}

/// Values of the header derived from the transaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    /// cumulated byte size of the transactions
    pub length: u32,
    /// sha256 of the concatenated transaction bytes
    pub hash: Hash,
    /// sum of the amounts
    pub total_amount: Amount,
    /// sum of the fees
    pub total_fee: Amount,
}

impl Payload {
    /// Computes the payload values of a transaction list, in order
    pub fn compute(transactions: &[Transaction]) -> ModelsResult<Payload> {
        let mut bytes = Vec::new();
        let mut total_amount = Amount::zero();
        let mut total_fee = Amount::zero();
        for transaction in transactions {
            bytes.extend(transaction.to_bytes(true, true));
            total_amount = total_amount
                .checked_add(transaction.amount)
                .ok_or_else(|| ModelsError::CheckedOperationError("total amount".into()))?;
            total_fee = total_fee
                .checked_add(transaction.fee)
                .ok_or_else(|| ModelsError::CheckedOperationError("total fee".into()))?;
        }
        Ok(Payload {
            length: u32::try_from(bytes.len())
                .map_err(|_| ModelsError::CheckedOperationError("payload length".into()))?,
            hash: Hash::compute_from(&bytes),
            total_amount,
            total_fee,
        })
    }
}

/// A block: signed header plus the ordered transactions it confirms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// id declared by the forger, checked against `compute_id`
    pub id: BlockId,
    /// block format version
    pub version: u32,
    /// epoch time of the slot
    pub timestamp: u32,
    /// height, 1 for genesis
    pub height: u32,
    /// previous block, absent only at height 1
    pub previous_block: Option<BlockId>,
    /// number of transactions
    pub number_of_transactions: u32,
    /// sum of the transaction amounts
    pub total_amount: Amount,
    /// sum of the transaction fees
    pub total_fee: Amount,
    /// forging reward
    pub reward: Amount,
    /// cumulated byte size of the transactions
    pub payload_length: u32,
    /// sha256 of the concatenated transaction bytes
    pub payload_hash: Hash,
    /// forger
    pub generator_public_key: PublicKey,
    /// forger signature over the header
    pub block_signature: Option<Signature>,
    /// confirmed transactions
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Assembles and signs a block on top of `previous` (id, height), genesis when `None`.
    pub fn new_signed(
        keypair: &KeyPair,
        version: u32,
        timestamp: u32,
        previous: Option<(BlockId, u32)>,
        transactions: Vec<Transaction>,
        reward: Amount,
    ) -> ModelsResult<Block> {
        let payload = Payload::compute(&transactions)?;
        let mut block = Block {
            id: BlockId(0),
            version,
            timestamp,
            height: previous.map_or(1, |(_, height)| height + 1),
            previous_block: previous.map(|(id, _)| id),
            number_of_transactions: u32::try_from(transactions.len())
                .map_err(|_| ModelsError::CheckedOperationError("transaction count".into()))?,
            total_amount: payload.total_amount,
            total_fee: payload.total_fee,
            reward,
            payload_length: payload.length,
            payload_hash: payload.hash,
            generator_public_key: keypair.get_public_key(),
            block_signature: None,
            transactions,
        };
        block.block_signature = Some(keypair.sign(&block.signing_hash())?);
        block.id = block.compute_id();
        Ok(block)
    }

    /// Encoded header, optionally without the signature
    pub fn header_bytes(&self, include_signature: bool) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(200);
        self.write_header(include_signature, &mut buffer);
        buffer
    }

    /// Appends the fixed-width header fields to `buffer`
    fn write_header(&self, include_signature: bool, buffer: &mut Vec<u8>) {
        buffer.extend(self.version.to_le_bytes());
        buffer.extend(self.timestamp.to_le_bytes());
        buffer.extend(self.height.to_le_bytes());
        let previous = self.previous_block.map_or(0, |id| id.to_u64());
        buffer.extend(previous.to_be_bytes());
        buffer.extend(self.number_of_transactions.to_le_bytes());
        buffer.extend(self.total_amount.to_raw().to_le_bytes());
        buffer.extend(self.total_fee.to_raw().to_le_bytes());
        buffer.extend(self.reward.to_raw().to_le_bytes());
        buffer.extend(self.payload_length.to_le_bytes());
        buffer.extend(self.payload_hash.to_bytes());
        buffer.extend(self.generator_public_key.to_bytes());
        if include_signature {
            if let Some(signature) = &self.block_signature {
                buffer.extend(signature.to_bytes());
            }
        }
    }

    /// Hash signed by the forger
    pub fn signing_hash(&self) -> Hash {
        Hash::compute_from(&self.header_bytes(false))
    }

    /// Id computed from the signed header
    pub fn compute_id(&self) -> BlockId {
        BlockId::from_hash(&Hash::compute_from(&self.header_bytes(true)))
    }

    /// Copy of the block without its transactions
    pub fn header(&self) -> Block {
        Block {
            transactions: Vec::new(),
            ..self.clone()
        }
    }
}

/// Serializer for block headers
#[derive(Clone, Default)]
pub struct BlockSerializer;

impl BlockSerializer {
    /// Creates a new `BlockSerializer`
    pub fn new() -> Self {
        Self
    }
}

impl Serializer<Block> for BlockSerializer {
    fn serialize(&self, value: &Block, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        value.write_header(true, buffer);
        Ok(())
    }
}

/// Deserializer for block headers. Transactions travel separately, the result has none.
#[derive(Clone, Default)]
pub struct BlockDeserializer {
    u32_deserializer: U32LeDeserializer,
    u64_be_deserializer: U64BeDeserializer,
    amount_deserializer: AmountDeserializer,
    hash_deserializer: HashDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    signature_deserializer: SignatureDeserializer,
}

impl BlockDeserializer {
    /// Creates a new `BlockDeserializer`
    pub fn new() -> Self {
        Self::default()
    }

    fn deserialize_header<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Block, E> {
        let (rest, version) = self.u32_deserializer.deserialize(input)?;
        let (rest, timestamp) = self.u32_deserializer.deserialize(rest)?;
        let (rest, height) = self.u32_deserializer.deserialize(rest)?;
        let (rest, previous) = self.u64_be_deserializer.deserialize(rest)?;
        let (rest, number_of_transactions) = self.u32_deserializer.deserialize(rest)?;
        let (rest, total_amount) = self.amount_deserializer.deserialize(rest)?;
        let (rest, total_fee) = self.amount_deserializer.deserialize(rest)?;
        let (rest, reward) = self.amount_deserializer.deserialize(rest)?;
        let (rest, payload_length) = self.u32_deserializer.deserialize(rest)?;
        let (rest, payload_hash) = self.hash_deserializer.deserialize(rest)?;
        let (rest, generator_public_key) = self.public_key_deserializer.deserialize(rest)?;
        let (rest, block_signature) = if rest.is_empty() {
            (rest, None)
        } else {
            let (rest, signature) = self.signature_deserializer.deserialize(rest)?;
            (rest, Some(signature))
        };
        let consumed = &input[..input.len() - rest.len()];
        Ok((
            rest,
            Block {
                id: BlockId::from_hash(&Hash::compute_from(consumed)),
                version,
                timestamp,
                height,
                previous_block: (previous != 0).then_some(BlockId(previous)),
                number_of_transactions,
                total_amount,
                total_fee,
                reward,
                payload_length,
                payload_hash,
                generator_public_key,
                block_signature,
                transactions: Vec::new(),
            },
        ))
    }
}

impl Deserializer<Block> for BlockDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Block, E> {
        context("Failed block header deserialization", |input| {
            self.deserialize_header(input)
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::transaction::TransactionAsset;
    use dpos_serialization::DeserializeError;
    use serial_test::serial;

    fn transfer(amount: u64, fee: u64) -> Transaction {
        let sender = KeyPair::from_passphrase("block sender").unwrap();
        let recipient = Address::from_public_key(
            &KeyPair::from_passphrase("block recipient")
                .unwrap()
                .get_public_key(),
            0x17,
        );
        let mut tx = Transaction::new(
            TransactionAsset::Transfer,
            sender.get_public_key(),
            Some(recipient),
            Amount::from_raw(amount),
            Amount::from_raw(fee),
            10,
        );
        tx.sign(&sender, None).unwrap();
        tx
    }

    #[test]
    #[serial]
    fn test_header_layout() {
        let forger = KeyPair::from_passphrase("forger").unwrap();
        let block = Block::new_signed(
            &forger,
            0,
            16,
            Some((BlockId::new(1), 7)),
            vec![],
            Amount::zero(),
        )
        .unwrap();
        let unsigned = block.header_bytes(false);
        assert_eq!(unsigned.len(), 4 + 4 + 4 + 8 + 4 + 8 + 8 + 8 + 4 + 32 + 33);
        assert_eq!(&unsigned[8..12], &8u32.to_le_bytes());
        assert_eq!(&unsigned[12..20], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(block.height, 8);
    }

    #[test]
    #[serial]
    fn test_payload_and_totals() {
        let forger = KeyPair::from_passphrase("forger").unwrap();
        let transactions = vec![transfer(100, 10), transfer(200, 20)];
        let mut concatenated = Vec::new();
        for tx in &transactions {
            concatenated.extend(tx.to_bytes(true, true));
        }
        let block = Block::new_signed(
            &forger,
            0,
            16,
            Some((BlockId::new(1), 1)),
            transactions,
            Amount::zero(),
        )
        .unwrap();
        assert_eq!(block.payload_hash, Hash::compute_from(&concatenated));
        assert_eq!(block.payload_length as usize, concatenated.len());
        assert_eq!(block.total_amount, Amount::from_raw(300));
        assert_eq!(block.total_fee, Amount::from_raw(30));
        assert_eq!(block.number_of_transactions, 2);
    }

    #[test]
    #[serial]
    fn test_header_decode_and_id() {
        let forger = KeyPair::from_passphrase("forger").unwrap();
        let block = Block::new_signed(
            &forger,
            0,
            24,
            Some((BlockId::new(987654321), 3)),
            vec![transfer(5, 1)],
            Amount::from_raw(500),
        )
        .unwrap();
        let mut buffer = Vec::new();
        BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
        let (rest, decoded) = BlockDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, block.header());
        assert_eq!(decoded.id, block.id);
        let digest = Hash::compute_from(&buffer);
        let mut expected = [0u8; 8];
        expected.copy_from_slice(&digest.to_bytes()[..8]);
        assert_eq!(block.id.to_u64(), u64::from_le_bytes(expected));
        forger
            .get_public_key()
            .verify_signature(&block.signing_hash(), block.block_signature.as_ref().unwrap())
            .unwrap();
    }

    #[test]
    #[serial]
    fn test_serializer_writes_signed_header() {
        let forger = KeyPair::from_passphrase("forger").unwrap();
        let block = Block::new_signed(&forger, 0, 16, None, Vec::new(), Amount::zero()).unwrap();
        let unsigned = block.header_bytes(false);
        assert_eq!(&unsigned[12..20], &[0u8; 8]);

        let signed = block.header_bytes(true);
        assert!(signed.starts_with(&unsigned));
        assert!(signed.len() > unsigned.len());
        let mut buffer = Vec::new();
        BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
        assert_eq!(buffer, signed);
    }

    #[test]
    fn test_block_id_text() {
        assert_eq!(BlockId::from_str("12345").unwrap(), BlockId::new(12345));
        assert!(BlockId::from_str("-1").is_err());
        assert!(BlockId::from_str("").is_err());
    }
}
