// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_consensus_exports::{error::ConsensusError, GenesisConfig};
use dpos_models::config::constants::MAX_VOTES_PER_TRANSACTION;
use dpos_models::{Address, Amount, Block, SetEntry, Transaction, TransactionAsset};
use dpos_signature::KeyPair;

fn genesis_error(err: impl std::fmt::Display) -> ConsensusError {
    ConsensusError::GenesisCreationError(err.to_string())
}

fn keypair(passphrase: &str) -> Result<KeyPair, ConsensusError> {
    KeyPair::from_passphrase(passphrase).map_err(genesis_error)
}

fn signed(
    keypair: &KeyPair,
    asset: TransactionAsset,
    recipient: Option<Address>,
    amount: Amount,
    timestamp: u32,
) -> Result<Transaction, ConsensusError> {
    let mut transaction = Transaction::new(
        asset,
        keypair.get_public_key(),
        recipient,
        amount,
        Amount::zero(),
        timestamp,
    );
    transaction.sign(keypair, None).map_err(genesis_error)?;
    Ok(transaction)
}

/// Creates the genesis block.
///
/// # Arguments
/// * `config`: content of the block
/// * `block_version`: version written in the header
/// * `address_version`: network byte of the holder address
///
/// # Returns
/// A signed block at height 1 with no parent and no reward, holding the initial
/// transfer, one registration per delegate and the votes of the holder
pub fn build_genesis_block(
    config: &GenesisConfig,
    block_version: u32,
    address_version: u8,
) -> Result<Block, ConsensusError> {
    let genesis = keypair(&config.passphrase)?;
    let holder = keypair(&config.holder_passphrase)?;
    let holder_address = Address::from_public_key(&holder.get_public_key(), address_version);

    let mut transactions = vec![signed(
        &genesis,
        TransactionAsset::Transfer,
        Some(holder_address),
        config.total_amount,
        config.timestamp,
    )?];

    let mut delegates = Vec::with_capacity(config.delegate_passphrases.len());
    for (index, passphrase) in config.delegate_passphrases.iter().enumerate() {
        let delegate = keypair(passphrase)?;
        transactions.push(signed(
            &delegate,
            TransactionAsset::DelegateRegistration {
                username: format!("genesis_{}", index),
            },
            None,
            Amount::zero(),
            config.timestamp,
        )?);
        delegates.push(delegate.get_public_key());
    }

    for chunk in delegates.chunks(MAX_VOTES_PER_TRANSACTION) {
        transactions.push(signed(
            &holder,
            TransactionAsset::Vote {
                votes: chunk.iter().copied().map(SetEntry::add).collect(),
            },
            None,
            Amount::zero(),
            config.timestamp,
        )?);
    }

    Block::new_signed(
        &genesis,
        block_version,
        config.timestamp,
        None,
        transactions,
        Amount::zero(),
    )
    .map_err(genesis_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_models::{Payload, TransactionType};

    #[test]
    fn test_genesis_content() {
        let config = GenesisConfig {
            delegate_passphrases: (0..40).map(|index| format!("delegate {}", index)).collect(),
            ..Default::default()
        };
        let block = build_genesis_block(&config, 0, 0x17).unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.previous_block, None);
        assert_eq!(block.id, block.compute_id());
        // transfer, 40 registrations, votes split 33 + 7
        assert_eq!(block.transactions.len(), 43);
        assert_eq!(block.transactions[0].kind(), TransactionType::Transfer);
        assert_eq!(block.transactions[0].amount, config.total_amount);
        let votes: Vec<usize> = block
            .transactions
            .iter()
            .filter_map(|transaction| match &transaction.asset {
                TransactionAsset::Vote { votes } => Some(votes.len()),
                _ => None,
            })
            .collect();
        assert_eq!(votes, vec![33, 7]);
        let payload = Payload::compute(&block.transactions).unwrap();
        assert_eq!(payload.hash, block.payload_hash);
    }

    #[test]
    fn test_genesis_is_deterministic() {
        let config = GenesisConfig {
            delegate_passphrases: vec!["delegate 0".into(), "delegate 1".into()],
            ..Default::default()
        };
        assert_eq!(
            build_genesis_block(&config, 0, 0x17).unwrap().id,
            build_genesis_block(&config, 0, 0x17).unwrap().id
        );
    }
}
