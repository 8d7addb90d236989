// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_factory_exports::{FactoryError, FactoryResult, ForgingOutcome};
use dpos_signature::{KeyPair, PublicKey};
use std::collections::BTreeMap;

/// Delegate key managed by the node
pub(crate) struct ForgingDelegate {
    pub keypair: KeyPair,
    pub enabled: bool,
}

/// State shared by the factory worker and its controller
pub(crate) struct ForgingState {
    pub enabled: bool,
    pub delegates: BTreeMap<PublicKey, ForgingDelegate>,
    pub last_outcome: Option<ForgingOutcome>,
}

impl ForgingState {
    /// Loads the delegate keys from their passphrases, all of them forging
    pub fn from_passphrases(passphrases: &[String], enabled: bool) -> FactoryResult<Self> {
        let mut delegates = BTreeMap::new();
        for passphrase in passphrases {
            let keypair = KeyPair::from_passphrase(passphrase)
                .map_err(|err| FactoryError::InvalidSecret(err.to_string()))?;
            delegates.insert(
                keypair.get_public_key(),
                ForgingDelegate {
                    keypair,
                    enabled: true,
                },
            );
        }
        Ok(ForgingState {
            enabled,
            delegates,
            last_outcome: None,
        })
    }

    /// Key of `public_key` if it is managed locally and forging
    pub fn forging_key(&self, public_key: &PublicKey) -> Option<&KeyPair> {
        self.delegates
            .get(public_key)
            .filter(|delegate| delegate.enabled)
            .map(|delegate| &delegate.keypair)
    }
}
