// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_consensus_exports::error::ConsensusError;
use dpos_models::{ErrorKind, ModelsError};
use dpos_signature::DposSignatureError;
use dpos_time::TimeError;
use thiserror::Error;

/// factory result
pub type FactoryResult<T, E = FactoryError> = core::result::Result<T, E>;

/// factory error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum FactoryError {
    /// delegate {0} is not managed by this node
    UnknownDelegate(String),
    /// invalid delegate secret: {0}
    InvalidSecret(String),
    /// could not spawn the factory worker: {0}
    SpawnError(String),
    /// consensus error: {0}
    ConsensusError(#[from] ConsensusError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// signature error: {0}
    SignatureError(#[from] DposSignatureError),
    /// time error: {0}
    TimeError(#[from] TimeError),
}

impl FactoryError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FactoryError::UnknownDelegate(_) => ErrorKind::PolicyViolation,
            FactoryError::InvalidSecret(_) | FactoryError::SignatureError(_) => {
                ErrorKind::Malformed
            }
            FactoryError::SpawnError(_) => ErrorKind::Fatal,
            FactoryError::ConsensusError(err) => err.kind(),
            FactoryError::ModelsError(err) => err.kind(),
            FactoryError::TimeError(_) => ErrorKind::Transient,
        }
    }
}
