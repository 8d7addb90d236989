// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

/// Result type of the models crate
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// Models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ModelsError {
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// dpos_hash error: {0}
    HashError(#[from] dpos_hash::DposHashError),
    /// signature error: {0}
    SignatureError(#[from] dpos_signature::DposSignatureError),
    /// Time error {0}
    TimeError(#[from] dpos_time::TimeError),
    /// amount parse error: {0}
    AmountParseError(String),
    /// address parse error: {0}
    AddressParseError(String),
    /// address version {0} is a compressed public key prefix
    ReservedAddressVersion(u8),
    /// block id parse error: {0}
    BlockIdParseError(String),
    /// checked operation error: {0}
    CheckedOperationError(String),
}

impl ModelsError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelsError::TimeError(_) => ErrorKind::Transient,
            ModelsError::CheckedOperationError(_) => ErrorKind::Fatal,
            ModelsError::SignatureError(_) => ErrorKind::Unverifiable,
            _ => ErrorKind::Malformed,
        }
    }
}

/// Error taxonomy shared by every component. It tells callers what to do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// encoding/decoding failure or schema mismatch
    Malformed,
    /// signature, slot, reward or id mismatch
    Unverifiable,
    /// balance does not cover the spent amount
    InsufficientFunds,
    /// protocol rule violated (fees, vote limits, multisignature threshold...)
    PolicyViolation,
    /// duplicate or already confirmed
    Conflict,
    /// peer timeout, storage unavailable
    Transient,
    /// broken internal invariant
    Fatal,
}

impl ErrorKind {
    /// Whether a peer that sent data failing with this kind should be banned
    pub fn bans_peer(&self) -> bool {
        matches!(self, ErrorKind::Malformed | ErrorKind::Unverifiable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
