// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use dpos_models::ErrorKind;
use thiserror::Error;

/// Result type of peer calls
pub type ProtocolResult<T, E = ProtocolError> = core::result::Result<T, E>;

/// protocol error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// peer {0} did not answer in time
    Timeout(String),
    /// peer {0} is unreachable: {1}
    Unreachable(String, String),
    /// peer {0} sent an invalid response: {1}
    InvalidResponse(String, String),
    /// peer {0} is banned
    Banned(String),
    /// no peer transport configured
    Offline,
}

impl ProtocolError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Timeout(_) | ProtocolError::Unreachable(..) | ProtocolError::Offline => {
                ErrorKind::Transient
            }
            ProtocolError::InvalidResponse(..) => ErrorKind::Malformed,
            ProtocolError::Banned(_) => ErrorKind::PolicyViolation,
        }
    }
}
