// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Signature error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum DposSignatureError {
    /// parsing error: {0}
    ParsingError(String),

    /// secp256k1 engine error: {0}
    EngineError(String),

    /// signature verification failed: {0}
    SignatureVerificationFailed(String),
}
