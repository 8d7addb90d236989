// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Result type of sequence submissions
pub type SequenceResult<T, E = SequenceError> = core::result::Result<T, E>;

/// Sequence error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// sequence {0} is stopped
    Stopped(String),
    /// task of sequence {0} was cancelled before running
    Cancelled(String),
    /// could not spawn the worker of sequence {0}: {1}
    SpawnError(String, String),
}
