// Copyright (c) 2022 MASSA LABS <info@massa.net>

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]
//! SHA-256 hashing used for transaction ids, payload hashes, block ids and signing digests.

pub use error::DposHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use settings::HASH_SIZE_BYTES;

mod error;
mod hash;
mod settings;
