// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dpos_hash::{Hash, HASH_SIZE_BYTES};
use dpos_signature::PublicKey;

/// Forging order of `delegates` for `round`.
///
/// Fisher-Yates over the unswapped suffix, fed by 4-byte little-endian words of
/// sha256 of the decimal round number. The digest is re-hashed once its 32 bytes are used.
///
/// ```
/// # use dpos_rounds::shuffle_delegates;
/// # use dpos_signature::KeyPair;
/// let keys: Vec<_> = (0..10).map(|_| KeyPair::generate().get_public_key()).collect();
/// let order = shuffle_delegates(7, keys.clone());
/// assert_eq!(order, shuffle_delegates(7, keys.clone()));
/// let mut sorted = order.clone();
/// sorted.sort();
/// let mut expected = keys;
/// expected.sort();
/// assert_eq!(sorted, expected);
/// ```
pub fn shuffle_delegates(round: u64, mut delegates: Vec<PublicKey>) -> Vec<PublicKey> {
    let count = delegates.len();
    let mut seed = Hash::compute_from(round.to_string().as_bytes());
    let mut offset = 0;
    for index in 0..count {
        if offset + 4 > HASH_SIZE_BYTES {
            seed = Hash::compute_from(seed.to_bytes());
            offset = 0;
        }
        let bytes = seed.to_bytes();
        let word = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        offset += 4;
        let swap = index + (word as usize) % (count - index);
        delegates.swap(index, swap);
    }
    delegates
}
