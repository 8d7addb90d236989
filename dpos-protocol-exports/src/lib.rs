// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Peer capabilities used by consensus and forging.
//!
//! Transport, discovery and handshake live outside the node core: peers are reached
//! through the `PeerRpc` trait, and `PeerSet` keeps their health and bans.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod peer_id;
mod peer_set;
mod rpc;

pub use config::ProtocolConfig;
pub use error::{ProtocolError, ProtocolResult};
pub use peer_id::PeerId;
pub use peer_set::{PeerInfo, PeerSet};
pub use rpc::{BroadcastMessage, OfflinePeerRpc, PeerRpc, PeerStatus};

#[cfg(feature = "test-exports")]
pub use rpc::MockPeerRpc;
