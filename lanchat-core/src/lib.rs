//! LAN chat protocol engine.
//! No network I/O here; listeners, senders and the dispatcher live in the
//! daemon crate and drive these types.

pub mod crypto;
pub mod peer;
pub mod protocol;
pub mod wire;

pub use crypto::{CryptoError, FileCrypto};
pub use peer::{Peer, PeerRegistry};
pub use protocol::{Header, Message, TOKEN};
pub use wire::{decode, encode};
