//! Peers and the concurrent peer registry.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

/// A remote participant. Identity is the IP address alone: two peers with
/// the same IP and different ports compare equal and collide in the
/// registry. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Peer {
    ip: String,
    port: u16,
}

impl Peer {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.hash(state);
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.ip, self.port)
    }
}

/// The set of known peers, unique by IP. Shared across tasks; every
/// operation takes `&self` and none blocks on network I/O. Membership only
/// grows on greetings and chat from unseen IPs and only shrinks on BYE.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<HashSet<Peer>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer. Returns true if it was not known before.
    pub fn add(&self, peer: Peer) -> bool {
        self.peers.write().unwrap().insert(peer)
    }

    /// Insert several peers. Returns true if any of them was new.
    pub fn add_all(&self, peers: impl IntoIterator<Item = Peer>) -> bool {
        let mut set = self.peers.write().unwrap();
        let mut any_new = false;
        for peer in peers {
            any_new |= set.insert(peer);
        }
        any_new
    }

    /// Remove a peer. Returns true if it was present.
    pub fn remove(&self, peer: &Peer) -> bool {
        self.peers.write().unwrap().remove(peer)
    }

    pub fn contains(&self, peer: &Peer) -> bool {
        self.peers.read().unwrap().contains(peer)
    }

    /// Look a peer up by its IP address.
    pub fn find_by_ip(&self, ip: &str) -> Option<Peer> {
        self.peers.read().unwrap().iter().find(|p| p.ip == ip).cloned()
    }

    /// All current peers, sorted by IP for stable listing. The order is
    /// not significant to the protocol.
    pub fn snapshot(&self) -> Vec<Peer> {
        let mut peers: Vec<Peer> = self.peers.read().unwrap().iter().cloned().collect();
        peers.sort_by(|a, b| a.ip.cmp(&b.ip));
        peers
    }
}
