//! Local network identity: the interface address and the subnet around it.

use std::net::Ipv4Addr;

use anyhow::{bail, Context, Result};
use ipnetwork::Ipv4Network;

/// The local IPv4 identity and its surrounding subnet. Resolved once at
/// startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct LocalNetwork {
    ip: Ipv4Addr,
    network: Ipv4Network,
}

impl LocalNetwork {
    /// Pick the first non-loopback IPv4 interface. Failure here is fatal:
    /// without a local identity the dispatcher cannot tell self from peer.
    pub fn resolve() -> Result<Self> {
        let interfaces =
            if_addrs::get_if_addrs().context("cannot enumerate network interfaces")?;
        for iface in interfaces {
            if iface.is_loopback() {
                continue;
            }
            if let if_addrs::IfAddr::V4(v4) = iface.addr {
                let network = Ipv4Network::with_netmask(v4.ip, v4.netmask)
                    .with_context(|| format!("invalid netmask on interface {}", iface.name))?;
                return Ok(Self { ip: v4.ip, network });
            }
        }
        bail!("no usable IPv4 interface found")
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn ip_string(&self) -> String {
        self.ip.to_string()
    }

    /// CIDR form of the local subnet, for the startup banner.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.ip, self.network.prefix())
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.network.mask()
    }

    /// Every host address in the local subnet except our own address, the
    /// network address and the broadcast address: the candidate list for
    /// the initial HELLO probe.
    pub fn candidate_addresses(&self) -> Vec<Ipv4Addr> {
        let network = self.network.network();
        let broadcast = self.network.broadcast();
        self.network
            .iter()
            .filter(|a| *a != self.ip && *a != network && *a != broadcast)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_subnet(ip: &str, netmask: &str) -> LocalNetwork {
        let ip: Ipv4Addr = ip.parse().unwrap();
        let netmask: Ipv4Addr = netmask.parse().unwrap();
        LocalNetwork {
            ip,
            network: Ipv4Network::with_netmask(ip, netmask).unwrap(),
        }
    }

    #[test]
    fn candidates_exclude_self_network_broadcast() {
        let local = with_subnet("192.168.1.5", "255.255.255.0");
        let candidates = local.candidate_addresses();
        assert_eq!(candidates.len(), 253);
        assert!(!candidates.contains(&"192.168.1.5".parse().unwrap()));
        assert!(!candidates.contains(&"192.168.1.0".parse().unwrap()));
        assert!(!candidates.contains(&"192.168.1.255".parse().unwrap()));
        assert!(candidates.contains(&"192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn cidr_banner_form() {
        let local = with_subnet("10.1.2.3", "255.255.0.0");
        assert_eq!(local.cidr(), "10.1.2.3/16");
    }
}
