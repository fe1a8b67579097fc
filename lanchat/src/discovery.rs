//! Initial peer discovery: one HELLO datagram to every candidate address
//! in the local subnet. Best effort; peers answer with an ack and no
//! further probing happens after startup.

use tracing::info;

use lanchat_core::peer::Peer;
use lanchat_core::protocol::Header;

use crate::netinfo::LocalNetwork;
use crate::sender::UdpSender;

pub async fn probe_subnet(local: &LocalNetwork, port: u16, udp: &UdpSender) {
    let candidates = local.candidate_addresses();
    info!("checking {} subnet addresses for online peers", candidates.len());
    for addr in candidates {
        udp.send(&Peer::new(addr.to_string(), port), Header::Hello, "")
            .await;
    }
    info!("subnet probe finished");
}
