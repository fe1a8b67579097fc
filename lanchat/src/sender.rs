//! Outbound senders: unicast/broadcast datagrams and stream file sends.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tracing::{debug, error};

use lanchat_core::crypto::FileCrypto;
use lanchat_core::peer::Peer;
use lanchat_core::protocol::Header;
use lanchat_core::wire;

use crate::framing;

/// Datagram sender: one ephemeral-port socket shared by every outbound
/// send for the life of the process.
pub struct UdpSender {
    socket: UdpSocket,
}

impl UdpSender {
    pub async fn bind() -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        Ok(Self { socket })
    }

    /// Encode and transmit one message. Failures (unreachable destination,
    /// resolution) are logged and swallowed; nothing is retried.
    pub async fn send(&self, peer: &Peer, header: Header, data: &str) {
        let payload = wire::encode(header, data);
        match self
            .socket
            .send_to(payload.as_bytes(), (peer.ip(), peer.port()))
            .await
        {
            Ok(_) => debug!(peer = %peer, %header, "sent datagram"),
            Err(e) => error!(peer = %peer, %header, "unable to send datagram: {e}"),
        }
    }

    /// Broadcast by iteration: an independent unicast send per peer.
    pub async fn send_to_all(&self, peers: &[Peer], header: Header, data: &str) {
        for peer in peers {
            self.send(peer, header, data).await;
        }
    }
}

/// Send one file over a fresh stream connection: the FILE word, the file's
/// base name, the payload length, then the payload. The whole file is read
/// into memory and, when the toggle is set, encrypted as one block before
/// any byte hits the wire. A failure aborts this transfer only.
pub async fn send_file(
    peer: &Peer,
    path: &Path,
    crypto: &FileCrypto,
    encryption: &AtomicBool,
) -> Result<()> {
    let mut data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    // The toggle is read once; this transfer behaves consistently even if
    // it is flipped mid-flight.
    if encryption.load(Ordering::Relaxed) {
        data = crypto.encrypt(&data).context("encryption failed")?;
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("file has no usable name")?;

    let mut stream = TcpStream::connect((peer.ip(), peer.port()))
        .await
        .with_context(|| format!("cannot connect to {peer}"))?;
    framing::write_string(&mut stream, Header::File.as_wire()).await?;
    framing::write_string(&mut stream, name).await?;
    stream.write_u64(data.len() as u64).await?;
    stream.write_all(&data).await?;
    stream.flush().await?;
    debug!(peer = %peer, file = name, bytes = data.len(), "file sent");
    Ok(())
}
