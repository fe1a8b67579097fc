//! Maps decoded messages to registry, sender and storage actions.
//! Stateless per invocation: there is no session state beyond the peer
//! registry, so every unit is processed independently.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

use lanchat_core::crypto::FileCrypto;
use lanchat_core::peer::{Peer, PeerRegistry};
use lanchat_core::protocol::{Header, Message};

use crate::framing;
use crate::sender::UdpSender;
use crate::ui::Event;

/// One received unit of work.
pub enum Inbound {
    /// Decoded datagram, source address filled in by the listener.
    Datagram(Message),
    /// A protocol word that arrived over a live connection. FILE keeps
    /// reading its payload from the stream; every other header is handled
    /// like a datagram with empty data.
    Stream {
        header: Header,
        stream: TcpStream,
        src_ip: String,
    },
}

pub struct Dispatcher {
    pub registry: Arc<PeerRegistry>,
    pub udp: Arc<UdpSender>,
    pub events: UnboundedSender<Event>,
    pub crypto: Arc<FileCrypto>,
    pub encryption: Arc<AtomicBool>,
    /// Local identity, written once at startup.
    pub local_ip: String,
    /// The application port; peers are registered with it, not with the
    /// source port of the datagram they arrived on.
    pub port: u16,
    pub download_dir: PathBuf,
}

impl Dispatcher {
    /// Handle one received unit. Every failure is caught here, logged and
    /// dropped: a bad message never terminates a listener loop or affects
    /// other messages.
    pub async fn dispatch(&self, inbound: Inbound) {
        let outcome = match inbound {
            Inbound::Datagram(msg) => {
                debug!(header = %msg.header, from = %msg.src_ip, "received message");
                self.handle_message(msg).await
            }
            Inbound::Stream {
                header: Header::File,
                stream,
                src_ip,
            } => self.receive_file(stream, src_ip).await,
            Inbound::Stream { header, src_ip, .. } => {
                self.handle_message(Message::new(header, "").with_source(src_ip))
                    .await
            }
        };
        if let Err(e) = outcome {
            error!("error while processing message: {e:#}");
            self.announce(Event::Error(format!("Error while processing message: {e:#}")));
        }
    }

    async fn handle_message(&self, msg: Message) -> Result<()> {
        match msg.header {
            Header::Hello => self.on_hello(&msg).await,
            Header::HelloAck => self.on_hello_ack(&msg),
            Header::Bye => self.on_bye(&msg),
            Header::Chat => self.on_chat(&msg, false),
            Header::ChatPriv => self.on_chat(&msg, true),
            Header::File => {
                // A FILE word in a datagram has no stream to read from.
                debug!(from = %msg.src_ip, "FILE header outside a stream, dropped");
                Ok(())
            }
        }
    }

    async fn on_hello(&self, msg: &Message) -> Result<()> {
        if msg.src_ip == self.local_ip {
            // No self-messaging.
            return Ok(());
        }
        let peer = Peer::new(&msg.src_ip, self.port);
        if self.registry.add(peer.clone()) {
            self.announce(Event::Joined(peer.clone()));
        }
        // One-step handshake: always ack; acks themselves are never acked.
        self.udp.send(&peer, Header::HelloAck, "").await;
        Ok(())
    }

    fn on_hello_ack(&self, msg: &Message) -> Result<()> {
        if msg.src_ip == self.local_ip {
            return Ok(());
        }
        let peer = Peer::new(&msg.src_ip, self.port);
        if self.registry.add(peer.clone()) {
            self.announce(Event::Joined(peer));
        }
        Ok(())
    }

    fn on_bye(&self, msg: &Message) -> Result<()> {
        let peer = Peer::new(&msg.src_ip, self.port);
        if self.registry.remove(&peer) {
            self.announce(Event::Left(peer));
        }
        Ok(())
    }

    fn on_chat(&self, msg: &Message, private: bool) -> Result<()> {
        let peer = Peer::new(&msg.src_ip, self.port);
        // Lazy registration: chat from an unseen IP counts as a join.
        if self.registry.add(peer.clone()) {
            self.announce(Event::Joined(peer.clone()));
        }
        self.announce(Event::Chat {
            from: peer,
            text: msg.data.clone(),
            private,
        });
        Ok(())
    }

    async fn receive_file(&self, mut stream: TcpStream, src_ip: String) -> Result<()> {
        let name = framing::read_string(&mut stream)
            .await
            .context("reading file name")?;
        let size = stream.read_u64().await.context("reading file size")?;
        // The sender's file name is used verbatim, path components
        // included; nothing is sandboxed here.
        let path = self.download_dir.join(&name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("creating {}", path.display()))?;
        let received = tokio::io::copy(&mut (&mut stream).take(size), &mut file)
            .await
            .context("copying file contents")?;
        file.flush().await?;
        drop(file);
        if received < size {
            warn!(file = %name, expected = size, received, "transfer ended early");
        }
        self.announce(Event::FileReceived {
            name: name.clone(),
            from: src_ip,
        });
        if self.encryption.load(Ordering::Relaxed) {
            self.crypto
                .decrypt_file(&path)
                .with_context(|| format!("decrypting {}", path.display()))?;
        }
        Ok(())
    }

    fn announce(&self, event: Event) {
        // The UI may already be gone during shutdown; that is fine.
        let _ = self.events.send(event);
    }
}
