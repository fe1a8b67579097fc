//! The dual transport listeners: a datagram receive loop and a stream
//! accept loop sharing one port number, each feeding its own bounded
//! worker pool so processing one message never delays intake of the next.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use lanchat_core::protocol::Header;
use lanchat_core::wire;

use crate::dispatch::{Dispatcher, Inbound};
use crate::framing;
use crate::pool::{WorkerPool, DEFAULT_WORKERS};

/// Datagram receive buffer. Longer datagrams are truncated silently.
const RECV_BUFFER: usize = 1024;

/// Join handles and bound addresses of the two listener loops.
pub struct Listeners {
    pub udp: JoinHandle<()>,
    pub tcp: JoinHandle<()>,
    pub udp_addr: SocketAddr,
    pub tcp_addr: SocketAddr,
}

/// Bind both sockets on `port` and start the loops. A bind failure is
/// returned to the caller, which treats it as fatal at startup.
pub async fn start(
    port: u16,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
) -> std::io::Result<Listeners> {
    let udp_socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    let tcp_listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let udp_addr = udp_socket.local_addr()?;
    let tcp_addr = tcp_listener.local_addr()?;
    let udp = tokio::spawn(datagram_loop(udp_socket, dispatcher.clone(), shutdown.clone()));
    let tcp = tokio::spawn(stream_loop(tcp_listener, dispatcher, shutdown));
    Ok(Listeners {
        udp,
        tcp,
        udp_addr,
        tcp_addr,
    })
}

async fn datagram_loop(
    socket: UdpSocket,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
) {
    info!("listening for datagrams");
    let mut pool = WorkerPool::new(DEFAULT_WORKERS);
    let mut buf = [0u8; RECV_BUFFER];
    loop {
        let (len, from) = tokio::select! {
            // Cancellation is normal termination, not a failure.
            _ = shutdown.cancelled() => {
                debug!("datagram listener closed");
                break;
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok(r) => r,
                Err(e) => {
                    error!("datagram receive failed: {e}");
                    break;
                }
            }
        };
        let raw = String::from_utf8_lossy(&buf[..len]).into_owned();
        let dispatcher = dispatcher.clone();
        pool.submit(async move {
            if let Some(msg) = wire::decode(&raw) {
                let msg = msg.with_source(from.ip().to_string());
                dispatcher.dispatch(Inbound::Datagram(msg)).await;
            }
        });
    }
    // Dropping the socket releases the port; queued work is abandoned.
    pool.shutdown();
}

async fn stream_loop(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
) {
    info!("listening for stream connections");
    let mut pool = WorkerPool::new(DEFAULT_WORKERS);
    loop {
        let (stream, from) = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("stream listener closed");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(r) => r,
                Err(e) => {
                    error!("stream accept failed: {e}");
                    break;
                }
            }
        };
        let dispatcher = dispatcher.clone();
        // The protocol word is read in the worker, off the accept path.
        pool.submit(async move {
            let mut stream = stream;
            let word = match framing::read_string(&mut stream).await {
                Ok(word) => word,
                Err(e) => {
                    debug!(%from, "dropping connection: {e}");
                    return;
                }
            };
            match Header::from_wire(&word) {
                Some(header) => {
                    dispatcher
                        .dispatch(Inbound::Stream {
                            header,
                            stream,
                            src_ip: from.ip().to_string(),
                        })
                        .await;
                }
                None => debug!(%from, word, "unrecognized protocol word, dropped"),
            }
        });
    }
    pool.shutdown();
}
