// lanchat: decentralized LAN chat over shared-port UDP/TCP with optional
// encrypted file transfer.

use lanchat::{config, discovery, dispatch, listener, logging, netinfo, sender, ui};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lanchat_core::crypto::FileCrypto;
use lanchat_core::peer::PeerRegistry;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    let port_arg = std::env::args().nth(1);
    if matches!(port_arg.as_deref(), Some("--version") | Some("-V")) {
        println!("lanchat {VERSION}");
        return Ok(());
    }

    // Keep the guard alive so the log worker flushes on exit.
    let _guard = logging::init();

    let mut cfg = config::load();
    if let Some(arg) = port_arg {
        match arg.parse::<u16>() {
            Ok(port) if port != 0 => cfg.port = port,
            _ => {
                warn!("invalid port argument {arg:?}, falling back");
                println!("Invalid port provided. Use default port {}", cfg.port);
            }
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(cfg));
    println!("Exited.");
    info!("exited");
    result
}

async fn run(cfg: config::Config) -> anyhow::Result<()> {
    // No identity, no protocol: this failure aborts the process.
    let local =
        netinfo::LocalNetwork::resolve().context("cannot resolve local network identity")?;
    info!(ip = %local.ip_string(), subnet = %local.cidr(), port = cfg.port, "started");

    let registry = Arc::new(PeerRegistry::new());
    let udp = Arc::new(
        sender::UdpSender::bind()
            .await
            .context("cannot create the datagram send socket")?,
    );
    let crypto = Arc::new(FileCrypto::new(&cfg.key_file));
    let encryption = Arc::new(AtomicBool::new(true));
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();

    let dispatcher = Arc::new(dispatch::Dispatcher {
        registry: registry.clone(),
        udp: udp.clone(),
        events: events_tx.clone(),
        crypto: crypto.clone(),
        encryption: encryption.clone(),
        local_ip: local.ip_string(),
        port: cfg.port,
        download_dir: cfg.download_dir.clone(),
    });

    let shutdown = CancellationToken::new();
    let listeners = listener::start(cfg.port, dispatcher, shutdown.clone())
        .await
        .context("cannot bind the listening sockets")?;

    let printer = ui::spawn_printer(events_rx);
    for line in [
        format!("IP Address: {}", local.cidr()),
        format!("Port: {}", cfg.port),
        format!("Subnet Mask: {}", local.netmask()),
    ] {
        let _ = events_tx.send(ui::Event::Info(line));
    }

    // Probe the subnet in the background so the prompt is usable at once.
    {
        let udp = udp.clone();
        let local = local.clone();
        let port = cfg.port;
        tokio::spawn(async move { discovery::probe_subnet(&local, port, &udp).await });
    }

    let console = ui::Ui {
        registry,
        udp,
        crypto,
        encryption,
        events: events_tx,
    };
    tokio::select! {
        result = console.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    // Stop intake and drop the sockets; in-flight work is not drained.
    shutdown.cancel();
    let _ = listeners.udp.await;
    let _ = listeners.tcp.await;
    printer.abort();
    Ok(())
}
