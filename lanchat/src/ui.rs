//! Console front end: renders incoming events and turns user commands
//! into outbound sends. The core surfaces everything through the [`Event`]
//! channel; nothing else crosses this boundary.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use lanchat_core::crypto::FileCrypto;
use lanchat_core::peer::{Peer, PeerRegistry};
use lanchat_core::protocol::Header;

use crate::sender::{self, UdpSender};

const PROMPT: &str = "> ";

const CMD_ENCRYPT: &str = "\\e";
const CMD_FILE: &str = "\\f";
const CMD_GENKEY: &str = "\\g";
const CMD_HELP: &str = "\\h";
const CMD_LIST: &str = "\\l";
const CMD_CHAT_PRIV: &str = "\\p";
const CMD_EXIT: &str = "\\x";

/// Everything the core reports to the user.
#[derive(Debug)]
pub enum Event {
    Joined(Peer),
    Left(Peer),
    Chat {
        from: Peer,
        text: String,
        private: bool,
    },
    FileReceived {
        name: String,
        from: String,
    },
    Info(String),
    Error(String),
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Joined(peer) => write!(f, "{peer} joined."),
            Event::Left(peer) => write!(f, "{peer} left."),
            Event::Chat {
                from,
                text,
                private: false,
            } => write!(f, "{from}: {text}"),
            Event::Chat { from, text, .. } => write!(f, "{from}[PRIV]: {text}"),
            Event::FileReceived { name, from } => {
                write!(f, "Received file {name} from {from}")
            }
            Event::Info(text) | Event::Error(text) => f.write_str(text),
        }
    }
}

/// Drain the event channel onto the console, redrawing the prompt after
/// every line.
pub fn spawn_printer(mut rx: UnboundedReceiver<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print!("\r{event}\n{PROMPT}");
            let _ = std::io::stdout().flush();
        }
    })
}

/// The interactive command loop.
pub struct Ui {
    pub registry: Arc<PeerRegistry>,
    pub udp: Arc<UdpSender>,
    pub crypto: Arc<FileCrypto>,
    pub encryption: Arc<AtomicBool>,
    pub events: UnboundedSender<Event>,
}

impl Ui {
    /// Read commands until `\x` or end of input. Returns after the BYE
    /// broadcast; the caller tears the listeners down.
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.display(Event::Info("Type \\h for help at anytime.".into()));
        while let Some(line) = lines.next_line().await? {
            let command = line.split(' ').next().unwrap_or("").to_lowercase();
            match command.as_str() {
                CMD_HELP => self.help(),
                CMD_LIST => {
                    for peer in self.registry.snapshot() {
                        self.display(Event::Info(peer.to_string()));
                    }
                }
                CMD_EXIT => {
                    self.say_goodbye().await;
                    return Ok(());
                }
                CMD_CHAT_PRIV => self.private_chat(&line).await,
                CMD_FILE => self.file_send(&line),
                CMD_GENKEY => match self.crypto.generate_key() {
                    Ok(()) => self.display(Event::Info(format!(
                        "Generated a secret key saved at {}",
                        self.crypto.key_path().display()
                    ))),
                    Err(e) => self.display(Event::Error(format!("Unable to generate key: {e}"))),
                },
                CMD_ENCRYPT => {
                    let enabled = !self.encryption.fetch_xor(true, Ordering::Relaxed);
                    self.display(Event::Info(format!("Encryption is enabled: {enabled}")));
                }
                // Anything else is a public chat line.
                _ => {
                    if !line.trim().is_empty() {
                        self.udp
                            .send_to_all(&self.registry.snapshot(), Header::Chat, &line)
                            .await;
                    }
                }
            }
            print!("{PROMPT}");
            let _ = std::io::stdout().flush();
        }
        // End of input counts as an exit.
        self.say_goodbye().await;
        Ok(())
    }

    async fn say_goodbye(&self) {
        self.udp
            .send_to_all(&self.registry.snapshot(), Header::Bye, "")
            .await;
    }

    async fn private_chat(&self, line: &str) {
        let mut args = line.splitn(3, ' ').skip(1);
        let (Some(ip), Some(text)) = (args.next(), args.next()) else {
            self.display(Event::Info("Invalid input".into()));
            return;
        };
        match self.registry.find_by_ip(ip) {
            Some(peer) => self.udp.send(&peer, Header::ChatPriv, text).await,
            None => self.display(Event::Info(format!("Unknown peer {ip}"))),
        }
    }

    // File sends run in their own task; the command loop never waits on a
    // transfer.
    fn file_send(&self, line: &str) {
        let mut args = line.splitn(3, ' ').skip(1);
        let (Some(ip), Some(filename)) = (args.next(), args.next()) else {
            self.display(Event::Info("Invalid input".into()));
            return;
        };
        let Some(peer) = self.registry.find_by_ip(ip) else {
            self.display(Event::Info(format!("Unknown peer {ip}")));
            return;
        };
        let path = PathBuf::from(filename);
        let crypto = self.crypto.clone();
        let encryption = self.encryption.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = match sender::send_file(&peer, &path, &crypto, &encryption).await {
                Ok(()) => Event::Info(format!("Sent {} to {peer}", path.display())),
                Err(e) => Event::Error(format!("Error while trying to send file: {e:#}")),
            };
            let _ = events.send(event);
        });
    }

    fn help(&self) {
        for line in [
            "\\e    Enable/disable encryption",
            "\\f    Send a file [format: <ip> <filename>]",
            "\\g    Generate a secret key for encryption",
            "\\h    Help",
            "\\l    List all connected peers",
            "\\p    Chat private [format: <ip> <message>]",
            "\\x    Exit",
        ] {
            self.display(Event::Info(line.into()));
        }
    }

    fn display(&self, event: Event) {
        let _ = self.events.send(event);
    }
}
