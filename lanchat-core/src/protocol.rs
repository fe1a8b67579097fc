//! Chat wire protocol: header words and the message value type.

use std::fmt;

/// Fixed token carried by every wire message. Filters out foreign traffic
/// sharing the port; it is not a credential.
pub const TOKEN: &str = "27111991";

/// Field separator in the text format.
pub const DELIMITER: &str = " ";

/// All message types of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    /// Greeting sent to candidate addresses during discovery.
    Hello,
    /// Reply to a greeting. Never triggers a further reply.
    HelloAck,
    /// Graceful leave.
    Bye,
    /// Public chat text.
    Chat,
    /// Private chat text, unicast to one peer.
    ChatPriv,
    /// File transfer announcement; the payload follows on the stream.
    File,
}

impl Header {
    /// The word used on the wire for this header.
    pub fn as_wire(self) -> &'static str {
        match self {
            Header::Hello => "HELLO",
            Header::HelloAck => "HI",
            Header::Bye => "BYE",
            Header::Chat => "MSG",
            Header::ChatPriv => "MSG_PRIV",
            Header::File => "FILE",
        }
    }

    /// Parse a wire word. Unknown words have no header.
    pub fn from_wire(word: &str) -> Option<Header> {
        match word {
            "HELLO" => Some(Header::Hello),
            "HI" => Some(Header::HelloAck),
            "BYE" => Some(Header::Bye),
            "MSG" => Some(Header::Chat),
            "MSG_PRIV" => Some(Header::ChatPriv),
            "FILE" => Some(Header::File),
            _ => None,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A decoded protocol message. The source IP is populated by the transport
/// layer on receive, never by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub data: String,
    pub src_ip: String,
}

impl Message {
    pub fn new(header: Header, data: impl Into<String>) -> Self {
        Self {
            header,
            data: data.into(),
            src_ip: String::new(),
        }
    }

    /// Attach the transport-observed source address.
    pub fn with_source(mut self, src_ip: impl Into<String>) -> Self {
        self.src_ip = src_ip.into();
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.header, DELIMITER, self.data)
    }
}
