//! Text codec: `<TOKEN> <HEADER> <DATA>`, one message per datagram.

use crate::protocol::{Header, Message, DELIMITER, TOKEN};

/// Encode a header and data into a payload line.
/// Data may contain spaces; it is carried as the rest of the line.
pub fn encode(header: Header, data: &str) -> String {
    format!("{TOKEN}{DELIMITER}{}{DELIMITER}{data}", header.as_wire())
}

/// Decode one received payload. `None` is the only failure signal: callers
/// treat it as a silent drop, not an error. Strips a single trailing
/// newline, splits on the first two spaces, and requires the fixed token
/// and a known header word.
pub fn decode(payload: &str) -> Option<Message> {
    let payload = payload.strip_suffix('\n').unwrap_or(payload);
    let mut fields = payload.splitn(3, ' ');
    let token = fields.next()?;
    let header = fields.next()?;
    if token != TOKEN {
        return None;
    }
    let header = Header::from_wire(header)?;
    let data = fields.next().unwrap_or("");
    Some(Message::new(header, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_HEADERS: [Header; 6] = [
        Header::Hello,
        Header::HelloAck,
        Header::Bye,
        Header::Chat,
        Header::ChatPriv,
        Header::File,
    ];

    #[test]
    fn roundtrip_all_headers() {
        for header in ALL_HEADERS {
            let msg = decode(&encode(header, "some payload")).unwrap();
            assert_eq!(msg.header, header);
            assert_eq!(msg.data, "some payload");
        }
    }

    #[test]
    fn roundtrip_data_with_spaces() {
        let msg = decode(&encode(Header::Chat, "hello world, again")).unwrap();
        assert_eq!(msg.header, Header::Chat);
        assert_eq!(msg.data, "hello world, again");
    }

    #[test]
    fn roundtrip_empty_data() {
        let msg = decode(&encode(Header::Hello, "")).unwrap();
        assert_eq!(msg.header, Header::Hello);
        assert_eq!(msg.data, "");
    }

    #[test]
    fn trailing_newline_stripped() {
        let msg = decode("27111991 MSG hi\n").unwrap();
        assert_eq!(msg.header, Header::Chat);
        assert_eq!(msg.data, "hi");
        // Only one newline is stripped; the rest stays in the data.
        let msg = decode("27111991 MSG hi\n\n").unwrap();
        assert_eq!(msg.data, "hi\n");
    }

    #[test]
    fn rejects_wrong_token() {
        assert!(decode("12345678 MSG hi").is_none());
        assert!(decode("27111990 HELLO").is_none());
    }

    #[test]
    fn rejects_short_payloads() {
        assert!(decode("").is_none());
        assert!(decode("27111991").is_none());
        assert!(decode("garbage").is_none());
    }

    #[test]
    fn rejects_unknown_header() {
        assert!(decode("27111991 PING data").is_none());
    }

    #[test]
    fn token_only_with_header_and_no_data() {
        let msg = decode("27111991 BYE").unwrap();
        assert_eq!(msg.header, Header::Bye);
        assert_eq!(msg.data, "");
    }
}
