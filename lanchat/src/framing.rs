//! Length-prefixed strings on stream connections: a 2-byte big-endian
//! length followed by that many UTF-8 bytes. File sizes travel as 8-byte
//! big-endian integers via `read_u64`/`write_u64` at the call sites.

use std::io::{Error, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub async fn write_string<W: AsyncWrite + Unpin>(w: &mut W, s: &str) -> std::io::Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(Error::new(ErrorKind::InvalidInput, "string too long for the wire"));
    }
    w.write_u16(bytes.len() as u16).await?;
    w.write_all(bytes).await
}

pub async fn read_string<R: AsyncRead + Unpin>(r: &mut R) -> std::io::Result<String> {
    let len = r.read_u16().await? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip() {
        let (mut a, mut b) = tokio::io::duplex(256);
        write_string(&mut a, "FILE").await.unwrap();
        write_string(&mut a, "notes with spaces.txt").await.unwrap();
        assert_eq!(read_string(&mut b).await.unwrap(), "FILE");
        assert_eq!(read_string(&mut b).await.unwrap(), "notes with spaces.txt");
    }

    #[tokio::test]
    async fn empty_string() {
        let (mut a, mut b) = tokio::io::duplex(16);
        write_string(&mut a, "").await.unwrap();
        assert_eq!(read_string(&mut b).await.unwrap(), "");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(16);
        a.write_u16(2).await.unwrap();
        a.write_all(&[0xff, 0xfe]).await.unwrap();
        assert!(read_string(&mut b).await.is_err());
    }
}
