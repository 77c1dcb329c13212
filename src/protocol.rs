//! Low-level FTP command/response codec (RFC 959 §4), server side.
//!
//! Handles:
//! - Reading one command line from the control channel, with truncation
//! - Encoding a reply (3-digit code + text + CRLF), with the single
//!   multi-line exception used by FEAT

use crate::types::LINE_BUFFER;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Read one command line, splitting it into an uppercased verb and the
/// (possibly empty) argument tail.
///
/// Returns `Ok(None)` on EOF. A line longer than [`LINE_BUFFER`] bytes is
/// truncated before being split, matching the documented
/// 1025-bytes-in -> truncated-at-1023 boundary.
pub async fn read_command(
    reader: &mut BufReader<OwnedReadHalf>,
) -> std::io::Result<Option<(String, String)>> {
    let mut buf = Vec::with_capacity(128);
    let n = reader.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.len() > LINE_BUFFER {
        buf.truncate(LINE_BUFFER - 1);
    }
    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }

    let line = String::from_utf8_lossy(&buf).into_owned();
    let mut parts = line.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("").to_ascii_uppercase();
    let args = parts.next().unwrap_or("").trim_start().to_string();
    log::trace!(">>> {} {}", verb, args);
    Ok(Some((verb, args)))
}

/// Send a reply on the control channel.
///
/// Every code is framed as `"<code> <text>\r\n"` except `211`, whose text
/// is expected to already carry its own line breaks and `211 End\r\n`
/// terminator — the one multi-line reply this server sends (FEAT).
pub async fn reply(
    writer: &mut OwnedWriteHalf,
    code: u16,
    text: &str,
) -> std::io::Result<()> {
    let line = if code == 211 {
        format!("{}- {}", code, text)
    } else {
        format!("{} {}\r\n", code, text)
    };
    writer.write_all(line.as_bytes()).await?;
    log::trace!("<<< {} {}", code, text.lines().next().unwrap_or(""));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn loopback() -> (OwnedReadHalf, OwnedWriteHalf) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (_cr, cw) = client.into_split();
        let (sr, _sw) = server.into_split();
        (sr, cw)
    }

    #[tokio::test]
    async fn splits_verb_and_argument() {
        let (sr, mut cw) = loopback().await;
        let mut reader = BufReader::new(sr);
        cw.write_all(b"CWD /tmp\r\n").await.unwrap();
        let (verb, args) = read_command(&mut reader).await.unwrap().unwrap();
        assert_eq!(verb, "CWD");
        assert_eq!(args, "/tmp");
    }

    #[tokio::test]
    async fn verb_with_no_argument() {
        let (sr, mut cw) = loopback().await;
        let mut reader = BufReader::new(sr);
        cw.write_all(b"NOOP\r\n").await.unwrap();
        let (verb, args) = read_command(&mut reader).await.unwrap().unwrap();
        assert_eq!(verb, "NOOP");
        assert_eq!(args, "");
    }

    #[tokio::test]
    async fn truncates_overlong_line() {
        let (sr, mut cw) = loopback().await;
        let mut reader = BufReader::new(sr);
        let mut line = b"STOR ".to_vec();
        line.extend(std::iter::repeat(b'a').take(2000));
        line.extend_from_slice(b"\r\n");
        cw.write_all(&line).await.unwrap();
        let (verb, args) = read_command(&mut reader).await.unwrap().unwrap();
        assert_eq!(verb, "STOR");
        assert_eq!(verb.len() + 1 + args.len(), LINE_BUFFER - 1);
    }

    #[tokio::test]
    async fn eof_yields_none() {
        let (sr, cw) = loopback().await;
        let mut reader = BufReader::new(sr);
        drop(cw);
        assert!(read_command(&mut reader).await.unwrap().is_none());
    }
}
