//! Data-channel socket helpers: passive bind, active connect, and the
//! PORT/PASV argument codec.

use crate::error::{FtpError, FtpResult};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::{TcpListener, TcpStream};

/// An inclusive port range used when cycling passive ports on a firewalled
/// deployment, rather than letting the OS assign an ephemeral one.
#[derive(Debug, Clone, Copy)]
pub struct PasvPortRange {
    pub start: u16,
    pub end: u16,
}

/// Bind a passive-mode listener.
///
/// With no configured range, binds an OS-assigned ephemeral port. With a
/// range, cycles through it starting from the next port after the last one
/// handed out, wrapping at the end back to `start`.
pub async fn bind_passive(
    bind_ip: Ipv4Addr,
    range: Option<PasvPortRange>,
    next_port: &mut u16,
) -> FtpResult<TcpListener> {
    match range {
        None => TcpListener::bind((bind_ip, 0))
            .await
            .map_err(|e| FtpError::bind(format!("PASV bind: {}", e))),
        Some(range) => {
            let span = range.end - range.start + 1;
            for _ in 0..span {
                let port = *next_port;
                *next_port = if port >= range.end {
                    range.start
                } else {
                    port + 1
                };
                if let Ok(listener) = TcpListener::bind((bind_ip, port)).await {
                    return Ok(listener);
                }
            }
            Err(FtpError::bind(format!(
                "no free PASV port in {}..={}",
                range.start, range.end
            )))
        }
    }
}

/// Connect the active-mode (PORT) data channel.
pub async fn connect_active(peer: SocketAddr) -> FtpResult<TcpStream> {
    let stream = TcpStream::connect(peer)
        .await
        .map_err(|e| FtpError::data_channel(format!("PORT connect to {}: {}", peer, e)))?;
    stream.set_nodelay(true).ok();
    Ok(stream)
}

/// Format the `227` reply body: `h1,h2,h3,h4,p1,p2`.
pub fn format_pasv_reply(addr: SocketAddrV4) -> String {
    let octets = addr.ip().octets();
    let port = addr.port();
    format!(
        "{},{},{},{},{},{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

/// Parse a `PORT` command argument: exactly six comma-separated decimal
/// octets, each in `0..=255`.
pub fn parse_port_arg(arg: &str) -> Option<SocketAddr> {
    let parts: Vec<&str> = arg.split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let nums: Vec<u16> = parts
        .iter()
        .map(|p| p.trim().parse::<u16>().ok())
        .collect::<Option<Vec<_>>>()?;
    if nums.iter().any(|&n| n > 255) {
        return None;
    }
    let ip = Ipv4Addr::new(nums[0] as u8, nums[1] as u8, nums[2] as u8, nums[3] as u8);
    let port = nums[4] * 256 + nums[5];
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_port_argument() {
        let addr = parse_port_arg("127,0,0,1,195,80").unwrap();
        assert_eq!(addr, "127.0.0.1:50000".parse().unwrap());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(parse_port_arg("127,0,0,1,0").is_none());
        assert!(parse_port_arg("127,0,0,1,0,0,0").is_none());
    }

    #[test]
    fn rejects_octet_out_of_range() {
        assert!(parse_port_arg("127,0,0,1,256,0").is_none());
    }

    #[test]
    fn formats_pasv_reply() {
        let addr: SocketAddrV4 = "10.0.0.2:5120".parse().unwrap();
        assert_eq!(format_pasv_reply(addr), "10,0,0,2,20,0");
    }
}
