//! End-to-end scenarios driven against a live server instance bound to an
//! OS-assigned loopback port, exercising the protocol exactly as a real
//! client would see it.

use sorng_ftpd::config::ServerConfig;
use sorng_ftpd::server::Server;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

async fn start_server(root: &std::path::Path) -> SocketAddr {
    let config = ServerConfig {
        bind: Ipv4Addr::LOCALHOST,
        port: 0,
        backlog: 5,
        root: root.to_path_buf(),
        pasv_port_range: None,
    };
    let server = Server::bind(&config).await.expect("bind");
    let addr = server.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

struct Client {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (rd, wr) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(rd),
            writer: wr,
        };
        let greeting = client.read_line().await;
        assert!(greeting.starts_with("200"), "greeting: {}", greeting);
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut buf = String::new();
        self.reader.read_line(&mut buf).await.unwrap();
        buf.trim_end().to_string()
    }

    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_line().await
    }

    fn code(reply: &str) -> u16 {
        reply[..3].parse().unwrap_or(0)
    }

    /// Issue PASV and connect the data channel it advertises.
    async fn pasv_data_channel(&mut self) -> TcpStream {
        let reply = self.command("PASV").await;
        assert_eq!(Client::code(&reply), 227, "PASV reply: {}", reply);
        // The six comma-separated decimal fields are always the last six
        // digit runs in the reply, regardless of the leading "227 ".
        let nums: Vec<u16> = reply
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();
        let n = nums.len();
        assert!(n >= 6, "unexpected PASV reply: {}", reply);
        let octets = [nums[n - 6], nums[n - 5], nums[n - 4], nums[n - 3]];
        let port = nums[n - 2] * 256 + nums[n - 1];
        let ip = std::net::Ipv4Addr::new(
            octets[0] as u8,
            octets[1] as u8,
            octets[2] as u8,
            octets[3] as u8,
        );
        TcpStream::connect((ip, port)).await.expect("data connect")
    }
}

#[tokio::test]
async fn login_and_pwd() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(Client::code(&client.command("USER anyone").await), 230);
    assert_eq!(Client::code(&client.command("PASS anyone").await), 230);
    let pwd = client.command("PWD").await;
    assert_eq!(pwd, "257 \"/\"");
}

#[tokio::test]
async fn mkd_rmd_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    let mkd = client.command("MKD sub").await;
    assert_eq!(Client::code(&mkd), 257);
    assert!(dir.path().join("sub").is_dir());

    let rmd = client.command("RMD sub").await;
    assert_eq!(Client::code(&rmd), 250);
    assert!(!dir.path().join("sub").exists());
}

#[tokio::test]
async fn cwd_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(Client::code(&client.command("CWD ../../etc").await), 553);
    assert_eq!(Client::code(&client.command("CWD //tmp").await), 553);
}

#[tokio::test]
async fn port_rejects_out_of_range_octet() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    let reply = client.command("PORT 127,0,0,1,256,0").await;
    assert_eq!(Client::code(&reply), 501);
}

#[tokio::test]
async fn stor_then_retr_round_trips_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;
    let payload = b"the quick brown fox jumps over the lazy dog".repeat(100);

    let mut data = client.pasv_data_channel().await;
    let reply150 = client.command("STOR upload.bin").await;
    assert_eq!(Client::code(&reply150), 150);
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();
    let reply226 = client.read_line().await;
    assert_eq!(Client::code(&reply226), 226);

    let mut data = client.pasv_data_channel().await;
    let reply150 = client.command("RETR upload.bin").await;
    assert_eq!(Client::code(&reply150), 150);
    let mut received = Vec::new();
    data.read_to_end(&mut received).await.unwrap();
    let reply226 = client.read_line().await;
    assert_eq!(Client::code(&reply226), 226);

    assert_eq!(received, payload);
}

#[tokio::test]
async fn rnfr_sequencing_is_cleared_by_intervening_command() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(Client::code(&client.command("RNFR a.txt").await), 350);
    assert_eq!(Client::code(&client.command("NOOP").await), 200);
    // RNTO after an intervening non-RNTO command must fail sequencing.
    assert_eq!(Client::code(&client.command("RNTO b.txt").await), 503);

    assert_eq!(Client::code(&client.command("RNFR a.txt").await), 350);
    assert_eq!(Client::code(&client.command("RNTO b.txt").await), 250);
    assert!(dir.path().join("b.txt").exists());
}

#[tokio::test]
async fn list_reports_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..25 {
        std::fs::write(dir.path().join(format!("file{i}.txt")), b"x").unwrap();
    }
    let addr = start_server(dir.path()).await;
    let mut client = Client::connect(addr).await;

    let mut data = client.pasv_data_channel().await;
    let reply150 = client.command("LIST").await;
    assert_eq!(Client::code(&reply150), 150);
    let mut raw = Vec::new();
    data.read_to_end(&mut raw).await.unwrap();
    let reply226 = client.read_line().await;
    assert_eq!(Client::code(&reply226), 226);

    let text = String::from_utf8(raw).unwrap();
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 25);
}
