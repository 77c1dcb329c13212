//! Per-connection session state machine.
//!
//! One [`Session`] is spawned as its own task per accepted client. The task
//! body, [`Session::run`], sequentially drives the session through
//! `Command` -> `DataConnect` -> `DataTransfer` -> `Command`, which is the
//! async replacement for polling three file descriptors once per tick: the
//! scheduler itself provides the "wait for readiness, then take one step"
//! discipline the original's manual poll loop implemented by hand.

use crate::connection::PasvPortRange;
use crate::dispatch;
use crate::protocol;
use crate::transfer::{self, TransferError};
use crate::types::{DataMode, SessionState, TransferKind};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub struct Session {
    pub id: u64,
    pub cwd: String,
    pub root: PathBuf,
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
    pub data_mode: DataMode,
    pub data: Option<TcpStream>,
    pub binary: bool,
    pub rename_pending: Option<String>,
    pub state: SessionState,
    pub transfer: Option<TransferKind>,
    pub pasv_bind_ip: Ipv4Addr,
    pub pasv_range: Option<PasvPortRange>,
    pub pasv_next_port: u16,
}

impl Session {
    pub fn new(
        id: u64,
        stream: TcpStream,
        root: PathBuf,
        pasv_bind_ip: Ipv4Addr,
        pasv_range: Option<PasvPortRange>,
    ) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            id,
            cwd: "/".to_string(),
            root,
            reader: BufReader::new(rd),
            writer: wr,
            data_mode: DataMode::None,
            data: None,
            binary: true,
            rename_pending: None,
            state: SessionState::Command,
            transfer: None,
            pasv_bind_ip,
            pasv_range,
            pasv_next_port: pasv_range.map(|r| r.start).unwrap_or(0),
        }
    }

    /// Re-root a sandbox-resolved virtual path under the served directory.
    pub fn fs_path(&self, virtual_path: &str) -> PathBuf {
        self.root.join(virtual_path.trim_start_matches('/'))
    }

    pub async fn reply(&mut self, code: u16, text: &str) -> std::io::Result<()> {
        protocol::reply(&mut self.writer, code, text).await
    }

    /// Transition to `new`, releasing whatever sockets that state no
    /// longer needs. See the state diagram in the module docs.
    pub fn set_state(&mut self, new: SessionState) {
        match new {
            SessionState::Command => {
                self.data_mode = DataMode::None;
                self.data = None;
            }
            SessionState::DataConnect => {
                self.data = None;
            }
            SessionState::DataTransfer => {
                if matches!(self.data_mode, DataMode::Passive(_)) {
                    self.data_mode = DataMode::None;
                }
            }
        }
        self.state = new;
    }

    /// Drive this session to completion. Returns once the control
    /// connection is closed, by either side, or a fatal I/O error occurs.
    pub async fn run(mut self) {
        if self.reply(200, "Hello!").await.is_err() {
            return;
        }

        loop {
            match self.state {
                SessionState::Command => {
                    if !self.step_command().await {
                        return;
                    }
                }
                SessionState::DataConnect => {
                    if !self.step_data_connect().await {
                        return;
                    }
                }
                SessionState::DataTransfer => {
                    if !self.step_data_transfer().await {
                        return;
                    }
                }
            }
        }
    }

    /// Returns `false` when the session should end.
    async fn step_command(&mut self) -> bool {
        match protocol::read_command(&mut self.reader).await {
            Ok(Some((verb, args))) => {
                if verb != "RNTO" {
                    self.rename_pending = None;
                }
                if dispatch::dispatch(self, &verb, &args).await.is_err() {
                    log::warn!("session {}: control channel write failed", self.id);
                    return false;
                }
                verb != "QUIT"
            }
            Ok(None) => {
                log::info!("session {}: client closed control connection", self.id);
                false
            }
            Err(e) => {
                log::warn!("session {}: control channel read error: {}", self.id, e);
                false
            }
        }
    }

    async fn step_data_connect(&mut self) -> bool {
        let accepted = match &self.data_mode {
            DataMode::Passive(listener) => listener.accept().await,
            _ => {
                self.set_state(SessionState::Command);
                return true;
            }
        };
        match accepted {
            Ok((stream, peer)) => {
                log::debug!("session {}: data connection from {}", self.id, peer);
                self.data = Some(stream);
                self.set_state(SessionState::DataTransfer);
                self.reply(150, "Ready").await.is_ok()
            }
            Err(e) => {
                log::warn!("session {}: data accept failed: {}", self.id, e);
                self.set_state(SessionState::Command);
                self.reply(425, "Failed to establish connection").await.is_ok()
            }
        }
    }

    async fn step_data_transfer(&mut self) -> bool {
        let result = transfer::run(self).await;
        self.set_state(SessionState::Command);
        let (code, text): (u16, String) = match result {
            Ok(()) => (226, "Transfer complete".to_string()),
            Err(TransferError::Local(msg)) => (451, msg),
            Err(TransferError::Broken(msg)) => (426, msg),
            Err(TransferError::Unavailable(msg)) => (550, format!("unavailable: {}", msg)),
        };
        self.reply(code, &text).await.is_ok()
    }
}
