//! Shared enums and size constants for the FTP session engine.

use std::net::SocketAddr;
use tokio::fs::{DirEntry, File};
use tokio::net::TcpListener;

/// Maximum bytes accepted for a single command line before truncation.
pub const LINE_BUFFER: usize = 1024;
/// Chunk size used for directory-listing and STOR writes.
pub const XFER_CHUNK: usize = 32 * 1024;
/// Chunk size used for RETR reads.
pub const FILE_CHUNK: usize = 64 * 1024;

/// Which of the three states a session's control/data channels are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Awaiting and dispatching a command line.
    Command,
    /// A transfer command armed a passive listener; waiting for the peer
    /// to connect.
    DataConnect,
    /// A data connection is open and a transfer is being driven.
    DataTransfer,
}

/// The data-channel mode currently selected for a session, replacing the
/// `PASV_READY`/`PORT_READY` flag pair plus the two address fields they
/// guarded.
pub enum DataMode {
    None,
    Passive(TcpListener),
    Active(SocketAddr),
}

impl DataMode {
    pub fn is_none(&self) -> bool {
        matches!(self, DataMode::None)
    }
}

/// Which transfer routine is armed, and the already-open resource it
/// operates on. The variant itself is the type tag, replacing a union of
/// "open file" and "open directory".
pub enum TransferKind {
    List(Vec<DirEntry>),
    Retrieve(File),
    Store(File),
}
