//! Internal error type for failures that occur before a reply can be framed.
//!
//! Protocol-level failures (a rejected command, a missing file) are never
//! represented here — they are reply codes, sent directly by the command
//! handlers. `FtpError` covers only the narrow band of failures that happen
//! *before* a reply is even possible: binding the passive listener, accepting
//! a data connection, or a control-channel write that itself fails.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FtpErrorKind {
    /// Failed to bind or configure a listening socket.
    Bind,
    /// Failed to accept or connect a data channel.
    DataChannel,
    /// Any other I/O failure on the control channel.
    Io,
}

#[derive(Debug, Clone)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
}

pub type FtpResult<T> = Result<T, FtpError>;

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn bind(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Bind, msg)
    }

    pub fn data_channel(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::DataChannel, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Io, msg)
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for FtpError {}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}
