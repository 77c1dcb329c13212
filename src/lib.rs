//! # sorng-ftpd — single-process FTP server
//!
//! Architecture:
//! - `types` — session state/mode enums and size constants
//! - `error` — internal error type for pre-reply setup failures
//! - `sandbox` — path traversal guard (component A)
//! - `protocol` — command-line codec + reply formatter (components C/D)
//! - `dispatch` — sorted verb table + binary search (component D)
//! - `connection` — passive/active data-channel socket helpers (component B)
//! - `commands` — one handler per FTP verb (component G)
//! - `transfer` — LIST/RETR/STOR incremental routines (component F)
//! - `session` — per-connection state machine (component E)
//! - `registry` — session id -> handle map (component I)
//! - `config` — CLI-sourced server configuration (component J)
//! - `server` — accept loop (component H)

pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod sandbox;
pub mod server;
pub mod session;
pub mod transfer;
pub mod types;
