//! One handler per FTP verb (component G). Each handler validates its
//! argument, mutates the session, and either emits a reply directly or
//! arms a transfer via [`begin_transfer`].

use crate::connection;
use crate::sandbox;
use crate::session::Session;
use crate::types::{DataMode, SessionState, TransferKind};
use std::net::SocketAddr;
use std::path::PathBuf;

// ── Session-trivial ──────────────────────────────────────────────────

pub async fn noop(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(200, "NOOP ok").await
}

pub async fn allo(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(202, "ALLO superfluous").await
}

pub async fn user(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(230, "Logged in").await
}

pub async fn pass(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(230, "Logged in").await
}

pub async fn syst(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(215, "UNIX Type: L8").await
}

pub async fn quit(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(221, "Goodbye").await
}

pub async fn type_cmd(s: &mut Session, args: &str) -> std::io::Result<()> {
    match args.trim().to_ascii_uppercase().as_str() {
        "A" => {
            s.binary = false;
            s.reply(200, "Switching to ASCII mode").await
        }
        "I" => {
            s.binary = true;
            s.reply(200, "Switching to Binary mode").await
        }
        _ => s.reply(504, "unsupported TYPE parameter").await,
    }
}

pub async fn mode(s: &mut Session, args: &str) -> std::io::Result<()> {
    if args.trim().eq_ignore_ascii_case("S") {
        s.reply(200, "Mode set to S").await
    } else {
        s.reply(504, "unsupported MODE parameter").await
    }
}

pub async fn stru(s: &mut Session, args: &str) -> std::io::Result<()> {
    if args.trim().eq_ignore_ascii_case("F") {
        s.reply(200, "Structure set to F").await
    } else {
        s.reply(504, "unsupported STRU parameter").await
    }
}

pub async fn opts(s: &mut Session, args: &str) -> std::io::Result<()> {
    match args.trim().to_ascii_uppercase().as_str() {
        "UTF8" | "UTF8 ON" | "UTF8 OFF" => s.reply(200, "OK").await,
        _ => s.reply(504, "unsupported OPTS parameter").await,
    }
}

pub async fn feat(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(211, "\r\n UTF8\r\n211 End\r\n").await
}

pub async fn pwd(s: &mut Session, _args: &str) -> std::io::Result<()> {
    let text = format!("\"{}\"", s.cwd);
    s.reply(257, &text).await
}

pub async fn unsupported_502(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(502, "not implemented").await
}

pub async fn unsupported_504(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.reply(504, "not implemented for that parameter").await
}

// ── Path mutating ────────────────────────────────────────────────────

pub async fn cwd(s: &mut Session, args: &str) -> std::io::Result<()> {
    if args.trim() == ".." {
        return cdup(s, "").await;
    }
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    match tokio::fs::metadata(s.fs_path(&vpath)).await {
        Ok(meta) if meta.is_dir() => {
            s.cwd = vpath;
            s.reply(250, "directory changed").await
        }
        Ok(_) => s.reply(550, "not a directory").await,
        Err(_) => s.reply(550, "no such directory").await,
    }
}

pub async fn cdup(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.cwd = sandbox::cd_up(&s.cwd);
    s.reply(200, "directory changed").await
}

pub async fn mkd(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    match tokio::fs::create_dir(s.fs_path(&vpath)).await {
        Ok(()) => s.reply(257, &format!("\"{}\" created", vpath)).await,
        Err(e) => {
            log::debug!("session {}: MKD {}: {}", s.id, vpath, e);
            s.reply(550, "unable to create directory").await
        }
    }
}

pub async fn rmd(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    match tokio::fs::remove_dir(s.fs_path(&vpath)).await {
        Ok(()) => s.reply(250, "directory removed").await,
        Err(e) => {
            log::debug!("session {}: RMD {}: {}", s.id, vpath, e);
            s.reply(550, "unable to remove directory").await
        }
    }
}

pub async fn dele(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    match tokio::fs::remove_file(s.fs_path(&vpath)).await {
        Ok(()) => s.reply(250, "file deleted").await,
        Err(e) => {
            log::debug!("session {}: DELE {}: {}", s.id, vpath, e);
            s.reply(550, "unable to delete file").await
        }
    }
}

pub async fn rnfr(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    match tokio::fs::symlink_metadata(s.fs_path(&vpath)).await {
        Ok(_) => {
            s.rename_pending = Some(vpath);
            s.reply(350, "Ready for RNTO").await
        }
        Err(_) => s.reply(450, "no such file or directory").await,
    }
}

pub async fn rnto(s: &mut Session, args: &str) -> std::io::Result<()> {
    let from_vpath = match s.rename_pending.take() {
        Some(p) => p,
        None => return s.reply(503, "Bad sequence of commands").await,
    };
    let to_vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(554, "pathname invalid").await,
    };
    match tokio::fs::rename(s.fs_path(&from_vpath), s.fs_path(&to_vpath)).await {
        Ok(()) => s.reply(250, "rename complete").await,
        Err(e) => {
            log::debug!(
                "session {}: RNTO {} -> {}: {}",
                s.id,
                from_vpath,
                to_vpath,
                e
            );
            s.reply(550, "failed to rename file/directory").await
        }
    }
}

// ── Mode selection ───────────────────────────────────────────────────

pub async fn pasv(s: &mut Session, _args: &str) -> std::io::Result<()> {
    s.data_mode = DataMode::None;
    match connection::bind_passive(s.pasv_bind_ip, s.pasv_range, &mut s.pasv_next_port).await {
        Ok(listener) => {
            let local = listener.local_addr()?;
            let reply_text = match local {
                SocketAddr::V4(v4) => connection::format_pasv_reply(v4),
                SocketAddr::V6(_) => unreachable!("PASV listener is always bound on IPv4"),
            };
            s.data_mode = DataMode::Passive(listener);
            s.reply(227, &reply_text).await
        }
        Err(e) => {
            log::warn!("session {}: PASV bind failed: {}", s.id, e);
            s.reply(425, "Cannot open passive connection").await
        }
    }
}

pub async fn port(s: &mut Session, args: &str) -> std::io::Result<()> {
    s.data_mode = DataMode::None;
    match connection::parse_port_arg(args.trim()) {
        Some(addr) => {
            s.data_mode = DataMode::Active(addr);
            s.reply(200, "OK").await
        }
        None => s.reply(501, "invalid PORT argument").await,
    }
}

// ── Transfer-starting ────────────────────────────────────────────────

enum Resource {
    List(String),
    Retrieve(String),
    Store(String),
}

pub async fn list(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = if args.trim().is_empty() {
        s.cwd.clone()
    } else {
        match sandbox::build_path(&s.cwd, args.trim()) {
            Ok(p) => p,
            Err(_) => return s.reply(553, "pathname invalid").await,
        }
    };
    begin_transfer(s, Resource::List(vpath)).await
}

pub async fn retr(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    begin_transfer(s, Resource::Retrieve(vpath)).await
}

pub async fn stor(s: &mut Session, args: &str) -> std::io::Result<()> {
    let vpath = match sandbox::build_path(&s.cwd, args.trim()) {
        Ok(p) => p,
        Err(_) => return s.reply(553, "pathname invalid").await,
    };
    begin_transfer(s, Resource::Store(vpath)).await
}

/// Shared LIST/RETR/STOR sequencing: open the resource
/// only once the data connection is, or is about to be, actually
/// available, so a connect failure can never leave a resource open with
/// nothing left to drive it.
async fn begin_transfer(s: &mut Session, resource: Resource) -> std::io::Result<()> {
    match &s.data_mode {
        DataMode::None => s.reply(503, "Bad sequence of commands").await,
        DataMode::Active(addr) => {
            let addr = *addr;
            match connection::connect_active(addr).await {
                Ok(stream) => match open_resource(s, &resource).await {
                    Ok(kind) => {
                        s.data = Some(stream);
                        s.transfer = Some(kind);
                        s.set_state(SessionState::DataTransfer);
                        s.reply(150, "Ready").await
                    }
                    Err((code, msg)) => s.reply(code, &msg).await,
                },
                Err(e) => {
                    log::warn!("session {}: PORT connect failed: {}", s.id, e);
                    s.reply(425, "Failed to establish connection").await
                }
            }
        }
        DataMode::Passive(_) => match open_resource(s, &resource).await {
            Ok(kind) => {
                s.transfer = Some(kind);
                s.set_state(SessionState::DataConnect);
                Ok(())
            }
            Err((code, msg)) => s.reply(code, &msg).await,
        },
    }
}

async fn open_resource(
    s: &Session,
    resource: &Resource,
) -> Result<TransferKind, (u16, String)> {
    match resource {
        Resource::List(vpath) => {
            let fspath: PathBuf = s.fs_path(vpath);
            let mut rd = tokio::fs::read_dir(&fspath)
                .await
                .map_err(|_| (550u16, "unavailable".to_string()))?;
            let mut entries = Vec::new();
            loop {
                match rd.next_entry().await {
                    Ok(Some(entry)) => entries.push(entry),
                    Ok(None) => break,
                    Err(_) => return Err((550, "unavailable".to_string())),
                }
            }
            entries.sort_by_key(|e| e.file_name());
            Ok(TransferKind::List(entries))
        }
        Resource::Retrieve(vpath) => {
            let fspath = s.fs_path(vpath);
            let file = tokio::fs::File::open(&fspath)
                .await
                .map_err(|_| (450u16, "failed to open file".to_string()))?;
            Ok(TransferKind::Retrieve(file))
        }
        Resource::Store(vpath) => {
            let fspath = s.fs_path(vpath);
            let file = tokio::fs::File::create(&fspath)
                .await
                .map_err(|_| (450u16, "failed to open file".to_string()))?;
            Ok(TransferKind::Store(file))
        }
    }
}
