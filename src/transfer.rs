//! The three incremental transfer routines (component F), each run once to
//! completion by [`run`] from `DataTransfer` state.

use crate::session::Session;
use crate::types::{TransferKind, FILE_CHUNK, XFER_CHUNK};
use tokio::fs::{DirEntry, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub enum TransferError {
    /// A local (filesystem) failure -> `451`.
    Local(String),
    /// The data connection itself broke -> `426`.
    Broken(String),
    /// A directory entry vanished or became unreadable mid-listing -> `550`.
    Unavailable(String),
}

pub async fn run(session: &mut Session) -> Result<(), TransferError> {
    let kind = session
        .transfer
        .take()
        .expect("DataTransfer state entered without an armed transfer");
    let mut data = session
        .data
        .take()
        .expect("DataTransfer state entered without a data connection");

    match kind {
        TransferKind::List(entries) => list_transfer(entries, &mut data).await,
        TransferKind::Retrieve(file) => retrieve_transfer(file, &mut data).await,
        TransferKind::Store(file) => store_transfer(file, &mut data).await,
    }
}

async fn list_transfer(entries: Vec<DirEntry>, data: &mut TcpStream) -> Result<(), TransferError> {
    let mut buf = String::with_capacity(XFER_CHUNK);
    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "." || name == ".." {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        let kind_char = if file_type.is_dir() {
            'd'
        } else if file_type.is_symlink() {
            'l'
        } else {
            '-'
        };
        buf.push_str(&format!(
            "{}rwxrwxrwx 1 owner group {:>13} Jan 1 1970 {}\r\n",
            kind_char,
            metadata.len(),
            name
        ));
        if buf.len() >= XFER_CHUNK {
            data.write_all(buf.as_bytes())
                .await
                .map_err(|e| TransferError::Broken(e.to_string()))?;
            buf.clear();
        }
    }
    if !buf.is_empty() {
        data.write_all(buf.as_bytes())
            .await
            .map_err(|e| TransferError::Broken(e.to_string()))?;
    }
    Ok(())
}

async fn retrieve_transfer(mut file: File, data: &mut TcpStream) -> Result<(), TransferError> {
    let mut buf = vec![0u8; FILE_CHUNK];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| TransferError::Local(e.to_string()))?;
        if n == 0 {
            break;
        }
        data.write_all(&buf[..n])
            .await
            .map_err(|e| TransferError::Broken(e.to_string()))?;
    }
    Ok(())
}

async fn store_transfer(mut file: File, data: &mut TcpStream) -> Result<(), TransferError> {
    let mut buf = vec![0u8; XFER_CHUNK];
    loop {
        let n = data
            .read(&mut buf)
            .await
            .map_err(|e| TransferError::Broken(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .await
            .map_err(|e| TransferError::Local(e.to_string()))?;
    }
    Ok(())
}
