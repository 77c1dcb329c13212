//! Accept loop (component H): binds the listening socket, spawns one task
//! per accepted client, and tracks them for a graceful shutdown.

use crate::config::ServerConfig;
use crate::registry::{SessionRegistry, UnregisterGuard};
use crate::session::Session;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinSet;

pub struct Server {
    listener: TcpListener,
    root: PathBuf,
    pasv_bind_ip: std::net::Ipv4Addr,
    pasv_range: Option<crate::connection::PasvPortRange>,
    registry: SessionRegistry,
    next_id: AtomicU64,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> std::io::Result<Self> {
        let addr = SocketAddr::from((config.bind, config.port));
        let listener = TcpListener::bind(addr).await?;
        log::info!(
            "listening on {} (configured backlog {}, tokio does not expose backlog tuning beyond its internal default)",
            addr,
            config.backlog
        );
        let root = config.root.canonicalize().unwrap_or_else(|_| config.root.clone());
        let pasv_range = config
            .pasv_port_range
            .map(|r| crate::connection::PasvPortRange {
                start: r.start,
                end: r.end,
            });
        Ok(Self {
            listener,
            root,
            pasv_bind_ip: config.bind,
            pasv_range,
            registry: SessionRegistry::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The address this server ended up bound to (useful when binding to
    /// port 0 to let the OS assign one, e.g. in tests).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> std::io::Result<()> {
        let mut tasks: JoinSet<()> = JoinSet::new();
        let registry = self.registry.clone();
        let root = self.root.clone();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            log::warn!("accept failed: {}", e);
                            continue;
                        }
                    };
                    stream.set_nodelay(true).ok();

                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let root = root.clone();
                    let pasv_bind_ip = self.pasv_bind_ip;
                    let pasv_range = self.pasv_range;
                    let task_registry = registry.clone();

                    log::info!("session {}: accepted connection from {}", id, peer);
                    let abort_handle = tasks.spawn(async move {
                        let _guard = UnregisterGuard::new(task_registry, id);
                        let session = Session::new(id, stream, root, pasv_bind_ip, pasv_range);
                        session.run().await;
                    });
                    registry.insert(id, peer, abort_handle);
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!(
                        "shutdown requested, {} session(s) still active",
                        self.registry.len()
                    );
                    break;
                }
            }
        }

        // Give in-flight sessions a brief grace period before disconnecting
        // anyone still mid-command.
        let grace = tokio::time::sleep(std::time::Duration::from_secs(5));
        tokio::pin!(grace);
        tokio::select! {
            _ = async {
                while tasks.join_next().await.is_some() {}
            } => {}
            _ = &mut grace => {
                log::warn!("shutdown grace period elapsed, aborting remaining sessions");
                self.registry.abort_all();
            }
        }

        Ok(())
    }
}
