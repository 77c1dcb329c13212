//! Session registry — an owning map from session id to a lightweight
//! handle, replacing an intrusive doubly-linked session list: reaping by
//! traversal becomes each session's own task removing its entry on exit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

pub struct SessionHandle {
    pub peer: SocketAddr,
    pub abort: AbortHandle,
}

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<u64, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn insert(&self, id: u64, peer: SocketAddr, abort: AbortHandle) {
        self.inner
            .lock()
            .unwrap()
            .insert(id, SessionHandle { peer, abort });
    }

    pub fn remove(&self, id: u64) {
        self.inner.lock().unwrap().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn abort_all(&self) {
        for handle in self.inner.lock().unwrap().values() {
            handle.abort.abort();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove `id` from `registry` when dropped, so a session that returns via
/// an early `return` or a panic still de-registers itself before its task
/// finishes unwinding.
pub struct UnregisterGuard {
    registry: SessionRegistry,
    id: u64,
}

impl UnregisterGuard {
    pub fn new(registry: SessionRegistry, id: u64) -> Self {
        Self { registry, id }
    }
}

impl Drop for UnregisterGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
