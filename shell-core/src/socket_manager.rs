use std::{
    collections::BTreeMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::Duration,
};

use tokio::{io::AsyncWriteExt, net::TcpStream};

use crate::{append_runtime_log, NODE_PROBE_TIMEOUT, SOCKET_CLOSE_TIMEOUT};

/// Open network connections the shell holds to its nodes.
pub trait SocketPool: Send + Sync {
    fn open(&self, label: &str, addr: &str) -> impl Future<Output = Result<u64, String>> + Send;

    /// Closes every open socket. All sockets are attempted even when one
    /// fails; the first failure is reported after the pool is empty.
    fn destroy_all(&self) -> impl Future<Output = Result<usize, String>> + Send;
}

struct ManagedSocket {
    label: String,
    stream: TcpStream,
}

pub struct SocketManager {
    sockets: Mutex<BTreeMap<u64, ManagedSocket>>,
    next_id: AtomicU64,
    close_timeout: Duration,
}

impl Default for SocketManager {
    fn default() -> Self {
        Self::new(SOCKET_CLOSE_TIMEOUT)
    }
}

impl SocketManager {
    pub fn new(close_timeout: Duration) -> Self {
        Self {
            sockets: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            close_timeout,
        }
    }

    pub fn open_count(&self) -> usize {
        match self.sockets.lock() {
            Ok(guard) => guard.len(),
            Err(error) => error.into_inner().len(),
        }
    }

    fn take_all(&self) -> Vec<(u64, ManagedSocket)> {
        let mut guard = match self.sockets.lock() {
            Ok(guard) => guard,
            Err(error) => error.into_inner(),
        };
        std::mem::take(&mut *guard).into_iter().collect()
    }
}

impl SocketPool for SocketManager {
    async fn open(&self, label: &str, addr: &str) -> Result<u64, String> {
        let stream = tokio::time::timeout(NODE_PROBE_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| format!("Timed out connecting {label} socket to {addr}."))?
            .map_err(|error| format!("Failed to connect {label} socket to {addr}: {error}"))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let socket = ManagedSocket {
            label: label.to_string(),
            stream,
        };
        match self.sockets.lock() {
            Ok(mut guard) => guard.insert(id, socket),
            Err(error) => error.into_inner().insert(id, socket),
        };
        append_runtime_log(&format!("opened {label} socket #{id} to {addr}"));
        Ok(id)
    }

    async fn destroy_all(&self) -> Result<usize, String> {
        let sockets = self.take_all();
        let count = sockets.len();
        let mut first_error = None;

        for (id, mut socket) in sockets {
            let result = match tokio::time::timeout(self.close_timeout, socket.stream.shutdown())
                .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(error)) => Err(format!(
                    "Failed to close {} socket #{id}: {error}",
                    socket.label
                )),
                Err(_) => Err(format!(
                    "Timed out closing {} socket #{id} after {}ms.",
                    socket.label,
                    self.close_timeout.as_millis()
                )),
            };
            if let Err(error) = result {
                append_runtime_log(&error);
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(count),
        }
    }
}
