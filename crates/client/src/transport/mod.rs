//! Datagram transport to the event collector
//!
//! Every send opens a fresh non-blocking UNIX datagram socket, so a restarted
//! collector is picked up without reconnect logic. Records that fail to send
//! are parked in a bounded [`RetryQueue`] and replayed, oldest first, ahead
//! of the next record.

mod retry;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use socket2::{Domain, SockAddr, Socket, Type};
use sysevent_config::TransportConfig;
use sysevent_protocol::RawRecord;

use crate::error::{Result, TransportError};
use crate::router::{self, SocketTarget};

pub use retry::RetryQueue;

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

/// Send counters
#[derive(Debug, Default)]
pub struct TransportStats {
    pub sent: AtomicU64,
    pub failed: AtomicU64,
    pub replayed: AtomicU64,
}

impl TransportStats {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn replayed(&self) -> u64 {
        self.replayed.load(Ordering::Relaxed)
    }
}

/// Sends encoded records to the normal or priority socket
pub struct Transport {
    normal_path: PathBuf,
    priority_path: PathBuf,
    retry_times: u32,
    max_data_size: usize,
    queue: RetryQueue,
    stats: TransportStats,
}

impl Transport {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            normal_path: config.socket_path.clone(),
            priority_path: config.priority_socket_path.clone(),
            retry_times: config.retry_times.max(1),
            max_data_size: config.max_data_size,
            queue: RetryQueue::new(config.retry_queue_size),
            stats: TransportStats::default(),
        }
    }

    /// Send a record, replaying any queued records first
    ///
    /// # Errors
    ///
    /// Empty and oversized records are rejected without touching a socket.
    /// A failed send parks the record in the retry queue and returns the
    /// error from the last attempt.
    pub fn send_data(&self, record: &RawRecord) -> Result<()> {
        if record.is_empty() {
            return Err(TransportError::EmptyRecord);
        }
        if record.len() > self.max_data_size {
            return Err(TransportError::OverSize {
                size: record.len(),
                max: self.max_data_size,
            });
        }

        self.drain_queue();

        let target = router::route_record(record.as_bytes());
        match self.send_once(target, record.as_bytes()) {
            Ok(()) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                self.queue.push(record.bytes().clone());
                Err(e)
            }
        }
    }

    /// Replay queued records until the queue is empty or a send fails
    fn drain_queue(&self) {
        while let Some(pending) = self.queue.pop() {
            let target = router::route_record(&pending);
            match self.send_once(target, &pending) {
                Ok(()) => {
                    self.stats.replayed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::debug!(error = %e, queued = self.queue.len() + 1, "replay failed, keeping queue");
                    self.queue.push_front(pending);
                    break;
                }
            }
        }
    }

    fn send_once(&self, target: SocketTarget, data: &[u8]) -> Result<()> {
        let path = self.path_for(target);
        let socket = self.open_socket()?;
        let addr = SockAddr::unix(path).map_err(|e| TransportError::send_failed(path, 0, e))?;

        let mut last_err = None;
        for attempt in 1..=self.retry_times {
            match socket.send_to(data, &addr) {
                Ok(_) => return Ok(()),
                Err(e) if is_transient(&e) => {
                    tracing::trace!(attempt, path = %path.display(), "send would block, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(TransportError::send_failed(path, attempt, e)),
            }
        }

        let source = last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::WouldBlock));
        Err(TransportError::send_failed(path, self.retry_times, source))
    }

    fn open_socket(&self) -> Result<Socket> {
        let socket =
            Socket::new(Domain::UNIX, Type::DGRAM, None).map_err(TransportError::SocketCreate)?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::SocketCreate)?;

        if let Err(e) = socket.set_send_buffer_size(self.max_data_size) {
            tracing::warn!(error = %e, size = self.max_data_size, "failed to set send buffer size");
        }

        Ok(socket)
    }

    fn path_for(&self, target: SocketTarget) -> &Path {
        match target {
            SocketTarget::Normal => &self.normal_path,
            SocketTarget::HigherPriority => &self.priority_path,
        }
    }

    /// Records waiting for replay
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &RetryQueue {
        &self.queue
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    #[inline]
    pub fn max_data_size(&self) -> usize {
        self.max_data_size
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

