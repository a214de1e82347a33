//! Socket transport configuration

use std::path::PathBuf;

use serde::Deserialize;
use sysevent_protocol::MAX_DATA_SIZE;

/// Socket for ordinary events
pub const DEFAULT_SOCKET_PATH: &str = "/dev/unix/socket/hisysevent";

/// Socket for events the collector must see first
pub const DEFAULT_PRIORITY_SOCKET_PATH: &str = "/dev/unix/socket/hisysevent_fast";

/// Send attempts per record on EAGAIN / EINTR
pub const DEFAULT_RETRY_TIMES: u32 = 3;

/// Failed records kept for replay
pub const DEFAULT_RETRY_QUEUE_SIZE: usize = 10;

/// Transport configuration
///
/// # Example
///
/// ```toml
/// [transport]
/// socket_path = "/dev/unix/socket/hisysevent"
/// priority_socket_path = "/dev/unix/socket/hisysevent_fast"
/// retry_times = 3
/// retry_queue_size = 10
/// max_data_size = 393216
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    pub socket_path: PathBuf,

    pub priority_socket_path: PathBuf,

    /// Attempts per send, including the first
    pub retry_times: u32,

    /// Replay queue bound; 0 disables replay
    pub retry_queue_size: usize,

    /// Largest record accepted, also used as SO_SNDBUF
    pub max_data_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            priority_socket_path: PathBuf::from(DEFAULT_PRIORITY_SOCKET_PATH),
            retry_times: DEFAULT_RETRY_TIMES,
            retry_queue_size: DEFAULT_RETRY_QUEUE_SIZE,
            max_data_size: MAX_DATA_SIZE,
        }
    }
}
