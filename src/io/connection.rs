use crate::common::time_based_id;
use std::time::{Duration, SystemTime};

/// Transport-level facts about one accepted connection. The session keeps
/// this around so the rest of the code can abstract away from the socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Opaque identifier, stable for the life of the connection
    pub id: String,
    pub local_addr: String,
    pub peer_addr: String,
    pub established: SystemTime,
}

impl ConnectionInfo {
    pub fn new(local_addr: String, peer_addr: String) -> Self {
        ConnectionInfo {
            id: time_based_id(),
            local_addr,
            peer_addr,
            established: SystemTime::now(),
        }
    }
    pub fn age(&self) -> Duration {
        self.established.elapsed().unwrap_or(Duration::ZERO)
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        ConnectionInfo::new(String::default(), String::default())
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn or_unknown(s: &str) -> &str {
            if s.is_empty() {
                "unknown"
            } else {
                s
            }
        }
        write!(
            f,
            "session {} peer {} on local {} up {}s",
            self.id,
            or_unknown(&self.peer_addr),
            or_unknown(&self.local_addr),
            self.age().as_secs()
        )
    }
}
