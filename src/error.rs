/// Error types surfaced by the bridge core.
///
/// Transient sensor misses (unreadable card, empty UID) are not errors and
/// never reach these types; they are skipped where they occur.

use core::fmt;

/// Failure delivering a record to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Record did not fit the serialization buffer
    Serialize,
    /// The link accepted the call but the write failed
    Write,
}

/// Failure querying the radio subsystem for its station table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Driver call returned a non-zero status code
    QueryFailed(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Serialize => write!(f, "record exceeds message buffer"),
            TransportError::Write => write!(f, "host link write failed"),
        }
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioError::QueryFailed(code) => write!(f, "station list query failed (status {})", code),
        }
    }
}
