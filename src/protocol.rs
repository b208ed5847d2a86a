/// JSON record protocol between the bridge and the host aggregator.
///
/// All records are newline-delimited JSON (NDJSON), one per detected event.
/// Uses `heapless` types for no_std/no-alloc operation.
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::event::{Timestamp, WifiTransition};

/// Maximum length for MAC address strings ("AA:BB:CC:DD:EE:FF")
pub type MacString = String<18>;

/// Maximum length for card UID strings (10-byte UID as hex)
pub type UidString = String<20>;

/// Records sent from the bridge to the host
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum DeviceMessage<'a> {
    /// Station joined or left the access point
    #[serde(rename = "wifi_event")]
    WifiEvent {
        /// "connected" or "disconnected"
        event: &'static str,
        mac: &'a MacString,
        /// Uptime in milliseconds at detection
        ts: Timestamp,
    },
    /// Proximity card presented to the reader
    #[serde(rename = "rfid")]
    Rfid {
        uid: &'a UidString,
        /// Uptime in milliseconds at detection
        ts: Timestamp,
    },
}

/// A record as seen by the host after decoding a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRecord {
    Wifi {
        transition: WifiTransition,
        mac: MacString,
        ts: Timestamp,
    },
    Rfid {
        uid: UidString,
        ts: Timestamp,
    },
}

impl HostRecord {
    pub fn ts(&self) -> Timestamp {
        match self {
            HostRecord::Wifi { ts, .. } | HostRecord::Rfid { ts, .. } => *ts,
        }
    }
}

/// Wire format for decoding records: a flat struct that `serde_json_core` can
/// deserialize without `deserialize_any`. Converted to [`HostRecord`] in
/// `comm::parse_record()`.
#[derive(Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "type")]
    pub kind: String<16>,
    #[serde(default)]
    pub event: Option<String<16>>,
    #[serde(default)]
    pub mac: Option<MacString>,
    #[serde(default)]
    pub uid: Option<UidString>,
    #[serde(default)]
    pub ts: Option<Timestamp>,
}

/// Firmware version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum size of a serialized JSON record, newline included
pub const MAX_MSG_LEN: usize = 128;

/// Buffer type for serialized JSON records
pub type MsgBuffer = Vec<u8, MAX_MSG_LEN>;
