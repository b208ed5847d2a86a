/// Identifiers and the detection event type shared by both observers.
///
/// Everything here is immutable once built. Events are created at detection
/// time, handed to the emitter once, and dropped.
use core::fmt::{self, Write};

use heapless::Vec;

use crate::protocol::{MacString, UidString};

/// Monotonic milliseconds since boot.
pub type Timestamp = u64;

/// Longest ISO 14443-A UID (triple size)
pub const MAX_UID_LEN: usize = 10;

/// Raw UID bytes as returned by the reader driver
pub type UidBytes = Vec<u8, MAX_UID_LEN>;

/// Hardware address of a station associated with the access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId([u8; 6]);

impl PeerId {
    pub const fn new(mac: [u8; 6]) -> Self {
        Self(mac)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Render as "AA:BB:CC:DD:EE:FF".
    pub fn to_mac_string(&self) -> MacString {
        let mut buf = MacString::new();
        format_mac(&self.0, &mut buf);
        buf
    }
}

impl From<[u8; 6]> for PeerId {
    fn from(mac: [u8; 6]) -> Self {
        Self(mac)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Format a 6-byte MAC address into "AA:BB:CC:DD:EE:FF" string
pub fn format_mac(mac: &[u8; 6], buf: &mut MacString) {
    let _ = write!(buf, "{}", PeerId(*mac));
}

/// UID of a presented proximity card. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardId(UidBytes);

impl CardId {
    /// Returns `None` for an empty UID or one longer than [`MAX_UID_LEN`].
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Vec::from_slice(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render as contiguous uppercase hex, e.g. "DEADBEEF".
    pub fn to_uid_string(&self) -> UidString {
        let mut buf = UidString::new();
        let _ = write!(buf, "{}", self);
        buf
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Station association transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiTransition {
    Connected,
    Disconnected,
}

impl WifiTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiTransition::Connected => "connected",
            WifiTransition::Disconnected => "disconnected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connected" => Some(WifiTransition::Connected),
            "disconnected" => Some(WifiTransition::Disconnected),
            _ => None,
        }
    }
}

/// A detected change in the physical world
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RadioJoined { peer: PeerId, timestamp: Timestamp },
    RadioLeft { peer: PeerId, timestamp: Timestamp },
    CardPresented { card: CardId, timestamp: Timestamp },
}

impl Event {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Event::RadioJoined { timestamp, .. }
            | Event::RadioLeft { timestamp, .. }
            | Event::CardPresented { timestamp, .. } => *timestamp,
        }
    }

    /// Peer and transition for the two station variants.
    pub fn station_transition(&self) -> Option<(PeerId, WifiTransition)> {
        match self {
            Event::RadioJoined { peer, .. } => Some((*peer, WifiTransition::Connected)),
            Event::RadioLeft { peer, .. } => Some((*peer, WifiTransition::Disconnected)),
            Event::CardPresented { .. } => None,
        }
    }
}
