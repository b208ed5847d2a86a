/// Station-set observer: turns periodic snapshots of the AP station table
/// into join/leave events.
///
/// The radio only answers "who is associated right now", so the change feed
/// is built by diffing each snapshot against the previous one. The stored set
/// is replaced wholesale on every tick, which makes the observer self-healing
/// against missed or duplicated driver reports. A station that joins and
/// leaves between two ticks produces no event at all.
use heapless::Vec;

use crate::error::RadioError;
use crate::event::{Event, PeerId, Timestamp};

/// Station table capacity. ESP-IDF limits a soft AP to 15 stations.
pub const MAX_STATIONS: usize = 16;

/// Upper bound on events from one tick (every old peer left, every new one joined)
pub const MAX_TICK_EVENTS: usize = MAX_STATIONS * 2;

/// Raw station table as reported by the driver. May contain duplicates.
pub type Snapshot = Vec<PeerId, MAX_STATIONS>;

/// Events produced by a single tick
pub type TickEvents = Vec<Event, MAX_TICK_EVENTS>;

/// Source of the current station table.
pub trait StationSource {
    fn associated_peers(&mut self) -> Result<Snapshot, RadioError>;
}

/// Deduplicated, unordered set of associated peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationSet {
    peers: Vec<PeerId, MAX_STATIONS>,
}

impl StationSet {
    pub const fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Build a set from a driver snapshot, dropping duplicates.
    ///
    /// Peers beyond [`MAX_STATIONS`] distinct entries are dropped.
    pub fn from_peers(peers: &[PeerId]) -> Self {
        let mut set = Self::new();
        for peer in peers {
            if set.contains(peer) {
                continue;
            }
            if set.peers.push(*peer).is_err() {
                log::warn!("Station table exceeds {} entries, dropping {}", MAX_STATIONS, peer);
            }
        }
        set
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter()
    }

    /// Members of `self` not in `other`.
    pub fn difference<'a>(&'a self, other: &'a StationSet) -> impl Iterator<Item = &'a PeerId> {
        self.peers.iter().filter(move |p| !other.contains(p))
    }
}

/// Owns the previously seen station set and emits the delta on each poll.
pub struct StationSetObserver {
    previous: StationSet,
}

impl StationSetObserver {
    pub const fn new() -> Self {
        Self {
            previous: StationSet::new(),
        }
    }

    /// Diff `snapshot` against the stored set, then replace the stored set.
    ///
    /// All `RadioLeft` events come first, then all `RadioJoined` events.
    /// Leaves follow the stored set's order, joins follow `snapshot`.
    pub fn poll(&mut self, snapshot: &[PeerId], timestamp: Timestamp) -> TickEvents {
        let current = StationSet::from_peers(snapshot);
        let events = diff(&self.previous, &current, timestamp);
        self.previous = current;
        events
    }

    /// Peers associated as of the last tick
    pub fn stations(&self) -> &StationSet {
        &self.previous
    }
}

impl Default for StationSetObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Symmetric difference of two station sets as events.
pub fn diff(previous: &StationSet, current: &StationSet, timestamp: Timestamp) -> TickEvents {
    let mut events = TickEvents::new();
    // Both sets hold at most MAX_STATIONS peers, so pushes cannot overflow.
    for peer in previous.difference(current) {
        let _ = events.push(Event::RadioLeft {
            peer: *peer,
            timestamp,
        });
    }
    for peer in current.difference(previous) {
        let _ = events.push(Event::RadioJoined {
            peer: *peer,
            timestamp,
        });
    }
    events
}
