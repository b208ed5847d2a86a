//! In-memory collaborators for host tests.
//!
//! Each fake records what the core asked of it so tests can verify driver
//! interaction without hardware.

use core::cell::Cell;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use crate::card::ProximityReader;
use crate::comm::HostLink;
use crate::error::{RadioError, TransportError};
use crate::event::{PeerId, Timestamp, UidBytes};
use crate::scheduler::Clock;
use crate::station::{Snapshot, StationSource};

/// Station source answering from a queue of scripted snapshots.
///
/// When the script runs dry the last answer repeats.
#[derive(Debug, Default)]
pub struct ScriptedStations {
    script: VecDeque<Result<Vec<PeerId>, RadioError>>,
    last: Vec<PeerId>,
    queries: usize,
}

impl ScriptedStations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(&mut self, peers: &[PeerId]) -> &mut Self {
        self.script.push_back(Ok(peers.to_vec()));
        self
    }

    pub fn then_fail(&mut self, code: i32) -> &mut Self {
        self.script.push_back(Err(RadioError::QueryFailed(code)));
        self
    }

    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl StationSource for ScriptedStations {
    fn associated_peers(&mut self) -> Result<Snapshot, RadioError> {
        self.queries += 1;
        let peers = match self.script.pop_front() {
            Some(Ok(peers)) => {
                self.last = peers.clone();
                peers
            }
            Some(Err(e)) => return Err(e),
            None => self.last.clone(),
        };
        let mut snapshot = Snapshot::new();
        for p in peers {
            let _ = snapshot.push(p);
        }
        Ok(snapshot)
    }
}

/// Reader holding at most one card on its antenna.
///
/// Models ISO 14443-A state: a halted card stops answering requests until
/// it leaves the field.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    card: Option<Vec<u8>>,
    halted: bool,
    ignore_halt: bool,
    failing_reads: usize,
    presence_queries: usize,
    halts: usize,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a card on the antenna (fresh, not halted).
    pub fn present(&mut self, uid: &[u8]) {
        self.card = Some(uid.to_vec());
        self.halted = false;
    }

    pub fn remove(&mut self) {
        self.card = None;
        self.halted = false;
    }

    /// Make the next `n` serial reads fail.
    pub fn fail_reads(&mut self, n: usize) {
        self.failing_reads = n;
    }

    /// Keep answering after HLTA.
    pub fn ignore_halt(&mut self) {
        self.ignore_halt = true;
    }

    pub fn halts(&self) -> usize {
        self.halts
    }

    pub fn presence_queries(&self) -> usize {
        self.presence_queries
    }
}

impl ProximityReader for ScriptedReader {
    fn is_card_present(&mut self) -> bool {
        self.presence_queries += 1;
        self.card.is_some() && !self.halted
    }

    fn read_card_serial(&mut self) -> Option<UidBytes> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return None;
        }
        let uid = self.card.as_ref()?;
        UidBytes::from_slice(uid).ok()
    }

    fn release_card(&mut self) {
        self.halts += 1;
        if !self.ignore_halt {
            self.halted = true;
        }
    }
}

/// Host link keeping every line it was handed.
#[derive(Debug, Default)]
pub struct RecordingLink {
    lines: Vec<String>,
    writes: usize,
    failures_left: usize,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` writes with [`TransportError::Write`].
    pub fn fail_next(&mut self, n: usize) {
        self.failures_left = n;
    }

    /// Successfully written lines, newline stripped
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Write attempts, failed ones included
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl HostLink for RecordingLink {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        self.writes += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(TransportError::Write);
        }
        assert_eq!(line.last(), Some(&b'\n'), "record must be newline terminated");
        let text = core::str::from_utf8(&line[..line.len() - 1]).map_err(|_| TransportError::Write)?;
        self.lines.push(String::from(text));
        Ok(())
    }
}

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get() + ms as Timestamp);
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.get()
    }
}
