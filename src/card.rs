/// Proximity-card poller.
///
/// Each loop iteration asks the reader for a newly presented card. A
/// successful read halts the card and opens a settling window during which
/// the reader is left alone, so one physical tap yields one event. Cards
/// that are present but fail to give up their serial are skipped silently and
/// retried on the next iteration.
use crate::config::MIN_SETTLE_MS;
use crate::event::{CardId, Event, Timestamp, UidBytes};

/// Capabilities consumed from the reader driver.
pub trait ProximityReader {
    /// True when a card in the idle state answered the request.
    fn is_card_present(&mut self) -> bool;

    /// Run anticollision/select on the card found by the last
    /// [`is_card_present`](Self::is_card_present) and return its UID.
    fn read_card_serial(&mut self) -> Option<UidBytes>;

    /// Halt the selected card so it stops answering requests.
    fn release_card(&mut self);
}

pub struct CardReader<R> {
    reader: R,
    settle_ms: u32,
    settle_until: Option<Timestamp>,
}

impl<R: ProximityReader> CardReader<R> {
    /// `settle_ms` below [`MIN_SETTLE_MS`] is raised to it.
    pub fn new(reader: R, settle_ms: u32) -> Self {
        Self {
            reader,
            settle_ms: settle_ms.max(MIN_SETTLE_MS),
            settle_until: None,
        }
    }

    /// Poll the reader once. Returns at most one `CardPresented` event.
    pub fn poll_once(&mut self, now: Timestamp) -> Option<Event> {
        if self.is_settling(now) {
            return None;
        }
        self.settle_until = None;

        if !self.reader.is_card_present() {
            return None;
        }

        let Some(bytes) = self.reader.read_card_serial() else {
            log::debug!("Card present but serial unreadable, retrying next poll");
            return None;
        };

        let Some(card) = CardId::from_slice(&bytes) else {
            log::debug!("Reader returned an empty UID, retrying next poll");
            return None;
        };

        self.reader.release_card();
        self.settle_until = Some(now.saturating_add(self.settle_ms as Timestamp));

        Some(Event::CardPresented {
            card,
            timestamp: now,
        })
    }

    /// Whether a recent read still holds the reader in its settling window.
    pub fn is_settling(&self, now: Timestamp) -> bool {
        matches!(self.settle_until, Some(until) if now < until)
    }

    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}
