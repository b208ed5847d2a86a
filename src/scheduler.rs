/// Main loop body: interleaves the station tick with the card poll and routes
/// every event through the emitter in the order it was produced.
///
/// One call to [`Scheduler::run_iteration`] is one loop pass. The caller
/// observes the returned pause before the next pass (blocking delay or an
/// awaited timer, the ordering is the same either way). The scheduler is the
/// only writer to the host link.
use crate::card::{CardReader, ProximityReader};
use crate::comm::{EventEmitter, HostLink};
use crate::config::BridgeConfig;
use crate::event::{Event, Timestamp};
use crate::station::{Snapshot, StationSetObserver, StationSource};

/// Monotonic millisecond clock since boot.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

/// What one loop pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Iteration {
    /// The station tick was due and ran
    pub ticked: bool,
    /// A card was read this pass
    pub card_read: bool,
    /// Records written to the host
    pub emitted: usize,
    /// Records lost to transport failures
    pub dropped: usize,
    /// Delay to observe before the next pass
    pub pause_ms: u32,
}

pub struct Scheduler<S, R, L, C> {
    stations: S,
    observer: StationSetObserver,
    cards: CardReader<R>,
    emitter: EventEmitter<L>,
    clock: C,
    config: BridgeConfig,
    last_tick: Timestamp,
}

impl<S, R, L, C> Scheduler<S, R, L, C>
where
    S: StationSource,
    R: ProximityReader,
    L: HostLink,
    C: Clock,
{
    /// The tick timer starts at boot (t = 0), so the first station tick is
    /// due one interval after boot.
    pub fn new(stations: S, reader: R, link: L, clock: C, config: BridgeConfig) -> Self {
        Self {
            stations,
            observer: StationSetObserver::new(),
            cards: CardReader::new(reader, config.settle_ms),
            emitter: EventEmitter::new(link),
            clock,
            config,
            last_tick: 0,
        }
    }

    /// Run one loop pass: station tick if due, then one card poll.
    pub fn run_iteration(&mut self) -> Iteration {
        let mut report = Iteration::default();

        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_tick) >= self.config.station_tick_ms as Timestamp {
            self.tick(now, &mut report);
            // reset to now, not now minus overshoot
            self.last_tick = now;
            report.ticked = true;
        }

        let now = self.clock.now_ms();
        if let Some(event) = self.cards.poll_once(now) {
            log::debug!("Card presented at {}", now);
            self.route(&event, &mut report);
            report.card_read = true;
        }

        report.pause_ms = if report.card_read {
            self.cards.settle_ms() + self.config.loop_yield_ms
        } else {
            self.config.loop_yield_ms
        };
        report
    }

    fn tick(&mut self, now: Timestamp, report: &mut Iteration) {
        let snapshot = match self.stations.associated_peers() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("{}; treating station table as empty", e);
                Snapshot::new()
            }
        };

        let events = self.observer.poll(&snapshot, now);
        if !events.is_empty() {
            log::debug!(
                "Station tick at {}: {} change(s), {} associated",
                now,
                events.len(),
                self.observer.stations().len()
            );
        }
        for event in events.iter() {
            self.route(event, report);
        }
    }

    fn route(&mut self, event: &Event, report: &mut Iteration) {
        match self.emitter.emit(event) {
            Ok(()) => report.emitted += 1,
            Err(e) => {
                log::warn!("Dropping record at {}: {}", event.timestamp(), e);
                report.dropped += 1;
            }
        }
    }

    pub fn observer(&self) -> &StationSetObserver {
        &self.observer
    }

    pub fn emitter(&self) -> &EventEmitter<L> {
        &self.emitter
    }

    pub fn cards(&self) -> &CardReader<R> {
        &self.cards
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
