/// Host-side trip tracking over the decoded record stream.
///
/// A WiFi passenger boards on `connected` and alights on `disconnected`.
/// An RFID passenger taps once to board and again to alight. Every alight
/// closes a [`Trip`] with a fare from the [`FareSchedule`]. Durations come
/// from the records' own `ts` values, so they measure device uptime rather
/// than host arrival time.
///
/// Riders get a display name: a registered one for known cards, otherwise
/// `RFID_<uid>` or `WiFiUser_<last 4 of mac>`.
use core::fmt::Write;

use heapless::{String, Vec};

use crate::event::{Timestamp, WifiTransition};
use crate::protocol::HostRecord;

/// Per-source onboard capacity
pub const MAX_ONBOARD: usize = 32;

/// Onboard key: a MAC string or a UID string, whichever is longer
pub type PassengerKey = String<20>;

/// Registered card holders
pub const MAX_NAMES: usize = 64;

/// Fits `RFID_` plus the longest UID string
pub type RiderName = String<32>;

const MS_PER_MINUTE: u64 = 60_000;

/// Fare rules. Amounts are whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareSchedule {
    /// Flat fare covering the first `base_minutes`
    pub base: u32,
    pub base_minutes: u32,
    /// Charge per minute beyond `base_minutes`, prorated to the millisecond
    pub per_minute: u32,
}

impl FareSchedule {
    pub const fn new() -> Self {
        Self {
            base: 10,
            base_minutes: 5,
            per_minute: 2,
        }
    }

    /// Fare for a trip of `duration_ms`, in hundredths of a currency unit.
    pub fn fare_hundredths(&self, duration_ms: u64) -> u64 {
        let base = self.base as u64 * 100;
        let included_ms = self.base_minutes as u64 * MS_PER_MINUTE;
        let extra_ms = duration_ms.saturating_sub(included_ms);
        base + extra_ms * self.per_minute as u64 * 100 / MS_PER_MINUTE
    }
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripSource {
    Wifi,
    Rfid,
}

/// A completed ride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: PassengerKey,
    pub name: RiderName,
    pub source: TripSource,
    pub boarded: Timestamp,
    pub alighted: Timestamp,
    /// Hundredths of a currency unit
    pub fare: u64,
}

impl Trip {
    pub fn duration_ms(&self) -> u64 {
        self.alighted.saturating_sub(self.boarded)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassengerCount {
    pub rfid: usize,
    pub wifi: usize,
    pub total: usize,
}

/// Result of feeding one record to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripUpdate {
    Boarded {
        id: PassengerKey,
        name: RiderName,
        source: TripSource,
    },
    Alighted(Trip),
    /// Disconnect of a station never seen boarding, a full table, or an
    /// alight timestamped before its boarding
    Ignored,
}

type Onboard = Vec<(PassengerKey, Timestamp), MAX_ONBOARD>;

pub struct TripTracker {
    fares: FareSchedule,
    wifi: Onboard,
    rfid: Onboard,
    names: Vec<(PassengerKey, RiderName), MAX_NAMES>,
}

impl TripTracker {
    pub const fn new(fares: FareSchedule) -> Self {
        Self {
            fares,
            wifi: Vec::new(),
            rfid: Vec::new(),
            names: Vec::new(),
        }
    }

    /// Attach a name to a card UID. Re-registering a UID replaces its name.
    ///
    /// Returns false if the UID or name is too long, or the table is full.
    pub fn register_name(&mut self, uid: &str, name: &str) -> bool {
        let mut key = PassengerKey::new();
        for c in uid.trim().chars() {
            if key.push(c.to_ascii_uppercase()).is_err() {
                return false;
            }
        }
        let Ok(name) = RiderName::try_from(name.trim()) else {
            return false;
        };
        if let Some(entry) = self.names.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = name;
            return true;
        }
        self.names.push((key, name)).is_ok()
    }

    /// Display name for a rider.
    pub fn name_for(&self, id: &str, source: TripSource) -> RiderName {
        let mut name = RiderName::new();
        match source {
            TripSource::Rfid => {
                if let Some((_, n)) = self.names.iter().find(|(k, _)| k.as_str() == id) {
                    return n.clone();
                }
                let _ = write!(name, "RFID_{}", id);
            }
            TripSource::Wifi => {
                let tail = id.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
                let _ = write!(name, "WiFiUser_{}", &id[tail..]);
            }
        }
        name
    }

    pub fn apply(&mut self, record: &HostRecord) -> TripUpdate {
        match record {
            HostRecord::Wifi { transition, mac, ts } => {
                let Some(id) = to_key(mac) else {
                    return TripUpdate::Ignored;
                };
                match transition {
                    WifiTransition::Connected => {
                        // a repeated connect refreshes the boarding time
                        remove(&mut self.wifi, &id);
                        let name = self.name_for(&id, TripSource::Wifi);
                        board(&mut self.wifi, id, name, *ts, TripSource::Wifi)
                    }
                    WifiTransition::Disconnected => match remove(&mut self.wifi, &id) {
                        Some(boarded) => self.alight(id, TripSource::Wifi, boarded, *ts),
                        None => TripUpdate::Ignored,
                    },
                }
            }
            HostRecord::Rfid { uid, ts } => {
                let Some(id) = to_key(uid) else {
                    return TripUpdate::Ignored;
                };
                match remove(&mut self.rfid, &id) {
                    Some(boarded) => self.alight(id, TripSource::Rfid, boarded, *ts),
                    None => {
                        let name = self.name_for(&id, TripSource::Rfid);
                        board(&mut self.rfid, id, name, *ts, TripSource::Rfid)
                    }
                }
            }
        }
    }

    pub fn passenger_count(&self) -> PassengerCount {
        PassengerCount {
            rfid: self.rfid.len(),
            wifi: self.wifi.len(),
            total: self.rfid.len() + self.wifi.len(),
        }
    }

    pub fn is_onboard(&self, id: &str) -> bool {
        self.wifi.iter().chain(self.rfid.iter()).any(|(k, _)| k.as_str() == id)
    }

    fn alight(&self, id: PassengerKey, source: TripSource, boarded: Timestamp, alighted: Timestamp) -> TripUpdate {
        if alighted < boarded {
            // device clock restarted mid-trip, the duration is unknown
            log::warn!(
                "{} alighted at ts {} before boarding at ts {}, dropping trip",
                id,
                alighted,
                boarded
            );
            return TripUpdate::Ignored;
        }
        let name = self.name_for(&id, source);
        let fare = self.fares.fare_hundredths(alighted - boarded);
        log::info!("{} alighted after {} ms, fare {}.{:02}", name, alighted - boarded, fare / 100, fare % 100);
        TripUpdate::Alighted(Trip {
            id,
            name,
            source,
            boarded,
            alighted,
            fare,
        })
    }
}

impl Default for TripTracker {
    fn default() -> Self {
        Self::new(FareSchedule::new())
    }
}

fn to_key(s: &str) -> Option<PassengerKey> {
    PassengerKey::try_from(s).ok()
}

fn remove(onboard: &mut Onboard, id: &PassengerKey) -> Option<Timestamp> {
    let idx = onboard.iter().position(|(k, _)| k == id)?;
    Some(onboard.swap_remove(idx).1)
}

fn board(onboard: &mut Onboard, id: PassengerKey, name: RiderName, ts: Timestamp, source: TripSource) -> TripUpdate {
    if onboard.push((id.clone(), ts)).is_err() {
        log::warn!("Onboard table full, not tracking {}", id);
        return TripUpdate::Ignored;
    }
    TripUpdate::Boarded { id, name, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MacString, UidString};

    const MIN: u64 = 60_000;

    fn wifi(transition: WifiTransition, mac: &str, ts: Timestamp) -> HostRecord {
        HostRecord::Wifi {
            transition,
            mac: MacString::try_from(mac).unwrap(),
            ts,
        }
    }

    fn tap(uid: &str, ts: Timestamp) -> HostRecord {
        HostRecord::Rfid {
            uid: UidString::try_from(uid).unwrap(),
            ts,
        }
    }

    #[test]
    fn base_fare_covers_first_five_minutes() {
        let fares = FareSchedule::new();
        assert_eq!(fares.fare_hundredths(0), 1000);
        assert_eq!(fares.fare_hundredths(5 * MIN), 1000);
    }

    #[test]
    fn extra_minutes_are_prorated() {
        let fares = FareSchedule::new();
        assert_eq!(fares.fare_hundredths(6 * MIN), 1200);
        // 7.5 minutes: 10 + 2.5 * 2 = 15
        assert_eq!(fares.fare_hundredths(7 * MIN + MIN / 2), 1500);
    }

    #[test]
    fn wifi_connect_then_disconnect_closes_trip() {
        let mut t = TripTracker::default();
        let mac = "AA:BB:CC:DD:EE:FF";
        assert!(matches!(
            t.apply(&wifi(WifiTransition::Connected, mac, 2000)),
            TripUpdate::Boarded { source: TripSource::Wifi, .. }
        ));
        assert_eq!(t.passenger_count(), PassengerCount { rfid: 0, wifi: 1, total: 1 });

        match t.apply(&wifi(WifiTransition::Disconnected, mac, 2000 + 9 * MIN)) {
            TripUpdate::Alighted(trip) => {
                assert_eq!(trip.id.as_str(), mac);
                assert_eq!(trip.source, TripSource::Wifi);
                assert_eq!(trip.duration_ms(), 9 * MIN);
                assert_eq!(trip.fare, 1800);
            }
            other => panic!("expected trip, got {:?}", other),
        }
        assert_eq!(t.passenger_count().total, 0);
    }

    #[test]
    fn unknown_disconnect_is_ignored() {
        let mut t = TripTracker::default();
        assert_eq!(
            t.apply(&wifi(WifiTransition::Disconnected, "00:00:00:00:00:01", 10)),
            TripUpdate::Ignored
        );
    }

    #[test]
    fn rfid_taps_toggle_onboard() {
        let mut t = TripTracker::default();
        assert!(matches!(t.apply(&tap("DEADBEEF", 0)), TripUpdate::Boarded { .. }));
        assert!(t.is_onboard("DEADBEEF"));

        match t.apply(&tap("DEADBEEF", 3 * MIN)) {
            TripUpdate::Alighted(trip) => {
                assert_eq!(trip.source, TripSource::Rfid);
                assert_eq!(trip.fare, 1000);
            }
            other => panic!("expected trip, got {:?}", other),
        }
        assert!(!t.is_onboard("DEADBEEF"));

        // third tap boards again
        assert!(matches!(t.apply(&tap("DEADBEEF", 4 * MIN)), TripUpdate::Boarded { .. }));
    }

    #[test]
    fn sources_are_counted_separately() {
        let mut t = TripTracker::default();
        t.apply(&tap("01020304", 0));
        t.apply(&tap("05060708", 0));
        t.apply(&wifi(WifiTransition::Connected, "AA:BB:CC:DD:EE:FF", 0));
        assert_eq!(t.passenger_count(), PassengerCount { rfid: 2, wifi: 1, total: 3 });
    }

    #[test]
    fn full_table_ignores_new_boarding() {
        let mut t = TripTracker::default();
        for i in 0..MAX_ONBOARD {
            let uid = std::format!("{:08X}", i);
            t.apply(&tap(&uid, 0));
        }
        assert_eq!(t.apply(&tap("FFFFFFFF", 0)), TripUpdate::Ignored);
        assert_eq!(t.passenger_count().rfid, MAX_ONBOARD);
    }

    #[test]
    fn alight_before_boarding_after_reboot_is_not_priced() {
        let mut t = TripTracker::default();
        t.apply(&tap("0A0B0C0D", 60 * MIN));
        // bridge rebooted, uptime restarted
        assert_eq!(t.apply(&tap("0A0B0C0D", 15 * MIN)), TripUpdate::Ignored);
        assert!(!t.is_onboard("0A0B0C0D"));

        let mac = "AA:BB:CC:DD:EE:02";
        t.apply(&wifi(WifiTransition::Connected, mac, 60 * MIN));
        assert_eq!(t.apply(&wifi(WifiTransition::Disconnected, mac, 2000)), TripUpdate::Ignored);
        assert_eq!(t.passenger_count().total, 0);
    }

    #[test]
    fn registered_card_uses_its_name() {
        let mut t = TripTracker::default();
        assert!(t.register_name("deadbeef", "Asha"));
        match t.apply(&tap("DEADBEEF", 0)) {
            TripUpdate::Boarded { name, source, .. } => {
                assert_eq!(name.as_str(), "Asha");
                assert_eq!(source, TripSource::Rfid);
            }
            other => panic!("expected boarding, got {:?}", other),
        }
        match t.apply(&tap("DEADBEEF", MIN)) {
            TripUpdate::Alighted(trip) => assert_eq!(trip.name.as_str(), "Asha"),
            other => panic!("expected trip, got {:?}", other),
        }
    }

    #[test]
    fn reregistering_a_card_replaces_its_name() {
        let mut t = TripTracker::default();
        assert!(t.register_name("01020304", "Old"));
        assert!(t.register_name("01020304", "New"));
        assert_eq!(t.name_for("01020304", TripSource::Rfid).as_str(), "New");
    }

    #[test]
    fn unknown_card_falls_back_to_uid_label() {
        let mut t = TripTracker::default();
        match t.apply(&tap("CAFEBABE", 0)) {
            TripUpdate::Boarded { name, .. } => assert_eq!(name.as_str(), "RFID_CAFEBABE"),
            other => panic!("expected boarding, got {:?}", other),
        }
    }

    #[test]
    fn wifi_rider_is_labelled_by_mac_tail() {
        let mut t = TripTracker::default();
        let mac = "AA:BB:CC:DD:EE:FF";
        t.apply(&wifi(WifiTransition::Connected, mac, 0));
        match t.apply(&wifi(WifiTransition::Disconnected, mac, MIN)) {
            TripUpdate::Alighted(trip) => assert_eq!(trip.name.as_str(), "WiFiUser_E:FF"),
            other => panic!("expected trip, got {:?}", other),
        }
    }

    #[test]
    fn name_table_rejects_oversized_entries() {
        let mut t = TripTracker::default();
        assert!(!t.register_name("00112233445566778899AA", "Too long uid"));
        assert!(!t.register_name("01020304", "a name far longer than thirty-two bytes"));
        for i in 0..MAX_NAMES {
            assert!(t.register_name(&std::format!("{:08X}", i), "Rider"));
        }
        assert!(!t.register_name("FFFFFFFF", "One too many"));
    }

    #[test]
    fn reconnect_refreshes_boarding_time() {
        let mut t = TripTracker::default();
        let mac = "AA:BB:CC:DD:EE:01";
        t.apply(&wifi(WifiTransition::Connected, mac, 0));
        t.apply(&wifi(WifiTransition::Connected, mac, MIN));
        assert_eq!(t.passenger_count().wifi, 1);
        match t.apply(&wifi(WifiTransition::Disconnected, mac, 2 * MIN)) {
            TripUpdate::Alighted(trip) => assert_eq!(trip.boarded, MIN),
            other => panic!("expected trip, got {:?}", other),
        }
    }
}
