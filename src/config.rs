/// Compile-time bridge configuration.
///
/// Loop timing is fixed at build time. Soft-AP credentials come from build
/// environment variables so they stay out of the source tree:
///
/// ```text
/// FAREBRIDGE_AP_SSID=Bus42 FAREBRIDGE_AP_PASSWORD=hunter22 cargo build --release
/// ```

/// Shortest settling delay that reliably prevents a double read of one tap.
pub const MIN_SETTLE_MS: u32 = 200;

/// Loop timing for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Interval between station-table snapshots
    pub station_tick_ms: u32,
    /// Pause after a card read before the reader is polled again
    pub settle_ms: u32,
    /// Pause between loop iterations
    pub loop_yield_ms: u32,
}

impl BridgeConfig {
    pub const fn new() -> Self {
        Self {
            station_tick_ms: 2000,
            settle_ms: MIN_SETTLE_MS,
            loop_yield_ms: 10,
        }
    }

    /// Override the settling delay. Values below [`MIN_SETTLE_MS`] are raised to it.
    pub const fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = if settle_ms < MIN_SETTLE_MS {
            MIN_SETTLE_MS
        } else {
            settle_ms
        };
        self
    }

    pub const fn with_station_tick_ms(mut self, station_tick_ms: u32) -> Self {
        self.station_tick_ms = station_tick_ms;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft access point settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApConfig {
    pub ssid: &'static str,
    pub password: &'static str,
    pub channel: u8,
    /// Station limit enforced by the driver (ESP-IDF caps this at 15)
    pub max_connections: u16,
}

impl ApConfig {
    pub const fn new() -> Self {
        Self {
            ssid: match option_env!("FAREBRIDGE_AP_SSID") {
                Some(s) => s,
                None => "FareBridge",
            },
            password: match option_env!("FAREBRIDGE_AP_PASSWORD") {
                Some(p) => p,
                None => "",
            },
            channel: match option_env!("FAREBRIDGE_AP_CHANNEL") {
                Some(c) => parse_channel(c),
                None => 6,
            },
            max_connections: 15,
        }
    }

    /// WPA2 needs at least 8 bytes of passphrase; anything shorter runs open.
    pub const fn is_open(&self) -> bool {
        self.password.len() < 8
    }
}

impl Default for ApConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a 2.4 GHz channel number, falling back to 6 when out of range.
const fn parse_channel(s: &str) -> u8 {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 2 {
        return 6;
    }
    let mut value: u8 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            return 6;
        }
        value = value * 10 + (b - b'0');
        i += 1;
    }
    if value >= 1 && value <= 13 {
        value
    } else {
        6
    }
}
