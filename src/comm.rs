/// Communication layer: serial NDJSON transport to the host.
///
/// The bridge streams one JSON record per detected event, newline
/// terminated. The emitter holds the only handle to the host link. The
/// decoding half (`LineReader`, `parse_record`) is what the host side
/// runs over the same stream.

use crate::error::TransportError;
use crate::event::{Event, WifiTransition};
use crate::protocol::{DeviceMessage, HostRecord, MsgBuffer, RawRecord, MAX_MSG_LEN};

/// Serial baud rate
pub const SERIAL_BAUD: u32 = 115200;

/// Byte sink towards the host.
pub trait HostLink {
    /// Write one complete record. `line` includes its terminating `\n`.
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError>;
}

impl<L: HostLink + ?Sized> HostLink for &mut L {
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        (**self).write_line(line)
    }
}

// ── Serialization helpers ──────────────────────────────────────────────

/// Serialize a DeviceMessage to JSON bytes and append the NDJSON newline.
/// Returns the number of bytes written, or None if the record plus its
/// newline does not fit.
pub fn serialize_message(msg: &DeviceMessage, buf: &mut [u8]) -> Option<usize> {
    match serde_json_core::to_slice(msg, buf) {
        Ok(len) if len < buf.len() => {
            buf[len] = b'\n';
            Some(len + 1)
        }
        _ => None,
    }
}

/// Render an event as its newline-terminated wire record.
pub fn encode_event(event: &Event) -> Result<MsgBuffer, TransportError> {
    let mut buf = MsgBuffer::new();
    buf.resize_default(MAX_MSG_LEN)
        .map_err(|_| TransportError::Serialize)?;

    let len = match event {
        Event::RadioJoined { peer, timestamp } | Event::RadioLeft { peer, timestamp } => {
            let transition = if matches!(event, Event::RadioJoined { .. }) {
                WifiTransition::Connected
            } else {
                WifiTransition::Disconnected
            };
            let mac = peer.to_mac_string();
            let msg = DeviceMessage::WifiEvent {
                event: transition.as_str(),
                mac: &mac,
                ts: *timestamp,
            };
            serialize_message(&msg, &mut buf)
        }
        Event::CardPresented { card, timestamp } => {
            let uid = card.to_uid_string();
            let msg = DeviceMessage::Rfid {
                uid: &uid,
                ts: *timestamp,
            };
            serialize_message(&msg, &mut buf)
        }
    };

    let len = len.ok_or(TransportError::Serialize)?;
    buf.truncate(len);
    Ok(buf)
}

/// Writes events to the host, one record per call.
pub struct EventEmitter<L> {
    link: L,
    sent: u32,
}

impl<L: HostLink> EventEmitter<L> {
    pub const fn new(link: L) -> Self {
        Self { link, sent: 0 }
    }

    /// Encode `event` and write it. Failures are returned, never retried.
    pub fn emit(&mut self, event: &Event) -> Result<(), TransportError> {
        let line = encode_event(event)?;
        self.link.write_line(&line)?;
        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }

    /// Records successfully written since boot
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

// ── Host-side decoding ─────────────────────────────────────────────────

/// Decode one NDJSON line into a [`HostRecord`].
///
/// Returns `None` for anything that is not a well-formed `wifi_event` or
/// `rfid` record, including log lines sharing the serial console.
pub fn parse_record(data: &[u8]) -> Option<HostRecord> {
    let trimmed = trim_trailing_whitespace(data);
    if trimmed.is_empty() || trimmed[0] != b'{' {
        return None;
    }
    let (raw, _) = serde_json_core::from_slice::<RawRecord>(trimmed).ok()?;
    let ts = raw.ts?;

    match raw.kind.as_str() {
        "wifi_event" => {
            let transition = WifiTransition::parse(raw.event?.as_str())?;
            let mut mac = raw.mac?;
            mac.make_ascii_uppercase();
            Some(HostRecord::Wifi { transition, mac, ts })
        }
        "rfid" => {
            let mut uid = raw.uid?;
            uid.make_ascii_uppercase();
            Some(HostRecord::Rfid { uid, ts })
        }
        _ => None,
    }
}

/// Serial NDJSON reader state machine.
/// Accumulates bytes until a newline is found, then yields the line.
pub struct LineReader {
    buf: [u8; MAX_MSG_LEN],
    pos: usize,
    overflowed: bool,
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_MSG_LEN],
            pos: 0,
            overflowed: false,
        }
    }

    /// Feed a byte into the reader. Returns a complete line (without newline)
    /// when one is detected. An over-long line is discarded up to its newline.
    pub fn feed(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == b'\n' || byte == b'\r' {
            let complete = self.pos > 0 && !self.overflowed;
            let len = self.pos;
            self.pos = 0;
            self.overflowed = false;
            if complete {
                Some(&self.buf[..len])
            } else {
                None
            }
        } else if self.overflowed {
            None
        } else if self.pos < self.buf.len() {
            self.buf[self.pos] = byte;
            self.pos += 1;
            None
        } else {
            self.pos = 0;
            self.overflowed = true;
            None
        }
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && (data[end - 1] == b' ' || data[end - 1] == b'\n' || data[end - 1] == b'\r' || data[end - 1] == b'\t') {
        end -= 1;
    }
    &data[..end]
}
