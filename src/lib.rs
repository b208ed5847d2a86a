//! FareBridge library: portable event-detection core for the bus bridge.
//!
//! The bridge watches two sources on board a vehicle: phones associating
//! with its WiFi access point, and transit cards tapped on an MFRC522
//! reader. It emits one NDJSON record per detected change over serial to a
//! host aggregator. This crate holds all detection, ordering, and protocol
//! logic with no platform dependencies, testable on any host with
//! `cargo test --no-default-features --lib`. The ESP32 firmware binary is a
//! thin consumer that supplies the radio, reader, serial and clock.
//!
//! Modules:
//! - **Device side**: `station`, `card`, `comm`, `scheduler`, plus the
//!   shared `event`, `protocol`, `config`, `board`, `error`.
//! - **Host side**: `comm::parse_record`, `comm::LineReader` and `trips`,
//!   for decoding the stream and pricing rides.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod card;
pub mod comm;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod scheduler;
pub mod station;
pub mod trips;

#[cfg(test)]
mod mock;
