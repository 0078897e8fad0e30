//! LoRaWAN Class B helpers
//!
//! This module holds the Class B data the controller exchanges with the MAC:
//! - Beacon contents reported on every locked beacon
//! - Ping slot periodicity announced in PingSlotInfoReq

/// Beacon contents
pub mod beacon;

/// Ping slot periodicity
pub mod ping_slot;

pub use beacon::BeaconInfo;
pub use ping_slot::PingSlotPeriodicity;
