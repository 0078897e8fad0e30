//! LoRaWAN device classes
//!
//! The controller starts every session in Class A and moves to Class B once the
//! ping slot negotiation succeeds. Losing the beacon drops it back to Class A.

/// Class B beacon and ping slot helpers
pub mod class_b;

use core::fmt;

/// LoRaWAN device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    /// Class A: Uplink followed by two receive windows
    #[default]
    A,
    /// Class B: Additional receive slots synchronized with the network beacon
    B,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::A => f.write_str("A"),
            DeviceClass::B => f.write_str("B"),
        }
    }
}
