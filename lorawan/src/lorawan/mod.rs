//! LoRaWAN MAC interface
//!
//! The protocol engine itself lives outside this crate. This module describes
//! what the controller needs from it:
//! - MAC requests and their synchronous status
//! - Asynchronous confirm/indication events
//! - Regional parameter selection

/// Confirm and indication events raised by the MAC stack
pub mod events;

/// MAC request interface
pub mod mac;

/// Regional parameter identifiers
pub mod region;

pub use events::{EventConsumer, EventProducer, EventQueue, MacEvent};
pub use mac::{LoRaMac, MacStatus};
pub use region::Region;
