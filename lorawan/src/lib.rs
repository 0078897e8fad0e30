//! LoRaWAN Class A/B device lifecycle controller
//!
//! This crate drives a LoRaWAN end-device from power-up to Class B operation on
//! top of an external MAC stack. It joins the network, synchronizes time, locks
//! onto the beacon, negotiates ping slots and then sends periodic uplinks, all
//! through non-blocking request/confirm pairs.
//!
//! # Features
//! - OTAA and ABP activation
//! - DeviceTime or BeaconTiming based time synchronization
//! - Automatic Class A/B switching on beacon lock and loss
//! - Duty-cycled uplinks with random jitter
//! - MAC events delivered through a lock-free single-producer queue
//! - No unsafe code
//!
//! # Example
//! ```ignore
//! use lorawan_classb::{
//!     config::device::{AppConfig, DeviceConfig},
//!     device::ClassBDevice,
//!     lorawan::events::EventQueue,
//! };
//!
//! let mut queue = EventQueue::new();
//! let (producer, consumer) = queue.split();
//!
//! // The MAC stack keeps the producer and pushes its confirms/indications into it.
//! let mac = MyMac::new(producer);
//!
//! let config = DeviceConfig::new_otaa([0x01; 8], [0x00; 8], [0x2B; 16]);
//! let mut device = ClassBDevice::new(config, AppConfig::default(), mac, timer, rng, consumer);
//!
//! loop {
//!     device.step()?;
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(test), no_std)]

#[cfg(not(any(feature = "log", feature = "defmt")))]
compile_error!("enable the `log` or the `defmt` feature");

/// Device class handling (A/B) and Class B helpers
pub mod class;

/// Device credentials and application configuration
pub mod config;

/// Device lifecycle state machine
pub mod device;

/// Interface to the external LoRaWAN MAC stack
pub mod lorawan;
