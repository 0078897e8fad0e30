//! Device and application configuration
//!
//! This module contains the settings the controller runs with. It includes:
//! - Device credentials (DevEUI, AppEUI, keys) for OTAA or ABP
//! - Application policy (duty cycle, port, confirmed uplinks, time sync)
//! - MAC parameters applied at start-up (ADR, network type, channel mask)

/// Device credentials and application settings
pub mod device;

pub use device::{AppConfig, DeviceConfig, TimeSyncStrategy};
