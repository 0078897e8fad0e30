use core::time::Duration;

use crate::class::class_b::ping_slot::PingSlotPeriodicity;
use crate::device::WakeUpState;
use crate::lorawan::mac::ChannelMask;
use crate::lorawan::region::Region;

/// EUI-64 (8 bytes)
pub type EUI64 = [u8; 8];
/// AES-128 key (16 bytes)
pub type AESKey = [u8; 16];
/// Device Address (4 bytes)
pub type DevAddr = [u8; 4];

/// Session parameters for activation by personalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbpSession {
    /// Network identifier
    pub net_id: u32,
    /// Device address
    pub dev_addr: DevAddr,
    /// Network session key
    pub nwk_skey: AESKey,
    /// Application session key
    pub app_skey: AESKey,
}

/// Device credentials for both OTAA and ABP activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device EUI (unique device identifier)
    pub dev_eui: EUI64,
    /// Application EUI
    pub app_eui: EUI64,
    /// Application key (used for OTAA)
    pub app_key: AESKey,
    /// Preconfigured session (ABP only)
    pub abp: Option<AbpSession>,
}

impl DeviceConfig {
    /// Create a new OTAA device configuration
    pub fn new_otaa(dev_eui: EUI64, app_eui: EUI64, app_key: AESKey) -> Self {
        Self {
            dev_eui,
            app_eui,
            app_key,
            abp: None,
        }
    }

    /// Create a new ABP device configuration
    pub fn new_abp(
        dev_eui: EUI64,
        app_eui: EUI64,
        net_id: u32,
        dev_addr: DevAddr,
        nwk_skey: AESKey,
        app_skey: AESKey,
    ) -> Self {
        Self {
            dev_eui,
            app_eui,
            app_key: [0; 16], // Not used in ABP
            abp: Some(AbpSession {
                net_id,
                dev_addr,
                nwk_skey,
                app_skey,
            }),
        }
    }

    /// Returns `true` when the device joins over the air
    pub fn is_otaa(&self) -> bool {
        self.abp.is_none()
    }
}

/// Mechanism used to synchronize with the beacon schedule after joining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeSyncStrategy {
    /// Ask the network for its GPS time (DeviceTimeReq)
    #[default]
    DeviceTime,
    /// Ask the network for the time to the next beacon (BeaconTimingReq)
    BeaconTiming,
}

impl TimeSyncStrategy {
    /// State the device resumes into to (re)start synchronization
    pub const fn entry_state(self) -> WakeUpState {
        match self {
            TimeSyncStrategy::DeviceTime => WakeUpState::ReqDeviceTime,
            TimeSyncStrategy::BeaconTiming => WakeUpState::ReqBeaconTiming,
        }
    }
}

/// Application data transmission duty cycle
pub const APP_TX_DUTYCYCLE: Duration = Duration::from_secs(30);
/// Upper bound of the random delay added to the duty cycle
pub const APP_TX_DUTYCYCLE_RND: Duration = Duration::from_secs(5);
/// Default datarate (DR_0)
pub const DEFAULT_DATARATE: u8 = 0;
/// Default application port
pub const DEFAULT_APP_PORT: u8 = 2;
/// Default channel mask, first eight channels enabled
pub const DEFAULT_CHANNEL_MASK: ChannelMask = [0x00FF, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000];

/// Application behaviour of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Regional parameters the MAC is initialized with
    pub region: Region,
    /// Fixed part of the uplink interval
    pub duty_cycle: Duration,
    /// Upper bound of the random part of the uplink interval
    pub duty_cycle_jitter: Duration,
    /// Datarate for uplinks when ADR is off
    pub datarate: u8,
    /// Send confirmed uplinks
    pub confirmed: bool,
    /// Enable adaptive data rate
    pub adr: bool,
    /// Use the public network sync word
    pub public_network: bool,
    /// Application port for uplinks
    pub port: u8,
    /// Ping slot periodicity requested when switching to Class B
    pub ping_slot_periodicity: PingSlotPeriodicity,
    /// Time synchronization mechanism
    pub time_sync: TimeSyncStrategy,
    /// Default and active channel mask applied at start-up
    pub channel_mask: ChannelMask,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: Region::CN470,
            duty_cycle: APP_TX_DUTYCYCLE,
            duty_cycle_jitter: APP_TX_DUTYCYCLE_RND,
            datarate: DEFAULT_DATARATE,
            confirmed: false,
            adr: true,
            public_network: true,
            port: DEFAULT_APP_PORT,
            ping_slot_periodicity: PingSlotPeriodicity::default(),
            time_sync: TimeSyncStrategy::DeviceTime,
            channel_mask: DEFAULT_CHANNEL_MASK,
        }
    }
}

impl AppConfig {
    /// Set the region
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Set the uplink interval and its random part
    pub fn with_duty_cycle(mut self, duty_cycle: Duration, jitter: Duration) -> Self {
        self.duty_cycle = duty_cycle;
        self.duty_cycle_jitter = jitter;
        self
    }

    /// Send confirmed or unconfirmed uplinks
    pub fn with_confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    /// Set the application port
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    /// Set the time synchronization mechanism
    pub fn with_time_sync(mut self, time_sync: TimeSyncStrategy) -> Self {
        self.time_sync = time_sync;
        self
    }

    /// Set the ping slot periodicity
    pub fn with_ping_slot_periodicity(mut self, periodicity: PingSlotPeriodicity) -> Self {
        self.ping_slot_periodicity = periodicity;
        self
    }

    /// Set the channel mask
    pub fn with_channel_mask(mut self, mask: ChannelMask) -> Self {
        self.channel_mask = mask;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let app = AppConfig::default();
        assert_eq!(app.region, Region::CN470);
        assert_eq!(app.duty_cycle, Duration::from_secs(30));
        assert_eq!(app.duty_cycle_jitter, Duration::from_secs(5));
        assert_eq!(app.port, 2);
        assert!(app.adr);
        assert!(!app.confirmed);
        assert_eq!(app.channel_mask[0], 0x00FF);
        assert_eq!(app.time_sync.entry_state(), WakeUpState::ReqDeviceTime);
    }

    #[test]
    fn test_activation_modes() {
        let otaa = DeviceConfig::new_otaa([1; 8], [2; 8], [3; 16]);
        assert!(otaa.is_otaa());

        let abp = DeviceConfig::new_abp([1; 8], [2; 8], 0x13, [4; 4], [5; 16], [6; 16]);
        assert!(!abp.is_otaa());
        assert_eq!(abp.abp.map(|session| session.dev_addr), Some([4; 4]));
        assert_eq!(
            TimeSyncStrategy::BeaconTiming.entry_state(),
            WakeUpState::ReqBeaconTiming
        );
    }
}
