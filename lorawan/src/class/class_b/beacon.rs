//! LoRaWAN Class B beacon contents
//!
//! The MAC demodulates beacons itself and hands the decoded fields to the
//! controller with every `Beacon` indication while the beacon is locked.

/// Beacon period in seconds
pub const BEACON_INTERVAL: u32 = 128;

/// Size of the gateway specific info field
pub const GW_INFO_SIZE: usize = 6;

/// Gateway specific part of a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GwSpecific {
    /// Info descriptor (0-2 GPS coordinates, 3 NetID+GatewayID)
    pub info_desc: u8,
    /// Descriptor dependent payload
    pub info: [u8; GW_INFO_SIZE],
}

/// Decoded beacon and its reception quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeaconInfo {
    /// Network time in seconds since the GPS epoch
    pub time: u32,
    /// Beacon frequency in Hz
    pub frequency: u32,
    /// Beacon datarate index
    pub datarate: u8,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Signal to noise ratio in dB
    pub snr: i8,
    /// Gateway specific info
    pub gw_specific: GwSpecific,
}

impl BeaconInfo {
    /// GPS time of the next expected beacon
    pub fn next_beacon_time(&self) -> u32 {
        let elapsed = self.time % BEACON_INTERVAL;
        self.time.wrapping_add(BEACON_INTERVAL - elapsed)
    }

    /// Returns `true` when the gateway info carries its GPS coordinates
    pub fn has_gateway_coordinates(&self) -> bool {
        self.gw_specific.info_desc <= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_beacon_time() {
        let beacon = BeaconInfo {
            time: 1_280,
            ..Default::default()
        };
        assert_eq!(beacon.next_beacon_time(), 1_408);

        let beacon = BeaconInfo {
            time: 1_300,
            ..Default::default()
        };
        assert_eq!(beacon.next_beacon_time(), 1_408);
    }

    #[test]
    fn test_gateway_coordinates() {
        let mut beacon = BeaconInfo::default();
        assert!(beacon.has_gateway_coordinates());

        beacon.gw_specific.info_desc = 3;
        assert!(!beacon.has_gateway_coordinates());
    }
}
