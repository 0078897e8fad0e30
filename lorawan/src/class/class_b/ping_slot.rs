//! LoRaWAN Class B Ping Slot Periodicity
//!
//! The periodicity is announced to the network in PingSlotInfoReq. A value of
//! `p` opens a receive slot every 2^p seconds, i.e. 128 >> p slots per beacon
//! period.

use core::fmt;

/// Largest valid periodicity
pub const MAX_PERIODICITY: u8 = 7;

/// Ping slot periodicity (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PingSlotPeriodicity(u8);

impl PingSlotPeriodicity {
    /// Create a periodicity, `None` if out of range
    pub const fn new(periodicity: u8) -> Option<Self> {
        if periodicity <= MAX_PERIODICITY {
            Some(Self(periodicity))
        } else {
            None
        }
    }

    /// Raw periodicity value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Seconds between two ping slots
    pub const fn period_seconds(self) -> u32 {
        1 << self.0
    }

    /// Number of ping slots per beacon period
    pub const fn ping_nb(self) -> u32 {
        128 >> self.0
    }
}

impl fmt::Display for PingSlotPeriodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.period_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodicity_range() {
        assert!(PingSlotPeriodicity::new(0).is_some());
        assert!(PingSlotPeriodicity::new(7).is_some());
        assert!(PingSlotPeriodicity::new(8).is_none());
        assert_eq!(PingSlotPeriodicity::new(5).map(PingSlotPeriodicity::value), Some(5));
    }

    #[test]
    fn test_slot_timing() {
        let fastest = PingSlotPeriodicity::default();
        assert_eq!(fastest.period_seconds(), 1);
        assert_eq!(fastest.ping_nb(), 128);

        let slowest = PingSlotPeriodicity::new(MAX_PERIODICITY).unwrap();
        assert_eq!(slowest.period_seconds(), 128);
        assert_eq!(slowest.ping_nb(), 1);
        assert_eq!(slowest.to_string(), "128s");
    }
}
