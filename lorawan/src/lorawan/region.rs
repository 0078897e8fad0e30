use core::fmt;

/// Regional parameter set the MAC stack is initialized with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// Asia 923 MHz
    AS923,
    /// Australia 915 MHz
    AU915,
    /// China 470 MHz
    #[default]
    CN470,
    /// China 779 MHz
    CN779,
    /// Europe 433 MHz
    EU433,
    /// Europe 868 MHz
    EU868,
    /// South Korea 920 MHz
    KR920,
    /// India 865 MHz
    IN865,
    /// North America 915 MHz
    US915,
    /// Russia 864 MHz
    RU864,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
