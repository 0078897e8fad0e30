use core::fmt;

use super::region::Region;
use crate::class::class_b::ping_slot::PingSlotPeriodicity;
use crate::class::DeviceClass;
use crate::config::device::{AESKey, DevAddr, EUI64};

/// Maximum MAC payload size
pub const MAX_MAC_PAYLOAD_SIZE: usize = 242;

/// Number of join attempts the MAC makes per join request
pub const JOIN_NB_TRIALS: u8 = 8;

/// Number of transmissions the MAC makes for a confirmed uplink
pub const UPLINK_NB_TRIALS: u8 = 8;

/// Synchronous status returned when the MAC refuses a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacStatus {
    /// Another request is still being processed
    Busy,
    /// The request type is not supported
    ServiceUnknown,
    /// A request parameter is invalid
    ParameterInvalid,
    /// The selected frequency is invalid
    FrequencyInvalid,
    /// The selected datarate is invalid
    DatarateInvalid,
    /// The payload does not fit the current datarate
    LengthError,
    /// The device has not joined a network yet
    NoNetworkJoined,
    /// Regional duty-cycle limits forbid transmitting now
    DutyCycleRestricted,
    /// Unspecified failure
    Error,
}

impl fmt::Display for MacStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Management (MLME) request and confirm types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MlmeKind {
    /// Over-the-air join
    Join,
    /// Link check (LinkCheckReq)
    LinkCheck,
    /// Network time request (DeviceTimeReq)
    DeviceTime,
    /// Beacon timing request (BeaconTimingReq)
    BeaconTiming,
    /// Beacon acquisition
    BeaconAcquisition,
    /// Ping slot negotiation (PingSlotInfoReq)
    PingSlotInfo,
}

impl fmt::Display for MlmeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Data (MCPS) frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McpsKind {
    /// Unconfirmed data frame
    Unconfirmed,
    /// Confirmed data frame
    Confirmed,
    /// Multicast data frame
    Multicast,
    /// Proprietary frame
    Proprietary,
}

impl fmt::Display for McpsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// OTAA join request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    /// Device EUI
    pub dev_eui: EUI64,
    /// Application (join) EUI
    pub app_eui: EUI64,
    /// Application root key
    pub app_key: AESKey,
    /// Number of join attempts handled inside the MAC
    pub nb_trials: u8,
}

/// Management request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlmeRequest {
    /// Join the network over the air
    Join(JoinParams),
    /// Check link quality with the next uplink
    LinkCheck,
    /// Request network time with the next uplink
    DeviceTime,
    /// Request beacon timing with the next uplink
    BeaconTiming,
    /// Start searching for the network beacon
    BeaconAcquisition,
    /// Announce the ping slot periodicity to the network
    PingSlotInfo(PingSlotPeriodicity),
}

impl MlmeRequest {
    /// Confirm type the MAC will answer this request with
    pub fn kind(&self) -> MlmeKind {
        match self {
            MlmeRequest::Join(_) => MlmeKind::Join,
            MlmeRequest::LinkCheck => MlmeKind::LinkCheck,
            MlmeRequest::DeviceTime => MlmeKind::DeviceTime,
            MlmeRequest::BeaconTiming => MlmeKind::BeaconTiming,
            MlmeRequest::BeaconAcquisition => MlmeKind::BeaconAcquisition,
            MlmeRequest::PingSlotInfo(_) => MlmeKind::PingSlotInfo,
        }
    }
}

/// Data request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpsRequest<'a> {
    /// Best-effort uplink. A `None` port sends MAC commands only.
    Unconfirmed {
        /// Application port
        port: Option<u8>,
        /// Application payload
        payload: &'a [u8],
        /// Datarate used when ADR is off
        datarate: u8,
    },
    /// Uplink that requires an acknowledgment
    Confirmed {
        /// Application port
        port: u8,
        /// Application payload
        payload: &'a [u8],
        /// Datarate used when ADR is off
        datarate: u8,
        /// Number of transmissions handled inside the MAC
        nb_trials: u8,
    },
}

impl McpsRequest<'_> {
    /// Frame type of this request
    pub fn kind(&self) -> McpsKind {
        match self {
            McpsRequest::Unconfirmed { .. } => McpsKind::Unconfirmed,
            McpsRequest::Confirmed { .. } => McpsKind::Confirmed,
        }
    }

    /// Application payload carried by this request
    pub fn payload(&self) -> &[u8] {
        match self {
            McpsRequest::Unconfirmed { payload, .. } | McpsRequest::Confirmed { payload, .. } => {
                payload
            }
        }
    }
}

/// Channel mask, one bit per channel
pub type ChannelMask = [u16; 6];

/// MAC information base attribute written by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MibParam {
    /// Adaptive data rate
    Adr(bool),
    /// Public (true) or private network sync word
    PublicNetwork(bool),
    /// Channel mask restored on MAC reset
    ChannelsDefaultMask(ChannelMask),
    /// Active channel mask
    ChannelsMask(ChannelMask),
    /// Network identifier (ABP)
    NetId(u32),
    /// Device address (ABP)
    DevAddr(DevAddr),
    /// Network session key (ABP)
    NwkSKey(AESKey),
    /// Application session key (ABP)
    AppSKey(AESKey),
    /// Marks the session as joined (ABP)
    NetworkJoined(bool),
    /// Active device class
    DeviceClass(DeviceClass),
}

/// Result of a transmit-possibility query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInfo {
    /// Largest application payload possible at the current datarate
    pub max_possible_payload: u8,
    /// Payload size including pending MAC commands
    pub current_payload_size: u8,
}

/// Interface to the LoRaWAN MAC stack
///
/// Requests return once the MAC has accepted or refused them. Their outcome is
/// reported later as a [`MacEvent`](super::events::MacEvent) pushed into the
/// event queue the MAC was built with, possibly before the request call returns.
pub trait LoRaMac {
    /// Error type for stack initialization
    type Error;

    /// Initialize the stack for the given region
    fn init(&mut self, region: Region) -> Result<(), Self::Error>;

    /// Write a MAC information base attribute
    fn set_mib(&mut self, param: MibParam) -> Result<(), MacStatus>;

    /// Issue a management request
    fn mlme_request(&mut self, request: MlmeRequest) -> Result<(), MacStatus>;

    /// Issue a data request
    fn mcps_request(&mut self, request: McpsRequest<'_>) -> Result<(), MacStatus>;

    /// Check whether the device holds a network session
    fn is_network_joined(&self) -> bool;

    /// Check whether a payload of `size` bytes can be sent with the pending MAC commands
    fn query_tx_possible(&mut self, size: usize) -> Result<TxInfo, MacStatus>;

    /// Run pending radio and MAC processing while the device sleeps
    fn process(&mut self);
}
