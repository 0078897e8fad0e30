//! MAC confirm and indication events
//!
//! The MAC stack reports the outcome of every request, and any unsolicited
//! network event, as a [`MacEvent`]. Events travel through a single-producer
//! single-consumer queue: the MAC owns the [`EventProducer`] and the device
//! controller drains the [`EventConsumer`] at the start of every step.

use core::fmt;

use heapless::spsc::{Consumer, Producer, Queue};
use heapless::Vec;

use super::mac::{McpsKind, MlmeKind, MAX_MAC_PAYLOAD_SIZE};
use crate::class::class_b::beacon::BeaconInfo;

/// Queue capacity type parameter. The queue holds one element less.
pub const EVENT_QUEUE_SIZE: usize = 8;

/// Queue carrying MAC events to the controller
pub type EventQueue = Queue<MacEvent, EVENT_QUEUE_SIZE>;

/// Writing half of the event queue, owned by the MAC stack
pub type EventProducer<'q> = Producer<'q, MacEvent, EVENT_QUEUE_SIZE>;

/// Reading half of the event queue, owned by the controller
pub type EventConsumer<'q> = Consumer<'q, MacEvent, EVENT_QUEUE_SIZE>;

/// Outcome carried by a confirm or indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventStatus {
    /// Service completed
    Ok,
    /// Unspecified failure
    Error,
    /// Transmission timed out
    TxTimeout,
    /// No downlink in RX1
    Rx1Timeout,
    /// No downlink in RX2
    Rx2Timeout,
    /// RX1 reception failed
    Rx1Error,
    /// RX2 reception failed
    Rx2Error,
    /// All join attempts failed
    JoinFail,
    /// Duplicate downlink frame counter
    DownlinkRepeated,
    /// Payload too large for the datarate
    TxDrPayloadSizeError,
    /// Downlink for another device
    AddressFail,
    /// Downlink failed integrity check
    MicFail,
    /// Beacon received and locked
    BeaconLocked,
    /// Beacon expected but not received
    BeaconNotFound,
    /// Beacon missed for too long
    BeaconLost,
}

impl EventStatus {
    /// Returns `true` for [`EventStatus::Ok`]
    pub const fn is_ok(self) -> bool {
        matches!(self, EventStatus::Ok)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Unsolicited management event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MlmeIndicationKind {
    /// The MAC needs an uplink as soon as possible
    ScheduleUplink,
    /// Beacon synchronization was lost
    BeaconLost,
    /// A beacon period elapsed
    Beacon,
}

impl fmt::Display for MlmeIndicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Completion of a data request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpsConfirm {
    /// Outcome
    pub status: EventStatus,
    /// Frame type that was sent
    pub kind: McpsKind,
    /// Acknowledgment received for a confirmed frame
    pub ack_received: bool,
    /// Datarate used for the transmission
    pub datarate: u8,
    /// Number of transmissions performed
    pub nb_retries: u8,
}

impl McpsConfirm {
    /// Create a confirm with no acknowledgment information
    pub fn new(status: EventStatus, kind: McpsKind) -> Self {
        Self {
            status,
            kind,
            ack_received: false,
            datarate: 0,
            nb_retries: 1,
        }
    }
}

/// Downlink received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpsIndication {
    /// Outcome
    pub status: EventStatus,
    /// Frame type received
    pub kind: McpsKind,
    /// Application port, zero for MAC-only frames
    pub port: u8,
    /// The server has more downlink data queued
    pub frame_pending: bool,
    /// The frame carried application data
    pub rx_data: bool,
    /// Application payload
    pub payload: Vec<u8, MAX_MAC_PAYLOAD_SIZE>,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Signal to noise ratio in dB
    pub snr: i8,
}

impl McpsIndication {
    /// Create an indication without application data
    pub fn new(status: EventStatus, kind: McpsKind) -> Self {
        Self {
            status,
            kind,
            port: 0,
            frame_pending: false,
            rx_data: false,
            payload: Vec::new(),
            rssi: 0,
            snr: 0,
        }
    }

    /// Set the frame-pending bit
    pub fn with_frame_pending(mut self, frame_pending: bool) -> Self {
        self.frame_pending = frame_pending;
        self
    }

    /// Attach application data, truncated to the maximum MAC payload
    pub fn with_payload(mut self, port: u8, data: &[u8]) -> Self {
        self.payload.clear();
        self.payload
            .extend(data.iter().take(MAX_MAC_PAYLOAD_SIZE).copied());
        self.port = port;
        self.rx_data = true;
        self
    }
}

/// Completion of a management request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MlmeConfirm {
    /// Outcome
    pub status: EventStatus,
    /// Request that completed
    pub kind: MlmeKind,
    /// Link margin reported by LinkCheckAns
    pub demod_margin: u8,
    /// Gateways that received the LinkCheckReq
    pub nb_gateways: u8,
}

impl MlmeConfirm {
    /// Create a confirm without link-check information
    pub fn new(status: EventStatus, kind: MlmeKind) -> Self {
        Self {
            status,
            kind,
            demod_margin: 0,
            nb_gateways: 0,
        }
    }
}

/// Unsolicited management event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MlmeIndication {
    /// Event type
    pub kind: MlmeIndicationKind,
    /// Outcome
    pub status: EventStatus,
    /// Beacon contents, present when a beacon was received
    pub beacon: Option<BeaconInfo>,
}

impl MlmeIndication {
    /// Create an indication without beacon contents
    pub fn new(kind: MlmeIndicationKind, status: EventStatus) -> Self {
        Self {
            kind,
            status,
            beacon: None,
        }
    }

    /// Indication for a received and locked beacon
    pub fn beacon_locked(info: BeaconInfo) -> Self {
        Self {
            kind: MlmeIndicationKind::Beacon,
            status: EventStatus::BeaconLocked,
            beacon: Some(info),
        }
    }
}

/// Event raised by the MAC stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacEvent {
    /// A data request completed
    McpsConfirm(McpsConfirm),
    /// A downlink was received
    McpsIndication(McpsIndication),
    /// A management request completed
    MlmeConfirm(MlmeConfirm),
    /// An unsolicited management event occurred
    MlmeIndication(MlmeIndication),
}

impl From<McpsConfirm> for MacEvent {
    fn from(confirm: McpsConfirm) -> Self {
        MacEvent::McpsConfirm(confirm)
    }
}

impl From<McpsIndication> for MacEvent {
    fn from(indication: McpsIndication) -> Self {
        MacEvent::McpsIndication(indication)
    }
}

impl From<MlmeConfirm> for MacEvent {
    fn from(confirm: MlmeConfirm) -> Self {
        MacEvent::MlmeConfirm(confirm)
    }
}

impl From<MlmeIndication> for MacEvent {
    fn from(indication: MlmeIndication) -> Self {
        MacEvent::MlmeIndication(indication)
    }
}
