//! High-level LoRaWAN device controller
//!
//! This module drives the device lifecycle: join, time synchronization, beacon
//! acquisition, ping slot negotiation, the Class A/B switch and periodic
//! uplinks. Every stage is a non-blocking MAC request whose outcome arrives
//! later as a [`MacEvent`]; the controller reacts to those events and to the
//! duty-cycle timer.

/// Application uplink frame
pub mod frame;

/// Duty-cycle timer
pub mod timer;

use core::fmt;
use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use heapless::Vec;
use rand_core::RngCore;

#[cfg(feature = "defmt")]
#[allow(unused_imports)]
use defmt::{debug, error, info, warn};

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[allow(unused_imports)]
use log::{debug, error, info, warn};

use crate::{
    class::{class_b::beacon::BeaconInfo, DeviceClass},
    config::device::{AppConfig, DeviceConfig},
    lorawan::{
        events::{
            EventConsumer, MacEvent, McpsConfirm, McpsIndication, MlmeConfirm, MlmeIndication,
            EventStatus, MlmeIndicationKind,
        },
        mac::{
            JoinParams, LoRaMac, McpsRequest, MibParam, MlmeKind, MlmeRequest, JOIN_NB_TRIALS,
            MAX_MAC_PAYLOAD_SIZE, UPLINK_NB_TRIALS,
        },
    },
};

use self::frame::AppFrame;
use self::timer::{duty_cycle_deadline, DutyCycleTimer};

/// Device controller error type
#[derive(Debug)]
pub enum DeviceError<E> {
    /// The MAC stack failed to initialize
    Init(E),
}

impl<E: fmt::Debug> fmt::Display for DeviceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Init(err) => write!(f, "MAC initialization failed: {:?}", err),
        }
    }
}

/// Device lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Initialize the MAC stack
    Init,
    /// Join the network
    Join,
    /// Send an application uplink
    Send,
    /// Request network time
    ReqDeviceTime,
    /// Negotiate ping slots
    ReqPingSlotAck,
    /// Request beacon timing
    ReqBeaconTiming,
    /// Start beacon acquisition
    BeaconAcquisition,
    /// Switch device class
    SwitchClass,
    /// Arm the duty-cycle timer
    Cycle {
        /// Delay until the next wake-up
        deadline: Duration,
    },
    /// Wait for the timer or a MAC event
    Sleep,
}

impl DeviceState {
    /// State name
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Init => "INIT",
            DeviceState::Join => "JOIN",
            DeviceState::Send => "SEND",
            DeviceState::ReqDeviceTime => "REQ_DEVICE_TIME",
            DeviceState::ReqPingSlotAck => "REQ_PINGSLOT_ACK",
            DeviceState::ReqBeaconTiming => "REQ_BEACON_TIMING",
            DeviceState::BeaconAcquisition => "BEACON_ACQUISITION",
            DeviceState::SwitchClass => "SWITCH_CLASS",
            DeviceState::Cycle { .. } => "CYCLE",
            DeviceState::Sleep => "SLEEP",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// States the device can resume into when it wakes up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeUpState {
    /// Send an application uplink
    Send,
    /// Request network time
    ReqDeviceTime,
    /// Request beacon timing
    ReqBeaconTiming,
    /// Negotiate ping slots
    ReqPingSlotAck,
}

impl From<WakeUpState> for DeviceState {
    fn from(state: WakeUpState) -> Self {
        match state {
            WakeUpState::Send => DeviceState::Send,
            WakeUpState::ReqDeviceTime => DeviceState::ReqDeviceTime,
            WakeUpState::ReqBeaconTiming => DeviceState::ReqBeaconTiming,
            WakeUpState::ReqPingSlotAck => DeviceState::ReqPingSlotAck,
        }
    }
}

impl fmt::Display for WakeUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DeviceState::from(*self).as_str())
    }
}

/// Link quality reported by the last LinkCheckAns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCheck {
    /// Demodulation margin in dB
    pub demod_margin: u8,
    /// Number of gateways that received the request
    pub nb_gateways: u8,
}

/// Application data received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    /// Application port
    pub port: u8,
    /// Payload
    pub data: Vec<u8, MAX_MAC_PAYLOAD_SIZE>,
}

/// LoRaWAN Class A/B device controller
pub struct ClassBDevice<'q, M, T, R> {
    /// Device credentials
    config: DeviceConfig,
    /// Application settings
    app: AppConfig,
    /// MAC stack
    mac: M,
    /// Events raised by the MAC stack
    events: EventConsumer<'q>,
    /// Next uplink timer
    timer: DutyCycleTimer<T>,
    /// Source of duty-cycle jitter
    rng: R,
    /// Current state
    state: DeviceState,
    /// State to resume into on the next wake-up
    wake_up: WakeUpState,
    /// A new request may be issued
    ready: bool,
    /// Device class last applied to the MAC
    class: DeviceClass,
    /// Uplink payload
    frame: AppFrame,
    /// Last locked beacon, cleared when a beacon is missed
    beacon: Option<BeaconInfo>,
    /// Last link check answer
    link_check: Option<LinkCheck>,
    /// Downlink not yet taken by the application
    downlink: Option<Downlink>,
}

impl<'q, M, T, R> ClassBDevice<'q, M, T, R>
where
    M: LoRaMac,
    T: CountDown + Cancel,
    T::Time: From<Duration>,
    R: RngCore,
{
    /// Create a new device controller in the `Init` state
    pub fn new(
        config: DeviceConfig,
        app: AppConfig,
        mac: M,
        timer: T,
        rng: R,
        events: EventConsumer<'q>,
    ) -> Self {
        let wake_up = app.time_sync.entry_state();
        let frame = AppFrame::new(app.port);

        Self {
            config,
            app,
            mac,
            events,
            timer: DutyCycleTimer::new(timer),
            rng,
            state: DeviceState::Init,
            wake_up,
            ready: true,
            class: DeviceClass::A,
            frame,
            beacon: None,
            link_check: None,
            downlink: None,
        }
    }

    /// Run one iteration of the device lifecycle
    ///
    /// Pending MAC events are handled first, then the duty-cycle timer is
    /// checked, then the current state issues at most one MAC request. Only
    /// a failed MAC initialization is reported; the `Init` state is kept so
    /// the next call retries it.
    pub fn step(&mut self) -> Result<(), DeviceError<M::Error>> {
        while let Some(event) = self.events.dequeue() {
            self.handle_event(event);
        }

        if self.timer.poll() {
            self.on_tx_next_packet();
        }

        match self.state {
            DeviceState::Init => {
                self.initialize()?;
                self.set_state(DeviceState::Join);
            }
            DeviceState::Join => self.join(),
            DeviceState::ReqDeviceTime => {
                if self.ready {
                    self.request_time_sync(MlmeRequest::DeviceTime);
                }
                self.set_state(DeviceState::Send);
            }
            DeviceState::ReqBeaconTiming => {
                if self.ready {
                    self.request_time_sync(MlmeRequest::BeaconTiming);
                }
                self.set_state(DeviceState::Send);
            }
            DeviceState::BeaconAcquisition => {
                if self.ready {
                    if let Err(status) = self.mac.mlme_request(MlmeRequest::BeaconAcquisition) {
                        warn!("beacon acquisition rejected: {}", status);
                    }
                    self.ready = false;
                }
                self.set_state(DeviceState::Send);
            }
            DeviceState::ReqPingSlotAck => {
                if self.ready {
                    self.request_ping_slot();
                }
                self.set_state(DeviceState::Send);
            }
            DeviceState::Send => {
                if self.ready {
                    self.ready = !self.send_frame();
                }
                self.enter_cycle();
            }
            DeviceState::Cycle { deadline } => {
                self.set_state(DeviceState::Sleep);
                self.timer.arm(deadline);
            }
            DeviceState::Sleep => self.mac.process(),
            DeviceState::SwitchClass => {
                // The class switch itself happens in the ping slot confirm.
                warn!("no request for {}, resuming uplinks", self.state);
                self.set_state(DeviceState::Send);
            }
        }

        Ok(())
    }

    /// Dispatch a MAC event to its handler
    pub fn handle_event(&mut self, event: MacEvent) {
        match event {
            MacEvent::McpsConfirm(confirm) => self.on_mcps_confirm(&confirm),
            MacEvent::McpsIndication(indication) => self.on_mcps_indication(indication),
            MacEvent::MlmeConfirm(confirm) => self.on_mlme_confirm(&confirm),
            MacEvent::MlmeIndication(indication) => self.on_mlme_indication(&indication),
        }
    }

    /// Handle completion of an uplink
    pub fn on_mcps_confirm(&mut self, confirm: &McpsConfirm) {
        if confirm.status.is_ok() {
            debug!(
                "{} uplink done, dr {} ack {}",
                confirm.kind, confirm.datarate, confirm.ack_received
            );
        } else {
            warn!("{} uplink failed: {}", confirm.kind, confirm.status);
        }
        self.ready = true;
    }

    /// Handle a downlink
    pub fn on_mcps_indication(&mut self, indication: McpsIndication) {
        if !indication.status.is_ok() {
            return;
        }

        debug!(
            "downlink {}: rssi {} snr {}",
            indication.kind, indication.rssi, indication.snr
        );

        if indication.frame_pending {
            // The server has more data queued, send an uplink right away.
            self.on_tx_next_packet();
        }

        if indication.rx_data {
            self.downlink = Some(Downlink {
                port: indication.port,
                data: indication.payload,
            });
        }
    }

    /// Handle completion of a management request
    pub fn on_mlme_confirm(&mut self, confirm: &MlmeConfirm) {
        match confirm.kind {
            MlmeKind::Join => {
                if confirm.status.is_ok() {
                    info!("joined");
                    self.set_state(self.app.time_sync.entry_state().into());
                } else {
                    warn!("join failed: {}", confirm.status);
                    self.join();
                }
            }
            MlmeKind::LinkCheck => {
                if confirm.status.is_ok() {
                    self.link_check = Some(LinkCheck {
                        demod_margin: confirm.demod_margin,
                        nb_gateways: confirm.nb_gateways,
                    });
                }
            }
            MlmeKind::DeviceTime | MlmeKind::BeaconTiming => {
                // Uplinks stay allowed while the beacon is searched.
                self.set_wake_up(WakeUpState::Send);
                self.set_state(DeviceState::BeaconAcquisition);
                self.ready = true;
            }
            MlmeKind::BeaconAcquisition => {
                if confirm.status.is_ok() {
                    info!("beacon acquired");
                    self.set_wake_up(WakeUpState::ReqPingSlotAck);
                } else {
                    warn!("beacon acquisition failed: {}", confirm.status);
                    self.set_wake_up(self.app.time_sync.entry_state());
                }
            }
            MlmeKind::PingSlotInfo => {
                if confirm.status.is_ok() {
                    let periodicity = self.app.ping_slot_periodicity;
                    info!(
                        "ping slot every {}s, {} slots per beacon",
                        periodicity.period_seconds(),
                        periodicity.ping_nb()
                    );
                    self.switch_class(DeviceClass::B);
                    self.set_wake_up(WakeUpState::Send);
                    self.set_state(DeviceState::Send);
                    self.ready = true;
                } else {
                    warn!("ping slot info failed: {}", confirm.status);
                    self.set_wake_up(WakeUpState::ReqPingSlotAck);
                }
            }
        }

        // Every confirm re-enables requests, whatever the branch above decided.
        self.ready = true;
    }

    /// Handle an unsolicited management event
    pub fn on_mlme_indication(&mut self, indication: &MlmeIndication) {
        if indication.status != EventStatus::BeaconLocked {
            debug!("{} indication: {}", indication.kind, indication.status);
        }

        match indication.kind {
            MlmeIndicationKind::ScheduleUplink => self.on_tx_next_packet(),
            MlmeIndicationKind::BeaconLost => {
                warn!("beacon lost");
                self.switch_class(DeviceClass::A);
                self.set_wake_up(self.app.time_sync.entry_state());
                self.beacon = None;
            }
            MlmeIndicationKind::Beacon => {
                match (indication.status, indication.beacon) {
                    (EventStatus::BeaconLocked, Some(beacon)) => {
                        info!(
                            "beacon {}: freq {} dr {} rssi {} snr {}",
                            beacon.time, beacon.frequency, beacon.datarate, beacon.rssi, beacon.snr
                        );
                        debug!(
                            "next beacon at {}, gateway coordinates: {}",
                            beacon.next_beacon_time(),
                            beacon.has_gateway_coordinates()
                        );
                        self.beacon = Some(beacon);
                    }
                    _ => self.beacon = None,
                }
            }
        }
    }

    /// Current state
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// State the device resumes into on the next wake-up
    pub fn wake_up_state(&self) -> WakeUpState {
        self.wake_up
    }

    /// Returns `true` when the next request may be issued
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Device class last applied to the MAC
    pub fn device_class(&self) -> DeviceClass {
        self.class
    }

    /// Delay the duty-cycle timer is armed with
    pub fn next_wake_up(&self) -> Option<Duration> {
        self.timer.deadline()
    }

    /// Last locked beacon
    pub fn last_beacon(&self) -> Option<&BeaconInfo> {
        self.beacon.as_ref()
    }

    /// GPS time of the beacon expected after the last locked one
    pub fn next_beacon_time(&self) -> Option<u32> {
        self.beacon.as_ref().map(BeaconInfo::next_beacon_time)
    }

    /// Last link check answer
    pub fn link_check(&self) -> Option<LinkCheck> {
        self.link_check
    }

    /// Take the last received downlink
    pub fn take_downlink(&mut self) -> Option<Downlink> {
        self.downlink.take()
    }

    /// Device credentials
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Application settings
    pub fn app_config(&self) -> &AppConfig {
        &self.app
    }

    /// MAC stack reference
    pub fn mac(&self) -> &M {
        &self.mac
    }

    /// Mutable MAC stack reference
    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }

    /// Initialize the MAC and apply the start-up parameters
    fn initialize(&mut self) -> Result<(), DeviceError<M::Error>> {
        self.mac.init(self.app.region).map_err(DeviceError::Init)?;
        info!("MAC initialized for {}", self.app.region);

        let mask = self.app.channel_mask;
        for param in [
            MibParam::Adr(self.app.adr),
            MibParam::PublicNetwork(self.app.public_network),
            MibParam::ChannelsDefaultMask(mask),
            MibParam::ChannelsMask(mask),
        ] {
            if let Err(status) = self.mac.set_mib(param) {
                warn!("MIB update rejected: {}", status);
            }
        }
        Ok(())
    }

    /// Join the network: Sleep while an OTAA join runs, Cycle if it was refused
    fn join(&mut self) {
        let Some(session) = self.config.abp.clone() else {
            let request = MlmeRequest::Join(JoinParams {
                dev_eui: self.config.dev_eui,
                app_eui: self.config.app_eui,
                app_key: self.config.app_key,
                nb_trials: JOIN_NB_TRIALS,
            });
            match self.mac.mlme_request(request) {
                Ok(()) => self.set_state(DeviceState::Sleep),
                Err(status) => {
                    warn!("join rejected: {}", status);
                    self.enter_cycle();
                }
            }
            return;
        };

        for param in [
            MibParam::NetId(session.net_id),
            MibParam::DevAddr(session.dev_addr),
            MibParam::NwkSKey(session.nwk_skey),
            MibParam::AppSKey(session.app_skey),
            MibParam::NetworkJoined(true),
        ] {
            if let Err(status) = self.mac.set_mib(param) {
                warn!("ABP session update rejected: {}", status);
            }
        }
        info!("ABP session activated");
        self.set_state(self.app.time_sync.entry_state().into());
    }

    /// Timer expiry, schedule-uplink and frame-pending handling
    fn on_tx_next_packet(&mut self) {
        self.timer.disarm();

        if self.mac.is_network_joined() {
            self.set_state(self.wake_up.into());
            self.ready = true;
        } else {
            // Network not joined yet. Try to join again
            self.join();
        }
    }

    fn request_time_sync(&mut self, request: MlmeRequest) {
        match self.mac.mlme_request(request) {
            Ok(()) => self.set_wake_up(WakeUpState::Send),
            Err(status) => warn!("time sync request rejected: {}", status),
        }
    }

    fn request_ping_slot(&mut self) {
        if let Err(status) = self.mac.mlme_request(MlmeRequest::LinkCheck) {
            warn!("link check rejected: {}", status);
        }

        let periodicity = self.app.ping_slot_periodicity;
        debug!("ping slot info, periodicity {}", periodicity.value());
        match self.mac.mlme_request(MlmeRequest::PingSlotInfo(periodicity)) {
            Ok(()) => self.set_wake_up(WakeUpState::Send),
            Err(status) => warn!("ping slot info rejected: {}", status),
        }
    }

    /// Send the application frame, or an empty frame when it cannot fit with
    /// the pending MAC commands. Returns `true` if the MAC accepted the request.
    fn send_frame(&mut self) -> bool {
        self.frame.prepare();
        let datarate = self.app.datarate;

        let request = match self.mac.query_tx_possible(self.frame.len()) {
            Err(status) => {
                debug!("payload does not fit ({}), flushing MAC commands", status);
                McpsRequest::Unconfirmed {
                    port: None,
                    payload: &[],
                    datarate,
                }
            }
            Ok(_) if self.app.confirmed => McpsRequest::Confirmed {
                port: self.frame.port(),
                payload: self.frame.as_slice(),
                datarate,
                nb_trials: UPLINK_NB_TRIALS,
            },
            Ok(_) => McpsRequest::Unconfirmed {
                port: Some(self.frame.port()),
                payload: self.frame.as_slice(),
                datarate,
            },
        };

        match self.mac.mcps_request(request) {
            Ok(()) => true,
            Err(status) => {
                warn!("uplink rejected: {}", status);
                false
            }
        }
    }

    fn switch_class(&mut self, class: DeviceClass) {
        match self.mac.set_mib(MibParam::DeviceClass(class)) {
            Ok(()) => {
                info!("switched to class {}", class);
                self.class = class;
            }
            Err(status) => error!("class {} switch rejected: {}", class, status),
        }
    }

    fn enter_cycle(&mut self) {
        let deadline =
            duty_cycle_deadline(self.app.duty_cycle, self.app.duty_cycle_jitter, &mut self.rng);
        self.set_state(DeviceState::Cycle { deadline });
    }

    fn set_state(&mut self, state: DeviceState) {
        if self.state != state {
            debug!("state {} -> {}", self.state, state);
        }
        self.state = state;
    }

    fn set_wake_up(&mut self, state: WakeUpState) {
        if self.wake_up != state {
            debug!("wake-up state {} -> {}", self.wake_up, state);
        }
        self.wake_up = state;
    }
}
