//! Runs the controller on a host against a simulated MAC stack that answers
//! every request immediately. Stops after a handful of uplinks.

use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::timer::{Cancel, CountDown};
use rand::{rngs::StdRng, SeedableRng};

use lorawan_classb::{
    class::{class_b::BeaconInfo, DeviceClass},
    config::device::{AppConfig, DeviceConfig},
    device::ClassBDevice,
    lorawan::{
        events::{EventProducer, EventQueue, EventStatus, McpsConfirm, MlmeConfirm, MlmeIndication},
        mac::{LoRaMac, McpsRequest, MibParam, MlmeRequest, TxInfo},
        MacStatus, Region,
    },
};

const UPLINKS: usize = 5;

struct SimMac<'q> {
    events: EventProducer<'q>,
    joined: bool,
    uplinks: usize,
}

impl SimMac<'_> {
    fn answer(&mut self, confirm: MlmeConfirm) {
        let _ = self.events.enqueue(confirm.into());
    }
}

impl LoRaMac for SimMac<'_> {
    type Error = ();

    fn init(&mut self, region: Region) -> Result<(), Self::Error> {
        println!("[mac] init {}", region);
        Ok(())
    }

    fn set_mib(&mut self, param: MibParam) -> Result<(), MacStatus> {
        if let MibParam::DeviceClass(class) = param {
            println!("[mac] class {}", class);
            if class == DeviceClass::B {
                let beacon = BeaconInfo {
                    time: 1_300_000_000,
                    frequency: 508_300_000,
                    ..Default::default()
                };
                let _ = self.events.enqueue(MlmeIndication::beacon_locked(beacon).into());
            }
        }
        Ok(())
    }

    fn mlme_request(&mut self, request: MlmeRequest) -> Result<(), MacStatus> {
        println!("[mac] {:?}", request.kind());
        if let MlmeRequest::Join(_) = request {
            self.joined = true;
        }
        self.answer(MlmeConfirm::new(EventStatus::Ok, request.kind()));
        Ok(())
    }

    fn mcps_request(&mut self, request: McpsRequest<'_>) -> Result<(), MacStatus> {
        self.uplinks += 1;
        println!("[mac] uplink #{} {:02X?}", self.uplinks, request.payload());
        let _ = self
            .events
            .enqueue(McpsConfirm::new(EventStatus::Ok, request.kind()).into());
        Ok(())
    }

    fn is_network_joined(&self) -> bool {
        self.joined
    }

    fn query_tx_possible(&mut self, size: usize) -> Result<TxInfo, MacStatus> {
        Ok(TxInfo {
            max_possible_payload: 51,
            current_payload_size: size as u8,
        })
    }

    fn process(&mut self) {}
}

/// Count-down timer on top of the host clock
#[derive(Default)]
struct HostTimer {
    expires: Option<Instant>,
}

impl CountDown for HostTimer {
    type Time = Duration;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>,
    {
        self.expires = Some(Instant::now() + count.into());
    }

    fn wait(&mut self) -> nb::Result<(), void::Void> {
        match self.expires {
            Some(at) if Instant::now() >= at => {
                self.expires = None;
                Ok(())
            }
            _ => Err(nb::Error::WouldBlock),
        }
    }
}

impl Cancel for HostTimer {
    type Error = ();

    fn cancel(&mut self) -> Result<(), Self::Error> {
        self.expires.take().map(|_| ()).ok_or(())
    }
}

fn main() {
    let mut queue = EventQueue::new();
    let (producer, consumer) = queue.split();

    let mac = SimMac {
        events: producer,
        joined: false,
        uplinks: 0,
    };
    let config = DeviceConfig::new_otaa(
        [0x70, 0xB3, 0xD5, 0x7E, 0xD0, 0x06, 0xD0, 0x20],
        [0x00; 8],
        [0x2B; 16],
    );
    let app = AppConfig::default()
        .with_region(Region::EU868)
        .with_duty_cycle(Duration::from_secs(1), Duration::from_millis(500));

    let mut device = ClassBDevice::new(
        config,
        app,
        mac,
        HostTimer::default(),
        StdRng::seed_from_u64(7),
        consumer,
    );

    let mut last = device.state();
    while device.mac().uplinks < UPLINKS {
        if let Err(err) = device.step() {
            println!("step failed: {}", err);
            return;
        }
        if device.state() != last {
            last = device.state();
            println!("{} (wake-up {}, class {})", last, device.wake_up_state(), device.device_class());
        }
        thread::sleep(Duration::from_millis(10));
    }

    if let Some(beacon) = device.last_beacon() {
        println!("beacon locked at {}s on {} Hz", beacon.time, beacon.frequency);
    }
}
