use lorawan_classb::{
    class::{class_b::BeaconInfo, DeviceClass},
    config::device::{AppConfig, TimeSyncStrategy},
    device::{DeviceState, LinkCheck, WakeUpState},
    lorawan::{
        events::{
            EventStatus, McpsConfirm, McpsIndication, MlmeConfirm, MlmeIndication,
            MlmeIndicationKind,
        },
        mac::{McpsKind, MibParam, MlmeKind},
    },
};

use mock::{abp_config, otaa_config, step_until_sleep, with_device};

fn locked_beacon() -> BeaconInfo {
    BeaconInfo {
        time: 1_300_000_000,
        frequency: 508_300_000,
        datarate: 2,
        rssi: -97,
        snr: 7,
        ..Default::default()
    }
}

#[test]
fn test_frame_pending_skips_timer() {
    with_device(abp_config(), AppConfig::default(), |device, timer| {
        step_until_sleep(device, 5);
        assert!(timer.running().is_some());

        device.mac_mut().push(
            McpsIndication::new(EventStatus::Ok, McpsKind::Unconfirmed).with_frame_pending(true),
        );
        device.step().unwrap();

        assert_eq!(timer.cancels(), 1);
        assert_eq!(timer.running(), None);
        assert_eq!(device.mac().uplinks.len(), 2);
        assert!(matches!(device.state(), DeviceState::Cycle { .. }));
    });
}

#[test]
fn test_failed_indication_ignored() {
    with_device(abp_config(), AppConfig::default(), |device, timer| {
        step_until_sleep(device, 5);

        device.mac_mut().push(
            McpsIndication::new(EventStatus::Rx2Timeout, McpsKind::Unconfirmed)
                .with_frame_pending(true)
                .with_payload(3, &[0xAA]),
        );
        device.step().unwrap();

        assert_eq!(device.state(), DeviceState::Sleep);
        assert!(timer.running().is_some());
        assert_eq!(device.mac().uplinks.len(), 1);
        assert_eq!(device.take_downlink(), None);
    });
}

#[test]
fn test_downlink_delivered() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 5);

        device.mac_mut().push(
            McpsIndication::new(EventStatus::Ok, McpsKind::Confirmed)
                .with_payload(10, &[0x01, 0x02, 0x03]),
        );
        device.step().unwrap();

        let downlink = device.take_downlink().unwrap();
        assert_eq!(downlink.port, 10);
        assert_eq!(&downlink.data[..], &[0x01, 0x02, 0x03]);
        assert_eq!(device.take_downlink(), None);
        assert_eq!(device.state(), DeviceState::Sleep);
    });
}

#[test]
fn test_schedule_uplink_indication() {
    with_device(abp_config(), AppConfig::default(), |device, timer| {
        step_until_sleep(device, 5);
        device
            .mac_mut()
            .push(McpsConfirm::new(EventStatus::Ok, McpsKind::Unconfirmed));
        device.mac_mut().push(MlmeIndication::new(
            MlmeIndicationKind::ScheduleUplink,
            EventStatus::Ok,
        ));
        device.step().unwrap();

        assert_eq!(timer.running(), None);
        assert_eq!(device.mac().uplinks.len(), 2);
    });
}

#[test]
fn test_schedule_uplink_before_join_rejoins() {
    with_device(otaa_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 3);

        device.handle_event(
            MlmeIndication::new(MlmeIndicationKind::ScheduleUplink, EventStatus::Ok).into(),
        );
        assert_eq!(device.state(), DeviceState::Sleep);
        assert_eq!(device.mac().mlme_kinds(), vec![MlmeKind::Join; 2]);
    });
}

#[test]
fn test_uplink_confirm_sets_ready() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 5);
        assert!(!device.is_ready());

        let mut confirm = McpsConfirm::new(EventStatus::TxTimeout, McpsKind::Unconfirmed);
        confirm.nb_retries = 0;
        device.handle_event(confirm.into());
        assert!(device.is_ready());
    });
}

#[test]
fn test_time_sync_confirm_starts_acquisition() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 5);

        // A failed time request still moves on to the beacon search
        device.handle_event(MlmeConfirm::new(EventStatus::Rx2Timeout, MlmeKind::DeviceTime).into());
        assert_eq!(device.state(), DeviceState::BeaconAcquisition);
        assert_eq!(device.wake_up_state(), WakeUpState::Send);
        assert!(device.is_ready());
    });
}

#[test]
fn test_acquisition_failure_restarts_time_sync() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 5);
        device.handle_event(MlmeConfirm::new(EventStatus::Ok, MlmeKind::DeviceTime).into());
        device.step().unwrap();
        assert!(!device.is_ready());

        device.handle_event(
            MlmeConfirm::new(EventStatus::BeaconNotFound, MlmeKind::BeaconAcquisition).into(),
        );
        assert_eq!(device.wake_up_state(), WakeUpState::ReqDeviceTime);
        assert!(device.is_ready());
    });
}

#[test]
fn test_ping_slot_failure_retries_negotiation() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        step_until_sleep(device, 5);

        device.handle_event(MlmeConfirm::new(EventStatus::Rx1Error, MlmeKind::PingSlotInfo).into());
        assert_eq!(device.wake_up_state(), WakeUpState::ReqPingSlotAck);
        assert_eq!(device.device_class(), DeviceClass::A);
        assert_eq!(device.mac().class(), None);
        assert_eq!(device.state(), DeviceState::Sleep);
    });
}

#[test]
fn test_link_check_recorded() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        assert_eq!(device.link_check(), None);

        let mut confirm = MlmeConfirm::new(EventStatus::Ok, MlmeKind::LinkCheck);
        confirm.demod_margin = 12;
        confirm.nb_gateways = 3;
        device.handle_event(confirm.into());
        assert_eq!(
            device.link_check(),
            Some(LinkCheck {
                demod_margin: 12,
                nb_gateways: 3
            })
        );

        // A failed check keeps the previous answer
        device.handle_event(MlmeConfirm::new(EventStatus::Rx2Timeout, MlmeKind::LinkCheck).into());
        assert_eq!(device.link_check().map(|check| check.nb_gateways), Some(3));
    });
}

#[test]
fn test_beacon_indications() {
    with_device(abp_config(), AppConfig::default(), |device, _timer| {
        device.handle_event(MlmeIndication::beacon_locked(locked_beacon()).into());
        assert_eq!(device.last_beacon(), Some(&locked_beacon()));
        assert_eq!(device.next_beacon_time(), Some(1_300_000_128));
        assert!(locked_beacon().has_gateway_coordinates());

        device.handle_event(
            MlmeIndication::new(MlmeIndicationKind::Beacon, EventStatus::BeaconNotFound).into(),
        );
        assert_eq!(device.last_beacon(), None);
        assert_eq!(device.next_beacon_time(), None);
    });
}

#[test]
fn test_beacon_lost_falls_back_to_class_a() {
    let app = AppConfig::default().with_time_sync(TimeSyncStrategy::BeaconTiming);
    with_device(abp_config(), app, |device, _timer| {
        step_until_sleep(device, 5);

        device.handle_event(MlmeConfirm::new(EventStatus::Ok, MlmeKind::PingSlotInfo).into());
        device.handle_event(MlmeIndication::beacon_locked(locked_beacon()).into());
        assert_eq!(device.device_class(), DeviceClass::B);

        device.handle_event(
            MlmeIndication::new(MlmeIndicationKind::BeaconLost, EventStatus::BeaconLost).into(),
        );
        assert_eq!(device.device_class(), DeviceClass::A);
        assert_eq!(device.mac().mibs.last(), Some(&MibParam::DeviceClass(DeviceClass::A)));
        assert_eq!(device.wake_up_state(), WakeUpState::ReqBeaconTiming);
        assert_eq!(device.last_beacon(), None);
    });
}
