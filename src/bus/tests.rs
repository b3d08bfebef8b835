//! Bus scenarios against the simulated adapter

use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};

use super::*;
use crate::handler::{TransmitState, VendorVariant};
use crate::test_utils::{init_tracing, AckMode, AdapterSimulator, SIMULATED_FIRMWARE};
use crate::types::VendorId;

fn start(config: BusConfig) -> (Bus, AdapterSimulator) {
    init_tracing();
    let (transport, adapter) = AdapterSimulator::start();
    let bus = Bus::start(transport, config).unwrap();
    (bus, adapter)
}

/// Let the reader, writer and simulator run to quiescence.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

fn drain(rx: &mut broadcast::Receiver<BusEvent>) -> Vec<BusEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return events,
        }
    }
}

fn from_tv(destination: LogicalAddress, opcode: Opcode, operands: &[u8]) -> CecCommand {
    CecCommand::with_operands(LogicalAddress::Tv, destination, opcode, operands).unwrap()
}

fn announce_vendor(adapter: &AdapterSimulator, vendor: VendorId) {
    adapter.inject(&from_tv(LogicalAddress::Broadcast, Opcode::DeviceVendorId, &vendor.to_operands()));
}

fn report_tv_power(adapter: &AdapterSimulator, status: PowerStatus) {
    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::ReportPowerStatus, &[status.to_byte()]));
}

fn sent(adapter: &AdapterSimulator, opcode: Opcode) -> Vec<CecCommand> {
    adapter.transmitted().into_iter().filter(|c| c.opcode == Some(opcode)).collect()
}

#[tokio::test(start_paused = true)]
async fn initialise_configures_adapter() {
    let (bus, adapter) = start(BusConfig::default());

    assert_eq!(bus.initialise().await.unwrap(), SIMULATED_FIRMWARE);

    let codes: Vec<_> = adapter.housekeeping().into_iter().map(|(code, _)| code).collect();
    assert_eq!(
        codes,
        vec![
            MessageCode::Ping,
            MessageCode::FirmwareVersion,
            MessageCode::SetControlled,
            MessageCode::SetAckMask
        ]
    );
    assert_eq!(adapter.housekeeping()[3].1, vec![0x00, 0x10]);
}

#[tokio::test(start_paused = true)]
async fn acknowledged_transmit_completes() {
    let (bus, adapter) = start(BusConfig::default());
    let standby = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::Standby);

    bus.transmit(standby, true).await.unwrap();

    assert_eq!(adapter.attempts(), 1);
    assert_eq!(sent(&adapter, Opcode::Standby).len(), 1);
    assert_eq!(bus.device(LogicalAddress::Tv).transmit_state, TransmitState::Done);
}

#[tokio::test(start_paused = true)]
async fn unacknowledged_transmit_stops_after_max_tries() {
    let config = BusConfig { max_tries: 3, ..BusConfig::default() };
    let (bus, adapter) = start(config);
    adapter.set_mode(AckMode::Silent);
    let mut events = bus.subscribe();

    let standby = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::Standby);
    let result = bus.transmit(standby, true).await;

    assert!(matches!(result, Err(CecError::TransmitFailed { attempts: 3, .. })), "{result:?}");
    assert_eq!(adapter.attempts(), 3);
    assert_eq!(bus.device(LogicalAddress::Tv).transmit_state, TransmitState::Failed);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, BusEvent::TransmitFailed { attempts: 3, .. }))
    );

    // Failure leaves the device as it was.
    settle().await;
    assert_eq!(adapter.attempts(), 3);
    assert_eq!(bus.device(LogicalAddress::Tv).power_status, PowerStatus::Unknown);
}

#[tokio::test(start_paused = true)]
async fn line_errors_are_retried_up_to_max_tries() {
    let config = BusConfig { max_tries: 3, ..BusConfig::default() };
    let (bus, adapter) = start(config);
    adapter.set_mode(AckMode::LineError);
    let mut events = bus.subscribe();

    let standby = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::Standby);
    let result = bus.transmit(standby, true).await;

    assert!(matches!(result, Err(CecError::TransmitFailed { attempts: 3, .. })), "{result:?}");
    assert_eq!(adapter.attempts(), 3);
    assert_eq!(sent(&adapter, Opcode::Standby).len(), 3);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, BusEvent::TransmitFailed { attempts: 3, .. }))
    );

    settle().await;
    assert_eq!(adapter.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn missing_follower_is_not_retried() {
    let (bus, adapter) = start(BusConfig::default());
    adapter.set_mode(AckMode::NoFollower);

    let result = bus.standby(LogicalAddress::Tv).await;

    assert!(matches!(result, Err(CecError::TransmitFailed { attempts: 1, .. })), "{result:?}");
    assert_eq!(adapter.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn handler_policy_overrides_bus_default() {
    let (bus, adapter) = start(BusConfig::default());
    adapter.set_mode(AckMode::Silent);
    bus.update_handler(LogicalAddress::Tv, |config| config.max_tries = 4);

    let _ = bus.standby(LogicalAddress::Tv).await;
    assert_eq!(adapter.attempts(), 4);

    // Other destinations keep the configured default.
    let _ = bus.standby(LogicalAddress::AudioSystem).await;
    assert_eq!(adapter.attempts(), 6);
}

#[tokio::test(start_paused = true)]
async fn polls_are_never_retried() {
    let config = BusConfig { max_tries: 5, ..BusConfig::default() };
    let (bus, adapter) = start(config);
    adapter.set_mode(AckMode::Silent);

    assert!(!bus.poll(LogicalAddress::Tuner1).await.unwrap());
    assert_eq!(adapter.attempts(), 1);
    assert_eq!(bus.device(LogicalAddress::Tuner1).present, Some(false));

    adapter.set_mode(AckMode::Acknowledge);
    assert!(bus.poll(LogicalAddress::Tuner1).await.unwrap());
    let polls: Vec<_> = adapter.transmitted().into_iter().filter(|c| c.is_poll()).collect();
    assert_eq!(polls.len(), 2);
    assert_eq!(bus.device(LogicalAddress::Tuner1).transmit_state, TransmitState::Done);
}

#[tokio::test(start_paused = true)]
async fn transmit_without_ack_does_not_block() {
    let (bus, adapter) = start(BusConfig::default());
    adapter.set_mode(AckMode::Silent);

    let started = tokio::time::Instant::now();
    bus.send_keypress(LogicalAddress::Tv, UserControlCode::Select, false).await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(bus.device(LogicalAddress::Tv).transmit_state, TransmitState::Done);

    // The writer still delivers it.
    settle().await;
    assert_eq!(sent(&adapter, Opcode::UserControlPressed).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn vendor_announcement_replaces_handler_and_synthesizes_release() {
    let (bus, adapter) = start(BusConfig::default());
    let mut events = bus.subscribe();

    announce_vendor(&adapter, VendorId::SAMSUNG);
    settle().await;
    assert_eq!(bus.device(LogicalAddress::Tv).variant, VendorVariant::Samsung);
    assert_eq!(bus.device(LogicalAddress::Tv).vendor_id, VendorId::SAMSUNG);

    let up = from_tv(LogicalAddress::Playback1, Opcode::UserControlPressed, &[0x01]);
    adapter.inject(&up);
    adapter.inject(&up);
    settle().await;

    let releases = sent(&adapter, Opcode::UserControlRelease);
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].destination, LogicalAddress::Tv);
    assert_eq!(releases[0].initiator, LogicalAddress::Playback1);

    let events = drain(&mut events);
    assert!(events.contains(&BusEvent::VendorChanged { address: LogicalAddress::Tv, vendor: VendorId::SAMSUNG }));
    let presses = events.iter().filter(|e| matches!(e, BusEvent::KeyPressed { .. })).count();
    let synthetic = events
        .iter()
        .filter(|e| matches!(e, BusEvent::KeyReleased { synthetic: true, .. }))
        .count();
    assert_eq!((presses, synthetic), (2, 1));
}

#[tokio::test(start_paused = true)]
async fn repeated_power_key_is_swallowed() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::SAMSUNG);
    settle().await;
    let mut events = bus.subscribe();

    let power = from_tv(LogicalAddress::Playback1, Opcode::UserControlPressed, &[0x40]);
    adapter.inject(&power);
    adapter.inject(&power);
    settle().await;

    assert!(sent(&adapter, Opcode::UserControlRelease).is_empty());
    let presses = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, BusEvent::KeyPressed { .. }))
        .count();
    assert_eq!(presses, 1);
}

#[tokio::test(start_paused = true)]
async fn directed_unsupported_opcode_is_aborted() {
    let (_bus, adapter) = start(BusConfig::default());

    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::Play, &[0x24]));
    // Broadcasts and commands for other devices are never answered.
    adapter.inject(&from_tv(LogicalAddress::Broadcast, Opcode::Play, &[0x24]));
    adapter.inject(&from_tv(LogicalAddress::Tuner1, Opcode::Play, &[0x24]));
    settle().await;

    let aborts = sent(&adapter, Opcode::FeatureAbort);
    assert_eq!(aborts.len(), 1);
    assert_eq!(aborts[0].destination, LogicalAddress::Tv);
    assert_eq!(aborts[0].operands(), &[0x41, 0x00]);
}

#[tokio::test(start_paused = true)]
async fn queries_are_answered_from_config() {
    let config = BusConfig { osd_name: "Kodi".to_string(), vendor_id: VendorId::PHILIPS, ..BusConfig::default() };
    let (_bus, adapter) = start(config);

    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::GiveOsdName, &[]));
    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::GivePhysicalAddress, &[]));
    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::GiveDeviceVendorId, &[]));
    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::GiveDevicePowerStatus, &[]));
    settle().await;

    assert_eq!(sent(&adapter, Opcode::SetOsdName)[0].operands(), b"Kodi");
    let physical = &sent(&adapter, Opcode::ReportPhysicalAddress)[0];
    assert!(physical.is_broadcast());
    assert_eq!(physical.operands(), &[0x10, 0x00, 0x04]);
    assert_eq!(sent(&adapter, Opcode::DeviceVendorId)[0].operands(), &[0x00, 0x90, 0x3E]);
    assert_eq!(sent(&adapter, Opcode::ReportPowerStatus)[0].operands(), &[0x00]);
}

#[tokio::test(start_paused = true)]
async fn request_returns_reply() {
    let (bus, adapter) = start(BusConfig::default());

    let (status, ()) = tokio::join!(bus.request_power_status(LogicalAddress::Tv), async {
        settle().await;
        report_tv_power(&adapter, PowerStatus::Standby);
    });

    assert_eq!(status.unwrap(), PowerStatus::Standby);
    let tv = bus.device(LogicalAddress::Tv);
    assert_eq!(tv.power_status, PowerStatus::Standby);
    assert_eq!(tv.transmit_state, TransmitState::Done);
}

#[tokio::test(start_paused = true)]
async fn feature_abort_ends_request() {
    let (bus, adapter) = start(BusConfig::default());
    let query = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::GiveDeckStatus);

    let started = tokio::time::Instant::now();
    let (result, ()) = tokio::join!(bus.request(query), async {
        settle().await;
        adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::FeatureAbort, &[0x1A, 0x04]));
    });

    assert!(matches!(result, Err(CecError::FeatureAbort { opcode: 0x1A, reason: 0x04 })), "{result:?}");
    assert!(started.elapsed() < bus.config().response_timeout());
    assert_eq!(bus.device(LogicalAddress::Tv).transmit_state, TransmitState::Failed);
}

#[tokio::test(start_paused = true)]
async fn request_without_reply_times_out() {
    let (bus, _adapter) = start(BusConfig::default());
    let result = bus.request_power_status(LogicalAddress::Tv).await;
    assert!(matches!(result, Err(CecError::Timeout { .. })), "{result:?}");

    let standby = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::Standby);
    assert!(matches!(bus.request(standby).await, Err(CecError::InvalidCommand { .. })));
}

fn tv_diagnostics(events: &mut broadcast::Receiver<BusEvent>) -> Vec<String> {
    drain(events)
        .into_iter()
        .filter_map(|e| match e {
            BusEvent::Diagnostic { address: LogicalAddress::Tv, message } => Some(message),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn power_on_check_reports_once_and_never_retries_power_on() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::SHARP);
    report_tv_power(&adapter, PowerStatus::Standby);
    adapter.reply_with(Opcode::GiveDevicePowerStatus, Opcode::ReportPowerStatus, &[0x01]);
    settle().await;
    let mut events = bus.subscribe();

    bus.power_on_from(LogicalAddress::Recording1, LogicalAddress::Tv).await.unwrap();
    let wakes = sent(&adapter, Opcode::ImageViewOn);
    assert_eq!(wakes.len(), 1);
    assert_eq!(wakes[0].initiator, LogicalAddress::Recording1);
    assert!(sent(&adapter, Opcode::GiveDevicePowerStatus).is_empty());
    assert_eq!(bus.device(LogicalAddress::Tv).background_tasks, 1);

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let queries = sent(&adapter, Opcode::GiveDevicePowerStatus);
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].initiator, LogicalAddress::Playback1);
    let diagnostics = tv_diagnostics(&mut events);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("standby"), "{diagnostics:?}");
    assert_eq!(bus.device(LogicalAddress::Tv).background_tasks, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(tv_diagnostics(&mut events).is_empty());
    assert_eq!(sent(&adapter, Opcode::ImageViewOn).len(), 1);
    assert!(sent(&adapter, Opcode::UserControlPressed).is_empty());
    assert_eq!(sent(&adapter, Opcode::GiveDevicePowerStatus).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn power_on_check_asks_again_after_delay() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::SHARP);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;
    let mut events = bus.subscribe();

    bus.power_on(LogicalAddress::Tv).await.unwrap();
    report_tv_power(&adapter, PowerStatus::InTransitionStandbyToOn);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(bus.device(LogicalAddress::Tv).power_status, PowerStatus::InTransitionStandbyToOn);

    // Fully on by the time the check asks.
    adapter.reply_with(Opcode::GiveDevicePowerStatus, Opcode::ReportPowerStatus, &[0x00]);
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(sent(&adapter, Opcode::GiveDevicePowerStatus).len(), 1);
    assert!(tv_diagnostics(&mut events).is_empty());
    assert_eq!(bus.device(LogicalAddress::Tv).power_status, PowerStatus::On);
    assert_eq!(bus.device(LogicalAddress::Tv).background_tasks, 0);
}

#[tokio::test(start_paused = true)]
async fn silent_device_yields_one_power_on_diagnostic() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::SHARP);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;
    let mut events = bus.subscribe();

    bus.power_on(LogicalAddress::Tv).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let diagnostics = tv_diagnostics(&mut events);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("did not report"), "{diagnostics:?}");
    assert_eq!(sent(&adapter, Opcode::GiveDevicePowerStatus).len(), 1);
    assert_eq!(sent(&adapter, Opcode::ImageViewOn).len(), 1);
    assert_eq!(bus.device(LogicalAddress::Tv).background_tasks, 0);
}

#[tokio::test(start_paused = true)]
async fn generic_power_on_is_fire_and_forget() {
    let (bus, adapter) = start(BusConfig::default());

    bus.power_on(LogicalAddress::AudioSystem).await.unwrap();

    let keys: Vec<_> = adapter
        .transmitted()
        .into_iter()
        .filter_map(|c| c.opcode)
        .collect();
    assert_eq!(keys, vec![Opcode::UserControlPressed, Opcode::UserControlRelease]);
    assert_eq!(sent(&adapter, Opcode::UserControlPressed)[0].operands(), &[0x40]);
    assert_eq!(bus.device(LogicalAddress::AudioSystem).background_tasks, 0);
}

#[tokio::test(start_paused = true)]
async fn samsung_audio_system_wakes_with_power_on_function() {
    let (bus, adapter) = start(BusConfig::default());
    adapter.inject(
        &CecCommand::with_operands(
            LogicalAddress::AudioSystem,
            LogicalAddress::Broadcast,
            Opcode::DeviceVendorId,
            &VendorId::SAMSUNG.to_operands(),
        )
        .unwrap(),
    );
    settle().await;

    bus.power_on(LogicalAddress::AudioSystem).await.unwrap();
    assert_eq!(sent(&adapter, Opcode::UserControlPressed)[0].operands(), &[0x6D]);
}

#[tokio::test(start_paused = true)]
async fn active_source_polls_tv_until_on() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::PHILIPS);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;

    bus.activate_source().await.unwrap();
    assert!(bus.device(LogicalAddress::Playback1).active_source);
    let tv = bus.device(LogicalAddress::Tv);
    assert_eq!(tv.background_tasks, 1);
    assert_eq!(tv.deferred_commands, 1);
    assert!(tv.handler_config.active_source_pending.is_some());
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 1);

    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(sent(&adapter, Opcode::ImageViewOn).len(), 1);
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 2);

    report_tv_power(&adapter, PowerStatus::On);
    settle().await;
    // The deferred announcement goes out once the TV is on.
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sent(&adapter, Opcode::ImageViewOn).len(), 1);
    let tv = bus.device(LogicalAddress::Tv);
    assert_eq!(tv.background_tasks, 0);
    assert_eq!(tv.handler_config.active_source_pending, None);
}

#[tokio::test(start_paused = true)]
async fn booting_tv_is_polled_without_announcing_again() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::PHILIPS);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;

    bus.activate_source().await.unwrap();
    report_tv_power(&adapter, PowerStatus::InTransitionStandbyToOn);
    settle().await;
    let queries = sent(&adapter, Opcode::GiveDevicePowerStatus).len();

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert!(sent(&adapter, Opcode::ImageViewOn).is_empty());
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 1);
    assert_eq!(sent(&adapter, Opcode::GiveDevicePowerStatus).len(), queries + 1);
    let tv = bus.device(LogicalAddress::Tv);
    assert_eq!(tv.background_tasks, 1);
    assert!(tv.handler_config.active_source_pending.is_some());

    // Dropped back to standby: the next round wakes it again.
    report_tv_power(&adapter, PowerStatus::Standby);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(sent(&adapter, Opcode::ImageViewOn).len(), 1);
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn handler_replacement_keeps_config_and_cancels_poll() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::PHILIPS);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;
    bus.update_handler(LogicalAddress::Tv, |config| {
        config.max_tries = 5;
        config.transmit_timeout = Duration::from_millis(250);
    });

    bus.activate_source().await.unwrap();
    let before = bus.device(LogicalAddress::Tv);
    assert_eq!(before.background_tasks, 1);

    announce_vendor(&adapter, VendorId::SAMSUNG);
    settle().await;

    let after = bus.device(LogicalAddress::Tv);
    assert_eq!(after.variant, VendorVariant::Samsung);
    assert_eq!(after.handler_config, before.handler_config);
    assert_eq!(after.background_tasks, 0);
    assert_eq!(after.deferred_commands, 0);

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(sent(&adapter, Opcode::ImageViewOn).is_empty());
}

#[tokio::test(start_paused = true)]
async fn ambient_traffic_updates_devices() {
    let (bus, adapter) = start(BusConfig::default());
    let mut events = bus.subscribe();

    adapter.inject(&from_tv(LogicalAddress::Broadcast, Opcode::SetMenuLanguage, b"deu"));
    adapter.inject(&from_tv(LogicalAddress::Playback1, Opcode::CecVersion, &[0x05]));
    adapter.inject(
        &CecCommand::with_operands(
            LogicalAddress::Tuner1,
            LogicalAddress::Broadcast,
            Opcode::ActiveSource,
            &[0x30, 0x00],
        )
        .unwrap(),
    );
    settle().await;

    let tv = bus.device(LogicalAddress::Tv);
    assert_eq!(tv.menu_language.as_deref(), Some("deu"));
    assert_eq!(tv.cec_version, Some(crate::types::CecVersion::V1_4));
    let tuner = bus.device(LogicalAddress::Tuner1);
    assert!(tuner.active_source);
    assert_eq!(tuner.physical_address, Some(0x3000));
    assert!(drain(&mut events).contains(&BusEvent::ActiveSourceChanged { address: LogicalAddress::Tuner1 }));

    // Another device asking for the path to us makes us active.
    adapter.inject(&from_tv(LogicalAddress::Broadcast, Opcode::SetStreamPath, &[0x10, 0x00]));
    settle().await;
    assert!(bus.device(LogicalAddress::Playback1).active_source);
    assert!(!bus.device(LogicalAddress::Tuner1).active_source);
    assert_eq!(sent(&adapter, Opcode::ActiveSource).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn framing_noise_is_skipped() {
    let (bus, adapter) = start(BusConfig::default());

    adapter.inject_bytes(&[0xFF, 0x06, 0xFE, 0x01, 0xFF]);
    report_tv_power(&adapter, PowerStatus::On);
    settle().await;

    assert_eq!(bus.device(LogicalAddress::Tv).power_status, PowerStatus::On);
}

#[tokio::test(start_paused = true)]
async fn transport_loss_is_reported() {
    let (bus, adapter) = start(BusConfig::default());
    let mut events = bus.subscribe();

    drop(adapter);
    settle().await;

    assert!(drain(&mut events).contains(&BusEvent::TransportClosed));
    let result = bus.standby(LogicalAddress::Tv).await;
    assert!(matches!(result, Err(CecError::Closed)), "{result:?}");
}

#[tokio::test(start_paused = true)]
async fn shutdown_joins_background_tasks() {
    let (bus, adapter) = start(BusConfig::default());
    announce_vendor(&adapter, VendorId::PHILIPS);
    report_tv_power(&adapter, PowerStatus::Standby);
    settle().await;
    bus.activate_source().await.unwrap();

    let events = bus.events();
    tokio::time::timeout(Duration::from_secs(1), bus.shutdown()).await.unwrap();

    // The event stream ends once the bus is gone.
    let remaining: Vec<_> = events.collect().await;
    assert!(remaining.is_empty());
}
