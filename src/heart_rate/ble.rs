use super::{BatteryLevel, MonitorUpdate};
use crate::broadcast;
use crate::errors::AppError;
use crate::settings::BLESettings;

use btleplug::api::{Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const HEART_RATE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000180d_0000_1000_8000_00805f9b34fb);
pub const HEART_RATE_MEASUREMENT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);

pub const BATTERY_LEVEL_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

struct BleMonitorActor {
    monitor_tx: UnboundedSender<MonitorUpdate>,
    ble_settings: BLESettings,
    cancel_token: CancellationToken,

    battery_characteristic: Option<Characteristic>,
    battery_level: BatteryLevel,
    // Peripherals that advertised the HR service but didn't expose the measurement
    rejected: HashSet<PeripheralId>,
}

impl BleMonitorActor {
    async fn run(&mut self) -> Result<(), AppError> {
        let manager = Manager::new().await?;
        let central = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NoAdapter)?;

        'scan: loop {
            broadcast!(self.monitor_tx, MonitorUpdate::Scanning);
            let Some(device) = self.find_monitor(&central).await? else {
                break 'scan;
            };

            let name = device_name(&device).await;
            info!("Connected to {name}!");
            broadcast!(self.monitor_tx, MonitorUpdate::Connected { name });

            let streamed = self.notification_loop(&device).await;
            let teardown = disconnect_if_connected(&device).await;
            if !connection_ended(&self.monitor_tx, &self.cancel_token, streamed, teardown) {
                break 'scan;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                _ = self.cancel_token.cancelled() => break 'scan,
            }
        }
        Ok(())
    }

    /// Scans until a peripheral with a subscribable HR measurement turns up.
    /// Returns `None` if cancelled first.
    async fn find_monitor(&mut self, central: &Adapter) -> Result<Option<Peripheral>, AppError> {
        let mut events = central.events().await?;
        central
            .start_scan(ScanFilter {
                services: vec![HEART_RATE_SERVICE_UUID],
            })
            .await?;
        info!("Finding your heart rate monitor...");

        loop {
            tokio::select! {
                Some(event) = events.next() => {
                    let id = match event {
                        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                        _ => continue,
                    };
                    if self.rejected.contains(&id) {
                        continue;
                    }
                    let device = match central.peripheral(&id).await {
                        Ok(device) => device,
                        Err(e) => {
                            debug!("Lost track of {:?}: {}", id, e);
                            continue;
                        }
                    };
                    if self.try_connect(&device).await {
                        central.stop_scan().await?;
                        return Ok(Some(device));
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    central.stop_scan().await?;
                    return Ok(None);
                }
            }
        }
    }

    /// Connects and subscribes to the HR measurement, disconnecting again on any failure.
    async fn try_connect(&mut self, device: &Peripheral) -> bool {
        let name = device_name(device).await;
        info!(
            "Connecting to Heart Rate Monitor! Name: {:?} | Id: {:?}",
            name,
            device.id()
        );

        let connect_timeout = Duration::from_secs(self.ble_settings.device_connect_timeout_secs);
        match timeout(connect_timeout, device.connect()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("BLE Connection error: {}", e);
                return false;
            }
            Err(_) => {
                warn!("Connection to {name} timed out");
                return false;
            }
        }

        if let Err(e) = device.discover_services().await {
            error!("Couldn't read services from connected device: {}", e);
            let _ = device.disconnect().await;
            return false;
        }
        let characteristics = device.characteristics();
        debug!("Found {} characteristics", characteristics.len());

        self.battery_characteristic = characteristics
            .iter()
            .find(|c| c.uuid == BATTERY_LEVEL_CHARACTERISTIC_UUID)
            .cloned();
        self.battery_level = BatteryLevel::NotReported;

        let Some(characteristic) = characteristics
            .iter()
            .find(|c| c.uuid == HEART_RATE_MEASUREMENT_CHARACTERISTIC_UUID)
        else {
            warn!("{name} has no HR measurement characteristic, skipping it");
            self.rejected.insert(device.id());
            let _ = device.disconnect().await;
            return false;
        };

        if let Err(e) = device.subscribe(characteristic).await {
            error!("Failed to subscribe to HR service! {}", e);
            let _ = device.disconnect().await;
            return false;
        }
        true
    }

    async fn notification_loop(&mut self, device: &Peripheral) -> Result<(), AppError> {
        let mut notification_stream = device.notifications().await?;
        let no_packet_timeout = Duration::from_secs(self.ble_settings.no_packet_timeout_secs);
        let mut battery_checking_interval = tokio::time::interval(Duration::from_secs(
            self.ble_settings.battery_poll_secs.max(1),
        ));
        let mut last_packet = Instant::now();
        loop {
            tokio::select! {
                // Assume we have a good connection if we keep getting updates
                notification = notification_stream.next() => {
                    match notification {
                        Some(data) if data.uuid == HEART_RATE_MEASUREMENT_CHARACTERISTIC_UUID => {
                            last_packet = Instant::now();
                            broadcast!(self.monitor_tx, MonitorUpdate::Notification(data.value));
                        }
                        Some(_) => {}
                        None => {
                            info!("Heart Rate Monitor stream closed!");
                            return Ok(());
                        }
                    }
                }
                _ = battery_checking_interval.tick() => {
                    self.get_monitor_battery(device).await;
                }
                _ = tokio::time::sleep_until(last_packet + no_packet_timeout) => {
                    error!("No HR data received in {} seconds!", no_packet_timeout.as_secs());
                    return Ok(());
                }
                _ = self.cancel_token.cancelled() => {
                    info!("Shutting down HR Notification thread!");
                    return Ok(());
                }
            }
        }
    }

    async fn get_monitor_battery(&mut self, device: &Peripheral) {
        if let Some(characteristic) = self.battery_characteristic.as_ref() {
            self.battery_level = match device.read(characteristic).await {
                Ok(value) if !value.is_empty() => BatteryLevel::Level(value[0]),
                _ => {
                    warn!("Failed to refresh battery level, keeping last");
                    self.battery_level
                }
            };
        }
        broadcast!(self.monitor_tx, self.battery_level);
    }
}

async fn disconnect_if_connected(device: &Peripheral) -> Result<(), btleplug::Error> {
    if device.is_connected().await.unwrap_or(false) {
        device.disconnect().await?;
    }
    Ok(())
}

/// Wraps up a connection that stopped streaming, however it stopped.
///
/// Errors here are routine (the monitor walked out of range) and only logged.
/// Returns false when the link should stop rather than scan again.
fn connection_ended(
    monitor_tx: &UnboundedSender<MonitorUpdate>,
    cancel_token: &CancellationToken,
    streamed: Result<(), AppError>,
    teardown: Result<(), btleplug::Error>,
) -> bool {
    if let Err(e) = streamed {
        warn!("Lost HR notifications: {e}");
    }
    if let Err(e) = teardown {
        warn!("Couldn't cleanly disconnect: {e}");
    }
    if cancel_token.is_cancelled() {
        return false;
    }
    broadcast!(monitor_tx, MonitorUpdate::Disconnected);
    true
}

async fn device_name(device: &Peripheral) -> String {
    device
        .properties()
        .await
        .ok()
        .flatten()
        .and_then(|properties| properties.local_name)
        .unwrap_or_else(|| "Unknown".into())
}

/// Runs the BLE side of the app until cancelled: scan, connect, forward raw
/// HR measurements, and go back to scanning if the monitor drops.
pub async fn ble_thread(
    monitor_tx: UnboundedSender<MonitorUpdate>,
    ble_settings: BLESettings,
    cancel_token: CancellationToken,
) {
    let mut ble_monitor = BleMonitorActor {
        monitor_tx: monitor_tx.clone(),
        ble_settings,
        cancel_token,
        battery_characteristic: None,
        battery_level: BatteryLevel::NotReported,
        rejected: HashSet::new(),
    };

    if let Err(e) = ble_monitor.run().await {
        error!("Fatal BLE Error: {e}");
        broadcast!(monitor_tx, MonitorUpdate::Error(format!("Fatal BLE Error: {e}")));
    }
}
