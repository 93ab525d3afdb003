use super::measurement::{duration_to_rr, encode_hrm, HeartRateMeasurement};
use super::{rr_from_bpm, BatteryLevel, MonitorUpdate};
use crate::broadcast;
use crate::settings::DummySettings;

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tracing::info;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Sweeps BPM between the configured bounds, sending real 0x2A37 payloads
/// with a jittered RR interval so the HRV chart has something to show.
pub async fn dummy_thread(
    monitor_tx: UnboundedSender<MonitorUpdate>,
    dummy_settings: DummySettings,
    cancel_token: CancellationToken,
) {
    let bpm_update_per_sec = Duration::from_secs_f32(1.0 / dummy_settings.bpm_speed);
    let mut bpm_update_interval = time::interval(bpm_update_per_sec);
    let low_bpm = dummy_settings.low_bpm;
    let high_bpm = dummy_settings.high_bpm;
    let jitter = i32::from(dummy_settings.rr_jitter);
    let loops_before_dc = dummy_settings.loops_before_dc;

    let mut rng = StdRng::from_entropy();
    let mut loops: u16 = 0;
    let mut positive_direction = true;
    let mut connected = false;
    let mut measurement = HeartRateMeasurement {
        bpm: low_bpm.saturating_sub(1),
        sensor_contact: Some(true),
        ..Default::default()
    };

    loop {
        tokio::select! {
            _ = bpm_update_interval.tick() => {
                if !connected {
                    broadcast!(monitor_tx, MonitorUpdate::Connected { name: "Dummy Monitor".into() });
                    broadcast!(monitor_tx, BatteryLevel::Level(100));
                    connected = true;
                }
                let bound = if positive_direction {
                    measurement.bpm += 1;
                    high_bpm
                } else {
                    measurement.bpm -= 1;
                    low_bpm
                };
                let rr = i32::from(duration_to_rr(rr_from_bpm(measurement.bpm)));
                let offset = if jitter > 0 { rng.gen_range(-jitter..=jitter) } else { 0 };
                measurement.rr_intervals = vec![(rr + offset).clamp(1, i32::from(u16::MAX)) as u16];
                if measurement.bpm == bound {
                    positive_direction = !positive_direction;
                    loops += 1;
                    if loops > loops_before_dc {
                        loops = 0;
                    }
                }
                if loops == loops_before_dc && loops_before_dc != 0 {
                    info!("Dummy: simulating lost connection");
                    broadcast!(monitor_tx, MonitorUpdate::Disconnected);
                    connected = false;
                    loops = 0;
                } else {
                    broadcast!(monitor_tx, MonitorUpdate::Notification(encode_hrm(&measurement)));
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Shutting down Dummy thread!");
                break;
            }
        }
    }
}
