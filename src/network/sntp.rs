use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use classifier_core::retry::RetryPolicy;
use classifier_core::timesync::{TimeSync, TimeSyncState};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::sntp::{EspSntp, SntpConf};

/// Keeps the SNTP client alive and owns the bounded wait for a plausible
/// clock. HTTPS certificate windows cannot validate against a clock still
/// at its boot default.
pub struct TimeKeeper {
    server: String,
    sntp: Option<EspSntp<'static>>,
    sync: TimeSync,
}

impl TimeKeeper {
    pub fn new(server: String, policy: RetryPolicy) -> Self {
        Self {
            server,
            sntp: None,
            sync: TimeSync::new(policy),
        }
    }

    pub fn status(&self) -> TimeSyncState {
        self.sync.status()
    }

    /// Starts SNTP on first use and waits, bounded, for the clock to pass
    /// the sanity threshold. Called at startup and after every reconnect;
    /// once the clock is set, the re-check succeeds on its first poll.
    pub fn synchronize(&mut self) -> TimeSyncState {
        if self.sntp.is_none() {
            match self.start_sntp() {
                Ok(sntp) => self.sntp = Some(sntp),
                Err(e) => {
                    log::error!("SNTP start failed: {e:?}");
                    return self.sync.status();
                }
            }
        }

        self.sync.synchronize(unix_now_secs, |d: Duration| {
            FreeRtos::delay_ms(d.as_millis() as u32)
        })
    }

    fn start_sntp(&self) -> Result<EspSntp<'static>> {
        log::info!("Initializing SNTP against {}", self.server);
        let conf = SntpConf {
            servers: [self.server.as_str()],
            ..Default::default()
        };
        Ok(EspSntp::new(&conf)?)
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
