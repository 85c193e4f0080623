pub mod sntp;
pub mod wifi;

use std::net::ToSocketAddrs;
use std::time::Duration;

use anyhow::Result;
use classifier_core::endpoint;
use classifier_core::link::{Connectivity, LinkState};
use classifier_core::timesync::TimeSyncState;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;

use self::sntp::TimeKeeper;
use self::wifi::WifiDriver;
use crate::config::Config;

/// Owns the link and time-sync context. These are the only pieces of state
/// that survive across capture cycles, and nothing else writes them.
pub struct NetworkManager {
    connectivity: Connectivity<WifiDriver>,
    time: TimeKeeper,
    dns_probe: Option<String>,
}

impl NetworkManager {
    pub fn new(modem: Modem, sys_loop: EspSystemEventLoop, config: &Config) -> Result<Self> {
        let wifi = WifiDriver::new(
            modem,
            sys_loop,
            config.wifi_ssid.clone(),
            config.wifi_password.clone(),
        )?;

        Ok(Self {
            connectivity: Connectivity::new(wifi, config.link_retry),
            time: TimeKeeper::new(config.ntp_server.clone(), config.time_retry),
            dns_probe: endpoint::resolve_target(&config.classify_url),
        })
    }

    /// Brings the link up (a no-op when already connected) and re-syncs the
    /// clock. Certificate validation needs a plausible clock, so the sync
    /// follows every successful (re)connect.
    pub fn connect(&mut self) -> LinkState {
        let state = self
            .connectivity
            .connect(|d: Duration| FreeRtos::delay_ms(d.as_millis() as u32));

        if state.is_connected() {
            if let Some(ip) = self.connectivity.interface().ip() {
                log::info!("IP address: {ip}");
            }
            self.log_dns_diagnostic();
            self.time.synchronize();
        }
        state
    }

    pub fn link(&self) -> LinkState {
        self.connectivity.status()
    }

    pub fn refresh_link(&mut self) -> LinkState {
        self.connectivity.refresh()
    }

    pub fn time_state(&self) -> TimeSyncState {
        self.time.status()
    }

    pub fn ip(&self) -> Option<String> {
        self.connectivity.interface().ip()
    }

    pub fn rssi(&self) -> Option<i32> {
        self.connectivity.interface().rssi()
    }

    pub fn ssid(&self) -> &str {
        &self.connectivity.interface().ssid
    }

    // Early warning for a broken resolver. Uploads fail visibly on their
    // own later, so a miss here is logged and nothing more.
    fn log_dns_diagnostic(&self) {
        let Some(target) = self.dns_probe.as_deref() else {
            return;
        };
        match target.to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => log::info!("endpoint {target} resolves to {addr}"),
                None => log::warn!("endpoint {target} resolved to no addresses"),
            },
            Err(e) => log::warn!("DNS resolution failed for {target}: {e} (uploads may fail)"),
        }
    }
}
