use anyhow::{bail, Result};
use classifier_core::link::LinkInterface;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

/// Thin Wi-Fi driver wrapper. The bounded connect sequencing lives in
/// `classifier_core::link::Connectivity`; this type only starts handshakes
/// and answers "is the link up".
pub struct WifiDriver {
    wifi: EspWifi<'static>,
    pub ssid: String,
}

impl WifiDriver {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        ssid: String,
        password: String,
    ) -> Result<Self> {
        log::info!("Initializing WiFi driver for SSID: '{}'", ssid);

        if ssid.is_empty() {
            log::error!("WiFi SSID is empty! Check wifi_config.h");
            bail!("WiFi SSID cannot be empty");
        }

        let nvs = EspDefaultNvsPartition::take()?;
        let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs))?;

        let cfg = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("Invalid SSID format: {ssid}"))?,
            password: password
                .as_str()
                .try_into()
                .map_err(|_| anyhow::anyhow!("Invalid password format"))?,
            auth_method: if password.is_empty() {
                log::warn!("WiFi password is empty, using open network");
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        wifi.set_configuration(&cfg)?;
        Ok(Self { wifi, ssid })
    }

    pub fn ip(&self) -> Option<String> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .and_then(|info| (!info.ip.is_unspecified()).then(|| info.ip.to_string()))
    }

    /// Current RSSI straight from the driver, None when not associated.
    pub fn rssi(&self) -> Option<i32> {
        unsafe {
            let mut ap: esp_idf_sys::wifi_ap_record_t = std::mem::zeroed();
            (esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap) == esp_idf_sys::ESP_OK)
                .then_some(ap.rssi as i32)
        }
    }
}

impl LinkInterface for WifiDriver {
    fn is_up(&self) -> bool {
        // Associated and holding a DHCP lease.
        self.wifi.is_connected().unwrap_or(false) && self.ip().is_some()
    }

    fn start_handshake(&mut self) -> bool {
        let kicked = (|| -> Result<()> {
            if !self.wifi.is_started()? {
                self.wifi.start()?;
            }
            self.wifi.connect()?;
            Ok(())
        })();

        match kicked {
            Ok(()) => true,
            Err(e) => {
                log::error!("WiFi handshake failed: {e:?}");
                false
            }
        }
    }
}
