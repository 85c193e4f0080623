use std::time::Duration;

use classifier_core::retry::RetryPolicy;

/// Build-time device configuration. WiFi credentials come from
/// wifi_config.h via build.rs; endpoints can be overridden with
/// CLASSIFY_URL / PROBE_URL at compile time. There is no runtime
/// reconfiguration surface.
#[derive(Debug, Clone)]
pub struct Config {
    pub wifi_ssid: String,
    pub wifi_password: String,

    // Server endpoints
    pub classify_url: String,
    pub probe_url: String,

    // SNTP source, needed before any HTTPS request can validate a cert
    pub ntp_server: String,

    // Bounded-poll budgets: 40 x 500ms for the link, 20 x 500ms for time
    pub link_retry: RetryPolicy,
    pub time_retry: RetryPolicy,

    // Transport timeouts
    pub connect_timeout: Duration,
    pub response_timeout: Duration,

    // Flash LED settle interval before the frame grab
    pub flash_settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi_ssid: env!("WIFI_SSID").to_string(),
            wifi_password: env!("WIFI_PASSWORD").to_string(),
            classify_url: option_env!("CLASSIFY_URL")
                .unwrap_or("http://192.168.254.15:8000/classify")
                .to_string(),
            probe_url: option_env!("PROBE_URL")
                .unwrap_or("http://192.168.254.15:8000/test")
                .to_string(),
            ntp_server: "pool.ntp.org".to_string(),
            link_retry: RetryPolicy::new(40, Duration::from_millis(500)),
            time_retry: RetryPolicy::new(20, Duration::from_millis(500)),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(15),
            flash_settle: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_budgets_match_the_connect_and_sync_windows() {
        let config = Config::default();
        assert_eq!(config.link_retry.budget(), Duration::from_secs(20));
        assert_eq!(config.time_retry.budget(), Duration::from_secs(10));
    }

    #[test]
    fn default_endpoints_are_distinct_paths_on_one_server() {
        let config = Config::default();
        assert!(config.classify_url.ends_with("/classify"));
        assert!(config.probe_url.ends_with("/test"));
        assert!(config.response_timeout > config.connect_timeout);
    }
}
