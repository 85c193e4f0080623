//! Device session: boot sequence, readiness, and the serial command loop.
//!
//! One logical thread drives everything; a capture cycle runs to completion
//! before the loop looks at the link or the console again.

use anyhow::Result;
use classifier_core::session;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;

use crate::camera::{Camera, FlashLed};
use crate::config::Config;
use crate::network::NetworkManager;
use crate::upload::HttpTransport;

pub fn run() -> Result<()> {
    let config = Config::default();
    log::info!("ESP32-CAM trash classifier starting");
    log::info!("Free heap: {} bytes", unsafe {
        esp_idf_sys::esp_get_free_heap_size()
    });

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;

    let mut flash = FlashLed::new(peripherals.pins.gpio4)?;
    let mut network = NetworkManager::new(peripherals.modem, sys_loop, &config)?;
    network.connect();

    // Camera init failure is the one unrecoverable condition: the device
    // cannot perform its function, so it halts here.
    let mut camera = match Camera::init() {
        Ok(camera) => {
            log::info!("camera initialized");
            camera
        }
        Err(e) => {
            log::error!("camera init failed: {e:?}; halting");
            loop {
                FreeRtos::delay_ms(1000);
            }
        }
    };

    let mut transport = HttpTransport::new(&config);
    let mut console = Console::new()?;

    log::info!("ready; commands: snap, status, reconnect, get");

    loop {
        if let Some(line) = console.poll_line() {
            let command = line.trim().to_ascii_lowercase();
            match command.as_str() {
                "snap" => snap(&config, &mut network, &mut camera, &mut flash, &mut transport),
                "status" => status(&config, &network),
                "reconnect" => {
                    log::info!("reconnect requested");
                    network.connect();
                }
                "get" => probe(&config, &transport),
                "" => {}
                other => {
                    log::warn!("unknown command '{other}'; available: snap, status, reconnect, get")
                }
            }
        }

        // Link watchdog: reconnect (and re-sync the clock) when it drops.
        if !network.refresh_link().is_connected() {
            log::warn!("WiFi link lost, reconnecting");
            if !network.connect().is_connected() {
                // Back off so a dead AP does not spin the loop.
                FreeRtos::delay_ms(5000);
            }
        }

        FreeRtos::delay_ms(100);
    }
}

/// One capture cycle: gate on the link, grab a flash-assisted frame, frame
/// it as multipart, send it, interpret whatever came back.
fn snap(
    config: &Config,
    network: &mut NetworkManager,
    camera: &mut Camera,
    flash: &mut FlashLed,
    transport: &mut HttpTransport,
) {
    log::info!("taking photo...");
    let link = network.refresh_link();
    let settle_ms = config.flash_settle.as_millis() as u32;

    let report = match session::run_cycle(
        link,
        camera,
        flash,
        || FreeRtos::delay_ms(settle_ms),
        transport,
        &config.classify_url,
    ) {
        Ok(report) => report,
        Err(e) => {
            log::error!("capture cycle aborted: {e}");
            return;
        }
    };

    if let Some(status) = report.transport_error() {
        log::error!("server returned HTTP {status}; body interpreted anyway");
    }

    log::info!("=== classification result ===");
    log::info!("category: {}", report.outcome.category.label());
    log::info!("{}", report.outcome.message);
    log::info!(
        "recyclable: {}",
        if report.outcome.recyclable { "yes" } else { "no" }
    );
}

fn status(config: &Config, network: &NetworkManager) {
    log::info!("=== device status ===");
    log::info!("WiFi: {:?} (SSID '{}')", network.link(), network.ssid());
    if let Some(ip) = network.ip() {
        log::info!("IP address: {ip}");
    }
    if let Some(rssi) = network.rssi() {
        log::info!("signal: {rssi} dBm");
    }
    log::info!("time sync: {:?}", network.time_state());
    log::info!("endpoint: {}", config.classify_url);
    unsafe {
        log::info!(
            "free heap: {} bytes (min {} since reset)",
            esp_idf_sys::esp_get_free_heap_size(),
            esp_idf_sys::esp_get_minimum_free_heap_size()
        );
    }
}

fn probe(config: &Config, transport: &HttpTransport) {
    match transport.probe(&config.probe_url) {
        Ok(reply) => log::info!("probe ok: status={} message={}", reply.status, reply.message),
        Err(e) => log::error!("probe failed: {e:?}"),
    }
}

// Non-blocking line reader over the console UART. A blocking stdin read
// would stall the link watchdog, so the descriptor is switched to
// O_NONBLOCK and drained a byte at a time.
struct Console {
    pending: String,
}

impl Console {
    fn new() -> Result<Self> {
        let res = unsafe {
            esp_idf_sys::fcntl(
                0,
                esp_idf_sys::F_SETFL as i32,
                esp_idf_sys::O_NONBLOCK as i32,
            )
        };
        if res < 0 {
            anyhow::bail!("failed to set console non-blocking: {res}");
        }
        Ok(Self {
            pending: String::new(),
        })
    }

    fn poll_line(&mut self) -> Option<String> {
        let mut byte = [0u8; 1];
        loop {
            let n = unsafe { esp_idf_sys::read(0, byte.as_mut_ptr().cast(), 1) };
            if n <= 0 {
                return None;
            }
            match byte[0] {
                b'\r' | b'\n' => {
                    if !self.pending.is_empty() {
                        return Some(std::mem::take(&mut self.pending));
                    }
                }
                b => self.pending.push(b as char),
            }
        }
    }
}
