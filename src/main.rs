mod config;

#[cfg(target_os = "espidf")]
mod app;
#[cfg(target_os = "espidf")]
mod camera;
#[cfg(target_os = "espidf")]
mod network;
#[cfg(target_os = "espidf")]
mod upload;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    app::run()
}

// Host builds exist to run the classifier-core test suite; the firmware
// entry point needs the ESP-IDF target.
#[cfg(not(target_os = "espidf"))]
fn main() {
    let config = config::Config::default();
    eprintln!(
        "esp32-trash-classifier is ESP-IDF firmware (endpoint: {}); run `cargo test` on the host",
        config.classify_url
    );
}
