//! Broker test harness crate.

mod mosquitto;
mod observer;

pub use mosquitto::start_mosquitto;
pub use observer::Observer;

/// Plain MQTT port of the Mosquitto container.
pub const MQTT_PORT: u16 = 1883;

/// Returns Ok when integration tests should run, otherwise logs a hint and returns an error.
pub fn require_integration_tests_enabled() -> Result<(), &'static str> {
    if std::env::var_os("RUN_MQTT_INTEGRATION_TESTS").is_some() {
        return Ok(());
    }

    eprintln!("skipping MQTT integration tests; set RUN_MQTT_INTEGRATION_TESTS=true to run");

    Err("integration tests disabled")
}
