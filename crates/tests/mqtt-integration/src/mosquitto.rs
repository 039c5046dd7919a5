//! Mosquitto container helpers.

use testcontainers::{
    GenericImage, ImageExt as _, core::IntoContainerPort as _, runners::AsyncRunner as _,
};

/// Starts an anonymous Mosquitto broker listening on all interfaces.
pub async fn start_mosquitto()
-> Result<testcontainers::ContainerAsync<GenericImage>, testcontainers::TestcontainersError> {
    GenericImage::new("eclipse-mosquitto", "2.0.18")
        .with_exposed_port(crate::MQTT_PORT.tcp())
        .with_wait_for(testcontainers::core::WaitFor::message_on_stderr(
            "running",
        ))
        .with_cmd(["mosquitto", "-c", "/mosquitto-no-auth.conf"])
        .start()
        .await
}
