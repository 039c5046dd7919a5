//! Home Assistant payloads.

use oauth2_token_storage_core::DeviceAuthChallenge;

#[derive(serde::Serialize)]
struct Discovery<'a> {
    #[serde(rename = "~")]
    base: &'a str,
    name: &'a str,
    event_types: [&'a str; 1],
    state_topic: &'a str,
    unique_id: String,
    device: Device<'a>,
}

#[derive(serde::Serialize)]
struct Device<'a> {
    identifiers: [&'a str; 1],
    name: &'a str,
}

#[derive(serde::Serialize)]
struct AuthEvent<'a> {
    event_type: &'a str,
    link: &'a str,
    code: &'a str,
}

const EVENT_TYPE: &str = "auth";

/// The discovery record of the event entity.
pub fn discovery(
    base: &str,
    name: &str,
    client_id: &str,
    key: &str,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Discovery {
        base,
        name,
        event_types: [EVENT_TYPE],
        state_topic: "~/state",
        unique_id: format!("{client_id}-{key}"),
        device: Device {
            identifiers: [client_id],
            name,
        },
    })
}

/// The event carrying the verification link and user code.
pub fn auth_event(challenge: &DeviceAuthChallenge) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&AuthEvent {
        event_type: EVENT_TYPE,
        link: &challenge.verification_uri,
        code: &challenge.user_code,
    })
}
