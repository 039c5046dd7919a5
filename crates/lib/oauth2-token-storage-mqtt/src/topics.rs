//! Topic naming.

/// The account key used in topic names: the display name with `@` and `.`
/// replaced by `-`.
pub fn account_key(name: &str) -> String {
    name.replace(['@', '.'], "-")
}

/// The retained token topic.
pub fn token(client_id: &str, key: &str) -> String {
    format!("modernauth/{client_id}/{key}/token")
}

/// The base topic of the Home Assistant event entity.
pub fn event_base(client_id: &str, key: &str) -> String {
    format!("homeassistant/event/{client_id}/{key}")
}

/// The discovery topic of the event entity.
pub fn event_config(base: &str) -> String {
    format!("{base}/config")
}

/// The state topic of the event entity.
pub fn event_state(base: &str) -> String {
    format!("{base}/state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_address() {
        assert_eq!(account_key("john.doe@example.com"), "john-doe-example-com");
        assert_eq!(account_key("plain"), "plain");
    }

    #[test]
    fn topic_layout() {
        let key = account_key("a@b.c");
        assert_eq!(token("mirror", &key), "modernauth/mirror/a-b-c/token");

        let base = event_base("mirror", &key);
        assert_eq!(event_config(&base), "homeassistant/event/mirror/a-b-c/config");
        assert_eq!(event_state(&base), "homeassistant/event/mirror/a-b-c/state");
    }
}
