//! Mailbox names.

/// A mailbox name together with its modified UTF-7 wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxName {
    /// The name as configured.
    name: String,

    /// The name as sent to the server.
    encoded: String,
}

impl MailboxName {
    /// Encode a configured mailbox name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let encoded = utf7_imap::encode_utf7_imap(name.clone());
        Self { name, encoded }
    }

    /// The wire form.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The configured form.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for MailboxName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_unchanged() {
        let mailbox = MailboxName::new("INBOX");
        assert_eq!(mailbox.encoded(), "INBOX");
        assert_eq!(mailbox.to_string(), "INBOX");
    }

    #[test]
    fn non_ascii_names_are_encoded() {
        let mailbox = MailboxName::new("Entwürfe");
        assert_eq!(mailbox.as_str(), "Entwürfe");
        assert_eq!(mailbox.encoded(), "Entw&APw-rfe");
    }
}
