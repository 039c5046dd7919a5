//! Docker-backed mirroring tests.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use idle_watcher::{ImapLongPoll, LongPoll as _, MailboxEvent, Relay};
use tokio_util::sync::CancellationToken;

type TestResult = Result<(), Box<dyn Error + Send + Sync>>;

const IMAP_USER: &str = "test@localhost";
const IMAP_PASSWORD: &str = "secret";

struct Server {
    _container: testcontainers::ContainerAsync<testcontainers::GenericImage>,
    endpoint: imap_integration::Endpoint,
}

impl Server {
    async fn start() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let container = imap_integration::start_greenmail(IMAP_USER, IMAP_PASSWORD).await?;
        let endpoint = imap_integration::Endpoint {
            host: container.get_host().await?.to_string(),
            port: container
                .get_host_port_ipv4(imap_integration::IMAP_PORT)
                .await?,
            user: IMAP_USER.to_owned(),
            password: IMAP_PASSWORD.to_owned(),
        };

        Ok(Self {
            _container: container,
            endpoint,
        })
    }

    async fn session(&self) -> Result<imap_integration::Session, std::io::Error> {
        self.endpoint.connect().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn moves_messages_to_target_mailbox() -> TestResult {
    imap_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    let mut setup = server.session().await?;
    setup.create("Archive").await?;
    for subject in ["one", "two"] {
        let body = format!("Subject: {subject}\r\n\r\nHello from tests.\r\n");
        setup.append("INBOX", None, None, body.as_bytes()).await?;
    }
    setup
        .append(
            "INBOX",
            Some("(\\Seen \\Flagged)"),
            None,
            b"Subject: three\r\n\r\nAlready read.\r\n",
        )
        .await?;

    let mut source = server.session().await?;
    let mut target = server.session().await?;
    let stored = AtomicU64::new(0);
    let params = mirror_pipeline::Params {
        source_mailbox: "INBOX".to_owned(),
        target_mailbox: "Archive".to_owned(),
    };

    let summary = mirror_pipeline::run(&mut source, &mut target, &params, &stored).await?;

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.stored, 3);
    assert_eq!(summary.deleted, 3);

    let archived = imap_integration::mailbox_flags(&mut setup, "Archive").await?;
    assert_eq!(archived.len(), 3);
    assert!(archived.iter().all(|flags| !flags.contains("Seen")));
    assert!(archived[2].contains("Flagged"));

    let inbox = imap_integration::mailbox_flags(&mut setup, "INBOX").await?;
    assert!(inbox.iter().all(|flags| flags.contains("Deleted")));

    source.logout().await?;
    target.logout().await?;
    setup.logout().await?;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_reports_new_mail() -> TestResult {
    imap_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    let mut watch = server.session().await?;
    watch.examine("INBOX").await?;

    let long_poll = ImapLongPoll::new(watch, Duration::from_secs(2)).await?;
    let relay = Arc::new(Relay::new());
    let cancel = CancellationToken::new();
    let running = tokio::spawn(long_poll.run(Arc::clone(&relay), cancel.clone()));

    let mut sender = server.session().await?;
    sender
        .append("INBOX", None, None, b"Subject: ping\r\n\r\nWake up.\r\n")
        .await?;

    let event = tokio::time::timeout(Duration::from_secs(30), relay.recv()).await?;
    assert_eq!(event, MailboxEvent::MailboxChanged);

    cancel.cancel();
    let long_poll = running.await??;
    long_poll.close().await?;
    sender.logout().await?;

    Ok(())
}
