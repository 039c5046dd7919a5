//! The per-account control loop.
//!
//! [`Engine::init`] probes both stores and opens the watch session,
//! [`Engine::watch`] waits for mailbox changes and runs [`Engine::handle`]
//! for each, and [`Engine::close`] releases everything. Retrying a failed
//! run is up to the caller.

use std::sync::Arc;

use idle_watcher::{LongPoll, MailboxEvent, Relay};
use tokio_util::sync::CancellationToken;

mod connector;
mod error;
mod imap;
mod state;
mod status;

pub use connector::{Account, Connector, Source, Target};
pub use error::{AccountError, BoxError, ConnectionError, ErrorKind, Role};
pub use imap::ImapConnector;
pub use state::State;
pub use status::{AccountStatus, StatusSnapshot};

/// Drives one account.
pub struct Engine<C: Connector> {
    connector: C,
    status: Arc<AccountStatus>,
    relay: Arc<Relay>,
    watch: Option<C::Watch>,
}

impl<C: Connector> Engine<C> {
    /// Create an engine in the initial state.
    pub fn new(name: impl Into<String>, connector: C) -> Self {
        Self {
            connector,
            status: Arc::new(AccountStatus::new(name)),
            relay: Arc::new(Relay::new()),
            watch: None,
        }
    }

    /// Account display name.
    pub fn name(&self) -> &str {
        self.status.name()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.status.state()
    }

    /// Shared handle to the observable status.
    pub fn status(&self) -> Arc<AccountStatus> {
        Arc::clone(&self.status)
    }

    /// The connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Check both stores and open the watch session.
    ///
    /// On success the engine is `Connected` and a catch-up cycle is queued
    /// for the first `watch`. On failure it stays `Connecting`.
    pub async fn init(&mut self) -> Result<(), AccountError> {
        self.transition(State::Connecting);

        let source = self.connector.open_source().await.map_err(|err| self.fail(err))?;
        self.connector.close_source(source).await.map_err(|err| self.fail(err))?;

        let target = self.connector.open_target().await.map_err(|err| self.fail(err))?;
        self.connector.close_target(target).await.map_err(|err| self.fail(err))?;

        let watch = self.connector.open_watch().await.map_err(|err| self.fail(err))?;
        self.watch = Some(watch);

        self.relay.publish(MailboxEvent::MailboxChanged);

        self.transition(State::Connected);
        Ok(())
    }

    /// Watch the source mailbox and run a cycle for every change.
    ///
    /// Returns `Ok` once cancelled. A failed cycle or a failed watch session
    /// ends the watch with that error. A running cycle is not interrupted by
    /// cancellation, but no new one starts after it. Dropping the future
    /// stops the long-poll task.
    pub async fn watch(&mut self, cancel: &CancellationToken) -> Result<(), AccountError> {
        let Some(long_poll) = self.watch.take() else {
            return Err(self.fail(ErrorKind::NotConnected));
        };

        let previous = self.state();
        self.transition(State::Watching);

        let relay = Arc::clone(&self.relay);
        let poll_cancel = cancel.child_token();
        let _stop_poll = poll_cancel.clone().drop_guard();
        let mut poll = tokio::spawn(long_poll.run(Arc::clone(&relay), poll_cancel.clone()));

        let result = loop {
            tokio::select! {
                biased;

                joined = &mut poll => {
                    break self.poll_finished(joined);
                }
                event = relay.recv() => {
                    if !event.is_trigger() {
                        tracing::debug!(
                            account = %self.name(),
                            state = %self.state(),
                            %event,
                            "mailbox event does not need a cycle"
                        );
                        continue;
                    }

                    if cancel.is_cancelled() {
                        continue;
                    }

                    if let Err(err) = self.handle().await {
                        poll_cancel.cancel();
                        let _ = self.poll_finished(poll.await);
                        break Err(err);
                    }
                }
            }
        };

        self.transition(previous);
        result
    }

    /// Run one mirroring cycle on fresh sessions.
    ///
    /// The state is restored afterwards whatever the outcome.
    pub async fn handle(&mut self) -> Result<mirror_pipeline::Summary, AccountError> {
        let previous = self.state();
        self.transition(State::Handling);

        let result = self.cycle().await;

        self.transition(previous);
        result
    }

    /// Release the watch session and return to the initial state.
    pub async fn close(&mut self) -> Result<(), AccountError> {
        self.transition(State::Shutdown);

        let result = match self.watch.take() {
            Some(watch) => watch
                .close()
                .await
                .map_err(|err| self.fail(ErrorKind::Watch(Box::new(err)))),
            None => Ok(()),
        };

        self.transition(State::Initial);
        result
    }

    async fn cycle(&self) -> Result<mirror_pipeline::Summary, AccountError> {
        tracing::info!(account = %self.name(), state = %self.state(), "begin handling");

        let mut source = self.connector.open_source().await.map_err(|err| self.fail(err))?;

        let mut target = match self.connector.open_target().await {
            Ok(target) => target,
            Err(err) => {
                self.release(self.connector.close_source(source).await);
                return Err(self.fail(err));
            }
        };

        let params = self.connector.pipeline_params();
        let result = mirror_pipeline::run(
            &mut source,
            &mut target,
            &params,
            self.status.processed_counter(),
        )
        .await;

        self.release(self.connector.close_source(source).await);
        self.release(self.connector.close_target(target).await);

        match result {
            Ok(summary) => {
                tracing::info!(
                    account = %self.name(),
                    state = %self.state(),
                    stored = summary.stored,
                    ignored = summary.ignored,
                    deleted = summary.deleted,
                    "message handling successful"
                );
                Ok(summary)
            }
            Err(err) => Err(self.fail(ErrorKind::from(err))),
        }
    }

    fn poll_finished(
        &mut self,
        joined: Result<
            Result<C::Watch, <C::Watch as LongPoll>::Error>,
            tokio::task::JoinError,
        >,
    ) -> Result<(), AccountError> {
        match joined {
            Ok(Ok(watch)) => {
                tracing::debug!(account = %self.name(), state = %self.state(), "not idling anymore");
                self.watch = Some(watch);
                Ok(())
            }
            Ok(Err(err)) => Err(self.fail(ErrorKind::Watch(Box::new(err)))),
            Err(err) => Err(self.fail(ErrorKind::Watch(Box::new(err)))),
        }
    }

    fn release(&self, closed: Result<(), ConnectionError>) {
        if let Err(err) = closed {
            tracing::warn!(
                account = %self.name(),
                state = %self.state(),
                error = %err,
                "unable to close session"
            );
        }
    }

    fn transition(&self, next: State) {
        let current = self.state();
        if current == next {
            return;
        }

        if !current.can_transition_to(next) {
            tracing::warn!(
                account = %self.name(),
                from = %current,
                to = %next,
                "ignoring invalid state transition"
            );
            return;
        }

        self.status.set_state(next);
        tracing::debug!(account = %self.name(), from = %current, to = %next, "state changed");
    }

    fn fail(&self, kind: impl Into<ErrorKind>) -> AccountError {
        let err = AccountError {
            account: self.name().to_owned(),
            state: self.state(),
            kind: kind.into(),
        };

        tracing::error!(account = %err.account, state = %err.state, error = %err.kind, "account error");
        self.status.record_error(&err);

        err
    }
}
