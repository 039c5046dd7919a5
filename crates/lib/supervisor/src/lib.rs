//! Lightweight async harness for supervised task execution.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::FutureExt as _;
use tokio_util::sync::CancellationToken;

/// The panic payload type alias.
pub type PanicPayload = Box<dyn std::any::Any + Send + 'static>;

/// Event sent to the notifier.
#[derive(Debug)]
pub enum SupervisorEvent<T, E> {
    /// The work is about to be invoked.
    Started {
        /// One-based attempt number.
        attempt: u32,
    },

    /// The work has completed without an error or panic.
    ///
    /// It won't be restarted.
    Done {
        /// The returned value.
        value: T,
    },

    /// The work returned an error.
    Error {
        /// The error that was returned by the work future.
        error: E,

        /// The time to wait before the next attempt, or `None` if there
        /// won't be one.
        next_retry_in: Option<Duration>,
    },

    /// The work panicked.
    Panicked {
        /// The captured panic payload.
        panic_payload: PanicPayload,

        /// The time to wait before the next attempt, or `None` if there
        /// won't be one.
        next_retry_in: Option<Duration>,
    },

    /// Shutdown was requested while waiting to restart.
    Stopped,
}

/// Parameters for `run`. Generic over the work and notifier closure types
/// and their returned futures.
pub struct Params<Work, Notifier, Sleep> {
    /// The work to run.
    pub work: Work,

    /// Notifier for events.
    pub notifier: Notifier,

    /// Sleep timer.
    pub sleep: Sleep,

    /// The exponential backoff configuration for the retries.
    pub retries_backoff: exp_backoff::State,

    /// Whether to restart after an error or panic.
    pub restart: bool,

    /// An attempt that ran at least this long resets the backoff.
    pub healthy_after: Duration,

    /// Stops restarting once cancelled.
    pub shutdown: CancellationToken,
}

/// Run the work until it succeeds, restarting it with backoff on failure.
pub async fn run<Work, WorkFut, Notifier, NotifierFut, Sleep, SleepFut, Value, Error>(
    mut params: Params<Work, Notifier, Sleep>,
) where
    Work: FnMut() -> WorkFut,
    WorkFut: Future<Output = Result<Value, Error>>,
    Notifier: FnMut(SupervisorEvent<Value, Error>) -> NotifierFut,
    NotifierFut: Future<Output = ()>,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut attempt = 0u32;

    loop {
        attempt = attempt.saturating_add(1);
        (params.notifier)(SupervisorEvent::Started { attempt }).await;

        let started_at = Instant::now();

        // Run the work and catch panics coming from the future.
        let work_future = std::panic::AssertUnwindSafe(async { (params.work)().await });
        let result = work_future.catch_unwind().await;

        if started_at.elapsed() >= params.healthy_after {
            params.retries_backoff.reset();
        }

        let restart = params.restart && !params.shutdown.is_cancelled();
        let next_retry_in = restart.then(|| params.retries_backoff.advance());

        match result {
            Ok(Ok(value)) => {
                (params.notifier)(SupervisorEvent::Done { value }).await;
                return;
            }
            Ok(Err(error)) => {
                (params.notifier)(SupervisorEvent::Error {
                    error,
                    next_retry_in,
                })
                .await;
            }
            Err(panic_payload) => {
                (params.notifier)(SupervisorEvent::Panicked {
                    panic_payload,
                    next_retry_in,
                })
                .await;
            }
        }

        let Some(delay) = next_retry_in else {
            return;
        };

        tokio::select! {
            () = (params.sleep)(delay) => {}
            () = params.shutdown.cancelled() => {
                (params.notifier)(SupervisorEvent::Stopped).await;
                return;
            }
        }
    }
}

/// Render a panic payload for logging.
pub fn panic_message(payload: &PanicPayload) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log) -> impl FnMut(SupervisorEvent<u32, &'static str>) -> std::future::Ready<()> {
        let log = Arc::clone(log);
        move |event: SupervisorEvent<u32, &'static str>| {
            let line = match event {
                SupervisorEvent::Started { attempt } => format!("started {attempt}"),
                SupervisorEvent::Done { value } => format!("done {value}"),
                SupervisorEvent::Error {
                    error,
                    next_retry_in,
                } => format!("error {error} {next_retry_in:?}"),
                SupervisorEvent::Panicked {
                    panic_payload,
                    next_retry_in,
                } => format!("panicked {} {next_retry_in:?}", panic_message(&panic_payload)),
                SupervisorEvent::Stopped => "stopped".to_owned(),
            };
            log.lock().unwrap().push(line);
            std::future::ready(())
        }
    }

    fn params<Work>(
        work: Work,
        log: &Log,
        restart: bool,
        shutdown: CancellationToken,
    ) -> Params<
        Work,
        impl FnMut(SupervisorEvent<u32, &'static str>) -> std::future::Ready<()>,
        impl FnMut(Duration) -> std::future::Ready<()>,
    > {
        Params {
            work,
            notifier: record(log),
            sleep: |_delay: Duration| std::future::ready(()),
            retries_backoff: exp_backoff::State::new(
                Duration::from_secs(1),
                2,
                Duration::from_secs(8),
            ),
            restart,
            healthy_after: Duration::from_secs(3600),
            shutdown,
        }
    }

    #[tokio::test]
    async fn restarts_with_backoff_until_done() {
        let log = Log::default();
        let mut calls = 0;

        run(params(
            || {
                calls += 1;
                let result = if calls < 3 { Err("boom") } else { Ok(calls) };
                std::future::ready(result)
            },
            &log,
            true,
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(
            *log.lock().unwrap(),
            [
                "started 1",
                "error boom Some(1s)",
                "started 2",
                "error boom Some(2s)",
                "started 3",
                "done 3",
            ]
        );
    }

    #[tokio::test]
    async fn no_restart_when_disabled() {
        let log = Log::default();

        run(params(
            || std::future::ready(Err("boom")),
            &log,
            false,
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(*log.lock().unwrap(), ["started 1", "error boom None"]);
    }

    #[tokio::test]
    async fn panics_are_caught() {
        let log = Log::default();
        let mut calls = 0;

        run(params(
            || {
                calls += 1;
                let first = calls == 1;
                async move {
                    if first {
                        panic!("kaput");
                    }
                    Ok(7)
                }
            },
            &log,
            true,
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(
            *log.lock().unwrap(),
            ["started 1", "panicked kaput Some(1s)", "started 2", "done 7"]
        );
    }

    #[tokio::test]
    async fn shutdown_stops_restarts() {
        let log = Log::default();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        run(params(
            || std::future::ready(Err("boom")),
            &log,
            true,
            shutdown,
        ))
        .await;

        assert_eq!(*log.lock().unwrap(), ["started 1", "error boom None"]);
    }
}
