//! Running one account under supervision.

use std::sync::Arc;

use account_engine::{AccountError, AccountStatus, Connector, Engine, State};
use supervisor::SupervisorEvent;
use tokio_util::sync::CancellationToken;

/// Run the account until shutdown, restarting failed runs per `supervision`.
pub async fn supervise<C>(
    engine: Engine<C>,
    supervision: config_bringup::Supervision,
    shutdown: CancellationToken,
) where
    C: Connector + 'static,
{
    let status = engine.status();
    let engine = Arc::new(tokio::sync::Mutex::new(engine));

    let work = {
        let shutdown = shutdown.clone();
        move || {
            let engine = Arc::clone(&engine);
            let shutdown = shutdown.clone();
            async move {
                let mut engine = engine.lock().await;
                run_once(&mut engine, &shutdown).await
            }
        }
    };

    let notifier = move |event: SupervisorEvent<(), AccountError>| {
        let status = Arc::clone(&status);
        async move { report(&status, event) }
    };

    supervisor::run(supervisor::Params {
        work,
        notifier,
        sleep: tokio::time::sleep,
        retries_backoff: exp_backoff::State::new(
            supervision.initial_backoff,
            2,
            supervision.max_backoff,
        ),
        restart: supervision.restart,
        healthy_after: supervision.healthy_after,
        shutdown,
    })
    .await;
}

/// One attempt: connect, watch until shutdown or failure, release.
async fn run_once<C: Connector>(
    engine: &mut Engine<C>,
    shutdown: &CancellationToken,
) -> Result<(), AccountError> {
    if engine.state() != State::Initial {
        // Leftovers of a panicked attempt.
        release(engine).await;
    }

    let initialized = tokio::select! {
        result = engine.init() => result,
        () = shutdown.cancelled() => Ok(()),
    };

    let result = match initialized {
        Ok(()) if shutdown.is_cancelled() => Ok(()),
        Ok(()) => engine.watch(shutdown).await,
        Err(err) => Err(err),
    };

    release(engine).await;
    result
}

async fn release<C: Connector>(engine: &mut Engine<C>) {
    if let Err(error) = engine.close().await {
        tracing::warn!(account = %engine.name(), %error, "unable to release the account");
    }
}

fn report(status: &AccountStatus, event: SupervisorEvent<(), AccountError>) {
    let account = status.name();
    match event {
        SupervisorEvent::Started { attempt } => {
            tracing::info!(%account, attempt, "starting account");
        }
        SupervisorEvent::Done { value: () } => {
            tracing::info!(%account, "account stopped");
            log_snapshot(status);
        }
        SupervisorEvent::Error {
            error,
            next_retry_in,
        } => {
            tracing::error!(%account, %error, ?next_retry_in, "account run failed");
            log_snapshot(status);
        }
        SupervisorEvent::Panicked {
            panic_payload,
            next_retry_in,
        } => {
            tracing::error!(
                %account,
                panic = supervisor::panic_message(&panic_payload),
                ?next_retry_in,
                "account run panicked"
            );
            log_snapshot(status);
        }
        SupervisorEvent::Stopped => {
            tracing::info!(%account, "restart cancelled by shutdown");
        }
    }
}

/// Log the current counters of an account.
pub fn log_snapshot(status: &AccountStatus) {
    let snapshot = status.snapshot();
    tracing::info!(
        account = %snapshot.name,
        state = %snapshot.state,
        state_code = snapshot.state.code(),
        processed = snapshot.processed,
        last_error = snapshot.last_error.as_deref(),
        "account status"
    );
}
