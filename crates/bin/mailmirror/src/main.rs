//! Mirror the configured source mailboxes into their targets.

use account_engine::{Engine, ImapConnector};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod account;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    let config = config_yaml::load_with_default_env_var().await?;
    init_tracing(config.payload.logging.filter.as_deref())?;
    tracing::info!(path = %config.path.display(), "configuration loaded");

    let bringup = config_bringup::bringup(&config.payload)?;
    drop(config);

    let shutdown = CancellationToken::new();
    let mut join_set = tokio::task::JoinSet::new();
    let mut statuses = Vec::with_capacity(bringup.accounts.len());

    for account in bringup.accounts {
        let engine = Engine::new(account.name.clone(), ImapConnector::new(account));
        statuses.push(engine.status());
        join_set.spawn(account::supervise(
            engine,
            bringup.supervision.clone(),
            shutdown.clone(),
        ));
    }

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(error) = shutdown_signal().await {
                tracing::error!(%error, "unable to listen for shutdown signals");
            }
            tracing::info!("shutting down");
            shutdown.cancel();
        }
    });

    while let Some(result) = join_set.join_next().await {
        if let Err(error) = result {
            tracing::error!(%error, "account task failed");
        }
    }

    for status in statuses {
        account::log_snapshot(&status);
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: Option<&str>) -> color_eyre::eyre::Result<()> {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::try_from_default_env()?
    } else {
        EnvFilter::try_new(configured.unwrap_or("info"))?
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
