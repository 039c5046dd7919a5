//! Lift raw config into account engine inputs.
//!
//! Everything is validated here, before any account starts.

use std::collections::HashSet;

mod error;
mod internal;
mod types;

pub use error::*;
pub use types::*;

/// Resolve the configuration using the built-in provider table.
pub fn bringup(config: &config_core::Config) -> Result<Bringup, ConfigError> {
    bringup_with(config, oauth2_session::builtin())
}

/// Resolve the configuration using the given provider table; configured
/// providers override entries of the same name.
pub fn bringup_with(
    config: &config_core::Config,
    builtin: oauth2_session::Providers,
) -> Result<Bringup, ConfigError> {
    if config.accounts.is_empty() {
        return Err(ConfigError::NoAccounts);
    }

    let mut names = HashSet::new();
    for account in &config.accounts {
        if !names.insert(account.name.as_str()) {
            return Err(ConfigError::DuplicateAccount {
                name: account.name.clone(),
            });
        }
    }

    let http_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(ConfigError::HttpClient)?;

    let providers = internal::providers(&config.oauth2_providers, builtin);
    let mut token_sources = internal::TokenSources {
        servers: internal::oauth2_servers(&providers, &http_client)?,
        broker: config.mqtt.as_ref().map(internal::broker),
        cache: Default::default(),
    };

    let accounts = config
        .accounts
        .iter()
        .map(|account| {
            internal::account(account, &mut token_sources).map_err(|source| {
                ConfigError::Account {
                    name: account.name.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Bringup {
        accounts,
        supervision: internal::supervision(&config.supervision),
    })
}
