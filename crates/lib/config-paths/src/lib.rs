//! Default configuration file locations for mailmirror.

use std::path::PathBuf;

use either::Either;

/// Returns an iterator over default configuration file paths.
///
/// The paths are yielded in order of preference:
/// 1. User-specific config directory (XDG standard)
/// 2. User-specific config in home directory
/// 3. System-wide config
pub fn defaults() -> impl Iterator<Item = PathBuf> {
    let config_path = dirs::config_dir().into_iter().flat_map(|d| {
        [
            d.join("mailmirror/config.yaml"),
            d.join("mailmirror.yaml"),
        ]
    });
    let home_path = dirs::home_dir()
        .into_iter()
        .map(|d| d.join(".mailmirror.yaml"));
    let system_path = std::iter::once_with(|| PathBuf::from("/etc/mailmirror/config.yaml"));

    config_path.chain(home_path).chain(system_path)
}

/// Resolves configuration paths based on an explicit override or defaults.
///
/// An explicit path is the only candidate; it is never combined with the
/// defaults.
pub fn resolve(env_path: Option<PathBuf>) -> impl Iterator<Item = PathBuf> {
    match env_path {
        Some(val) => Either::Left(std::iter::once(val)),
        None => Either::Right(defaults()),
    }
}
