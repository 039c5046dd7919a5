//! Find the configuration file and read it.

use std::path::{Path, PathBuf};

/// A payload together with the file it came from.
#[derive(Debug)]
pub struct Located<T> {
    /// The payload.
    pub payload: T,

    /// The file the payload was read from.
    pub path: PathBuf,
}

impl<T> Located<T> {
    /// Transform the payload, keeping the path.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Located<U> {
        Located {
            payload: f(self.payload),
            path: self.path,
        }
    }
}

/// Error returned while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// None of the candidate files exists.
    #[error("no config file found in paths: {paths:?}")]
    NotFound {
        /// The paths that were tried.
        paths: Vec<PathBuf>,
    },

    /// A candidate exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Read the first existing file among `paths`.
///
/// Missing files are skipped; any other I/O failure stops the search.
pub async fn read<P>(paths: &[P]) -> Result<Located<String>, ReadError>
where
    P: AsRef<Path>,
{
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(payload) => {
                return Ok(Located {
                    payload,
                    path: path.to_path_buf(),
                });
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(ReadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    Err(ReadError::NotFound {
        paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
    })
}

/// Error returned while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError<ParseError> {
    /// Failed to read the configuration file.
    #[error(transparent)]
    Read(ReadError),

    /// Failed to parse the configuration contents.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,

        /// Underlying parser error.
        #[source]
        source: ParseError,
    },
}

/// Read the first existing file among `paths` and parse it with `parse`.
pub async fn load<P, F, T, E>(paths: &[P], parse: F) -> Result<Located<T>, LoadError<E>>
where
    P: AsRef<Path>,
    F: FnOnce(&str) -> Result<T, E>,
{
    let Located { path, payload } = read(paths).await.map_err(LoadError::Read)?;
    match parse(&payload) {
        Ok(payload) => Ok(Located { payload, path }),
        Err(source) => Err(LoadError::Parse { path, source }),
    }
}
