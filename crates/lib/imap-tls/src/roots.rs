//! Root certificate loading for the rustls connector.

/// Errors returned while preparing the TLS connector.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Failed to load system root certificates.
    #[error("failed to load system root certificates: {0}")]
    RootCerts(#[source] rustls_native_certs::Error),

    /// The system store yielded no usable certificate.
    #[error("no usable root certificates found in the system store")]
    NoRootCerts,

    /// The crypto provider rejected the protocol versions.
    #[error("TLS protocol setup: {0}")]
    Protocol(#[source] rustls::Error),
}

/// Build a rustls connector trusting the platform root certificates.
pub fn connector() -> Result<tokio_rustls::TlsConnector, ConnectorError> {
    let rustls_native_certs::CertificateResult { certs, errors, .. } =
        rustls_native_certs::load_native_certs();

    if certs.is_empty()
        && let Some(err) = errors.into_iter().next()
    {
        return Err(ConnectorError::RootCerts(err));
    }

    let mut root_store = rustls::RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(certs);
    if added == 0 {
        return Err(ConnectorError::NoRootCerts);
    }
    if ignored > 0 {
        tracing::debug!(added, ignored, "skipped unparsable root certificates");
    }

    let config = rustls::ClientConfig::builder_with_provider(std::sync::Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(ConnectorError::Protocol)?
    .with_root_certificates(root_store)
    .with_no_client_auth();

    Ok(tokio_rustls::TlsConnector::from(std::sync::Arc::new(
        config,
    )))
}
