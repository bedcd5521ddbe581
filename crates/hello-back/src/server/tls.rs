//! TLS acceptor setup from a passphrase-protected PKCS#12 keystore.
//!
//! The keystore bundle is supplied either as a filesystem path or inline in
//! the configuration (base64, decoded by the resolver). This module loads
//! the bytes and constructs a [`tokio_native_tls::TlsAcceptor`]; the TLS
//! engine itself is an external collaborator.

use anyhow::{Context, Result};
use tokio_native_tls::TlsAcceptor;

use crate::config::KeystoreSource;

/// Load the raw keystore bytes for `source`.
///
/// A file path is read here, at startup: a missing or unreadable file aborts
/// the process before the listener binds.
///
/// # Errors
///
/// Returns an error if the keystore file cannot be read.
pub fn load_keystore(source: &KeystoreSource) -> Result<Vec<u8>> {
    match source {
        KeystoreSource::File(path) => std::fs::read(path)
            .with_context(|| format!("failed to read keystore file {}", path.display())),
        KeystoreSource::Inline(bytes) => Ok(bytes.clone()),
    }
}

/// Build a TLS acceptor from PKCS#12 keystore bytes and their passphrase.
///
/// # Errors
///
/// Returns an error if the bundle cannot be parsed with the given
/// passphrase, or if the TLS engine rejects the identity.
pub fn build_acceptor(keystore: &[u8], passphrase: &str) -> Result<TlsAcceptor> {
    let identity = native_tls::Identity::from_pkcs12(keystore, passphrase)
        .context("failed to parse PKCS#12 keystore")?;

    let acceptor = native_tls::TlsAcceptor::new(identity)
        .context("failed to build TLS acceptor from keystore identity")?;

    Ok(TlsAcceptor::from(acceptor))
}
