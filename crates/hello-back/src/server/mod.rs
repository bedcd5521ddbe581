//! Axum HTTP(S) server, routing, and middleware.
//!
//! # Responsibilities
//! - Bind the listener, terminating TLS when a keystore is configured.
//! - Define the Axum router with the webhook route and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.

pub mod handlers;
pub mod router;
pub mod state;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::TlsSettings;

/// Serve `app` over plain HTTP on `addr`. Runs until the process is killed.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = bind(addr).await?;
    info!(addr = %addr, "http server listening");

    axum::serve(listener, app).await.context("http server error")
}

/// Serve `app` over TLS on `addr` with the configured keystore.
///
/// Each accepted connection is handshaken and driven on its own task;
/// per-connection failures are logged and never tear down the listener.
///
/// # Errors
///
/// Returns an error if the keystore cannot be loaded or the listener cannot
/// be bound; either failure happens before any connection is accepted.
pub async fn serve_tls(addr: SocketAddr, app: Router, settings: &TlsSettings) -> Result<()> {
    let keystore = tls::load_keystore(&settings.keystore)?;
    let acceptor = Arc::new(tls::build_acceptor(&keystore, &settings.passphrase)?);

    let listener = bind(addr).await?;
    info!(addr = %addr, "https server listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!(%peer_addr, "accepted connection");
                let acceptor = acceptor.clone();
                let service = TowerToHyperService::new(app.clone());
                tokio::spawn(async move {
                    let stream = match acceptor.accept(stream).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!(%peer_addr, error = %e, "TLS handshake failed");
                            return;
                        }
                    };
                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        warn!(%peer_addr, error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "accept error");
            }
        }
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}
