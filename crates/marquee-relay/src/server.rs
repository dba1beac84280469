//! Listener setup, accept loop, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use marquee_config::Config;
use marquee_config::defaults::{DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeLimits, BridgeOutcome, run_bridge};
use crate::error::RelayError;
use crate::tls::load_tls_config;
use crate::upstream::TlsDownstream;

/// Default graceful shutdown timeout.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS);

const ACCEPT_BACKOFF_INITIAL: Duration = Duration::from_millis(100);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Run the relay with a cancellation token for graceful shutdown.
pub async fn run_with_shutdown(
    config: Config,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let tls_config = load_tls_config(&config.tls)?;
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));

    let listen: SocketAddr = config
        .server
        .listen
        .parse()
        .map_err(|_| RelayError::Config("invalid listen address".into()))?;

    let downstream = Arc::new(TlsDownstream::from_config(&config.upstream)?);
    let limits = Arc::new(BridgeLimits {
        read_timeout: Duration::from_secs(config.server.read_timeout_secs),
        max_request_bytes: config.server.max_request_bytes,
    });

    // Connection limiter; 0 or absent means unlimited
    let conn_limit: Option<Arc<Semaphore>> = config
        .server
        .max_connections
        .filter(|&n| n > 0)
        .map(|n| {
            info!("max_connections set to {}", n);
            Arc::new(Semaphore::new(n))
        });

    let tracker = ConnectionTracker::new();

    let listener = create_listener(listen, config.server.connection_backlog)?;
    info!(
        address = %listen,
        backlog = config.server.connection_backlog,
        upstream = %config.upstream.addr(),
        "listening"
    );

    let mut accept_backoff = ACCEPT_BACKOFF_INITIAL;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }

            result = listener.accept() => {
                let (tcp, peer) = match result {
                    Ok(pair) => {
                        accept_backoff = ACCEPT_BACKOFF_INITIAL;
                        pair
                    }
                    Err(err) => {
                        // Descriptor exhaustion clears only once sockets
                        // close; back off instead of spinning on accept.
                        warn!(error = %err, backoff_ms = accept_backoff.as_millis() as u64, "accept failed");
                        tokio::time::sleep(accept_backoff).await;
                        accept_backoff = (accept_backoff * 2).min(ACCEPT_BACKOFF_MAX);
                        continue;
                    }
                };

                let permit: Option<OwnedSemaphorePermit> = match &conn_limit {
                    Some(sem) => match sem.clone().try_acquire_owned() {
                        Ok(p) => Some(p),
                        Err(_) => {
                            debug!(peer = %peer, reason = "max_connections", "connection rejected");
                            drop(tcp); // close immediately
                            continue;
                        }
                    },
                    None => None,
                };

                debug!(peer = %peer, "new connection");

                let acceptor = acceptor.clone();
                let downstream = downstream.clone();
                let limits = limits.clone();
                tracker.increment();
                let guard = ConnectionGuard::new(tracker.clone());

                tokio::spawn(async move {
                    let _guard = guard; // decrement on drop
                    let _permit = permit; // hold until the connection closes

                    let hs_timeout = Duration::from_secs(DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS);
                    let tls = match tokio::time::timeout(hs_timeout, acceptor.accept(tcp)).await {
                        Ok(Ok(tls)) => {
                            let conn = tls.get_ref().1;
                            debug!(
                                peer = %peer,
                                version = ?conn.protocol_version(),
                                sni = conn.server_name().unwrap_or_default(),
                                "TLS handshake completed"
                            );
                            tls
                        }
                        Ok(Err(err)) => {
                            warn!(peer = %peer, error = %err, "TLS handshake failed");
                            return;
                        }
                        Err(_) => {
                            warn!(peer = %peer, timeout_secs = hs_timeout.as_secs(), "TLS handshake timed out");
                            return;
                        }
                    };

                    match run_bridge(tls, downstream.as_ref(), &limits, peer).await {
                        Ok(BridgeOutcome::Completed { rows }) => {
                            info!(peer = %peer, rows, "exchange completed");
                        }
                        Ok(BridgeOutcome::NoResults) => {
                            info!(peer = %peer, "exchange completed with no results");
                        }
                        Err(err) => {
                            warn!(peer = %peer, kind = err.kind(), error = %err, "connection closed with error");
                        }
                    }
                });
            }
        }
    }

    // Graceful drain: wait for active connections
    let active = tracker.count();
    if active > 0 {
        info!("waiting for {} active connections to drain", active);
        if tracker.wait_for_zero(DEFAULT_SHUTDOWN_TIMEOUT).await {
            info!("all connections drained");
        } else {
            warn!(
                "shutdown timeout, {} connections still active",
                tracker.count()
            );
        }
    }

    info!("relay stopped");
    Ok(())
}

/// Run the relay (blocking until error, no graceful shutdown).
pub async fn run(config: Config) -> Result<(), RelayError> {
    run_with_shutdown(config, CancellationToken::new()).await
}

/// Tracks active connections for graceful shutdown.
#[derive(Clone)]
struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    zero_notify: Arc<Notify>,
}

impl ConnectionTracker {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            zero_notify: Arc::new(Notify::new()),
        }
    }

    fn increment(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.zero_notify.notify_waiters();
        }
    }

    fn count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    async fn wait_for_zero(&self, timeout: Duration) -> bool {
        if self.count() == 0 {
            return true;
        }
        tokio::select! {
            _ = self.zero_notify.notified() => self.count() == 0,
            _ = tokio::time::sleep(timeout) => false,
        }
    }
}

/// Decrements the tracker when the connection task finishes.
struct ConnectionGuard {
    tracker: ConnectionTracker,
}

impl ConnectionGuard {
    fn new(tracker: ConnectionTracker) -> Self {
        Self { tracker }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.decrement();
    }
}

/// Create a TCP listener with a custom backlog.
fn create_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, RelayError> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog as i32)?;
    Ok(TcpListener::from_std(std::net::TcpListener::from(socket))?)
}
