//! HTTP accept loop with per-connection read and idle timeouts.
//!
//! Each connection is served by hyper with a header read timeout of
//! `read_timeout`. A keep-alive connection that has no request in flight for
//! `idle_timeout` is shut down gracefully. On shutdown the listener stops
//! accepting and open connections drain before `serve` returns.

use crate::config::ServerConfig;
use axum::{body::Body, extract::ConnectInfo, http::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto::Builder,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;
use tower::ServiceExt;

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    config: &ServerConfig,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut builder = Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout);
    builder.http2().timer(TokioTimer::new());

    // Dropping `signal_tx` tells every connection to drain; `close_tx.closed()`
    // resolves once every connection task has dropped its `close_rx`.
    let (signal_tx, signal_rx) = watch::channel(());
    let (close_tx, close_rx) = watch::channel(());

    tokio::pin!(shutdown);
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let builder = builder.clone();
        let router = router.clone();
        let idle_timeout = config.idle_timeout;
        let mut signal_rx = signal_rx.clone();
        let close_rx = close_rx.clone();

        tokio::spawn(async move {
            let activity = Arc::new(Activity::new());
            let tracked = activity.clone();
            let service = hyper::service::service_fn(move |mut req: Request<Incoming>| {
                req.extensions_mut().insert(ConnectInfo(peer));
                let in_flight = tracked.begin();
                let router = router.clone();
                async move {
                    let response = router.oneshot(req.map(Body::new)).await;
                    drop(in_flight);
                    response
                }
            });

            let conn = builder.serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);
            let mut draining = false;
            loop {
                tokio::select! {
                    result = conn.as_mut() => {
                        if let Err(e) = result {
                            tracing::debug!(%peer, error = %e, "connection closed with error");
                        }
                        break;
                    }
                    _ = activity.idle(idle_timeout), if !draining => {
                        tracing::debug!(%peer, "closing idle connection");
                        conn.as_mut().graceful_shutdown();
                        draining = true;
                    }
                    _ = signal_rx.changed(), if !draining => {
                        conn.as_mut().graceful_shutdown();
                        draining = true;
                    }
                }
            }
            drop(close_rx);
        });
    }

    drop(listener);
    drop(signal_tx);
    drop(close_rx);
    close_tx.closed().await;
    Ok(())
}

/// Request bookkeeping for one connection.
struct Activity {
    started: Instant,
    in_flight: AtomicUsize,
    last_millis: AtomicU64,
}

struct InFlight(Arc<Activity>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Activity {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_millis: AtomicU64::new(0),
        }
    }

    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        InFlight(self.clone())
    }

    fn touch(&self) {
        let millis = self.started.elapsed().as_millis() as u64;
        self.last_millis.store(millis, Ordering::SeqCst);
    }

    fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_millis.load(Ordering::SeqCst));
        self.started.elapsed().saturating_sub(last)
    }

    /// Resolves once no request is in flight and none has finished for `timeout`.
    async fn idle(&self, timeout: Duration) {
        loop {
            let busy = self.in_flight.load(Ordering::SeqCst) > 0;
            let idle_for = self.idle_for();
            if !busy && idle_for >= timeout {
                return;
            }
            let wait = if busy { timeout } else { timeout - idle_for };
            tokio::time::sleep(wait).await;
        }
    }
}
