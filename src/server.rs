//! Composition of the two listeners around one shared [`Fanout`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::api;
use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::domain::Fanout;
use crate::error::RelayError;
use crate::producer::ProducerListener;

/// Both listeners, bound and ready to run.
#[derive(Debug)]
pub struct RelayServer {
    config: Arc<RelayConfig>,
    fanout: Fanout,
    http: TcpListener,
    producer: ProducerListener,
}

impl RelayServer {
    /// Binds the producer and HTTP listeners.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if either address cannot be bound.
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let fanout = Fanout::new(config.session_queue_capacity);

        let producer =
            ProducerListener::bind(config.producer_addr, fanout.clone(), config.read_buffer_size)
                .await?;
        let http = TcpListener::bind(config.http_addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: config.http_addr,
                source,
            })?;

        Ok(Self {
            config: Arc::new(config),
            fanout,
            http,
            producer,
        })
    }

    /// Address the HTTP / realtime listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the socket address cannot be read.
    pub fn http_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.http.local_addr()?)
    }

    /// Address the producer listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the socket address cannot be read.
    pub fn producer_addr(&self) -> Result<SocketAddr, RelayError> {
        self.producer.local_addr()
    }

    /// The fanout shared by both listeners.
    #[must_use]
    pub const fn fanout(&self) -> &Fanout {
        &self.fanout
    }

    /// Serves both listeners until `shutdown` resolves.
    ///
    /// On shutdown the producer listener stops accepting, every realtime
    /// session is closed, and in-flight HTTP requests are drained. The
    /// fanout stays closed afterwards, so an upgrade that completes during
    /// or after the drain is closed as soon as it registers.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the HTTP server fails.
    pub async fn run<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown.await;
            let _ = stop_tx.send(true);
        });

        let state = AppState {
            fanout: self.fanout.clone(),
            config: Arc::clone(&self.config),
        };
        let app = api::build_router(state);

        if let Ok(addr) = self.http.local_addr() {
            tracing::info!(%addr, "http listening");
        }
        if let Ok(addr) = self.producer.local_addr() {
            tracing::info!(%addr, "producer listening");
        }

        let fanout = self.fanout.clone();
        let closing = self.fanout.clone();
        let http_stop = stop_rx.clone();
        let http_listener = self.http;
        let http = async move {
            axum::serve(http_listener, app)
                .with_graceful_shutdown(async move {
                    stopped(http_stop).await;
                    fanout.close_all().await;
                })
                .await
        };
        let producer = self.producer.run(stopped(stop_rx));

        let (served, ()) = tokio::join!(http, producer);
        closing.close_all().await;
        served?;

        tracing::info!("relay stopped");
        Ok(())
    }
}

/// Resolves once the stop flag is raised or its sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn loopback_config() -> RelayConfig {
        RelayConfig {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            producer_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..RelayConfig::default()
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_ports() {
        let Ok(server) = RelayServer::bind(loopback_config()).await else {
            panic!("bind failed");
        };
        let (Ok(http), Ok(producer)) = (server.http_addr(), server.producer_addr()) else {
            panic!("no local addr");
        };
        assert_ne!(http.port(), 0);
        assert_ne!(producer.port(), 0);
        assert_ne!(http, producer);
    }

    #[tokio::test]
    async fn http_port_conflict_is_bind_error() {
        let Ok(taken) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = taken.local_addr() else {
            panic!("no local addr");
        };
        let config = RelayConfig {
            http_addr: addr,
            ..loopback_config()
        };

        let Err(RelayError::Bind { addr: reported, .. }) = RelayServer::bind(config).await else {
            panic!("expected bind error");
        };
        assert_eq!(reported, addr);
    }

    #[tokio::test]
    async fn run_returns_after_shutdown() {
        let Ok(server) = RelayServer::bind(loopback_config()).await else {
            panic!("bind failed");
        };
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            server.run(async {}),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn sessions_cannot_open_after_run_returns() {
        let Ok(server) = RelayServer::bind(loopback_config()).await else {
            panic!("bind failed");
        };
        let fanout = server.fanout().clone();
        let mut open = fanout.register().await;

        let Ok(Ok(())) =
            tokio::time::timeout(std::time::Duration::from_secs(5), server.run(async {})).await
        else {
            panic!("server did not stop");
        };

        assert!(open.receiver.recv().await.is_none());
        let mut late = fanout.register().await;
        assert!(late.receiver.recv().await.is_none());
        assert_eq!(fanout.session_count().await, 0);
    }
}
