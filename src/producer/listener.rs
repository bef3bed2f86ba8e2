//! Accept loop and per-connection read loop for producers.

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;

use crate::domain::{Fanout, Message};
use crate::error::RelayError;

/// Bound producer listener.
#[derive(Debug)]
pub struct ProducerListener {
    listener: TcpListener,
    fanout: Fanout,
    read_buffer_size: usize,
}

impl ProducerListener {
    /// Binds the producer port.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        fanout: Fanout,
        read_buffer_size: usize,
    ) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        Ok(Self {
            listener,
            fanout,
            read_buffer_size: read_buffer_size.max(1),
        })
    }

    /// Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts producers until `shutdown` resolves.
    ///
    /// Each connection runs on its own task; a failing connection never
    /// affects the others or the accept loop.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(%peer, error = %e, "set_nodelay failed");
                            }
                            let fanout = self.fanout.clone();
                            let buf_size = self.read_buffer_size;
                            tokio::spawn(async move {
                                pump_connection(stream, peer, &fanout, buf_size).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "producer accept failed");
                        }
                    }
                }
            }
        }

        tracing::info!("producer listener stopped");
    }
}

/// Reads one producer connection to completion.
///
/// Every successful read is decoded and published before the next read is
/// issued, so messages from one connection keep their arrival order.
/// Returns the number of messages published.
pub async fn pump_connection<R>(
    mut reader: R,
    peer: SocketAddr,
    fanout: &Fanout,
    buf_size: usize,
) -> usize
where
    R: AsyncRead + Unpin,
{
    tracing::info!(%peer, "producer connected");
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut published = 0;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::info!(%peer, messages = published, "producer disconnected");
                break;
            }
            Ok(n) => {
                let Some(chunk) = buf.get(..n) else {
                    break;
                };
                let message = Message::from_chunk(chunk);
                tracing::debug!(%peer, bytes = n, text = %message, "producer message");
                let delivered = fanout.publish(message).await;
                tracing::trace!(%peer, sessions = delivered, "message fanned out");
                published += 1;
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "producer connection error");
                break;
            }
        }
    }

    published
}
