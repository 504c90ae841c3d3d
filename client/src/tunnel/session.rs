//! Tunnel session: one connection attempt against the transit server
//!
//! A session moves through `Idle → Resolving → Connecting → Connected
//! → Closed` and never retries on its own; retry policy belongs to the
//! supervisor. The session exclusively owns the socket for its
//! lifetime, and both suspension points (name resolution and the
//! transport connect) observe the cancellation token so an external
//! stop can unblock them.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use protocol::Packet;
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to resolve transit server {endpoint}: {source}")]
    ResolutionFailed {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to transit server {endpoint}: {source}")]
    ConnectFailed {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Connecting,
    Connected,
    Closed,
}

pub struct TunnelSession {
    config: Arc<ClientConfig>,
    cancel: CancellationToken,
    state: SessionState,
    socket: Option<TcpStream>,
    /// Reusable packet pair handed to the forwarding layer together
    /// with the socket once the tunnel is established.
    send_packet: Packet,
    recv_packet: Packet,
}

impl TunnelSession {
    pub fn new(config: Arc<ClientConfig>, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            state: SessionState::Idle,
            socket: None,
            send_packet: Packet::default(),
            recv_packet: Packet::default(),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive one full connection attempt, releasing the socket on every
    /// exit path.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let result = self.connect().await;
        // the multiplexed forwarding loop would take over parts() here
        self.cleanup();
        result
    }

    /// Resolve the transit server and establish the tunnel connection.
    ///
    /// Cancellation at either suspension point is a clean stop, not an
    /// error.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let endpoint = self.config.server_endpoint();
        let cancel = self.cancel.clone();

        self.state = SessionState::Resolving;
        debug!("resolving transit server {}", endpoint);
        let addrs: Vec<SocketAddr> = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            resolved = lookup_host(&endpoint) => resolved
                .map_err(|source| SessionError::ResolutionFailed {
                    endpoint: endpoint.clone(),
                    source,
                })?
                .collect(),
        };
        if addrs.is_empty() {
            return Err(SessionError::ResolutionFailed {
                endpoint,
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
            });
        }

        self.state = SessionState::Connecting;
        let mut last_err = None;
        for addr in addrs {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                connected = TcpStream::connect(addr) => match connected {
                    Ok(stream) => {
                        info!("tunnel established with transit server {}", addr);
                        self.socket = Some(stream);
                        self.state = SessionState::Connected;
                        return Ok(());
                    }
                    Err(source) => {
                        debug!("connect to {} failed: {}", addr, source);
                        last_err = Some(source);
                    }
                },
            }
        }

        Err(SessionError::ConnectFailed {
            endpoint,
            source: last_err
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no address tried")),
        })
    }

    /// Hand-off surface for the forwarding layer: the live socket plus
    /// the reusable send/recv packet pair. `None` unless connected.
    #[allow(dead_code)]
    pub fn parts(&mut self) -> Option<(&mut TcpStream, &mut Packet, &mut Packet)> {
        match self.state {
            SessionState::Connected => self
                .socket
                .as_mut()
                .map(|socket| (socket, &mut self.send_packet, &mut self.recv_packet)),
            _ => None,
        }
    }

    /// Request this session to end. Idempotent and safe in any state.
    #[allow(dead_code)]
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.cleanup();
    }

    /// Release the socket, exactly once, no matter which path led here.
    pub fn cleanup(&mut self) {
        debug!("start cleanup");
        if let Some(socket) = self.socket.take() {
            drop(socket);
        }
        self.state = SessionState::Closed;
    }
}
