//! Server network layer: the single-task UDP synchronization loop

use crate::config::ServerConfig;
use crate::context::{Outgoing, ServerContext};
use log::{debug, error, info, warn};
use shared::{Clock, BUFFER_SIZE};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Authoritative pong server
///
/// Each loop iteration makes one non-blocking receive attempt, runs a
/// simulation tick if one is due, then waits for the next poll interval.
/// Packet arrival and tick timing are independent of each other.
pub struct Server {
    socket: UdpSocket,
    context: ServerContext,
    clock: Clock,
    poll_interval: Duration,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        info!("Server listening on {}", socket.local_addr()?);

        let clock = Clock::new();
        Ok(Server {
            socket,
            context: ServerContext::new(&config, clock.now_ms()),
            clock,
            poll_interval: config.poll_interval,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ServerContext {
        &mut self.context
    }

    /// Runs until Ctrl+C.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the loop until `shutdown` completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut buffer = [0u8; BUFFER_SIZE];

        info!("Waiting for players");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
                _ = poll.tick() => {}
            }

            let now = self.clock.now_ms();

            if let Some(reply) = self.receive_one(&mut buffer, now) {
                self.send(reply).await;
            }

            let ticks_before = self.context.tick();
            let broadcast = self.context.poll_tick(now);
            for outgoing in broadcast {
                self.send(outgoing).await;
            }

            if self.context.tick() != ticks_before && is_report_tick(self.context.tick()) {
                let state = self.context.state();
                debug!(
                    "Tick {}: {} active players, score {} - {}",
                    self.context.tick(),
                    self.context.registry().active_count(),
                    state.score1,
                    state.score2
                );
            }
        }

        Ok(())
    }

    /// One non-blocking receive attempt. No pending datagram is not an error.
    fn receive_one(&mut self, buffer: &mut [u8], now: u64) -> Option<Outgoing> {
        match self.socket.try_recv_from(buffer) {
            Ok((len, addr)) => self.context.handle_datagram(&buffer[..len], addr, now),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("Error receiving packet: {}", e);
                None
            }
        }
    }

    async fn send(&mut self, outgoing: Outgoing) {
        let data = match outgoing.message.encode() {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode snapshot: {}", e);
                return;
            }
        };

        match self.socket.send_to(&data, outgoing.addr).await {
            Ok(len) => self.context.record_sent(len),
            Err(e) => error!("Failed to send packet to {}: {}", outgoing.addr, e),
        }
    }
}

/// Ticks on which the loop logs a progress line
fn is_report_tick(tick: u32) -> bool {
    tick > 0 && tick % 600 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ClientMessage, ServerMessage, ServerMessageType};

    fn loopback_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            seed: Some(5),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_report_ticks() {
        assert!(!is_report_tick(0));
        assert!(!is_report_tick(599));
        assert!(is_report_tick(600));
        assert!(is_report_tick(1200));
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let server = tokio_test::block_on(Server::new(loopback_config())).unwrap();
        let addr = server.local_addr().unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
        assert_eq!(server.context().registry().registered(), 0);
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            bind_addr: taken.local_addr().unwrap().to_string(),
            ..loopback_config()
        };

        let result = tokio_test::block_on(Server::new(config));
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_join_over_loopback() {
        let mut server = Server::new(loopback_config()).await.unwrap();
        let server_addr = server.local_addr().unwrap();

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let join = ClientMessage::join("alice", 0).encode().unwrap();
        socket.send_to(&join, server_addr).await.unwrap();

        let reply = async {
            let mut buf = [0u8; BUFFER_SIZE];
            let (len, _) = socket.recv_from(&mut buf).await.unwrap();
            ServerMessage::decode(&buf[..len]).unwrap()
        };

        let (_, reply) = tokio::join!(
            server.run_until(tokio::time::sleep(Duration::from_millis(200))),
            reply
        );

        assert_eq!(reply.kind, ServerMessageType::State);
        assert_eq!(reply.player_id, 1);
        assert_eq!(server.context().stats().packets_received, 1);
        assert_eq!(server.context().stats().packets_sent, 1);
    }
}
