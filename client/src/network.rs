//! Client network layer: the join handshake and the single-task client loop

use crate::input::{InputEvent, InputSource};
use crate::rendering::Renderer;
use crate::session::ClientContext;
use log::{debug, error, info, warn};
use shared::{
    ClientMessage, Clock, ProtocolError, BUFFER_SIZE, CONNECT_TIMEOUT_MS, SERVER_PORT, TARGET_FPS,
};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("no reply from server within {0:?}")]
    ConnectTimeout(Duration),
    #[error("invalid handshake reply: {0}")]
    Handshake(#[from] ProtocolError),
    #[error("server did not assign a player id")]
    Rejected,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub name: String,
    /// Hard deadline for the join reply; there is no retry.
    pub connect_timeout: Duration,
    /// Send and render cadence in Hz
    pub tick_rate: u32,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, SERVER_PORT)),
            name: "Player".to_string(),
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            tick_rate: TARGET_FPS,
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Pong client
///
/// Joins with one blocking request/response, then loops without blocking:
/// poll input, send input if needed, try one receive, render when due.
pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    context: ClientContext,
    clock: Clock,
    poll_interval: Duration,
}

impl Client {
    /// Binds an ephemeral socket and performs the join handshake.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        let clock = Clock::new();
        let mut context = ClientContext::new(config.tick_rate, clock.now_ms());

        info!("Connecting to {} as {:?}", config.server_addr, config.name);

        let join = context.join_message(&config.name, clock.now_ms()).encode()?;
        let len = socket.send_to(&join, config.server_addr).await?;
        context.on_sent(len, clock.now_ms());

        let mut buffer = [0u8; BUFFER_SIZE];
        let (len, _) = timeout(config.connect_timeout, socket.recv_from(&mut buffer))
            .await
            .map_err(|_| ClientError::ConnectTimeout(config.connect_timeout))??;
        context.complete_join(&buffer[..len], clock.now_ms())?;

        Ok(Client {
            socket,
            server_addr: config.server_addr,
            context,
            clock,
            poll_interval: config.poll_interval,
        })
    }

    /// Runs until the input source asks to quit, then sends a best-effort
    /// leave.
    pub async fn run<I, R>(&mut self, input: &mut I, renderer: &mut R) -> Result<(), ClientError>
    where
        I: InputSource,
        R: Renderer,
    {
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            poll.tick().await;
            let now = self.clock.now_ms();

            let action = match input.poll() {
                InputEvent::Action(action) => action,
                InputEvent::Quit => break,
            };

            if let Some(message) = self.context.next_input(action, now) {
                self.send(message).await;
            }

            self.receive_one(&mut buffer, now);

            if self.context.render_due(now) {
                renderer.render(&self.context.view());
            }
        }

        let leave = self.context.leave_message(self.clock.now_ms());
        self.send(leave).await;
        info!("Left the game as player {}", self.context.player_id());

        Ok(())
    }

    /// Asks the server for its statistics; the response arrives through the
    /// loop like any snapshot.
    pub async fn request_stats(&mut self) {
        let request = self.context.stats_request(self.clock.now_ms());
        self.send(request).await;
    }

    pub fn player_id(&self) -> u8 {
        self.context.player_id()
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ClientContext {
        &mut self.context
    }

    fn receive_one(&mut self, buffer: &mut [u8], now: u64) {
        match self.socket.try_recv_from(buffer) {
            Ok((len, _)) => {
                if let Err(e) = self.context.on_datagram(&buffer[..len], now) {
                    debug!("Dropping datagram: {}", e);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.context.on_idle(now);
            }
            Err(e) => warn!("Error receiving packet: {}", e),
        }
    }

    async fn send(&mut self, message: ClientMessage) {
        let data = match message.encode() {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode {:?}: {}", message.kind, e);
                return;
            }
        };

        match self.socket.send_to(&data, self.server_addr).await {
            Ok(len) => self.context.on_sent(len, self.clock.now_ms()),
            Err(e) => error!("Failed to send packet: {}", e),
        }
    }
}
