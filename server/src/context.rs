//! Socket-free server logic: message processing, ticking and snapshots
//!
//! `ServerContext` owns the registry, the simulation and the aggregate
//! statistics. The network loop feeds it raw datagrams and clock readings and
//! sends whatever it returns, which keeps every rule here testable without a
//! live socket.

use crate::config::ServerConfig;
use crate::game::{GameState, Simulation};
use crate::registry::PlayerRegistry;
use log::{debug, info, warn};
use shared::clock::{tick_period_ms, wire_timestamp};
use shared::{
    ClientMessage, ClientMessageType, NetworkStats, ServerMessage, ServerMessageType, Ticker,
    MAX_PLAYERS,
};
use std::net::SocketAddr;

/// A datagram the network loop should send
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub addr: SocketAddr,
    pub message: ServerMessage,
}

pub struct ServerContext {
    registry: PlayerRegistry,
    simulation: Simulation,
    stats: NetworkStats,
    ticker: Ticker,
    session_timeout_ms: Option<u64>,
    /// Set once the game has run out of active players, so it is logged once.
    deserted: bool,
}

impl ServerContext {
    pub fn new(config: &ServerConfig, now_ms: u64) -> Self {
        Self {
            registry: PlayerRegistry::new(),
            simulation: Simulation::new(config.seed),
            stats: NetworkStats::new(),
            ticker: Ticker::new(tick_period_ms(config.tick_rate), now_ms),
            session_timeout_ms: config.session_timeout.map(|t| t.as_millis() as u64),
            deserted: false,
        }
    }

    /// Accounts for and processes one received datagram. Malformed
    /// datagrams are dropped.
    pub fn handle_datagram(
        &mut self,
        bytes: &[u8],
        addr: SocketAddr,
        now_ms: u64,
    ) -> Option<Outgoing> {
        self.stats.record_received(bytes.len());

        match ClientMessage::decode(bytes) {
            Ok(message) => self.handle_message(message, addr, now_ms),
            Err(e) => {
                debug!("Dropping datagram from {}: {}", addr, e);
                None
            }
        }
    }

    /// Applies a decoded client message; returns a direct reply if one is due.
    pub fn handle_message(
        &mut self,
        message: ClientMessage,
        addr: SocketAddr,
        now_ms: u64,
    ) -> Option<Outgoing> {
        match message.kind {
            ClientMessageType::Join => {
                match self.registry.register(addr, message.player_name, now_ms) {
                    Ok(player_id) => Some(Outgoing {
                        addr,
                        message: self.snapshot(ServerMessageType::State, player_id, now_ms),
                    }),
                    Err(e) => {
                        info!("Rejected join from {}: {}", addr, e);
                        None
                    }
                }
            }

            ClientMessageType::Input => {
                if !self
                    .registry
                    .record_input(message.player_id, message.action, now_ms)
                {
                    debug!(
                        "Ignoring input for unknown player {} from {}",
                        message.player_id, addr
                    );
                }
                None
            }

            ClientMessageType::Stats => {
                if self.registry.find_active_by_addr(addr).is_some() {
                    Some(Outgoing {
                        addr,
                        message: self.snapshot(ServerMessageType::StatsResponse, 0, now_ms),
                    })
                } else {
                    debug!("Ignoring stats request from unregistered {}", addr);
                    None
                }
            }

            ClientMessageType::Leave => {
                if !self.registry.deactivate(message.player_id) {
                    debug!(
                        "Ignoring leave for unknown player {} from {}",
                        message.player_id, addr
                    );
                }
                None
            }
        }
    }

    /// Runs a simulation step and returns the broadcast if a tick is due.
    ///
    /// Nothing moves or is broadcast until every slot has been claimed.
    pub fn poll_tick(&mut self, now_ms: u64) -> Vec<Outgoing> {
        if !self.ticker.poll(now_ms) {
            return Vec::new();
        }

        if let Some(timeout_ms) = self.session_timeout_ms {
            self.registry.evict_idle(timeout_ms, now_ms);
        }

        if self.registry.registered() != MAX_PLAYERS {
            return Vec::new();
        }

        self.simulation.step(self.registry.actions());

        let snapshot = self.snapshot(ServerMessageType::State, 0, now_ms);
        let recipients = self.registry.active_addrs();
        if recipients.is_empty() && !self.deserted {
            warn!("No active players left at tick {}", self.simulation.tick);
        }
        self.deserted = recipients.is_empty();

        recipients
            .into_iter()
            .map(|(_, addr)| Outgoing {
                addr,
                message: snapshot,
            })
            .collect()
    }

    /// Builds a full snapshot of the current game and stats.
    pub fn snapshot(&self, kind: ServerMessageType, player_id: u8, now_ms: u64) -> ServerMessage {
        let state = &self.simulation.state;
        ServerMessage {
            kind,
            timestamp: wire_timestamp(now_ms),
            player_id,
            paddle1_y: state.paddle1_y,
            paddle2_y: state.paddle2_y,
            ball_x: state.ball_x,
            ball_y: state.ball_y,
            score1: state.score1,
            score2: state.score2,
            rtt_ms: self.stats.rtt_avg as u16,
            loss_percent: self.stats.loss_percent(),
            packets_sent: self.stats.packets_sent,
            packets_recv: self.stats.packets_received,
        }
    }

    /// Called by the network loop after each successful send.
    pub fn record_sent(&mut self, size: usize) {
        self.stats.record_sent(size);
    }

    /// Current authoritative game state
    pub fn state(&self) -> &GameState {
        &self.simulation.state
    }

    /// Number of simulation steps run so far. Stays at 0 until both
    /// players have joined.
    pub fn tick(&self) -> u32 {
        self.simulation.tick
    }

    /// Read access to the player slots
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Aggregate statistics across every peer
    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Mutable statistics, used to compute the summary at shutdown
    pub fn stats_mut(&mut self) -> &mut NetworkStats {
        &mut self.stats
    }

    /// Whether the last broadcast tick found no active player
    pub fn is_deserted(&self) -> bool {
        self.deserted
    }
}
