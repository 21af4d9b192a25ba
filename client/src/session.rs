//! Socket-free client logic
//!
//! `ClientContext` holds everything the client knows about its session: the
//! assigned id, the last snapshot, its own statistics and the send and render
//! cadences. `Client` drives it with datagrams and clock readings.

use crate::network::ClientError;
use crate::rendering::ClientView;
use log::{debug, info};
use shared::clock::{tick_period_ms, wire_timestamp};
use shared::{
    Action, ClientMessage, NetworkStats, ProtocolError, ServerMessage, ServerMessageType, Ticker,
    LOSS_SILENCE_MS,
};

pub struct ClientContext {
    player_id: u8,
    last_state: ServerMessage,
    stats: NetworkStats,
    current_action: Action,
    last_send_ms: u64,
    send_ticker: Ticker,
    render_ticker: Ticker,
}

impl ClientContext {
    /// Fresh, unjoined context. Sending and rendering both run at
    /// `tick_rate`, with periods measured from `now_ms`.
    pub fn new(tick_rate: u32, now_ms: u64) -> Self {
        let period = tick_period_ms(tick_rate);
        Self {
            player_id: 0,
            last_state: ServerMessage::default(),
            stats: NetworkStats::new(),
            current_action: Action::Idle,
            last_send_ms: now_ms,
            send_ticker: Ticker::new(period, now_ms),
            render_ticker: Ticker::new(period, now_ms),
        }
    }

    pub fn join_message(&self, name: &str, now_ms: u64) -> ClientMessage {
        ClientMessage::join(name, wire_timestamp(now_ms))
    }

    /// Accounts for a datagram that left the socket.
    pub fn on_sent(&mut self, size: usize, now_ms: u64) {
        self.stats.record_sent(size);
        self.last_send_ms = now_ms;
        self.send_ticker.restart(now_ms);
    }

    /// Validates the reply to a join request and adopts the assigned id.
    pub fn complete_join(&mut self, bytes: &[u8], now_ms: u64) -> Result<u8, ClientError> {
        self.stats.record_received(bytes.len());

        let reply = ServerMessage::decode(bytes)?;
        if reply.kind != ServerMessageType::State || reply.player_id == 0 {
            return Err(ClientError::Rejected);
        }

        self.stats
            .update_rtt(now_ms.saturating_sub(self.last_send_ms) as f32);
        self.player_id = reply.player_id;
        self.last_state = reply;

        info!("Joined as player {}", self.player_id);
        Ok(self.player_id)
    }

    /// Input to send this iteration: on every action change, and otherwise
    /// once per tick period as a keep-alive.
    pub fn next_input(&mut self, action: Action, now_ms: u64) -> Option<ClientMessage> {
        let changed = action != self.current_action;
        if !changed && !self.send_ticker.is_due(now_ms) {
            return None;
        }

        if changed {
            debug!("Action {:?} -> {:?}", self.current_action, action);
        }
        self.current_action = action;
        Some(ClientMessage::input(
            self.player_id,
            action,
            wire_timestamp(now_ms),
        ))
    }

    /// Adopts a received snapshot. The newest arrival always wins.
    pub fn on_datagram(&mut self, bytes: &[u8], now_ms: u64) -> Result<(), ProtocolError> {
        self.stats.record_received(bytes.len());

        let snapshot = ServerMessage::decode(bytes)?;
        match snapshot.kind {
            ServerMessageType::State | ServerMessageType::StatsResponse => {
                self.last_state = snapshot;
                self.stats
                    .update_rtt(now_ms.saturating_sub(self.last_send_ms) as f32);
            }
            ServerMessageType::Error => {
                debug!("Server reported an error");
            }
        }

        Ok(())
    }

    /// Called when a receive attempt found nothing. Every empty receive
    /// more than `LOSS_SILENCE_MS` after the last send counts as one lost
    /// packet; returns true if one was recorded.
    pub fn on_idle(&mut self, now_ms: u64) -> bool {
        let since_send = now_ms.saturating_sub(self.last_send_ms);
        if since_send <= LOSS_SILENCE_MS {
            return false;
        }

        self.stats.record_lost();
        debug!("Nothing received {} ms after the last send", since_send);
        true
    }

    /// True at most once per tick period.
    pub fn render_due(&mut self, now_ms: u64) -> bool {
        self.render_ticker.poll(now_ms)
    }

    pub fn leave_message(&self, now_ms: u64) -> ClientMessage {
        ClientMessage::leave(self.player_id, wire_timestamp(now_ms))
    }

    pub fn stats_request(&self, now_ms: u64) -> ClientMessage {
        ClientMessage::stats_request(self.player_id, wire_timestamp(now_ms))
    }

    /// Snapshot, stats and id as handed to the renderer
    pub fn view(&self) -> ClientView<'_> {
        ClientView {
            player_id: self.player_id,
            snapshot: &self.last_state,
            stats: &self.stats,
            action: self.current_action,
        }
    }

    /// Id assigned at join, 0 before
    pub fn player_id(&self) -> u8 {
        self.player_id
    }

    pub fn last_state(&self) -> &ServerMessage {
        &self.last_state
    }

    pub fn current_action(&self) -> Action {
        self.current_action
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut NetworkStats {
        &mut self.stats
    }
}
