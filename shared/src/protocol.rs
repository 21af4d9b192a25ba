//! Fixed-layout binary records exchanged over UDP
//!
//! Both records are encoded with bincode's fixint little-endian encoding,
//! which writes every field at its declared width with no padding between
//! fields. A receiver accepts a datagram only when its length matches the
//! record size exactly and its leading type byte is known for that direction.
//! Anything else is a `ProtocolError`, which the network loops log and drop.
//! Other bytes are never grounds for rejection: the action byte is read only
//! for inputs, where its sign picks the direction.
//!
//! | record          | bytes | layout                                                        |
//! |-----------------|-------|---------------------------------------------------------------|
//! | `ClientMessage` | 26    | type u8, timestamp u32, player_id u8, action i8, name [u8;16], reserved [u8;3] |
//! | `ServerMessage` | 40    | type u8, timestamp u32, player_id u8, paddle1_y f32, paddle2_y f32, ball_x f32, ball_y f32, score1 u8, score2 u8, rtt_ms u16, loss_percent u8, packets_sent u32, packets_recv u32, reserved [u8;5] |

use crate::{Action, PLAYER_NAME_LEN};
use bincode::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const CLIENT_MESSAGE_SIZE: usize = 26;
pub const SERVER_MESSAGE_SIZE: usize = 40;

const CLIENT_RESERVED_LEN: usize = 3;
const SERVER_RESERVED_LEN: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("expected a {expected}-byte record, got {actual} bytes")]
    WrongSize { expected: usize, actual: usize },
    #[error("unknown message type {0}")]
    UnknownType(u8),
    #[error("invalid action byte {0}")]
    InvalidAction(i8),
    #[error("codec failure: {0}")]
    Codec(String),
}

impl From<bincode::Error> for ProtocolError {
    fn from(err: bincode::Error) -> Self {
        ProtocolError::Codec(err.to_string())
    }
}

/// Client-to-server message tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientMessageType {
    Join = 1,
    Input = 2,
    Stats = 3,
    Leave = 4,
}

impl TryFrom<u8> for ClientMessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ClientMessageType::Join),
            2 => Ok(ClientMessageType::Input),
            3 => Ok(ClientMessageType::Stats),
            4 => Ok(ClientMessageType::Leave),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }
}

/// Server-to-client message tags. The numeric values overlap with
/// `ClientMessageType` and only make sense for the server direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ServerMessageType {
    #[default]
    State = 1,
    StatsResponse = 2,
    Error = 3,
}

impl TryFrom<u8> for ServerMessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            1 => Ok(ServerMessageType::State),
            2 => Ok(ServerMessageType::StatsResponse),
            3 => Ok(ServerMessageType::Error),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }
}

/// Null-padded player name buffer.
///
/// At most `PLAYER_NAME_LEN - 1` bytes of text are stored so the buffer always
/// ends with a terminator. Truncation happens on a UTF-8 character boundary.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerName([u8; PLAYER_NAME_LEN]);

impl PlayerName {
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(PLAYER_NAME_LEN - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut buf = [0u8; PLAYER_NAME_LEN];
        buf[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self(buf)
    }

    pub fn from_bytes(bytes: [u8; PLAYER_NAME_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PLAYER_NAME_LEN] {
        &self.0
    }

    /// Text up to the first terminator, with invalid UTF-8 replaced.
    pub fn to_string_lossy(&self) -> String {
        let len = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PLAYER_NAME_LEN);
        String::from_utf8_lossy(&self.0[..len]).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl fmt::Debug for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerName({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[derive(Serialize, Deserialize)]
struct ClientRecord {
    kind: u8,
    timestamp: u32,
    player_id: u8,
    action: i8,
    player_name: [u8; PLAYER_NAME_LEN],
    reserved: [u8; CLIENT_RESERVED_LEN],
}

#[derive(Serialize, Deserialize)]
struct ServerRecord {
    kind: u8,
    timestamp: u32,
    player_id: u8,
    paddle1_y: f32,
    paddle2_y: f32,
    ball_x: f32,
    ball_y: f32,
    score1: u8,
    score2: u8,
    rtt_ms: u16,
    loss_percent: u8,
    packets_sent: u32,
    packets_recv: u32,
    reserved: [u8; SERVER_RESERVED_LEN],
}

/// Datagram sent by a client: join, input, stats request or leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    pub kind: ClientMessageType,
    pub timestamp: u32,
    /// Server-assigned id, 0 before joining.
    pub player_id: u8,
    pub action: Action,
    pub player_name: PlayerName,
}

impl ClientMessage {
    pub fn join(name: &str, timestamp: u32) -> Self {
        Self {
            kind: ClientMessageType::Join,
            timestamp,
            player_id: 0,
            action: Action::Idle,
            player_name: PlayerName::new(name),
        }
    }

    pub fn input(player_id: u8, action: Action, timestamp: u32) -> Self {
        Self {
            kind: ClientMessageType::Input,
            timestamp,
            player_id,
            action,
            player_name: PlayerName::default(),
        }
    }

    pub fn stats_request(player_id: u8, timestamp: u32) -> Self {
        Self {
            kind: ClientMessageType::Stats,
            ..Self::input(player_id, Action::Idle, timestamp)
        }
    }

    pub fn leave(player_id: u8, timestamp: u32) -> Self {
        Self {
            kind: ClientMessageType::Leave,
            ..Self::input(player_id, Action::Idle, timestamp)
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let record = ClientRecord {
            kind: self.kind as u8,
            timestamp: self.timestamp,
            player_id: self.player_id,
            action: self.action.into(),
            player_name: *self.player_name.as_bytes(),
            reserved: [0; CLIENT_RESERVED_LEN],
        };
        Ok(serialize(&record)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_size(bytes, CLIENT_MESSAGE_SIZE)?;
        let kind = ClientMessageType::try_from(bytes[0])?;

        let record: ClientRecord = deserialize(bytes)?;
        Ok(Self {
            kind,
            timestamp: record.timestamp,
            player_id: record.player_id,
            action: match kind {
                ClientMessageType::Input => Action::from_wire(record.action),
                _ => Action::Idle,
            },
            player_name: PlayerName::from_bytes(record.player_name),
        })
    }
}

/// Authoritative snapshot sent by the server every broadcast tick, also used
/// as the join confirmation and the stats response.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServerMessage {
    pub kind: ServerMessageType,
    pub timestamp: u32,
    /// Assigned player id; only meaningful in a join confirmation.
    pub player_id: u8,
    pub paddle1_y: f32,
    pub paddle2_y: f32,
    pub ball_x: f32,
    pub ball_y: f32,
    pub score1: u8,
    pub score2: u8,
    pub rtt_ms: u16,
    pub loss_percent: u8,
    pub packets_sent: u32,
    pub packets_recv: u32,
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let record = ServerRecord {
            kind: self.kind as u8,
            timestamp: self.timestamp,
            player_id: self.player_id,
            paddle1_y: self.paddle1_y,
            paddle2_y: self.paddle2_y,
            ball_x: self.ball_x,
            ball_y: self.ball_y,
            score1: self.score1,
            score2: self.score2,
            rtt_ms: self.rtt_ms,
            loss_percent: self.loss_percent,
            packets_sent: self.packets_sent,
            packets_recv: self.packets_recv,
            reserved: [0; SERVER_RESERVED_LEN],
        };
        Ok(serialize(&record)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        check_size(bytes, SERVER_MESSAGE_SIZE)?;
        let kind = ServerMessageType::try_from(bytes[0])?;

        let record: ServerRecord = deserialize(bytes)?;
        Ok(Self {
            kind,
            timestamp: record.timestamp,
            player_id: record.player_id,
            paddle1_y: record.paddle1_y,
            paddle2_y: record.paddle2_y,
            ball_x: record.ball_x,
            ball_y: record.ball_y,
            score1: record.score1,
            score2: record.score2,
            rtt_ms: record.rtt_ms,
            loss_percent: record.loss_percent,
            packets_sent: record.packets_sent,
            packets_recv: record.packets_recv,
        })
    }
}

fn check_size(bytes: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if bytes.len() != expected {
        return Err(ProtocolError::WrongSize {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}
