//! Definitions shared by the pong server and client: field geometry, player
//! actions, the fixed-size wire records and the network statistics engine.

pub mod clock;
pub mod protocol;
pub mod stats;

pub use clock::{Clock, Ticker};
pub use protocol::{
    ClientMessage, ClientMessageType, PlayerName, ProtocolError, ServerMessage, ServerMessageType,
    CLIENT_MESSAGE_SIZE, SERVER_MESSAGE_SIZE,
};
pub use stats::{NetworkStats, StatsSummary};

pub const SERVER_PORT: u16 = 8080;
pub const MAX_PLAYERS: usize = 2;
pub const PLAYER_NAME_LEN: usize = 16;
pub const BUFFER_SIZE: usize = 1024;

pub const FIELD_WIDTH: f32 = 100.0;
pub const FIELD_HEIGHT: f32 = 100.0;
pub const PADDLE_WIDTH: f32 = 2.0;
pub const PADDLE_HEIGHT: f32 = 15.0;
pub const BALL_SIZE: f32 = 2.0;

pub const PADDLE_SPEED: f32 = 4.5;
pub const BALL_SPEED: f32 = 0.6;
/// Vertical speed added to the ball per unit of normalized paddle hit offset.
pub const PADDLE_DEFLECTION: f32 = 0.5;

pub const TARGET_FPS: u32 = 60;
pub const FRAME_TIME_MS: u64 = 1000 / TARGET_FPS as u64;

/// Client handshake deadline.
pub const CONNECT_TIMEOUT_MS: u64 = 5000;
/// Silence after the last send before the client counts a missed snapshot.
pub const LOSS_SILENCE_MS: u64 = 1000;

pub const PADDLE_MIN_Y: f32 = PADDLE_HEIGHT / 2.0;
pub const PADDLE_MAX_Y: f32 = FIELD_HEIGHT - PADDLE_HEIGHT / 2.0;

/// Discrete paddle command carried in every input datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum Action {
    Down = -1,
    #[default]
    Idle = 0,
    Up = 1,
}

impl Action {
    /// Signed multiplier applied to `PADDLE_SPEED`.
    pub fn direction(self) -> f32 {
        self as i8 as f32
    }

    /// Lenient wire decoding: any positive byte is up, any negative byte
    /// is down.
    pub fn from_wire(value: i8) -> Self {
        match value.signum() {
            1 => Action::Up,
            -1 => Action::Down,
            _ => Action::Idle,
        }
    }
}

impl TryFrom<i8> for Action {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Action::Down),
            0 => Ok(Action::Idle),
            1 => Ok(Action::Up),
            other => Err(ProtocolError::InvalidAction(other)),
        }
    }
}

impl From<Action> for i8 {
    fn from(action: Action) -> Self {
        action as i8
    }
}

/// Clamps a paddle center to the playable range.
pub fn clamp_paddle(y: f32) -> f32 {
    y.clamp(PADDLE_MIN_Y, PADDLE_MAX_Y)
}
