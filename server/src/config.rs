use shared::{SERVER_PORT, TARGET_FPS};
use std::time::Duration;

/// Runtime settings for the pong server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to
    pub bind_addr: String,
    /// Simulation and broadcast rate in Hz
    pub tick_rate: u32,
    /// Deactivate players silent for this long. `None` keeps abandoned
    /// sessions active forever.
    pub session_timeout: Option<Duration>,
    /// Seed for ball serves; random when unset
    pub seed: Option<u64>,
    /// Pause between loop iterations
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", SERVER_PORT),
            tick_rate: TARGET_FPS,
            session_timeout: None,
            seed: None,
            poll_interval: Duration::from_millis(1),
        }
    }
}
