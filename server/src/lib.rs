//! # Pong Server Library
//!
//! Authoritative server for a two-player pong game played over UDP. The server
//! owns the only simulated game state; clients send paddle actions and render
//! whatever snapshot arrived last.
//!
//! ## Core Responsibilities
//!
//! ### Session Management
//! The `registry` hands out the two player slots in join order. A slot goes
//! from active to inactive when its player leaves (or, optionally, falls
//! silent) and is never handed out again within the server's lifetime. A join
//! arriving when both slots are taken gets no reply at all.
//!
//! ### Fixed-Tick Simulation
//! The `game` module advances paddles and ball once per tick (60 Hz by
//! default, period truncated to whole milliseconds). Physics stays frozen
//! until both slots have been claimed.
//!
//! ### State Broadcasting
//! After every tick the full state, plus the server's aggregate network
//! statistics, goes out as one fixed-size snapshot to every active player.
//!
//! ## Architecture Design
//!
//! ### Single-Task Loop
//! One tokio task owns the socket and the `context::ServerContext`. Each
//! iteration makes one non-blocking receive attempt, checks whether a tick is
//! due, and then waits about a millisecond. No locks are needed because
//! nothing else touches the state.
//!
//! ### Socket-Free Core
//! `ServerContext` takes raw datagrams and clock readings and returns the
//! datagrams to send, so message handling and ticking are tested without
//! sockets or real time.
//!
//! ## Module Organization
//!
//! - `config`: `ServerConfig` and its defaults
//! - `registry`: player slots and their lifecycle
//! - `game`: `GameState` physics and the seeded `Simulation`
//! - `context`: message processing, tick scheduling and snapshots
//! - `network`: the UDP loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!
//!     // Receives, ticks and broadcasts until Ctrl+C
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod game;
pub mod network;
pub mod registry;
