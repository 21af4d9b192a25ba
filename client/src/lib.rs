//! # Pong Client Library
//!
//! Client side of the two-player UDP pong game. The client never simulates:
//! it sends its paddle action and shows whatever snapshot the server sent
//! last, while keeping its own view of the connection quality.
//!
//! ## Architecture Overview
//!
//! ### Blocking Handshake
//! `network::Client::connect` sends one join request and waits for the reply
//! under a hard deadline (5 seconds by default). No reply means the server is
//! full or unreachable, and the connection fails without retrying.
//!
//! ### Non-Blocking Loop
//! After joining, a single task repeats: poll the input source, send an input
//! datagram when the action changed or a tick period passed, make one
//! non-blocking receive attempt, and hand a `ClientView` to the renderer on
//! every render tick. Quitting sends a leave datagram without waiting for an
//! answer.
//!
//! ### Connection Quality
//! Every snapshot is timed against the last send to sample the RTT. Once more
//! than a second has passed since the last send, every receive attempt that
//! comes up empty counts as a lost packet.
//!
//! ## Module Organization
//!
//! - `session`: `ClientContext`, the socket-free client state
//! - `network`: `ClientConfig`, `ClientError` and the UDP loop
//! - `input`: the `InputSource` seam and a stdin-backed source
//! - `rendering`: the `Renderer` seam and a logging renderer
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::input::spawn_stdin_input;
//! use client::network::{Client, ClientConfig};
//! use client::rendering::LogRenderer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect(&ClientConfig::default()).await?;
//!
//!     let mut input = spawn_stdin_input();
//!     let mut renderer = LogRenderer::new(60);
//!     client.run(&mut input, &mut renderer).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
