//! Integration tests for the pong server and client
//!
//! These tests run a live server over loopback UDP and talk to it with raw
//! sockets and with the client library.

use client::input::{InputEvent, InputSource};
use client::network::{Client, ClientConfig, ClientError};
use client::rendering::ClientView;
use server::config::ServerConfig;
use server::network::Server;
use server::registry::SlotState;
use shared::{
    Action, ClientMessage, ServerMessage, ServerMessageType, BUFFER_SIZE, PADDLE_MAX_Y,
    PADDLE_SPEED,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Starts a server on an ephemeral loopback port. Sending on the returned
/// channel stops it and the join handle yields the server back.
async fn start_server() -> (SocketAddr, oneshot::Sender<()>, JoinHandle<Server>) {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        seed: Some(42),
        ..ServerConfig::default()
    };
    let mut server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        server
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();
        server
    });

    (addr, stop_tx, handle)
}

async fn recv_snapshot(socket: &UdpSocket) -> ServerMessage {
    let mut buf = [0u8; BUFFER_SIZE];
    let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for a snapshot")
        .unwrap();
    ServerMessage::decode(&buf[..len]).unwrap()
}

async fn join_raw(server: SocketAddr, name: &str) -> (UdpSocket, u8) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let join = ClientMessage::join(name, 0).encode().unwrap();
    socket.send_to(&join, server).await.unwrap();

    let reply = recv_snapshot(&socket).await;
    assert_eq!(reply.kind, ServerMessageType::State);
    (socket, reply.player_id)
}

/// Holds an action for a number of polls, then quits.
struct ScriptedInput {
    action: Action,
    remaining: u32,
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputEvent {
        if self.remaining == 0 {
            return InputEvent::Quit;
        }
        self.remaining -= 1;
        InputEvent::Action(self.action)
    }
}

/// WIRE TESTS
mod wire_tests {
    use super::*;

    /// A client record survives a real UDP hop byte for byte
    #[tokio::test]
    async fn udp_echo_preserves_records() {
        let echo = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let echo_addr = echo.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; BUFFER_SIZE];
            if let Ok((len, from)) = echo.recv_from(&mut buf).await {
                let _ = echo.send_to(&buf[..len], from).await;
            }
        });

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sent = ClientMessage::input(2, Action::Down, 1234);
        socket
            .send_to(&sent.encode().unwrap(), echo_addr)
            .await
            .unwrap();

        let mut buf = [0u8; BUFFER_SIZE];
        let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(len, shared::CLIENT_MESSAGE_SIZE);
        assert_eq!(ClientMessage::decode(&buf[..len]).unwrap(), sent);
    }
}

/// SESSION TESTS
mod session_tests {
    use super::*;

    /// Two players join, player one holds up, and every broadcast shows the
    /// paddle climbing until it is clamped. A third join goes unanswered.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn paddle_climbs_and_third_player_is_refused() {
        let (server_addr, stop, handle) = start_server().await;

        let (p1, id1) = join_raw(server_addr, "alice").await;
        let (_p2, id2) = join_raw(server_addr, "bob").await;
        assert_eq!((id1, id2), (1, 2));

        let up = ClientMessage::input(id1, Action::Up, 1).encode().unwrap();
        p1.send_to(&up, server_addr).await.unwrap();

        let mut previous = 50.0f32;
        let mut moved = false;
        for _ in 0..60 {
            let snapshot = recv_snapshot(&p1).await;
            assert_eq!(snapshot.kind, ServerMessageType::State);
            assert_eq!(snapshot.player_id, 0);

            let y = snapshot.paddle1_y;
            assert!(y >= previous, "paddle went down: {} -> {}", previous, y);
            let step = y - previous;
            let clamped = (y - PADDLE_MAX_Y).abs() < 1e-3;
            assert!(
                step < 1e-3 || (step - PADDLE_SPEED).abs() < 1e-3 || clamped,
                "unexpected step {} -> {}",
                previous,
                y
            );
            moved |= step > 0.0;
            previous = y;

            if (y - PADDLE_MAX_Y).abs() < 1e-3 {
                break;
            }
        }
        assert!(moved);
        assert!((previous - PADDLE_MAX_Y).abs() < 1e-3);

        let config = ClientConfig {
            server_addr,
            name: "carol".to_string(),
            connect_timeout: Duration::from_millis(300),
            ..ClientConfig::default()
        };
        let third = Client::connect(&config).await;
        assert!(matches!(third, Err(ClientError::ConnectTimeout(_))));

        stop.send(()).unwrap();
        let server = handle.await.unwrap();
        assert_eq!(server.context().registry().registered(), 2);
        assert_eq!(server.context().registry().active_count(), 2);
    }

    /// A library client plays, renders, and leaves cleanly
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn client_loop_plays_and_leaves() {
        let (server_addr, stop, handle) = start_server().await;

        let config = ClientConfig {
            server_addr,
            name: "alice".to_string(),
            connect_timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        };
        let mut client = Client::connect(&config).await.unwrap();
        assert_eq!(client.player_id(), 1);

        let (_p2, id2) = join_raw(server_addr, "bob").await;
        assert_eq!(id2, 2);

        client.request_stats().await;

        let mut input = ScriptedInput {
            action: Action::Up,
            remaining: 400,
        };
        let mut heights = Vec::new();
        let mut renderer = |view: &ClientView<'_>| {
            assert_eq!(view.player_id, 1);
            heights.push(view.snapshot.paddle1_y);
        };
        client.run(&mut input, &mut renderer).await.unwrap();

        assert!(!heights.is_empty());
        assert!(heights.windows(2).all(|w| w[1] >= w[0]));
        assert!(client.context().last_state().paddle1_y >= 50.0 + PADDLE_SPEED);

        let stats = client.context().stats();
        // join + stats request + inputs + leave
        assert!(stats.packets_sent >= 4);
        assert!(stats.packets_received > 1);
        assert!(stats.rtt_min.is_finite());

        // Give the leave datagram time to land
        sleep(Duration::from_millis(100)).await;
        stop.send(()).unwrap();
        let server = handle.await.unwrap();

        assert_eq!(server.context().registry().state(1), SlotState::Inactive);
        assert_eq!(server.context().registry().state(2), SlotState::Active);
    }

    /// Stats requests from strangers are ignored
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stats_response_only_for_players() {
        let (server_addr, stop, handle) = start_server().await;

        let (p1, id1) = join_raw(server_addr, "alice").await;
        let request = ClientMessage::stats_request(id1, 0).encode().unwrap();
        p1.send_to(&request, server_addr).await.unwrap();

        // Physics has not started, so the only traffic is the response
        let response = recv_snapshot(&p1).await;
        assert_eq!(response.kind, ServerMessageType::StatsResponse);
        assert!(response.packets_recv >= 2);

        let stranger = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        stranger.send_to(&request, server_addr).await.unwrap();
        let mut buf = [0u8; BUFFER_SIZE];
        let nothing = timeout(Duration::from_millis(200), stranger.recv_from(&mut buf)).await;
        assert!(nothing.is_err());

        stop.send(()).unwrap();
        handle.await.unwrap();
    }
}
