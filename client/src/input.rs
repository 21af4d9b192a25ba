//! Input seam: an `InputSource` is polled once per loop iteration and must
//! never block.

use log::debug;
use shared::Action;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Action(Action),
    Quit,
}

pub trait InputSource {
    /// Current action, or `Quit` to end the session.
    fn poll(&mut self) -> InputEvent;
}

/// Maps a key to its event: W/S move, Q quits, anything else idles.
pub fn event_for_key(key: char) -> InputEvent {
    match key.to_ascii_lowercase() {
        'w' => InputEvent::Action(Action::Up),
        's' => InputEvent::Action(Action::Down),
        'q' => InputEvent::Quit,
        _ => InputEvent::Action(Action::Idle),
    }
}

/// Input fed through a channel; the last action sticks until replaced.
pub struct ChannelInput {
    rx: mpsc::UnboundedReceiver<InputEvent>,
    current: Action,
    closed: bool,
}

impl ChannelInput {
    pub fn new(rx: mpsc::UnboundedReceiver<InputEvent>) -> Self {
        Self {
            rx,
            current: Action::Idle,
            closed: false,
        }
    }
}

impl InputSource for ChannelInput {
    fn poll(&mut self) -> InputEvent {
        if self.closed {
            return InputEvent::Quit;
        }

        loop {
            match self.rx.try_recv() {
                Ok(InputEvent::Action(action)) => self.current = action,
                Ok(InputEvent::Quit) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    return InputEvent::Quit;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
            }
        }

        InputEvent::Action(self.current)
    }
}

/// Spawns a task turning stdin lines into events. The first character of each
/// line picks the event; an empty line idles and end of input quits.
pub fn spawn_stdin_input() -> ChannelInput {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let event = line
                .trim()
                .chars()
                .next()
                .map(event_for_key)
                .unwrap_or(InputEvent::Action(Action::Idle));

            if tx.send(event).is_err() || event == InputEvent::Quit {
                break;
            }
        }

        debug!("Stdin input closed");
        let _ = tx.send(InputEvent::Quit);
    });

    ChannelInput::new(rx)
}
