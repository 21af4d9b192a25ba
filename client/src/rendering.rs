//! Render seam: whatever draws the game receives a `ClientView` every render
//! tick. Drawing itself lives outside this crate.

use log::debug;
use shared::{Action, NetworkStats, ServerMessage};

/// Read-only view of the client after a loop iteration
#[derive(Debug, Clone, Copy)]
pub struct ClientView<'a> {
    /// Id assigned by the server at join
    pub player_id: u8,
    /// Most recently received snapshot
    pub snapshot: &'a ServerMessage,
    pub stats: &'a NetworkStats,
    /// Action currently being sent
    pub action: Action,
}

pub trait Renderer {
    fn render(&mut self, view: &ClientView<'_>);
}

/// Any closure taking a view is a renderer.
impl<F> Renderer for F
where
    F: FnMut(&ClientView<'_>),
{
    fn render(&mut self, view: &ClientView<'_>) {
        self(view)
    }
}

/// Headless renderer that logs a line every `every` frames.
pub struct LogRenderer {
    every: u32,
    frames: u32,
}

impl LogRenderer {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, view: &ClientView<'_>) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }

        let s = view.snapshot;
        debug!(
            "P{} {:?} | paddles {:.1}/{:.1} ball ({:.1}, {:.1}) score {}-{} | rtt {:.1}ms avg {:.1}ms loss {}%",
            view.player_id,
            view.action,
            s.paddle1_y,
            s.paddle2_y,
            s.ball_x,
            s.ball_y,
            s.score1,
            s.score2,
            view.stats.rtt_current,
            view.stats.rtt_avg,
            view.stats.loss_percent()
        );
    }
}
