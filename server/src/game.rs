use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    clamp_paddle, Action, BALL_SIZE, BALL_SPEED, FIELD_HEIGHT, FIELD_WIDTH, MAX_PLAYERS,
    PADDLE_DEFLECTION, PADDLE_HEIGHT, PADDLE_SPEED, PADDLE_WIDTH,
};

/// Lowest and highest ball center before it bounces off a wall.
const BALL_MIN_Y: f32 = BALL_SIZE / 2.0;
const BALL_MAX_Y: f32 = FIELD_HEIGHT - BALL_SIZE / 2.0;
/// X positions where the ball meets each paddle's face.
const LEFT_COLLISION_X: f32 = PADDLE_WIDTH + BALL_SIZE / 2.0;
const RIGHT_COLLISION_X: f32 = FIELD_WIDTH - PADDLE_WIDTH - BALL_SIZE / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Ball left through the right edge
    Player1,
    /// Ball left through the left edge
    Player2,
}

/// Authoritative pong state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub paddle1_y: f32,
    pub paddle2_y: f32,
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_vx: f32,
    pub ball_vy: f32,
    pub score1: u8,
    pub score2: u8,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            paddle1_y: FIELD_HEIGHT / 2.0,
            paddle2_y: FIELD_HEIGHT / 2.0,
            ball_x: FIELD_WIDTH / 2.0,
            ball_y: FIELD_HEIGHT / 2.0,
            ball_vx: BALL_SPEED,
            ball_vy: BALL_SPEED * 0.5,
            score1: 0,
            score2: 0,
        }
    }

    /// Moves each paddle whose slot has an action; `None` leaves it parked.
    pub fn move_paddles(&mut self, actions: [Option<Action>; MAX_PLAYERS]) {
        if let Some(action) = actions[0] {
            self.paddle1_y = clamp_paddle(self.paddle1_y + action.direction() * PADDLE_SPEED);
        }
        if let Some(action) = actions[1] {
            self.paddle2_y = clamp_paddle(self.paddle2_y + action.direction() * PADDLE_SPEED);
        }
    }

    /// Advances the ball and resolves wall and paddle contacts.
    pub fn advance_ball(&mut self) {
        self.ball_x += self.ball_vx;
        self.ball_y += self.ball_vy;

        if self.ball_y <= BALL_MIN_Y || self.ball_y >= BALL_MAX_Y {
            self.ball_vy = -self.ball_vy;
            self.ball_y = self.ball_y.clamp(BALL_MIN_Y, BALL_MAX_Y);
        }

        if self.ball_x <= LEFT_COLLISION_X && self.hits_paddle(self.paddle1_y) {
            self.ball_vx = self.ball_vx.abs();
            self.ball_x = LEFT_COLLISION_X;
            self.ball_vy += self.hit_offset(self.paddle1_y) * PADDLE_DEFLECTION;
        }

        if self.ball_x >= RIGHT_COLLISION_X && self.hits_paddle(self.paddle2_y) {
            self.ball_vx = -self.ball_vx.abs();
            self.ball_x = RIGHT_COLLISION_X;
            self.ball_vy += self.hit_offset(self.paddle2_y) * PADDLE_DEFLECTION;
        }
    }

    /// Returns the scorer if the ball left the field horizontally.
    pub fn check_goal(&self) -> Option<Goal> {
        if self.ball_x < 0.0 {
            Some(Goal::Player2)
        } else if self.ball_x > FIELD_WIDTH {
            Some(Goal::Player1)
        } else {
            None
        }
    }

    /// Recenters the ball with a random serve.
    pub fn reset_ball<R: Rng>(&mut self, rng: &mut R) {
        self.ball_x = FIELD_WIDTH / 2.0;
        self.ball_y = FIELD_HEIGHT / 2.0;

        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.ball_vx = direction * BALL_SPEED;
        self.ball_vy = (rng.gen_range(0..100) as f32 / 100.0 - 0.5) * BALL_SPEED;
    }

    fn hits_paddle(&self, paddle_y: f32) -> bool {
        (self.ball_y - paddle_y).abs() <= PADDLE_HEIGHT / 2.0
    }

    /// Ball offset from the paddle center, normalized to `[-1, 1]`.
    fn hit_offset(&self, paddle_y: f32) -> f32 {
        (self.ball_y - paddle_y) / (PADDLE_HEIGHT / 2.0)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-tick simulation: game state plus the serve RNG
#[derive(Debug, Clone)]
pub struct Simulation {
    pub state: GameState,
    pub tick: u32,
    rng: StdRng,
}

impl Simulation {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: GameState::new(),
            tick: 0,
            rng,
        }
    }

    /// Runs one tick. Scoring and the serve that follows happen inside the
    /// same step, and at most one side scores.
    pub fn step(&mut self, actions: [Option<Action>; MAX_PLAYERS]) -> Option<Goal> {
        self.state.move_paddles(actions);
        self.state.advance_ball();

        let goal = self.state.check_goal();
        if let Some(goal) = goal {
            match goal {
                Goal::Player1 => self.state.score1 = self.state.score1.saturating_add(1),
                Goal::Player2 => self.state.score2 = self.state.score2.saturating_add(1),
            }
            info!(
                "Goal for {:?}, score {} - {}",
                goal, self.state.score1, self.state.score2
            );
            self.state.reset_ball(&mut self.rng);
        }

        self.tick = self.tick.wrapping_add(1);
        goal
    }
}
