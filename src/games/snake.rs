//! Grid snake with difficulty-scaled speed and obstacles.

use crate::config::Difficulty;
use crate::games::{MiniGame, RoundPhase};
use crate::geom::{Direction, Pos, Size};
use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;
use std::time::Duration;

pub const GRID: Size = Size {
    width: 30,
    height: 30,
};
const POINTS_PER_FOOD: u32 = 10;
const COUNTDOWN_MS: u64 = 2000;

/// Draws before falling back to a deterministic scan. The grid has 900
/// cells, so a run that exhausts this budget is already nearly full.
const PLACE_RETRY_BUDGET: usize = 256;

/// Uniform rejection sampling with a bounded retry budget; `None` only
/// when no free cell exists at all.
pub fn sample_free_cell(
    rng: &mut impl Rng,
    bounds: Size,
    is_free: impl Fn(Pos) -> bool,
) -> Option<Pos> {
    for _ in 0..PLACE_RETRY_BUDGET {
        let p = Pos::new(
            rng.gen_range(0..bounds.width),
            rng.gen_range(0..bounds.height),
        );
        if is_free(p) {
            return Some(p);
        }
    }
    for y in 0..bounds.height {
        for x in 0..bounds.width {
            let p = Pos::new(x, y);
            if is_free(p) {
                return Some(p);
            }
        }
    }
    None
}

#[derive(Debug, PartialEq, Eq)]
enum StepResult {
    Ongoing,
    Ate,
    /// Every cell is occupied; treated as winning the board.
    Filled,
    Died,
}

pub struct SnakeGame {
    rng: StdRng,
    difficulty: Difficulty,
    snake: VecDeque<Pos>,
    dir: Direction,
    next_dir: Direction,
    food: Option<Pos>,
    obstacles: Vec<Pos>,
    score: u32,
    best: u32,
    high_score: u32,
    phase: RoundPhase,
    countdown_ms: u64,
    step_acc: Duration,
    ended: Option<&'static str>,
}

impl SnakeGame {
    pub fn new(difficulty: Difficulty, high_score: u32) -> Self {
        Self::new_with_rng(difficulty, high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(difficulty: Difficulty, high_score: u32, rng: StdRng) -> Self {
        let mut game = SnakeGame {
            rng,
            difficulty,
            snake: VecDeque::new(),
            dir: Direction::East,
            next_dir: Direction::East,
            food: None,
            obstacles: Vec::new(),
            score: 0,
            best: 0,
            high_score,
            phase: RoundPhase::Running,
            countdown_ms: COUNTDOWN_MS,
            step_acc: Duration::ZERO,
            ended: None,
        };
        game.reset_run();
        game
    }

    fn reset_run(&mut self) {
        self.snake = VecDeque::from([Pos::new(10, 10), Pos::new(9, 10), Pos::new(8, 10)]);
        self.dir = Direction::East;
        self.next_dir = Direction::East;
        self.score = 0;
        self.phase = RoundPhase::Running;
        self.countdown_ms = COUNTDOWN_MS;
        self.step_acc = Duration::ZERO;
        self.ended = None;

        self.obstacles.clear();
        for _ in 0..self.difficulty.snake_obstacles() {
            let snake = &self.snake;
            let obstacles = &self.obstacles;
            if let Some(p) = sample_free_cell(&mut self.rng, GRID, |p| {
                !snake.contains(&p) && !obstacles.contains(&p)
            }) {
                self.obstacles.push(p);
            }
        }
        self.food = Some(Pos::new(15, 15));
        if self.cell_blocked(Pos::new(15, 15)) {
            self.food = self.place_food();
        }
    }

    fn cell_blocked(&self, p: Pos) -> bool {
        self.snake.contains(&p) || self.obstacles.contains(&p)
    }

    fn place_food(&mut self) -> Option<Pos> {
        let snake = &self.snake;
        let obstacles = &self.obstacles;
        sample_free_cell(&mut self.rng, GRID, |p| {
            !snake.contains(&p) && !obstacles.contains(&p)
        })
    }

    fn step(&mut self) -> StepResult {
        self.dir = self.next_dir;
        let head = *self.snake.front().expect("snake is never empty");

        let Some(new_head) = head.stepped(self.dir, GRID) else {
            return StepResult::Died;
        };
        // Self collision is checked against the body before the tail pops,
        // keeping growth and collision consistent within one step.
        if self.snake.contains(&new_head) || self.obstacles.contains(&new_head) {
            return StepResult::Died;
        }

        self.snake.push_front(new_head);
        if self.food == Some(new_head) {
            self.score += POINTS_PER_FOOD;
            self.best = self.best.max(self.score);
            self.food = self.place_food();
            if self.food.is_none() {
                return StepResult::Filled;
            }
            StepResult::Ate
        } else {
            self.snake.pop_back();
            StepResult::Ongoing
        }
    }

    fn end_run(&mut self, reason: &'static str) {
        info!("snake round over ({reason}), score {}", self.score);
        self.best = self.best.max(self.score);
        self.phase = RoundPhase::Over;
        self.ended = Some(reason);
    }

    fn step_interval(&self) -> Duration {
        Duration::from_millis(self.difficulty.snake_step_ms())
    }
}

impl MiniGame for SnakeGame {
    fn handle_key(&mut self, key: KeyEvent) {
        let wanted = match key.code {
            KeyCode::Up | KeyCode::Char('w') => Some(Direction::North),
            KeyCode::Down | KeyCode::Char('s') => Some(Direction::South),
            KeyCode::Left | KeyCode::Char('a') => Some(Direction::West),
            KeyCode::Right | KeyCode::Char('d') => Some(Direction::East),
            _ => None,
        };

        match key.code {
            KeyCode::Char(' ') => match self.phase {
                RoundPhase::Running => self.phase = RoundPhase::Paused,
                RoundPhase::Paused => self.phase = RoundPhase::Running,
                RoundPhase::Over => {}
            },
            KeyCode::Char('r') if self.phase == RoundPhase::Over => self.reset_run(),
            KeyCode::Char('c') if self.phase == RoundPhase::Over => {
                self.difficulty = self.difficulty.cycle();
                self.reset_run();
            }
            _ => {
                // Input is queued, not applied: it takes effect on the next
                // step, and reversing into yourself is ignored.
                if let Some(dir) = wanted {
                    if self.countdown_ms == 0 && dir != self.dir.opposite() {
                        self.next_dir = dir;
                    }
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.phase != RoundPhase::Running {
            return;
        }
        if self.countdown_ms > 0 {
            self.countdown_ms = self.countdown_ms.saturating_sub(dt.as_millis() as u64);
            return;
        }
        self.step_acc += dt;
        while self.step_acc >= self.step_interval() {
            self.step_acc -= self.step_interval();
            match self.step() {
                StepResult::Ongoing | StepResult::Ate => {}
                StepResult::Died => {
                    self.end_run("collision");
                    break;
                }
                StepResult::Filled => {
                    self.end_run("board filled");
                    break;
                }
            }
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Snake [{:?}]  Score: {}  Record: {} ",
            self.difficulty,
            self.score,
            self.high_score.max(self.best)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let buf = frame.buffer_mut();
        // Two terminal columns per grid cell keeps the board roughly square.
        let paint = |buf: &mut ratatui::buffer::Buffer, p: Pos, color: Color, sym: &str| {
            let x = inner.x + p.x * 2;
            let y = inner.y + p.y;
            if x + 1 < inner.right() && y < inner.bottom() {
                buf[(x, y)].set_symbol(sym).set_bg(color);
                buf[(x + 1, y)].set_symbol(" ").set_bg(color);
            }
        };

        for &p in &self.obstacles {
            paint(buf, p, Color::DarkGray, " ");
        }
        if let Some(food) = self.food {
            paint(buf, food, Color::Red, " ");
        }
        for (i, &p) in self.snake.iter().enumerate() {
            let color = if i == 0 { Color::White } else { Color::Green };
            paint(buf, p, color, " ");
        }

        let overlay = match (self.phase, self.countdown_ms) {
            (RoundPhase::Over, _) => Some(format!(
                "GAME OVER ({})  Final: {}  [r]estart  [c]hange difficulty",
                self.ended.unwrap_or("over"),
                self.score
            )),
            (RoundPhase::Paused, _) => Some("PAUSED - space to resume".to_string()),
            (RoundPhase::Running, ms) if ms > 0 => Some(format!("Ready... {}", ms / 1000 + 1)),
            _ => None,
        };
        if let Some(text) = overlay {
            let line = Rect {
                x: inner.x,
                y: inner.y + inner.height / 2,
                width: inner.width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Line::from(text).bold().fg(Color::Yellow)).centered(),
                line,
            );
        }
    }

    fn phase(&self) -> RoundPhase {
        self.phase
    }

    fn score(&self) -> u32 {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(difficulty: Difficulty) -> SnakeGame {
        let mut g = SnakeGame::new_with_rng(difficulty, 0, StdRng::seed_from_u64(42));
        g.countdown_ms = 0;
        g
    }

    #[test]
    fn test_initial_layout() {
        let g = game(Difficulty::Medium);
        assert_eq!(
            g.snake,
            VecDeque::from([Pos::new(10, 10), Pos::new(9, 10), Pos::new(8, 10)])
        );
        assert_eq!(g.dir, Direction::East);
        assert_eq!(g.obstacles.len(), 8);
    }

    #[test]
    fn test_single_step_scenario() {
        // 30x30 grid, length 3 at (10,10)-(9,10)-(8,10), heading east:
        // one step puts the head at (11,10) and pops the tail.
        let mut g = game(Difficulty::Easy);
        g.food = Some(Pos::new(0, 0));
        assert_eq!(g.step(), StepResult::Ongoing);
        assert_eq!(*g.snake.front().unwrap(), Pos::new(11, 10));
        assert_eq!(g.snake.len(), 3);
        assert!(!g.snake.contains(&Pos::new(8, 10)));
    }

    #[test]
    fn test_reverse_input_is_ignored() {
        let mut g = game(Difficulty::Easy);
        g.handle_key(KeyEvent::from(KeyCode::Left));
        assert_eq!(g.next_dir, Direction::East);
        g.handle_key(KeyEvent::from(KeyCode::Up));
        assert_eq!(g.next_dir, Direction::North);
    }

    #[test]
    fn test_input_gated_during_countdown() {
        let mut g = game(Difficulty::Easy);
        g.countdown_ms = 1500;
        g.handle_key(KeyEvent::from(KeyCode::Up));
        assert_eq!(g.next_dir, Direction::East);
    }

    #[test]
    fn test_growth_on_food() {
        let mut g = game(Difficulty::Easy);
        g.food = Some(Pos::new(11, 10));
        assert_eq!(g.step(), StepResult::Ate);
        assert_eq!(g.snake.len(), 4);
        assert_eq!(g.score, POINTS_PER_FOOD);
        // Replacement food avoids the grown snake and the obstacles.
        let food = g.food.unwrap();
        assert!(!g.snake.contains(&food));
        assert!(!g.obstacles.contains(&food));
    }

    #[test]
    fn test_wall_is_terminal() {
        let mut g = game(Difficulty::Easy);
        g.snake = VecDeque::from([Pos::new(29, 10), Pos::new(28, 10), Pos::new(27, 10)]);
        assert_eq!(g.step(), StepResult::Died);
    }

    #[test]
    fn test_obstacle_is_terminal() {
        let mut g = game(Difficulty::Easy);
        g.obstacles = vec![Pos::new(11, 10)];
        g.food = Some(Pos::new(0, 0));
        assert_eq!(g.step(), StepResult::Died);
    }

    #[test]
    fn test_self_collision_checked_before_tail_pop() {
        let mut g = game(Difficulty::Easy);
        // A hook shape where the head would re-enter the cell the tail is
        // about to vacate; the pre-pop check still calls it a collision.
        g.snake = VecDeque::from([
            Pos::new(5, 5),
            Pos::new(5, 6),
            Pos::new(4, 6),
            Pos::new(4, 5),
        ]);
        g.dir = Direction::West;
        g.next_dir = Direction::West;
        g.food = Some(Pos::new(0, 0));
        assert_eq!(g.step(), StepResult::Died);
    }

    #[test]
    fn test_head_never_on_body_while_running() {
        let mut g = game(Difficulty::Easy);
        g.food = Some(Pos::new(0, 0));
        for _ in 0..200 {
            if g.step() == StepResult::Died {
                break;
            }
            let head = g.snake.front().unwrap();
            assert_eq!(g.snake.iter().filter(|&p| p == head).count(), 1);
        }
    }

    #[test]
    fn test_obstacles_disjoint_from_snake_and_each_other() {
        for seed in 0..20 {
            let g = SnakeGame::new_with_rng(Difficulty::Hard, 0, StdRng::seed_from_u64(seed));
            for (i, p) in g.obstacles.iter().enumerate() {
                assert!(!g.snake.contains(p));
                assert!(!g.obstacles[i + 1..].contains(p));
            }
            let food = g.food.unwrap();
            assert!(!g.snake.contains(&food));
            assert!(!g.obstacles.contains(&food));
        }
    }

    #[test]
    fn test_sample_free_cell_nearly_full_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let bounds = Size::new(4, 4);
        // Only (3,3) is free.
        let free = Pos::new(3, 3);
        let got = sample_free_cell(&mut rng, bounds, |p| p == free);
        assert_eq!(got, Some(free));

        let got = sample_free_cell(&mut rng, bounds, |_| false);
        assert_eq!(got, None);
    }

    #[test]
    fn test_pause_is_render_only() {
        let mut g = game(Difficulty::Easy);
        g.handle_key(KeyEvent::from(KeyCode::Char(' ')));
        assert_eq!(g.phase(), RoundPhase::Paused);
        let before = g.snake.clone();
        g.tick(Duration::from_millis(500));
        assert_eq!(g.snake, before);
        g.handle_key(KeyEvent::from(KeyCode::Char(' ')));
        assert_eq!(g.phase(), RoundPhase::Running);
    }

    #[test]
    fn test_tick_steps_at_difficulty_cadence() {
        let mut g = game(Difficulty::Easy);
        g.food = Some(Pos::new(0, 0));
        g.tick(Duration::from_millis(149));
        assert_eq!(*g.snake.front().unwrap(), Pos::new(10, 10));
        g.tick(Duration::from_millis(1));
        assert_eq!(*g.snake.front().unwrap(), Pos::new(11, 10));
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut g = game(Difficulty::Easy);
        g.snake = VecDeque::from([Pos::new(29, 10), Pos::new(28, 10), Pos::new(27, 10)]);
        g.tick(Duration::from_millis(150));
        assert_eq!(g.phase(), RoundPhase::Over);
        g.handle_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.phase(), RoundPhase::Running);
        assert_eq!(g.snake.len(), 3);
    }
}
