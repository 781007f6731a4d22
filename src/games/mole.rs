//! Whack-a-Mole on the numpad: holes are laid out like the 1-9 keys and
//! a digit whacks the matching hole. Whacking an empty hole costs a life.

use crate::games::{MiniGame, RoundPhase};
use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use ratatui::layout::Rect;
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Duration;

/// Numpad layout: top row is 7 8 9, bottom row is 1 2 3.
const LAYOUT: [[u8; 3]; 3] = [[7, 8, 9], [4, 5, 6], [1, 2, 3]];

const STARTING_LIVES: u32 = 3;
const POINTS_PER_HIT: u32 = 10;
const RISE_TIME: Duration = Duration::from_millis(300);
const SINK_TIME: Duration = Duration::from_millis(300);
const HIT_LINGER: Duration = Duration::from_millis(400);

const START_PACE: Duration = Duration::from_millis(2500);
const PACE_STEP: Duration = Duration::from_millis(20);
const MIN_INTERVAL: Duration = Duration::from_millis(900);
const MIN_VISIBLE: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MoleState {
    Hidden,
    Rising,
    Up,
    Hit,
    Sinking,
}

#[derive(Clone, Copy, Debug)]
struct Hole {
    state: MoleState,
    timer: Duration,
    visible_time: Duration,
}

impl Hole {
    fn new() -> Self {
        Hole {
            state: MoleState::Hidden,
            timer: Duration::ZERO,
            visible_time: Duration::ZERO,
        }
    }

    fn popup(&mut self, visible_time: Duration) {
        if self.state == MoleState::Hidden {
            self.state = MoleState::Rising;
            self.timer = Duration::ZERO;
            self.visible_time = visible_time;
        }
    }

    fn whack(&mut self) -> bool {
        if matches!(self.state, MoleState::Rising | MoleState::Up) {
            self.state = MoleState::Hit;
            self.timer = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Returns true when the mole got away unwhacked.
    fn update(&mut self, dt: Duration) -> bool {
        self.timer += dt;
        match self.state {
            MoleState::Hidden => {}
            MoleState::Rising => {
                if self.timer >= RISE_TIME {
                    self.state = MoleState::Up;
                    self.timer = Duration::ZERO;
                }
            }
            MoleState::Up => {
                if self.timer >= self.visible_time {
                    self.state = MoleState::Sinking;
                    self.timer = Duration::ZERO;
                    return true;
                }
            }
            MoleState::Hit => {
                if self.timer >= HIT_LINGER {
                    self.state = MoleState::Sinking;
                    self.timer = Duration::ZERO;
                }
            }
            MoleState::Sinking => {
                if self.timer >= SINK_TIME {
                    self.state = MoleState::Hidden;
                    self.timer = Duration::ZERO;
                }
            }
        }
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Menu,
    Playing,
    GameOver,
}

pub struct MoleGame {
    rng: StdRng,
    screen: Screen,
    holes: [Hole; 9],
    score: u32,
    best: u32,
    high_score: u32,
    lives: u32,
    interval: Duration,
    visible_time: Duration,
    spawn_acc: Duration,
}

impl MoleGame {
    pub fn new(high_score: u32) -> Self {
        Self::new_with_rng(high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(high_score: u32, rng: StdRng) -> Self {
        MoleGame {
            rng,
            screen: Screen::Menu,
            holes: [Hole::new(); 9],
            score: 0,
            best: 0,
            high_score,
            lives: STARTING_LIVES,
            interval: START_PACE,
            visible_time: START_PACE,
            spawn_acc: START_PACE,
        }
    }

    fn start_run(&mut self) {
        self.screen = Screen::Playing;
        self.holes = [Hole::new(); 9];
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.interval = START_PACE;
        self.visible_time = START_PACE;
        // First wave pops immediately.
        self.spawn_acc = START_PACE;
    }

    fn spawn_count(&self) -> usize {
        match self.score {
            0..=199 => 1,
            200..=399 => 2,
            _ => 3,
        }
    }

    fn spawn_wave(&mut self) {
        let count = self.spawn_count();
        let mut hidden: Vec<usize> = (0..9)
            .filter(|&i| self.holes[i].state == MoleState::Hidden)
            .collect();
        hidden.shuffle(&mut self.rng);
        for &i in hidden.iter().take(count) {
            self.holes[i].popup(self.visible_time);
        }
    }

    fn whack(&mut self, number: u8) {
        let idx = (number - 1) as usize;
        if self.holes[idx].whack() {
            self.score += POINTS_PER_HIT;
            self.best = self.best.max(self.score);
            // The pace tightens with every hit.
            self.interval = self.interval.saturating_sub(PACE_STEP).max(MIN_INTERVAL);
            self.visible_time = self.visible_time.saturating_sub(PACE_STEP).max(MIN_VISIBLE);
        } else {
            self.lose_life();
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            info!("mole run over, score {}", self.score);
            self.screen = Screen::GameOver;
        }
    }
}

impl MiniGame for MoleGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Menu => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('s')) {
                    self.start_run();
                }
            }
            Screen::GameOver => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
                    self.start_run();
                }
            }
            Screen::Playing => {
                if let KeyCode::Char(c @ '1'..='9') = key.code {
                    self.whack(c as u8 - b'0');
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.screen != Screen::Playing {
            return;
        }
        self.spawn_acc += dt;
        if self.spawn_acc >= self.interval {
            self.spawn_acc = Duration::ZERO;
            self.spawn_wave();
        }
        for i in 0..9 {
            if self.holes[i].update(dt) {
                self.lose_life();
            }
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Whack-a-Mole  Score: {}  Lives: {}  Record: {} ",
            self.score,
            self.lives,
            self.high_score.max(self.best)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();
        match self.screen {
            Screen::Menu => {
                lines.push(Line::from("WHACK-A-MOLE").bold().fg(Color::Yellow));
                lines.push(Line::from("Hit the number of the hole when a mole pops up."));
                lines.push(Line::default());
                lines.push(Line::from("[enter] start").fg(Color::Cyan));
            }
            Screen::GameOver => {
                lines.push(Line::from("GAME OVER").bold().fg(Color::Red));
                lines.push(Line::from(format!("Score: {}", self.score)));
                lines.push(Line::default());
                lines.push(Line::from("[r] play again").fg(Color::Cyan));
            }
            Screen::Playing => {
                lines.push(Line::default());
                for row in LAYOUT {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|&n| {
                            let hole = &self.holes[(n - 1) as usize];
                            match hole.state {
                                MoleState::Hidden => format!("[ {n} ]"),
                                MoleState::Rising => "[ . ]".to_string(),
                                MoleState::Up => "[(@)]".to_string(),
                                MoleState::Hit => "[ X ]".to_string(),
                                MoleState::Sinking => "[ v ]".to_string(),
                            }
                        })
                        .collect();
                    lines.push(Line::from(cells.join("  ")).fg(Color::Green));
                    lines.push(Line::default());
                }
                lines.push(Line::from("[1]-[9] whack").fg(Color::Cyan));
            }
        }
        frame.render_widget(Paragraph::new(lines).centered(), inner);
    }

    fn phase(&self) -> RoundPhase {
        match self.screen {
            Screen::GameOver => RoundPhase::Over,
            _ => RoundPhase::Running,
        }
    }

    fn score(&self) -> u32 {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> MoleGame {
        let mut g = MoleGame::new_with_rng(0, StdRng::seed_from_u64(13));
        g.start_run();
        g
    }

    fn up_hole(g: &MoleGame) -> Option<u8> {
        (0..9u8).find(|&i| {
            matches!(
                g.holes[i as usize].state,
                MoleState::Rising | MoleState::Up
            )
        })
        .map(|i| i + 1)
    }

    #[test]
    fn test_first_wave_spawns_one_mole() {
        let mut g = game();
        g.tick(Duration::from_millis(33));
        let up = g
            .holes
            .iter()
            .filter(|h| h.state != MoleState::Hidden)
            .count();
        assert_eq!(up, 1);
    }

    #[test]
    fn test_spawn_count_scales_with_score() {
        let mut g = game();
        assert_eq!(g.spawn_count(), 1);
        g.score = 200;
        assert_eq!(g.spawn_count(), 2);
        g.score = 400;
        assert_eq!(g.spawn_count(), 3);
    }

    #[test]
    fn test_whack_scores_and_tightens_pace() {
        let mut g = game();
        g.tick(Duration::from_millis(33));
        let n = up_hole(&g).unwrap();
        g.whack(n);
        assert_eq!(g.score, POINTS_PER_HIT);
        assert_eq!(g.lives, STARTING_LIVES);
        assert_eq!(g.interval, START_PACE - PACE_STEP);
        assert_eq!(g.visible_time, START_PACE - PACE_STEP);
        assert_eq!(g.holes[(n - 1) as usize].state, MoleState::Hit);
    }

    #[test]
    fn test_pace_floors() {
        let mut g = game();
        g.interval = MIN_INTERVAL + PACE_STEP / 2;
        g.visible_time = MIN_VISIBLE;
        g.tick(Duration::from_millis(33));
        let n = up_hole(&g).unwrap();
        g.whack(n);
        assert_eq!(g.interval, MIN_INTERVAL);
        assert_eq!(g.visible_time, MIN_VISIBLE);
    }

    #[test]
    fn test_whacking_empty_hole_costs_life() {
        let mut g = game();
        g.tick(Duration::from_millis(33));
        let n = up_hole(&g).unwrap();
        let empty = (1..=9u8).find(|&m| m != n).unwrap();
        g.whack(empty);
        assert_eq!(g.lives, STARTING_LIVES - 1);
        assert_eq!(g.score, 0);
    }

    #[test]
    fn test_escaped_mole_costs_life() {
        let mut g = game();
        g.holes[4].popup(MIN_VISIBLE);
        g.holes[4].state = MoleState::Up;
        g.holes[4].timer = Duration::ZERO;
        g.tick(MIN_VISIBLE);
        assert_eq!(g.lives, STARTING_LIVES - 1);
        assert_eq!(g.holes[4].state, MoleState::Sinking);
    }

    #[test]
    fn test_three_misses_end_the_run() {
        let mut g = game();
        // No wave has spawned, so every whack hits an empty hole.
        for _ in 0..3 {
            g.whack(5);
        }
        assert_eq!(g.phase(), RoundPhase::Over);
    }

    #[test]
    fn test_hit_mole_sinks_after_linger() {
        let mut hole = Hole::new();
        hole.popup(MIN_VISIBLE);
        assert_eq!(hole.state, MoleState::Rising);
        hole.update(RISE_TIME);
        assert_eq!(hole.state, MoleState::Up);
        assert!(hole.whack());
        assert_eq!(hole.state, MoleState::Hit);
        // A second whack on the same mole is a miss.
        assert!(!hole.whack());
        hole.update(HIT_LINGER);
        assert_eq!(hole.state, MoleState::Sinking);
        hole.update(SINK_TIME);
        assert_eq!(hole.state, MoleState::Hidden);
    }

    #[test]
    fn test_restart_preserves_session_best() {
        let mut g = game();
        g.score = 120;
        g.best = 120;
        g.lives = 1;
        g.whack(1);
        assert_eq!(g.phase(), RoundPhase::Over);
        g.handle_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.score, 0);
        assert_eq!(g.score(), 120);
    }
}
