//! Leaf Crawler: a take-1-or-2 counting duel against the robot. Whoever
//! eats the last leaf becomes the butterfly; the score is the win streak.

use crate::games::{MiniGame, RoundPhase};
use crossterm::event::{KeyCode, KeyEvent};
use log::debug;
use ratatui::layout::Rect;
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Duration;

const INITIAL_LEAVES: u32 = 13;
const ROBOT_THINK: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Turn {
    Human,
    Robot,
}

/// Leave the opponent a multiple of 3; from a losing position take 1.
fn robot_move(leaves: u32) -> u32 {
    let mut m = leaves % 3;
    if m == 0 {
        m = 1;
    }
    m.min(leaves)
}

pub struct CrawlerGame {
    leaves: u32,
    turn: Turn,
    phase: RoundPhase,
    winner: Option<Turn>,
    streak: u32,
    best_streak: u32,
    high_score: u32,
    think_acc: Duration,
    message: String,
}

impl CrawlerGame {
    pub fn new(high_score: u32) -> Self {
        CrawlerGame {
            leaves: INITIAL_LEAVES,
            turn: Turn::Human,
            phase: RoundPhase::Running,
            winner: None,
            streak: 0,
            best_streak: 0,
            high_score,
            think_acc: Duration::ZERO,
            message: "Your turn! Eat 1 or 2 leaves.".to_string(),
        }
    }

    fn reset_round(&mut self) {
        self.leaves = INITIAL_LEAVES;
        self.turn = Turn::Human;
        self.phase = RoundPhase::Running;
        self.winner = None;
        self.think_acc = Duration::ZERO;
        self.message = "New game! Your turn.".to_string();
    }

    fn process_move(&mut self, amount: u32, player: Turn) {
        self.leaves -= amount;
        if self.leaves == 0 {
            self.finish(player);
            return;
        }
        self.turn = match player {
            Turn::Human => Turn::Robot,
            Turn::Robot => Turn::Human,
        };
        self.think_acc = Duration::ZERO;
        self.message = match self.turn {
            Turn::Robot => "Robot is thinking...".to_string(),
            Turn::Human => format!("Robot ate {amount}. Your turn!"),
        };
    }

    fn finish(&mut self, last_player: Turn) {
        self.winner = Some(last_player);
        self.phase = RoundPhase::Over;
        match last_player {
            Turn::Human => {
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
                self.message = "YOU ARE A BUTTERFLY!".to_string();
            }
            Turn::Robot => {
                debug!("robot win broke a streak of {}", self.streak);
                self.streak = 0;
                self.message = "Robot is the butterfly!".to_string();
            }
        }
    }
}

impl MiniGame for CrawlerGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('1') if self.phase == RoundPhase::Running && self.turn == Turn::Human => {
                self.process_move(1, Turn::Human);
            }
            KeyCode::Char('2')
                if self.phase == RoundPhase::Running
                    && self.turn == Turn::Human
                    && self.leaves >= 2 =>
            {
                self.process_move(2, Turn::Human);
            }
            KeyCode::Char('r') if self.phase == RoundPhase::Over => self.reset_round(),
            _ => {}
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.phase != RoundPhase::Running || self.turn != Turn::Robot {
            return;
        }
        self.think_acc += dt;
        if self.think_acc >= ROBOT_THINK {
            let m = robot_move(self.leaves);
            self.process_move(m, Turn::Robot);
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Leaf Crawler  Streak: {}  Best: {} ",
            self.streak,
            self.high_score.max(self.best_streak)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let eaten = (INITIAL_LEAVES - self.leaves) as usize;
        let branch: String = std::iter::repeat("~".to_string())
            .take(eaten)
            .chain(std::iter::repeat("@".to_string()).take(self.leaves as usize))
            .collect::<Vec<_>>()
            .join(" ");

        let mut lines = vec![
            Line::from("Who will eat the last leaf?").bold(),
            Line::default(),
            Line::from(format!("Leaves left: {}", self.leaves)).fg(Color::Green),
            Line::from(branch).fg(Color::LightGreen),
            Line::default(),
            Line::from(self.message.clone()).fg(match self.winner {
                Some(Turn::Human) => Color::Magenta,
                Some(Turn::Robot) => Color::Gray,
                None => Color::Green,
            }),
            Line::default(),
        ];
        lines.push(match self.phase {
            RoundPhase::Over => Line::from("[r] play again").fg(Color::Yellow),
            _ if self.turn == Turn::Human => Line::from("[1] eat one  [2] eat two"),
            _ => Line::from("..."),
        });
        frame.render_widget(Paragraph::new(lines).centered(), inner);
    }

    fn phase(&self) -> RoundPhase {
        self.phase
    }

    fn score(&self) -> u32 {
        self.best_streak
    }
}
