//! Balloon Pop: three numbered balloons rise across the screen and the
//! player pops the one carrying the answer. Harder operators unlock as
//! the score climbs.

use crate::games::{MiniGame, RoundPhase};
use crate::geom::Vec2;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Duration;

/// World coordinates; rendering scales them into the viewport.
const WIDTH: f32 = 900.0;
const HEIGHT: f32 = 700.0;
const ESCAPE_Y: f32 = -50.0;
const STARTING_LIVES: u32 = 3;
const LANES: [f32; 3] = [WIDTH / 4.0, WIDTH / 2.0, 3.0 * WIDTH / 4.0];
/// Generous hit radius in world units; terminal cells are coarse.
const CLICK_RADIUS: f32 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Menu,
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug)]
struct Balloon {
    lane: usize,
    y: f32,
    speed: f32,
    number: i32,
}

#[derive(Clone, Debug, Default)]
struct Question {
    text: String,
    answer: i32,
}

fn unlocked_ops(score: u32) -> Vec<Op> {
    let mut ops = vec![Op::Add];
    if score > 5 {
        ops.push(Op::Sub);
    }
    if score > 15 {
        ops.push(Op::Mul);
    }
    if score > 25 {
        ops.push(Op::Div);
    }
    ops
}

fn make_question(rng: &mut impl Rng, score: u32) -> Question {
    let ops = unlocked_ops(score);
    let op = ops[rng.gen_range(0..ops.len())];
    let range_max = 10 + (score / 2) as i32;
    match op {
        Op::Add => {
            let a = rng.gen_range(1..=range_max);
            let b = rng.gen_range(1..=range_max);
            Question {
                text: format!("{a} + {b} = ?"),
                answer: a + b,
            }
        }
        Op::Sub => {
            let a = rng.gen_range(1..=range_max);
            let b = rng.gen_range(1..=range_max);
            let (hi, lo) = if a < b { (b, a) } else { (a, b) };
            Question {
                text: format!("{hi} - {lo} = ?"),
                answer: hi - lo,
            }
        }
        Op::Mul => {
            let cap = 6 + (score / 5) as i32;
            let a = rng.gen_range(1..=cap);
            let b = rng.gen_range(1..=cap);
            Question {
                text: format!("{a} x {b} = ?"),
                answer: a * b,
            }
        }
        Op::Div => {
            // Built backwards so the quotient is always exact.
            let divisor = rng.gen_range(2..=8);
            let answer = rng.gen_range(2..=10);
            Question {
                text: format!("{} / {divisor} = ?", divisor * answer),
                answer,
            }
        }
    }
}

/// The correct answer plus two unique non-negative distractors within 5.
fn answer_set(rng: &mut impl Rng, correct: i32) -> [i32; 3] {
    let mut answers = vec![correct];
    while answers.len() < 3 {
        let offset = rng.gen_range(-5..=5);
        let fake = correct + offset;
        if offset != 0 && fake >= 0 && !answers.contains(&fake) {
            answers.push(fake);
        }
    }
    for i in (1..3).rev() {
        answers.swap(i, rng.gen_range(0..=i));
    }
    [answers[0], answers[1], answers[2]]
}

pub struct BalloonGame {
    rng: StdRng,
    screen: Screen,
    score: u32,
    best: u32,
    high_score: u32,
    lives: u32,
    question: Question,
    balloons: Vec<Balloon>,
}

impl BalloonGame {
    pub fn new(high_score: u32) -> Self {
        Self::new_with_rng(high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(high_score: u32, rng: StdRng) -> Self {
        BalloonGame {
            rng,
            screen: Screen::Menu,
            score: 0,
            best: 0,
            high_score,
            lives: STARTING_LIVES,
            question: Question::default(),
            balloons: Vec::new(),
        }
    }

    fn start_run(&mut self) {
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.screen = Screen::Playing;
        self.next_question();
    }

    fn next_question(&mut self) {
        self.question = make_question(&mut self.rng, self.score);
        let answers = answer_set(&mut self.rng, self.question.answer);
        let speed_mult = 1.0 + self.score as f32 * 0.05;
        self.balloons = answers
            .iter()
            .enumerate()
            .map(|(i, &number)| Balloon {
                lane: i,
                y: HEIGHT + 50.0 + self.rng.gen_range(0.0..100.0),
                speed: (self.rng.gen_range(0.0..1.0f32) + 1.0) * speed_mult,
                number,
            })
            .collect();
    }

    fn lose_life(&mut self) {
        self.lives -= 1;
        if self.lives == 0 {
            info!("balloon run over, score {}", self.score);
            self.screen = Screen::GameOver;
        } else {
            self.next_question();
        }
    }

    fn pop(&mut self, lane: usize) {
        let Some(balloon) = self.balloons.iter().find(|b| b.lane == lane) else {
            return;
        };
        if balloon.number == self.question.answer {
            self.score += 1;
            self.best = self.best.max(self.score);
            self.next_question();
        } else {
            self.lose_life();
        }
    }
}

impl MiniGame for BalloonGame {
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
                if let KeyCode::Char(c @ '1'..='3') = key.code {
                    self.pop(c as usize - '1' as usize);
                }
            }
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, viewport: Rect) {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        match self.screen {
            Screen::Menu | Screen::GameOver => self.start_run(),
            Screen::Playing => {
                if viewport.width == 0 || viewport.height == 0 {
                    return;
                }
                // Map the click back into world coordinates and pop the
                // nearest balloon within reach.
                let click = Vec2::new(
                    event.column.saturating_sub(viewport.x) as f32 / viewport.width as f32
                        * WIDTH,
                    event.row.saturating_sub(viewport.y) as f32 / viewport.height as f32
                        * HEIGHT,
                );
                let hit = self
                    .balloons
                    .iter()
                    .map(|b| (b.lane, click.distance(Vec2::new(LANES[b.lane], b.y))))
                    .filter(|(_, d)| *d <= CLICK_RADIUS)
                    .min_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(lane, _)| lane);
                if let Some(lane) = hit {
                    self.pop(lane);
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.screen != Screen::Playing {
            return;
        }
        // Speeds are in world units per 16ms frame.
        let frames = dt.as_secs_f32() / 0.016;
        for b in &mut self.balloons {
            b.y -= b.speed * frames;
        }

        let correct = self.question.answer;
        let escaped_correct = self
            .balloons
            .iter()
            .any(|b| b.y < ESCAPE_Y && b.number == correct);
        if escaped_correct {
            // Letting the right answer float away costs a life.
            self.lose_life();
            return;
        }
        self.balloons.retain(|b| b.y >= ESCAPE_Y);
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Balloon Pop  Score: {}  Lives: {}  Record: {} ",
            self.score,
            self.lives,
            self.high_score.max(self.best)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match self.screen {
            Screen::Menu => {
                let lines = vec![
                    Line::from("Beautiful Balloon").bold().fg(Color::Cyan),
                    Line::from("Pop the balloon with the right answer!"),
                    Line::default(),
                    Line::from("[enter] start").fg(Color::Yellow),
                ];
                frame.render_widget(Paragraph::new(lines).centered(), inner);
            }
            Screen::GameOver => {
                let lines = vec![
                    Line::from("GAME OVER").bold().fg(Color::Red),
                    Line::from(format!("Score: {}", self.score)),
                    Line::default(),
                    Line::from("[r] play again").fg(Color::Yellow),
                ];
                frame.render_widget(Paragraph::new(lines).centered(), inner);
            }
            Screen::Playing => {
                frame.render_widget(
                    Paragraph::new(Line::from(self.question.text.clone()).bold().fg(Color::Cyan))
                        .centered(),
                    Rect { height: 1, ..inner },
                );
                if inner.height < 3 {
                    return;
                }
                let buf = frame.buffer_mut();
                for b in &self.balloons {
                    if !(0.0..HEIGHT).contains(&b.y) {
                        continue;
                    }
                    let x = inner.x + (LANES[b.lane] / WIDTH * inner.width as f32) as u16;
                    let y = inner.y + 1 + (b.y / HEIGHT * (inner.height - 1) as f32) as u16;
                    if x < inner.right() && y < inner.bottom() {
                        let label = format!("({})", b.number);
                        buf.set_string(
                            x.saturating_sub(1),
                            y,
                            label,
                            ratatui::style::Style::default().fg(Color::Magenta),
                        );
                    }
                }
                let help = Rect {
                    y: inner.bottom().saturating_sub(1),
                    height: 1,
                    ..inner
                };
                frame.render_widget(
                    Paragraph::new(Line::from("[1] [2] [3] pop a lane")).centered(),
                    help,
                );
            }
        }
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

    fn game() -> BalloonGame {
        let mut g = BalloonGame::new_with_rng(0, StdRng::seed_from_u64(21));
        g.start_run();
        g
    }

    fn correct_lane(g: &BalloonGame) -> usize {
        g.balloons
            .iter()
            .find(|b| b.number == g.question.answer)
            .map(|b| b.lane)
            .unwrap()
    }

    #[test]
    fn test_operator_unlocks() {
        assert_eq!(unlocked_ops(0), vec![Op::Add]);
        assert_eq!(unlocked_ops(6), vec![Op::Add, Op::Sub]);
        assert_eq!(unlocked_ops(16), vec![Op::Add, Op::Sub, Op::Mul]);
        assert_eq!(unlocked_ops(26), vec![Op::Add, Op::Sub, Op::Mul, Op::Div]);
    }

    #[test]
    fn test_questions_have_clean_answers() {
        let mut rng = StdRng::seed_from_u64(2);
        for score in [0u32, 10, 20, 40] {
            for _ in 0..50 {
                let q = make_question(&mut rng, score);
                assert!(q.answer >= 0, "negative answer for {}", q.text);
            }
        }
    }

    #[test]
    fn test_answer_set_unique_and_non_negative() {
        let mut rng = StdRng::seed_from_u64(9);
        for correct in [0i32, 1, 3, 17, 100] {
            for _ in 0..20 {
                let set = answer_set(&mut rng, correct);
                assert!(set.contains(&correct));
                assert!(set.iter().all(|&a| a >= 0));
                assert_ne!(set[0], set[1]);
                assert_ne!(set[0], set[2]);
                assert_ne!(set[1], set[2]);
            }
        }
    }

    #[test]
    fn test_popping_correct_balloon_scores() {
        let mut g = game();
        let lane = correct_lane(&g);
        g.pop(lane);
        assert_eq!(g.score, 1);
        assert_eq!(g.lives, STARTING_LIVES);
        // Fresh balloons for the next question.
        assert_eq!(g.balloons.len(), 3);
    }

    #[test]
    fn test_popping_wrong_balloon_costs_life() {
        let mut g = game();
        let lane = (correct_lane(&g) + 1) % 3;
        g.pop(lane);
        assert_eq!(g.score, 0);
        assert_eq!(g.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_three_misses_end_the_run() {
        let mut g = game();
        for _ in 0..3 {
            let lane = (correct_lane(&g) + 1) % 3;
            g.pop(lane);
        }
        assert_eq!(g.phase(), RoundPhase::Over);
    }

    #[test]
    fn test_correct_balloon_escaping_costs_life() {
        let mut g = game();
        for b in &mut g.balloons {
            if b.number == g.question.answer {
                b.y = ESCAPE_Y - 1.0;
            }
        }
        g.tick(Duration::from_millis(16));
        assert_eq!(g.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_wrong_balloon_escaping_is_harmless() {
        let mut g = game();
        let correct = g.question.answer;
        for b in &mut g.balloons {
            if b.number != correct {
                b.y = ESCAPE_Y - 1.0;
            }
        }
        g.tick(Duration::from_millis(1));
        assert_eq!(g.lives, STARTING_LIVES);
        assert!(g.balloons.iter().all(|b| b.y >= ESCAPE_Y));
    }

    #[test]
    fn test_balloons_rise_faster_with_score() {
        let mut g = game();
        g.score = 40;
        g.next_question();
        // speed = (rand + 1) * (1 + 40 * 0.05) >= 3.
        assert!(g.balloons.iter().all(|b| b.speed >= 3.0));
    }

    #[test]
    fn test_mouse_pop_hits_nearest_balloon() {
        use crossterm::event::KeyModifiers;
        let mut g = game();
        let lane = correct_lane(&g);
        for b in &mut g.balloons {
            b.y = 350.0;
        }
        let viewport = Rect::new(0, 0, 90, 70);
        let event = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: (LANES[lane] / WIDTH * 90.0) as u16,
            row: (350.0 / HEIGHT * 70.0) as u16,
            modifiers: KeyModifiers::NONE,
        };
        g.handle_mouse(event, viewport);
        assert_eq!(g.score, 1);
    }

    #[test]
    fn test_mouse_click_in_empty_space_is_ignored() {
        use crossterm::event::KeyModifiers;
        let mut g = game();
        for b in &mut g.balloons {
            b.y = 650.0;
        }
        let event = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        g.handle_mouse(event, Rect::new(0, 0, 90, 70));
        assert_eq!(g.score, 0);
        assert_eq!(g.lives, STARTING_LIVES);
    }

    #[test]
    fn test_restart_preserves_session_best() {
        let mut g = game();
        let lane = correct_lane(&g);
        g.pop(lane);
        assert_eq!(g.score(), 1);
        g.screen = Screen::GameOver;
        g.handle_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.screen, Screen::Playing);
        assert_eq!(g.score, 0);
        assert_eq!(g.score(), 1);
    }
}
