//! Kangaroo Quiz: a side-scrolling hop across question platforms. Each
//! green platform shows a question; the blue and red platforms ahead hold
//! the answers. The wrong one vanishes underfoot and drops you in the lake.

use crate::games::{MiniGame, RoundPhase};
use crate::geom::{Aabb, Vec2};
use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::collections::HashSet;
use std::time::Duration;

const VIEW_W: f32 = 800.0;
const WORLD_H: f32 = 600.0;
const GRAVITY: f32 = 0.8;
const JUMP_STRENGTH: f32 = -16.0;
const RUN_SPEED: f32 = 8.0;
const WATER_Y: f32 = 580.0;
const LAND_TOLERANCE: f32 = 15.0;
const CAMERA_LEAD: f32 = 250.0;

const FRAME: Duration = Duration::from_millis(16);
/// A key press counts as "held" this long; terminals deliver no key-up.
const KEY_HOLD: Duration = Duration::from_millis(200);
const SINK_TIME: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Blue,
    Red,
}

struct QuizQuestion {
    text: &'static str,
    blue: &'static str,
    red: &'static str,
    correct: Side,
}

const QUESTIONS: [QuizQuestion; 10] = [
    QuizQuestion {
        text: "What color is the sun?",
        blue: "Yellow",
        red: "Purple",
        correct: Side::Blue,
    },
    QuizQuestion {
        text: "Half of 30?",
        blue: "15",
        red: "20",
        correct: Side::Blue,
    },
    QuizQuestion {
        text: "Which is farther north?",
        blue: "Oslo",
        red: "Rome",
        correct: Side::Blue,
    },
    QuizQuestion {
        text: "5 / 3?",
        blue: "1.333",
        red: "1.666",
        correct: Side::Red,
    },
    QuizQuestion {
        text: "Which is heavier?",
        blue: "A kilo of feathers",
        red: "Half a kilo of lead",
        correct: Side::Blue,
    },
    QuizQuestion {
        text: "Where does the sun rise?",
        blue: "In the west",
        red: "In the east",
        correct: Side::Red,
    },
    QuizQuestion {
        text: "90 x 3?",
        blue: "270",
        red: "300",
        correct: Side::Blue,
    },
    QuizQuestion {
        text: "Who invented the light bulb?",
        blue: "Galileo",
        red: "Edison",
        correct: Side::Red,
    },
    QuizQuestion {
        text: "Complete: \"Hello ___\"",
        blue: "alien",
        red: "friend",
        correct: Side::Red,
    },
    QuizQuestion {
        text: "Which is bigger?",
        blue: "A pig",
        red: "An elephant",
        correct: Side::Red,
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlatformKind {
    Start,
    End,
    Question,
    Answer(Side),
}

#[derive(Clone, Debug)]
struct Platform {
    x: f32,
    y: f32,
    width: f32,
    kind: PlatformKind,
    q_index: Option<usize>,
    visible: bool,
}

const PLATFORM_H: f32 = 30.0;

struct Player {
    pos: Vec2,
    vel: Vec2,
    w: f32,
    h: f32,
    grounded: bool,
    sinking: bool,
    can_move: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Start,
    Playing,
    GameOver,
    Win,
}

pub struct KangarooGame {
    screen: Screen,
    player: Player,
    platforms: Vec<Platform>,
    camera_x: f32,
    score: u32,
    best: u32,
    high_score: u32,
    answered: HashSet<usize>,
    left_hold: Duration,
    right_hold: Duration,
    jump_queued: bool,
    sink_acc: Duration,
    frame_acc: Duration,
    message: String,
}

fn build_level() -> Vec<Platform> {
    let mut plats = Vec::new();
    let mut cx = 0.0;

    plats.push(Platform {
        x: cx,
        y: 530.0,
        width: 300.0,
        kind: PlatformKind::Start,
        q_index: None,
        visible: true,
    });
    cx += 400.0;

    for i in 0..QUESTIONS.len() {
        plats.push(Platform {
            x: cx,
            y: 400.0,
            width: 120.0,
            kind: PlatformKind::Question,
            q_index: Some(i),
            visible: true,
        });
        cx += 180.0;
        plats.push(Platform {
            x: cx,
            y: 280.0,
            width: 150.0,
            kind: PlatformKind::Answer(Side::Blue),
            q_index: Some(i),
            visible: true,
        });
        plats.push(Platform {
            x: cx,
            y: 480.0,
            width: 150.0,
            kind: PlatformKind::Answer(Side::Red),
            q_index: Some(i),
            visible: true,
        });
        cx += 280.0;
    }

    plats.push(Platform {
        x: cx,
        y: 500.0,
        width: 800.0,
        kind: PlatformKind::End,
        q_index: None,
        visible: true,
    });
    plats
}

impl KangarooGame {
    pub fn new(high_score: u32) -> Self {
        KangarooGame {
            screen: Screen::Start,
            player: Player {
                pos: Vec2::new(50.0, 470.0),
                vel: Vec2::new(0.0, 0.0),
                w: 60.0,
                h: 60.0,
                grounded: false,
                sinking: false,
                can_move: true,
            },
            platforms: build_level(),
            camera_x: 0.0,
            score: 0,
            best: 0,
            high_score,
            answered: HashSet::new(),
            left_hold: Duration::ZERO,
            right_hold: Duration::ZERO,
            jump_queued: false,
            sink_acc: Duration::ZERO,
            frame_acc: Duration::ZERO,
            message: "Hop to the first green platform!".to_string(),
        }
    }

    fn start_run(&mut self) {
        self.platforms = build_level();
        self.player = Player {
            pos: Vec2::new(50.0, 470.0),
            vel: Vec2::new(0.0, 0.0),
            w: 60.0,
            h: 60.0,
            grounded: false,
            sinking: false,
            can_move: true,
        };
        self.camera_x = 0.0;
        self.score = 0;
        self.answered.clear();
        self.left_hold = Duration::ZERO;
        self.right_hold = Duration::ZERO;
        self.jump_queued = false;
        self.sink_acc = Duration::ZERO;
        self.frame_acc = Duration::ZERO;
        self.screen = Screen::Playing;
        self.message = "Hop to the first green platform!".to_string();
    }

    fn step_frame(&mut self) {
        let p = &mut self.player;
        if p.sinking {
            self.sink_acc += FRAME;
            if self.sink_acc >= SINK_TIME {
                self.finish(Screen::GameOver, "Splash! You fell in the lake.");
            }
            return;
        }

        if p.can_move {
            if self.right_hold > Duration::ZERO {
                p.vel.x = RUN_SPEED;
            } else if self.left_hold > Duration::ZERO {
                p.vel.x = -RUN_SPEED;
            } else {
                p.vel.x = 0.0;
            }
            if self.jump_queued && p.grounded {
                p.vel.y = JUMP_STRENGTH;
                p.grounded = false;
            }
        } else {
            p.vel.x = 0.0;
        }
        self.jump_queued = false;

        p.vel.y += GRAVITY;
        p.pos.x += p.vel.x;
        p.pos.y += p.vel.y;

        if p.pos.x > CAMERA_LEAD {
            self.camera_x = p.pos.x - CAMERA_LEAD;
        }

        if p.pos.y > WATER_Y && !p.sinking {
            p.sinking = true;
            self.sink_acc = Duration::ZERO;
            self.message = "Splash!".to_string();
            return;
        }

        self.check_collisions();
        self.left_hold = self.left_hold.saturating_sub(FRAME);
        self.right_hold = self.right_hold.saturating_sub(FRAME);
    }

    fn check_collisions(&mut self) {
        // A thin strip at the feet; landing only happens while falling.
        let feet = Aabb::new(
            self.player.pos.x,
            self.player.pos.y + self.player.h - 1.0,
            self.player.w,
            1.0,
        );
        let falling = self.player.vel.y >= 0.0;
        self.player.grounded = false;

        let mut landed: Option<usize> = None;
        for (i, plat) in self.platforms.iter().enumerate() {
            if !plat.visible {
                continue;
            }
            let surface = Aabb::new(plat.x, plat.y, plat.width, PLATFORM_H + LAND_TOLERANCE);
            if falling && feet.intersects(&surface) {
                landed = Some(i);
                break;
            }
        }
        let Some(i) = landed else {
            return;
        };

        let kind = self.platforms[i].kind;
        let q_index = self.platforms[i].q_index;
        let trap = match (kind, q_index) {
            (PlatformKind::Answer(side), Some(q)) => side != QUESTIONS[q].correct,
            _ => false,
        };

        if trap {
            // The trap and its sibling vanish; the kangaroo is committed
            // to the fall.
            let q = q_index;
            for plat in &mut self.platforms {
                if plat.q_index == q {
                    plat.visible = false;
                }
            }
            self.player.can_move = false;
            self.message = "Wrong answer!".to_string();
            return;
        }

        self.player.grounded = true;
        self.player.vel.y = 0.0;
        self.player.pos.y = self.platforms[i].y - self.player.h;
        self.land_safely(i);
    }

    fn land_safely(&mut self, i: usize) {
        let kind = self.platforms[i].kind;
        let q_index = self.platforms[i].q_index;
        match kind {
            PlatformKind::End => {
                if self.screen != Screen::Win {
                    self.finish(Screen::Win, "You made it to Australia!");
                }
            }
            PlatformKind::Question => {
                if let Some(q) = q_index {
                    self.message = QUESTIONS[q].text.to_string();
                }
            }
            PlatformKind::Answer(side) => {
                let Some(q) = q_index else {
                    return;
                };
                if self.answered.insert(q) {
                    self.score += 1;
                    self.best = self.best.max(self.score);
                }
                // The other answer platform disappears.
                for plat in &mut self.platforms {
                    if plat.q_index == Some(q)
                        && matches!(plat.kind, PlatformKind::Answer(s) if s != side)
                    {
                        plat.visible = false;
                    }
                }
            }
            PlatformKind::Start => {}
        }
    }

    fn finish(&mut self, screen: Screen, msg: &str) {
        info!("kangaroo run finished ({screen:?}), score {}", self.score);
        self.best = self.best.max(self.score);
        self.screen = screen;
        self.message = msg.to_string();
    }
}

impl MiniGame for KangarooGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Start | Screen::GameOver | Screen::Win => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('s')) {
                    self.start_run();
                }
            }
            Screen::Playing => match key.code {
                KeyCode::Left | KeyCode::Char('a') => self.left_hold = KEY_HOLD,
                KeyCode::Right | KeyCode::Char('d') => self.right_hold = KEY_HOLD,
                KeyCode::Up | KeyCode::Char(' ') | KeyCode::Char('w') => {
                    self.jump_queued = true;
                }
                _ => {}
            },
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.screen != Screen::Playing {
            return;
        }
        self.frame_acc += dt;
        while self.frame_acc >= FRAME {
            self.frame_acc -= FRAME;
            self.step_frame();
            if self.screen != Screen::Playing {
                break;
            }
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Kangaroo Quiz  Score: {}  Record: {} ",
            self.score,
            self.high_score.max(self.best)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.screen == Screen::Start {
            let lines = vec![
                Line::from("KANGAROO QUIZ").bold().fg(Color::Yellow),
                Line::from("Arrows to run, up to jump."),
                Line::from("Land on the platform with the right answer!"),
                Line::default(),
                Line::from("[enter] start").fg(Color::Cyan),
            ];
            frame.render_widget(Paragraph::new(lines).centered(), inner);
            return;
        }

        frame.render_widget(
            Paragraph::new(Line::from(self.message.clone()).bold().fg(Color::Cyan)).centered(),
            Rect { height: 1, ..inner },
        );
        if inner.height < 4 {
            return;
        }

        let view = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };
        let sx = |wx: f32| -> Option<u16> {
            let rel = (wx - self.camera_x) / VIEW_W;
            (0.0..1.0).contains(&rel).then(|| view.x + (rel * view.width as f32) as u16)
        };
        let sy = |wy: f32| -> u16 {
            view.y + ((wy / WORLD_H).clamp(0.0, 1.0) * (view.height - 1) as f32) as u16
        };

        let buf = frame.buffer_mut();
        // Water line along the bottom.
        let wy = sy(WATER_Y);
        for x in view.left()..view.right() {
            buf[(x, wy)].set_symbol("~").set_fg(Color::Blue);
        }

        for plat in self.platforms.iter().filter(|p| p.visible) {
            let (color, label) = match (plat.kind, plat.q_index) {
                (PlatformKind::Start, _) => (Color::Gray, String::new()),
                (PlatformKind::End, _) => (Color::Yellow, "AUSTRALIA".to_string()),
                (PlatformKind::Question, _) => (Color::Green, "?".to_string()),
                (PlatformKind::Answer(Side::Blue), Some(q)) => {
                    (Color::Blue, QUESTIONS[q].blue.to_string())
                }
                (PlatformKind::Answer(Side::Red), Some(q)) => {
                    (Color::Red, QUESTIONS[q].red.to_string())
                }
                _ => (Color::White, String::new()),
            };
            let y = sy(plat.y);
            let Some(x0) = sx(plat.x).or_else(|| sx(self.camera_x)) else {
                continue;
            };
            let Some(x1) = sx(plat.x + plat.width).or_else(|| {
                (plat.x < self.camera_x + VIEW_W && plat.x + plat.width > self.camera_x)
                    .then(|| view.right().saturating_sub(1))
            }) else {
                continue;
            };
            if plat.x + plat.width < self.camera_x || plat.x > self.camera_x + VIEW_W {
                continue;
            }
            for x in x0..=x1.min(view.right().saturating_sub(1)) {
                buf[(x, y)].set_symbol("=").set_fg(color);
            }
            buf.set_string(x0, y, &label, Style::default().fg(color));
        }

        if let Some(px) = sx(self.player.pos.x) {
            let py = sy(self.player.pos.y + self.player.h);
            if px < view.right() {
                buf.set_string(px, py.saturating_sub(1), "K", Style::default().fg(Color::Magenta).bold());
            }
        }
    }

    fn phase(&self) -> RoundPhase {
        match self.screen {
            Screen::GameOver | Screen::Win => RoundPhase::Over,
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

    fn game() -> KangarooGame {
        let mut g = KangarooGame::new(0);
        g.start_run();
        g
    }

    fn settle(g: &mut KangarooGame) {
        // Let the kangaroo fall onto whatever is beneath it.
        for _ in 0..120 {
            g.step_frame();
            if g.player.grounded || g.screen != Screen::Playing {
                break;
            }
        }
    }

    fn platform_index(g: &KangarooGame, kind: PlatformKind, q: usize) -> usize {
        g.platforms
            .iter()
            .position(|p| p.kind == kind && p.q_index == Some(q))
            .unwrap()
    }

    fn drop_onto(g: &mut KangarooGame, i: usize) {
        let plat = g.platforms[i].clone();
        g.player.pos = Vec2::new(plat.x + 10.0, plat.y - g.player.h - 5.0);
        g.player.vel = Vec2::new(0.0, 0.0);
        settle(g);
    }

    #[test]
    fn test_level_layout() {
        let plats = build_level();
        // Start, 10 x (question + two answers), end.
        assert_eq!(plats.len(), 32);
        assert_eq!(plats[0].kind, PlatformKind::Start);
        assert_eq!(plats[31].kind, PlatformKind::End);
        for (i, q) in QUESTIONS.iter().enumerate() {
            assert!(!q.text.is_empty());
            assert!(plats
                .iter()
                .any(|p| p.kind == PlatformKind::Question && p.q_index == Some(i)));
        }
    }

    #[test]
    fn test_lands_on_start_platform() {
        let mut g = game();
        settle(&mut g);
        assert!(g.player.grounded);
        // Feet rest on the platform surface.
        assert_eq!(g.player.pos.y, 530.0 - g.player.h);
    }

    #[test]
    fn test_jump_and_return() {
        let mut g = game();
        settle(&mut g);
        g.jump_queued = true;
        g.step_frame();
        assert!(!g.player.grounded);
        assert!(g.player.vel.y < 0.0);
        settle(&mut g);
        assert!(g.player.grounded);
    }

    #[test]
    fn test_no_landing_while_rising() {
        let mut g = game();
        settle(&mut g);
        g.player.vel.y = JUMP_STRENGTH;
        g.player.grounded = false;
        g.step_frame();
        // Still overlapping the platform band but moving up, so no snap.
        assert!(!g.player.grounded);
    }

    #[test]
    fn test_held_key_decays() {
        let mut g = game();
        settle(&mut g);
        g.handle_key(KeyEvent::from(KeyCode::Right));
        let x0 = g.player.pos.x;
        g.step_frame();
        assert!(g.player.pos.x > x0);
        // After the hold expires the kangaroo stops.
        for _ in 0..20 {
            g.step_frame();
        }
        let x1 = g.player.pos.x;
        g.step_frame();
        assert_eq!(g.player.pos.x, x1);
    }

    #[test]
    fn test_correct_answer_scores_once_and_hides_sibling() {
        let mut g = game();
        let q = 0;
        let side = QUESTIONS[q].correct;
        let i = platform_index(&g, PlatformKind::Answer(side), q);
        drop_onto(&mut g, i);
        assert_eq!(g.score, 1);

        let other = match side {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        };
        let j = platform_index(&g, PlatformKind::Answer(other), q);
        assert!(!g.platforms[j].visible);

        // Bouncing on the same answer again does not double count.
        drop_onto(&mut g, i);
        assert_eq!(g.score, 1);
    }

    #[test]
    fn test_trap_hides_pair_and_drops_into_water() {
        let mut g = game();
        let q = 1;
        let wrong = match QUESTIONS[q].correct {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        };
        let i = platform_index(&g, PlatformKind::Answer(wrong), q);
        drop_onto(&mut g, i);

        assert!(!g.platforms[i].visible);
        let j = platform_index(&g, PlatformKind::Answer(QUESTIONS[q].correct), q);
        assert!(!g.platforms[j].visible);
        assert!(!g.player.can_move);
        assert_eq!(g.score, 0);

        // Nothing left to land on; the kangaroo sinks and the run ends.
        for _ in 0..300 {
            g.step_frame();
            if g.screen != Screen::Playing {
                break;
            }
        }
        assert_eq!(g.screen, Screen::GameOver);
        assert_eq!(g.phase(), RoundPhase::Over);
    }

    #[test]
    fn test_question_platform_shows_question() {
        let mut g = game();
        let i = platform_index(&g, PlatformKind::Question, 2);
        drop_onto(&mut g, i);
        assert_eq!(g.message, QUESTIONS[2].text);
    }

    #[test]
    fn test_end_platform_wins() {
        let mut g = game();
        g.score = 10;
        let i = g
            .platforms
            .iter()
            .position(|p| p.kind == PlatformKind::End)
            .unwrap();
        drop_onto(&mut g, i);
        assert_eq!(g.screen, Screen::Win);
        assert_eq!(g.phase(), RoundPhase::Over);
        assert_eq!(g.score(), 10);
    }

    #[test]
    fn test_camera_follows_player() {
        let mut g = game();
        settle(&mut g);
        g.player.pos.x = 1000.0;
        g.step_frame();
        assert!((g.camera_x - (g.player.pos.x - CAMERA_LEAD)).abs() < 0.01);
    }

    #[test]
    fn test_restart_after_splash_preserves_best() {
        let mut g = game();
        g.score = 4;
        g.best = 4;
        g.player.pos.y = WATER_Y + 10.0;
        for _ in 0..80 {
            g.step_frame();
            if g.screen != Screen::Playing {
                break;
            }
        }
        assert_eq!(g.screen, Screen::GameOver);
        g.handle_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(g.screen, Screen::Playing);
        assert_eq!(g.score, 0);
        assert_eq!(g.score(), 4);
    }
}
