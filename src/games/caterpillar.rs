//! Hungry Caterpillar: feed all ten leaves to the caterpillar and watch
//! it pupate. Butterflies freed this session are the score.

use crate::games::{MiniGame, RoundPhase};
use crate::geom::Vec2;
use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::{Color, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Duration;

const TOTAL_LEAVES: u32 = 10;
const CHEW_TIME: Duration = Duration::from_millis(600);
const NAP_TIME: Duration = Duration::from_millis(2000);
const COCOON_TIME: Duration = Duration::from_millis(3000);
const FLIGHT_TIME: Duration = Duration::from_millis(8000);

const CRUMB_GRAVITY: f32 = 0.2;
const CRUMB_DECAY: f32 = 0.05;

const PHRASES: [&str; 5] = ["Crunch!", "Munch!", "Yummy!", "Gulp!", "More please!"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Feeding,
    Chewing { eat: u32 },
    Napping,
    Cocoon,
    Butterfly,
}

#[derive(Clone, Copy, Debug)]
struct Crumb {
    pos: Vec2,
    vel: Vec2,
    life: f32,
}

pub struct CaterpillarGame {
    rng: StdRng,
    leaves: u32,
    stage: Stage,
    stage_acc: Duration,
    butterflies: u32,
    high_score: u32,
    crumbs: Vec<Crumb>,
    message: String,
}

impl CaterpillarGame {
    pub fn new(high_score: u32) -> Self {
        Self::new_with_rng(high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(high_score: u32, rng: StdRng) -> Self {
        CaterpillarGame {
            rng,
            leaves: TOTAL_LEAVES,
            stage: Stage::Feeding,
            stage_acc: Duration::ZERO,
            butterflies: 0,
            high_score,
            crumbs: Vec::new(),
            message: "Feed the hungry caterpillar!".to_string(),
        }
    }

    fn feed(&mut self, amount: u32) {
        if self.stage != Stage::Feeding {
            return;
        }
        let eat = amount.min(self.leaves);
        if eat == 0 {
            return;
        }
        self.stage = Stage::Chewing { eat };
        self.stage_acc = Duration::ZERO;
        self.spawn_crumbs();
        self.message = PHRASES[self.rng.gen_range(0..PHRASES.len())].to_string();
    }

    fn spawn_crumbs(&mut self) {
        let x = (TOTAL_LEAVES - self.leaves) as f32 * 2.0 + 4.0;
        for _ in 0..8 {
            self.crumbs.push(Crumb {
                pos: Vec2::new(x, 4.0),
                vel: Vec2::new(
                    (self.rng.gen_range(0.0..1.0f32) - 0.5) * 4.0,
                    self.rng.gen_range(-2.0..0.0f32),
                ),
                life: 1.0,
            });
        }
    }

    fn update_crumbs(&mut self) {
        for c in &mut self.crumbs {
            c.vel.y += CRUMB_GRAVITY;
            c.pos.x += c.vel.x;
            c.pos.y += c.vel.y;
            c.life -= CRUMB_DECAY;
        }
        self.crumbs.retain(|c| c.life > 0.0);
    }

    fn advance_stage(&mut self, dt: Duration) {
        self.stage_acc += dt;
        match self.stage {
            Stage::Feeding => {}
            Stage::Chewing { eat } => {
                if self.stage_acc >= CHEW_TIME {
                    self.leaves -= eat;
                    self.stage_acc = Duration::ZERO;
                    if self.leaves == 0 {
                        self.stage = Stage::Napping;
                        self.message = "I'm so full! Time to take a nap...".to_string();
                    } else {
                        self.stage = Stage::Feeding;
                    }
                }
            }
            Stage::Napping => {
                if self.stage_acc >= NAP_TIME {
                    self.stage = Stage::Cocoon;
                    self.stage_acc = Duration::ZERO;
                    self.message = "Sleeping in the chrysalis... Zzz...".to_string();
                }
            }
            Stage::Cocoon => {
                if self.stage_acc >= COCOON_TIME {
                    self.stage = Stage::Butterfly;
                    self.stage_acc = Duration::ZERO;
                    self.butterflies += 1;
                    self.message = "I turned into a butterfly!".to_string();
                    info!("butterfly freed, session total {}", self.butterflies);
                }
            }
            Stage::Butterfly => {
                if self.stage_acc >= FLIGHT_TIME {
                    self.leaves = TOTAL_LEAVES;
                    self.stage = Stage::Feeding;
                    self.stage_acc = Duration::ZERO;
                    self.message = "Here is a new hungry caterpillar!".to_string();
                }
            }
        }
    }
}

impl MiniGame for CaterpillarGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('1') => self.feed(1),
            KeyCode::Char('2') if self.leaves >= 2 => self.feed(2),
            _ => {}
        }
    }

    fn tick(&mut self, dt: Duration) {
        self.advance_stage(dt);
        self.update_crumbs();
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Hungry Caterpillar  Freed: {}  Record: {} ",
            self.butterflies,
            self.high_score.max(self.butterflies)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let eaten = (TOTAL_LEAVES - self.leaves) as usize;
        let scene = match self.stage {
            Stage::Butterfly => " 8< fluttering away >8 ".to_string(),
            Stage::Cocoon | Stage::Napping => "   (==zzz==)   ".to_string(),
            _ => {
                let body: String = std::iter::repeat('o').take(2 + eaten).collect();
                let leaves: Vec<String> =
                    std::iter::repeat("@".to_string()).take(self.leaves as usize).collect();
                format!("{body}C   {}", leaves.join(" "))
            }
        };

        let lines = vec![
            Line::from(format!("Leaves left: {}", self.leaves)).fg(Color::Green),
            Line::default(),
            Line::from(scene).fg(Color::LightGreen),
            Line::default(),
            Line::from(self.message.clone()).bold().fg(Color::Magenta),
            Line::default(),
            match self.stage {
                Stage::Feeding => Line::from("[1] nibble one  [2] munch two").fg(Color::Cyan),
                Stage::Chewing { .. } => Line::from("chomp chomp..."),
                _ => Line::default(),
            },
        ];
        frame.render_widget(Paragraph::new(lines).centered(), inner);
    }

    fn phase(&self) -> RoundPhase {
        match self.stage {
            Stage::Butterfly => RoundPhase::Over,
            _ => RoundPhase::Running,
        }
    }

    fn score(&self) -> u32 {
        self.butterflies
    }
}
