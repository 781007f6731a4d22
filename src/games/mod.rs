//! The eight mini-games. Each is a leaf: it owns all of its mutable state,
//! advances on `tick`, and never touches another game.

pub mod balloon;
pub mod blackjack;
pub mod caterpillar;
pub mod crawler;
pub mod kangaroo;
pub mod mole;
pub mod pencil;
pub mod snake;

use crate::config::Difficulty;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    Running,
    Paused,
    Over,
}

/// The frame-driver contract shared by every game: queued input is applied,
/// entities move, collisions resolve, score updates, terminal conditions
/// are detected, and `render` always reflects the last resolved state.
/// Paused games treat `tick` as a render-only no-op.
pub trait MiniGame {
    fn handle_key(&mut self, key: KeyEvent);
    fn handle_mouse(&mut self, _event: MouseEvent, _viewport: Rect) {}
    fn tick(&mut self, dt: Duration);
    fn render(&self, frame: &mut Frame, area: Rect);
    fn phase(&self) -> RoundPhase;
    /// Best score reached this session; what the hub routes to the sink.
    fn score(&self) -> u32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    Snake,
    Pencil,
    Balloon,
    Caterpillar,
    Crawler,
    Blackjack,
    Mole,
    Kangaroo,
}

impl GameKind {
    pub const ALL: [GameKind; 8] = [
        GameKind::Snake,
        GameKind::Pencil,
        GameKind::Balloon,
        GameKind::Caterpillar,
        GameKind::Crawler,
        GameKind::Blackjack,
        GameKind::Mole,
        GameKind::Kangaroo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Snake => "Snake",
            GameKind::Pencil => "Pixel Pencil",
            GameKind::Balloon => "Balloon Pop",
            GameKind::Caterpillar => "Hungry Caterpillar",
            GameKind::Crawler => "Leaf Crawler",
            GameKind::Blackjack => "Race to 21",
            GameKind::Mole => "Whack-a-Mole",
            GameKind::Kangaroo => "Kangaroo Quiz",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            GameKind::Snake => "Eat, grow, dodge the walls",
            GameKind::Pencil => "Paint pictures by solving math",
            GameKind::Balloon => "Pop the balloon with the right answer",
            GameKind::Caterpillar => "Feed the caterpillar into a butterfly",
            GameKind::Crawler => "Take the last leaf to win",
            GameKind::Blackjack => "Count race against the dealer",
            GameKind::Mole => "Whack moles with the number keys",
            GameKind::Kangaroo => "Hop across the quiz platforms",
        }
    }

    pub fn builtin_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.name()).collect()
    }

    pub fn launch(&self, difficulty: Difficulty, high_score: u32) -> Box<dyn MiniGame> {
        match self {
            GameKind::Snake => Box::new(snake::SnakeGame::new(difficulty, high_score)),
            GameKind::Pencil => Box::new(pencil::PencilGame::new(high_score)),
            GameKind::Balloon => Box::new(balloon::BalloonGame::new(high_score)),
            GameKind::Caterpillar => Box::new(caterpillar::CaterpillarGame::new(high_score)),
            GameKind::Crawler => Box::new(crawler::CrawlerGame::new(high_score)),
            GameKind::Blackjack => Box::new(blackjack::BlackjackGame::new(difficulty, high_score)),
            GameKind::Mole => Box::new(mole::MoleGame::new(high_score)),
            GameKind::Kangaroo => Box::new(kangaroo::KangarooGame::new(high_score)),
        }
    }
}
