//! The hub screen machine: a menu of games, a playing screen that hosts
//! one game at a time, and a manage screen for the catalog.
//!
//! The hub owns the catalog and routes finished scores into it. A score
//! is submitted when a round ends and again when the player leaves the
//! game; the catalog only records strict improvements, so resubmission
//! is harmless.

use crate::audio::{self, AudioSink, NullSink, Wave};
use crate::catalog::Catalog;
use crate::config::{Config, Difficulty};
use crate::games::{GameKind, MiniGame, RoundPhase};
use crate::score::{CatalogSink, ScoreSink};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use log::{debug, error};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Duration;

enum Screen {
    Menu,
    Playing {
        kind: GameKind,
        game: Box<dyn MiniGame>,
        was_over: bool,
    },
    Manage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ManageInput {
    None,
    Adding(String),
    Renaming(String),
}

pub struct Hub {
    catalog: Catalog,
    difficulty: Difficulty,
    player: String,
    screen: Screen,
    selected: usize,
    manage_input: ManageInput,
    status: String,
    audio: NullSink,
    quit: bool,
}

impl Hub {
    pub fn new(catalog: Catalog, config: &Config) -> Self {
        Hub {
            catalog,
            difficulty: config.difficulty,
            player: config.player.clone(),
            screen: Screen::Menu,
            selected: 0,
            manage_input: ManageInput::None,
            status: String::new(),
            audio: NullSink,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn entry_count(&self) -> usize {
        self.catalog.entries().len()
    }

    fn selected_name(&self) -> Option<String> {
        self.catalog
            .entries()
            .get(self.selected)
            .map(|e| e.name.clone())
    }

    fn launch_selected(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let Some(kind) = GameKind::ALL.iter().find(|k| k.name() == name).copied() else {
            self.status = format!("{name} has no playable build");
            return;
        };
        let high_score = self
            .catalog
            .get(&name)
            .map(|e| e.high_score)
            .unwrap_or(0);
        debug!("launching {name}");
        self.audio.play(&audio::tone(Wave::Square, 440.0, 0.05, 0.2));
        self.screen = Screen::Playing {
            kind,
            game: kind.launch(self.difficulty, high_score),
            was_over: false,
        };
        self.status.clear();
    }

    /// Pushes the current game's session best into the catalog.
    /// Returns true when the score set a new record.
    fn submit_score(&mut self) -> bool {
        let Screen::Playing { kind, game, .. } = &self.screen else {
            return false;
        };
        let (name, score) = (kind.name().to_string(), game.score());
        let player = self.player.clone();
        CatalogSink::new(&mut self.catalog).submit(&name, score, &player)
    }

    fn leave_game(&mut self) {
        self.submit_score();
        self.screen = Screen::Menu;
    }

    /// Submits once per transition into the over state.
    fn poll_round(&mut self) {
        let over = match &self.screen {
            Screen::Playing { game, was_over, .. } => {
                game.phase() == RoundPhase::Over && !was_over
            }
            _ => return,
        };
        if over {
            let record = self.submit_score();
            let jingle = if record {
                audio::sweep(Wave::Sine, 400.0, 1200.0, 0.3, 0.3)
            } else {
                audio::sweep(Wave::Sawtooth, 300.0, 80.0, 0.25, 0.2)
            };
            self.audio.play(&jingle);
        }
        if let Screen::Playing { game, was_over, .. } = &mut self.screen {
            *was_over = game.phase() == RoundPhase::Over;
        }
    }

    fn save_catalog(&mut self) {
        if let Err(e) = self.catalog.save() {
            error!("failed to persist catalog: {e}");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match &mut self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Playing { game, .. } => match key.code {
                KeyCode::Esc => self.leave_game(),
                _ => {
                    game.handle_key(key);
                    self.poll_round();
                }
            },
            Screen::Manage => self.handle_manage_key(key),
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent, viewport: Rect) {
        if let Screen::Playing { game, .. } = &mut self.screen {
            game.handle_mouse(event, viewport);
            self.poll_round();
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entry_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.launch_selected(),
            KeyCode::Char('d') => {
                self.difficulty = self.difficulty.cycle();
            }
            KeyCode::Char('m') => {
                self.screen = Screen::Manage;
                self.manage_input = ManageInput::None;
                self.status.clear();
            }
            KeyCode::Char('q') => self.quit = true,
            _ => {}
        }
    }

    fn handle_manage_key(&mut self, key: KeyEvent) {
        // Text entry swallows everything until enter or escape.
        match &mut self.manage_input {
            ManageInput::Adding(buf) | ManageInput::Renaming(buf) => {
                match key.code {
                    KeyCode::Char(c) => buf.push(c),
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Esc => self.manage_input = ManageInput::None,
                    KeyCode::Enter => self.commit_manage_input(),
                    _ => {}
                }
                return;
            }
            ManageInput::None => {}
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entry_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') => self.manage_input = ManageInput::Adding(String::new()),
            KeyCode::Char('r') => self.manage_input = ManageInput::Renaming(String::new()),
            KeyCode::Char('x') => {
                if let Some(name) = self.selected_name() {
                    if self.catalog.remove(&name) {
                        self.status = format!("removed {name}");
                        self.selected = self.selected.min(self.entry_count().saturating_sub(1));
                        self.save_catalog();
                    }
                }
            }
            KeyCode::Char('z') => {
                if let Some(name) = self.selected_name() {
                    if self.catalog.reset_high_score(&name) {
                        self.status = format!("cleared record for {name}");
                        self.save_catalog();
                    }
                }
            }
            KeyCode::Char('b') => {
                self.catalog.restore_builtins(&GameKind::builtin_names());
                self.status = "restored built-in games".to_string();
                self.save_catalog();
            }
            KeyCode::Esc | KeyCode::Char('m') => {
                self.screen = Screen::Menu;
                self.selected = self.selected.min(self.entry_count().saturating_sub(1));
            }
            _ => {}
        }
    }

    fn commit_manage_input(&mut self) {
        let input = std::mem::replace(&mut self.manage_input, ManageInput::None);
        match input {
            ManageInput::Adding(name) => {
                let name = name.trim().to_string();
                if self.catalog.add(&name) {
                    self.status = format!("added {name}");
                    self.save_catalog();
                } else {
                    self.status = "name is empty or already taken".to_string();
                }
            }
            ManageInput::Renaming(new) => {
                let new = new.trim().to_string();
                let Some(old) = self.selected_name() else {
                    return;
                };
                if self.catalog.rename(&old, &new) {
                    self.status = format!("renamed {old} to {new}");
                    self.save_catalog();
                } else {
                    self.status = "rename rejected".to_string();
                }
            }
            ManageInput::None => {}
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Screen::Playing { game, .. } = &mut self.screen {
            game.tick(dt);
            self.poll_round();
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        match &self.screen {
            Screen::Playing { game, .. } => game.render(frame, area),
            Screen::Menu => self.render_menu(frame, area),
            Screen::Manage => self.render_manage(frame, area),
        }
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Gamebox  [{:?}]  player: {} ", self.difficulty, self.player);
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::default()];
        for (i, entry) in self.catalog.entries().iter().enumerate() {
            let kind = GameKind::ALL.iter().find(|k| k.name() == entry.name);
            let blurb = kind.map(|k| k.blurb()).unwrap_or("(custom entry)");
            let record = match &entry.high_score_player {
                Some(player) => format!("{} by {player}", entry.high_score),
                None => "-".to_string(),
            };
            let text = format!("{:<20} {:<40} best: {record}", entry.name, blurb);
            let line = if i == self.selected {
                Line::from(format!("> {text}")).fg(Color::Yellow).bold()
            } else {
                Line::from(format!("  {text}"))
            };
            lines.push(line);
        }
        lines.push(Line::default());
        lines.push(
            Line::from("[enter] play  [d]ifficulty  [m]anage  [q]uit").fg(Color::Cyan),
        );
        if !self.status.is_empty() {
            lines.push(Line::from(self.status.clone()).fg(Color::Red));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_manage(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Manage catalog ")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::default()];
        for (i, entry) in self.catalog.entries().iter().enumerate() {
            let marker = if i == self.selected { "> " } else { "  " };
            let line = format!(
                "{marker}#{:<3} {:<20} best {}",
                entry.id, entry.name, entry.high_score
            );
            lines.push(if i == self.selected {
                Line::from(line).fg(Color::Yellow)
            } else {
                Line::from(line)
            });
        }
        lines.push(Line::default());
        match &self.manage_input {
            ManageInput::Adding(buf) => {
                lines.push(Line::from(vec![
                    Span::raw("new name: "),
                    Span::styled(format!("{buf}_"), Style::default().fg(Color::Green)),
                ]));
            }
            ManageInput::Renaming(buf) => {
                lines.push(Line::from(vec![
                    Span::raw("rename to: "),
                    Span::styled(format!("{buf}_"), Style::default().fg(Color::Green)),
                ]));
            }
            ManageInput::None => {
                lines.push(
                    Line::from("[a]dd  [r]ename  [x] remove  [z] clear record  [b] restore built-ins  [esc] back")
                        .fg(Color::Cyan),
                );
            }
        }
        if !self.status.is_empty() {
            lines.push(Line::from(self.status.clone()).fg(Color::Gray));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
