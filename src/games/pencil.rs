//! Pixel Pencil: paint-by-numbers where every number hides behind a sum.
//! Pick a palette number, solve the equation under the cursor, and fill
//! in the picture tile by tile.

use crate::games::{MiniGame, RoundPhase};
use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::collections::HashMap;
use std::time::Duration;

const GRID: usize = 15;
const CORRECT_POINTS: u32 = 10;
const WRONG_PENALTY: u32 = 5;

fn color_of(ch: char) -> Color {
    match ch {
        'R' => Color::Rgb(230, 50, 50),
        'G' => Color::Rgb(50, 180, 50),
        'B' => Color::Rgb(50, 100, 230),
        'Y' => Color::Rgb(255, 215, 0),
        'O' => Color::Rgb(255, 140, 0),
        'P' => Color::Rgb(147, 112, 219),
        'K' => Color::Rgb(40, 40, 40),
        'S' => Color::Rgb(135, 206, 250),
        'N' => Color::Rgb(139, 69, 19),
        'L' => Color::Rgb(50, 205, 50),
        'A' => Color::Rgb(128, 128, 128),
        _ => Color::Rgb(255, 255, 255),
    }
}

struct Pattern {
    name: &'static str,
    rows: [&'static str; GRID],
}

const PATTERNS: [Pattern; 10] = [
    Pattern {
        name: "Heart",
        rows: [
            "...............",
            "...RR.....RR...",
            ".RRRRR...RRRRR.",
            "RRRRRRR.RRRRRRR",
            "RRRRRRRRRRRRRRR",
            "RRRRRRRRRRRRRRR",
            ".RRRRRRRRRRRRR.",
            "..RRRRRRRRRRR..",
            "...RRRRRRRRR...",
            "....RRRRRRR....",
            ".....RRRRR.....",
            "......RRR......",
            ".......R.......",
            "...............",
            "...............",
        ],
    },
    Pattern {
        name: "Sailboat",
        rows: [
            ".......K.......",
            ".......K.......",
            "......RK.......",
            ".....RRK.......",
            "....RRRK.......",
            "...RRRRK...Y...",
            "..RRRRRK.......",
            ".RRRRRRK.......",
            "KKKKKKKKKKKKKKK",
            ".NNNNNNNNNNNNN.",
            "..NNNNNNNNNNN..",
            "SSSSSSSSSSSSSSS",
            "SSSSSSSSSSSSSSS",
            "SSSSSSSSSSSSSSS",
            "SSSSSSSSSSSSSSS",
        ],
    },
    Pattern {
        name: "Space Invader",
        rows: [
            "...............",
            ".....G.....G...",
            "......G...G....",
            ".....GGGGGGG...",
            "....GG.GGG.GG..",
            "...GGGGGGGGGGG.",
            "...G.GGGGGGG.G.",
            "...G.G.....G.G.",
            "......GG.GG....",
            "...............",
            "...............",
            "...P.......P...",
            "....P.....P....",
            "...PPPPPPPPP...",
            "..P.P.....P.P..",
        ],
    },
    Pattern {
        name: "Rubber Duck",
        rows: [
            "...............",
            "......YYY......",
            "....YYYYYY.....",
            "...YYKYYOYY....",
            "...YYYYOOO.....",
            "....YYYYYY.....",
            "..YYYYYYYY.....",
            ".YYYYYYYYYYY...",
            "YYYYYYYYYYYYY..",
            "YYYYYYYYYYYYY..",
            ".YYYYYYYYYYY...",
            "..SSSSSSSSSS...",
            ".SSSSSSSSSSSS..",
            "SSSSSSSSSSSSSS.",
            "SSSSSSSSSSSSSSS",
        ],
    },
    Pattern {
        name: "Mushroom",
        rows: [
            ".....KKKKK.....",
            "...KKRRRRRKK...",
            "..KRRRRRRRRRK..",
            ".KRRRRRRRRRRRK.",
            ".KRR..RRR..RRK.",
            ".KRR..RRR..RRK.",
            ".KRRRRRRRRRRRK.",
            "..KRRRRRRRRRK..",
            "...KKKKKKKKK...",
            "....K.....K....",
            "....K..K..K....",
            "....K..K..K....",
            "....K.....K....",
            "....KKKKKKK....",
            "...............",
        ],
    },
    Pattern {
        name: "Sword",
        rows: [
            "..............A",
            ".............A.",
            "............A..",
            "...........A...",
            "..........A....",
            ".........A.....",
            "........A......",
            ".......A.......",
            "......A........",
            ".....A.........",
            "....AK.........",
            "...B.K.........",
            "..B..K.........",
            ".B...K.........",
            "B....K.........",
        ],
    },
    Pattern {
        name: "Creeper Face",
        rows: [
            "LLLLLLLLLLLLLLL",
            "LLLLLLLLLLLLLLL",
            "LLLLLLLLLLLLLLL",
            "LLLLKKKLLKKKLLL",
            "LLLLKKKLLKKKLLL",
            "LLLLKKKLLKKKLLL",
            "LLLLLLLLLLLLLLL",
            "LLLLLLKKKLLLLLL",
            "LLLLLLKKKLLLLLL",
            "LLLLKKKKKKKLLLL",
            "LLLLKKKKKKKLLLL",
            "LLLLKKKLLKKKLLL",
            "LLLLKKKLLKKKLLL",
            "LLLLLLLLLLLLLLL",
            "LLLLLLLLLLLLLLL",
        ],
    },
    Pattern {
        name: "Butterfly",
        rows: [
            "S.............S",
            "SP.....K.....PS",
            "SPP....K....PPS",
            "SPPP...K...PPPS",
            "SSPPPP.K.PPPPSS",
            "SSSPPPPKPPPPSSS",
            "SSSSPPPPPPPSSSS",
            "SSSSSPPKPPSSSSS",
            "SSSSPPPPPPPSSSS",
            "SSSPPPPKPPPPSSS",
            "SSPPPP.K.PPPPSS",
            "SPPP...K...PPPS",
            "SPP....K....PPS",
            "SP.....K.....PS",
            "S.............S",
        ],
    },
    Pattern {
        name: "Watermelon",
        rows: [
            "...............",
            "...............",
            "......RRR......",
            "....RRKRKRR....",
            "...RRRKRKRRR...",
            "..RRRRRRRRRRR..",
            "..RRRRRRRRRRR..",
            ".RRRKRKRRRKRRR.",
            ".RRRRRRRRRRRRR.",
            ".LLLLLLLLLLLLL.",
            "..LLLLLLLLLLL..",
            "...GGGGGGGGG...",
            "...............",
            "...............",
            "...............",
        ],
    },
    Pattern {
        name: "Sunny House",
        rows: [
            "SSSSSSSSSSSSYYY",
            "SSSSSSSSSSSSYYY",
            "SSSSSSRSSSSSSSS",
            "SSSSSSRRRSSSSSS",
            "SSSSSRRRRRSSSSS",
            "SSSSRRRRRRRSSSS",
            "SSSRRRRRRRRRSSS",
            "SSSRRRRRRRRRSSS",
            "SSSOOOOOOOOOSSS",
            "SSSOBBBOBBBOSSS",
            "SSSOBBBOBBBOSSS",
            "SSSOOOOOOOOOSSS",
            "SSSOOOONNOOOSSS",
            "GGGGGGGNNGGGGGG",
            "GGGGGGGNNGGGGGG",
        ],
    },
];

/// Unique characters in first-appearance order.
fn used_chars(pattern: &Pattern) -> Vec<char> {
    let mut chars = Vec::new();
    for row in pattern.rows {
        for ch in row.chars() {
            if !chars.contains(&ch) {
                chars.push(ch);
            }
        }
    }
    chars
}

#[derive(Clone, Debug)]
struct PaletteEntry {
    answer: u32,
    ch: char,
}

/// Assigns each color one number from a shuffled 1-50 pool, sometimes
/// two to keep the player guessing.
fn build_palette(
    rng: &mut impl Rng,
    chars: &[char],
) -> (Vec<PaletteEntry>, HashMap<char, Vec<u32>>) {
    let mut pool: Vec<u32> = (1..=50).collect();
    pool.shuffle(rng);
    let mut pool = pool.into_iter();

    let mut palette = Vec::new();
    let mut answers: HashMap<char, Vec<u32>> = HashMap::new();
    for &ch in chars {
        let ans = pool.next().unwrap_or(0);
        answers.insert(ch, vec![ans]);
        palette.push(PaletteEntry { answer: ans, ch });
        if rng.gen_bool(0.4) {
            let ans2 = pool.next().unwrap_or(0);
            if let Some(list) = answers.get_mut(&ch) {
                list.push(ans2);
            }
            palette.push(PaletteEntry { answer: ans2, ch });
        }
    }
    palette.sort_by_key(|e| e.answer);
    (palette, answers)
}

fn make_equation(rng: &mut impl Rng, target: u32) -> String {
    if rng.gen_bool(0.5) {
        let a = if target > 1 { rng.gen_range(1..target) } else { 0 };
        format!("{a}+{}", target - a)
    } else {
        let b = rng.gen_range(1..=10);
        format!("{}-{b}", target + b)
    }
}

#[derive(Clone, Debug)]
struct Tile {
    ch: char,
    answer: u32,
    equation: String,
    painted: bool,
}

pub struct PencilGame {
    rng: StdRng,
    pattern_name: &'static str,
    tiles: Vec<Tile>,
    palette: Vec<PaletteEntry>,
    selected: Option<usize>,
    cursor: (usize, usize),
    score: u32,
    best: u32,
    high_score: u32,
    done: bool,
    message: String,
}

impl PencilGame {
    pub fn new(high_score: u32) -> Self {
        Self::new_with_rng(high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(high_score: u32, rng: StdRng) -> Self {
        let mut game = PencilGame {
            rng,
            pattern_name: "",
            tiles: Vec::new(),
            palette: Vec::new(),
            selected: None,
            cursor: (0, 0),
            score: 0,
            best: 0,
            high_score,
            done: false,
            message: String::new(),
        };
        game.start_picture();
        game
    }

    fn start_picture(&mut self) {
        self.score = 0;
        self.done = false;
        self.selected = None;
        self.cursor = (0, 0);
        self.message = "Pick a number, then solve the tile under the cursor.".to_string();

        let pattern = &PATTERNS[self.rng.gen_range(0..PATTERNS.len())];
        self.pattern_name = pattern.name;
        let chars = used_chars(pattern);
        let (palette, answers) = build_palette(&mut self.rng, &chars);
        self.palette = palette;

        self.tiles = Vec::with_capacity(GRID * GRID);
        for row in pattern.rows {
            for ch in row.chars() {
                let options = &answers[&ch];
                let answer = options[self.rng.gen_range(0..options.len())];
                let equation = make_equation(&mut self.rng, answer);
                self.tiles.push(Tile {
                    ch,
                    answer,
                    equation,
                    painted: false,
                });
            }
        }
    }

    fn paint(&mut self) {
        if self.done {
            return;
        }
        let Some(sel) = self.selected else {
            self.message = "Pick a palette number first!".to_string();
            return;
        };
        let idx = self.cursor.1 * GRID + self.cursor.0;
        if self.tiles[idx].painted {
            return;
        }
        if self.tiles[idx].answer == self.palette[sel].answer {
            self.tiles[idx].painted = true;
            self.score += CORRECT_POINTS;
            self.best = self.best.max(self.score);
            if self.tiles.iter().all(|t| t.painted) {
                self.done = true;
                self.message = format!("{} complete!", self.pattern_name);
                info!("picture {} finished, score {}", self.pattern_name, self.score);
            } else {
                self.message = "Correct!".to_string();
            }
        } else {
            self.score = self.score.saturating_sub(WRONG_PENALTY);
            self.message = "Try again!".to_string();
        }
    }
}

impl MiniGame for PencilGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.cursor.0 = self.cursor.0.saturating_sub(1),
            KeyCode::Right => self.cursor.0 = (self.cursor.0 + 1).min(GRID - 1),
            KeyCode::Up => self.cursor.1 = self.cursor.1.saturating_sub(1),
            KeyCode::Down => self.cursor.1 = (self.cursor.1 + 1).min(GRID - 1),
            KeyCode::Tab => {
                self.selected = Some(match self.selected {
                    Some(i) => (i + 1) % self.palette.len(),
                    None => 0,
                });
            }
            KeyCode::Char(c @ '1'..='9') => {
                let i = c as usize - '1' as usize;
                if i < self.palette.len() {
                    self.selected = Some(i);
                }
            }
            KeyCode::Char('0') => {
                if self.palette.len() >= 10 {
                    self.selected = Some(9);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.paint(),
            KeyCode::Char('n') => self.start_picture(),
            _ => {}
        }
    }

    fn tick(&mut self, _dt: Duration) {}

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Pixel Pencil  Score: {}  Record: {} ",
            self.score,
            self.high_score.max(self.best)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < GRID as u16 + 3 {
            frame.render_widget(
                Paragraph::new("window too small for the picture").centered(),
                inner,
            );
            return;
        }

        let buf = frame.buffer_mut();
        for y in 0..GRID {
            for x in 0..GRID {
                let tile = &self.tiles[y * GRID + x];
                let cx = inner.x + (x * 2) as u16;
                let cy = inner.y + y as u16;
                if cx + 1 >= inner.right() || cy >= inner.bottom() {
                    continue;
                }
                let mut style = if tile.painted {
                    Style::default().bg(color_of(tile.ch))
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                if (x, y) == self.cursor {
                    style = style.bg(Color::Yellow).fg(Color::Black);
                }
                let sym = if tile.painted { "  " } else { "::" };
                buf.set_string(cx, cy, sym, style);
            }
        }

        let idx = self.cursor.1 * GRID + self.cursor.0;
        let tile = &self.tiles[idx];
        let status = if tile.painted {
            "painted".to_string()
        } else {
            format!("tile: {} = ?", tile.equation)
        };
        let mut palette_spans: Vec<Span> = Vec::new();
        for (i, entry) in self.palette.iter().enumerate() {
            let text = if Some(i) == self.selected {
                format!("[{}] ", entry.answer)
            } else {
                format!(" {}  ", entry.answer)
            };
            palette_spans.push(Span::styled(text, Style::default().fg(color_of(entry.ch))));
        }

        let info = Rect {
            y: inner.y + GRID as u16,
            height: (inner.height - GRID as u16).min(3),
            ..inner
        };
        let lines = vec![
            Line::from(status).fg(Color::Cyan),
            Line::from(palette_spans),
            Line::from(self.message.clone()).bold(),
        ];
        frame.render_widget(Paragraph::new(lines), info);
    }

    fn phase(&self) -> RoundPhase {
        if self.done {
            RoundPhase::Over
        } else {
            RoundPhase::Running
        }
    }

    fn score(&self) -> u32 {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> PencilGame {
        PencilGame::new_with_rng(0, StdRng::seed_from_u64(77))
    }

    fn eval(eq: &str) -> u32 {
        if let Some((a, b)) = eq.split_once('+') {
            a.parse::<u32>().unwrap() + b.parse::<u32>().unwrap()
        } else {
            let (a, b) = eq.split_once('-').unwrap();
            a.parse::<u32>().unwrap() - b.parse::<u32>().unwrap()
        }
    }

    #[test]
    fn test_patterns_are_well_formed() {
        for pattern in &PATTERNS {
            assert_eq!(pattern.rows.len(), GRID);
            for row in pattern.rows {
                assert_eq!(row.len(), GRID, "bad row in {}", pattern.name);
            }
            assert!(!used_chars(pattern).is_empty());
        }
    }

    #[test]
    fn test_palette_covers_every_color_uniquely() {
        let mut rng = StdRng::seed_from_u64(3);
        for pattern in &PATTERNS {
            let chars = used_chars(pattern);
            let (palette, answers) = build_palette(&mut rng, &chars);
            for ch in &chars {
                assert!(answers.contains_key(ch));
            }
            let mut nums: Vec<u32> = palette.iter().map(|e| e.answer).collect();
            nums.sort_unstable();
            nums.dedup();
            assert_eq!(nums.len(), palette.len(), "duplicate palette number");
            assert!(palette.iter().all(|e| (1..=50).contains(&e.answer)));
            // Sorted ascending for display.
            assert!(palette.windows(2).all(|w| w[0].answer < w[1].answer));
        }
    }

    #[test]
    fn test_equations_evaluate_to_their_answer() {
        let mut rng = StdRng::seed_from_u64(8);
        for target in [1u32, 2, 7, 25, 50] {
            for _ in 0..20 {
                let eq = make_equation(&mut rng, target);
                assert_eq!(eval(&eq), target, "{eq} != {target}");
            }
        }
    }

    #[test]
    fn test_every_tile_has_a_consistent_equation() {
        let g = game();
        assert_eq!(g.tiles.len(), GRID * GRID);
        for tile in &g.tiles {
            assert_eq!(eval(&tile.equation), tile.answer);
            assert!(g.palette.iter().any(|e| e.answer == tile.answer));
        }
    }

    #[test]
    fn test_correct_paint_scores() {
        let mut g = game();
        let answer = g.tiles[0].answer;
        let sel = g.palette.iter().position(|e| e.answer == answer).unwrap();
        g.selected = Some(sel);
        g.paint();
        assert!(g.tiles[0].painted);
        assert_eq!(g.score, CORRECT_POINTS);
        // Repainting the same tile does nothing.
        g.paint();
        assert_eq!(g.score, CORRECT_POINTS);
    }

    #[test]
    fn test_wrong_paint_penalizes_with_floor() {
        let mut g = game();
        let answer = g.tiles[0].answer;
        let sel = g.palette.iter().position(|e| e.answer != answer).unwrap();
        g.selected = Some(sel);
        g.paint();
        assert!(!g.tiles[0].painted);
        // Score never goes negative.
        assert_eq!(g.score, 0);

        g.score = 7;
        g.paint();
        assert_eq!(g.score, 2);
    }

    #[test]
    fn test_completing_picture_ends_round() {
        let mut g = game();
        for i in 0..g.tiles.len() {
            let answer = g.tiles[i].answer;
            g.selected = g.palette.iter().position(|e| e.answer == answer);
            g.cursor = (i % GRID, i / GRID);
            g.paint();
        }
        assert!(g.done);
        assert_eq!(g.phase(), RoundPhase::Over);
        assert_eq!(g.score, GRID as u32 * GRID as u32 * CORRECT_POINTS);
    }

    #[test]
    fn test_new_picture_resets_score_but_keeps_best() {
        let mut g = game();
        g.score = 80;
        g.best = 80;
        g.handle_key(KeyEvent::from(KeyCode::Char('n')));
        assert_eq!(g.score, 0);
        assert_eq!(g.score(), 80);
        assert!(!g.done);
    }

    #[test]
    fn test_cursor_stays_on_grid() {
        let mut g = game();
        for _ in 0..20 {
            g.handle_key(KeyEvent::from(KeyCode::Left));
            g.handle_key(KeyEvent::from(KeyCode::Up));
        }
        assert_eq!(g.cursor, (0, 0));
        for _ in 0..40 {
            g.handle_key(KeyEvent::from(KeyCode::Right));
            g.handle_key(KeyEvent::from(KeyCode::Down));
        }
        assert_eq!(g.cursor, (GRID - 1, GRID - 1));
    }

    #[test]
    fn test_tab_cycles_palette_selection() {
        let mut g = game();
        g.handle_key(KeyEvent::from(KeyCode::Tab));
        assert_eq!(g.selected, Some(0));
        for _ in 0..g.palette.len() {
            g.handle_key(KeyEvent::from(KeyCode::Tab));
        }
        assert_eq!(g.selected, Some(0));
    }
}
