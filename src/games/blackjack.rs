//! Race to 21: players alternately add 1-3 to a shared count, and whoever
//! lands exactly on 21 takes the pot. The wallet is the score.

use crate::config::Difficulty;
use crate::games::{MiniGame, RoundPhase};
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

const TARGET: u32 = 21;
const STARTING_WALLET: u32 = 500;
const LOAN_AMOUNT: u32 = 500;
const LOAN_THRESHOLD: u32 = 100;
const DEALER_THINK: Duration = Duration::from_millis(1000);
const DEALER_SLIP_CHANCE: f64 = 0.4;
const LOG_LINES: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Table {
    Betting,
    Playing { player_turn: bool },
    HandOver { player_won: bool },
}

/// Moves available at a given count: 1 up to 3, capped by the distance
/// to 21 so the count can never overshoot.
fn possible_moves(total: u32) -> Vec<u32> {
    (1..=3.min(TARGET - total)).collect()
}

/// The winning counts are 1, 5, 9, ... 21; land on one when a move
/// allows it, otherwise guess.
fn dealer_move(rng: &mut impl Rng, total: u32, rookie: bool) -> u32 {
    let possible = possible_moves(total);
    if rookie && rng.gen_bool(DEALER_SLIP_CHANCE) {
        return possible[rng.gen_range(0..possible.len())];
    }
    for &m in &possible {
        if (total + m - 1) % 4 == 0 {
            return m;
        }
    }
    possible[rng.gen_range(0..possible.len())]
}

pub struct BlackjackGame {
    rng: StdRng,
    rookie: bool,
    wallet: u32,
    best_wallet: u32,
    high_score: u32,
    bet: u32,
    streak: u32,
    total: u32,
    table: Table,
    think_acc: Duration,
    log: Vec<String>,
}

impl BlackjackGame {
    pub fn new(difficulty: Difficulty, high_score: u32) -> Self {
        Self::new_with_rng(difficulty, high_score, StdRng::from_entropy())
    }

    pub fn new_with_rng(difficulty: Difficulty, high_score: u32, rng: StdRng) -> Self {
        BlackjackGame {
            rng,
            rookie: difficulty == Difficulty::Easy,
            wallet: STARTING_WALLET,
            best_wallet: STARTING_WALLET,
            high_score,
            bet: 0,
            streak: 0,
            total: 0,
            table: Table::Betting,
            think_acc: Duration::ZERO,
            log: vec!["Welcome to the high stakes table...".to_string()],
        }
    }

    fn log(&mut self, msg: impl Into<String>) {
        self.log.push(msg.into());
        if self.log.len() > LOG_LINES {
            self.log.remove(0);
        }
    }

    fn place_bet(&mut self, amount: u32) {
        if amount == 0 || self.wallet < amount {
            self.log("Insufficient funds!");
            return;
        }
        self.wallet -= amount;
        self.bet = amount;
        self.total = 0;
        self.table = Table::Playing { player_turn: true };
        self.log(format!("New hand, bet ${amount}. Your turn."));
    }

    fn take_loan(&mut self) {
        if self.wallet < LOAN_THRESHOLD {
            self.wallet += LOAN_AMOUNT;
            self.best_wallet = self.best_wallet.max(self.wallet);
            self.log(format!("Bank loan approved (+${LOAN_AMOUNT})"));
        } else {
            self.log("Loan denied: you have enough funds!");
        }
    }

    fn apply_move(&mut self, value: u32, player: bool) {
        self.total += value;
        if player {
            self.log(format!("You played {value}. Count is {}.", self.total));
        } else {
            self.log(format!("Dealer played {value}. Count is {}.", self.total));
        }

        if self.total == TARGET {
            self.finish_hand(player);
        } else {
            self.table = Table::Playing {
                player_turn: !player,
            };
            self.think_acc = Duration::ZERO;
        }
    }

    fn finish_hand(&mut self, player_won: bool) {
        if player_won {
            // Hot streaks pay 2.5x instead of the usual 2x.
            let winnings = if self.streak >= 2 {
                self.bet * 5 / 2
            } else {
                self.bet * 2
            };
            self.wallet += winnings;
            self.best_wallet = self.best_wallet.max(self.wallet);
            self.streak += 1;
            self.log(format!("You reached 21! Won ${winnings}."));
            info!("hand won, wallet {} streak {}", self.wallet, self.streak);
        } else {
            self.streak = 0;
            self.log("Dealer reached 21. Streak reset.");
        }
        self.table = Table::HandOver { player_won };
    }
}

impl MiniGame for BlackjackGame {
    fn handle_key(&mut self, key: KeyEvent) {
        match self.table {
            Table::Betting => match key.code {
                KeyCode::Char('1') => self.place_bet(10),
                KeyCode::Char('2') => self.place_bet(50),
                KeyCode::Char('3') => self.place_bet(100),
                KeyCode::Char('a') => self.place_bet(self.wallet),
                KeyCode::Char('l') => self.take_loan(),
                _ => {}
            },
            Table::Playing { player_turn: true } => {
                if let KeyCode::Char(c @ '1'..='3') = key.code {
                    let value = c as u32 - '0' as u32;
                    if possible_moves(self.total).contains(&value) {
                        self.apply_move(value, true);
                    }
                }
            }
            Table::Playing { player_turn: false } => {}
            Table::HandOver { .. } => {
                if key.code == KeyCode::Char('n') {
                    self.bet = 0;
                    self.total = 0;
                    self.table = Table::Betting;
                }
            }
        }
    }

    fn tick(&mut self, dt: Duration) {
        if self.table != (Table::Playing { player_turn: false }) {
            return;
        }
        self.think_acc += dt;
        if self.think_acc >= DEALER_THINK {
            let m = dealer_move(&mut self.rng, self.total, self.rookie);
            self.apply_move(m, false);
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Race to 21 [{}]  Bank: ${}  Best: ${} ",
            if self.rookie { "Rookie" } else { "Pro" },
            self.wallet,
            self.high_score.max(self.best_wallet)
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(format!("COUNT: {}", self.total)).bold().fg(
                match self.table {
                    Table::HandOver { player_won: true } => Color::Green,
                    Table::HandOver { player_won: false } => Color::Red,
                    _ => Color::White,
                },
            ),
            Line::from(format!("Bet: ${}   Streak: {}", self.bet, self.streak))
                .fg(Color::Yellow),
            Line::default(),
        ];
        for msg in &self.log {
            lines.push(Line::from(format!("> {msg}")).fg(Color::Gray));
        }
        lines.push(Line::default());
        lines.push(match self.table {
            Table::Betting => {
                Line::from("[1] $10  [2] $50  [3] $100  [a]ll in  [l]oan").fg(Color::Cyan)
            }
            Table::Playing { player_turn: true } => Line::from(format!(
                "Add to count: {:?}",
                possible_moves(self.total)
            ))
            .fg(Color::Cyan),
            Table::Playing { player_turn: false } => Line::from("Dealer is thinking..."),
            Table::HandOver { .. } => Line::from("[n]ew hand").fg(Color::Cyan),
        });
        frame.render_widget(Paragraph::new(lines).centered(), inner);
    }

    fn phase(&self) -> RoundPhase {
        match self.table {
            Table::HandOver { .. } => RoundPhase::Over,
            _ => RoundPhase::Running,
        }
    }

    fn score(&self) -> u32 {
        self.best_wallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> BlackjackGame {
        BlackjackGame::new_with_rng(Difficulty::Hard, 0, StdRng::seed_from_u64(11))
    }

    fn press(g: &mut BlackjackGame, c: char) {
        g.handle_key(KeyEvent::from(KeyCode::Char(c)));
    }

    #[test]
    fn test_possible_moves_capped_near_target() {
        assert_eq!(possible_moves(0), vec![1, 2, 3]);
        assert_eq!(possible_moves(18), vec![1, 2, 3]);
        assert_eq!(possible_moves(19), vec![1, 2]);
        assert_eq!(possible_moves(20), vec![1]);
    }

    #[test]
    fn test_dealer_takes_winning_move_at_eighteen() {
        // From 18 the pro dealer plays 3 and lands on 21.
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(dealer_move(&mut rng, 18, false), 3);
    }

    #[test]
    fn test_dealer_seeks_winning_counts() {
        // 1, 5, 9, 13, 17 are the counts the pro dealer lands on.
        let mut rng = StdRng::seed_from_u64(0);
        for total in [2u32, 6, 10, 14] {
            let m = dealer_move(&mut rng, total, false);
            assert_eq!((total + m - 1) % 4, 0, "from {total} played {m}");
        }
    }

    #[test]
    fn test_pro_dealer_wins_whenever_count_is_off_the_ladder() {
        // Counts of the form 4k+1 win for the side that just landed there.
        // With any other count on its turn, the pro dealer climbs the
        // ladder and the player can never reach 21.
        for start in [0u32, 2, 3, 4] {
            for player_choice in [1u32, 2, 3] {
                let mut rng = StdRng::seed_from_u64(3);
                let mut total = start;
                loop {
                    let m = dealer_move(&mut rng, total, false);
                    total += m;
                    if total == TARGET {
                        break;
                    }
                    let take = player_choice.min(3.min(TARGET - total));
                    total += take;
                    assert_ne!(total, TARGET, "player won after choosing {player_choice}");
                }
            }
        }
    }

    #[test]
    fn test_bet_and_win_pays_double() {
        let mut g = game();
        press(&mut g, '3');
        assert_eq!(g.wallet, 400);
        assert_eq!(g.bet, 100);
        g.total = 18;
        press(&mut g, '3');
        assert_eq!(g.phase(), RoundPhase::Over);
        assert_eq!(g.wallet, 600);
        assert_eq!(g.streak, 1);
        assert_eq!(g.score(), 600);
    }

    #[test]
    fn test_streak_pays_bonus() {
        let mut g = game();
        g.streak = 2;
        press(&mut g, '1');
        g.total = 18;
        press(&mut g, '3');
        // 10 bet, 2.5x payout.
        assert_eq!(g.wallet, STARTING_WALLET - 10 + 25);
        assert_eq!(g.streak, 3);
    }

    #[test]
    fn test_dealer_win_resets_streak() {
        let mut g = game();
        g.streak = 4;
        press(&mut g, '1');
        g.total = 18;
        g.table = Table::Playing { player_turn: false };
        g.tick(DEALER_THINK);
        assert_eq!(g.total, TARGET);
        assert_eq!(g.streak, 0);
        assert_eq!(g.phase(), RoundPhase::Over);
        // Lost the bet; wallet stays down.
        assert_eq!(g.wallet, STARTING_WALLET - 10);
    }

    #[test]
    fn test_cannot_bet_more_than_wallet() {
        let mut g = game();
        g.wallet = 40;
        press(&mut g, '2');
        assert_eq!(g.wallet, 40);
        assert_eq!(g.table, Table::Betting);
    }

    #[test]
    fn test_loan_only_when_broke() {
        let mut g = game();
        press(&mut g, 'l');
        assert_eq!(g.wallet, STARTING_WALLET);
        g.wallet = 60;
        press(&mut g, 'l');
        assert_eq!(g.wallet, 560);
    }

    #[test]
    fn test_all_in() {
        let mut g = game();
        press(&mut g, 'a');
        assert_eq!(g.wallet, 0);
        assert_eq!(g.bet, STARTING_WALLET);
    }

    #[test]
    fn test_moves_rejected_off_turn_and_out_of_range() {
        let mut g = game();
        press(&mut g, '1');
        g.total = 20;
        press(&mut g, '3');
        assert_eq!(g.total, 20);
        press(&mut g, '1');
        assert_eq!(g.total, TARGET);
    }

    #[test]
    fn test_new_hand_returns_to_betting() {
        let mut g = game();
        press(&mut g, '1');
        g.total = 18;
        press(&mut g, '3');
        press(&mut g, 'n');
        assert_eq!(g.table, Table::Betting);
        assert_eq!(g.total, 0);
        assert_eq!(g.bet, 0);
    }

    #[test]
    fn test_score_tracks_best_wallet_not_current() {
        let mut g = game();
        g.wallet = 900;
        g.best_wallet = 900;
        press(&mut g, 'a');
        assert_eq!(g.wallet, 0);
        assert_eq!(g.score(), 900);
    }
}
