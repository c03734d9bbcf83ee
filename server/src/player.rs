//! Player economy and identity colours.

use rand::Rng;
use shared::{PlayerId, PlayerView};
use std::collections::HashSet;

const PALETTE: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
    "#F39C12", "#E74C3C", "#9B59B6", "#3498DB",
];

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub color: String,
    money: u32,
    score: u32,
    lives: u32,
    active: bool,
    pub towers_built: u32,
    pub enemies_defeated: u32,
}

impl Player {
    pub fn new(id: PlayerId, color: String, money: u32, lives: u32) -> Self {
        Self {
            id,
            color,
            money,
            score: 0,
            lives,
            active: lives > 0,
            towers_built: 0,
            enemies_defeated: 0,
        }
    }

    pub fn money(&self) -> u32 {
        self.money
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.money >= amount
    }

    /// Debits `amount` only if the whole sum is available.
    pub fn spend(&mut self, amount: u32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.money -= amount;
        true
    }

    pub fn earn(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Kill payout: the reward counts as both money and score.
    pub fn defeat_enemy(&mut self, reward: u32) {
        self.earn(reward);
        self.add_score(reward);
        self.enemies_defeated += 1;
    }

    /// Returns true on the call that takes the player out of the game.
    pub fn lose_lives(&mut self, amount: u32) -> bool {
        self.lives = self.lives.saturating_sub(amount);
        if self.active && self.lives == 0 {
            self.active = false;
            return true;
        }
        false
    }

    pub fn to_view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            color: self.color.clone(),
            money: self.money,
            score: self.score,
            lives: self.lives,
            towers_built: self.towers_built,
            enemies_defeated: self.enemies_defeated,
            active: self.active,
        }
    }
}

/// Hands out colours that are unique among connected players.
#[derive(Debug, Default)]
pub struct ColorPalette {
    in_use: HashSet<String>,
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free palette colour, or a random one once the palette is used up.
    pub fn assign<R: Rng>(&mut self, rng: &mut R) -> String {
        let color = PALETTE
            .iter()
            .find(|c| !self.in_use.contains(**c))
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("#{:06X}", rng.gen_range(0..=0xFFFFFFu32)));
        self.in_use.insert(color.clone());
        color
    }

    pub fn release(&mut self, color: &str) {
        self.in_use.remove(color);
    }
}
