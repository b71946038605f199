use rand::Rng;
use serde::{Deserialize, Serialize};

use arena_core::participant::Position;

use crate::config::CollectConfig;

/// Collectible types. Coins are three times as likely as either of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    Gem,
    Star,
}

impl CollectibleKind {
    pub const ALL: [CollectibleKind; 3] = [
        CollectibleKind::Coin,
        CollectibleKind::Gem,
        CollectibleKind::Star,
    ];

    pub fn points(&self) -> u32 {
        match self {
            CollectibleKind::Coin => 10,
            CollectibleKind::Gem => 25,
            CollectibleKind::Star => 50,
        }
    }

    /// Relative draw weight in the spawn pool.
    pub fn weight(&self) -> u32 {
        match self {
            CollectibleKind::Coin => 3,
            CollectibleKind::Gem => 1,
            CollectibleKind::Star => 1,
        }
    }

    /// Pick a kind from a roll in `0..total_weight()`.
    fn from_roll(mut roll: u32) -> CollectibleKind {
        for kind in Self::ALL {
            if roll < kind.weight() {
                return kind;
            }
            roll -= kind.weight();
        }
        CollectibleKind::Coin
    }

    fn total_weight() -> u32 {
        Self::ALL.iter().map(|k| k.weight()).sum()
    }
}

/// A scorable item in the arena. Once `collected`, it is inert for the rest
/// of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub position: Position,
    pub kind: CollectibleKind,
    pub collected: bool,
}

/// The session's collectibles, generated once and never refilled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectibleField {
    items: Vec<Collectible>,
}

impl CollectibleField {
    /// Place `config.collectible_count` items uniformly inside the interior
    /// margin. Overlapping placements are allowed.
    pub fn generate(rng: &mut impl Rng, config: &CollectConfig) -> Self {
        let (min_x, max_x, min_y, max_y) = config.bounds();
        let total = CollectibleKind::total_weight();
        let items = (0..config.collectible_count)
            .map(|i| Collectible {
                id: i as u32,
                position: Position::new(
                    rng.random_range(min_x..=max_x),
                    rng.random_range(min_y..=max_y),
                ),
                kind: CollectibleKind::from_roll(rng.random_range(0..total)),
                collected: false,
            })
            .collect();
        Self { items }
    }

    pub fn from_items(items: Vec<Collectible>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    /// Items still in play.
    pub fn active(&self) -> impl Iterator<Item = &Collectible> {
        self.items.iter().filter(|c| !c.collected)
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.active().count()
    }

    /// Mark every uncollected item whose center lies closer than `reach` to
    /// `position` as collected and return them. The collected flag is the only
    /// guard against double scoring.
    pub fn collect_within(&mut self, position: Position, reach: f32) -> Vec<Collectible> {
        let mut taken = Vec::new();
        for item in self.items.iter_mut().filter(|c| !c.collected) {
            if position.distance(&item.position) < reach {
                item.collected = true;
                taken.push(item.clone());
            }
        }
        taken
    }
}
