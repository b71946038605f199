use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// A registered player profile as held by the remote store.
///
/// The session only ever holds a read-only snapshot; cumulative statistics are
/// rewritten by the finalizer at session end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub color: PlayerColor,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

impl Player {
    /// First character of the username, uppercased, used as the avatar label.
    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

/// Cumulative per-player statistics. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_score: u64,
    pub games_played: u32,
    pub wins: u32,
}

impl PlayerStats {
    /// Statistics after one more finished session with the given score and rank.
    /// A win is counted only for rank 1.
    pub fn accumulate(&self, session_score: u32, rank: usize) -> PlayerStats {
        PlayerStats {
            total_score: self.total_score + u64::from(session_score),
            games_played: self.games_played + 1,
            wins: self.wins + u32::from(rank == 1),
        }
    }
}

/// Avatar color selection. Stored remotely as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// Drawn for participants whose profile has not loaded yet.
    pub const PLACEHOLDER: PlayerColor = PlayerColor {
        r: 136,
        g: 136,
        b: 136,
    };

    /// Predefined palette colors for player selection.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor {
            r: 255,
            g: 87,
            b: 87,
        }, // Red
        PlayerColor {
            r: 78,
            g: 205,
            b: 196,
        }, // Teal
        PlayerColor {
            r: 255,
            g: 195,
            b: 18,
        }, // Yellow
        PlayerColor {
            r: 130,
            g: 88,
            b: 255,
        }, // Purple
        PlayerColor {
            r: 46,
            g: 213,
            b: 115,
        }, // Green
        PlayerColor {
            r: 255,
            g: 148,
            b: 77,
        }, // Orange
        PlayerColor {
            r: 83,
            g: 152,
            b: 255,
        }, // Blue
        PlayerColor {
            r: 255,
            g: 107,
            b: 175,
        }, // Pink
    ];

    /// `#rrggbb` form, usable directly as a CSS color.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for PlayerColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<PlayerColor> for String {
    fn from(color: PlayerColor) -> Self {
        color.to_hex()
    }
}
