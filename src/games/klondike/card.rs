use std::fmt;

use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};

pub const SUIT_SIZE: usize = 13;
pub const DECK_SIZE: usize = 52;

pub const ACE: u8 = 1;
pub const JACK: u8 = 11;
pub const QUEEN: u8 = 12;
pub const KING: u8 = 13;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Sequence,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Suit {
    #[default]
    Spades,
    Hearts,
    Clubs,
    Diamonds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Color {
    Red,
    Black,
}

impl Suit {
    pub fn color(&self) -> Color {
        match self {
            Suit::Hearts | Suit::Diamonds => Color::Red,
            Suit::Spades | Suit::Clubs => Color::Black,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Suit::Spades => "spades",
            Suit::Hearts => "hearts",
            Suit::Clubs => "clubs",
            Suit::Diamonds => "diamonds",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A playing card.
///
/// Rank and suit never change once the card exists; only `face_up` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    rank: u8,
    suit: Suit,
    color: Color,
    pub face_up: bool,
}

impl Card {
    pub fn new(rank: u8, suit: Suit) -> Self {
        debug_assert!((ACE..=KING).contains(&rank), "rank out of range: {}", rank);
        Card {
            rank,
            suit,
            color: suit.color(),
            face_up: false,
        }
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Identity string, unique within a deck (`"hearts1"`, `"spades13"`).
    pub fn name(&self) -> String {
        format!("{}{}", self.suit.name(), self.rank)
    }

    /// Inverse of [`Card::name`]. The returned card is face down.
    pub fn parse_name(name: &str) -> Option<Card> {
        all::<Suit>().find_map(|suit| {
            let rank: u8 = name.strip_prefix(suit.name())?.parse().ok()?;
            if (ACE..=KING).contains(&rank) {
                Some(Card::new(rank, suit))
            } else {
                None
            }
        })
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name() == name
    }

    pub fn flip_up(&mut self) {
        self.face_up = true;
    }

    pub fn flip_down(&mut self) {
        self.face_up = false;
    }

    fn rank_label(&self) -> String {
        match self.rank {
            ACE => "A".to_string(),
            JACK => "J".to_string(),
            QUEEN => "Q".to_string(),
            KING => "K".to_string(),
            n => n.to_string(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_label(), self.suit.symbol())
    }
}
