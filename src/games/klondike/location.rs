use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a card sits on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "loc", content = "index")]
pub enum Location {
    #[default]
    None,
    DrawPile,
    WastePile,
    Foundation(usize),
    Tableau(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::None => write!(f, "None"),
            Location::DrawPile => write!(f, "DrawPile"),
            Location::WastePile => write!(f, "WastePile"),
            Location::Foundation(index) => write!(f, "Foundation.{}", index),
            Location::Tableau(index) => write!(f, "Tableau.{}", index),
        }
    }
}

/// A player asking to move `cards` (first card is the one grabbed) from one
/// location to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub cards: Vec<String>,
    pub from: Location,
    pub to: Location,
}

impl MoveRequest {
    pub fn new(cards: Vec<String>, from: Location, to: Location) -> Self {
        MoveRequest { cards, from, to }
    }

    pub fn single(card: &str, from: Location, to: Location) -> Self {
        MoveRequest::new(vec![card.to_string()], from, to)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    #[default]
    Shuffle,
    Deal,
    Draw,
    ResetWaste,
    Drop,
    DropCancelled,
    AutoMove,
    FixOrientation,
    GameOver,
}

impl ChangeType {
    pub fn reason(&self) -> &'static str {
        match self {
            ChangeType::Shuffle => "shuffling",
            ChangeType::Deal => "dealing",
            ChangeType::Draw => "drawing",
            ChangeType::ResetWaste => "resetting waste",
            ChangeType::Drop => "dropped",
            ChangeType::DropCancelled => "drop cancelled",
            ChangeType::AutoMove => "auto move",
            ChangeType::FixOrientation => "fixing tableau orientations",
            ChangeType::GameOver => "game won",
        }
    }
}

/// Move notification handed to the view layer after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(rename(serialize = "type", deserialize = "type"))]
    pub change_type: ChangeType,
    pub cards: Vec<String>,
    pub from: Location,
    pub to: Location,
}

impl Change {
    pub fn reason(&self) -> &'static str {
        self.change_type.reason()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} -> {}",
            self.reason(),
            self.cards.join(", "),
            self.from,
            self.to
        )
    }
}
