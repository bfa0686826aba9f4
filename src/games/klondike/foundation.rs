use enum_iterator::cardinality;
use serde::{Deserialize, Serialize};

use super::card::{Card, Suit, ACE, SUIT_SIZE};
use super::location::Location;
use super::stack::Stack;

/// One ascending, single-suit pile. Aces start it, kings finish it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Foundation {
    pub cards: Stack,
}

impl Foundation {
    pub fn new() -> Self {
        Foundation::default()
    }

    pub fn is_playable(&self, card: &Card) -> bool {
        match self.cards.peek() {
            None => card.rank() == ACE,
            Some(top) => top.suit() == card.suit() && card.rank() == top.rank() + 1,
        }
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.cards.peek()
    }

    pub fn ncards(&self) -> usize {
        self.cards.len()
    }

    pub fn is_full(&self) -> bool {
        self.ncards() == SUIT_SIZE
    }

    pub fn find_card(&self, name: &str) -> Option<&Card> {
        self.cards.find_card(name)
    }

    pub fn take_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Card> {
        self.cards.take_by_name(names)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

/// The four foundations at the top of the board, addressed 0..3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Foundations {
    foundations: Vec<Foundation>,
}

impl Default for Foundations {
    fn default() -> Self {
        Foundations {
            foundations: (0..cardinality::<Suit>()).map(|_| Foundation::new()).collect(),
        }
    }
}

impl Foundations {
    pub fn new() -> Self {
        Foundations::default()
    }

    pub fn len(&self) -> usize {
        self.foundations.len()
    }

    pub fn get(&self, n: usize) -> Option<&Foundation> {
        self.foundations.get(n)
    }

    pub fn get_mut(&mut self, n: usize) -> Option<&mut Foundation> {
        self.foundations.get_mut(n)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Foundation> {
        self.foundations.iter()
    }

    pub fn is_playable(&self, card: &Card, n: usize) -> bool {
        self.foundations
            .get(n)
            .map_or(false, |foundation| foundation.is_playable(card))
    }

    /// Playable mask, one entry per foundation.
    pub fn where_playable(&self, card: &Card) -> Vec<bool> {
        self.foundations.iter().map(|f| f.is_playable(card)).collect()
    }

    pub fn is_card_on_top(&self, name: &str) -> bool {
        self.foundations
            .iter()
            .any(|f| f.top_card().map_or(false, |top| top.is_named(name)))
    }

    pub fn find_card(&self, name: &str) -> Option<(Card, Location)> {
        self.foundations
            .iter()
            .enumerate()
            .find_map(|(index, f)| f.find_card(name).map(|c| (*c, Location::Foundation(index))))
    }

    /// Appends to foundation `n` without checking legality; callers check
    /// `is_playable` first. Returns false, adding nothing, if there is no
    /// foundation `n`.
    pub fn add_to_foundation(&mut self, n: usize, cards: impl IntoIterator<Item = Card>) -> bool {
        match self.foundations.get_mut(n) {
            Some(foundation) => {
                foundation.cards.add_to_top(cards);
                true
            }
            None => false,
        }
    }

    pub fn take_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Card> {
        self.foundations
            .iter_mut()
            .flat_map(|f| f.take_by_name(names))
            .collect()
    }

    pub fn full(&self) -> bool {
        self.foundations.iter().all(|f| f.is_full())
    }

    pub fn ncards(&self) -> usize {
        self.foundations.iter().map(|f| f.ncards()).sum()
    }

    pub fn clear(&mut self) {
        for foundation in self.foundations.iter_mut() {
            foundation.clear();
        }
    }
}
