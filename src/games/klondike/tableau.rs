use serde::{Deserialize, Serialize};

use super::card::{Card, KING};
use super::location::Location;
use super::stack::Stack;

pub const DEFAULT_COLUMNS: usize = 7;

/// A single column of the tableau.
/// The first `n_hidden` cards (from the bottom) are face down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableauColumn {
    pub cards: Stack,
    pub n_hidden: usize,
}

impl TableauColumn {
    pub fn new() -> Self {
        TableauColumn::default()
    }

    /// Kings go on empty columns; otherwise opposite color, one rank lower.
    pub fn is_playable(&self, card: &Card) -> bool {
        match self.top_card() {
            None => card.rank() == KING,
            Some(top) => card.color() != top.color() && card.rank() + 1 == top.rank(),
        }
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.cards.peek()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_card_visible(&self, name: &str) -> bool {
        self.cards
            .position(name)
            .map_or(false, |index| index >= self.n_hidden)
    }

    pub fn visible_cards(&self) -> &[Card] {
        &self.cards.cards()[self.n_hidden.min(self.len())..]
    }

    pub fn find_card(&self, name: &str) -> Option<&Card> {
        self.cards.find_card(name)
    }

    pub fn take_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Card> {
        let taken = self.cards.take_by_name(names);
        self.n_hidden = self.n_hidden.min(self.cards.len());
        taken
    }

    pub fn cards_on_top_of(&self, name: &str) -> Vec<Card> {
        self.cards.cards_on_top_of(name)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.n_hidden = 0;
    }

    /// Turns the top card up when every card in the column is hidden.
    /// Returns the card revealed, or `None` if nothing changed.
    pub fn fix_orientations(&mut self) -> Option<Card> {
        if self.cards.is_empty() || self.n_hidden < self.cards.len() {
            return None;
        }
        self.n_hidden = self.cards.len() - 1;
        let top = self.cards.peek_mut()?;
        top.flip_up();
        Some(*top)
    }
}

/// The columns where alternating-color runs are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tableau {
    columns: Vec<TableauColumn>,
}

impl Default for Tableau {
    fn default() -> Self {
        Tableau::new(DEFAULT_COLUMNS)
    }
}

impl Tableau {
    pub fn new(n_columns: usize) -> Self {
        Tableau {
            columns: (0..n_columns).map(|_| TableauColumn::new()).collect(),
        }
    }

    pub fn columns(&self) -> &[TableauColumn] {
        &self.columns
    }

    pub fn column(&self, n: usize) -> Option<&TableauColumn> {
        self.columns.get(n)
    }

    pub fn column_mut(&mut self, n: usize) -> Option<&mut TableauColumn> {
        self.columns.get_mut(n)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_playable(&self, card: &Card, n: usize) -> bool {
        self.columns
            .get(n)
            .map_or(false, |column| column.is_playable(card))
    }

    pub fn where_playable(&self, card: &Card) -> Vec<bool> {
        self.columns.iter().map(|c| c.is_playable(card)).collect()
    }

    pub fn is_card_visible(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.is_card_visible(name))
    }

    pub fn find_card(&self, name: &str) -> Option<(Card, Location)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(index, c)| c.find_card(name).map(|card| (*card, Location::Tableau(index))))
    }

    /// Returns false, adding nothing, if there is no column `n`.
    pub fn add_to_column(&mut self, n: usize, cards: impl IntoIterator<Item = Card>) -> bool {
        match self.columns.get_mut(n) {
            Some(column) => {
                column.cards.add_to_top(cards);
                true
            }
            None => false,
        }
    }

    pub fn take_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Card> {
        self.columns
            .iter_mut()
            .flat_map(|c| c.take_by_name(names))
            .collect()
    }

    pub fn fix_orientations(&mut self, n: usize) -> Vec<Card> {
        self.columns
            .get_mut(n)
            .and_then(|c| c.fix_orientations())
            .into_iter()
            .collect()
    }

    /// Fixes every column, returning each revealed card with its column.
    pub fn fix_all_orientations(&mut self) -> Vec<(usize, Card)> {
        self.columns
            .iter_mut()
            .enumerate()
            .filter_map(|(index, c)| c.fix_orientations().map(|card| (index, card)))
            .collect()
    }

    pub fn ncards(&self) -> usize {
        self.columns.iter().map(|c| c.len()).sum()
    }

    pub fn clear(&mut self) {
        for column in self.columns.iter_mut() {
            column.clear();
        }
    }
}
