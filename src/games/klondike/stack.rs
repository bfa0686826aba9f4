use enum_iterator::all;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use super::card::{Card, Suit, ACE, KING};

/// An ordered pile of cards.
///
/// Convention used by every operation:
///   bottom of stack: index 0
///   top of stack: index `len() - 1`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    cards: Vec<Card>,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Stack { cards }
    }

    /// A full, unshuffled deck.
    pub fn deck() -> Self {
        let mut stack = Stack::new();
        stack.fill();
        stack
    }

    /// Clears, then refills with the 52 cards suit by suit, ace to king,
    /// all face down.
    pub fn fill(&mut self) {
        self.clear();
        for suit in all::<Suit>() {
            for rank in ACE..=KING {
                self.cards.push(Card::new(rank, suit));
            }
        }
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
    }

    pub fn peek(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Card> {
        self.cards.last_mut()
    }

    /// Removes up to `n` cards from the top, returned top first.
    pub fn take(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        let mut taken = self.cards.split_off(self.cards.len() - n);
        taken.reverse();
        taken
    }

    pub fn take_all(&mut self) -> Vec<Card> {
        self.take(self.cards.len())
    }

    pub fn add_to_top(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn add_to_bottom(&mut self, cards: impl IntoIterator<Item = Card>) {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        cards.append(&mut self.cards);
        self.cards = cards;
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn at(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn names(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.name()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.is_named(name))
    }

    pub fn find_card(&self, name: &str) -> Option<&Card> {
        self.position(name).map(|i| &self.cards[i])
    }

    /// Removes every card named in `names`. Both the removed and the
    /// remaining cards keep their stack order.
    pub fn take_by_name<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<Card> {
        let (taken, kept): (Vec<Card>, Vec<Card>) = std::mem::take(&mut self.cards)
            .into_iter()
            .partition(|c| names.iter().any(|n| c.is_named(n.as_ref())));
        self.cards = kept;
        taken
    }

    /// Cards strictly above the named card, bottom to top.
    pub fn cards_on_top_of(&self, name: &str) -> Vec<Card> {
        match self.position(name) {
            Some(index) => self.cards[index + 1..].to_vec(),
            None => vec![],
        }
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}
