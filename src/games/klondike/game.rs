use std::fmt;
use std::iter;

use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::card::Card;
use super::error::{KlondikeError, Rejection, Result};
use super::foundation::Foundations;
use super::location::{Change, ChangeType, Location, MoveRequest};
use super::settings::Settings;
use super::stack::Stack;
use super::tableau::Tableau;

pub type MoveHook = Box<dyn FnMut(&Change)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    Rejected(Rejection),
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub cards: Vec<String>,
    pub n_hidden: usize,
}

/// Plain copy of the board for rendering. Draw pile cards are face down,
/// everything else except the hidden part of each column is face up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub draw_pile: Vec<String>,
    pub waste_pile: Vec<String>,
    pub foundations: Vec<Vec<String>>,
    pub columns: Vec<ColumnView>,
    pub won: bool,
}

/// A game of Klondike: draw pile, waste pile, four foundations and the
/// tableau. Every state change is reported as a [`Change`] to the move hook
/// and, unless disabled, recorded in `changes` for the view to animate.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KlondikeGame {
    settings: Settings,
    draw_pile: Stack,
    waste_pile: Stack,
    foundations: Foundations,
    tableau: Tableau,
    pub changes: Vec<Vec<Change>>,
    no_changes: bool,
    game_over_sent: bool,
    #[serde(skip)]
    rng: StdRng,
    #[serde(skip)]
    move_hook: Option<MoveHook>,
}

impl fmt::Debug for KlondikeGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KlondikeGame")
            .field("settings", &self.settings)
            .field("draw_pile", &self.draw_pile)
            .field("waste_pile", &self.waste_pile)
            .field("foundations", &self.foundations)
            .field("tableau", &self.tableau)
            .field("no_changes", &self.no_changes)
            .field("has_move_hook", &self.move_hook.is_some())
            .finish()
    }
}

impl KlondikeGame {
    /// Builds and deals a new game. Fails on invalid settings or a broken
    /// deal; neither can be recovered from.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = KlondikeGame {
            tableau: Tableau::new(settings.n_columns),
            settings,
            draw_pile: Stack::new(),
            waste_pile: Stack::new(),
            foundations: Foundations::new(),
            changes: Vec::new(),
            no_changes: false,
            game_over_sent: false,
            rng,
            move_hook: None,
        };
        game.setup()?;
        Ok(game)
    }

    /// Stop recording `changes` (the move hook still fires). Used when
    /// nothing is going to animate, e.g. simulations.
    pub fn with_no_changes(&mut self) {
        self.no_changes = true;
        self.changes.clear();
    }

    pub fn set_move_hook(&mut self, hook: impl FnMut(&Change) + 'static) {
        self.move_hook = Some(Box::new(hook));
    }

    pub fn take_changes(&mut self) -> Vec<Vec<Change>> {
        std::mem::take(&mut self.changes)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn draw_pile(&self) -> &Stack {
        &self.draw_pile
    }

    pub fn waste_pile(&self) -> &Stack {
        &self.waste_pile
    }

    pub fn foundations(&self) -> &Foundations {
        &self.foundations
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    /// Shuffles a fresh deck and deals the triangular layout. Safe to call
    /// again to restart.
    pub fn setup(&mut self) -> Result<()> {
        self.changes.clear();
        self.game_over_sent = false;

        self.draw_pile.fill();
        self.draw_pile.shuffle(&mut self.rng);
        self.send_change(
            ChangeType::Shuffle,
            self.draw_pile.names(),
            Location::DrawPile,
            Location::DrawPile,
        );

        self.waste_pile.clear();
        self.foundations.clear();
        self.tableau = Tableau::new(self.settings.n_columns);

        let n_columns = self.tableau.len();
        for row in 0..n_columns {
            for column_index in row..n_columns {
                let Some(column) = self.tableau.column_mut(column_index) else {
                    continue;
                };
                let mut card = self
                    .draw_pile
                    .take(1)
                    .pop()
                    .ok_or(KlondikeError::DeckExhausted {
                        column: column_index,
                        row,
                    })?;
                let cards_in_column = column_index + 1;
                if row != cards_in_column - 1 {
                    column.n_hidden += 1;
                } else {
                    card.flip_up();
                }
                column.cards.add_to_top(iter::once(card));
                self.send_change(
                    ChangeType::Deal,
                    vec![card.name()],
                    Location::DrawPile,
                    Location::Tableau(column_index),
                );
            }
        }
        info!(
            "dealt {} columns, {} cards left to draw",
            n_columns,
            self.draw_pile.len()
        );
        Ok(())
    }

    /// Moves up to `draw_rate` cards from the draw pile onto the waste pile.
    /// Returns how many cards moved.
    pub fn draw_step(&mut self) -> usize {
        self.changes.clear();
        let mut drawn = self.draw_pile.take(self.settings.draw_rate);
        if drawn.is_empty() {
            return 0;
        }
        for card in drawn.iter_mut() {
            card.flip_up();
        }
        let names: Vec<String> = drawn.iter().map(|c| c.name()).collect();
        let count = drawn.len();
        self.waste_pile.add_to_top(drawn);
        debug!("drew {:?}", names);
        self.send_change(
            ChangeType::Draw,
            names,
            Location::DrawPile,
            Location::WastePile,
        );
        count
    }

    /// Turns the waste pile back over into the draw pile once the draw pile
    /// is empty. Drawing again replays the cards in the same order.
    pub fn reset_waste_pile(&mut self) -> bool {
        self.changes.clear();
        if !self.draw_pile.is_empty() || self.waste_pile.is_empty() {
            return false;
        }
        let mut cards = self.waste_pile.take_all();
        for card in cards.iter_mut() {
            card.flip_down();
        }
        let names: Vec<String> = cards.iter().map(|c| c.name()).collect();
        self.draw_pile.add_to_top(cards);
        debug!("reset {} cards from the waste pile", names.len());
        self.send_change(
            ChangeType::ResetWaste,
            names,
            Location::WastePile,
            Location::DrawPile,
        );
        true
    }

    /// What a tap on the draw pile does: draw, or recycle the waste pile when
    /// there is nothing left to draw.
    pub fn tap_draw_pile(&mut self) -> bool {
        if self.draw_pile.is_empty() {
            self.reset_waste_pile()
        } else {
            self.draw_step() > 0
        }
    }

    /// Validates and performs a move made by the player dragging cards.
    /// Rejected moves leave the board untouched and send the cards back.
    pub fn handle_move_by_hand(&mut self, request: &MoveRequest) -> MoveOutcome {
        self.changes.clear();
        match self.validate_hand_move(request) {
            Ok(()) => {
                debug!(
                    "accepted move {:?} {} -> {}",
                    request.cards, request.from, request.to
                );
                self.execute_move(&request.cards, request.from, request.to, ChangeType::Drop);
                MoveOutcome::Accepted
            }
            Err(rejection) => {
                debug!(
                    "rejected move {:?} {} -> {}: {}",
                    request.cards, request.from, request.to, rejection
                );
                self.send_change(
                    ChangeType::DropCancelled,
                    request.cards.clone(),
                    Location::None,
                    request.from,
                );
                MoveOutcome::Rejected(rejection)
            }
        }
    }

    fn validate_hand_move(&self, request: &MoveRequest) -> std::result::Result<(), Rejection> {
        let first = request.cards.first().ok_or(Rejection::EmptyRequest)?;
        let (card, location) = self
            .find_card(first)
            .ok_or_else(|| Rejection::CardNotFound(first.clone()))?;
        self.check_source(first, location, request)?;
        self.check_destination(&card, request)
    }

    fn check_source(
        &self,
        name: &str,
        location: Location,
        request: &MoveRequest,
    ) -> std::result::Result<(), Rejection> {
        let single_top_card = |top: Option<&Card>| {
            if !top.map_or(false, |c| c.is_named(name)) {
                Err(Rejection::NotOnTop(name.to_string()))
            } else if request.cards.len() != 1 {
                Err(Rejection::GroupMismatch)
            } else {
                Ok(())
            }
        };
        if matches!(request.from, Location::WastePile | Location::Foundation(_) | Location::Tableau(_))
            && location != request.from
        {
            return Err(Rejection::NotAtSource(name.to_string()));
        }
        match request.from {
            Location::DrawPile | Location::None => Err(Rejection::IllegalSource),
            Location::WastePile => single_top_card(self.waste_pile.peek()),
            Location::Foundation(n) => {
                single_top_card(self.foundations.get(n).and_then(|f| f.top_card()))
            }
            Location::Tableau(n) => {
                let column = self
                    .tableau
                    .column(n)
                    .ok_or_else(|| Rejection::NotAtSource(name.to_string()))?;
                if !column.is_card_visible(name) {
                    return Err(Rejection::CardHidden(name.to_string()));
                }
                let group: Vec<String> = iter::once(name.to_string())
                    .chain(column.cards_on_top_of(name).iter().map(|c| c.name()))
                    .collect();
                if group != request.cards {
                    return Err(Rejection::GroupMismatch);
                }
                Ok(())
            }
        }
    }

    fn check_destination(
        &self,
        card: &Card,
        request: &MoveRequest,
    ) -> std::result::Result<(), Rejection> {
        if request.to == request.from {
            return Err(Rejection::SameLocation);
        }
        match request.to {
            Location::DrawPile | Location::WastePile => {
                warn!("moving cards onto the draw or waste pile by hand would be an undo; not supported");
                Err(Rejection::IllegalDestination)
            }
            Location::None => Err(Rejection::IllegalDestination),
            Location::Tableau(n) => {
                if n >= self.tableau.len() {
                    Err(Rejection::IllegalDestination)
                } else if self.tableau.is_playable(card, n) {
                    Ok(())
                } else {
                    Err(Rejection::RuleViolation(card.name()))
                }
            }
            Location::Foundation(n) => {
                if n >= self.foundations.len() {
                    Err(Rejection::IllegalDestination)
                } else if request.cards.len() == 1 && self.foundations.is_playable(card, n) {
                    Ok(())
                } else {
                    Err(Rejection::RuleViolation(card.name()))
                }
            }
        }
    }

    /// Tries to play an exposed card somewhere useful: foundations first,
    /// then the tableau, carrying any cards stacked on it.
    pub fn auto_play(&mut self, name: &str) -> bool {
        self.changes.clear();
        self.try_auto_play(name)
    }

    fn try_auto_play(&mut self, name: &str) -> bool {
        let Some((card, from)) = self.find_card(name) else {
            return false;
        };
        if !self.is_exposed(name, from) {
            return false;
        }
        let on_top: Vec<String> = match from {
            Location::Tableau(n) => self
                .tableau
                .column(n)
                .map(|c| c.cards_on_top_of(name).iter().map(|c| c.name()).collect())
                .unwrap_or_default(),
            _ => vec![],
        };

        if on_top.is_empty() && !matches!(from, Location::Foundation(_)) {
            if let Some(n) = self.foundations.where_playable(&card).iter().position(|&p| p) {
                self.execute_move(
                    &[name.to_string()],
                    from,
                    Location::Foundation(n),
                    ChangeType::AutoMove,
                );
                return true;
            }
        }

        let destination = self
            .tableau
            .where_playable(&card)
            .into_iter()
            .enumerate()
            .find(|&(n, playable)| playable && Location::Tableau(n) != from)
            .map(|(n, _)| Location::Tableau(n));
        if let Some(to) = destination {
            let names: Vec<String> = iter::once(name.to_string()).chain(on_top).collect();
            self.execute_move(&names, from, to, ChangeType::AutoMove);
            return true;
        }
        false
    }

    /// Sends every exposed waste and tableau card that fits onto the
    /// foundations, repeating until nothing moves. Returns the number of
    /// cards moved.
    pub fn auto_finish(&mut self) -> usize {
        self.changes.clear();
        let mut moved = 0;
        loop {
            let candidate = self.exposed_top_cards().into_iter().find_map(|(card, from)| {
                self.foundations
                    .where_playable(&card)
                    .iter()
                    .position(|&p| p)
                    .map(|n| (card.name(), from, Location::Foundation(n)))
            });
            let Some((name, from, to)) = candidate else {
                break;
            };
            self.execute_move(&[name], from, to, ChangeType::AutoMove);
            moved += 1;
        }
        moved
    }

    /// The waste top and each tableau column's top card, if face up.
    pub fn exposed_top_cards(&self) -> Vec<(Card, Location)> {
        let waste = self
            .waste_pile
            .peek()
            .map(|card| (*card, Location::WastePile));
        let columns = self
            .tableau
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, column)| column.len() > column.n_hidden)
            .filter_map(|(n, column)| column.top_card().map(|card| (*card, Location::Tableau(n))));
        waste.into_iter().chain(columns).collect()
    }

    pub fn fix_all_orientations(&mut self) -> Vec<Card> {
        self.changes.clear();
        let revealed = self.tableau.fix_all_orientations();
        for (n, card) in revealed.iter() {
            self.send_change(
                ChangeType::FixOrientation,
                vec![card.name()],
                Location::Tableau(*n),
                Location::Tableau(*n),
            );
        }
        revealed.into_iter().map(|(_, card)| card).collect()
    }

    pub fn won(&self) -> bool {
        self.foundations.full()
    }

    /// Locates a card anywhere on the board.
    pub fn find_card(&self, name: &str) -> Option<(Card, Location)> {
        self.draw_pile
            .find_card(name)
            .map(|c| (*c, Location::DrawPile))
            .or_else(|| self.waste_pile.find_card(name).map(|c| (*c, Location::WastePile)))
            .or_else(|| self.foundations.find_card(name))
            .or_else(|| self.tableau.find_card(name))
    }

    /// Every card on the board, pile by pile.
    pub fn all_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = Vec::new();
        cards.extend(self.draw_pile.iter());
        cards.extend(self.waste_pile.iter());
        for foundation in self.foundations.iter() {
            cards.extend(foundation.cards.iter());
        }
        for column in self.tableau.columns() {
            cards.extend(column.cards.iter());
        }
        cards
    }

    pub fn snapshot(&self) -> GameView {
        GameView {
            draw_pile: self.draw_pile.names(),
            waste_pile: self.waste_pile.names(),
            foundations: self.foundations.iter().map(|f| f.cards.names()).collect(),
            columns: self
                .tableau
                .columns()
                .iter()
                .map(|c| ColumnView {
                    cards: c.cards.names(),
                    n_hidden: c.n_hidden,
                })
                .collect(),
            won: self.won(),
        }
    }

    /// Replaces the board with a hand-built position. Face-down cards at
    /// the bottom of each column count as hidden.
    #[cfg(test)]
    pub(crate) fn load_layout(
        &mut self,
        draw_pile: Vec<Card>,
        waste_pile: Vec<Card>,
        columns: Vec<Vec<Card>>,
    ) {
        self.draw_pile = Stack::from_cards(draw_pile);
        self.waste_pile = Stack::from_cards(waste_pile);
        self.foundations.clear();
        self.tableau.clear();
        for (n, cards) in columns.into_iter().enumerate() {
            if let Some(column) = self.tableau.column_mut(n) {
                column.n_hidden = cards.iter().take_while(|c| !c.face_up).count();
                column.cards = Stack::from_cards(cards);
            }
        }
        self.changes.clear();
        self.game_over_sent = false;
    }

    /// True when the card may be picked up from where it lies.
    fn is_exposed(&self, name: &str, location: Location) -> bool {
        match location {
            Location::DrawPile | Location::None => false,
            Location::WastePile => self.waste_pile.peek().map_or(false, |c| c.is_named(name)),
            Location::Foundation(_) => self.foundations.is_card_on_top(name),
            Location::Tableau(n) => self
                .tableau
                .column(n)
                .map_or(false, |c| c.is_card_visible(name)),
        }
    }

    fn take_from(&mut self, from: Location, names: &[String]) -> Vec<Card> {
        match from {
            Location::DrawPile => self.draw_pile.take_by_name(names),
            Location::WastePile => self.waste_pile.take_by_name(names),
            Location::Foundation(n) => self
                .foundations
                .get_mut(n)
                .map(|f| f.take_by_name(names))
                .unwrap_or_default(),
            Location::Tableau(n) => self
                .tableau
                .column_mut(n)
                .map(|c| c.take_by_name(names))
                .unwrap_or_default(),
            Location::None => vec![],
        }
    }

    fn pile_mut(&mut self, location: Location) -> Option<&mut Stack> {
        match location {
            Location::DrawPile => Some(&mut self.draw_pile),
            Location::WastePile => Some(&mut self.waste_pile),
            Location::Foundation(n) => self.foundations.get_mut(n).map(|f| &mut f.cards),
            Location::Tableau(n) => self.tableau.column_mut(n).map(|c| &mut c.cards),
            Location::None => None,
        }
    }

    /// Moves already-validated cards, then reveals whatever the move
    /// uncovered and checks for the win.
    fn execute_move(
        &mut self,
        names: &[String],
        from: Location,
        to: Location,
        change_type: ChangeType,
    ) {
        let cards = self.take_from(from, names);
        if cards.is_empty() {
            return;
        }
        let moved: Vec<String> = cards.iter().map(|c| c.name()).collect();
        match self.pile_mut(to) {
            Some(pile) => pile.add_to_top(cards),
            None => {
                error!("no pile at {}; returning {:?} to {}", to, moved, from);
                if let Some(pile) = self.pile_mut(from) {
                    pile.add_to_top(cards);
                }
                return;
            }
        }
        self.send_change(change_type, moved, from, to);

        if let Location::Tableau(n) = from {
            for card in self.tableau.fix_orientations(n) {
                self.send_change(
                    ChangeType::FixOrientation,
                    vec![card.name()],
                    from,
                    from,
                );
            }
        }
        self.check_game_over();
    }

    fn check_game_over(&mut self) {
        if self.game_over_sent || !self.won() {
            return;
        }
        self.game_over_sent = true;
        info!("all foundations complete");
        self.send_change(ChangeType::GameOver, vec![], Location::None, Location::None);
    }

    fn send_change(
        &mut self,
        change_type: ChangeType,
        cards: Vec<String>,
        from: Location,
        to: Location,
    ) {
        let change = Change {
            change_type,
            cards,
            from,
            to,
        };
        if let Some(hook) = self.move_hook.as_mut() {
            hook(&change);
        }
        if !self.no_changes {
            self.changes.push(vec![change]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::klondike::card::{Suit, DECK_SIZE, KING};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn new_game() -> KlondikeGame {
        KlondikeGame::new(Settings::with_seed(42)).unwrap()
    }

    /// A dealt game with every pile emptied, for hand-built positions.
    fn cleared_game() -> KlondikeGame {
        let mut game = new_game();
        game.draw_pile.clear();
        game.waste_pile.clear();
        game.foundations.clear();
        game.tableau.clear();
        game.changes.clear();
        game
    }

    fn up(rank: u8, suit: Suit) -> Card {
        let mut card = Card::new(rank, suit);
        card.flip_up();
        card
    }

    fn flat_changes(game: &KlondikeGame) -> Vec<Change> {
        game.changes.iter().flatten().cloned().collect()
    }

    fn assert_conserved(game: &KlondikeGame) {
        let names: HashSet<String> = game.all_cards().iter().map(|c| c.name()).collect();
        assert_eq!(game.all_cards().len(), DECK_SIZE);
        assert_eq!(names.len(), DECK_SIZE);
    }

    #[test]
    fn test_fresh_setup_deals_triangle() {
        let game = new_game();
        assert_eq!(game.tableau.ncards(), 28);
        assert_eq!(game.draw_pile.len(), 24);
        assert!(game.waste_pile.is_empty());
        assert_eq!(game.foundations.ncards(), 0);
        for (n, column) in game.tableau.columns().iter().enumerate() {
            assert_eq!(column.len(), n + 1);
            assert_eq!(column.n_hidden, n);
            assert!(column.top_card().unwrap().face_up);
            assert!(column.cards.iter().take(n).all(|c| !c.face_up));
        }
        assert!(!game.won());
        assert_conserved(&game);
    }

    #[test]
    fn test_setup_notifications() {
        let game = new_game();
        let changes = flat_changes(&game);
        assert_eq!(changes.len(), 1 + 28);
        assert_eq!(changes[0].change_type, ChangeType::Shuffle);
        assert_eq!(changes[0].cards.len(), DECK_SIZE);
        let deals: Vec<&Change> = changes[1..].iter().collect();
        assert!(deals.iter().all(|c| c.reason() == "dealing" && c.from == Location::DrawPile));
        // first row goes across all seven columns
        let first_row: Vec<Location> = deals[..7].iter().map(|c| c.to).collect();
        assert_eq!(first_row, (0..7).map(Location::Tableau).collect::<Vec<_>>());
        assert_eq!(deals.last().unwrap().to, Location::Tableau(6));
    }

    #[test]
    fn test_setup_twice_is_still_a_valid_deal() {
        let mut game = new_game();
        game.draw_step();
        game.auto_finish();
        let first = game.snapshot();
        game.setup().unwrap();
        game.setup().unwrap();
        assert_conserved(&game);
        assert_eq!(game.tableau.ncards(), 28);
        assert_eq!(game.draw_pile.len(), 24);
        assert_ne!(game.snapshot(), first);
    }

    #[test]
    fn test_seed_reproduces_deal() {
        assert_eq!(new_game().snapshot(), new_game().snapshot());
        let other = KlondikeGame::new(Settings::with_seed(43)).unwrap();
        assert_ne!(new_game().snapshot(), other.snapshot());
    }

    #[test]
    fn test_invalid_settings_abort_construction() {
        let settings = Settings {
            n_columns: 12,
            ..Settings::with_seed(1)
        };
        assert!(matches!(
            KlondikeGame::new(settings),
            Err(KlondikeError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_nine_columns_use_45_cards() {
        let settings = Settings {
            n_columns: 9,
            ..Settings::with_seed(5)
        };
        let game = KlondikeGame::new(settings).unwrap();
        assert_eq!(game.tableau.ncards(), 45);
        assert_eq!(game.draw_pile.len(), 7);
    }

    #[test]
    fn test_draw_step_moves_draw_rate_cards_face_up() {
        let mut game = new_game();
        let top_three: Vec<String> = game.draw_pile.cards()[21..].iter().map(|c| c.name()).collect();
        assert_eq!(game.draw_step(), 3);
        assert_eq!(game.draw_pile.len(), 21);
        assert_eq!(game.waste_pile.len(), 3);
        assert!(game.waste_pile.iter().all(|c| c.face_up));
        // the card that was third from the top ends up on the waste top
        assert_eq!(game.waste_pile.peek().unwrap().name(), top_three[0]);
        let changes = flat_changes(&game);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].reason(), "drawing");
        assert_eq!(changes[0].to, Location::WastePile);
    }

    #[test]
    fn test_draw_step_short_and_empty() {
        let mut game = new_game();
        for _ in 0..8 {
            assert_eq!(game.draw_step(), 3);
        }
        assert_eq!(game.draw_step(), 0);
        assert!(game.changes.is_empty());

        let mut game = cleared_game();
        game.draw_pile.add_to_top(vec![Card::new(1, Suit::Spades), Card::new(2, Suit::Spades)]);
        assert_eq!(game.draw_step(), 2);
        assert!(game.draw_pile.is_empty());
    }

    #[test]
    fn test_reset_waste_round_trip() {
        let mut game = new_game();
        while game.draw_step() > 0 {}
        let waste_before = game.waste_pile.names();
        assert_eq!(waste_before.len(), 24);

        assert!(game.reset_waste_pile());
        assert!(game.waste_pile.is_empty());
        assert_eq!(game.draw_pile.len(), 24);
        assert!(game.draw_pile.iter().all(|c| !c.face_up));
        assert_eq!(flat_changes(&game)[0].reason(), "resetting waste");

        while game.draw_step() > 0 {}
        assert_eq!(game.waste_pile.names(), waste_before);
        assert_conserved(&game);
    }

    #[test]
    fn test_reset_waste_only_when_draw_pile_empty() {
        let mut game = new_game();
        game.draw_step();
        assert!(!game.reset_waste_pile());
        assert_eq!(game.waste_pile.len(), 3);
        assert!(game.changes.is_empty());
    }

    #[test]
    fn test_reset_waste_with_both_piles_empty() {
        let mut game = cleared_game();
        assert!(!game.reset_waste_pile());
        assert!(!game.tap_draw_pile());
        assert!(game.draw_pile.is_empty());
        assert!(game.waste_pile.is_empty());
        assert!(game.changes.is_empty());
    }

    #[test]
    fn test_tap_draw_pile_cycles() {
        let mut game = new_game();
        for _ in 0..8 {
            assert!(game.tap_draw_pile());
        }
        assert!(game.draw_pile.is_empty());
        assert!(game.tap_draw_pile());
        assert_eq!(game.draw_pile.len(), 24);
    }

    #[test]
    fn test_hidden_card_is_rejected_and_bounced_back() {
        let mut game = new_game();
        let buried = game.tableau.column(6).unwrap().cards.at(0).unwrap().name();
        let request = MoveRequest::single(&buried, Location::Tableau(6), Location::Tableau(0));
        let outcome = game.handle_move_by_hand(&request);
        assert_eq!(outcome, MoveOutcome::Rejected(Rejection::CardHidden(buried.clone())));
        let changes = flat_changes(&game);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].reason(), "drop cancelled");
        assert_eq!(changes[0].to, Location::Tableau(6));
        assert_eq!(changes[0].from, Location::None);
        assert_eq!(game.tableau.column(6).unwrap().len(), 7);
    }

    #[test]
    fn test_draw_pile_cards_cannot_be_dragged() {
        let mut game = new_game();
        let top = game.draw_pile.peek().unwrap().name();
        let outcome = game.handle_move_by_hand(&MoveRequest::single(
            &top,
            Location::DrawPile,
            Location::Foundation(0),
        ));
        assert_eq!(outcome, MoveOutcome::Rejected(Rejection::IllegalSource));
        assert_eq!(game.draw_pile.len(), 24);
    }

    #[test]
    fn test_waste_card_must_be_on_top() {
        let mut game = cleared_game();
        game.waste_pile.add_to_top(vec![up(13, Suit::Spades), up(5, Suit::Hearts)]);
        let outcome = game.handle_move_by_hand(&MoveRequest::single(
            "spades13",
            Location::WastePile,
            Location::Tableau(0),
        ));
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(Rejection::NotOnTop("spades13".to_string()))
        );
    }

    #[test]
    fn test_waste_king_to_empty_column() {
        let mut game = cleared_game();
        game.waste_pile.add_to_top(vec![up(5, Suit::Hearts), up(13, Suit::Spades)]);
        let request = MoveRequest::single("spades13", Location::WastePile, Location::Tableau(2));
        assert!(game.handle_move_by_hand(&request).is_accepted());
        assert_eq!(game.tableau.column(2).unwrap().cards.names(), vec!["spades13"]);
        assert_eq!(game.waste_pile.names(), vec!["hearts5"]);
        let changes = flat_changes(&game);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].reason(), "dropped");
        assert_eq!(changes[0].from, Location::WastePile);
        assert_eq!(changes[0].to, Location::Tableau(2));
    }

    #[test]
    fn test_rule_violation_leaves_board_untouched() {
        let mut game = cleared_game();
        game.tableau.add_to_column(0, vec![up(10, Suit::Spades)]);
        game.waste_pile.add_to_top(vec![up(9, Suit::Clubs)]);
        let before = game.snapshot();
        let outcome = game.handle_move_by_hand(&MoveRequest::single(
            "clubs9",
            Location::WastePile,
            Location::Tableau(0),
        ));
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(Rejection::RuleViolation("clubs9".to_string()))
        );
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_run_moves_together_and_reveals() {
        let mut game = cleared_game();
        game.tableau.add_to_column(
            0,
            vec![Card::new(2, Suit::Clubs), up(9, Suit::Hearts), up(8, Suit::Spades)],
        );
        game.tableau.column_mut(0).unwrap().n_hidden = 1;
        game.tableau.add_to_column(1, vec![up(10, Suit::Clubs)]);

        let request = MoveRequest::new(
            vec!["hearts9".to_string(), "spades8".to_string()],
            Location::Tableau(0),
            Location::Tableau(1),
        );
        assert!(game.handle_move_by_hand(&request).is_accepted());
        assert_eq!(
            game.tableau.column(1).unwrap().cards.names(),
            vec!["clubs10", "hearts9", "spades8"]
        );
        let column = game.tableau.column(0).unwrap();
        assert_eq!(column.n_hidden, 0);
        assert!(column.top_card().unwrap().face_up);

        let changes = flat_changes(&game);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].cards, vec!["hearts9", "spades8"]);
        assert_eq!(changes[1].reason(), "fixing tableau orientations");
        assert_eq!(changes[1].cards, vec!["clubs2"]);
    }

    #[test]
    fn test_partial_group_is_rejected() {
        let mut game = cleared_game();
        game.tableau.add_to_column(0, vec![up(9, Suit::Hearts), up(8, Suit::Spades)]);
        game.tableau.add_to_column(1, vec![up(10, Suit::Clubs)]);
        let outcome = game.handle_move_by_hand(&MoveRequest::single(
            "hearts9",
            Location::Tableau(0),
            Location::Tableau(1),
        ));
        assert_eq!(outcome, MoveOutcome::Rejected(Rejection::GroupMismatch));
        assert_eq!(game.tableau.column(0).unwrap().len(), 2);
    }

    #[test]
    fn test_source_must_match_actual_location() {
        let mut game = cleared_game();
        game.tableau.add_to_column(2, vec![up(13, Suit::Hearts)]);
        let outcome = game.handle_move_by_hand(&MoveRequest::single(
            "hearts13",
            Location::Tableau(1),
            Location::Tableau(0),
        ));
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(Rejection::NotAtSource("hearts13".to_string()))
        );
    }

    #[test]
    fn test_unknown_and_empty_requests() {
        let mut game = new_game();
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::single(
                "stars1",
                Location::WastePile,
                Location::Tableau(0)
            )),
            MoveOutcome::Rejected(Rejection::CardNotFound("stars1".to_string()))
        );
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::default()),
            MoveOutcome::Rejected(Rejection::EmptyRequest)
        );
    }

    #[test]
    fn test_drop_on_waste_or_same_column_rejected() {
        let mut game = new_game();
        let top = game.tableau.column(0).unwrap().top_card().unwrap().name();
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::single(
                &top,
                Location::Tableau(0),
                Location::WastePile
            )),
            MoveOutcome::Rejected(Rejection::IllegalDestination)
        );
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::single(
                &top,
                Location::Tableau(0),
                Location::Tableau(0)
            )),
            MoveOutcome::Rejected(Rejection::SameLocation)
        );
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::single(
                &top,
                Location::Tableau(0),
                Location::Tableau(40)
            )),
            MoveOutcome::Rejected(Rejection::IllegalDestination)
        );
    }

    #[test]
    fn test_foundation_moves() {
        let mut game = cleared_game();
        game.waste_pile.add_to_top(vec![up(1, Suit::Diamonds)]);
        game.tableau.add_to_column(0, vec![up(3, Suit::Spades), up(2, Suit::Diamonds)]);

        assert!(game
            .handle_move_by_hand(&MoveRequest::single(
                "diamonds1",
                Location::WastePile,
                Location::Foundation(3)
            ))
            .is_accepted());
        // two cards can never go up together
        let outcome = game.handle_move_by_hand(&MoveRequest::new(
            vec!["spades3".to_string(), "diamonds2".to_string()],
            Location::Tableau(0),
            Location::Foundation(3),
        ));
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(Rejection::RuleViolation("spades3".to_string()))
        );
        assert!(game
            .handle_move_by_hand(&MoveRequest::single(
                "diamonds2",
                Location::Tableau(0),
                Location::Foundation(3)
            ))
            .is_accepted());
        assert_eq!(
            game.foundations.get(3).unwrap().cards.names(),
            vec!["diamonds1", "diamonds2"]
        );

        // and back down from the foundation top
        game.tableau.add_to_column(1, vec![up(3, Suit::Clubs)]);
        assert_eq!(
            game.handle_move_by_hand(&MoveRequest::single(
                "diamonds1",
                Location::Foundation(3),
                Location::Tableau(1)
            )),
            MoveOutcome::Rejected(Rejection::NotOnTop("diamonds1".to_string()))
        );
        assert!(game
            .handle_move_by_hand(&MoveRequest::single(
                "diamonds2",
                Location::Foundation(3),
                Location::Tableau(1)
            ))
            .is_accepted());
    }

    #[test]
    fn test_auto_play_prefers_foundations() {
        let mut game = cleared_game();
        game.foundations.add_to_foundation(2, vec![up(1, Suit::Hearts)]);
        game.tableau.add_to_column(4, vec![up(3, Suit::Spades)]);
        game.waste_pile.add_to_top(vec![up(2, Suit::Hearts)]);
        assert!(game.auto_play("hearts2"));
        assert_eq!(game.foundations.get(2).unwrap().ncards(), 2);
        assert_eq!(flat_changes(&game)[0].reason(), "auto move");
    }

    #[test]
    fn test_auto_play_carries_run_to_first_column() {
        let mut game = cleared_game();
        game.tableau.add_to_column(0, vec![up(5, Suit::Clubs)]);
        game.tableau.add_to_column(2, vec![up(7, Suit::Spades)]);
        game.tableau.add_to_column(3, vec![up(7, Suit::Clubs)]);
        game.tableau.add_to_column(
            5,
            vec![Card::new(12, Suit::Hearts), up(6, Suit::Hearts), up(5, Suit::Spades)],
        );
        game.tableau.column_mut(5).unwrap().n_hidden = 1;

        assert!(game.auto_play("hearts6"));
        assert_eq!(
            game.tableau.column(2).unwrap().cards.names(),
            vec!["spades7", "hearts6", "spades5"]
        );
        assert_eq!(game.tableau.column(3).unwrap().len(), 1);
        assert_eq!(game.tableau.column(5).unwrap().n_hidden, 0);
    }

    #[test]
    fn test_auto_play_without_destination() {
        let mut game = cleared_game();
        game.tableau.add_to_column(0, vec![up(5, Suit::Clubs)]);
        game.tableau.add_to_column(1, vec![up(9, Suit::Clubs)]);
        game.draw_pile.add_to_top(vec![Card::new(1, Suit::Hearts)]);
        let before = game.snapshot();
        assert!(!game.auto_play("clubs5"));
        assert!(!game.auto_play("hearts1"));
        assert!(!game.auto_play("nothing"));
        assert_eq!(game.snapshot(), before);
        assert!(game.changes.is_empty());
    }

    #[test]
    fn test_auto_finish_wins_and_reports_once() {
        let mut game = cleared_game();
        for (index, suit) in enum_iterator::all::<Suit>().enumerate() {
            let column: Vec<Card> = (1..=KING).rev().map(|rank| up(rank, suit)).collect();
            game.tableau.add_to_column(index, column);
        }
        let hooked = Rc::new(RefCell::new(Vec::new()));
        let sink = hooked.clone();
        game.set_move_hook(move |change: &Change| sink.borrow_mut().push(change.clone()));

        assert_eq!(game.auto_finish(), 52);
        assert!(game.won());
        assert_eq!(game.tableau.ncards(), 0);
        let game_overs = hooked
            .borrow()
            .iter()
            .filter(|c| c.change_type == ChangeType::GameOver)
            .count();
        assert_eq!(game_overs, 1);
        assert_eq!(hooked.borrow().len(), 53);
        assert!(game.snapshot().won);
    }

    #[test]
    fn test_hook_fires_without_recorded_changes() {
        let mut game = new_game();
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        game.set_move_hook(move |_| *counter.borrow_mut() += 1);
        game.with_no_changes();
        game.draw_step();
        game.setup().unwrap();
        assert!(game.changes.is_empty());
        assert_eq!(*count.borrow(), 1 + 1 + 28);
    }

    #[test]
    fn test_take_changes_drains_recorded_steps() {
        let mut game = new_game();
        let setup_changes = game.take_changes();
        assert_eq!(setup_changes.len(), 1 + 28);
        assert!(game.changes.is_empty());

        game.draw_step();
        let drawn = game.take_changes();
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0][0].change_type, ChangeType::Draw);
        assert!(game.take_changes().is_empty());
    }

    #[test]
    fn test_every_column_count_deals_the_whole_deck() {
        for n_columns in 1..=9 {
            let settings = Settings {
                n_columns,
                ..Settings::with_seed(n_columns as u64)
            };
            let mut game = KlondikeGame::new(settings).unwrap();
            game.setup().unwrap();
            assert_conserved(&game);
            assert_eq!(game.tableau.ncards(), n_columns * (n_columns + 1) / 2);
            assert_eq!(game.draw_pile.len(), DECK_SIZE - game.tableau.ncards());
        }
    }

    #[test]
    fn test_fix_all_orientations_reports_each_column() {
        let mut game = cleared_game();
        game.tableau.add_to_column(1, vec![Card::new(4, Suit::Clubs)]);
        game.tableau.add_to_column(3, vec![Card::new(8, Suit::Hearts)]);
        game.tableau.column_mut(1).unwrap().n_hidden = 1;
        game.tableau.column_mut(3).unwrap().n_hidden = 1;
        let revealed = game.fix_all_orientations();
        assert_eq!(revealed.len(), 2);
        let changes = flat_changes(&game);
        assert_eq!(changes[0].to, Location::Tableau(1));
        assert_eq!(changes[1].to, Location::Tableau(3));
        assert!(game.fix_all_orientations().is_empty());
    }

    #[test]
    fn test_snapshot_serializes() {
        let game = new_game();
        let json = serde_json::to_string(&game.snapshot()).unwrap();
        let view: GameView = serde_json::from_str(&json).unwrap();
        assert_eq!(view.columns.len(), 7);
        assert_eq!(view.columns[6].n_hidden, 6);
        assert_eq!(view.draw_pile.len(), 24);
        let state = serde_json::to_value(&game).unwrap();
        assert_eq!(state["settings"]["drawRate"], 3);
    }
}
