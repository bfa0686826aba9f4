use log::{debug, warn};

use super::card::KING;
use super::game::KlondikeGame;
use super::location::{Location, MoveRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    Move(MoveRequest),
    Draw,
    ResetWaste,
}

/// Suggests the next move. Foundation plays come first, then waste to
/// tableau, then tableau runs that uncover something, then the draw pile.
/// Returns `None` when there is nothing left to do at all.
pub fn hint(game: &KlondikeGame) -> Option<Hint> {
    for (card, from) in game.exposed_top_cards() {
        if let Some(n) = game.foundations().where_playable(&card).iter().position(|&p| p) {
            return Some(Hint::Move(MoveRequest::single(
                &card.name(),
                from,
                Location::Foundation(n),
            )));
        }
    }

    if let Some(card) = game.waste_pile().peek() {
        if let Some(n) = game.tableau().where_playable(card).iter().position(|&p| p) {
            return Some(Hint::Move(MoveRequest::single(
                &card.name(),
                Location::WastePile,
                Location::Tableau(n),
            )));
        }
    }

    if let Some(request) = productive_run_move(game) {
        return Some(Hint::Move(request));
    }

    if !game.draw_pile().is_empty() {
        Some(Hint::Draw)
    } else if !game.waste_pile().is_empty() {
        Some(Hint::ResetWaste)
    } else {
        None
    }
}

/// Moves the whole visible run of a column when that turns over a hidden
/// card or empties the column for a king. Shuffling runs between columns
/// for no gain is never suggested.
fn productive_run_move(game: &KlondikeGame) -> Option<MoveRequest> {
    let tableau = game.tableau();
    for (n, column) in tableau.columns().iter().enumerate() {
        let Some(base) = column.visible_cards().first() else {
            continue;
        };
        let frees_column = column.n_hidden == 0 && base.rank() != KING;
        if column.n_hidden == 0 && !frees_column {
            continue;
        }
        let destination = tableau
            .where_playable(base)
            .into_iter()
            .enumerate()
            .find(|&(m, playable)| playable && m != n);
        if let Some((m, _)) = destination {
            let cards = column.visible_cards().iter().map(|c| c.name()).collect();
            return Some(MoveRequest::new(
                cards,
                Location::Tableau(n),
                Location::Tableau(m),
            ));
        }
    }
    None
}

/// Follows hints until the game is won, a whole pass through the draw pile
/// goes by without a card being played, or `max_steps` run out.
pub fn play_to_completion(game: &mut KlondikeGame, max_steps: usize) -> bool {
    let mut played_since_reset = false;
    for _ in 0..max_steps {
        if game.won() {
            break;
        }
        match hint(game) {
            None => break,
            Some(Hint::Move(request)) => {
                if !game.handle_move_by_hand(&request).is_accepted() {
                    warn!("hinted move {:?} was rejected", request.cards);
                    break;
                }
                played_since_reset = true;
            }
            Some(Hint::Draw) => {
                game.draw_step();
            }
            Some(Hint::ResetWaste) => {
                if !played_since_reset {
                    debug!("no progress during a full pass through the draw pile");
                    break;
                }
                played_since_reset = false;
                game.reset_waste_pile();
            }
        }
    }
    game.won()
}
