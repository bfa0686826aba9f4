pub mod card;
pub mod error;
pub mod foundation;
pub mod game;
pub mod location;
pub mod player;
pub mod settings;
pub mod stack;
pub mod tableau;

// Re-export the main types
pub use card::{Card, Color, Suit};
pub use error::{KlondikeError, Rejection, Result};
pub use game::{GameView, KlondikeGame, MoveOutcome};
pub use location::{Change, ChangeType, Location, MoveRequest};
pub use player::{hint, play_to_completion, Hint};
pub use settings::Settings;
