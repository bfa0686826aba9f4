use thiserror::Error;

pub type Result<T> = std::result::Result<T, KlondikeError>;

/// Fatal problems: bad configuration or a broken deal. None of these can be
/// caused by a player's move.
#[derive(Debug, Error)]
pub enum KlondikeError {
    #[error("deck exhausted while dealing row {row} of column {column}")]
    DeckExhausted { column: usize, row: usize },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a hand move was refused. A rejection is an ordinary outcome: the
/// cards go back where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no cards in the request")]
    EmptyRequest,
    #[error("card {0} does not exist")]
    CardNotFound(String),
    #[error("card {0} is not at the claimed source")]
    NotAtSource(String),
    #[error("cards cannot be taken from there")]
    IllegalSource,
    #[error("card {0} is face down")]
    CardHidden(String),
    #[error("card {0} is not on top of its pile")]
    NotOnTop(String),
    #[error("the moved cards must be the grabbed card and everything on top of it")]
    GroupMismatch,
    #[error("cards cannot be dropped there")]
    IllegalDestination,
    #[error("source and destination are the same")]
    SameLocation,
    #[error("card {0} cannot be played there")]
    RuleViolation(String),
}
