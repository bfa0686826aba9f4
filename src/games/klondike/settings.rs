use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::card::DECK_SIZE;
use super::error::{KlondikeError, Result};
use super::tableau::DEFAULT_COLUMNS;

pub const DEFAULT_DRAW_RATE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// number of tableau columns
    pub n_columns: usize,
    /// cards moved from the draw pile to the waste pile per draw (typically 1 or 3)
    pub draw_rate: usize,
    /// fixed shuffle seed; a fresh entropy seed is used when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            n_columns: DEFAULT_COLUMNS,
            draw_rate: DEFAULT_DRAW_RATE,
            seed: None,
        }
    }
}

impl Settings {
    pub fn with_seed(seed: u64) -> Self {
        Settings {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Settings::from_json(&json)
    }

    /// Cards needed for the triangular deal (1 + 2 + ... + n_columns).
    pub fn cards_dealt(&self) -> usize {
        self.n_columns * (self.n_columns + 1) / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.draw_rate == 0 {
            return Err(KlondikeError::InvalidSettings(
                "draw rate must be at least 1".to_string(),
            ));
        }
        if self.n_columns == 0 {
            return Err(KlondikeError::InvalidSettings(
                "the tableau needs at least one column".to_string(),
            ));
        }
        if self.cards_dealt() > DECK_SIZE {
            return Err(KlondikeError::InvalidSettings(format!(
                "{} columns need {} cards but the deck only has {}",
                self.n_columns,
                self.cards_dealt(),
                DECK_SIZE
            )));
        }
        Ok(())
    }
}
