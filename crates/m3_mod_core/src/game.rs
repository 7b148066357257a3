use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported game title.
///
/// The display form (`ME1`, `LE2`, ...) doubles as the in-archive prefix used
/// when one deployment bundles mods for more than one game.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Game {
    ME1,
    ME2,
    ME3,
    LE1,
    LE2,
    LE3,
}

impl Game {
    pub const ALL: [Game; 6] = [
        Game::ME1,
        Game::ME2,
        Game::ME3,
        Game::LE1,
        Game::LE2,
        Game::LE3,
    ];

    /// Short upper-case name, e.g. `"LE1"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Game::ME1 => "ME1",
            Game::ME2 => "ME2",
            Game::ME3 => "ME3",
            Game::LE1 => "LE1",
            Game::LE2 => "LE2",
            Game::LE3 => "LE3",
        }
    }

    /// `true` for the first game of either edition (embedded TLK merging applies).
    pub fn is_game1_family(&self) -> bool {
        matches!(self, Game::ME1 | Game::LE1)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Game::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::UnknownGame(trimmed.to_string()))
    }
}
