// This file is part of brassage.
//
// brassage is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// brassage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::{
    TeamId,
    error::{Result, TournamentError},
};

/// Level 1 is the strongest team, level 10 the weakest.
pub const LEVELS: RangeInclusive<u8> = 1..=10;

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub level: u8,
}

impl Team {
    /// Builds a team with a fresh random id.
    ///
    /// # Errors
    ///
    /// If the name is empty or the level is outside of [`LEVELS`].
    pub fn new(name: &str, level: u8) -> Result<Self> {
        let name = validate_name(name)?;
        validate_level(level)?;

        Ok(Self {
            id: new_id(),
            name,
            level,
        })
    }

    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (level {})", self.id, self.name, self.level)
    }
}

/// Random lowercase hex id.
#[must_use]
pub fn new_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(TournamentError::validation("the team name is empty"));
    }

    Ok(name.to_string())
}

pub(crate) fn validate_level(level: u8) -> Result<()> {
    if LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(TournamentError::validation(format!(
            "the level {level} is not between {} and {}",
            LEVELS.start(),
            LEVELS.end()
        )))
    }
}

/// Names are unique without regard to case. `except` is the team being renamed.
pub(crate) fn ensure_unique_name(teams: &[Team], name: &str, except: Option<&str>) -> Result<()> {
    let taken = teams
        .iter()
        .filter(|team| Some(team.id.as_str()) != except)
        .any(|team| team.has_name(name));

    if taken {
        Err(TournamentError::validation(format!(
            "a team named '{name}' already exists"
        )))
    } else {
        Ok(())
    }
}

/// Case-insensitive exact lookup by name.
#[must_use]
pub fn find_by_name<'a>(teams: &'a [Team], name: &str) -> Option<&'a Team> {
    teams.iter().find(|team| team.has_name(name))
}

#[must_use]
pub fn find_by_id<'a>(teams: &'a [Team], id: &str) -> Option<&'a Team> {
    teams.iter().find(|team| team.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_checked() {
        assert!(Team::new("Smash", 0).is_err());
        assert!(Team::new("Smash", 11).is_err());
        assert!(Team::new("Smash", 1).is_ok());
        assert!(Team::new("Smash", 10).is_ok());
    }

    #[test]
    fn names_are_trimmed_and_required() -> anyhow::Result<()> {
        assert!(Team::new("   ", 3).is_err());
        assert_eq!(Team::new("  Block Party ", 3)?.name, "Block Party");
        Ok(())
    }

    #[test]
    fn names_are_unique_without_case() -> anyhow::Result<()> {
        let teams = vec![Team::new("Spikers", 2)?];

        assert!(ensure_unique_name(&teams, "SPIKERS", None).is_err());
        assert!(ensure_unique_name(&teams, "spikers", Some(&teams[0].id)).is_ok());
        assert!(ensure_unique_name(&teams, "Diggers", None).is_ok());
        assert_eq!(
            find_by_name(&teams, " spikers").map(|team| team.id.clone()),
            Some(teams[0].id.clone())
        );
        Ok(())
    }
}
