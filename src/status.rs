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

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    Team1Wins,
    Tie,
    #[default]
    Unplayed,
    Team2Wins,
}

impl Status {
    /// The outcome of a match given both scores, if any.
    #[must_use]
    pub fn from_scores(score1: Option<u32>, score2: Option<u32>) -> Self {
        match (score1, score2) {
            (Some(score1), Some(score2)) => match score1.cmp(&score2) {
                Ordering::Greater => Self::Team1Wins,
                Ordering::Less => Self::Team2Wins,
                Ordering::Equal => Self::Tie,
            },
            _ => Self::Unplayed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team1Wins => write!(f, "team1_wins"),
            Self::Tie => write!(f, "tie"),
            Self::Unplayed => write!(f, "unplayed"),
            Self::Team2Wins => write!(f, "team2_wins"),
        }
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "team1_wins" => Ok(Self::Team1Wins),
            "tie" => Ok(Self::Tie),
            "unplayed" => Ok(Self::Unplayed),
            "team2_wins" => Ok(Self::Team2Wins),
            _ => Err(anyhow::Error::msg(format!("invalid status: {value}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_scores() {
        assert_eq!(Status::from_scores(Some(25), Some(20)), Status::Team1Wins);
        assert_eq!(Status::from_scores(Some(0), Some(20)), Status::Team2Wins);
        assert_eq!(Status::from_scores(Some(20), Some(20)), Status::Tie);
        assert_eq!(Status::from_scores(Some(20), None), Status::Unplayed);
    }

    #[test]
    fn strings() -> anyhow::Result<()> {
        assert_eq!(Status::from_str("team2_wins")?, Status::Team2Wins);
        assert_eq!(Status::Tie.to_string(), "tie");
        assert!(Status::from_str("forfeit").is_err());
        Ok(())
    }
}
