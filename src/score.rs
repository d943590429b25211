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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MatchId, TeamId, status::Status};

/// Points for winning a match, whatever the margin.
pub const WIN_POINTS: u32 = 8;

/// Points each side takes from a tied match.
pub const TIE_POINTS: u32 = 4;

/// Points for the losing side, by score difference.
///
/// | difference | points |
/// |------------|--------|
/// | 1 - 3      | 4      |
/// | 4 - 6      | 3      |
/// | 7 - 9      | 2      |
/// | 10 +       | 1      |
#[must_use]
pub fn loser_points(difference: u32) -> u32 {
    match difference {
        0..=3 => 4,
        4..=6 => 3,
        7..=9 => 2,
        _ => 1,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MatchPoints {
    pub team1: u32,
    pub team2: u32,
    pub difference1: i64,
    pub difference2: i64,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub team1: TeamId,
    pub team2: TeamId,
    #[serde(default)]
    pub score1: Option<u32>,
    #[serde(default)]
    pub score2: Option<u32>,
    #[serde(default)]
    pub winner: Option<TeamId>,
    #[serde(default)]
    pub loser: Option<TeamId>,
}

impl Match {
    #[must_use]
    pub fn new(id: MatchId, team1: TeamId, team2: TeamId) -> Self {
        Self {
            id,
            team1,
            team2,
            score1: None,
            score2: None,
            winner: None,
            loser: None,
        }
    }

    /// Stores both scores. The winner and loser are only set when one score is
    /// strictly higher.
    pub fn set_scores(&mut self, score1: u32, score2: u32) {
        self.score1 = Some(score1);
        self.score2 = Some(score2);

        let (winner, loser) = match score1.cmp(&score2) {
            std::cmp::Ordering::Greater => (Some(self.team1.clone()), Some(self.team2.clone())),
            std::cmp::Ordering::Less => (Some(self.team2.clone()), Some(self.team1.clone())),
            std::cmp::Ordering::Equal => (None, None),
        };

        self.winner = winner;
        self.loser = loser;
    }

    pub fn clear_scores(&mut self) {
        self.score1 = None;
        self.score2 = None;
        self.winner = None;
        self.loser = None;
    }

    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.score1.is_some() && self.score2.is_some()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        Status::from_scores(self.score1, self.score2)
    }

    #[must_use]
    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// Whether this match is between the two teams, in either order.
    #[must_use]
    pub fn is_between(&self, first: &str, second: &str) -> bool {
        (self.team1 == first && self.team2 == second)
            || (self.team1 == second && self.team2 == first)
    }

    /// Ranking points and signed score difference for both sides, once scored.
    #[must_use]
    pub fn points(&self) -> Option<MatchPoints> {
        let (score1, score2) = (self.score1?, self.score2?);
        let difference = score1.abs_diff(score2);
        let signed = i64::from(score1) - i64::from(score2);

        let (team1, team2) = match self.status() {
            Status::Team1Wins => (WIN_POINTS, loser_points(difference)),
            Status::Team2Wins => (loser_points(difference), WIN_POINTS),
            Status::Tie => (TIE_POINTS, TIE_POINTS),
            Status::Unplayed => return None,
        };

        Some(MatchPoints {
            team1,
            team2,
            difference1: signed,
            difference2: -signed,
        })
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = |score: Option<u32>| score.map_or_else(|| "-".to_string(), |s| s.to_string());

        write!(
            f,
            "{} {} {} : {} {}",
            self.id,
            self.team1,
            score(self.score1),
            score(self.score2),
            self.team2
        )
    }
}
