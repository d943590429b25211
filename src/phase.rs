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

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    MatchId, PhaseId,
    pool::Pool,
    ranking::{self, RankingEntry},
    score::Match,
    team::{Team, new_id},
};

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum PhaseKind {
    #[default]
    InitialBrassage,
    SecondaryBrassage,
    EliminationSeeding,
}

impl PhaseKind {
    #[must_use]
    pub fn is_brassage(self) -> bool {
        matches!(self, Self::InitialBrassage | Self::SecondaryBrassage)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialBrassage => write!(f, "initial_brassage"),
            Self::SecondaryBrassage => write!(f, "secondary_brassage"),
            Self::EliminationSeeding => write!(f, "elimination_seeding"),
        }
    }
}

impl FromStr for PhaseKind {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let string = string.to_lowercase();

        match string.as_str() {
            "initial" | "initial_brassage" => Ok(Self::InitialBrassage),
            "secondary" | "secondary_brassage" => Ok(Self::SecondaryBrassage),
            "seeding" | "elimination_seeding" => Ok(Self::EliminationSeeding),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a PhaseKind!"
            ))),
        }
    }
}

/// One stage of the tournament. The id and kind never change once created;
/// pools and scores change in place until the phase is generated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Phase {
    pub id: PhaseId,
    pub name: String,
    pub kind: PhaseKind,
    /// Every match of every pool has both scores.
    pub generated: bool,
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub rankings: Vec<RankingEntry>,
    pub created_at: DateTime<Utc>,
}

impl Phase {
    #[must_use]
    pub fn new(id: PhaseId, name: String, kind: PhaseKind, pools: Vec<Pool>) -> Self {
        Self {
            id,
            name,
            kind,
            generated: kind == PhaseKind::EliminationSeeding,
            pools,
            rankings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn new_id() -> PhaseId {
        format!("phase-{}", new_id())
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.pools.iter().flat_map(|pool| pool.matches.iter())
    }

    #[must_use]
    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches().map(|game| game.id.clone()).collect()
    }

    #[must_use]
    pub fn find_match(&self, id: &str) -> Option<&Match> {
        self.matches().find(|game| game.id == id)
    }

    pub fn find_match_mut(&mut self, id: &str) -> Option<&mut Match> {
        self.pools
            .iter_mut()
            .flat_map(|pool| pool.matches.iter_mut())
            .find(|game| game.id == id)
    }

    #[must_use]
    pub fn team_ids(&self) -> Vec<&str> {
        self.pools
            .iter()
            .flat_map(|pool| pool.teams.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn all_scored(&self) -> bool {
        self.pools.iter().all(Pool::is_complete)
    }

    /// Recomputes `generated` and the per-phase standings. Returns whether the
    /// phase just became generated.
    pub fn refresh(&mut self, teams: &[Team]) -> bool {
        if !self.kind.is_brassage() {
            return false;
        }

        let was_generated = self.generated;
        self.generated = self.all_scored();
        self.rankings = ranking::phase_standings(teams, self);

        !was_generated && self.generated
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} [{}] generated: {}",
            self.id, self.name, self.kind, self.generated
        )?;
        for pool in &self.pools {
            write!(f, "{pool}")?;
        }

        Ok(())
    }
}
