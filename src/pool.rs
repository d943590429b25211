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

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{TeamId, score::Match};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub teams: Vec<TeamId>,
    pub matches: Vec<Match>,
}

impl Pool {
    /// A pool playing a full round robin: one match for every pair `(i, j)`
    /// with `i < j` in the order the teams are listed.
    #[must_use]
    pub fn round_robin(id: String, name: String, teams: Vec<TeamId>) -> Self {
        let matches = teams
            .iter()
            .tuple_combinations()
            .enumerate()
            .map(|(number, (team1, team2))| {
                Match::new(
                    format!("{id}-m{}", number + 1),
                    team1.clone(),
                    team2.clone(),
                )
            })
            .collect();

        Self {
            id,
            name,
            teams,
            matches,
        }
    }

    /// A group of teams without matches, used for elimination seeding.
    #[must_use]
    pub fn group(id: String, name: String, teams: Vec<TeamId>) -> Self {
        Self {
            id,
            name,
            teams,
            matches: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(Match::is_scored)
    }

    #[must_use]
    pub fn contains(&self, team: &str) -> bool {
        self.teams.iter().any(|id| id == team)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(f, "teams: {}", self.teams.join(" "))?;
        for game in &self.matches {
            writeln!(f, "  {game}")?;
        }

        Ok(())
    }
}

/// "Pool A", "Pool B", ... then numbers once the alphabet runs out.
#[must_use]
pub fn pool_name(prefix: &str, index: usize) -> String {
    match u8::try_from(index) {
        Ok(index) if index < 26 => format!("{prefix} {}", char::from(b'A' + index)),
        _ => format!("{prefix} {}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;

    fn ids(count: usize) -> Vec<TeamId> {
        (0..count).map(|i| format!("t{i}")).collect()
    }

    #[test]
    fn round_robin_is_complete() {
        for size in 2..=8 {
            let pool = Pool::round_robin("p".to_string(), "Pool A".to_string(), ids(size));
            assert_eq!(pool.matches.len(), size * (size - 1) / 2);

            let mut pairs = FxHashSet::default();
            for game in &pool.matches {
                assert_ne!(game.team1, game.team2);
                let mut pair = [game.team1.clone(), game.team2.clone()];
                pair.sort();
                assert!(pairs.insert(pair), "pair played twice");
            }
        }
    }

    #[test]
    fn round_robin_order() {
        let pool = Pool::round_robin("p".to_string(), "Pool A".to_string(), ids(3));
        let order: Vec<_> = pool
            .matches
            .iter()
            .map(|game| (game.team1.as_str(), game.team2.as_str()))
            .collect();

        assert_eq!(order, vec![("t0", "t1"), ("t0", "t2"), ("t1", "t2")]);
        assert_eq!(pool.matches[0].id, "p-m1");
    }

    #[test]
    fn names() {
        assert_eq!(pool_name("Pool", 0), "Pool A");
        assert_eq!(pool_name("Pool", 25), "Pool Z");
        assert_eq!(pool_name("Pool", 26), "Pool 27");
    }
}
