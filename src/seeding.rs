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

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TournamentError},
    partition::{OrderingBasis, seed_order, snake_distribute},
    pool::{Pool, pool_name},
    ranking::RankingEntry,
    team::Team,
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeedGroup {
    pub name: String,
    pub teams: Vec<Team>,
}

/// Elimination groups waiting to be committed. Operators may move teams
/// between groups by hand before committing.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeedingPreview {
    pub groups: Vec<SeedGroup>,
    /// Teams ranked below the qualifying places.
    pub unassigned: Vec<Team>,
}

impl SeedingPreview {
    /// Snake draft of the best `groups * teams_per_group` teams of the ranking.
    ///
    /// # Errors
    ///
    /// If there are no groups, groups smaller than two, or not enough teams.
    pub fn build(
        teams: &[Team],
        rankings: &[RankingEntry],
        groups: usize,
        teams_per_group: usize,
    ) -> Result<Self> {
        if groups == 0 {
            return Err(TournamentError::validation("there has to be at least one group"));
        }
        if teams_per_group < 2 {
            return Err(TournamentError::validation(
                "a group needs at least two teams",
            ));
        }

        let Some(qualifying) = groups.checked_mul(teams_per_group) else {
            return Err(TournamentError::validation(format!(
                "{groups} groups of {teams_per_group} are more than there are teams"
            )));
        };
        if qualifying > teams.len() {
            return Err(TournamentError::validation(format!(
                "{groups} groups of {teams_per_group} need {qualifying} teams, there are {}",
                teams.len()
            )));
        }

        let mut ordered: Vec<Team> = seed_order(teams, OrderingBasis::Ranking(rankings))
            .into_iter()
            .cloned()
            .collect();
        let unassigned = ordered.split_off(qualifying);

        let groups = snake_distribute(ordered, groups, teams_per_group)
            .into_iter()
            .enumerate()
            .map(|(i, teams)| SeedGroup {
                name: pool_name("Group", i),
                teams,
            })
            .collect();

        Ok(Self { groups, unassigned })
    }

    /// Moves one team from one group to another.
    ///
    /// # Errors
    ///
    /// If either group does not exist or the team is not in `from`.
    pub fn move_team(&mut self, team: &str, from: usize, to: usize) -> Result<()> {
        if to >= self.groups.len() {
            return Err(TournamentError::not_found(format!("group {to}")));
        }
        let Some(source) = self.groups.get_mut(from) else {
            return Err(TournamentError::not_found(format!("group {from}")));
        };
        let Some(position) = source.teams.iter().position(|member| member.id == team) else {
            return Err(TournamentError::not_found(format!(
                "team {team} in group {from}"
            )));
        };

        let moved = source.teams.remove(position);
        self.groups[to].teams.push(moved);

        Ok(())
    }

    #[must_use]
    pub fn team_count(&self) -> usize {
        self.groups.iter().map(|group| group.teams.len()).sum()
    }

    /// Checks the groups can become the seeding phase.
    ///
    /// # Errors
    ///
    /// If groups differ in size or hold fewer than two teams, or if a team is
    /// listed twice or is not on the roster.
    pub fn validate(&self, roster: &[Team]) -> Result<()> {
        let Some(first) = self.groups.first() else {
            return Err(TournamentError::validation("there are no groups"));
        };

        let size = first.teams.len();
        if size < 2 {
            return Err(TournamentError::validation(
                "every group needs at least two teams",
            ));
        }
        if let Some(group) = self.groups.iter().find(|group| group.teams.len() != size) {
            return Err(TournamentError::validation(format!(
                "{} has {} teams, {} has {size}",
                group.name,
                group.teams.len(),
                first.name
            )));
        }

        let mut seen = FxHashSet::default();
        for team in self.groups.iter().flat_map(|group| group.teams.iter()) {
            if !seen.insert(team.id.as_str()) {
                return Err(TournamentError::validation(format!(
                    "{} is in more than one group",
                    team.name
                )));
            }
            if !roster.iter().any(|member| member.id == team.id) {
                return Err(TournamentError::validation(format!(
                    "{} is not registered",
                    team.name
                )));
            }
        }

        Ok(())
    }

    /// The groups as pools without matches.
    #[must_use]
    pub fn to_pools(&self, phase_id: &str) -> Vec<Pool> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                Pool::group(
                    format!("{phase_id}-g{}", i + 1),
                    group.name.clone(),
                    group.teams.iter().map(|team| team.id.clone()).collect(),
                )
            })
            .collect()
    }
}

impl fmt::Display for SeedingPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            let names: Vec<_> = group.teams.iter().map(|team| team.name.as_str()).collect();
            writeln!(f, "{i}: {}: {}", group.name, names.join(", "))?;
        }
        if !self.unassigned.is_empty() {
            let names: Vec<_> = self.unassigned.iter().map(|team| team.name.as_str()).collect();
            writeln!(f, "not qualified: {}", names.join(", "))?;
        }

        Ok(())
    }
}
