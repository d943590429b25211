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

//! Splitting teams into pools with a snake (serpentine) draft.

use std::fmt;

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TournamentError},
    pool::{Pool, pool_name},
    ranking::RankingEntry,
    team::Team,
};

/// How many pools and how many teams go in each before leftovers are added.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PoolLayout {
    pub pools: usize,
    pub teams_per_pool: usize,
}

impl PoolLayout {
    /// Best effort layout preferring pools of four, then three.
    ///
    /// Teams that do not fit `pools * teams_per_pool` are spread over the pools
    /// by [`snake_distribute`], so pools may differ in size by one.
    #[must_use]
    pub fn for_team_count(count: usize) -> Self {
        if count >= 4 && count % 4 == 0 {
            return Self {
                pools: count / 4,
                teams_per_pool: 4,
            };
        }
        if count >= 3 && count % 3 == 0 {
            return Self {
                pools: count / 3,
                teams_per_pool: 3,
            };
        }
        if count < 6 {
            return Self {
                pools: 1,
                teams_per_pool: count.max(2),
            };
        }

        let mut pools = (count / 4).max(1);
        let mut teams_per_pool = count / pools;

        while teams_per_pool > 4 && pools < count / 2 {
            pools += 1;
            teams_per_pool = count / pools;
        }
        while teams_per_pool < 3 && pools > 1 {
            pools -= 1;
            teams_per_pool = count / pools;
        }

        Self {
            pools,
            teams_per_pool: teams_per_pool.max(2),
        }
    }

    /// # Errors
    ///
    /// If there are no pools, pools smaller than two or larger than the
    /// roster, or too few teams to give every pool two of them.
    pub fn validate(&self, team_count: usize) -> Result<()> {
        if self.pools == 0 {
            return Err(TournamentError::validation("there has to be at least one pool"));
        }
        if self.teams_per_pool < 2 {
            return Err(TournamentError::validation(
                "a pool needs room for at least two teams",
            ));
        }
        if team_count < 2 {
            return Err(TournamentError::validation(
                "at least two teams are needed to build pools",
            ));
        }
        if self.teams_per_pool > team_count {
            return Err(TournamentError::validation(format!(
                "{team_count} teams cannot fill a pool of {}",
                self.teams_per_pool
            )));
        }
        if team_count / 2 < self.pools {
            return Err(TournamentError::validation(format!(
                "{team_count} teams cannot fill {} pools with two teams each",
                self.pools
            )));
        }

        Ok(())
    }
}

impl fmt::Display for PoolLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.pools, self.teams_per_pool)
    }
}

/// What the teams are sorted by before the draft.
#[derive(Clone, Copy, Debug)]
pub enum OrderingBasis<'a> {
    /// Initial level, strongest (lowest) first.
    Level,
    /// Position in a ranking, best first. Teams missing from it go last.
    Ranking(&'a [RankingEntry]),
}

/// Index of the pool for a step of the draft: `0..n`, then `n-1..0`, repeating.
#[must_use]
pub fn snake_index(step: usize, pools: usize) -> usize {
    let position = step % pools;
    if (step / pools) % 2 == 0 {
        position
    } else {
        pools - 1 - position
    }
}

/// Deals `items` (already sorted best first) into `pools` groups of at most
/// `capacity`, skipping full groups. Items left once every group is full are
/// added one per group in turn.
#[must_use]
pub fn snake_distribute<T>(items: Vec<T>, pools: usize, capacity: usize) -> Vec<Vec<T>> {
    let reserved = capacity.min(items.len());
    let mut groups: Vec<Vec<T>> = (0..pools).map(|_| Vec::with_capacity(reserved)).collect();
    if pools == 0 {
        return groups;
    }

    let mut leftovers = Vec::new();
    for (step, item) in items.into_iter().enumerate() {
        let index = snake_index(step, pools);
        let open = (0..pools)
            .map(|offset| (index + offset) % pools)
            .find(|&i| groups[i].len() < capacity);

        match open {
            Some(i) => groups[i].push(item),
            None => leftovers.push(item),
        }
    }

    for (i, item) in leftovers.into_iter().enumerate() {
        groups[i % pools].push(item);
    }

    groups
}

/// Sorts a copy of `teams` best first for the given basis.
#[must_use]
pub fn seed_order<'a>(teams: &'a [Team], basis: OrderingBasis<'_>) -> Vec<&'a Team> {
    let mut sorted: Vec<&Team> = teams.iter().collect();

    match basis {
        OrderingBasis::Level => sorted.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.id.cmp(&b.id))
        }),
        OrderingBasis::Ranking(rankings) => {
            let positions: FxHashMap<&str, usize> = rankings
                .iter()
                .enumerate()
                .map(|(position, entry)| (entry.team.as_str(), position))
                .collect();

            sorted.sort_by(|a, b| {
                let a_position = positions.get(a.id.as_str()).copied().unwrap_or(usize::MAX);
                let b_position = positions.get(b.id.as_str()).copied().unwrap_or(usize::MAX);

                a_position
                    .cmp(&b_position)
                    .then_with(|| a.level.cmp(&b.level))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
    }

    sorted
}

/// Builds the pools of a phase and their round-robin matches.
///
/// # Errors
///
/// If the layout does not fit the teams, see [`PoolLayout::validate`]. No pool
/// is built in that case.
pub fn partition(
    phase_id: &str,
    teams: &[Team],
    layout: PoolLayout,
    basis: OrderingBasis<'_>,
) -> Result<Vec<Pool>> {
    layout.validate(teams.len())?;
    debug!(
        "partition {phase_id}: {} teams into {layout}",
        teams.len()
    );

    let ids = seed_order(teams, basis)
        .into_iter()
        .map(|team| team.id.clone())
        .collect();

    let pools = snake_distribute(ids, layout.pools, layout.teams_per_pool)
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            Pool::round_robin(
                format!("{phase_id}-p{}", i + 1),
                pool_name("Pool", i),
                members,
            )
        })
        .collect();

    Ok(pools)
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;

    fn teams(count: u8) -> anyhow::Result<Vec<Team>> {
        (1..=count)
            .map(|i| Ok(Team::new(&format!("Team {i:02}"), (i - 1) % 10 + 1)?))
            .collect()
    }

    #[test]
    fn layout_heuristic() {
        let layout = |count| {
            let layout = PoolLayout::for_team_count(count);
            (layout.pools, layout.teams_per_pool)
        };

        assert_eq!(layout(4), (1, 4));
        assert_eq!(layout(5), (1, 5));
        assert_eq!(layout(6), (2, 3));
        assert_eq!(layout(7), (2, 3));
        assert_eq!(layout(8), (2, 4));
        assert_eq!(layout(9), (3, 3));
        assert_eq!(layout(10), (3, 3));
        assert_eq!(layout(11), (3, 3));
        assert_eq!(layout(13), (3, 4));
        assert_eq!(layout(16), (4, 4));
        assert_eq!(layout(22), (5, 4));
    }

    #[test]
    fn snake_walks_back_and_forth() {
        let order: Vec<_> = (0..8).map(|step| snake_index(step, 3)).collect();
        assert_eq!(order, vec![0, 1, 2, 2, 1, 0, 0, 1]);
    }

    #[test]
    fn snake_balances_strength() {
        let groups = snake_distribute((1..=8).collect(), 2, 4);
        assert_eq!(groups, vec![vec![1, 4, 5, 8], vec![2, 3, 6, 7]]);
    }

    #[test]
    fn leftovers_go_round() {
        let groups = snake_distribute((1..=11).collect(), 3, 3);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4, 3]);
        assert_eq!(groups[0], vec![1, 6, 7, 10]);
        assert_eq!(groups[1], vec![2, 5, 8, 11]);
    }

    #[test]
    fn partition_keeps_every_team_once() -> anyhow::Result<()> {
        for count in 4..=30 {
            let teams = teams(count)?;
            let layout = PoolLayout::for_team_count(teams.len());
            let pools = partition("phase", &teams, layout, OrderingBasis::Level)?;

            let mut seen = FxHashSet::default();
            for pool in &pools {
                assert!(pool.teams.len() >= 2);
                for team in &pool.teams {
                    assert!(seen.insert(team.clone()), "{team} placed twice");
                }
            }
            let expected: FxHashSet<_> = teams.iter().map(|team| team.id.clone()).collect();
            assert_eq!(seen, expected);
        }
        Ok(())
    }

    #[test]
    fn eight_teams_make_two_pools_of_four() -> anyhow::Result<()> {
        let teams = teams(8)?;
        let pools = partition(
            "phase",
            &teams,
            PoolLayout::for_team_count(8),
            OrderingBasis::Level,
        )?;

        assert_eq!(pools.len(), 2);
        for pool in &pools {
            assert_eq!(pool.teams.len(), 4);
            assert_eq!(pool.matches.len(), 6);
        }
        // levels 1, 4, 5, 8 and 2, 3, 6, 7
        assert_eq!(pools[0].teams[0], teams[0].id);
        assert_eq!(pools[0].teams[1], teams[3].id);
        assert_eq!(pools[1].teams[0], teams[1].id);
        Ok(())
    }

    #[test]
    fn ranking_basis_puts_best_first() -> anyhow::Result<()> {
        let teams = teams(4)?;
        let rankings: Vec<RankingEntry> = teams
            .iter()
            .rev()
            .map(|team| RankingEntry {
                team: team.id.clone(),
                name: team.name.clone(),
                level: team.level,
                ..RankingEntry::default()
            })
            .collect();

        let order = seed_order(&teams, OrderingBasis::Ranking(&rankings));
        assert_eq!(order[0].id, teams[3].id);
        assert_eq!(order[3].id, teams[0].id);
        Ok(())
    }

    #[test]
    fn too_few_teams_is_an_error() -> anyhow::Result<()> {
        let teams = teams(1)?;
        let layout = PoolLayout {
            pools: 1,
            teams_per_pool: 4,
        };
        assert!(matches!(
            partition("phase", &teams, layout, OrderingBasis::Level),
            Err(TournamentError::Validation(_))
        ));

        let teams = self::teams(4)?;
        let layout = PoolLayout {
            pools: 1,
            teams_per_pool: 1,
        };
        assert!(partition("phase", &teams, layout, OrderingBasis::Level).is_err());
        Ok(())
    }

    #[test]
    fn oversized_layouts_are_errors() -> anyhow::Result<()> {
        let teams = teams(8)?;
        for layout in [
            PoolLayout {
                pools: 2,
                teams_per_pool: usize::MAX,
            },
            PoolLayout {
                pools: usize::MAX,
                teams_per_pool: 4,
            },
            PoolLayout {
                pools: 1,
                teams_per_pool: 9,
            },
        ] {
            assert!(matches!(
                partition("phase", &teams, layout, OrderingBasis::Level),
                Err(TournamentError::Validation(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn huge_capacity_reserves_only_what_is_dealt() {
        let groups = snake_distribute(vec![1, 2, 3], 2, usize::MAX);
        assert_eq!(groups, vec![vec![1, 3], vec![2]]);
    }
}
