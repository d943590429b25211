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

//! Cumulative rankings from brassage results.
//!
//! Only brassage phases count, and only once they are generated. Ordering is
//! points, then score difference, then the stronger level, then the name.

use std::{cmp::Ordering, fmt};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    PhaseId, TeamId,
    phase::Phase,
    status::Status,
    team::Team,
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PhaseBreakdown {
    pub phase: PhaseId,
    pub points: u32,
    pub difference: i64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RankingEntry {
    pub team: TeamId,
    pub name: String,
    pub level: u8,
    pub points: u32,
    pub difference: i64,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub phases: Vec<PhaseBreakdown>,
}

impl RankingEntry {
    fn new(team: &Team) -> Self {
        Self {
            team: team.id.clone(),
            name: team.name.clone(),
            level: team.level,
            ..Self::default()
        }
    }

    fn add(&mut self, phase: &PhaseId, points: u32, difference: i64, status: Status, first: bool) {
        self.points += points;
        self.difference += difference;
        self.played += 1;

        match status {
            Status::Tie => self.ties += 1,
            Status::Team1Wins if first => self.wins += 1,
            Status::Team2Wins if !first => self.wins += 1,
            Status::Team1Wins | Status::Team2Wins => self.losses += 1,
            Status::Unplayed => {}
        }

        match self.phases.iter_mut().find(|entry| &entry.phase == phase) {
            Some(entry) => {
                entry.points += points;
                entry.difference += difference;
            }
            None => self.phases.push(PhaseBreakdown {
                phase: phase.clone(),
                points,
                difference,
            }),
        }
    }
}

impl fmt::Display for RankingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:>4} {:>+5} {:>3} {:>3}-{}-{}",
            self.name, self.points, self.difference, self.played, self.wins, self.losses, self.ties
        )
    }
}

/// Total order used by every ranking.
#[must_use]
pub fn compare(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.difference.cmp(&a.difference))
        .then_with(|| a.level.cmp(&b.level))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.team.cmp(&b.team))
}

/// Global ranking over every generated brassage phase. Every team appears,
/// teams without results at zero.
#[must_use]
pub fn compute_rankings(teams: &[Team], phases: &[Phase]) -> Vec<RankingEntry> {
    let counted = phases
        .iter()
        .filter(|phase| phase.kind.is_brassage() && phase.generated);

    tally(teams.iter(), counted)
}

/// Live standings of the teams of one phase from whatever is scored so far.
#[must_use]
pub fn phase_standings(teams: &[Team], phase: &Phase) -> Vec<RankingEntry> {
    let ids = phase.team_ids();
    let members = teams.iter().filter(|team| ids.contains(&team.id.as_str()));

    tally(members, std::iter::once(phase))
}

fn tally<'a>(
    teams: impl Iterator<Item = &'a Team>,
    phases: impl Iterator<Item = &'a Phase>,
) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = teams.map(RankingEntry::new).collect();
    let index: FxHashMap<TeamId, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.team.clone(), i))
        .collect();

    for phase in phases {
        for game in phase.matches() {
            let Some(points) = game.points() else {
                continue;
            };
            let status = game.status();

            if let Some(&i) = index.get(&game.team1) {
                entries[i].add(&phase.id, points.team1, points.difference1, status, true);
            }
            if let Some(&i) = index.get(&game.team2) {
                entries[i].add(&phase.id, points.team2, points.difference2, status, false);
            }
        }
    }

    entries.sort_by(compare);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{phase::PhaseKind, pool::Pool};

    fn teams() -> anyhow::Result<Vec<Team>> {
        Ok(vec![
            Team::new("Aces", 3)?,
            Team::new("Blockers", 1)?,
            Team::new("Diggers", 2)?,
            Team::new("Setters", 2)?,
        ])
    }

    fn phase(teams: &[Team], generated: bool) -> Phase {
        let pool = Pool::round_robin(
            "p".to_string(),
            "Pool A".to_string(),
            teams.iter().map(|team| team.id.clone()).collect(),
        );
        let mut phase = Phase::new(
            "phase".to_string(),
            "Brassage 1".to_string(),
            PhaseKind::InitialBrassage,
            vec![pool],
        );
        phase.generated = generated;
        phase
    }

    #[test]
    fn no_results_orders_by_level_then_name() -> anyhow::Result<()> {
        let teams = teams()?;
        let rankings = compute_rankings(&teams, &[]);
        let names: Vec<_> = rankings.iter().map(|entry| entry.name.as_str()).collect();

        assert_eq!(names, vec!["Blockers", "Diggers", "Setters", "Aces"]);
        Ok(())
    }

    #[test]
    fn names_order_ignoring_case() -> anyhow::Result<()> {
        let teams = vec![
            Team::new("Zebra", 2)?,
            Team::new("aces", 2)?,
            Team::new("Blockers", 2)?,
        ];
        let rankings = compute_rankings(&teams, &[]);
        let names: Vec<_> = rankings.iter().map(|entry| entry.name.as_str()).collect();

        assert_eq!(names, vec!["aces", "Blockers", "Zebra"]);
        Ok(())
    }

    #[test]
    fn points_and_difference() -> anyhow::Result<()> {
        let teams = teams()?;
        let mut phase = phase(&teams[..2], true);
        phase.pools[0].matches[0].set_scores(21, 10);

        let rankings = compute_rankings(&teams, &[phase]);
        let aces = rankings.iter().find(|entry| entry.name == "Aces").unwrap();
        let blockers = rankings.iter().find(|entry| entry.name == "Blockers").unwrap();

        assert_eq!((aces.points, aces.difference), (8, 11));
        assert_eq!((blockers.points, blockers.difference), (1, -11));
        assert_eq!(rankings[0].name, "Aces");
        assert_eq!((aces.wins, aces.losses, blockers.losses), (1, 0, 1));
        assert_eq!(aces.phases.len(), 1);
        Ok(())
    }

    #[test]
    fn unfinished_phases_do_not_count() -> anyhow::Result<()> {
        let teams = teams()?;
        let mut phase = phase(&teams, false);
        phase.pools[0].matches[0].set_scores(25, 0);

        let rankings = compute_rankings(&teams, &[phase.clone()]);
        assert!(rankings.iter().all(|entry| entry.points == 0));

        let standings = phase_standings(&teams, &phase);
        assert_eq!(standings[0].points, 8);
        Ok(())
    }

    #[test]
    fn seeding_phases_do_not_count() -> anyhow::Result<()> {
        let teams = teams()?;
        let mut phase = phase(&teams, true);
        phase.kind = PhaseKind::EliminationSeeding;
        phase.pools[0].matches[0].set_scores(25, 0);

        assert!(
            compute_rankings(&teams, &[phase])
                .iter()
                .all(|entry| entry.points == 0)
        );
        Ok(())
    }

    #[test]
    fn difference_breaks_equal_points() -> anyhow::Result<()> {
        let teams = teams()?;
        let mut phase = phase(&teams, true);
        // Aces-Blockers, Aces-Diggers, Aces-Setters, Blockers-Diggers,
        // Blockers-Setters, Diggers-Setters
        let scores = [(25, 20), (10, 25), (25, 23), (25, 5), (10, 25), (25, 24)];
        for (game, (score1, score2)) in phase.pools[0].matches.iter_mut().zip(scores) {
            game.set_scores(score1, score2);
        }

        let first = compute_rankings(&teams, &[phase.clone()]);
        let second = compute_rankings(&teams, &[phase]);
        assert_eq!(first, second);

        for pair in first.windows(2) {
            assert_ne!(compare(&pair[0], &pair[1]), Ordering::Greater);
        }
        Ok(())
    }
}
