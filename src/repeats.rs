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

//! Which pairs of teams already met, and in which phases.
//!
//! The index is derived from the phase list and never saved. Repeats are only
//! reported; pools are never rebuilt to avoid them.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::{MatchId, PhaseId, TeamId, phase::Phase};

/// Unordered pair of team ids, smallest first.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PairKey(TeamId, TeamId);

impl PairKey {
    #[must_use]
    pub fn new(first: &str, second: &str) -> Self {
        if first <= second {
            Self(first.to_string(), second.to_string())
        } else {
            Self(second.to_string(), first.to_string())
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.0, self.1)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchOccurrences(FxHashMap<PairKey, FxHashSet<PhaseId>>);

impl MatchOccurrences {
    /// Full recompute over the generated brassage phases.
    #[must_use]
    pub fn from_phases(phases: &[Phase]) -> Self {
        let mut occurrences: FxHashMap<PairKey, FxHashSet<PhaseId>> = FxHashMap::default();

        for phase in phases
            .iter()
            .filter(|phase| phase.kind.is_brassage() && phase.generated)
        {
            for game in phase.matches() {
                occurrences
                    .entry(PairKey::new(&game.team1, &game.team2))
                    .or_default()
                    .insert(phase.id.clone());
            }
        }

        Self(occurrences)
    }

    /// Whether the pair met in a phase other than `exclude`.
    #[must_use]
    pub fn is_repeated(&self, first: &str, second: &str, exclude: &str) -> bool {
        self.0
            .get(&PairKey::new(first, second))
            .is_some_and(|phases| phases.iter().any(|phase| phase != exclude))
    }

    /// Names of the other phases the pair met in, in phase order.
    #[must_use]
    pub fn previous_phase_names(
        &self,
        first: &str,
        second: &str,
        exclude: &str,
        phases: &[Phase],
    ) -> Vec<String> {
        let Some(met) = self.0.get(&PairKey::new(first, second)) else {
            return Vec::new();
        };

        phases
            .iter()
            .filter(|phase| phase.id != exclude && met.contains(&phase.id))
            .map(|phase| phase.name.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RepeatReport {
    pub match_id: MatchId,
    pub team1: TeamId,
    pub team2: TeamId,
    pub previous_phases: Vec<String>,
}

impl fmt::Display for RepeatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} vs {} already met in {}",
            self.match_id,
            self.team1,
            self.team2,
            self.previous_phases.join(", ")
        )
    }
}

/// Every match of `phase` whose pair already met elsewhere.
#[must_use]
pub fn repeats_in_phase(
    occurrences: &MatchOccurrences,
    phase: &Phase,
    phases: &[Phase],
) -> Vec<RepeatReport> {
    phase
        .matches()
        .filter(|game| occurrences.is_repeated(&game.team1, &game.team2, &phase.id))
        .map(|game| RepeatReport {
            match_id: game.id.clone(),
            team1: game.team1.clone(),
            team2: game.team2.clone(),
            previous_phases: occurrences.previous_phase_names(
                &game.team1,
                &game.team2,
                &phase.id,
                phases,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{phase::PhaseKind, pool::Pool};

    fn phase(id: &str, teams: &[&str], generated: bool) -> Phase {
        let pool = Pool::round_robin(
            format!("{id}-p1"),
            "Pool A".to_string(),
            teams.iter().map(ToString::to_string).collect(),
        );
        let mut phase = Phase::new(
            id.to_string(),
            format!("Brassage {id}"),
            PhaseKind::SecondaryBrassage,
            vec![pool],
        );
        phase.generated = generated;
        phase
    }

    #[test]
    fn pair_key_ignores_order() {
        assert_eq!(PairKey::new("b", "a"), PairKey::new("a", "b"));
        assert_eq!(PairKey::new("b", "a").to_string(), "a|b");
    }

    #[test]
    fn pair_in_two_phases_is_repeated() {
        let phases = vec![
            phase("1", &["a", "b", "c"], true),
            phase("2", &["b", "a", "d"], true),
        ];
        let occurrences = MatchOccurrences::from_phases(&phases);

        assert!(occurrences.is_repeated("a", "b", "1"));
        assert!(occurrences.is_repeated("b", "a", "2"));
        assert!(!occurrences.is_repeated("a", "c", "1"));
        assert!(!occurrences.is_repeated("a", "d", "2"));
        assert_eq!(
            occurrences.previous_phase_names("a", "b", "2", &phases),
            vec!["Brassage 1".to_string()]
        );
    }

    #[test]
    fn unfinished_phases_are_not_history() {
        let phases = vec![
            phase("1", &["a", "b"], true),
            phase("2", &["a", "b"], false),
        ];
        let occurrences = MatchOccurrences::from_phases(&phases);

        assert!(occurrences.is_repeated("a", "b", "2"));
        assert!(!occurrences.is_repeated("a", "b", "1"));
        assert_eq!(occurrences.len(), 1);

        let reports = repeats_in_phase(&occurrences, &phases[1], &phases);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].previous_phases, vec!["Brassage 1".to_string()]);
    }

    #[test]
    fn never_played_is_not_repeated() {
        let occurrences = MatchOccurrences::from_phases(&[]);
        assert!(occurrences.is_empty());
        assert!(!occurrences.is_repeated("a", "b", "1"));
    }
}
