//! A volleyball tournament engine: teams, round-robin "brassage" pools,
//! rankings and a single-elimination bracket.
//!
//! ## Phases
//!
//! A tournament goes through an initial brassage built from the team levels,
//! any number of secondary brassages built from the cumulative ranking, an
//! elimination seeding that groups the best teams, and a bracket.
//!
//! ## Points
//!
//! A win is worth 8 points. The loser gets 4, 3, 2 or 1 points for a margin of
//! 1 to 3, 4 to 6, 7 to 9, or 10 and more. A tie gives both sides 4.
//!
//! ## Feature Flags
//!
//! * bench - enable the criterion benchmarks

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

#![deny(clippy::panic)]

pub mod bracket;
pub mod error;
pub mod partition;
pub mod phase;
pub mod pool;
pub mod ranking;
pub mod repeats;
pub mod score;
pub mod seeding;
pub mod status;
pub mod store;
pub mod table;
pub mod team;
pub mod tournament;
pub mod utils;

pub type TeamId = String;
pub type MatchId = String;
pub type PhaseId = String;
pub type TournamentId = String;

pub const HOME: &str = "brassage";

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2026 Developers of the brassage project

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2026 Developers of the brassage project
Licensed under the AGPLv3"
);

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use error::TournamentError;
    use phase::PhaseKind;
    use score::Match;
    use tournament::Tournament;

    fn assert_error_str<T>(result: error::Result<T>, string: &str) {
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.to_string(), string);
        }
    }

    fn levels(count: u8) -> anyhow::Result<Tournament> {
        let mut tournament = Tournament::new("Scenario")?;
        for level in 1..=count {
            tournament.add_team(&format!("Level {level}"), level.min(10))?;
        }
        Ok(tournament)
    }

    #[test]
    fn eight_teams_initial_brassage() -> anyhow::Result<()> {
        let mut tournament = levels(8)?;
        let initial = tournament.generate_initial(None)?;
        let phase = tournament.phase(&initial)?;

        assert_eq!(phase.kind, PhaseKind::InitialBrassage);
        assert_eq!(phase.pools.len(), 2);
        assert!(phase.pools.iter().all(|pool| pool.teams.len() == 4));
        assert!(phase.pools.iter().all(|pool| pool.matches.len() == 6));
        assert_eq!(phase.matches().count(), 12);
        Ok(())
    }

    #[test]
    fn twenty_one_ten() {
        let mut game = Match::new("m".to_string(), "a".to_string(), "b".to_string());
        game.set_scores(21, 10);

        let points = game.points();
        assert_eq!(points.map(|points| (points.team1, points.team2)), Some((8, 1)));
        assert_eq!(
            points.map(|points| (points.difference1, points.difference2)),
            Some((11, -11))
        );
        assert_eq!(game.winner.as_deref(), Some("a"));
        assert_eq!(game.loser.as_deref(), Some("b"));
    }

    #[test]
    fn five_qualified_teams() -> anyhow::Result<()> {
        let qualified: Vec<TeamId> = (1..=5).map(|i| format!("team-{i}")).collect();
        let mut rng = StdRng::seed_from_u64(2026);
        let rounds = bracket::build(&qualified, Some(1), &mut rng)?;

        assert_eq!(bracket::bye_count(5), (8, 3));
        assert_eq!(rounds[&1].matches.len(), 1);
        assert_eq!(rounds[&1].byes.len(), 3);
        Ok(())
    }

    #[test]
    fn errors_name_their_kind() -> anyhow::Result<()> {
        let mut tournament = levels(3)?;

        assert_error_str(
            tournament.generate_initial(None),
            "validation: at least 4 teams are needed, there are 3",
        );
        assert_error_str(
            tournament.generate_secondary(None),
            "validation: at least 4 teams are needed, there are 3",
        );
        assert_error_str(
            tournament.commit_seeding(),
            "precondition: there is no seeding preview",
        );
        assert!(matches!(
            tournament.phase("phase-0"),
            Err(TournamentError::NotFound(_))
        ));
        Ok(())
    }
}
