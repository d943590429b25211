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

//! The tournament document and the order its phases go in:
//!
//! initial brassage, secondary brassages, elimination seeding, bracket.
//!
//! Every operation checks everything it needs before touching the document,
//! so an error leaves the tournament as it was.

use std::{cmp::Reverse, collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    PhaseId, TeamId, TournamentId,
    bracket::{self, Decision, EliminationRound, RoundMap},
    error::{Result, TournamentError},
    partition::{OrderingBasis, PoolLayout, partition},
    phase::{Phase, PhaseKind},
    ranking::{RankingEntry, compute_rankings},
    repeats::{MatchOccurrences, RepeatReport, repeats_in_phase},
    seeding::SeedingPreview,
    table::{self, ImportReport, Table},
    team::{self, Team, new_id},
};

/// Automatic pool generation needs at least this many teams.
pub const MIN_TEAMS: usize = 4;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub teams: Vec<Team>,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub elimination: RoundMap,
    /// Only grows while the bracket is played.
    #[serde(default)]
    pub eliminated: BTreeSet<TeamId>,
    #[serde(default)]
    pub seeding_preview: Option<SeedingPreview>,
    #[serde(skip)]
    occurrences: MatchOccurrences,
}

impl Tournament {
    /// # Errors
    ///
    /// If the name is empty.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::validation("the tournament name is empty"));
        }

        Ok(Self {
            id: new_id(),
            name: name.to_string(),
            created_at: Utc::now(),
            teams: Vec::new(),
            phases: Vec::new(),
            elimination: RoundMap::new(),
            eliminated: BTreeSet::new(),
            seeding_preview: None,
            occurrences: MatchOccurrences::default(),
        })
    }

    /// Recomputes the pairs already played from the phase list. Called after
    /// every change to the phases and after loading.
    pub fn rebuild_occurrences(&mut self) {
        self.occurrences = MatchOccurrences::from_phases(&self.phases);
        debug!(
            "{}: {} pairs played in generated phases",
            self.id,
            self.occurrences.len()
        );
    }

    #[must_use]
    pub fn occurrences(&self) -> &MatchOccurrences {
        &self.occurrences
    }

    // Teams

    /// # Errors
    ///
    /// If the id is unknown.
    pub fn team(&self, id: &str) -> Result<&Team> {
        team::find_by_id(&self.teams, id)
            .ok_or_else(|| TournamentError::not_found(format!("team {id}")))
    }

    /// Finds a team by id, or else by name.
    ///
    /// # Errors
    ///
    /// If no team matches.
    pub fn resolve_team(&self, id_or_name: &str) -> Result<&Team> {
        team::find_by_id(&self.teams, id_or_name)
            .or_else(|| team::find_by_name(&self.teams, id_or_name))
            .ok_or_else(|| TournamentError::not_found(format!("team {id_or_name}")))
    }

    /// # Errors
    ///
    /// If the name is empty or taken, or the level is out of range.
    pub fn add_team(&mut self, name: &str, level: u8) -> Result<TeamId> {
        let team = Team::new(name, level)?;
        team::ensure_unique_name(&self.teams, &team.name, None)?;

        info!("{}: added team {team}", self.id);
        let id = team.id.clone();
        self.teams.push(team);

        Ok(id)
    }

    /// # Errors
    ///
    /// If the team is unknown, the new name is empty or taken, or the level is
    /// out of range.
    pub fn update_team(&mut self, id: &str, name: Option<&str>, level: Option<u8>) -> Result<()> {
        let name = name.map(team::validate_name).transpose()?;
        if let Some(name) = &name {
            team::ensure_unique_name(&self.teams, name, Some(id))?;
        }
        if let Some(level) = level {
            team::validate_level(level)?;
        }

        let Some(team) = self.teams.iter_mut().find(|team| team.id == id) else {
            return Err(TournamentError::not_found(format!("team {id}")));
        };
        if let Some(name) = name {
            team.name = name;
        }
        if let Some(level) = level {
            team.level = level;
        }

        info!("{}: updated team {team}", self.id);
        Ok(())
    }

    /// Removes a team from the roster, the eliminated set and the seeding
    /// preview. Pools it already played in keep its id.
    ///
    /// # Errors
    ///
    /// If the team is unknown.
    pub fn delete_team(&mut self, id: &str) -> Result<Team> {
        let Some(position) = self.teams.iter().position(|team| team.id == id) else {
            return Err(TournamentError::not_found(format!("team {id}")));
        };

        let team = self.teams.remove(position);
        self.eliminated.remove(id);
        if let Some(preview) = &mut self.seeding_preview {
            for group in &mut preview.groups {
                group.teams.retain(|member| member.id != id);
            }
            preview.unassigned.retain(|member| member.id != id);
        }
        if self
            .phases
            .iter()
            .any(|phase| phase.pools.iter().any(|pool| pool.contains(id)))
        {
            warn!("{}: deleted team {team} still appears in pools", self.id);
        }

        info!("{}: deleted team {team}", self.id);
        Ok(team)
    }

    // Phases

    /// # Errors
    ///
    /// If the id is unknown.
    pub fn phase(&self, id: &str) -> Result<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.id == id)
            .ok_or_else(|| TournamentError::not_found(format!("phase {id}")))
    }

    /// The phase a match belongs to.
    ///
    /// # Errors
    ///
    /// If no phase has this match.
    pub fn phase_of_match(&self, match_id: &str) -> Result<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.find_match(match_id).is_some())
            .ok_or_else(|| TournamentError::not_found(format!("match {match_id}")))
    }

    /// The brassage phase still being played, or else the last one.
    #[must_use]
    pub fn current_brassage(&self) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.kind.is_brassage() && !phase.generated)
            .or_else(|| self.phases.iter().rev().find(|phase| phase.kind.is_brassage()))
    }

    #[must_use]
    pub fn has_phase(&self, kind: PhaseKind) -> bool {
        self.phases.iter().any(|phase| phase.kind == kind)
    }

    #[must_use]
    pub fn seeding_phase(&self) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.kind == PhaseKind::EliminationSeeding)
    }

    fn ensure_enough_teams(&self) -> Result<()> {
        if self.teams.len() < MIN_TEAMS {
            return Err(TournamentError::validation(format!(
                "at least {MIN_TEAMS} teams are needed, there are {}",
                self.teams.len()
            )));
        }
        Ok(())
    }

    fn ensure_brassages_generated(&self) -> Result<()> {
        if let Some(phase) = self
            .phases
            .iter()
            .find(|phase| phase.kind.is_brassage() && !phase.generated)
        {
            return Err(TournamentError::precondition(format!(
                "{} still has matches without scores",
                phase.name
            )));
        }
        Ok(())
    }

    fn push_phase(&mut self, mut phase: Phase) -> PhaseId {
        phase.refresh(&self.teams);
        let id = phase.id.clone();

        info!(
            "{}: generated {} ({}) with {} pools",
            self.id,
            phase.name,
            phase.kind,
            phase.pools.len()
        );
        self.phases.push(phase);
        self.rebuild_occurrences();

        id
    }

    /// Builds the first brassage from the team levels.
    ///
    /// # Errors
    ///
    /// If there are fewer than four teams, any phase already exists, or the
    /// layout does not fit the teams.
    pub fn generate_initial(&mut self, layout: Option<PoolLayout>) -> Result<PhaseId> {
        self.ensure_enough_teams()?;
        if let Some(phase) = self.phases.first() {
            return Err(TournamentError::precondition(format!(
                "{} already exists, clear the phases to start over",
                phase.name
            )));
        }

        let layout = layout.unwrap_or_else(|| PoolLayout::for_team_count(self.teams.len()));
        let id = Phase::new_id();
        let pools = partition(&id, &self.teams, layout, OrderingBasis::Level)?;
        let phase = Phase::new(
            id,
            "Initial brassage".to_string(),
            PhaseKind::InitialBrassage,
            pools,
        );

        Ok(self.push_phase(phase))
    }

    /// Builds another brassage from the ranking over every generated
    /// brassage so far.
    ///
    /// # Errors
    ///
    /// If there is no initial brassage, a brassage is still being played, the
    /// seeding is committed, there are fewer than four teams, or the layout
    /// does not fit the teams.
    pub fn generate_secondary(&mut self, layout: Option<PoolLayout>) -> Result<PhaseId> {
        self.ensure_enough_teams()?;
        if !self.has_phase(PhaseKind::InitialBrassage) {
            return Err(TournamentError::precondition(
                "the initial brassage has not been generated",
            ));
        }
        if self.has_phase(PhaseKind::EliminationSeeding) {
            return Err(TournamentError::precondition(
                "the elimination seeding is already committed",
            ));
        }
        self.ensure_brassages_generated()?;

        let rankings = self.rankings();
        let layout = layout.unwrap_or_else(|| PoolLayout::for_team_count(self.teams.len()));
        let id = Phase::new_id();
        let pools = partition(&id, &self.teams, layout, OrderingBasis::Ranking(&rankings))?;

        let number = self
            .phases
            .iter()
            .filter(|phase| phase.kind == PhaseKind::SecondaryBrassage)
            .count()
            + 1;
        let phase = Phase::new(
            id,
            format!("Secondary brassage {number}"),
            PhaseKind::SecondaryBrassage,
            pools,
        );

        let repeats = repeats_in_phase(&self.occurrences, &phase, &self.phases);
        for report in &repeats {
            debug!("{}: {report}", self.id);
        }

        self.seeding_preview = None;
        Ok(self.push_phase(phase))
    }

    /// # Errors
    ///
    /// If the phase or match is unknown, or the phase is not a brassage still
    /// being played.
    pub fn record_score(
        &mut self,
        phase_id: &str,
        match_id: &str,
        score1: u32,
        score2: u32,
    ) -> Result<()> {
        let phase = self.open_brassage_mut(phase_id)?;
        let Some(game) = phase.find_match_mut(match_id) else {
            return Err(TournamentError::not_found(format!("match {match_id}")));
        };

        game.set_scores(score1, score2);
        debug!("{phase_id}: {game}");
        self.refresh_phase(phase_id);

        Ok(())
    }

    /// # Errors
    ///
    /// If the phase or match is unknown, or the phase is not a brassage still
    /// being played.
    pub fn clear_score(&mut self, phase_id: &str, match_id: &str) -> Result<()> {
        let phase = self.open_brassage_mut(phase_id)?;
        let Some(game) = phase.find_match_mut(match_id) else {
            return Err(TournamentError::not_found(format!("match {match_id}")));
        };

        game.clear_scores();
        self.refresh_phase(phase_id);

        Ok(())
    }

    fn open_brassage_mut(&mut self, phase_id: &str) -> Result<&mut Phase> {
        let Some(phase) = self.phases.iter_mut().find(|phase| phase.id == phase_id) else {
            return Err(TournamentError::not_found(format!("phase {phase_id}")));
        };
        if !phase.kind.is_brassage() {
            return Err(TournamentError::precondition(format!(
                "{} has no matches to score",
                phase.name
            )));
        }
        if phase.generated {
            return Err(TournamentError::precondition(format!(
                "{} is generated, its scores are final",
                phase.name
            )));
        }

        Ok(phase)
    }

    fn refresh_phase(&mut self, phase_id: &str) {
        let teams = &self.teams;
        let Some(phase) = self.phases.iter_mut().find(|phase| phase.id == phase_id) else {
            return;
        };

        if phase.refresh(teams) {
            info!("{}: {} is generated", self.id, phase.name);
            self.rebuild_occurrences();
        }
    }

    /// Removes the last phase while nothing depends on it: a brassage with
    /// scores still missing, or the seeding before the bracket is built.
    ///
    /// # Errors
    ///
    /// If there are no phases or the last one can no longer be removed.
    pub fn delete_last_phase(&mut self) -> Result<Phase> {
        let Some(last) = self.phases.last() else {
            return Err(TournamentError::precondition("there are no phases"));
        };
        if last.kind.is_brassage() && last.generated {
            return Err(TournamentError::precondition(format!(
                "{} is generated and counts in the rankings",
                last.name
            )));
        }
        if last.kind == PhaseKind::EliminationSeeding && !self.elimination.is_empty() {
            return Err(TournamentError::precondition(
                "the bracket is built from the seeding",
            ));
        }

        let Some(phase) = self.phases.pop() else {
            return Err(TournamentError::precondition("there are no phases"));
        };
        self.seeding_preview = None;
        self.rebuild_occurrences();

        info!("{}: deleted {}", self.id, phase.name);
        Ok(phase)
    }

    /// Back to no phases: brassages, seeding, bracket and eliminations.
    pub fn clear_all_phases(&mut self) {
        self.phases.clear();
        self.elimination.clear();
        self.eliminated.clear();
        self.seeding_preview = None;
        self.rebuild_occurrences();

        info!("{}: cleared all phases", self.id);
    }

    // Rankings

    #[must_use]
    pub fn rankings(&self) -> Vec<RankingEntry> {
        compute_rankings(&self.teams, &self.phases)
    }

    /// # Errors
    ///
    /// If the phase is unknown.
    pub fn repeats_in_phase(&self, phase_id: &str) -> Result<Vec<RepeatReport>> {
        let phase = self.phase(phase_id)?;
        Ok(repeats_in_phase(&self.occurrences, phase, &self.phases))
    }

    /// Every team, those furthest in the bracket first, then by ranking.
    #[must_use]
    pub fn global_standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .rankings()
            .into_iter()
            .map(|ranking| {
                let mut furthest_round = 0;
                let mut elimination_wins = 0;

                for (&number, round) in &self.elimination {
                    let played = round.matches.iter().any(|game| game.involves(&ranking.team));
                    if played || round.byes.contains(&ranking.team) {
                        furthest_round = number;
                    }
                    elimination_wins += round
                        .matches
                        .iter()
                        .filter(|game| game.winner.as_ref() == Some(&ranking.team))
                        .count();
                }

                Standing {
                    eliminated: self.eliminated.contains(&ranking.team),
                    ranking,
                    furthest_round,
                    elimination_wins,
                }
            })
            .collect();

        standings.sort_by_key(|standing| (Reverse(standing.furthest_round), standing.eliminated));
        standings
    }

    // Elimination

    /// Snake-drafts the best ranked teams into groups, waiting for review.
    ///
    /// # Errors
    ///
    /// If no brassage has been played to the end, a brassage is still being
    /// played, the seeding is already committed, or the groups do not fit.
    pub fn prepare_elimination_seeding(
        &mut self,
        groups: usize,
        teams_per_group: usize,
    ) -> Result<&SeedingPreview> {
        if !self.phases.iter().any(|phase| phase.kind.is_brassage()) {
            return Err(TournamentError::precondition("no brassage has been played"));
        }
        if self.has_phase(PhaseKind::EliminationSeeding) {
            return Err(TournamentError::precondition(
                "the elimination seeding is already committed",
            ));
        }
        self.ensure_brassages_generated()?;

        let preview = SeedingPreview::build(&self.teams, &self.rankings(), groups, teams_per_group)?;
        info!(
            "{}: seeding preview of {groups} groups of {teams_per_group}",
            self.id
        );

        Ok(self.seeding_preview.insert(preview))
    }

    /// # Errors
    ///
    /// If there is no preview, or the groups or team are unknown.
    pub fn move_seeded_team(&mut self, team: &str, from: usize, to: usize) -> Result<()> {
        let Some(preview) = &mut self.seeding_preview else {
            return Err(TournamentError::precondition("there is no seeding preview"));
        };

        preview.move_team(team, from, to)?;
        debug!("{}: moved {team} from group {from} to group {to}", self.id);
        Ok(())
    }

    /// Turns the preview into the elimination seeding phase.
    ///
    /// # Errors
    ///
    /// If there is no preview, the seeding is already committed, or the
    /// groups are uneven, duplicated or hold unknown teams.
    pub fn commit_seeding(&mut self) -> Result<PhaseId> {
        let Some(preview) = &self.seeding_preview else {
            return Err(TournamentError::precondition("there is no seeding preview"));
        };
        if self.has_phase(PhaseKind::EliminationSeeding) {
            return Err(TournamentError::precondition(
                "the elimination seeding is already committed",
            ));
        }
        preview.validate(&self.teams)?;

        let id = Phase::new_id();
        let phase = Phase::new(
            id.clone(),
            "Elimination seeding".to_string(),
            PhaseKind::EliminationSeeding,
            preview.to_pools(&id),
        );

        self.seeding_preview = None;
        Ok(self.push_phase(phase))
    }

    /// Lays out the bracket for the committed groups.
    ///
    /// # Errors
    ///
    /// If the seeding is not committed, the bracket already exists, a seeded
    /// team has left the roster, or there are fewer than two qualified teams.
    pub fn build_bracket<R: Rng + ?Sized>(
        &mut self,
        number_of_rounds: Option<u32>,
        rng: &mut R,
    ) -> Result<()> {
        let Some(seeding) = self.seeding_phase() else {
            return Err(TournamentError::precondition(
                "the elimination seeding is not committed",
            ));
        };
        if !self.elimination.is_empty() {
            return Err(TournamentError::precondition(
                "the bracket is already built, clear the phases to start over",
            ));
        }

        let qualified: Vec<TeamId> = seeding.team_ids().into_iter().map(str::to_string).collect();
        if let Some(missing) = qualified
            .iter()
            .find(|id| !self.teams.iter().any(|team| &team.id == *id))
        {
            return Err(TournamentError::validation(format!(
                "seeded team {missing} is no longer registered, delete the seeding and seed again"
            )));
        }
        let rounds = bracket::build(&qualified, number_of_rounds, rng)?;

        info!(
            "{}: built a bracket for {} teams with {} rounds",
            self.id,
            qualified.len(),
            rounds.len()
        );
        self.elimination = rounds;
        Ok(())
    }

    /// Scores a bracket match. The loser is eliminated.
    ///
    /// # Errors
    ///
    /// See [`bracket::record_score`].
    pub fn record_bracket_score(
        &mut self,
        round: u32,
        match_id: &str,
        score1: u32,
        score2: u32,
    ) -> Result<Option<Decision>> {
        let decision = bracket::record_score(&mut self.elimination, round, match_id, score1, score2)?;

        match &decision {
            Some(decision) => {
                info!(
                    "{}: {match_id} won by {}, {} is eliminated",
                    self.id, decision.winner, decision.loser
                );
                self.eliminated.insert(decision.loser.clone());
            }
            None => warn!("{}: {match_id} is tied and has to be replayed", self.id),
        }

        if let Some(current) = self.elimination.get(&round)
            && current.is_decided()
        {
            info!("{}: {} is decided", self.id, current.name);
        }
        if let Some(champion) = bracket::champion(&self.elimination) {
            info!("{}: {champion} wins the tournament", self.id);
        }

        Ok(decision)
    }

    /// Adds the round after the last one built, from its winners.
    ///
    /// # Errors
    ///
    /// See [`bracket::next_round`].
    pub fn advance_bracket(&mut self) -> Result<u32> {
        let (number, round) = bracket::next_round(&self.elimination)?;

        info!("{}: advanced to {}", self.id, round.name);
        self.elimination.insert(number, round);
        Ok(number)
    }

    /// # Errors
    ///
    /// If the round is unknown.
    pub fn round(&self, number: u32) -> Result<&EliminationRound> {
        self.elimination
            .get(&number)
            .ok_or_else(|| TournamentError::not_found(format!("round {number}")))
    }

    /// The round a bracket match belongs to.
    #[must_use]
    pub fn round_of_match(&self, match_id: &str) -> Option<u32> {
        self.elimination
            .iter()
            .find(|(_, round)| round.matches.iter().any(|game| game.id == match_id))
            .map(|(&number, _)| number)
    }

    #[must_use]
    pub fn champion(&self) -> Option<&Team> {
        let id = bracket::champion(&self.elimination)?;
        team::find_by_id(&self.teams, id)
    }

    // Tables

    /// Scores the matches of a brassage from a table with the columns
    /// `team1, team2, score1, score2`. Rows that cannot be matched are
    /// reported and skipped.
    ///
    /// # Errors
    ///
    /// If the phase is unknown or not being played, or a column is missing.
    pub fn import_scores(&mut self, phase_id: &str, table: &Table) -> Result<ImportReport> {
        self.open_brassage_mut(phase_id)?;
        let (rows, mut errors) = table::score_rows(table)?;
        let mut imported = 0;

        let teams = &self.teams;
        let Some(phase) = self.phases.iter_mut().find(|phase| phase.id == phase_id) else {
            return Err(TournamentError::not_found(format!("phase {phase_id}")));
        };
        for row in rows {
            let resolved = team::find_by_name(teams, &row.team1)
                .zip(team::find_by_name(teams, &row.team2));
            let Some((team1, team2)) = resolved else {
                errors.push(format!(
                    "line {}: unknown team in {} - {}",
                    row.line, row.team1, row.team2
                ));
                continue;
            };

            let game = phase
                .pools
                .iter_mut()
                .flat_map(|pool| pool.matches.iter_mut())
                .find(|game| !game.is_scored() && game.is_between(&team1.id, &team2.id));
            let Some(game) = game else {
                errors.push(format!(
                    "line {}: no unscored match between {} and {}",
                    row.line, team1.name, team2.name
                ));
                continue;
            };

            if game.team1 == team1.id {
                game.set_scores(row.score1, row.score2);
            } else {
                game.set_scores(row.score2, row.score1);
            }
            imported += 1;
        }

        for error in &errors {
            warn!("{}: import skipped {error}", self.id);
        }
        self.refresh_phase(phase_id);
        info!("{}: imported {imported} scores", self.id);

        Ok(ImportReport { imported, errors })
    }

    /// # Errors
    ///
    /// If the phase is unknown.
    pub fn export_scores(&self, phase_id: &str) -> Result<Table> {
        let phase = self.phase(phase_id)?;
        Ok(table::scores_table(phase, &self.teams))
    }
}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({} teams)", self.id, self.name, self.teams.len())?;
        for phase in &self.phases {
            write!(f, "{phase}")?;
        }
        if let Some(preview) = &self.seeding_preview {
            writeln!(f, "Seeding preview")?;
            write!(f, "{preview}")?;
        }
        for round in self.elimination.values() {
            write!(f, "{round}")?;
        }

        Ok(())
    }
}

/// A team's place over the whole tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Standing {
    pub ranking: RankingEntry,
    /// Last bracket round the team has a place in, 0 when it did not qualify.
    /// A bye counts as reaching the next round, so a team sitting in a later
    /// round's slot reached it even before that match is played.
    pub furthest_round: u32,
    pub elimination_wins: usize,
    pub eliminated: bool,
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} round: {} wins: {}{}",
            self.ranking,
            self.furthest_round,
            self.elimination_wins,
            if self.eliminated { " out" } else { "" }
        )
    }
}
