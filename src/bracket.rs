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

//! Single elimination bracket.
//!
//! The field is padded with byes up to the next power of two and shuffled.
//! Round one resolves byes at once; every other slot is a placeholder for the
//! winner of an earlier match, filled in place when that match is decided.

use std::{collections::BTreeMap, fmt};

use log::debug;
use rand::{Rng, seq::SliceRandom};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    MatchId, TeamId,
    error::{Result, TournamentError},
    status::Status,
};

/// Rounds in play order, keyed by round number starting at 1.
pub type RoundMap = BTreeMap<u32, EliminationRound>;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Slot {
    Team(TeamId),
    WinnerOf {
        match_id: MatchId,
        team: Option<TeamId>,
    },
}

impl Slot {
    #[must_use]
    pub fn team(&self) -> Option<&TeamId> {
        match self {
            Self::Team(team) => Some(team),
            Self::WinnerOf { team, .. } => team.as_ref(),
        }
    }

    fn fill(&mut self, decided: &str, winner: &TeamId) {
        if let Self::WinnerOf { match_id, team } = self
            && match_id == decided
        {
            *team = Some(winner.clone());
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team(team) => write!(f, "{team}"),
            Self::WinnerOf {
                team: Some(team), ..
            } => write!(f, "{team}"),
            Self::WinnerOf { match_id, .. } => write!(f, "winner of {match_id}"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub slots: [Slot; 2],
    #[serde(default)]
    pub score1: Option<u32>,
    #[serde(default)]
    pub score2: Option<u32>,
    #[serde(default)]
    pub winner: Option<TeamId>,
    #[serde(default)]
    pub loser: Option<TeamId>,
}

impl BracketMatch {
    fn new(id: MatchId, first: Slot, second: Slot) -> Self {
        Self {
            id,
            slots: [first, second],
            score1: None,
            score2: None,
            winner: None,
            loser: None,
        }
    }

    /// Both teams once the earlier matches are decided.
    #[must_use]
    pub fn teams(&self) -> Option<(&TeamId, &TeamId)> {
        Some((self.slots[0].team()?, self.slots[1].team()?))
    }

    #[must_use]
    pub fn status(&self) -> Status {
        Status::from_scores(self.score1, self.score2)
    }

    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    #[must_use]
    pub fn involves(&self, team: &str) -> bool {
        self.slots.iter().any(|slot| slot.team().is_some_and(|id| id == team))
    }
}

impl fmt::Display for BracketMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = |score: Option<u32>| score.map_or_else(|| "-".to_string(), |s| s.to_string());

        write!(
            f,
            "{} {} {} : {} {}",
            self.id,
            self.slots[0],
            score(self.score1),
            score(self.score2),
            self.slots[1]
        )
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EliminationRound {
    pub name: String,
    pub matches: Vec<BracketMatch>,
    /// Teams that went through this round without an opponent.
    #[serde(default)]
    pub byes: Vec<TeamId>,
    /// Who plays the next round, in bracket order.
    pub advancing: Vec<Slot>,
}

impl EliminationRound {
    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.matches.iter().all(BracketMatch::is_decided)
    }
}

impl fmt::Display for EliminationRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for game in &self.matches {
            writeln!(f, "  {game}")?;
        }
        for team in &self.byes {
            writeln!(f, "  {team} bye")?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Entrant {
    Team(TeamId),
    Bye,
    WinnerOf(MatchId),
}

impl Entrant {
    fn is_bye(&self) -> bool {
        matches!(self, Self::Bye)
    }

    fn into_slot(self) -> Option<Slot> {
        match self {
            Self::Team(team) => Some(Slot::Team(team)),
            Self::WinnerOf(match_id) => Some(Slot::WinnerOf {
                match_id,
                team: None,
            }),
            Self::Bye => None,
        }
    }
}

impl From<&Slot> for Entrant {
    fn from(slot: &Slot) -> Self {
        match slot {
            Slot::Team(team) => Self::Team(team.clone()),
            Slot::WinnerOf {
                team: Some(team), ..
            } => Self::Team(team.clone()),
            Slot::WinnerOf { match_id, .. } => Self::WinnerOf(match_id.clone()),
        }
    }
}

/// Bracket size and number of byes for `teams` entrants.
#[must_use]
pub fn bye_count(teams: usize) -> (usize, usize) {
    let size = teams.next_power_of_two();
    (size, size - teams)
}

#[must_use]
pub fn round_name(entrants: usize) -> String {
    match entrants {
        2 => "Final".to_string(),
        4 => "Semi-finals".to_string(),
        8 => "Quarter-finals".to_string(),
        _ => format!("Round of {entrants}"),
    }
}

/// Lays out rounds `1..=number_of_rounds` (all of them when `None`).
///
/// # Errors
///
/// If there are fewer than two teams, a team is listed twice, or zero rounds
/// are asked for.
pub fn build<R: Rng + ?Sized>(
    qualified: &[TeamId],
    number_of_rounds: Option<u32>,
    rng: &mut R,
) -> Result<RoundMap> {
    if qualified.len() < 2 {
        return Err(TournamentError::validation(
            "a bracket needs at least two qualified teams",
        ));
    }
    let mut seen = FxHashSet::default();
    if let Some(team) = qualified.iter().find(|team| !seen.insert(team.as_str())) {
        return Err(TournamentError::validation(format!(
            "{team} is qualified twice"
        )));
    }
    if number_of_rounds == Some(0) {
        return Err(TournamentError::validation("at least one round has to be built"));
    }

    let (size, byes) = bye_count(qualified.len());
    let total_rounds = size.trailing_zeros();
    let rounds = number_of_rounds.map_or(total_rounds, |rounds| rounds.min(total_rounds));
    debug!(
        "bracket: {} teams, {size} slots, {byes} byes, {rounds} of {total_rounds} rounds",
        qualified.len()
    );

    let mut entrants: Vec<Entrant> = qualified.iter().cloned().map(Entrant::Team).collect();
    entrants.extend(std::iter::repeat_n(Entrant::Bye, byes));
    entrants.shuffle(rng);
    separate_byes(&mut entrants);

    let mut map = RoundMap::new();
    for number in 1..=rounds {
        let round = pair_round(number, entrants);
        entrants = round.advancing.iter().map(Entrant::from).collect();
        map.insert(number, round);
    }

    Ok(map)
}

/// Swaps byes out of bye-against-bye pairs so every bye meets a team.
fn separate_byes(entrants: &mut [Entrant]) {
    let pairs = entrants.len() / 2;
    let is_double = |entrants: &[Entrant], pair: usize| {
        entrants[2 * pair].is_bye() && entrants[2 * pair + 1].is_bye()
    };
    let is_full = |entrants: &[Entrant], pair: usize| {
        !entrants[2 * pair].is_bye() && !entrants[2 * pair + 1].is_bye()
    };

    while let Some(double) = (0..pairs).find(|&pair| is_double(entrants, pair)) {
        let Some(full) = (0..pairs).find(|&pair| is_full(entrants, pair)) else {
            return;
        };
        entrants.swap(2 * double + 1, 2 * full + 1);
    }
}

fn pair_round(number: u32, entrants: Vec<Entrant>) -> EliminationRound {
    let name = round_name(entrants.len());
    let mut matches = Vec::new();
    let mut byes = Vec::new();
    let mut advancing = Vec::new();

    let mut entrants = entrants.into_iter();
    while let (Some(first), Some(second)) = (entrants.next(), entrants.next()) {
        match (first.into_slot(), second.into_slot()) {
            (Some(first), Some(second)) => {
                let id = format!("r{number}-m{}", matches.len() + 1);
                advancing.push(Slot::WinnerOf {
                    match_id: id.clone(),
                    team: None,
                });
                matches.push(BracketMatch::new(id, first, second));
            }
            (Some(slot), None) | (None, Some(slot)) => {
                if let Some(team) = slot.team() {
                    byes.push(team.clone());
                }
                advancing.push(slot);
            }
            (None, None) => {}
        }
    }

    EliminationRound {
        name,
        matches,
        byes,
        advancing,
    }
}

/// A decided match: who goes on and who is out.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decision {
    pub winner: TeamId,
    pub loser: TeamId,
}

/// Stores the scores of a bracket match and moves the winner forward.
///
/// Equal scores are kept but decide nothing; they have to be corrected before
/// the bracket can go on.
///
/// # Errors
///
/// If the round or match does not exist, if a side is still waiting for an
/// earlier result, or if the match is already decided.
pub fn record_score(
    rounds: &mut RoundMap,
    round: u32,
    match_id: &str,
    score1: u32,
    score2: u32,
) -> Result<Option<Decision>> {
    let Some(current) = rounds.get_mut(&round) else {
        return Err(TournamentError::not_found(format!("round {round}")));
    };
    let Some(game) = current.matches.iter_mut().find(|game| game.id == match_id) else {
        return Err(TournamentError::not_found(format!(
            "match {match_id} in round {round}"
        )));
    };
    if game.is_decided() {
        return Err(TournamentError::precondition(format!(
            "match {match_id} is already decided"
        )));
    }
    let Some((team1, team2)) = game.teams() else {
        return Err(TournamentError::precondition(format!(
            "match {match_id} is waiting for an earlier result"
        )));
    };
    let (team1, team2) = (team1.clone(), team2.clone());

    game.score1 = Some(score1);
    game.score2 = Some(score2);

    let decision = match score1.cmp(&score2) {
        std::cmp::Ordering::Greater => Decision {
            winner: team1,
            loser: team2,
        },
        std::cmp::Ordering::Less => Decision {
            winner: team2,
            loser: team1,
        },
        std::cmp::Ordering::Equal => return Ok(None),
    };

    game.winner = Some(decision.winner.clone());
    game.loser = Some(decision.loser.clone());

    for slot in &mut current.advancing {
        slot.fill(match_id, &decision.winner);
    }
    for later in rounds.range_mut(round + 1..).map(|(_, later)| later) {
        for game in &mut later.matches {
            for slot in &mut game.slots {
                slot.fill(match_id, &decision.winner);
            }
        }
        for slot in &mut later.advancing {
            slot.fill(match_id, &decision.winner);
        }
    }

    Ok(Some(decision))
}

/// The round following the last one built, from its winners.
///
/// # Errors
///
/// If no round exists, the last round still has undecided matches, or the
/// bracket is already finished.
pub fn next_round(rounds: &RoundMap) -> Result<(u32, EliminationRound)> {
    let Some((&number, last)) = rounds.last_key_value() else {
        return Err(TournamentError::precondition("the bracket has not been built"));
    };

    let undecided: Vec<_> = last
        .matches
        .iter()
        .filter(|game| !game.is_decided())
        .map(|game| game.id.as_str())
        .collect();
    if !undecided.is_empty() {
        return Err(TournamentError::precondition(format!(
            "{} still has undecided matches: {}",
            last.name,
            undecided.join(", ")
        )));
    }
    if last.advancing.len() < 2 {
        return Err(TournamentError::precondition("the bracket is finished"));
    }

    let entrants = last.advancing.iter().map(Entrant::from).collect();
    Ok((number + 1, pair_round(number + 1, entrants)))
}

/// The winner of the final, once played.
#[must_use]
pub fn champion(rounds: &RoundMap) -> Option<&TeamId> {
    let (_, last) = rounds.last_key_value()?;
    match last.advancing.as_slice() {
        [only] if last.matches.len() == 1 => only.team(),
        _ => None,
    }
}
