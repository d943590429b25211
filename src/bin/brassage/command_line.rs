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

use std::{io::Write as _, path::PathBuf};

use brassage::{COPYRIGHT, LONG_VERSION, partition::PoolLayout, store::Format};
use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand};

/// Volleyball Tournaments
///
/// Keeps tournaments in the data folder and drives them through brassage
/// pools, elimination seeding and a bracket.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Volleyball Tournaments")]
pub(crate) struct Args {
    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// The folder holding the tournaments [default: the user data folder]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// How tournaments are written: ron or postcard
    #[arg(long, default_value_t = Format::Ron)]
    pub format: Format,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command().name("brassage").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-18");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("brassage.1", buffer)?;
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create a tournament and print its id
    New { name: String },

    /// List the stored tournaments
    List,

    /// Print a tournament
    Show { tournament: String },

    /// Manage the teams
    Team {
        tournament: String,
        #[command(subcommand)]
        action: TeamCommand,
    },

    /// Generate the initial brassage from the team levels
    Initial {
        tournament: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Generate a secondary brassage from the current ranking
    Secondary {
        tournament: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Record the scores of a brassage match
    Score {
        tournament: String,
        match_id: String,
        score1: u32,
        score2: u32,
    },

    /// Remove the scores of a brassage match
    ClearScore { tournament: String, match_id: String },

    /// Group the best teams for the elimination
    Seed {
        tournament: String,
        #[command(subcommand)]
        action: SeedCommand,
    },

    /// Build and play the elimination bracket
    Bracket {
        tournament: String,
        #[command(subcommand)]
        action: BracketCommand,
    },

    /// Read brassage scores from a CSV file with the columns team1, team2,
    /// score1 and score2
    Import {
        tournament: String,
        file: PathBuf,
        /// The phase to score [default: the brassage being played]
        #[arg(long)]
        phase: Option<String>,
    },

    /// Write the matches of a brassage as CSV
    Export {
        tournament: String,
        /// The phase to write [default: the brassage being played]
        #[arg(long)]
        phase: Option<String>,
        /// Where to write [default: standard output]
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the ranking over every generated brassage
    Ranking { tournament: String },

    /// Print the matches of a brassage whose teams already met
    Repeats {
        tournament: String,
        /// The phase to check [default: the brassage being played]
        #[arg(long)]
        phase: Option<String>,
    },

    /// Print every team by bracket progress, then by ranking
    Standings { tournament: String },

    /// Delete the last phase while nothing depends on it
    UndoPhase { tournament: String },

    /// Delete every phase, the bracket and the eliminations
    Reset { tournament: String },

    /// Delete a tournament
    Delete { tournament: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TeamCommand {
    /// Register a team, level 1 is the strongest and 10 the weakest
    Add { name: String, level: u8 },

    /// Rename a team or change its level
    Edit {
        /// The team id or name
        team: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        level: Option<u8>,
    },

    /// Remove a team
    Remove {
        /// The team id or name
        team: String,
    },

    /// List the teams
    List,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SeedCommand {
    /// Snake the best ranked teams into groups
    Preview { groups: usize, teams_per_group: usize },

    /// Move a team from one group to another, groups count from 0
    Move {
        /// The team id or name
        team: String,
        from: usize,
        to: usize,
    },

    /// Turn the groups into the elimination seeding
    Commit,
}

#[derive(Subcommand, Debug)]
pub(crate) enum BracketCommand {
    /// Lay out the bracket from the committed groups
    Build {
        /// How many rounds to lay out [default: all of them]
        #[arg(long)]
        rounds: Option<u32>,
    },

    /// Record the scores of a bracket match
    Score {
        match_id: String,
        score1: u32,
        score2: u32,
    },

    /// Add the next round from the winners of the last one
    Advance,

    /// Print the bracket
    Show,
}

#[derive(ClapArgs, Debug)]
pub(crate) struct LayoutArgs {
    /// The number of pools [default: chosen from the team count]
    #[arg(long, requires = "teams_per_pool")]
    pub pools: Option<usize>,

    /// The number of teams in each pool before the leftovers are added
    #[arg(long, requires = "pools")]
    pub teams_per_pool: Option<usize>,
}

impl LayoutArgs {
    pub(crate) fn layout(&self) -> Option<PoolLayout> {
        Some(PoolLayout {
            pools: self.pools?,
            teams_per_pool: self.teams_per_pool?,
        })
    }
}
