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

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use std::{
    fs::File,
    io::{self, BufReader},
};

use brassage::{
    PhaseId,
    store::{FileStore, TournamentStore},
    table::Table,
    tournament::Tournament,
    utils::{self, create_data_folder},
};
use clap::{CommandFactory, Parser};
use log::debug;

use crate::command_line::{Args, BracketCommand, Command, SeedCommand, TeamCommand};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.man {
        return Args::generate_man_page();
    }

    utils::init_logger(args.debug, args.systemd);

    let folder = args.data_dir.unwrap_or_else(utils::data_folder);
    create_data_folder(&folder)?;
    debug!("data folder: {}", folder.display());

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let mut store = FileStore::new(folder, args.format);
    run(&mut store, command)
}

fn run<S: TournamentStore>(store: &mut S, command: Command) -> anyhow::Result<()> {
    match command {
        Command::New { name } => {
            let tournament = Tournament::new(&name)?;
            store.save(&tournament)?;
            println!("{}", tournament.id);
        }
        Command::List => {
            for id in store.list()? {
                match store.load(&id) {
                    Ok(tournament) => println!("{id} {}", tournament.name),
                    Err(error) => println!("{id} ({error})"),
                }
            }
        }
        Command::Show { tournament } => print!("{}", store.load(&tournament)?),
        Command::Team { tournament, action } => team(store, &tournament, action)?,
        Command::Initial { tournament, layout } => update(store, &tournament, |tournament| {
            let id = tournament.generate_initial(layout.layout())?;
            print!("{}", tournament.phase(&id)?);
            Ok(())
        })?,
        Command::Secondary { tournament, layout } => update(store, &tournament, |tournament| {
            let id = tournament.generate_secondary(layout.layout())?;
            print!("{}", tournament.phase(&id)?);
            for report in tournament.repeats_in_phase(&id)? {
                println!("{report}");
            }
            Ok(())
        })?,
        Command::Score {
            tournament,
            match_id,
            score1,
            score2,
        } => update(store, &tournament, |tournament| {
            let phase = tournament.phase_of_match(&match_id)?.id.clone();
            tournament.record_score(&phase, &match_id, score1, score2)?;
            if tournament.phase(&phase)?.generated {
                println!("{phase} is generated");
            }
            Ok(())
        })?,
        Command::ClearScore {
            tournament,
            match_id,
        } => update(store, &tournament, |tournament| {
            let phase = tournament.phase_of_match(&match_id)?.id.clone();
            Ok(tournament.clear_score(&phase, &match_id)?)
        })?,
        Command::Seed { tournament, action } => seed(store, &tournament, action)?,
        Command::Bracket { tournament, action } => bracket(store, &tournament, action)?,
        Command::Import {
            tournament,
            file,
            phase,
        } => {
            let table = Table::from_csv(BufReader::new(File::open(file)?))?;
            update(store, &tournament, |tournament| {
                let phase = phase_id(tournament, phase)?;
                print!("{}", tournament.import_scores(&phase, &table)?);
                Ok(())
            })?;
        }
        Command::Export {
            tournament,
            phase,
            output,
        } => {
            let tournament = store.load(&tournament)?;
            let phase = phase_id(&tournament, phase)?;
            let table = tournament.export_scores(&phase)?;

            match output {
                Some(path) => table.write_csv(File::create(path)?)?,
                None => table.write_csv(io::stdout().lock())?,
            }
        }
        Command::Ranking { tournament } => {
            let tournament = store.load(&tournament)?;
            for (i, entry) in tournament.rankings().iter().enumerate() {
                println!("{:>3} {entry}", i + 1);
            }
        }
        Command::Repeats { tournament, phase } => {
            let tournament = store.load(&tournament)?;
            let phase = phase_id(&tournament, phase)?;
            for report in tournament.repeats_in_phase(&phase)? {
                println!("{report}");
            }
        }
        Command::Standings { tournament } => {
            let tournament = store.load(&tournament)?;
            for (i, standing) in tournament.global_standings().iter().enumerate() {
                println!("{:>3} {standing}", i + 1);
            }
        }
        Command::UndoPhase { tournament } => update(store, &tournament, |tournament| {
            let phase = tournament.delete_last_phase()?;
            println!("deleted {}", phase.name);
            Ok(())
        })?,
        Command::Reset { tournament } => update(store, &tournament, |tournament| {
            tournament.clear_all_phases();
            Ok(())
        })?,
        Command::Delete { tournament } => store.delete(&tournament)?,
    }

    Ok(())
}

/// Loads, changes and saves a tournament. Nothing is saved when the change
/// fails.
fn update<S: TournamentStore>(
    store: &mut S,
    id: &str,
    change: impl FnOnce(&mut Tournament) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut tournament = store.load(id)?;
    change(&mut tournament)?;
    store.save(&tournament)?;
    Ok(())
}

fn phase_id(tournament: &Tournament, phase: Option<String>) -> anyhow::Result<PhaseId> {
    if let Some(phase) = phase {
        return Ok(tournament.phase(&phase)?.id.clone());
    }

    tournament
        .current_brassage()
        .map(|phase| phase.id.clone())
        .ok_or_else(|| anyhow::Error::msg("there is no brassage yet"))
}

fn team<S: TournamentStore>(store: &mut S, id: &str, action: TeamCommand) -> anyhow::Result<()> {
    match action {
        TeamCommand::Add { name, level } => update(store, id, |tournament| {
            println!("{}", tournament.add_team(&name, level)?);
            Ok(())
        }),
        TeamCommand::Edit { team, name, level } => update(store, id, |tournament| {
            let team = tournament.resolve_team(&team)?.id.clone();
            Ok(tournament.update_team(&team, name.as_deref(), level)?)
        }),
        TeamCommand::Remove { team } => update(store, id, |tournament| {
            let team = tournament.resolve_team(&team)?.id.clone();
            tournament.delete_team(&team)?;
            Ok(())
        }),
        TeamCommand::List => {
            for team in store.load(id)?.teams {
                println!("{team}");
            }
            Ok(())
        }
    }
}

fn seed<S: TournamentStore>(store: &mut S, id: &str, action: SeedCommand) -> anyhow::Result<()> {
    update(store, id, |tournament| {
        match action {
            SeedCommand::Preview {
                groups,
                teams_per_group,
            } => {
                print!(
                    "{}",
                    tournament.prepare_elimination_seeding(groups, teams_per_group)?
                );
            }
            SeedCommand::Move { team, from, to } => {
                let team = tournament.resolve_team(&team)?.id.clone();
                tournament.move_seeded_team(&team, from, to)?;
                if let Some(preview) = &tournament.seeding_preview {
                    print!("{preview}");
                }
            }
            SeedCommand::Commit => {
                let phase = tournament.commit_seeding()?;
                print!("{}", tournament.phase(&phase)?);
            }
        }
        Ok(())
    })
}

fn bracket<S: TournamentStore>(
    store: &mut S,
    id: &str,
    action: BracketCommand,
) -> anyhow::Result<()> {
    match action {
        BracketCommand::Build { rounds } => update(store, id, |tournament| {
            tournament.build_bracket(rounds, &mut rand::rng())?;
            print_bracket(tournament);
            Ok(())
        }),
        BracketCommand::Score {
            match_id,
            score1,
            score2,
        } => update(store, id, |tournament| {
            let round = tournament
                .round_of_match(&match_id)
                .ok_or_else(|| anyhow::Error::msg(format!("no bracket match {match_id}")))?;

            match tournament.record_bracket_score(round, &match_id, score1, score2)? {
                Some(decision) => println!("{} goes on", tournament.team(&decision.winner)?.name),
                None => println!("{match_id} is tied and has to be replayed"),
            }
            if let Some(champion) = tournament.champion() {
                println!("{} wins the tournament", champion.name);
            }
            Ok(())
        }),
        BracketCommand::Advance => update(store, id, |tournament| {
            let number = tournament.advance_bracket()?;
            print!("{}", tournament.round(number)?);
            Ok(())
        }),
        BracketCommand::Show => {
            print_bracket(&store.load(id)?);
            Ok(())
        }
    }
}

fn print_bracket(tournament: &Tournament) {
    for round in tournament.elimination.values() {
        print!("{round}");
    }
}
