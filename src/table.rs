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

//! Score sheets as plain rows of cells, read from and written to CSV.

use std::{
    fmt,
    io::{Read, Write},
};

use serde::Serialize;

use crate::{
    error::{Result, TournamentError},
    phase::Phase,
    team::{self, Team},
};

pub const COLUMNS: [&str; 4] = ["team1", "team2", "score1", "score2"];

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Reads every record, the header included. Rows may have any length.
    ///
    /// # Errors
    ///
    /// If the input is not valid CSV.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|error| {
                TournamentError::validation(format!("unable to read the table: {error}"))
            })?;
            rows.push(record.iter().map(ToString::to_string).collect());
        }

        Ok(Self { rows })
    }

    /// # Errors
    ///
    /// If writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);

        for row in &self.rows {
            writer.write_record(row).map_err(|error| {
                TournamentError::persistence(format!("unable to write the table: {error}"))
            })?;
        }
        writer.flush().map_err(|error| {
            TournamentError::persistence(format!("unable to write the table: {error}"))
        })?;

        Ok(())
    }
}

/// What an import did. Skipped rows never stop the rest of the batch.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "imported: {}, skipped: {}", self.imported, self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }

        Ok(())
    }
}

/// A data row with both scores read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ScoreRow {
    /// One-based, counting the header.
    pub line: usize,
    pub team1: String,
    pub team2: String,
    pub score1: u32,
    pub score2: u32,
}

fn column_positions(header: &[String]) -> Result<[usize; 4]> {
    let mut positions = [0; 4];

    for (position, column) in positions.iter_mut().zip(COLUMNS) {
        let Some(found) = header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(column))
        else {
            return Err(TournamentError::validation(format!(
                "the table has no '{column}' column"
            )));
        };
        *position = found;
    }

    Ok(positions)
}

/// Splits the table into readable rows and messages for the others. Blank
/// rows are ignored.
///
/// # Errors
///
/// If the table is empty or a column is missing from the header.
pub(crate) fn score_rows(table: &Table) -> Result<(Vec<ScoreRow>, Vec<String>)> {
    let Some((header, data)) = table.rows.split_first() else {
        return Err(TournamentError::validation("the table is empty"));
    };
    let [team1, team2, score1, score2] = column_positions(header)?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, row) in data.iter().enumerate() {
        let line = i + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let cell = |index: usize| row.get(index).map_or("", |cell| cell.trim());
        let score = |index: usize| cell(index).parse::<u32>().ok();

        if cell(team1).is_empty() || cell(team2).is_empty() {
            errors.push(format!("line {line}: a team name is missing"));
            continue;
        }
        let (Some(first), Some(second)) = (score(score1), score(score2)) else {
            errors.push(format!(
                "line {line}: the scores '{}' and '{}' are not both numbers",
                cell(score1),
                cell(score2)
            ));
            continue;
        };

        rows.push(ScoreRow {
            line,
            team1: cell(team1).to_string(),
            team2: cell(team2).to_string(),
            score1: first,
            score2: second,
        });
    }

    Ok((rows, errors))
}

/// One row per match of the phase, with team names and empty cells for
/// missing scores.
#[must_use]
pub(crate) fn scores_table(phase: &Phase, teams: &[Team]) -> Table {
    let name = |id: &str| {
        team::find_by_id(teams, id).map_or_else(|| id.to_string(), |team| team.name.clone())
    };
    let score = |score: Option<u32>| score.map(|score| score.to_string()).unwrap_or_default();

    let mut rows = vec![COLUMNS.iter().map(ToString::to_string).collect()];
    rows.extend(phase.matches().map(|game| {
        vec![
            name(&game.team1),
            name(&game.team2),
            score(game.score1),
            score(game.score2),
        ]
    }));

    Table { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> anyhow::Result<Table> {
        Ok(Table::from_csv(csv.as_bytes())?)
    }

    #[test]
    fn header_is_case_insensitive_and_reordered() -> anyhow::Result<()> {
        let table = table("Score2,TEAM1,score1,Team2\n10,Aces,21,Blockers\n")?;
        let (rows, errors) = score_rows(&table)?;

        assert!(errors.is_empty());
        assert_eq!(
            rows,
            vec![ScoreRow {
                line: 2,
                team1: "Aces".to_string(),
                team2: "Blockers".to_string(),
                score1: 21,
                score2: 10,
            }]
        );
        Ok(())
    }

    #[test]
    fn missing_column_fails_the_batch() -> anyhow::Result<()> {
        let table = table("team1,team2,score1\nAces,Blockers,21\n")?;
        assert!(matches!(
            score_rows(&table),
            Err(TournamentError::Validation(_))
        ));
        assert!(score_rows(&Table::default()).is_err());
        Ok(())
    }

    #[test]
    fn bad_rows_are_counted() -> anyhow::Result<()> {
        let table = table(
            "team1,team2,score1,score2\n\
             Aces,Blockers,21,ten\n\
             ,,,\n\
             Aces,,21,10\n\
             Diggers,Setters,25,23\n\
             Aces,Blockers\n",
        )?;
        let (rows, errors) = score_rows(&table)?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 5);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("line 2:"));
        Ok(())
    }

    #[test]
    fn csv_round_trip_keeps_empty_cells() -> anyhow::Result<()> {
        let table = Table::new(vec![
            COLUMNS.iter().map(ToString::to_string).collect(),
            vec![
                "Aces".to_string(),
                "Blockers, Inc".to_string(),
                String::new(),
                String::new(),
            ],
        ]);

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer)?;
        assert_eq!(Table::from_csv(buffer.as_slice())?, table);
        Ok(())
    }
}
