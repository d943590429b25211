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

//! Whole-document persistence. A save replaces the document or fails, and the
//! last writer wins.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{error, info, trace};
use ron::ser::PrettyConfig;

use crate::{
    TournamentId,
    error::{Result, TournamentError},
    tournament::Tournament,
};

pub trait TournamentStore {
    /// # Errors
    ///
    /// `NotFound` if there is no such tournament, `Persistence` if it cannot be
    /// read.
    fn load(&self, id: &str) -> Result<Tournament>;

    /// # Errors
    ///
    /// If the document cannot be written. Nothing is replaced in that case.
    fn save(&mut self, tournament: &Tournament) -> Result<()>;

    /// # Errors
    ///
    /// `NotFound` if there is no such tournament.
    fn delete(&mut self, id: &str) -> Result<()>;

    /// # Errors
    ///
    /// If the stored ids cannot be listed.
    fn list(&self) -> Result<Vec<TournamentId>>;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    Ron,
    Postcard,
}

impl Format {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ron => "ron",
            Self::Postcard => "postcard",
        }
    }

    /// # Errors
    ///
    /// If the tournament cannot be serialized.
    pub fn encode(self, tournament: &Tournament) -> Result<Vec<u8>> {
        match self {
            Self::Ron => ron::ser::to_string_pretty(tournament, PrettyConfig::default())
                .map(String::into_bytes)
                .map_err(|error| TournamentError::persistence(format!("ron: {error}"))),
            Self::Postcard => postcard::to_allocvec(tournament)
                .map_err(|error| TournamentError::persistence(format!("postcard: {error}"))),
        }
    }

    /// Decodes a document and rebuilds its derived state.
    ///
    /// # Errors
    ///
    /// If the bytes are not a tournament in this format.
    pub fn decode(self, bytes: &[u8]) -> Result<Tournament> {
        let mut tournament: Tournament = match self {
            Self::Ron => {
                let string = std::str::from_utf8(bytes)
                    .map_err(|error| TournamentError::persistence(format!("ron: {error}")))?;
                ron::from_str(string)
                    .map_err(|error| TournamentError::persistence(format!("ron: {error}")))?
            }
            Self::Postcard => postcard::from_bytes(bytes)
                .map_err(|error| TournamentError::persistence(format!("postcard: {error}")))?,
        };

        tournament.rebuild_occurrences();
        Ok(tournament)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string.to_lowercase().as_str() {
            "ron" => Ok(Self::Ron),
            "postcard" => Ok(Self::Postcard),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Format!"
            ))),
        }
    }
}

/// Ids become file names, so only ASCII letters, digits, `-` and `_` pass.
fn check_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');

    if valid {
        Ok(())
    } else {
        Err(TournamentError::validation(format!(
            "'{id}' is not a tournament id"
        )))
    }
}

/// One file per tournament, `<id>.ron` or `<id>.postcard`, in a folder.
#[derive(Clone, Debug)]
pub struct FileStore {
    folder: PathBuf,
    format: Format,
}

impl FileStore {
    #[must_use]
    pub fn new(folder: PathBuf, format: Format) -> Self {
        Self { folder, format }
    }

    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn path(&self, id: &str) -> PathBuf {
        self.folder.join(format!("{id}.{}", self.format.extension()))
    }
}

impl TournamentStore for FileStore {
    fn load(&self, id: &str) -> Result<Tournament> {
        check_id(id)?;
        let path = self.path(id);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(TournamentError::not_found(format!("tournament {id}")));
            }
            Err(err) => {
                error!("load {}: {err}", path.display());
                return Err(TournamentError::persistence(format!(
                    "{}: {err}",
                    path.display()
                )));
            }
        };

        self.format.decode(&bytes).inspect_err(|err| {
            error!("load {}: {err}", path.display());
        })
    }

    fn save(&mut self, tournament: &Tournament) -> Result<()> {
        check_id(&tournament.id)?;
        let bytes = self.format.encode(tournament)?;
        let path = self.path(&tournament.id);
        let temporary = path.with_extension(format!("{}.tmp", self.format.extension()));

        let written = fs::create_dir_all(&self.folder)
            .and_then(|()| fs::write(&temporary, &bytes))
            .and_then(|()| fs::rename(&temporary, &path));

        if let Err(err) = written {
            error!("save {}: {err}", path.display());
            let _ = fs::remove_file(&temporary);
            return Err(TournamentError::persistence(format!(
                "{}: {err}",
                path.display()
            )));
        }

        info!("saved {}", path.display());
        trace!("{tournament:?}");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        check_id(id)?;
        let path = self.path(id);

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("deleted {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(TournamentError::not_found(format!("tournament {id}")))
            }
            Err(err) => Err(TournamentError::persistence(format!(
                "{}: {err}",
                path.display()
            ))),
        }
    }

    fn list(&self) -> Result<Vec<TournamentId>> {
        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(TournamentError::persistence(format!(
                    "{}: {err}",
                    self.folder.display()
                )));
            }
        };

        let mut ids: Vec<TournamentId> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|extension| extension == self.format.extension())
            })
            .filter_map(|path| Some(path.file_stem()?.to_str()?.to_string()))
            .collect();

        ids.sort();
        Ok(ids)
    }
}

/// Keeps encoded documents in memory, so a load never shares state with the
/// tournament that was saved.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    format: Format,
    documents: BTreeMap<TournamentId, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(format: Format) -> Self {
        Self {
            format,
            documents: BTreeMap::new(),
        }
    }
}

impl TournamentStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Tournament> {
        let Some(bytes) = self.documents.get(id) else {
            return Err(TournamentError::not_found(format!("tournament {id}")));
        };

        self.format.decode(bytes)
    }

    fn save(&mut self, tournament: &Tournament) -> Result<()> {
        let bytes = self.format.encode(tournament)?;
        self.documents.insert(tournament.id.clone(), bytes);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        match self.documents.remove(id) {
            Some(_) => Ok(()),
            None => Err(TournamentError::not_found(format!("tournament {id}"))),
        }
    }

    fn list(&self) -> Result<Vec<TournamentId>> {
        Ok(self.documents.keys().cloned().collect())
    }
}
