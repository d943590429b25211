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

use thiserror::Error;

/// Every failure returns control to the caller with the tournament unchanged.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum TournamentError {
    /// Bad input shape or range: duplicate names, levels, team counts.
    #[error("validation: {0}")]
    Validation(String),
    /// The action needs an earlier step to be finished first.
    #[error("precondition: {0}")]
    Precondition(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Loading or saving a tournament document failed.
    #[error("persistence: {0}")]
    Persistence(String),
}

impl TournamentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TournamentError>;
