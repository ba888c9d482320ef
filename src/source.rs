// Copyright 2023 Viktor Reusch
//
// This file is part of rally_gpx.
//
// rally_gpx is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// rally_gpx is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with rally_gpx. If not, see <https://www.gnu.org/licenses/>.

//! Reading bonuses from a ScoreMaster database.

use std::path::Path;

use rusqlite::{types::ValueRef, Connection, OpenFlags, OptionalExtension, Row};
use tracing::warn;

use crate::coords::{self, Coordinate, ParseError};
use crate::Error;

const TITLE_QUERY: &str = "SELECT RallyTitle FROM rallyparams";
const BONUS_QUERY: &str = "SELECT BonusID, BriefDesc, Coords FROM bonuses \
    WHERE Coords IS NOT NULL AND Coords <> '' ORDER BY BonusID";

/// A single row of the bonuses table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BonusRecord {
    pub id: String,
    pub description: String,
    /// Coordinates exactly as typed in by the rally master.
    pub coords: String,
}

impl BonusRecord {
    pub fn coordinate(&self) -> Result<Coordinate, ParseError> {
        coords::parse(&self.coords)
    }
}

/// Anything the rally title and the bonuses can be read from.
pub trait RecordSource {
    /// Title of the rally or an empty string if there is none.
    fn rally_title(&self) -> String;

    /// Hand every bonus with coordinates to `visit`, ordered by identifier.
    ///
    /// Stops at the first error, whether it comes from the source or from
    /// `visit`.
    fn for_each_bonus<F>(&self, visit: F) -> Result<(), Error>
    where
        F: FnMut(BonusRecord) -> Result<(), Error>;
}

/// Read-only handle on a ScoreMaster SQLite database.
#[derive(Debug)]
pub struct RallyDatabase {
    conn: Connection,
}

impl RallyDatabase {
    /// Open the database at `path` without ever creating it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { conn })
    }
}

impl From<Connection> for RallyDatabase {
    fn from(conn: Connection) -> Self {
        Self { conn }
    }
}

impl RecordSource for RallyDatabase {
    fn rally_title(&self) -> String {
        match self
            .conn
            .query_row(TITLE_QUERY, [], |row| text(row, 0))
            .optional()
        {
            Ok(title) => title.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "cannot read rally title, leaving comments out");
                String::new()
            }
        }
    }

    fn for_each_bonus<F>(&self, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(BonusRecord) -> Result<(), Error>,
    {
        let mut stmt = self.conn.prepare(BONUS_QUERY)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            visit(BonusRecord {
                id: text(row, 0)?,
                description: text(row, 1)?,
                coords: text(row, 2)?,
            })?;
        }
        Ok(())
    }
}

/// Read column `idx` as text, whatever its storage class.
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            // Older databases store Latin-1, e.g. a lone 0xB0 for the degree sign.
            Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
        },
    })
}
