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

//! Library for extracting rally bonuses from a ScoreMaster database into a
//! [GPX](https://www.topografix.com/gpx.asp) file.
//!
//! Every bonus with usable coordinates becomes a GPX waypoint which can be
//! loaded onto a navigation device. Bonuses whose coordinates cannot be
//! parsed are skipped and counted.
//!
//! See [`export`] for information on how to use this library.

pub mod coords;
pub mod source;
pub mod writer;

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

pub use coords::{Coordinate, ParseError};
pub use source::{BonusRecord, RallyDatabase, RecordSource};
pub use writer::{GpxWriter, WaypointTemplate};

/// Name and version put into the `creator` attribute.
pub const CREATOR: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
/// External map service used for waypoint links by default.
pub const DEFAULT_MAP_URL: &str = "https://www.google.co.uk/maps/search/";
/// Symbol used for waypoints by default.
pub const DEFAULT_SYMBOL: &str = "Circle, Green";
/// File name of the GPX output by default.
pub const DEFAULT_OUTPUT: &str = "waypoints.gpx";

/// Error returned from the [`export`] function.
#[derive(Error, Debug)]
pub enum Error {
    /// The database could not be opened.
    #[error("opening database {} failed: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// Reading the bonuses failed.
    #[error("querying bonuses failed: {0}")]
    Query(#[from] rusqlite::Error),
    /// GPX writing failed.
    #[error("writing GPX failed: {0}")]
    Write(#[from] io::Error),
}

/// How waypoints are decorated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Prefix of the external map link. Empty disables links.
    pub map_url: String,
    /// Leave out map links even if `map_url` is set.
    pub no_map_link: bool,
    /// Symbol name for every waypoint. Empty leaves the symbol out.
    pub symbol: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            map_url: DEFAULT_MAP_URL.to_string(),
            no_map_link: false,
            symbol: DEFAULT_SYMBOL.to_string(),
        }
    }
}

impl Options {
    /// Prefix for map links or `None` if no links shall be written.
    pub fn map_link_base(&self) -> Option<&str> {
        Some(self.map_url.as_str()).filter(|url| !url.is_empty() && !self.no_map_link)
    }
}

/// Counters of a single [`export`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// All bonuses considered, including the skipped ones.
    pub bonuses: usize,
    /// Bonuses skipped because of unparsable coordinates.
    pub bad_coordinates: usize,
}

impl Summary {
    /// Number of waypoints written.
    pub fn waypoints(&self) -> usize {
        self.bonuses.saturating_sub(self.bad_coordinates)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bonuses read including {} with bad coordinates",
            self.bonuses, self.bad_coordinates
        )
    }
}

/// Read all bonuses from `source` and write a GPX file to `sink`.
///
/// The rally title becomes the comment of every waypoint. Bonuses with
/// unparsable coordinates are skipped and counted in the returned
/// [`Summary`].
///
/// If an error occurs, the function returns immediately. The `sink` might
/// already contain an incomplete document in this case.
///
/// # Example
/// ```
/// # use rally_gpx::{export, Options, RallyDatabase};
/// # use rusqlite::Connection;
/// #
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch(
///     "CREATE TABLE rallyparams (RallyTitle TEXT);
///      INSERT INTO rallyparams VALUES ('Spring Rally');
///      CREATE TABLE bonuses (BonusID TEXT, BriefDesc TEXT, Coords TEXT);
///      INSERT INTO bonuses VALUES ('B01', 'Church', '51.5,-0.1');
///      INSERT INTO bonuses VALUES ('B02', 'Pub', 'bogus');",
/// )
/// .unwrap();
/// let mut sink = vec![];
///
/// let summary = export(&RallyDatabase::from(conn), &mut sink, &Options::default())
///     .expect("export failed");
///
/// assert_eq!(summary.to_string(), "2 bonuses read including 1 with bad coordinates");
/// let gpx = String::from_utf8(sink).expect("GPX data is not valid UTF-8");
/// assert!(gpx.contains(r#"<wpt lat="51.5" lon="-0.1"><name>B01-Church</name>"#));
/// assert!(gpx.contains("<cmt>Spring Rally</cmt>"));
/// assert!(!gpx.contains("B02"));
/// ```
#[tracing::instrument(skip_all)]
pub fn export<S, W>(source: &S, sink: W, options: &Options) -> Result<Summary, Error>
where
    S: RecordSource,
    W: io::Write,
{
    let title = source.rally_title();
    let mut writer = GpxWriter::start(sink, WaypointTemplate::new(&title, options))?;

    let mut summary = Summary::default();
    source.for_each_bonus(|bonus| {
        summary.bonuses += 1;
        match bonus.coordinate() {
            Ok(coordinate) => writer.write_waypoint(coordinate, &bonus.id, &bonus.description)?,
            Err(err) => {
                summary.bad_coordinates += 1;
                debug!(bonus = %bonus.id, coords = %bonus.coords, error = %err, "skipping bonus");
            }
        }
        Ok(())
    })?;
    writer.finish()?;

    info!(
        bonuses = summary.bonuses,
        bad_coordinates = summary.bad_coordinates,
        "GPX complete"
    );
    Ok(summary)
}
