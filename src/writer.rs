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

//! Streaming [GPX](https://www.topografix.com/gpx.asp) output.
//!
//! Waypoints are serialized as soon as they are handed over. Nothing is kept
//! in memory apart from the per-pass [`WaypointTemplate`].

use std::io::{self, Write};

use crate::coords::Coordinate;
use crate::{Options, CREATOR};

/// Characters replaced by [`escape`], in order of replacement.
const ESCAPES: &[(&str, &str)] = &[
    ("&", "&amp;"),
    ("\"", "&quot;"),
    ("<", "&lt;"),
    (">", "&gt;"),
    ("'", "&#39;"),
];

/// Fixed part of every waypoint besides name and position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaypointTemplate {
    /// Already escaped content of `<cmt>`.
    comment: Option<String>,
    /// Prefix of the `<link>` target.
    link_base: Option<String>,
    /// Content of `<sym>`, taken verbatim.
    symbol: Option<String>,
}

impl WaypointTemplate {
    /// Resolve the rally title and `options` for a whole pass.
    pub fn new(rally_title: &str, options: &Options) -> Self {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        Self {
            comment: non_empty(rally_title).map(|t| escape(&t)),
            link_base: options.map_link_base().and_then(non_empty),
            symbol: non_empty(&options.symbol),
        }
    }
}

/// Writer for a single GPX document.
///
/// [`GpxWriter::start`] emits the header and [`GpxWriter::finish`] the
/// closing tag, so a document cannot be opened or closed twice.
#[derive(Debug)]
pub struct GpxWriter<W: Write> {
    sink: W,
    template: WaypointTemplate,
}

impl<W: Write> GpxWriter<W> {
    /// Write the XML prolog and the opening `<gpx>` tag to `sink`.
    pub fn start(mut sink: W, template: WaypointTemplate) -> io::Result<Self> {
        write!(
            sink,
            r#"<?xml version="1.0" encoding="utf-8"?>
<gpx creator="{CREATOR}" version="1.1"
xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd"
xmlns="http://www.topografix.com/GPX/1/1"
xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
"#
        )?;
        Ok(Self { sink, template })
    }

    /// Write one `<wpt>` element named `{id}-{description}`.
    ///
    /// Children are written in the order name, comment, link, symbol.
    pub fn write_waypoint(
        &mut self,
        coordinate: Coordinate,
        id: &str,
        description: &str,
    ) -> io::Result<()> {
        let Coordinate {
            latitude,
            longitude,
        } = coordinate;
        write!(
            self.sink,
            r#"<wpt lat="{latitude}" lon="{longitude}"><name>{}-{}</name>"#,
            escape(id),
            escape(description)
        )?;
        if let Some(comment) = &self.template.comment {
            write!(self.sink, "<cmt>{comment}</cmt>")?;
        }
        if let Some(base) = &self.template.link_base {
            write!(self.sink, r#"<link href="{base}{latitude},{longitude}" />"#)?;
        }
        if let Some(symbol) = &self.template.symbol {
            write!(self.sink, "<sym>{symbol}</sym>")?;
        }
        self.sink.write_all(b"</wpt>\n")
    }

    /// Close the `<gpx>` element, flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.write_all(b"</gpx>\n")?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Escape XML special characters by plain substring replacement.
///
/// Existing entities are not recognized: `&lt;` becomes `&amp;lt;`.
pub fn escape(s: &str) -> String {
    ESCAPES
        .iter()
        .fold(s.to_string(), |s, (from, to)| s.replace(from, to))
}
