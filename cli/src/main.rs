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

//! Command-line interface for extracting bonus waypoints from a ScoreMaster
//! database.

use std::{fs::File, io::BufWriter, path::PathBuf, process::ExitCode};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rally_gpx::{
    export, Options, RallyDatabase, Summary, CREATOR, DEFAULT_MAP_URL, DEFAULT_OUTPUT,
    DEFAULT_SYMBOL,
};
use tracing_subscriber::EnvFilter;

/// Extract bonus coordinates from a ScoreMaster database into a GPX file.
///
/// Set `RUST_LOG=debug` to see why individual bonuses are skipped.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// ScoreMaster database containing the bonuses
    #[arg(long, value_name = "PATH")]
    db: PathBuf,

    /// GPX file to create
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    gpx: PathBuf,

    /// URL of an external mapping service, empty for no links
    #[arg(long, value_name = "URL", default_value = DEFAULT_MAP_URL)]
    map: String,

    /// Suppress the external map link
    #[arg(long = "nolink")]
    no_link: bool,

    /// Symbol for the waypoints, empty for none
    #[arg(long, default_value = DEFAULT_SYMBOL)]
    symbol: String,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            map_url: self.map.clone(),
            no_map_link: self.no_link,
            symbol: self.symbol.clone(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    println!("{CREATOR}\nI extract bonus coordinates from a ScoreMaster database into a GPX file\n");

    match run(&cli) {
        Ok(summary) => {
            println!("{summary}\n");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Generating GPX failed with: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Summary> {
    if !cli.db.exists() {
        bail!("the database {} does not exist", cli.db.display());
    }
    let db = RallyDatabase::open(&cli.db)?;

    println!("Generating GPX {}", cli.gpx.display());
    let file = File::create(&cli.gpx)
        .with_context(|| format!("cannot create {}", cli.gpx.display()))?;

    let summary = export(&db, BufWriter::new(file), &cli.options())
        .with_context(|| format!("cannot complete {}", cli.gpx.display()))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["rally-gpx", "--db", "rally.db"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("rally.db"));
        assert_eq!(cli.gpx, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cli.options(), Options::default());
    }

    #[test]
    fn database_is_required() {
        assert!(Cli::try_parse_from(["rally-gpx"]).is_err());
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rally_gpx_cli_{}_{name}", std::process::id()))
    }

    #[test]
    fn missing_database() {
        let db = scratch("missing.db");
        let gpx = scratch("missing.gpx");
        let cli = Cli::try_parse_from([
            OsStr::new("rally-gpx"),
            OsStr::new("--db"),
            db.as_os_str(),
            OsStr::new("--gpx"),
            gpx.as_os_str(),
        ])
        .unwrap();

        let err = run(&cli).unwrap_err();

        assert!(format!("{err:#}").contains("does not exist"));
        assert!(!gpx.exists());
    }

    #[test]
    fn uncreatable_output() {
        // An empty file is a valid, empty SQLite database.
        let db = scratch("empty.db");
        File::create(&db).unwrap();
        let gpx = scratch("no_such_dir").join("out.gpx");
        let cli = Cli::try_parse_from([
            OsStr::new("rally-gpx"),
            OsStr::new("--db"),
            db.as_os_str(),
            OsStr::new("--gpx"),
            gpx.as_os_str(),
        ])
        .unwrap();

        let err = run(&cli).unwrap_err();
        std::fs::remove_file(&db).unwrap();

        assert!(format!("{err:#}").contains("cannot create"));
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "rally-gpx",
            "--db",
            "rally.db",
            "--gpx",
            "out.gpx",
            "--map",
            "",
            "--nolink",
            "--symbol",
            "Flag, Red",
        ])
        .unwrap();
        assert_eq!(cli.gpx, PathBuf::from("out.gpx"));
        assert_eq!(
            cli.options(),
            Options {
                map_url: String::new(),
                no_map_link: true,
                symbol: "Flag, Red".to_string(),
            }
        );
    }
}
