//! These structs provide the CLI interface for the station CLI.

use crate::model::Kilograms;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// station: A command-line tool for a waste-station weigh-in log.
///
/// The purpose of this program is to record weigh-ins from a recycling-station kiosk into a
/// shared Google sheet, and to report category totals, estimated chopsticks counts and estimated
/// CO2 reduction from the full log.
///
/// You will need to set up a Google Sheets API Key and OAuth for this. Create the data directory
/// with `station init`, then authorize with `station auth`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run when setting up the station CLI. You need to get
    /// a few things ready beforehand.
    ///
    /// - Decide what directory you want to store data in and pass this as --station-home. By
    ///   default, it will be $HOME/station. If you want it somewhere else then you should specify
    ///   it.
    ///
    /// - Get the URL of the Google Sheet that holds the log and pass it as --sheet-url.
    ///
    /// - Set up your Google Sheets API Access credentials and download them to a file. You will
    ///   pass this as --api-key.
    Init(InitArgs),
    /// Authenticate with Google Sheets via OAuth.
    Auth(AuthArgs),
    /// Download the full readings log, saving a JSON snapshot backup.
    Download,
    /// Record one weigh-in: sum the load-cell channels and append a row to the log.
    Record(RecordArgs),
    /// Aggregate the full log and print category totals and chopsticks metrics.
    Report(ReportArgs),
    /// Print the estimated chopsticks count and CO2 reduction for a weight.
    Estimate(EstimateArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where station data and configuration is held. Defaults to ~/station
    #[arg(long, env = "STATION_HOME", default_value_t = default_station_home())]
    station_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, station_home: PathBuf) -> Self {
        Self {
            log_level,
            station_home: station_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn station_home(&self) -> &DisplayPath {
        &self.station_home
    }
}

/// Args for the `station init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to the Google sheet holding the waste-station log. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth API credentials. This file will be moved to the default
    /// secrets location in the main data directory.
    #[arg(long)]
    api_key: PathBuf,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>, api_key: impl Into<PathBuf>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn api_key(&self) -> &Path {
        &self.api_key
    }
}

/// Args for the `station auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh authentication.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// Args for the `station record` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordArgs {
    /// The capture station the reading was taken at, e.g. "Station 1"
    #[arg(long)]
    station: String,

    /// The waste stream the reading belongs to, e.g. "chopsticks" or "recycle".
    /// Unrecognized labels are logged under their own category.
    #[arg(long)]
    category: String,

    /// A measured weight in kilograms from one load cell. Repeat the flag once per cell; the
    /// reading is the sum of all channels.
    #[arg(long = "channel", required = true)]
    channels: Vec<Kilograms>,
}

impl RecordArgs {
    pub fn new(
        station: impl Into<String>,
        category: impl Into<String>,
        channels: Vec<Kilograms>,
    ) -> Self {
        Self {
            station: station.into(),
            category: category.into(),
            channels,
        }
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn channels(&self) -> &[Kilograms] {
        &self.channels
    }
}

/// Args for the `station report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Aggregate a local CSV snapshot instead of fetching the sheet. The first row of the file
    /// must be the header row.
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ReportArgs {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Args for the `station estimate` command.
#[derive(Debug, Parser, Clone)]
pub struct EstimateArgs {
    /// The weight in kilograms to estimate metrics for.
    #[arg(long)]
    weight: Kilograms,
}

impl EstimateArgs {
    pub fn new(weight: Kilograms) -> Self {
        Self { weight }
    }

    pub fn weight(&self) -> Kilograms {
        self.weight
    }
}

fn default_station_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("station"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --station-home or STATION_HOME instead of relying on the \
                default station home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("station")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
