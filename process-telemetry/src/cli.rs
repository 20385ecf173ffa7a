use clap::{crate_authors, crate_description, crate_name, crate_version, Parser};

#[derive(Debug, Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// Configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<String>,
    /// Station table (HCL), default is the configured one or the embedded one.
    #[clap(short = 'S', long, global = true)]
    pub stations: Option<String>,
    /// Use a tree-like output for logging.
    #[clap(short = 'T', long)]
    pub use_tree: bool,
    /// Also log into hourly files in this directory.
    #[clap(short = 'L', long)]
    pub use_file: Option<String>,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Debug, Parser)]
pub enum SubCommand {
    /// Add station elevation, distance, azimuth and elevation angle to telemetry.
    Enrich(EnrichOpts),
    /// Station table commands.
    Stations(StationsOpts),
    /// Find which installation of an antenna was active at a given time.
    Resolve(ResolveOpts),
    /// List all package versions.
    Version,
}

#[derive(Debug, Parser)]
pub struct EnrichOpts {
    /// Input file or directory of CSV/Parquet files.
    #[clap(short = 'i', long)]
    pub input: String,
    /// Output file, .csv or .parquet.
    #[clap(short = 'o', long)]
    pub output: String,
}

#[derive(Debug, Parser)]
pub struct StationsOpts {
    #[clap(subcommand)]
    pub subcmd: StationsSubCommand,
}

#[derive(Debug, Parser)]
pub enum StationsSubCommand {
    /// List all installations.
    List,
    /// Report installations of the same antenna active at the same time.
    Check,
}

#[derive(Debug, Parser)]
pub struct ResolveOpts {
    /// Antenna identifier.
    pub station_id: String,
    /// Epoch seconds.
    pub timestamp: i64,
}
