use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ntuple-index")]
#[command(
    about = "Index dataset XML descriptors and the ntuple directories they reference",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create and fill the XML descriptor and ntuple directory tables
    Index(IndexArgs),
    /// Create a table of the CRAB task directories in a user's storage area
    UserDirs(UserDirsArgs),
    /// Write the size in kB of every directory listed in a file
    Sizes {
        /// File with a list of directories, one per line
        input: PathBuf,
    },
    /// Write plain-text listings of the ntuples referenced under a descriptor directory
    Report(ReportArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["datasets_dir", "legacy"])))]
pub struct IndexArgs {
    /// Top directory to look for XML files, recursively (e.g. a UHH2-datasets clone)
    #[arg(long, alias = "uhh2datasetsDir")]
    pub datasets_dir: Option<PathBuf>,
    /// Check out each configured legacy branch of the central repository and
    /// index its descriptor directory
    #[arg(long)]
    pub legacy: bool,
    /// Output SQLite file (defaults to the configured output)
    #[arg(long)]
    pub output: Option<String>,
    /// Append to existing tables instead of overwriting them
    #[arg(long)]
    pub append: bool,
}

#[derive(Debug, Args)]
pub struct UserDirsArgs {
    /// Username to survey; may include subdirectories, e.g. alice/RunII
    pub user: String,
    /// Output SQLite file (defaults to the configured output)
    #[arg(long)]
    pub output: Option<String>,
    /// Append to an existing table instead of overwriting it
    #[arg(long)]
    pub append: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Top directory to look for XML files
    pub root: PathBuf,
    /// Directory the listings are written into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    /// Label used in the listing file names (defaults to the root's name)
    #[arg(long)]
    pub label: Option<String>,
    /// Also list referenced ntuples that no longer exist on disk (slow)
    #[arg(long)]
    pub check_missing: bool,
}
