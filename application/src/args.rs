//! [`Args`] definitions.

use clap::Parser;

/// Server of the equipment rental management system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// A missing file is fine: `CONF.*` environment variables and defaults
    /// are used then.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses the command line arguments of the current process.
    ///
    /// # Errors
    ///
    /// Errors if the arguments are invalid, or `--help`/`--version` is
    /// requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
