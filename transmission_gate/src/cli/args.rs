use clap::Parser;
use std::path::PathBuf;

use crate::params::Orientation;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "tgate.toml")]
    pub config: PathBuf,

    /// Directory to which output files should be saved.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Overrides the inverter orientation given in the configuration file.
    #[arg(long, value_enum)]
    pub orientation: Option<Orientation>,

    /// Run DRC using magic.
    #[arg(long)]
    pub drc: bool,

    /// Run LVS using magic and netgen.
    #[arg(long)]
    pub lvs: bool,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}
