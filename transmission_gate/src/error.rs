use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::route::RouteError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("routing failed: {0}")]
    Route(#[from] RouteError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read configuration file `{path:?}`: {err}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("the {0} environment variable must be set")]
    MissingEnv(&'static str),

    #[error("substrate error: {0}")]
    Substrate(#[from] substrate::error::Error),

    #[error("magic error: {0}")]
    Magic(#[from] magic::error::Error),

    #[error("failed to export netlist: {0}")]
    Netlist(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("layout has {0} DRC violation(s)")]
    Drc(usize),

    #[error("layout of `{0}` does not match its schematic")]
    LvsMismatch(substrate::arcstr::ArcStr),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<RouteError> for substrate::error::Error {
    fn from(value: RouteError) -> Self {
        substrate::error::Error::Boxed(Arc::new(value))
    }
}

impl From<Error> for substrate::error::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Substrate(err) => err,
            other => substrate::error::Error::Boxed(Arc::new(other)),
        }
    }
}
