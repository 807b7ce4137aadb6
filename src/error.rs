//! Error type shared by every generation stage.

use thiserror::Error;

use crate::history::{CountyId, PolityId};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("seed must not be empty")]
    EmptySeed,

    #[error("invalid grid dimensions {width}x{height}: both must be greater than zero")]
    InvalidDimensions { width: usize, height: usize },

    #[error("no land cell found for a county capital after {attempts} attempts")]
    NoLandForCapitals { attempts: usize },

    #[error("vassal hierarchy cycle detected at {0}")]
    HierarchyCycle(PolityId),

    #[error("{0} was left without an owner")]
    UnassignedCounty(CountyId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("generation worker stopped before sending a result")]
    WorkerDisconnected,
}

pub type Result<T> = std::result::Result<T, GenerationError>;
