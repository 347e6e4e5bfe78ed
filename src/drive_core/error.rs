//! Error types for the vehicle core.

use std::path::PathBuf;

use rapier3d::prelude::Real;
use thiserror::Error;

/// A tick that was rejected before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StepError {
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(Real),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
