//! Initial snapshot provider.
//!
//! The store is volatile; on start it is seeded from a JSON object on disk
//! (typically written by the persistence layer) or starts empty.

use shared_types::state::state_from_value;
use shared_types::{State, StateError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to read initial state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("initial state {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("initial state {path}: {source}")]
    Shape {
        path: PathBuf,
        #[source]
        source: StateError,
    },
}

/// Load the bootstrap snapshot. `None` yields an empty state.
pub fn load_initial_state(path: Option<&Path>) -> Result<State, BootstrapError> {
    let Some(path) = path else {
        info!("No initial state configured, starting empty");
        return Ok(State::new());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| BootstrapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&raw).map_err(|source| BootstrapError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let state = state_from_value(value).map_err(|source| BootstrapError::Shape {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), keys = state.len(), "Initial state loaded");
    Ok(state)
}
