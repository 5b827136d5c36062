//! Rollout tracker errors.

use thiserror::Error;

pub type RolloutResult<T> = Result<T, RolloutError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RolloutError {
    #[error("invalid rollout id: {0:?}")]
    InvalidId(String),

    #[error("rollout not found: {0}")]
    NotFound(String),
}
