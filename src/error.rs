//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::project::ProjectId;
use crate::task::TaskId;
use crate::user::UserId;

/// Rejected store mutation. The store is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("comment cannot be empty")]
    EmptyComment,
    #[error("project name cannot be empty")]
    EmptyProjectName,
    #[error("invalid project colour `{0}`, expected #RRGGBB")]
    InvalidColor(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Seed data that could not be loaded or violates referential integrity.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },
    #[error("invalid seed entry: {0}")]
    Invalid(#[from] StoreError),
}

/// Configuration file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
