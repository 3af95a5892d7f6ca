//! Error types for stencil-sync.

use std::path::PathBuf;

use thiserror::Error;

use stencil_blueprint::BlueprintError;
use stencil_core::CoreError;

/// All errors that can arise from sync, tracking, and registry operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Ledger or config failure from stencil-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No balanced close, or a body that is not the expected shape.
    #[error("malformed descriptor '{id}' in {path}: {detail}")]
    MalformedDescriptor {
        path: PathBuf,
        id: String,
        detail: String,
    },

    /// The operation is not allowed for this artifact; nothing was changed.
    #[error("not authorized for {path}: {reason}")]
    NotAuthorized { path: PathBuf, reason: String },

    /// A known corruption signature was found; the container was left untouched.
    #[error("container {path} looks corrupted: {signature}")]
    CorruptedContainer { path: PathBuf, signature: String },

    /// The artifact has no ledger record.
    #[error("{path} is not tracked")]
    NotTracked { path: PathBuf },

    /// A blueprint literal could not be expanded.
    #[error("blueprint error in {path}: {source}")]
    Blueprint {
        path: PathBuf,
        #[source]
        source: BlueprintError,
    },

    /// Registry JSON (de)serialization error.
    #[error("registry JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The external formatter could not be run or exited non-zero.
    #[error("formatter `{command}` failed on {path}: {detail}")]
    Formatter {
        command: String,
        path: PathBuf,
        detail: String,
    },
}

/// Coarse classification used in per-artifact reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    MalformedDescriptor,
    NotAuthorized,
    CorruptedContainer,
    Persistence,
    NotTracked,
    Other,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Io { .. } | SyncError::Core(CoreError::Io { .. }) => ErrorKind::Io,
            SyncError::Core(CoreError::Persistence { .. }) => ErrorKind::Persistence,
            SyncError::MalformedDescriptor { .. } | SyncError::Blueprint { .. } => {
                ErrorKind::MalformedDescriptor
            }
            SyncError::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            SyncError::CorruptedContainer { .. } => ErrorKind::CorruptedContainer,
            SyncError::NotTracked { .. } => ErrorKind::NotTracked,
            _ => ErrorKind::Other,
        }
    }

    /// Errors that abort the whole invocation rather than one artifact.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Core(CoreError::Persistence { .. } | CoreError::Parse { .. } | CoreError::Config { .. })
        )
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Map an extractor failure on `path` to the error taxonomy.
pub(crate) fn malformed(path: impl Into<PathBuf>, err: BlueprintError) -> SyncError {
    let path = path.into();
    match err {
        BlueprintError::NotFound { id } => SyncError::MalformedDescriptor {
            path,
            id,
            detail: "definition not found".to_string(),
        },
        BlueprintError::Unterminated { id, line } => SyncError::MalformedDescriptor {
            path,
            id,
            detail: format!("no closing delimiter for the definition opened on line {line}"),
        },
        other => SyncError::Blueprint {
            path,
            source: other,
        },
    }
}
