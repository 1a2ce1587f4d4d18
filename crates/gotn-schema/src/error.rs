//! Error taxonomy shared by every layer of the graph substrate.
//!
//! Callers match on [`GotnError`] variants rather than strings; the service
//! façade is the only place that renders them to the `error` string of a
//! tool response (see `gotn-service`).

use thiserror::Error;

/// The canonical error kinds produced anywhere in the core.
///
/// Every public operation returns one of these (wrapped in whatever
/// crate-local `Result` alias is convenient) so that a caller several
/// layers up can still tell a `Conflict` apart from an `IOError` without
/// parsing a message string.
#[derive(Debug, Error)]
pub enum GotnError {
    /// One or more fields failed validation. Carries every violation found,
    /// not just the first, each qualified with a dotted field path.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced entity (node, edge, run, workspace) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write would create a duplicate id, or a duplicate `(src, dst, type)` edge.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A write attempted to change an immutable field (node id, edge endpoints).
    #[error("immutable field changed: {0}")]
    ImmutableField(String),

    /// The `hard_requires` subgraph contains a cycle; planning cannot proceed.
    #[error("cycle detected among nodes: {0:?}")]
    Cycle(Vec<String>),

    /// A plan or search request selected zero nodes.
    #[error("no nodes selected")]
    NoSelection,

    /// A journal line could not be parsed or failed schema validation.
    /// Recovery skips the line and keeps going; this variant is for the
    /// per-entry report, not a fatal abort.
    #[error("corrupt journal entry at offset {offset}: {reason}")]
    CorruptJournal {
        /// Zero-based line offset within the journal file.
        offset: usize,
        /// Human-readable reason the entry was rejected.
        reason: String,
    },

    /// `graph.json` could not be parsed. Triggers a recovery attempt.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// An operation that called an external service exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The caller's cancellation signal fired before the operation committed.
    #[error("operation cancelled")]
    Cancelled,

    /// The embedder returned a vector of the wrong dimension or with
    /// non-finite components.
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// The configured vector backend could not be reached or returned an
    /// unexpected response.
    #[error("vector backend unavailable: {0}")]
    VectorBackendUnavailable(String),

    /// Filesystem I/O failed outside of a more specific case above.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed outside of a more specific case above.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GotnError {
    /// Short machine-readable tag for this error's kind, matching the names
    /// used in the wire contract (`error` strings are `"<kind>: <message>"`).
    pub fn kind(&self) -> &'static str {
        match self {
            GotnError::Validation(_) => "Validation",
            GotnError::NotFound(_) => "NotFound",
            GotnError::Conflict(_) => "Conflict",
            GotnError::ImmutableField(_) => "ImmutableField",
            GotnError::Cycle(_) => "Cycle",
            GotnError::NoSelection => "NoSelection",
            GotnError::CorruptJournal { .. } => "CorruptJournal",
            GotnError::CorruptSnapshot(_) => "CorruptSnapshot",
            GotnError::Timeout(_) => "Timeout",
            GotnError::Cancelled => "Cancelled",
            GotnError::InvalidEmbedding(_) => "InvalidEmbedding",
            GotnError::VectorBackendUnavailable(_) => "VectorBackendUnavailable",
            GotnError::Io(_) => "IOError",
            GotnError::Serde(_) => "IOError",
        }
    }
}

/// One field-level violation found while validating a [`crate::Node`],
/// [`crate::Edge`], or other canonical shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending field, e.g. `"artifacts.files[1]"`.
    pub path: String,
    /// Human-readable description of what's wrong.
    pub message: String,
}

impl Violation {
    /// Build a violation for `path` with `message`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregated validation failure: every violation found in one pass, not
/// just the first. Validators never short-circuit on the first bad field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} violation(s): {}", .0.len(), join_violations(.0))]
pub struct ValidationError(pub Vec<Violation>);

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(std::string::ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Build from a non-empty list of violations. Returns `None` if `violations`
    /// is empty — callers use this to turn an accumulator into an `Err` only
    /// when something actually failed.
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self(violations))
        }
    }

    /// The individual violations, in the order they were found.
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GotnError>;
