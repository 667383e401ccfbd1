use crate::model::Status;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    QuestNotFound,
    ValidationFailure,
    BlockedTransition,
    CorruptLedger,
    LedgerWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::QuestNotFound => "E2001",
            Self::ValidationFailure => "E2002",
            Self::BlockedTransition => "E2003",
            Self::CorruptLedger => "E3001",
            Self::LedgerWriteFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::QuestNotFound => "Quest not found",
            Self::ValidationFailure => "Missing or empty required field",
            Self::BlockedTransition => "Quest is blocked by incomplete quests",
            Self::CorruptLedger => "Ledger file unreadable",
            Self::LedgerWriteFailed => "Ledger write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::QuestNotFound => Some("Run `ql list` to see known quest ids."),
            Self::ValidationFailure => {
                Some("create requires --subject and --description; update requires at least one field.")
            }
            Self::BlockedTransition => {
                Some("Complete the blocking quests first. `ql list --available` shows what is ready.")
            }
            Self::CorruptLedger => {
                Some("The ledger was treated as empty; recreate quests if needed.")
            }
            Self::LedgerWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other questlog process releases its lock.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A blocker that is holding back a status advance: enough detail for the
/// caller to see what to finish first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockerRef {
    pub id: String,
    pub subject: String,
    pub status: Status,
}

impl fmt::Display for BlockerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.id, self.subject, self.status)
    }
}

/// Every way a ledger operation can be rejected.
///
/// Rejections leave the ledger unchanged. Store corruption and hierarchy
/// lookup failures are deliberately absent: both are recovered locally
/// (empty ledger / caller-is-root) and never reach the caller as errors.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    /// The referenced quest id does not exist in this ledger.
    #[error("quest '{id}' not found")]
    NotFound { id: String, known: Vec<String> },

    /// A required field was missing or blank on create.
    #[error("'{field}' is required and must not be blank")]
    MissingField { field: &'static str },

    /// An update carried no recognized field.
    #[error("update for '{id}' carried no changes")]
    EmptyUpdate { id: String },

    /// A status advance was attempted while blockers remain unresolved.
    #[error("quest '{id}' is blocked by {} incomplete quest(s)", blockers.len())]
    Blocked { id: String, blockers: Vec<BlockerRef> },

    /// The per-ledger lock could not be acquired within the bounded wait.
    #[error("ledger lock timed out after {waited:?} at {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    /// Ledger write or rename failed.
    #[error("ledger i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger could not be serialized for persistence.
    #[error("ledger serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl QuestError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::QuestNotFound,
            Self::MissingField { .. } | Self::EmptyUpdate { .. } => ErrorCode::ValidationFailure,
            Self::Blocked { .. } => ErrorCode::BlockedTransition,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
            Self::Io(_) | Self::Serialize(_) => ErrorCode::LedgerWriteFailed,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotFound { known, .. } => {
                if known.is_empty() {
                    Some("The ledger has no quests yet. Run `ql create` first.".to_string())
                } else {
                    Some(format!("Known quest ids: {}", known.join(", ")))
                }
            }
            Self::Blocked { blockers, .. } => {
                let list: Vec<String> = blockers.iter().map(ToString::to_string).collect();
                Some(format!("Unresolved blockers: {}", list.join("; ")))
            }
            other => other.code().hint().map(str::to_string),
        }
    }
}
