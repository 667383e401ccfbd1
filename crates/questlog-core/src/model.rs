use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Prefix shared by every quest id (`quest-001`, `quest-002`, ...).
pub const ID_PREFIX: &str = "quest-";

/// Minimum zero-padded width of the numeric id suffix.
pub const ID_WIDTH: usize = 3;

/// The three lifecycle states of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// True for the states a quest may only enter once its blockers are done.
    #[must_use]
    pub const fn is_advance(self) -> bool {
        matches!(self, Self::InProgress | Self::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// One unit of trackable work.
///
/// The `description` is the complete task brief: assignee agents have no
/// access to the conversation that created the quest, only to this field.
/// Field names stay camelCase on disk so ledgers written by earlier
/// implementations load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quest {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
    pub blocked_by: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for Quest {
    fn default() -> Self {
        Self {
            id: String::new(),
            subject: String::new(),
            description: String::new(),
            status: Status::Pending,
            active_form: None,
            blocked_by: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Quest {
    /// Numeric suffix of a quest id, if it has one (`quest-007` -> 7).
    ///
    /// Ids that do not follow the `quest-NNN` shape yield `None` and are
    /// simply skipped during id generation.
    #[must_use]
    pub fn id_suffix(id: &str) -> Option<u64> {
        id.strip_prefix(ID_PREFIX)?.parse().ok()
    }

    /// Format a numeric suffix as a full quest id, zero-padded to the
    /// minimum width (wider suffixes keep their natural width).
    #[must_use]
    pub fn format_id(suffix: u64) -> String {
        format!("{ID_PREFIX}{suffix:0ID_WIDTH$}")
    }
}

/// All quests belonging to one root session, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Ledger {
    pub root_id: String,
    pub quests: Vec<Quest>,
}

impl Ledger {
    /// A fresh, empty ledger for the given root session.
    #[must_use]
    pub fn empty(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            quests: Vec::new(),
        }
    }

    /// Look up a quest by exact id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Mutable lookup by exact id.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Quest> {
        self.quests.iter_mut().find(|q| q.id == id)
    }

    /// All quest ids in creation order (used for not-found hints).
    #[must_use]
    pub fn known_ids(&self) -> Vec<String> {
        self.quests.iter().map(|q| q.id.clone()).collect()
    }
}
