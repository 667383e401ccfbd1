//! questlog-core: a shared, dependency-gated task ledger for hierarchies of
//! cooperating agent processes.
//!
//! One root session and all of its descendant sessions share a single ledger
//! of quests. Quests carry their complete task brief in `description`,
//! declare ordering with `blockedBy`, and advance `pending → in_progress →
//! completed` behind an unresolved-blocker gate. Mutations from sibling
//! processes are serialized with a per-ledger advisory file lock.
//!
//! # Conventions
//!
//! - **Errors**: operations return [`error::QuestError`]; recovered
//!   conditions (corrupt ledger, unknown ancestry) never surface as errors.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod model;
pub mod ops;
pub mod render;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{ErrorCode, QuestError};
pub use model::{Ledger, Quest, Status};
