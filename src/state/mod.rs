//! Session state for resumable scraping jobs
//!
//! # Components
//!
//! - `SessionState`: Progress of one job (candidate list, processed set, counters)
//! - `StateStore`: JSON files on disk with atomic replace, backups and corrupt-file quarantine
//! - `session_key`: Derives the file key from the normalized query and result cap

mod session;
mod store;

pub use session::{session_key, SessionState, SESSION_KEY_LEN};
pub use store::{StateError, StateResult, StateStore};
