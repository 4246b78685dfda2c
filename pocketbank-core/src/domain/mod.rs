//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external
//! dependencies.

mod credential;
mod history;
pub mod money;
pub mod result;
mod session;

pub use credential::{validate_name, validate_pin, Credential, UserKey, PIN_LEN};
pub use history::{HistoryEntry, HistoryFilter, KindFilter, TxKind};
pub use session::SessionState;
