//! Business logic orchestration

mod auth;
mod session;
mod transaction;

pub use auth::{AuthService, MAX_LOGIN_ATTEMPTS};
pub use session::SessionManager;
pub use transaction::{TransactionResult, TransactionService};
