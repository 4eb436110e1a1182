//! HTTP surface for the alert instance state cache.
//!
//! An external evaluation loop pushes results to `POST /api/evaluations`;
//! operators and the rest of the alerting pipeline read and prune the
//! cached state through the remaining endpoints. See [`handlers`] for the
//! full endpoint table.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
