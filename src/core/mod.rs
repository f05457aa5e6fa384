//! Core client components
//!
//! This module contains the conversation orchestration that drives the
//! two-phase function-calling exchange, and the session that owns its state.

mod chat;
mod gateway;
mod session;
mod usage;

pub use gateway::HttpGateway;
pub use session::{SendOutcome, Session};
pub use usage::DEFAULT_DAILY_LIMIT;
