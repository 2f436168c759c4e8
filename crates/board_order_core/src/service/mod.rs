//! Board use-case services.
//!
//! # Responsibility
//! - Orchestrate ordering plans and store calls into use-case level APIs.
//! - Own transaction boundaries, retry policy and change-log emission.

pub mod board_service;
mod change_log;
pub mod error;
mod transaction;

pub use board_service::BoardService;
pub use error::{BoardError, BoardResult};
