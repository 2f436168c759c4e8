//! Positional ordering core for board columns and items.
//! Keeps item positions dense (`1..=N`) per column across create, move,
//! reorder and soft delete.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EngineConfig, RetryConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::change::{ChangeAction, ChangeRecord};
pub use model::container::Container;
pub use model::item::{ActorId, ContainerId, Item, ItemId, ItemPatch, ItemPayload, WorkspaceId};
pub use model::lifecycle::Lifecycle;
pub use ordering::audit::DensityReport;
pub use repo::{StoreError, StoreResult};
pub use service::{BoardError, BoardResult, BoardService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
