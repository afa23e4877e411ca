//! Services module
//!
//! Business logic that coordinates the live dashboard, the engine and the
//! snapshot store.

pub mod scheduler;
pub mod settings;
pub mod snapshots;

pub use scheduler::{AutoSnapshotTask, SchedulerService};
pub use settings::SettingsService;
pub use snapshots::SnapshotService;
