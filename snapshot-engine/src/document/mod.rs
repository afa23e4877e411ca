//! Dashboard document module
//!
//! The live document model and the accessor used to read and write it.

pub mod accessor;
pub mod model;

pub use accessor::{DocumentAccessor, JsonFileDocument, MemoryDocument};
pub use model::{DashboardDocument, Section, View, ViewKind, ViewLayout, WidgetSlot};
