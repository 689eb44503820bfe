//! The venue monitor: owned state plus the actor that serializes access to it.

pub mod actor;
pub mod snapshot;
pub mod state;

pub use actor::{spawn_monitor, MonitorHandle};
pub use snapshot::MonitorSnapshot;
pub use state::{Effect, MonitorState, Phase};
