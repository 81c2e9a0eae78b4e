//! Human-readable progress events emitted while a pipeline runs.

mod events;
mod handle;

pub use events::*;
pub use handle::*;
