//! Task spawning and in-flight tracking for bridge invocations.
//!
//! Every spawn carries a [`TaskClass`] so logs can tell setup work apart from
//! per-invocation work.

mod class;
mod join_set;
mod panic;
mod spawn;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use panic::join_error_panic_message;
pub use spawn::{spawn, spawn_blocking};
