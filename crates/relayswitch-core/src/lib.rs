//! Core switch logic for relayswitchd
//!
//! This crate is the heart of relayswitchd, containing:
//! - The debounced switch (an "on" holds for a freeze window before local offs apply)
//! - Remote arbitration (a remote "play" suppresses local offs for a longer window)
//! - The orchestrator that feeds session commands and local requests through both
//!
//! All timing uses monotonic time passed in by the caller.

mod arbiter;
mod events;
mod orchestrator;
mod switch;

pub use arbiter::*;
pub use events::*;
pub use orchestrator::*;
pub use switch::*;
