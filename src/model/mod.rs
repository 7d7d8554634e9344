pub mod activity;
pub mod board;
pub mod config;
pub mod date;
pub mod task;

pub use activity::*;
pub use board::*;
pub use config::*;
pub use date::*;
pub use task::*;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to whole seconds, the precision stored on disk
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
