pub mod activity;
pub mod atomic;
pub mod config_io;
pub mod lock;
pub mod task_io;
pub mod watcher;
