//! Terminal dashboard over the same board files the CLI edits.

pub mod app;
pub mod input;
pub mod layout;
pub mod render;
pub mod theme;
pub mod wizard;

pub use app::run;
