//! A kanban board stored as a directory of markdown task files, with a
//! scriptable CLI and a terminal dashboard over the same files.

pub mod cli;
pub mod error;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod tui;
pub mod util;
