pub mod filename;
pub mod task_parser;
pub mod task_serializer;

pub use filename::{extract_id, slugify, task_filename};
pub use task_parser::{TaskFileError, parse_task, split_preamble};
pub use task_serializer::serialize_task;
