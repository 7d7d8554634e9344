pub mod check;
pub mod context;
pub mod filter;
pub mod group;
pub mod metrics;
pub mod pick;
pub mod sort;
pub mod summary;
pub mod task_ops;
pub mod transition;
