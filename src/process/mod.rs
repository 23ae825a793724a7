// src/process/mod.rs
pub mod aggregate;
pub mod classify;
pub mod utils;
pub mod write;

pub use aggregate::aggregate;
pub use classify::{classify, collect_group};
pub use write::write_table;
