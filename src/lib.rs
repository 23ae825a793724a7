pub mod fetch;
pub mod pipeline;
pub mod process;
