//! Process-level operations on window owners.

pub mod errors;
pub mod operations;

pub use errors::ProcessError;
pub use operations::terminate_process;
