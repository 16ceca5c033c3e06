//! integrated tests
pub mod toolkit;

mod pipeline;
