//! Unit tests for individual components

mod config_test;
mod error_test;
mod persist_test;
mod util_test;
